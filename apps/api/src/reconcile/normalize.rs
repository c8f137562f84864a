//! Presentation normalization for drafts.
//!
//! The greeting and signature are added when the email is sent, so a leading
//! salutation line and a trailing sign-off block are stripped here. Matching
//! is pattern based and lossy: body text that happens to look like a greeting
//! or sign-off is removed too.

use std::sync::OnceLock;

use regex::Regex;

fn salutation_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)^\s*(?:dear|hi|hello|hey|greetings)\b[^,<\n]{0,80}(?:,\s*(?:<br\s*/?>\s*)*|(?:\s*<br\s*/?>)+\s*)",
        )
        .expect("salutation pattern is valid")
    })
}

fn sign_off_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?is)(?:^|<br\s*/?>|\n)\s*(?:best regards|kind regards|warm regards|regards|sincerely|best wishes|best|cheers|thanks|thank you)\s*,?\s*(?:(?:<br\s*/?>|\n).*)?$",
        )
        .expect("sign-off pattern is valid")
    })
}

fn trailing_breaks_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)(?:\s|<br\s*/?>)+$").expect("break pattern is valid"))
}

/// Strips a leading salutation and a trailing sign-off block.
pub fn normalize_draft(html: &str) -> String {
    let without_greeting = salutation_re().replace(html, "");
    let without_sign_off = sign_off_re().replace(&without_greeting, "");
    trailing_breaks_re()
        .replace(&without_sign_off, "")
        .trim()
        .to_string()
}
