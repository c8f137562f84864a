use serde::Serialize;

/// Company is unknown at regeneration time; the generator only needs some text.
pub const COMPANY_PLACEHOLDER: &str = "your company";
const FALLBACK_NAME: &str = "Hiring Manager";

/// One recruiter record in the generator's request file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct GenerationRequest {
    pub name: String,
    pub email: String,
    pub company: String,
    pub job_description: String,
}

impl GenerationRequest {
    pub fn for_address(address: &str, job_description: &str) -> Self {
        Self {
            name: name_from_address(address),
            email: address.to_string(),
            company: COMPANY_PLACEHOLDER.to_string(),
            job_description: job_description.to_string(),
        }
    }
}

/// Derives a display name from the local part: `jane.doe@co.com` → `Jane Doe`.
pub fn name_from_address(address: &str) -> String {
    let local = address.split('@').next().unwrap_or_default();
    let words: Vec<String> = local
        .split(['.', '_', '-', '+'])
        .filter(|w| !w.is_empty())
        .map(capitalize)
        .collect();

    if words.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        words.join(" ")
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().chain(chars).collect(),
    }
}
