//! Regeneration — rebuilds the draft for a single contact.
//!
//! The `Regenerator` trait is the seam: `SubprocessRegenerator` drives the
//! external generator script through a request file and its output mapping,
//! and an in-process generator can replace it without touching handlers.
//!
//! Regenerated content is returned to the caller only. Nothing is persisted
//! until the operator saves the row.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use crate::models::contact::is_valid_address;

pub mod handlers;
pub mod request;
pub mod subprocess;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("'{0}' is not a valid email address")]
    InvalidAddress(String),

    #[error("failed to write generator request: {0}")]
    Request(#[source] io::Error),

    #[error("failed to run generator: {0}")]
    Spawn(#[source] io::Error),

    #[error("generator did not finish within {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("generator exited with code {}: {stderr}", exit_code_label(.code))]
    Exit { code: Option<i32>, stderr: String },

    #[error("generator output {} was not updated", .0.display())]
    StaleOutput(PathBuf),

    #[error("generator produced no draft for {0}")]
    MissingEntry(String),

    #[error("generator output {} is unreadable: {message}", .path.display())]
    Output { path: PathBuf, message: String },
}

fn exit_code_label(code: &Option<i32>) -> String {
    code.map_or_else(|| "none".to_string(), |c| c.to_string())
}

/// Produces a fresh draft for one contact.
#[async_trait]
pub trait Regenerator: Send + Sync {
    async fn regenerate(
        &self,
        address: &str,
        job_description: &str,
    ) -> Result<String, GenerationError>;
}

/// Validates the address and runs the regenerator.
pub async fn regenerate_draft(
    regenerator: &dyn Regenerator,
    address: &str,
    job_description: &str,
) -> Result<String, GenerationError> {
    let address = address.trim();
    if !is_valid_address(address) {
        return Err(GenerationError::InvalidAddress(address.to_string()));
    }

    info!("Regenerating email for {address}");
    let content = regenerator.regenerate(address, job_description).await?;
    info!("Regenerated email for {address} ({} chars)", content.len());
    Ok(content)
}


#[cfg(test)]
mod tests {
    use super::test_support::FakeRegenerator;
    use super::*;

    #[tokio::test]
    async fn test_invalid_address_never_reaches_generator() {
        let fake = FakeRegenerator::ok("draft");
        let err = regenerate_draft(&fake, "not-an-address", "jd")
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::InvalidAddress(_)));
        assert!(fake.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_address_is_trimmed() {
        let fake = FakeRegenerator::ok("draft");
        let content = regenerate_draft(&fake, " jane@co.com ", "jd").await.unwrap();
        assert_eq!(content, "draft");
        assert_eq!(
            fake.seen.lock().unwrap()[0],
            ("jane@co.com".to_string(), "jd".to_string())
        );
    }

    #[test]
    fn test_exit_error_message() {
        let err = GenerationError::Exit {
            code: Some(1),
            stderr: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "generator exited with code 1: boom");
        let killed = GenerationError::Exit {
            code: None,
            stderr: String::new(),
        };
        assert_eq!(killed.to_string(), "generator exited with code none: ");
    }
}
