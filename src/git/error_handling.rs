use thiserror::Error;
use tracing::{error, warn};

/// Error types for the repository-loading boundary.
///
/// The graph engine itself never produces these: once a permanent graph is
/// built, its operations either succeed, report "no match" through `Option`,
/// or panic on contract violations.
#[derive(Error, Debug)]
pub enum GitError {
    #[error("Repository error: {message}")]
    Repository { message: String },

    #[error("Invalid input: {input} - {reason}")]
    InvalidInput { input: String, reason: String },

    #[error("Git internal error: {0}")]
    Git2(#[from] git2::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("UTF-8 conversion error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

impl GitError {
    /// Create a repository error
    pub fn repository(message: impl Into<String>) -> Self {
        let message = message.into();
        error!("Repository error: {}", message);
        GitError::Repository { message }
    }

    /// Create an invalid input error
    pub fn invalid_input(input: impl Into<String>, reason: impl Into<String>) -> Self {
        let input = input.into();
        let reason = reason.into();
        warn!("Invalid input '{}': {}", input, reason);
        GitError::InvalidInput { input, reason }
    }
}

/// Input validation utilities
pub struct InputValidator;

impl InputValidator {
    /// Validate commit ID format and length
    pub fn validate_commit_id(id: &str) -> Result<(), GitError> {
        if id.is_empty() {
            return Err(GitError::invalid_input(id, "Commit ID cannot be empty"));
        }

        if id.len() < 4 {
            return Err(GitError::invalid_input(
                id,
                "Commit ID too short (minimum 4 characters)",
            ));
        }

        if id.len() > 40 {
            return Err(GitError::invalid_input(
                id,
                "Commit ID too long (maximum 40 characters)",
            ));
        }

        if !id.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(GitError::invalid_input(
                id,
                "Commit ID contains non-hexadecimal characters",
            ));
        }

        Ok(())
    }

    /// Validate reference name (branch/tag)
    pub fn validate_ref_name(name: &str) -> Result<(), GitError> {
        if name.is_empty() {
            return Err(GitError::invalid_input(
                name,
                "Reference name cannot be empty",
            ));
        }

        if name.len() > 255 {
            return Err(GitError::invalid_input(
                name,
                "Reference name too long (maximum 255 characters)",
            ));
        }

        // Git ref name rules
        let invalid_chars = [' ', '~', '^', ':', '?', '*', '[', '\\', '\x7f', '\n', '\r'];
        for ch in &invalid_chars {
            if name.contains(*ch) {
                return Err(GitError::invalid_input(
                    name,
                    format!("Reference name contains invalid character '{}'", ch),
                ));
            }
        }

        if name.starts_with('-') || name.ends_with('.') || name.contains("..") {
            return Err(GitError::invalid_input(
                name,
                "Reference name has invalid structure",
            ));
        }

        Ok(())
    }
}
