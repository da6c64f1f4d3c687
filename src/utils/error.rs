//! Error types for the entire application.
//!
//! We use `thiserror` for library-style errors with custom types,
//! and `anyhow` for application-level error propagation in main.rs and commands.

use thiserror::Error;

/// A single input-validation violation.
///
/// Validation is exhaustive: ingestion collects every violation it finds
/// instead of failing on the first, so callers get a complete diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Where the violation was found (e.g., "steps[3].gasCost")
    pub location: String,

    /// What is wrong with the value
    pub message: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.location, self.message)
    }
}

/// Malformed input rejected at ingestion.
///
/// Carries the full list of violations found in a single pass.
#[derive(Error, Debug)]
#[error("trace validation failed with {} violation(s)", .violations.len())]
pub struct ValidationError {
    pub violations: Vec<Violation>,
}

impl ValidationError {
    /// Render every violation, one per line
    pub fn detail(&self) -> String {
        self.violations
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Errors that can occur during trace ingestion
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("JSON deserialization failed: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid trace format: {0}")]
    InvalidFormat(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Errors that can occur while loading pricing configuration
#[derive(Error, Debug)]
pub enum PricingError {
    #[error("Failed to read pricing file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse pricing TOML: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Invalid pricing value: {0}")]
    InvalidValue(String),
}

/// Errors that can occur during file output
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to write file: {0}")]
    WriteFailed(#[from] std::io::Error),

    #[error("Failed to serialize JSON: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    #[error("Invalid output path: {0}")]
    InvalidPath(String),
}
