use thiserror::Error;

/// Errors that can occur while managing contacts, invoices and their renderings.
///
/// Every variant is scoped to the single operation that produced it; none of
/// them leaves the session in a partially updated state.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FatturaError {
    /// One or more input validation rules failed.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A referenced record or artifact does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The requested feature exists only as a placeholder.
    #[error("not implemented: {0}")]
    NotImplemented(String),

    /// A state change the lifecycle does not allow.
    #[error("lifecycle error: {0}")]
    Lifecycle(String),

    /// Invoice number parsing or sequencing error.
    #[error("numbering error: {0}")]
    Numbering(String),

    /// XML generation error.
    #[error("XML error: {0}")]
    Xml(String),

    /// PDF generation error.
    #[error("PDF error: {0}")]
    Pdf(String),

    /// Filesystem error while reading or writing artifacts.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Remote sync failure.
    #[error("sync error: {0}")]
    Sync(String),

    /// Missing or malformed configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl FatturaError {
    /// Join a list of field errors into a single [`FatturaError::Validation`].
    pub fn from_validation(errors: &[ValidationError]) -> Self {
        let msg = errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        Self::Validation(msg)
    }
}

/// A single validation error with field path and message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dot-separated path to the invalid field (e.g. "lines[0].quantity").
    pub field: String,
    /// Human-readable error description.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}
