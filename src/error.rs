//! Error types for export-letterhead

use thiserror::Error;

/// Result type alias for letterhead and export operations
pub type Result<T> = std::result::Result<T, LetterheadError>;

/// Main error type for settings and export operations
///
/// Composition itself never fails: template problems are reported through
/// [`RenderError`] and downgraded to a fallback row by the composer.
#[derive(Error, Debug)]
pub enum LetterheadError {
    /// Settings value rejected at save time
    #[error("Invalid letterhead settings: {0}")]
    InvalidSettings(String),

    /// Settings document could not be parsed
    #[error("Failed to parse letterhead settings: {0}")]
    ConfigError(String),

    /// Error occurred while writing an export file
    #[error("Failed to write export: {0}")]
    WriteError(String),

    /// Error occurred while writing a row
    #[error("Failed to write row {row} to sheet '{sheet}': {source}")]
    WriteRowError {
        row: u32,
        sheet: String,
        #[source]
        source: Box<LetterheadError>,
    },

    /// IO error wrapper
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// CSV writer error wrapper
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
}

impl From<toml::de::Error> for LetterheadError {
    fn from(err: toml::de::Error) -> Self {
        LetterheadError::ConfigError(err.to_string())
    }
}

impl From<zip::result::ZipError> for LetterheadError {
    fn from(err: zip::result::ZipError) -> Self {
        LetterheadError::WriteError(err.to_string())
    }
}

impl From<toml::ser::Error> for LetterheadError {
    fn from(err: toml::ser::Error) -> Self {
        LetterheadError::ConfigError(err.to_string())
    }
}

/// Template rendering failure
///
/// Carries the engine's message and, when known, the template line the
/// problem was reported on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct RenderError {
    message: String,
    line: Option<usize>,
}

impl RenderError {
    pub fn new(message: impl Into<String>) -> Self {
        RenderError {
            message: message.into(),
            line: None,
        }
    }

    pub fn with_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn line(&self) -> Option<usize> {
        self.line
    }
}

impl From<minijinja::Error> for RenderError {
    fn from(err: minijinja::Error) -> Self {
        let message = match err.detail() {
            Some(detail) => format!("{}: {}", err.kind(), detail),
            None => err.kind().to_string(),
        };
        let rendered = RenderError::new(message);
        match err.line() {
            Some(line) => rendered.with_line(line),
            None => rendered,
        }
    }
}
