use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using the library's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Comprehensive error types for the llm-docgen library.
#[derive(Error, Debug, Clone)]
#[non_exhaustive]
pub enum Error {
    /// Nothing to document: submission attempted with an empty file list.
    #[error("Please upload at least one file.")]
    NoFiles,

    /// A submission is already in flight.
    #[error("A generation request is already in progress")]
    Busy,

    /// The API credential is not present in the environment.
    #[error("{var} environment variable not set.")]
    MissingCredential {
        /// Name of the environment variable that was consulted
        var: String,
    },

    /// Configuration validation error.
    #[error("Invalid configuration: {message}")]
    Config {
        /// Detailed error message
        message: String,
    },

    /// A selected file could not be read as text.
    #[error("Failed to read file '{name}' as text: {message}")]
    FileRead {
        /// File name as shown in the file list
        name: String,
        /// Error message
        message: String,
    },

    /// The assembled prompt exceeds the configured byte budget.
    #[error("Prompt is too large: {size} bytes exceeds limit of {limit} bytes")]
    PromptTooLarge {
        /// Actual prompt size in bytes
        size: usize,
        /// Maximum allowed bytes
        limit: usize,
    },

    /// The remote generation call failed. The cause is logged, not displayed.
    #[error("Failed to generate documentation from the Gemini API.")]
    Generation,

    /// IO error with context about the file path.
    #[error("IO error accessing '{path}': {message}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// Error message
        message: String,
    },

    /// Template rendering error.
    #[error("Failed to render template '{template}': {message}")]
    Template {
        /// Template name
        template: String,
        /// Error message
        message: String,
    },

    /// External template failed validation.
    #[error("Invalid template '{path}': {message}")]
    TemplateValidation {
        /// Path to the template file
        path: String,
        /// Reason why it's invalid
        message: String,
    },

    /// Writing to the system clipboard failed.
    #[error("Clipboard error: {message}")]
    Clipboard {
        /// Error message
        message: String,
    },

    /// JSON serialization error.
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error message
        message: String,
    },

    /// System time error.
    #[error("System time error: {message}")]
    SystemTime {
        /// Error message
        message: String,
    },
}

/// Coarse classification of errors, as surfaced to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Input rejected before any work was done
    Validation,
    /// Missing credential or invalid settings
    Configuration,
    /// A selected file could not be decoded as text
    FileRead,
    /// The remote call failed
    RemoteCall,
    /// Local output (disk, clipboard, templates) failed
    Output,
}

impl Error {
    /// Creates an IO error with path context.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: source.to_string(),
        }
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a file read error.
    #[must_use]
    pub fn file_read(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FileRead {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Creates a missing credential error.
    #[must_use]
    pub fn missing_credential(var: impl Into<String>) -> Self {
        Self::MissingCredential { var: var.into() }
    }

    /// Creates a template error.
    #[must_use]
    pub fn template(template: impl Into<String>, source: tera::Error) -> Self {
        Self::Template {
            template: template.into(),
            message: render_tera_error(&source),
        }
    }

    /// Creates a template validation error.
    #[must_use]
    pub fn template_validation(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TemplateValidation {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a clipboard error.
    #[must_use]
    pub fn clipboard(message: impl Into<String>) -> Self {
        Self::Clipboard {
            message: message.into(),
        }
    }

    /// Returns the user-facing classification of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NoFiles | Self::Busy | Self::PromptTooLarge { .. } => ErrorKind::Validation,
            Self::MissingCredential { .. } | Self::Config { .. } | Self::TemplateValidation { .. } => {
                ErrorKind::Configuration
            }
            Self::FileRead { .. } => ErrorKind::FileRead,
            Self::Generation => ErrorKind::RemoteCall,
            Self::Io { .. }
            | Self::Template { .. }
            | Self::Clipboard { .. }
            | Self::Serialization { .. }
            | Self::SystemTime { .. } => ErrorKind::Output,
        }
    }

    /// Returns true if this is an IO error.
    #[must_use]
    pub const fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }

    /// Returns true if this is a configuration error (including a missing credential).
    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(self.kind(), ErrorKind::Configuration)
    }

    /// Returns true if this error was raised before any work started.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self.kind(), ErrorKind::Validation)
    }
}

/// Flattens a tera error with its source chain; tera hides the useful part in `source()`.
fn render_tera_error(err: &tera::Error) -> String {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

// Conversion implementations for convenient error handling
impl From<std::time::SystemTimeError> for Error {
    fn from(e: std::time::SystemTimeError) -> Self {
        Self::SystemTime {
            message: e.to_string(),
        }
    }
}

impl From<tera::Error> for Error {
    fn from(e: tera::Error) -> Self {
        Self::template("unknown", e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization {
            message: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = Error::config("test message");
        assert!(err.is_config());
        assert!(err.to_string().contains("test message"));
    }

    #[test]
    fn test_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = Error::io("/tmp/test.txt", io_err);
        assert!(err.is_io());
        assert!(err.to_string().contains("/tmp/test.txt"));
    }

    #[test]
    fn test_validation_and_credential_messages_differ() {
        let validation = Error::NoFiles;
        let credential = Error::missing_credential("API_KEY");

        assert_eq!(validation.kind(), ErrorKind::Validation);
        assert_eq!(credential.kind(), ErrorKind::Configuration);
        assert_eq!(validation.to_string(), "Please upload at least one file.");
        assert_eq!(credential.to_string(), "API_KEY environment variable not set.");
    }

    #[test]
    fn test_generation_message_is_generic() {
        assert_eq!(
            Error::Generation.to_string(),
            "Failed to generate documentation from the Gemini API."
        );
        assert_eq!(Error::Generation.kind(), ErrorKind::RemoteCall);
    }

    #[test]
    fn test_file_read_kind() {
        let err = Error::file_read("main.rs", "invalid UTF-8");
        assert_eq!(err.kind(), ErrorKind::FileRead);
        assert!(err.to_string().contains("main.rs"));
    }

    #[test]
    fn test_error_clone() {
        let err = Error::config("test");
        let cloned = err.clone();
        assert_eq!(err.to_string(), cloned.to_string());
    }

    #[test]
    fn test_serialization_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let err: Error = json_err.into();
        assert!(err.to_string().contains("Serialization error"));
    }
}
