use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("7z extraction failed for {archive}: {message}")]
    SevenZError { archive: String, message: String },

    #[error("XML parsing error: {0}")]
    XmlError(#[from] quick_xml::Error),

    #[error("XML attribute error: {0}")]
    XmlAttributeError(#[from] quick_xml::events::attributes::AttrError),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("HTTP {status} returned by {url}")]
    HttpStatusError { status: u16, url: String },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Input not found: {path}")]
    InputNotFound { path: String },

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Input,
    Network,
    Parsing,
    Output,
    Processing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EtlError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. } => ErrorCategory::Configuration,
            EtlError::InputNotFound { .. }
            | EtlError::ZipError(_)
            | EtlError::SevenZError { .. } => ErrorCategory::Input,
            EtlError::HttpError(_) | EtlError::HttpStatusError { .. } => ErrorCategory::Network,
            EtlError::XmlError(_) | EtlError::XmlAttributeError(_) => ErrorCategory::Parsing,
            EtlError::CsvError(_) | EtlError::SerializationError(_) | EtlError::IoError(_) => {
                ErrorCategory::Output
            }
            EtlError::ProcessingError { .. } => ErrorCategory::Processing,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Configuration | ErrorCategory::Input | ErrorCategory::Parsing => {
                ErrorSeverity::High
            }
            ErrorCategory::Processing => ErrorSeverity::High,
            ErrorCategory::Output => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            EtlError::ZipError(_) | EtlError::SevenZError { .. } => {
                "Check that the archive is complete; re-download it if the transfer was interrupted"
            }
            EtlError::XmlError(_) | EtlError::XmlAttributeError(_) => {
                "Make sure the file is an uncorrupted dump XML file (e.g. Posts.xml)"
            }
            EtlError::HttpError(_) => "Check network connectivity and the source URL",
            EtlError::HttpStatusError { .. } => "Verify the source URL points to an existing archive",
            EtlError::InputNotFound { .. } => {
                "Check --input-dir / --posts-file; the dump must be downloaded or extracted first"
            }
            EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. } => "Fix the configuration value and run again",
            EtlError::CsvError(_) | EtlError::SerializationError(_) | EtlError::IoError(_) => {
                "Check that the output path is writable and the disk is not full"
            }
            EtlError::ProcessingError { .. } => "Run with --verbose to see which step failed",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Invalid configuration: {}", self),
            ErrorCategory::Input => format!("Could not read the dump: {}", self),
            ErrorCategory::Network => format!("Download failed: {}", self),
            ErrorCategory::Parsing => format!("Could not parse the dump XML: {}", self),
            ErrorCategory::Output => format!("Could not write results: {}", self),
            ErrorCategory::Processing => format!("Processing failed: {}", self),
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_errors_are_high_severity() {
        let err = EtlError::MissingConfigError {
            field: "source.input_dir".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert_eq!(err.exit_code(), 1);
        assert!(err.user_friendly_message().starts_with("Invalid configuration"));
    }

    #[test]
    fn test_http_status_is_retryable() {
        let err = EtlError::HttpStatusError {
            status: 404,
            url: "https://example.com/a.7z".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Network);
        assert_eq!(err.exit_code(), 2);
        assert_eq!(err.to_string(), "HTTP 404 returned by https://example.com/a.7z");
    }

    #[test]
    fn test_io_error_conversion() {
        let err: EtlError = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied").into();
        assert_eq!(err.severity(), ErrorSeverity::Critical);
        assert_eq!(err.exit_code(), 3);
    }
}
