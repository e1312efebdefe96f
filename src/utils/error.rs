use thiserror::Error;

#[derive(Error, Debug)]
pub enum LensError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("API returned status {status} for {endpoint}")]
    ApiStatusError { status: u16, endpoint: String },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Schema error: field '{field}' of '{slug}' is not numeric: {value}")]
    SchemaError {
        slug: String,
        field: &'static str,
        value: String,
    },

    #[error("Invalid group specification: {reason}")]
    InvalidGroupSpec { reason: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Data,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl LensError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            LensError::ApiError(_) | LensError::ApiStatusError { .. } => ErrorCategory::Network,
            LensError::CsvError(_)
            | LensError::SerializationError(_)
            | LensError::SchemaError { .. }
            | LensError::ProcessingError { .. } => ErrorCategory::Data,
            LensError::InvalidGroupSpec { .. }
            | LensError::ConfigError { .. }
            | LensError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            LensError::ZipError(_) | LensError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // A malformed record is dropped and counted, the batch goes on.
            LensError::SchemaError { .. } => ErrorSeverity::Low,
            LensError::ApiError(_) | LensError::ApiStatusError { .. } => ErrorSeverity::Medium,
            LensError::CsvError(_)
            | LensError::SerializationError(_)
            | LensError::ProcessingError { .. }
            | LensError::InvalidGroupSpec { .. }
            | LensError::ConfigError { .. }
            | LensError::InvalidConfigValueError { .. } => ErrorSeverity::High,
            LensError::ZipError(_) | LensError::IoError(_) => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Network => {
                "Check network connectivity and the data provider endpoint, then retry"
            }
            ErrorCategory::Data => "Inspect the upstream payload; malformed entries are skipped",
            ErrorCategory::Configuration => {
                "Fix the configuration: group_by accepts chain and category, top_n 1..=20"
            }
            ErrorCategory::System => "Check that the output directory exists and is writable",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            LensError::ApiError(_) | LensError::ApiStatusError { .. } => {
                format!("Could not fetch protocol data: {}", self)
            }
            LensError::InvalidGroupSpec { reason } => {
                format!("Cannot group protocols: {}", reason)
            }
            LensError::InvalidConfigValueError { field, reason, .. } => {
                format!("Setting '{}' is invalid: {}", field, reason)
            }
            _ => self.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LensError>;
