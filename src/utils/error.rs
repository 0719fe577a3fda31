use thiserror::Error;

#[derive(Error, Debug)]
pub enum EnrichError {
    #[error("Registry request failed: {0}")]
    RegistryError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("DNS query error: {message}")]
    DnsError { message: String },

    #[error("Cache store at '{path}' is unreadable: {message}")]
    CacheError { path: String, message: String },

    #[error("Column '{column}' not found in input header")]
    ColumnNotFoundError { column: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid configuration value for '{field}': '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("Enrichment run cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, EnrichError>;

/// 錯誤分類，對應錯誤處理策略的四個來源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Input,
    Network,
    Storage,
    Cancelled,
}

/// 錯誤嚴重程度，main 依此決定退出碼
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EnrichError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EnrichError::ConfigError { .. }
            | EnrichError::InvalidConfigValueError { .. }
            | EnrichError::MissingConfigError { .. } => ErrorCategory::Configuration,
            EnrichError::CsvError(_)
            | EnrichError::ColumnNotFoundError { .. }
            | EnrichError::ProcessingError { .. } => ErrorCategory::Input,
            EnrichError::RegistryError(_) | EnrichError::DnsError { .. } => ErrorCategory::Network,
            EnrichError::IoError(_)
            | EnrichError::SerializationError(_)
            | EnrichError::CacheError { .. } => ErrorCategory::Storage,
            EnrichError::Cancelled => ErrorCategory::Cancelled,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            EnrichError::Cancelled => ErrorSeverity::Low,
            EnrichError::RegistryError(_) | EnrichError::DnsError { .. } => ErrorSeverity::Medium,
            EnrichError::CsvError(_)
            | EnrichError::IoError(_)
            | EnrichError::SerializationError(_)
            | EnrichError::CacheError { .. }
            | EnrichError::ColumnNotFoundError { .. }
            | EnrichError::ProcessingError { .. } => ErrorSeverity::High,
            EnrichError::ConfigError { .. }
            | EnrichError::InvalidConfigValueError { .. }
            | EnrichError::MissingConfigError { .. } => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            EnrichError::RegistryError(_) => {
                "Check network connectivity and the registry endpoint URL".to_string()
            }
            EnrichError::DnsError { .. } => {
                "Check the local DNS configuration (/etc/resolv.conf)".to_string()
            }
            EnrichError::CsvError(_) | EnrichError::ProcessingError { .. } => {
                "Check the input file delimiter and quoting".to_string()
            }
            EnrichError::ColumnNotFoundError { column } => format!(
                "Pass the actual column name via --email-column/--cnpj-column (missing: '{}')",
                column
            ),
            EnrichError::CacheError { path, .. } => format!(
                "Delete or fix the cache file '{}' and run again; cached lookups will be re-queried",
                path
            ),
            EnrichError::IoError(_) => {
                "Check that the input exists and the output directory is writable".to_string()
            }
            EnrichError::SerializationError(_) => {
                "The cache file may be truncated; delete it and run again".to_string()
            }
            EnrichError::ConfigError { .. }
            | EnrichError::InvalidConfigValueError { .. }
            | EnrichError::MissingConfigError { .. } => {
                "Run with --help to see the expected configuration".to_string()
            }
            EnrichError::Cancelled => {
                "Partial results are kept in the cache; run again to resume".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Input => format!("Input file problem: {}", self),
            ErrorCategory::Network => format!("Network problem: {}", self),
            ErrorCategory::Storage => format!("Storage problem: {}", self),
            ErrorCategory::Cancelled => "Run cancelled by the caller".to_string(),
        }
    }
}
