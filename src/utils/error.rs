use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("Date unavailable: {date}")]
    DateUnavailable { date: String },

    #[error("Query failed for {date}: {reason}")]
    QueryFailed { date: String, reason: String },

    #[error("Element not found: {locator}")]
    ElementNotFound { locator: String },

    #[error("Option '{value}' not offered by select '{field}'")]
    OptionNotFound { field: String, value: String },

    #[error("Browser session error: {message}")]
    SessionError { message: String },

    #[error("WebDriver error: {0}")]
    WebDriverError(#[from] thirtyfour::error::WebDriverError),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
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
    Query,
    Browser,
    Output,
    Configuration,
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
            EtlError::DateUnavailable { .. } | EtlError::QueryFailed { .. } => ErrorCategory::Query,
            EtlError::ElementNotFound { .. }
            | EtlError::OptionNotFound { .. }
            | EtlError::SessionError { .. }
            | EtlError::WebDriverError(_) => ErrorCategory::Browser,
            EtlError::CsvError(_) | EtlError::IoError(_) => ErrorCategory::Output,
            EtlError::ConfigError { .. } | EtlError::InvalidConfigValueError { .. } => {
                ErrorCategory::Configuration
            }
            EtlError::ProcessingError { .. } => ErrorCategory::Processing,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            EtlError::DateUnavailable { .. } => ErrorSeverity::Low,
            EtlError::QueryFailed { .. } => ErrorSeverity::Medium,
            EtlError::ElementNotFound { .. }
            | EtlError::OptionNotFound { .. }
            | EtlError::ProcessingError { .. } => ErrorSeverity::Medium,
            EtlError::CsvError(_)
            | EtlError::IoError(_)
            | EtlError::ConfigError { .. }
            | EtlError::InvalidConfigValueError { .. } => ErrorSeverity::High,
            EtlError::SessionError { .. } | EtlError::WebDriverError(_) => ErrorSeverity::Critical,
        }
    }

    /// Per-date errors that the scrape loop absorbs without aborting the run.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            EtlError::DateUnavailable { .. } | EtlError::QueryFailed { .. }
        )
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Query => "The date is skipped; re-run later or shorten the search window",
            ErrorCategory::Browser => {
                "Make sure chromedriver is running and reachable at the configured webdriver_url"
            }
            ErrorCategory::Output => "Check that the output directory is writable",
            ErrorCategory::Configuration => "Fix the configuration file and try again",
            ErrorCategory::Processing => "The site layout may have changed; inspect the page manually",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            EtlError::DateUnavailable { date } => format!("{} cannot be selected on the site", date),
            EtlError::QueryFailed { date, reason } => format!("Search for {} failed: {}", date, reason),
            EtlError::SessionError { message } => format!("Browser session failed: {}", message),
            EtlError::WebDriverError(e) => format!("Browser automation failed: {}", e),
            EtlError::IoError(e) => format!("Could not write output: {}", e),
            EtlError::CsvError(e) => format!("Could not encode CSV output: {}", e),
            other => other.to_string(),
        }
    }
}

impl From<toml::de::Error> for EtlError {
    fn from(e: toml::de::Error) -> Self {
        EtlError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
