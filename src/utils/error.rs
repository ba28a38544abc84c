use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("Configuration error ({field}): {message}")]
    Configuration { field: String, message: String },

    #[error("Settings file '{path}': {message}")]
    SettingsFile { path: String, message: String },

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidConfigValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Invalid input file '{path}': {reason}")]
    InvalidInput { path: String, reason: String },

    #[error("Failed to parse '{path}': {message}")]
    Parse { path: String, message: String },

    #[error("No service tags in '{path}'")]
    EmptyInput { path: String },

    #[error("Authentication failed{}: {message}", status_suffix(.status))]
    Authentication {
        status: Option<StatusCode>,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Entitlement request failed{}: {message}", status_suffix(.status))]
    Fetch {
        status: Option<StatusCode>,
        message: String,
    },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn status_suffix(status: &Option<StatusCode>) -> String {
    status.map(|s| format!(" ({})", s)).unwrap_or_default()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Input,
    Authentication,
    Api,
    Network,
    Output,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EtlError {
    pub fn authentication(status: Option<StatusCode>, message: impl Into<String>) -> Self {
        Self::Authentication {
            status,
            message: message.into(),
            source: None,
        }
    }

    pub fn fetch(status: Option<StatusCode>, message: impl Into<String>) -> Self {
        Self::Fetch {
            status,
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Configuration { .. }
            | Self::SettingsFile { .. }
            | Self::InvalidConfigValue { .. } => {
                ErrorCategory::Configuration
            }
            Self::InvalidInput { .. } | Self::Parse { .. } | Self::EmptyInput { .. } => {
                ErrorCategory::Input
            }
            Self::Authentication { .. } => ErrorCategory::Authentication,
            Self::Fetch { .. } => ErrorCategory::Api,
            Self::Network(_) => ErrorCategory::Network,
            Self::Csv(_) | Self::Io(_) => ErrorCategory::Output,
        }
    }

    /// Drives the process exit code: Medium errors may succeed on a rerun,
    /// High errors need operator action, Critical errors are local I/O faults.
    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Api => match self {
                Self::Fetch {
                    status: Some(status),
                    ..
                } if status.is_server_error() => ErrorSeverity::Medium,
                _ => ErrorSeverity::High,
            },
            ErrorCategory::Configuration
            | ErrorCategory::Input
            | ErrorCategory::Authentication => ErrorSeverity::High,
            ErrorCategory::Output => ErrorSeverity::Critical,
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::Configuration { message, .. } => format!("API Key Client ID or Secret Missing: {}", message),
            Self::SettingsFile { path, message } => {
                format!("Cannot load the settings file '{}': {}", path, message)
            }
            Self::InvalidConfigValue { field, reason, .. } => {
                format!("Setting '{}' is invalid: {}", field, reason)
            }
            Self::InvalidInput { path, reason } => format!("Cannot use '{}': {}", path, reason),
            Self::Parse { path, message } => format!("Error reading the file '{}': {}", path, message),
            Self::EmptyInput { path } => {
                format!("No Service Tags in the provided CSV file '{}'", path)
            }
            Self::Authentication { .. } => {
                format!("Failed to authenticate with Dell API. {}", self)
            }
            Self::Fetch { .. } => {
                format!("Failed to retrieve warranty data from Dell API. {}", self)
            }
            Self::Network(e) => format!("Could not reach the Dell API: {}", e),
            Self::Csv(e) => format!("Could not write the report: {}", e),
            Self::Io(e) => format!("File system error: {}", e),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::Configuration { .. } => {
                "Export DELL_CLIENT_ID and DELL_CLIENT_SECRET (or client_id / client_secret), or put them in a .env file"
            }
            Self::SettingsFile { .. } => {
                "Check the path given with -c and that the file is valid TOML with only an [api] section"
            }
            Self::InvalidConfigValue { .. } => "Fix the value in the settings file or on the command line",
            Self::InvalidInput { .. } => "Pass an existing .csv file with -f",
            Self::Parse { .. } => "Make sure the file is UTF-8 CSV with a header row containing a serviceTag column",
            Self::EmptyInput { .. } => "Add at least one service tag row below the header",
            Self::Authentication { .. } => {
                "Check the client ID and secret, and whether the API expects --token-mode basic"
            }
            Self::Fetch { .. } => "Check the service tags and that the API key is entitled to the warranty endpoint",
            Self::Network(_) => "Check network connectivity and retry",
            Self::Csv(_) | Self::Io(_) => "Check that the output location is writable and has free space",
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
