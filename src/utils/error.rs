use thiserror::Error;

#[derive(Error, Debug)]
pub enum GradebookError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("{message}")]
    ApiError { status: u16, message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("{message}")]
    ValidationError { message: String },

    #[error("Invalid token: {message}")]
    TokenError { message: String },

    #[error("Not logged in")]
    NotAuthenticated,

    #[error("This action requires the {required} role (current role: {actual})")]
    RoleNotPermitted { required: String, actual: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Server,
    Configuration,
    Input,
    Authentication,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl GradebookError {
    pub fn validation(message: impl Into<String>) -> Self {
        GradebookError::ValidationError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            GradebookError::HttpError(_) => ErrorCategory::Network,
            GradebookError::ApiError { status, .. } if *status == 401 || *status == 403 => {
                ErrorCategory::Authentication
            }
            GradebookError::ApiError { .. } => ErrorCategory::Server,
            GradebookError::IoError(_) => ErrorCategory::System,
            GradebookError::SerializationError(_) => ErrorCategory::Server,
            GradebookError::ConfigError { .. }
            | GradebookError::ConfigValidationError { .. }
            | GradebookError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            GradebookError::ValidationError { .. } => ErrorCategory::Input,
            GradebookError::TokenError { .. }
            | GradebookError::NotAuthenticated
            | GradebookError::RoleNotPermitted { .. } => ErrorCategory::Authentication,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Input => ErrorSeverity::Low,
            ErrorCategory::Network | ErrorCategory::Server => ErrorSeverity::Medium,
            ErrorCategory::Authentication | ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// 使用者看到的訊息：API 錯誤直接顯示伺服器回傳的文字
    pub fn user_friendly_message(&self) -> String {
        match self {
            GradebookError::HttpError(e) if e.is_timeout() => {
                "The server did not answer in time".to_string()
            }
            GradebookError::HttpError(e) if e.is_connect() => {
                "Could not connect to the server".to_string()
            }
            GradebookError::SerializationError(_) => {
                "The server sent a response that could not be read".to_string()
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            GradebookError::HttpError(_) => "Check that the backend is running and base_url is correct",
            GradebookError::ApiError { status, .. } if *status == 401 => {
                "Your session may have expired, run `gradebook login` again"
            }
            GradebookError::ApiError { status, .. } if *status == 403 => {
                "Your account is not allowed to do this"
            }
            GradebookError::ApiError { .. } => "Retry the command; if it keeps failing check the server logs",
            GradebookError::IoError(_) => "Check permissions of the session file location",
            GradebookError::SerializationError(_) => "Make sure the client and backend versions match",
            GradebookError::ConfigError { .. }
            | GradebookError::ConfigValidationError { .. }
            | GradebookError::InvalidConfigValueError { .. } => "Fix the configuration file or command-line flags",
            GradebookError::ValidationError { .. } => "Correct the input and try again",
            GradebookError::TokenError { .. } | GradebookError::NotAuthenticated => {
                "Run `gradebook login` first"
            }
            GradebookError::RoleNotPermitted { .. } => "Log in with an account that has the required role",
        }
    }
}

pub type Result<T> = std::result::Result<T, GradebookError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_displays_server_text_only() {
        let err = GradebookError::ApiError {
            status: 400,
            message: "Email already in use".to_string(),
        };
        assert_eq!(err.to_string(), "Email already in use");
        assert_eq!(err.user_friendly_message(), "Email already in use");
        assert_eq!(err.category(), ErrorCategory::Server);
        assert_eq!(err.severity(), ErrorSeverity::Medium);
    }

    #[test]
    fn unauthorized_status_is_an_authentication_problem() {
        let err = GradebookError::ApiError {
            status: 401,
            message: "Unauthorized".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Authentication);
        assert!(err.recovery_suggestion().contains("login"));
    }

    #[test]
    fn form_errors_are_low_severity() {
        let err = GradebookError::validation("Please fill in all required fields");
        assert_eq!(err.severity(), ErrorSeverity::Low);
        assert_eq!(err.to_string(), "Please fill in all required fields");
    }
}
