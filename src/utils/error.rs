use crate::domain::model::MethodStatus;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HostError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid argument for {method}: {message}")]
    InvalidArgument { method: String, message: String },

    #[error("Class not found: {class}")]
    ClassNotFound { class: String },

    #[error("Method not found: {method}")]
    MethodNotFound { method: String },

    #[error("[{}] {message}", .status.code())]
    Remote {
        status: MethodStatus,
        message: String,
    },

    #[error("Transport error: {message}")]
    Transport { message: String },

    #[error("Connection closed")]
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl HostError {
    pub fn invalid_argument(method: &str, message: impl Into<String>) -> Self {
        HostError::InvalidArgument {
            method: method.to_string(),
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        HostError::Transport {
            message: message.into(),
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            HostError::InvalidArgument { .. }
            | HostError::ClassNotFound { .. }
            | HostError::MethodNotFound { .. }
            | HostError::Remote { .. } => ErrorSeverity::Low,
            HostError::Closed | HostError::Transport { .. } => ErrorSeverity::Medium,
            HostError::ConfigError { .. }
            | HostError::InvalidConfigValueError { .. }
            | HostError::MissingConfigError { .. }
            | HostError::SerializationError(_) => ErrorSeverity::High,
            HostError::IoError(_) => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            HostError::ConfigError { .. }
            | HostError::InvalidConfigValueError { .. }
            | HostError::MissingConfigError { .. } => {
                "Check the TOML configuration file and command line overrides"
            }
            HostError::ClassNotFound { .. } | HostError::MethodNotFound { .. } => {
                "Verify the contract and method names, and the number of arguments"
            }
            HostError::InvalidArgument { .. } | HostError::SerializationError(_) => {
                "Check that the call arguments match the method signature"
            }
            HostError::Transport { .. } | HostError::Closed => {
                "Make sure the host process is running and its stdio is connected"
            }
            HostError::Remote { .. } => "Inspect the host log for the failing call",
            HostError::IoError(_) => "Check file paths and permissions",
        }
    }
}

pub type Result<T> = std::result::Result<T, HostError>;
