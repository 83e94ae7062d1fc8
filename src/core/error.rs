//! Error types for the logger system

pub type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// IO error with context
    #[error("IO error while {operation}: {message}")]
    IoOperation {
        operation: String,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Network transport failure (connection refused, DNS, timeout, ...)
    #[error("Transport error sending to '{endpoint}': {message}")]
    Transport { endpoint: String, message: String },

    /// Endpoint answered with a non-success status
    #[error("Delivery to '{endpoint}' rejected with status {status}")]
    DeliveryRejected { endpoint: String, status: u16 },

    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// File append failure
    #[error("File writer error for '{path}': {message}")]
    FileAppend { path: String, message: String },

    /// File rotation error
    #[error("File rotation failed for '{path}': {message}")]
    FileRotation { path: String, message: String },

    /// A writer failed while receiving an entry
    #[error("Writer '{writer}' failed: {message}")]
    WriterFailed { writer: String, message: String },

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl LoggerError {
    /// Create an IO operation error with context
    pub fn io_operation(
        operation: impl Into<String>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        LoggerError::IoOperation {
            operation: operation.into(),
            message: message.into(),
            source,
        }
    }

    /// Create a transport error
    pub fn transport(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::Transport {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    /// Create a rejected-delivery error
    pub fn rejected(endpoint: impl Into<String>, status: u16) -> Self {
        LoggerError::DeliveryRejected {
            endpoint: endpoint.into(),
            status,
        }
    }

    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create a file append error
    pub fn file_append(path: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::FileAppend {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a file rotation error
    pub fn file_rotation(path: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::FileRotation {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a writer failure
    pub fn writer(writer: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::WriterFailed {
            writer: writer.into(),
            message: message.into(),
        }
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        LoggerError::Other(msg.into())
    }
}
