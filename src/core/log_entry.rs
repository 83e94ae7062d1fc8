//! Log entry structure

use super::error::Result;
use super::log_level::{LogLevel, LogSource};
use super::metadata::{FieldValue, Metadata};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Metadata keys that are promoted to dedicated entry fields
pub mod keys {
    pub const CORRELATION_ID: &str = "correlationId";
    pub const REQUEST_ID: &str = "requestId";
    pub const USER_ID: &str = "userId";
    pub const DURATION: &str = "duration";
    pub const ERROR: &str = "error";
}

/// Serialisable description of a failure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub name: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

impl ErrorInfo {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            stack: None,
        }
    }

    #[must_use]
    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    /// Describe a `std::error::Error`.
    ///
    /// The name is the error's type name and the stack, when present, is the
    /// chain of `source()` errors.
    pub fn from_error<E: std::error::Error + ?Sized>(error: &E) -> Self {
        let mut chain = Vec::new();
        let mut current = error.source();
        while let Some(cause) = current {
            chain.push(format!("Caused by: {}", cause));
            current = cause.source();
        }

        Self {
            name: short_type_name::<E>(),
            message: error.to_string(),
            stack: if chain.is_empty() {
                None
            } else {
                Some(chain.join("\n"))
            },
        }
    }

    /// Describe any displayable error value (e.g. `anyhow::Error`, `String`)
    pub fn from_display<E: fmt::Display + ?Sized>(error: &E) -> Self {
        Self::new(short_type_name::<E>(), error.to_string())
    }

    pub fn to_metadata(&self) -> Metadata {
        let mut metadata = Metadata::new()
            .with_field("name", self.name.as_str())
            .with_field("message", self.message.as_str());
        if let Some(ref stack) = self.stack {
            metadata.insert("stack", stack.as_str());
        }
        metadata
    }

    /// Recognise an error object carried inside metadata.
    ///
    /// Only maps with a string `message` qualify; `name` defaults to `Error`.
    pub fn from_field(value: &FieldValue) -> Option<Self> {
        let map = value.as_map()?;
        let message = map.get("message")?.as_str()?;
        let name = map
            .get("name")
            .and_then(FieldValue::as_str)
            .unwrap_or("Error");
        let stack = map
            .get("stack")
            .and_then(FieldValue::as_str)
            .map(str::to_string);

        Some(Self {
            name: name.to_string(),
            message: message.to_string(),
            stack,
        })
    }
}

impl fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.message)
    }
}

impl From<ErrorInfo> for FieldValue {
    fn from(error: ErrorInfo) -> Self {
        FieldValue::Map(error.to_metadata())
    }
}

impl From<&ErrorInfo> for FieldValue {
    fn from(error: &ErrorInfo) -> Self {
        FieldValue::Map(error.to_metadata())
    }
}

fn short_type_name<T: ?Sized>() -> String {
    let full = std::any::type_name::<T>();
    let without_generics = full.split('<').next().unwrap_or(full);
    without_generics
        .rsplit("::")
        .next()
        .unwrap_or(without_generics)
        .trim_start_matches("dyn ")
        .to_string()
}

/// One immutable structured log record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub source: LogSource,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Duration in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

impl LogEntry {
    /// Build an entry, hoisting well-known metadata keys to top-level fields.
    ///
    /// `correlationId`, `requestId`, `userId`, a numeric `duration` and an
    /// error object under `error` leave the metadata map. If nothing else is
    /// left, `metadata` is `None`.
    pub fn new(
        level: LogLevel,
        source: LogSource,
        message: impl Into<String>,
        mut metadata: Metadata,
    ) -> Self {
        let correlation_id = take_identifier(&mut metadata, keys::CORRELATION_ID);
        let request_id = take_identifier(&mut metadata, keys::REQUEST_ID);
        let user_id = take_identifier(&mut metadata, keys::USER_ID);
        let duration = take_duration(&mut metadata);
        let error = take_error(&mut metadata);

        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            level,
            source,
            message: message.into(),
            correlation_id,
            request_id,
            user_id,
            duration,
            error,
            metadata: if metadata.is_empty() {
                None
            } else {
                Some(metadata)
            },
        }
    }

    /// Serialise as a single JSON line (no trailing newline)
    pub fn to_json_line(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn metadata_value(&self, key: &str) -> Option<&FieldValue> {
        self.metadata.as_ref().and_then(|m| m.get(key))
    }
}

fn take_identifier(metadata: &mut Metadata, key: &str) -> Option<String> {
    match metadata.get(key)? {
        FieldValue::Array(_) | FieldValue::Map(_) => None,
        _ => match metadata.remove(key)? {
            FieldValue::Null => None,
            FieldValue::String(s) => Some(s),
            other => Some(other.to_string()),
        },
    }
}

fn take_duration(metadata: &mut Metadata) -> Option<f64> {
    let value = metadata.get(keys::DURATION)?;
    if value.is_null() {
        metadata.remove(keys::DURATION);
        return None;
    }
    let duration = value.as_f64()?;
    metadata.remove(keys::DURATION);
    Some(duration)
}

fn take_error(metadata: &mut Metadata) -> Option<ErrorInfo> {
    let value = metadata.get(keys::ERROR)?;
    if value.is_null() {
        metadata.remove(keys::ERROR);
        return None;
    }
    let error = ErrorInfo::from_field(value)?;
    metadata.remove(keys::ERROR);
    Some(error)
}
