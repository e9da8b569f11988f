//! Uniform response envelope
//!
//! Every request method returns an [`ApiResponse`], whatever happened on the
//! wire. A response is either a success carrying an optional payload and
//! status message, or a failure carrying an error string and optional
//! field-level validation errors. [`normalize`] is the only place that turns
//! an HTTP status and body into an envelope.
//!
//! Serialized, an envelope takes the backend's wire shape:
//!
//! ```json
//! { "success": false, "error": "Invalid address", "errors": { "zip": ["required"] } }
//! ```

use crate::error::ApiError;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Field name to the list of validation messages reported for it
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Result of a single API call
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse<T> {
    /// 2xx response whose body parsed
    Success {
        /// Payload, unwrapped from a `data` key when the backend nests it
        data: Option<T>,
        /// Status text passed through from the backend
        message: Option<String>,
    },
    /// Non-2xx response or transport failure
    Failure {
        /// Backend `message`, a synthesized status line, or a transport error
        error: String,
        /// Field-level validation errors, passed through verbatim
        errors: Option<FieldErrors>,
    },
}

/// Failure half of an envelope, for callers that prefer `?`
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{error}")]
pub struct ApiFailure {
    /// Error text from the envelope
    pub error: String,
    /// Field-level validation errors, if the backend sent any
    pub errors: Option<FieldErrors>,
}

impl<T> ApiResponse<T> {
    /// Success with a payload
    pub fn success(data: T) -> Self {
        Self::Success {
            data: Some(data),
            message: None,
        }
    }

    /// Success with a payload and a status message
    pub fn success_with_message(data: T, message: impl Into<String>) -> Self {
        Self::Success {
            data: Some(data),
            message: Some(message.into()),
        }
    }

    /// Success without a payload (e.g. `"data": null`)
    pub fn empty() -> Self {
        Self::Success {
            data: None,
            message: None,
        }
    }

    /// Failure with an error string
    pub fn failure(error: impl Into<String>) -> Self {
        Self::Failure {
            error: error.into(),
            errors: None,
        }
    }

    /// Failure with field-level validation errors
    pub fn failure_with_errors(error: impl Into<String>, errors: FieldErrors) -> Self {
        Self::Failure {
            error: error.into(),
            errors: Some(errors),
        }
    }

    /// Whether the call succeeded
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Whether the call failed
    #[must_use]
    pub fn is_failure(&self) -> bool {
        !self.is_success()
    }

    /// Payload of a successful call
    pub fn data(&self) -> Option<&T> {
        match self {
            Self::Success { data, .. } => data.as_ref(),
            Self::Failure { .. } => None,
        }
    }

    /// Status message of a successful call
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Success { message, .. } => message.as_deref(),
            Self::Failure { .. } => None,
        }
    }

    /// Error text of a failed call
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { error, .. } => Some(error),
        }
    }

    /// Field-level validation errors of a failed call
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { errors, .. } => errors.as_ref(),
        }
    }

    /// Convert into a `Result`, dropping the success message
    pub fn into_result(self) -> Result<Option<T>, ApiFailure> {
        match self {
            Self::Success { data, .. } => Ok(data),
            Self::Failure { error, errors } => Err(ApiFailure { error, errors }),
        }
    }

    /// Transform the success payload, leaving failures untouched
    pub fn map<U, F>(self, f: F) -> ApiResponse<U>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            Self::Success { data, message } => ApiResponse::Success {
                data: data.map(f),
                message,
            },
            Self::Failure { error, errors } => ApiResponse::Failure { error, errors },
        }
    }
}

impl<T> From<ApiError> for ApiResponse<T> {
    fn from(err: ApiError) -> Self {
        Self::failure(err.envelope_message())
    }
}

#[derive(Serialize)]
struct WireEnvelope<'a, T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<&'a FieldErrors>,
}

impl<T: Serialize> Serialize for ApiResponse<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        WireEnvelope {
            success: self.is_success(),
            data: self.data(),
            message: self.message(),
            error: self.error(),
            errors: self.field_errors(),
        }
        .serialize(serializer)
    }
}

/// `HTTP <status>: <statusText>` line used when the backend gives no message
#[must_use]
pub fn status_line(status: StatusCode) -> String {
    format!(
        "HTTP {}: {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or_default()
    )
}

/// Turn an HTTP status and raw body into an envelope
///
/// A 2xx body that is not JSON, including an empty one, is a failure: the
/// response is malformed. On other statuses an unparseable body falls back to
/// the status line.
pub fn normalize<T: DeserializeOwned>(status: StatusCode, body: &[u8]) -> ApiResponse<T> {
    let parsed = match serde_json::from_slice::<Value>(body) {
        Ok(value) => value,
        Err(e) if status.is_success() => return ApiError::Json(e).into(),
        Err(_) => Value::Null,
    };

    if status.is_success() {
        normalize_success(parsed)
    } else {
        normalize_failure(status, parsed)
    }
}

fn normalize_success<T: DeserializeOwned>(body: Value) -> ApiResponse<T> {
    let (payload, message) = match body {
        Value::Object(mut map) if map.contains_key("data") => {
            let message = string_field(&map, "message");
            (map.remove("data").unwrap_or(Value::Null), message)
        }
        Value::Object(map) => {
            let message = string_field(&map, "message");
            (Value::Object(map), message)
        }
        other => (other, None),
    };

    match serde_json::from_value::<Option<T>>(payload) {
        Ok(data) => ApiResponse::Success { data, message },
        Err(e) => ApiError::Json(e).into(),
    }
}

fn normalize_failure<T>(status: StatusCode, body: Value) -> ApiResponse<T> {
    let mut map = match body {
        Value::Object(map) => map,
        _ => Map::new(),
    };

    let error = map
        .get("message")
        .and_then(error_text)
        .unwrap_or_else(|| status_line(status));

    let errors = map
        .remove("errors")
        .and_then(|value| serde_json::from_value::<FieldErrors>(value).ok());

    ApiResponse::Failure { error, errors }
}

fn string_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Backend error `message` as text; blank, zero, `false` and `null` count as absent
fn error_text(message: &Value) -> Option<String> {
    match message {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        other => Some(other.to_string()),
    }
}
