//! Per-call request options

use crate::error::{ApiError, ApiResult};
use crate::query::QueryParams;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::multipart::Form;
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

/// Request payload
#[derive(Debug)]
pub enum RequestBody {
    /// Serialized as JSON with `Content-Type: application/json`
    Json(Value),
    /// Multipart form sent as-is; the transport sets the boundary header
    Form(Form),
}

/// Everything a single call can customize
#[derive(Debug)]
pub struct RequestOptions {
    /// HTTP verb
    pub method: Method,
    /// Headers that override the client defaults on key collision
    pub headers: HeaderMap,
    /// Query parameters appended to the endpoint
    pub query: Option<QueryParams>,
    /// Request payload, ignored for GET
    pub body: Option<RequestBody>,
    /// Overrides the client's configured timeout
    pub timeout: Option<Duration>,
}

impl RequestOptions {
    /// Options for the given verb with no headers, body or query
    #[must_use]
    pub fn new(method: Method) -> Self {
        Self {
            method,
            headers: HeaderMap::new(),
            query: None,
            body: None,
            timeout: None,
        }
    }

    /// GET options
    #[must_use]
    pub fn get() -> Self {
        Self::new(Method::GET)
    }

    /// POST options
    #[must_use]
    pub fn post() -> Self {
        Self::new(Method::POST)
    }

    /// PUT options
    #[must_use]
    pub fn put() -> Self {
        Self::new(Method::PUT)
    }

    /// PATCH options
    #[must_use]
    pub fn patch() -> Self {
        Self::new(Method::PATCH)
    }

    /// DELETE options
    #[must_use]
    pub fn delete() -> Self {
        Self::new(Method::DELETE)
    }

    /// Override a header for this call
    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Override a header given as strings
    pub fn header(self, name: &str, value: &str) -> ApiResult<Self> {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| ApiError::invalid_header(format!("{name}: {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| ApiError::invalid_header(format!("{name}: {e}")))?;
        Ok(self.with_header(name, value))
    }

    /// Attach query parameters
    #[must_use]
    pub fn with_query(mut self, query: QueryParams) -> Self {
        self.query = Some(query);
        self
    }

    /// Attach a JSON body
    pub fn with_json<B: Serialize + ?Sized>(mut self, body: &B) -> ApiResult<Self> {
        self.body = Some(RequestBody::Json(serde_json::to_value(body)?));
        Ok(self)
    }

    /// Attach a multipart form body
    #[must_use]
    pub fn with_form(mut self, form: Form) -> Self {
        self.body = Some(RequestBody::Form(form));
        self
    }

    /// Set the timeout for this call
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}
