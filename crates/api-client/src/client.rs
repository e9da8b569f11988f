//! Main API client implementation

use crate::config::ClientConfig;
use crate::envelope::{self, ApiResponse};
use crate::error::{ApiError, ApiResult};
use crate::query::QueryParams;
use crate::request::{RequestBody, RequestOptions};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::multipart::Form;
use reqwest::{Client, Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};
use tracing::{debug, field, instrument, warn, Span};
use uuid::Uuid;

/// Request correlation ID header
const X_REQUEST_ID: &str = "x-request-id";

/// Rewards backend API client
///
/// Cloning is cheap and every clone shares the same base URL, default
/// headers and bearer token, so a token set after login is visible to every
/// service holding a clone. Request methods never fail: transport errors,
/// timeouts and non-2xx statuses all come back as
/// [`ApiResponse::Failure`].
#[derive(Clone)]
pub struct ApiClient {
    inner: Client,
    config: Arc<ClientConfig>,
    state: Arc<RwLock<ClientState>>,
}

/// Mutable part of the client, last writer wins
#[derive(Debug)]
struct ClientState {
    base_url: String,
    default_headers: HeaderMap,
    auth_token: Option<String>,
}

impl ApiClient {
    /// Create a new client with configuration from the environment
    pub fn new() -> ApiResult<Self> {
        let config = ClientConfig::from_env()?;
        Self::with_config(config)
    }

    /// Create a new client with specific configuration
    pub fn with_config(config: ClientConfig) -> ApiResult<Self> {
        config.validate()?;

        let mut default_headers = HeaderMap::new();
        default_headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        default_headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let inner = Client::builder()
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(ApiError::Request)?;

        let state = ClientState {
            base_url: config.base_url.clone(),
            default_headers,
            auth_token: None,
        };

        Ok(Self {
            inner,
            config: Arc::new(config),
            state: Arc::new(RwLock::new(state)),
        })
    }

    /// Configuration the client was built with
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn read_state(&self) -> RwLockReadGuard<'_, ClientState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, ClientState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    // -------------------------------------------------------------------------
    // Lifecycle state
    // -------------------------------------------------------------------------

    /// Set or clear the bearer token sent with every request
    ///
    /// A token that cannot be encoded as a header value is ignored and the
    /// previous state is kept.
    pub fn set_auth_token(&self, token: Option<&str>) {
        let mut state = self.write_state();
        match token {
            Some(token) => match HeaderValue::from_str(&format!("Bearer {token}")) {
                Ok(mut value) => {
                    value.set_sensitive(true);
                    state.default_headers.insert(AUTHORIZATION, value);
                    state.auth_token = Some(token.to_string());
                    debug!("Auth token set");
                }
                Err(_) => warn!("Ignoring auth token with characters not allowed in a header"),
            },
            None => {
                state.default_headers.remove(AUTHORIZATION);
                state.auth_token = None;
                debug!("Auth token cleared");
            }
        }
    }

    /// Currently stored bearer token
    #[must_use]
    pub fn auth_token(&self) -> Option<String> {
        self.read_state().auth_token.clone()
    }

    /// Replace the base URL used by subsequent requests
    pub fn set_base_url(&self, url: impl Into<String>) {
        self.write_state().base_url = url.into();
    }

    /// Get the base URL
    #[must_use]
    pub fn base_url(&self) -> String {
        self.read_state().base_url.clone()
    }

    /// Default headers as they would be sent right now
    #[must_use]
    pub fn default_headers(&self) -> HeaderMap {
        self.read_state().default_headers.clone()
    }

    // -------------------------------------------------------------------------
    // Verb helpers
    // -------------------------------------------------------------------------

    /// Perform a GET request
    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> ApiResponse<T> {
        self.request(endpoint, RequestOptions::get()).await
    }

    /// Perform a GET request with query parameters
    ///
    /// `params` may be a [`QueryParams`], a `serde_json::Value` object or any
    /// serializable struct; keys whose value is null or `None` are dropped.
    pub async fn get_with_params<T, Q>(&self, endpoint: &str, params: &Q) -> ApiResponse<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        match QueryParams::from_serialize(params) {
            Ok(query) => {
                self.request(endpoint, RequestOptions::get().with_query(query))
                    .await
            }
            Err(e) => e.into(),
        }
    }

    /// Perform a POST request with a JSON body
    pub async fn post<T, B>(&self, endpoint: &str, body: &B) -> ApiResponse<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send_json(RequestOptions::post(), endpoint, body).await
    }

    /// Perform a PUT request with a JSON body
    pub async fn put<T, B>(&self, endpoint: &str, body: &B) -> ApiResponse<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send_json(RequestOptions::put(), endpoint, body).await
    }

    /// Perform a PATCH request with a JSON body
    pub async fn patch<T, B>(&self, endpoint: &str, body: &B) -> ApiResponse<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send_json(RequestOptions::patch(), endpoint, body).await
    }

    /// Perform a DELETE request
    pub async fn delete<T: DeserializeOwned>(&self, endpoint: &str) -> ApiResponse<T> {
        self.request(endpoint, RequestOptions::delete()).await
    }

    /// Upload a multipart form with POST
    pub async fn upload_file<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        form: Form,
    ) -> ApiResponse<T> {
        self.request(endpoint, RequestOptions::post().with_form(form))
            .await
    }

    /// Probe `<base URL without /api>/health`
    pub async fn health_check(&self) -> ApiResponse<Value> {
        let url = health_url(&self.base_url());
        self.send(url, RequestOptions::get()).await
    }

    /// GET with the elapsed wall time
    pub async fn timed_get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
    ) -> (ApiResponse<T>, Duration) {
        let start = Instant::now();
        let response = self.get(endpoint).await;
        (response, start.elapsed())
    }

    /// Health probe with the elapsed wall time
    pub async fn timed_health_check(&self) -> (ApiResponse<Value>, Duration) {
        let start = Instant::now();
        let response = self.health_check().await;
        (response, start.elapsed())
    }

    async fn send_json<T, B>(
        &self,
        options: RequestOptions,
        endpoint: &str,
        body: &B,
    ) -> ApiResponse<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        match options.with_json(body) {
            Ok(options) => self.request(endpoint, options).await,
            Err(e) => e.into(),
        }
    }

    // -------------------------------------------------------------------------
    // Request pipeline
    // -------------------------------------------------------------------------

    /// Perform a request against `base_url + endpoint`
    ///
    /// `endpoint` carries its leading slash.
    pub async fn request<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> ApiResponse<T> {
        let url = format!("{}{endpoint}", self.base_url());
        self.send(url, options).await
    }

    #[instrument(
        skip(self, options),
        fields(method = %options.method, request_id = field::Empty)
    )]
    async fn send<T: DeserializeOwned>(
        &self,
        url: String,
        options: RequestOptions,
    ) -> ApiResponse<T> {
        let request_id = Uuid::new_v4().to_string();
        Span::current().record("request_id", request_id.as_str());

        let timeout = options.timeout.unwrap_or(self.config.timeout);
        let builder = match self.prepare(&url, options, &request_id) {
            Ok(builder) => builder,
            Err(e) => {
                warn!(error = %e, "Request could not be built");
                return e.into();
            }
        };

        let start = Instant::now();
        let outcome = tokio::time::timeout(timeout, execute::<T>(builder)).await;
        let elapsed_ms = millis(start.elapsed());

        match outcome {
            Ok(Ok(response)) => {
                debug!(
                    elapsed_ms,
                    success = response.is_success(),
                    "Request completed"
                );
                response
            }
            Ok(Err(e)) => {
                warn!(elapsed_ms, error = %e, "Request failed");
                e.into()
            }
            Err(_) => {
                warn!(timeout_ms = millis(timeout), "Request timed out, aborted");
                ApiError::Timeout(timeout).into()
            }
        }
    }

    /// Build the outgoing request: URL, merged headers and encoded body
    fn prepare(
        &self,
        url: &str,
        options: RequestOptions,
        request_id: &str,
    ) -> ApiResult<RequestBuilder> {
        let mut url =
            Url::parse(url).map_err(|e| ApiError::invalid_url(format!("{url}: {e}")))?;
        if let Some(query) = &options.query {
            query.append_to(&mut url);
        }

        let mut headers = self.default_headers();
        headers.extend(options.headers);
        headers.insert(
            X_REQUEST_ID,
            HeaderValue::from_str(request_id).map_err(|e| ApiError::invalid_header(e.to_string()))?,
        );

        debug!(url = %url, "Sending request");
        let mut builder = self.inner.request(options.method.clone(), url);

        match options.body {
            Some(_) if options.method == Method::GET => {
                debug!("Dropping body on GET request");
            }
            Some(RequestBody::Json(value)) => {
                headers
                    .entry(CONTENT_TYPE)
                    .or_insert(HeaderValue::from_static("application/json"));
                builder = builder.json(&value);
            }
            Some(RequestBody::Form(form)) => {
                headers.remove(CONTENT_TYPE);
                builder = builder.multipart(form);
            }
            None => {}
        }

        Ok(builder.headers(headers))
    }
}

/// Send the request and normalize whatever comes back
async fn execute<T: DeserializeOwned>(builder: RequestBuilder) -> ApiResult<ApiResponse<T>> {
    let response = builder.send().await?;
    let status = response.status();
    let body = response.bytes().await?;
    debug!(status = status.as_u16(), bytes = body.len(), "Response received");
    Ok(envelope::normalize(status, &body))
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Health endpoint lives beside the `/api` namespace, not inside it
fn health_url(base_url: &str) -> String {
    let base = base_url.trim_end_matches('/');
    let origin = base.strip_suffix("/api").unwrap_or(base);
    format!("{origin}/health")
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.read_state();
        f.debug_struct("ApiClient")
            .field("base_url", &state.base_url)
            .field("authenticated", &state.auth_token.is_some())
            .field("timeout", &self.config.timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client() -> ApiClient {
        ApiClient::with_config(ClientConfig::default().with_base_url("https://api.example.com/api"))
            .unwrap()
    }

    fn build(client: &ApiClient, endpoint: &str, options: RequestOptions) -> reqwest::Request {
        let url = format!("{}{endpoint}", client.base_url());
        client
            .prepare(&url, options, "00000000-0000-0000-0000-000000000000")
            .unwrap()
            .build()
            .unwrap()
    }

    #[test]
    fn test_client_creation() {
        let config = ClientConfig::development();
        let client = ApiClient::with_config(config);
        assert!(client.is_ok());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ClientConfig::default().with_base_url("localhost");
        let err = ApiClient::with_config(config).unwrap_err();
        assert!(matches!(err, ApiError::Config(_)));
    }

    #[test]
    fn test_health_url() {
        assert_eq!(health_url("https://api.example.com/api"), "https://api.example.com/health");
        assert_eq!(health_url("https://api.example.com/api/"), "https://api.example.com/health");
        assert_eq!(health_url("http://localhost:3000"), "http://localhost:3000/health");
    }

    #[test]
    fn test_base_url_setter_is_exact() {
        let client = client();
        client.set_base_url("http://127.0.0.1:9999/api");
        assert_eq!(client.base_url(), "http://127.0.0.1:9999/api");
    }

    #[test]
    fn test_auth_token_lifecycle() {
        let client = client();
        assert_eq!(client.auth_token(), None);

        client.set_auth_token(Some("abc"));
        assert_eq!(client.auth_token().as_deref(), Some("abc"));
        let request = build(&client, "/me", RequestOptions::get());
        assert_eq!(request.headers()[AUTHORIZATION], "Bearer abc");

        client.set_auth_token(None);
        assert_eq!(client.auth_token(), None);
        let request = build(&client, "/me", RequestOptions::get());
        assert!(request.headers().get(AUTHORIZATION).is_none());
    }

    #[test]
    fn test_auth_token_shared_between_clones() {
        let client = client();
        let service_copy = client.clone();
        client.set_auth_token(Some("shared"));
        assert_eq!(service_copy.auth_token().as_deref(), Some("shared"));
    }

    #[test]
    fn test_invalid_auth_token_is_ignored() {
        let client = client();
        client.set_auth_token(Some("good"));
        client.set_auth_token(Some("bad\ntoken"));
        assert_eq!(client.auth_token().as_deref(), Some("good"));
    }

    #[test]
    fn test_get_request_shape() {
        let client = client();
        let query = QueryParams::new().insert("limit", 5).insert_opt("category", None::<&str>);
        let request = build(&client, "/offers", RequestOptions::get().with_query(query));

        assert_eq!(request.method(), Method::GET);
        assert_eq!(request.url().as_str(), "https://api.example.com/api/offers?limit=5");
        assert_eq!(request.headers()[X_REQUEST_ID], "00000000-0000-0000-0000-000000000000");
        assert!(request.body().is_none());
    }

    #[test]
    fn test_json_body_sets_content_type() {
        let client = client();
        let options = RequestOptions::post()
            .with_json(&json!({"street": "1 Main St"}))
            .unwrap();
        let request = build(&client, "/addresses", options);

        assert_eq!(request.headers()[CONTENT_TYPE], "application/json");
        let bytes = request.body().and_then(reqwest::Body::as_bytes).unwrap();
        let sent: Value = serde_json::from_slice(bytes).unwrap();
        assert_eq!(sent, json!({"street": "1 Main St"}));
    }

    #[test]
    fn test_form_body_drops_json_content_type() {
        let client = client();
        let form = Form::new().text("caption", "receipt");
        let request = build(&client, "/uploads", RequestOptions::post().with_form(form));

        let content_type = request.headers()[CONTENT_TYPE].to_str().unwrap();
        assert!(content_type.starts_with("multipart/form-data; boundary="));
        assert_eq!(request.headers().get_all(CONTENT_TYPE).iter().count(), 1);
    }

    #[test]
    fn test_header_overrides_win() {
        let client = client();
        client.set_auth_token(Some("default"));
        let options = RequestOptions::get()
            .header("Authorization", "Bearer override")
            .unwrap()
            .header("X-Client", "mobile")
            .unwrap();
        let request = build(&client, "/me", options);

        assert_eq!(request.headers()[AUTHORIZATION], "Bearer override");
        assert_eq!(request.headers()["x-client"], "mobile");
        assert_eq!(request.headers()[ACCEPT], "application/json");
    }

    #[test]
    fn test_get_drops_body() {
        let client = client();
        let options = RequestOptions::get().with_json(&json!({"ignored": true})).unwrap();
        let request = build(&client, "/offers", options);
        assert!(request.body().is_none());
    }

    #[test]
    fn test_invalid_base_url_becomes_failure_envelope() {
        let client = client();
        client.set_base_url("not a url");
        let response: ApiResponse<Value> = tokio_test::block_on(client.get("/offers"));
        assert!(response.is_failure());
        assert!(response.error().unwrap().starts_with("Invalid URL: not a url/offers"));
    }

    #[test]
    fn test_non_object_params_become_failure_envelope() {
        let client = client();
        let response: ApiResponse<Value> =
            tokio_test::block_on(client.get_with_params("/offers", &[1, 2, 3]));
        assert!(response.error().unwrap().starts_with("Invalid query parameters"));
    }
}
