//! Typed API client for the rewards backend
//!
//! Every service in the application (orders, loyalty points, wishlists,
//! addresses, payment methods, ...) talks to the backend through one
//! [`ApiClient`]. The client owns the base URL, default headers and the
//! bearer-token lifecycle, and it normalizes every outcome into the same
//! [`ApiResponse`] envelope, so callers only deal with typed request/response
//! pairs.
//!
//! # Features
//!
//! - **Environment-based configuration**: base URL and timeout from env vars
//! - **Uniform envelope**: success and failure share one shape, never an `Err`
//! - **Auth token lifecycle**: set after login, cleared at logout, shared by clones
//! - **Per-request timeout**: slow calls are aborted with `"Request timeout"`
//! - **Request correlation**: each request carries a unique `X-Request-ID`
//!
//! # Example
//!
//! ```rust,no_run
//! use rewards_api_client::{ApiClient, QueryParams};
//! use serde::Deserialize;
//!
//! #[derive(Debug, Deserialize)]
//! struct Offer {
//!     id: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ApiClient::new()?;
//!     client.set_auth_token(Some("token-from-login"));
//!
//!     let params = QueryParams::new().insert("limit", 5);
//!     let offers = client.get_with_params::<Vec<Offer>, _>("/offers", &params).await;
//!
//!     match offers.into_result() {
//!         Ok(list) => println!("Got {} offers", list.unwrap_or_default().len()),
//!         Err(failure) => eprintln!("Could not load offers: {failure}"),
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod config;
pub mod envelope;
pub mod error;
pub mod query;
pub mod request;

pub use client::ApiClient;
pub use config::ClientConfig;
pub use envelope::{ApiFailure, ApiResponse, FieldErrors};
pub use error::{ApiError, ApiResult};
pub use query::QueryParams;
pub use request::{RequestBody, RequestOptions};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::client::ApiClient;
    pub use crate::config::ClientConfig;
    pub use crate::envelope::{ApiFailure, ApiResponse, FieldErrors};
    pub use crate::error::{ApiError, ApiResult};
    pub use crate::query::QueryParams;
    pub use crate::request::{RequestBody, RequestOptions};
}
