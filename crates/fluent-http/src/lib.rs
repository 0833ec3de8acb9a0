//! Fluent HTTP client with an interception pipeline
//!
//! Requests are configured with an immutable [`RequestBuilder`] and sent with
//! [`RequestBuilder::send`] (async) or [`RequestBuilder::send_blocking`].
//! Every request also passes through an [`Interceptor`]: the process-wide one
//! installed with [`interceptor::init`], or one given to the client directly.
//!
//! ## Features
//!
//! - **Single outcome**: each send yields [`Outcome::Success`] or [`Outcome::Failure`]
//! - **Two-tier callbacks**: interceptor hooks run before per-request callbacks
//! - **Closed body set**: text, structured (JSON), form and multipart via [`BodyKind`]
//! - **Strict success**: only `200 OK` is a success unless
//!   [`SuccessPolicy::AnySuccess`] is configured
//! - **Configurable**: user agent, proxy, redirects, content type, error prefix
//!
//! ```ignore
//! use fluent_http::{HttpClient, Method};
//!
//! let client = HttpClient::with_defaults()?;
//! let outcome = client
//!     .request(Method::POST, "https://reqres.in/api/register")
//!     .json(&serde_json::json!({"email": "eve.holt@reqres.in", "password": "pistol"}))
//!     .on_success(|res| println!("OnSuccess {}", res.text()))
//!     .on_error(|res| println!("OnError {}", res.message()))
//!     .send()
//!     .await;
//! # Ok::<(), fluent_http::HttpError>(())
//! ```

pub mod body;
pub mod client;
pub mod config;
pub mod error;
pub mod interceptor;
pub mod response;

pub use body::{BodyKind, MultipartForm, MultipartPart};
pub use client::{HttpClient, HttpClientBuilder, RequestBuilder};
pub use config::{HttpConfig, SuccessPolicy};
pub use error::{HttpError, Result};
pub use interceptor::{Interceptor, InterceptorSlot};
pub use response::{Outcome, ResponseBody, TRANSPORT_FAILURE_STATUS};

/// Re-export commonly used types
pub use reqwest::{header, Method, Request, StatusCode};
