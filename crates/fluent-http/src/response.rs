//! Response container and send outcome

use std::{io::Cursor, sync::Arc};

use bytes::Bytes;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use crate::error::{HttpError, Result};

/// Status code recorded when no response was received
pub const TRANSPORT_FAILURE_STATUS: i32 = -1;

/// Uniform result of a request
///
/// A received response carries its status, reason phrase and payload; a
/// transport failure carries [`TRANSPORT_FAILURE_STATUS`], a prefixed message
/// and the captured error, with an empty payload.
#[derive(Debug, Clone)]
pub struct ResponseBody {
    status_code: i32,
    message: String,
    error: Option<Arc<HttpError>>,
    raw: Bytes,
    text: String,
    decoded: Option<serde_json::Value>,
}

impl ResponseBody {
    /// Response that was actually received
    pub(crate) fn received(status: StatusCode, raw: Bytes) -> Self {
        let text = String::from_utf8_lossy(&raw).into_owned();
        Self {
            status_code: i32::from(status.as_u16()),
            message: reason_phrase(status),
            error: None,
            raw,
            text,
            decoded: None,
        }
    }

    /// Exchange that did not complete
    pub(crate) fn transport_failure(prefix: &str, error: HttpError) -> Self {
        Self {
            status_code: TRANSPORT_FAILURE_STATUS,
            message: format!("{prefix}{error}"),
            error: Some(Arc::new(error)),
            raw: Bytes::new(),
            text: String::new(),
            decoded: None,
        }
    }

    /// Best-effort generic decode; leaves `decoded` empty on bad input
    pub(crate) fn decode_generic(&mut self) {
        self.decoded = serde_json::from_slice(&self.raw).ok();
    }

    /// Numeric status, or `-1` when nothing was received
    pub fn status_code(&self) -> i32 {
        self.status_code
    }

    /// Typed status; `None` on transport failure
    pub fn status(&self) -> Option<StatusCode> {
        u16::try_from(self.status_code)
            .ok()
            .and_then(|code| StatusCode::from_u16(code).ok())
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Captured fault of a transport failure
    pub fn error(&self) -> Option<&HttpError> {
        self.error.as_deref()
    }

    pub fn is_transport_failure(&self) -> bool {
        self.error.is_some()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.raw
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Generic JSON value, only set for successful responses with a JSON body
    pub fn decoded(&self) -> Option<&serde_json::Value> {
        self.decoded.as_ref()
    }

    /// Payload as a seekable reader
    pub fn to_stream(&self) -> Cursor<Bytes> {
        Cursor::new(self.raw.clone())
    }

    /// Decode the response text into `T`
    pub fn to_object<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.text).map_err(HttpError::Deserialization)
    }
}

/// Standard reason phrase, or `HTTP <code>` for codes without one
fn reason_phrase(status: StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) => reason.to_string(),
        None => format!("HTTP {}", status.as_u16()),
    }
}

/// Result of a send: which path the request took, and its response
#[derive(Debug, Clone)]
pub enum Outcome {
    Success(ResponseBody),
    Failure(ResponseBody),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn body(&self) -> &ResponseBody {
        match self {
            Outcome::Success(body) | Outcome::Failure(body) => body,
        }
    }

    pub fn into_body(self) -> ResponseBody {
        match self {
            Outcome::Success(body) | Outcome::Failure(body) => body,
        }
    }

    /// `Ok` on the success path, `Err` on the error path
    pub fn into_result(self) -> std::result::Result<ResponseBody, ResponseBody> {
        match self {
            Outcome::Success(body) => Ok(body),
            Outcome::Failure(body) => Err(body),
        }
    }
}
