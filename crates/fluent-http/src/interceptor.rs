//! Request/response interception
//!
//! An [`Interceptor`] sees every request a client sends: it can rewrite the
//! outgoing request before dispatch and observes the classified response
//! before any per-request callback runs.
//!
//! Interceptors live in an [`InterceptorSlot`]. Clients consult the
//! process-wide slot by default; tests and embedders that want to avoid
//! ambient state hand a client its own slot instead.
//!
//! ```ignore
//! use fluent_http::{interceptor, Interceptor, ResponseBody};
//!
//! struct AuthHeader;
//!
//! impl Interceptor for AuthHeader {
//!     fn configure(&self, request: &mut reqwest::Request) {
//!         request
//!             .headers_mut()
//!             .insert("authorization", "Bearer token".parse().unwrap());
//!     }
//!
//!     fn on_error(&self, response: &ResponseBody) {
//!         tracing::warn!("request failed: {}", response.message());
//!     }
//! }
//!
//! // once, at startup
//! interceptor::init(AuthHeader);
//! ```

use std::sync::Arc;

use parking_lot::RwLock;
use reqwest::Request;
use tracing::{debug, trace};

use crate::response::ResponseBody;

/// Hooks run around every request
///
/// All hooks default to no-ops. Each send ends in exactly one of
/// [`on_success`](Interceptor::on_success) or [`on_error`](Interceptor::on_error).
/// [`configure`](Interceptor::configure) runs before that for every request
/// that could be assembled. A request with a malformed URL, an invalid header
/// or an unserializable body fails before it exists, so it reaches `on_error`
/// without a preceding `configure`; its response then carries
/// [`HttpError::InvalidUrl`](crate::HttpError::InvalidUrl),
/// [`HttpError::InvalidHeader`](crate::HttpError::InvalidHeader) or
/// [`HttpError::Serialization`](crate::HttpError::Serialization).
pub trait Interceptor: Send + Sync {
    /// Mutate the request in place before it is sent
    fn configure(&self, _request: &mut Request) {}

    /// Observe a response that took the success path
    fn on_success(&self, _response: &ResponseBody) {}

    /// Observe a response that took the error path
    fn on_error(&self, _response: &ResponseBody) {}
}

/// Holds zero or one interceptor
///
/// Starts uninitialized. [`InterceptorSlot::init`] installs a handler and
/// replaces any previous one; there is no way to remove it again.
#[derive(Default)]
pub struct InterceptorSlot {
    handler: RwLock<Option<Arc<dyn Interceptor>>>,
}

impl InterceptorSlot {
    /// Create an empty slot
    pub const fn new() -> Self {
        Self {
            handler: parking_lot::const_rwlock(None),
        }
    }

    /// Create a slot that already holds `handler`
    pub fn with_handler(handler: impl Interceptor + 'static) -> Self {
        let slot = Self::new();
        slot.init(handler);
        slot
    }

    /// Install `handler`, replacing the current one
    pub fn init(&self, handler: impl Interceptor + 'static) {
        self.init_shared(Arc::new(handler));
    }

    /// Install an already shared handler, replacing the current one
    pub fn init_shared(&self, handler: Arc<dyn Interceptor>) {
        let previous = self.handler.write().replace(handler);
        if previous.is_some() {
            debug!("Replacing previously installed interceptor");
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.handler.read().is_some()
    }

    /// Current handler, if any
    pub fn handler(&self) -> Option<Arc<dyn Interceptor>> {
        self.handler.read().clone()
    }

    /// Run the configure hook; no-op when empty
    pub fn config(&self, request: &mut Request) {
        if let Some(handler) = self.handler() {
            trace!("Interceptor configure: {} {}", request.method(), request.url());
            handler.configure(request);
        }
    }

    /// Run the success hook; no-op when empty
    pub fn notify_success(&self, response: &ResponseBody) {
        if let Some(handler) = self.handler() {
            trace!("Interceptor on_success: {}", response.status_code());
            handler.on_success(response);
        }
    }

    /// Run the error hook; no-op when empty
    pub fn notify_error(&self, response: &ResponseBody) {
        if let Some(handler) = self.handler() {
            trace!("Interceptor on_error: {}", response.status_code());
            handler.on_error(response);
        }
    }
}

impl std::fmt::Debug for InterceptorSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterceptorSlot")
            .field("initialized", &self.is_initialized())
            .finish()
    }
}

/// Process-wide interceptor slot
static GLOBAL_INTERCEPTOR: InterceptorSlot = InterceptorSlot::new();

/// The process-wide slot consulted by clients without an explicit one
pub fn global() -> &'static InterceptorSlot {
    &GLOBAL_INTERCEPTOR
}

/// Install the process-wide interceptor
///
/// Call once at startup, before traffic begins. A second call replaces the
/// first handler.
pub fn init(handler: impl Interceptor + 'static) {
    GLOBAL_INTERCEPTOR.init(handler);
}

/// Run the process-wide configure hook
pub fn config(request: &mut Request) {
    GLOBAL_INTERCEPTOR.config(request);
}

/// Run the process-wide success hook
pub fn notify_success(response: &ResponseBody) {
    GLOBAL_INTERCEPTOR.notify_success(response);
}

/// Run the process-wide error hook
pub fn notify_error(response: &ResponseBody) {
    GLOBAL_INTERCEPTOR.notify_error(response);
}
