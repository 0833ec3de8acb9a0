//! HTTP client implementation
//!
//! A send runs through a fixed pipeline:
//!
//! 1. build the request (URL, method, headers, encoded body)
//! 2. local header hook, then local start hook
//! 3. interceptor `configure`
//! 4. dispatch and read the full body
//! 5. classify: success policy match, other status, or transport failure
//! 6. interceptor `on_success`/`on_error`, then the local callback
//!
//! Every send yields exactly one [`Outcome`]; nothing is retried. A request
//! that fails to build skips steps 2 to 4 and goes straight to the error path.

use std::{fmt, sync::Arc};

use bytes::Bytes;
use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE},
    Method, Request, StatusCode,
};
use serde::Serialize;
use tracing::{debug, warn};

use crate::{
    body::{BodyKind, MultipartForm},
    config::HttpConfig,
    error::{HttpError, Result},
    interceptor::{self, Interceptor, InterceptorSlot},
    response::{Outcome, ResponseBody},
};

/// Callback run with the classified response
pub type ResponseCallback = Arc<dyn Fn(&ResponseBody) + Send + Sync>;

/// Mutates the outgoing header collection
pub type HeaderHook = Arc<dyn Fn(&mut HeaderMap) + Send + Sync>;

/// Observes the fully assembled request before dispatch
pub type StartHook = Arc<dyn Fn(&Request) + Send + Sync>;

/// Where a client looks up its interceptor
#[derive(Clone)]
enum InterceptorSource {
    /// The process-wide slot
    Global,
    /// A slot owned by this client
    Slot(Arc<InterceptorSlot>),
}

impl InterceptorSource {
    fn slot(&self) -> &InterceptorSlot {
        match self {
            InterceptorSource::Global => interceptor::global(),
            InterceptorSource::Slot(slot) => slot.as_ref(),
        }
    }
}

/// HTTP client with an interception pipeline
///
/// Cheap to clone; clones share the connection pool and interceptor source.
#[derive(Clone)]
pub struct HttpClient {
    inner: reqwest::Client,
    config: Arc<HttpConfig>,
    interceptors: InterceptorSource,
}

/// Builder for [`HttpClient`]
#[derive(Default)]
pub struct HttpClientBuilder {
    config: HttpConfig,
    slot: Option<Arc<InterceptorSlot>>,
}

impl HttpClientBuilder {
    pub fn config(mut self, config: HttpConfig) -> Self {
        self.config = config;
        self
    }

    /// Use `handler` instead of the process-wide interceptor
    pub fn interceptor(self, handler: impl Interceptor + 'static) -> Self {
        self.interceptor_slot(Arc::new(InterceptorSlot::with_handler(handler)))
    }

    /// Use `slot` instead of the process-wide interceptor
    pub fn interceptor_slot(mut self, slot: Arc<InterceptorSlot>) -> Self {
        self.slot = Some(slot);
        self
    }

    /// Disable interception for this client
    pub fn without_interceptor(self) -> Self {
        self.interceptor_slot(Arc::new(InterceptorSlot::new()))
    }

    pub fn build(self) -> Result<HttpClient> {
        self.config.validate()?;
        let inner = build_transport(&self.config)?;

        Ok(HttpClient {
            inner,
            config: Arc::new(self.config),
            interceptors: match self.slot {
                Some(slot) => InterceptorSource::Slot(slot),
                None => InterceptorSource::Global,
            },
        })
    }
}

fn build_transport(config: &HttpConfig) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .redirect(if config.max_redirects > 0 {
            reqwest::redirect::Policy::limited(config.max_redirects)
        } else {
            reqwest::redirect::Policy::none()
        });

    // Configure proxy if provided
    if let Some(proxy_url) = &config.proxy {
        let proxy =
            reqwest::Proxy::all(proxy_url).map_err(|e| HttpError::InvalidProxy(e.to_string()))?;
        builder = builder.proxy(proxy);
    }

    builder
        .build()
        .map_err(|e| HttpError::BuildError(e.to_string()))
}

impl HttpClient {
    /// Create a new HTTP client with configuration
    pub fn new(config: HttpConfig) -> Result<Self> {
        Self::builder().config(config).build()
    }

    /// Create HTTP client with default configuration
    pub fn with_defaults() -> Result<Self> {
        Self::new(HttpConfig::default())
    }

    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Get underlying reqwest client (for advanced usage)
    pub fn inner(&self) -> &reqwest::Client {
        &self.inner
    }

    /// Get configuration
    pub fn config(&self) -> &HttpConfig {
        &self.config
    }

    /// Interceptor slot this client reports to
    pub fn interceptor_slot(&self) -> &InterceptorSlot {
        self.interceptors.slot()
    }

    /// Start configuring a request
    pub fn request(&self, method: Method, url: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(self.clone(), method, url.into())
    }

    pub fn get(&self, url: impl Into<String>) -> RequestBuilder {
        self.request(Method::GET, url)
    }

    pub fn post(&self, url: impl Into<String>) -> RequestBuilder {
        self.request(Method::POST, url)
    }

    pub fn put(&self, url: impl Into<String>) -> RequestBuilder {
        self.request(Method::PUT, url)
    }

    pub fn patch(&self, url: impl Into<String>) -> RequestBuilder {
        self.request(Method::PATCH, url)
    }

    pub fn delete(&self, url: impl Into<String>) -> RequestBuilder {
        self.request(Method::DELETE, url)
    }

    /// Send a request without per-request callbacks
    pub async fn send(
        &self,
        method: Method,
        url: impl Into<String>,
        body: impl Into<BodyKind>,
    ) -> Outcome {
        self.request(method, url).body(body).send().await
    }
}

impl fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.config)
            .field("interceptor", &self.interceptors.slot())
            .finish()
    }
}

/// Immutable description of one request plus its callbacks
///
/// Every configuration method consumes the builder and returns a new one, so a
/// configured builder can be cloned and sent from several places.
#[derive(Clone)]
#[must_use = "a request does nothing until it is sent"]
pub struct RequestBuilder {
    client: HttpClient,
    method: Method,
    url: String,
    body: BodyKind,
    body_error: Option<String>,
    content_type: Option<String>,
    headers: Vec<(String, String)>,
    header_hook: Option<HeaderHook>,
    on_start: Option<StartHook>,
    on_success: Option<ResponseCallback>,
    on_error: Option<ResponseCallback>,
}

impl RequestBuilder {
    fn new(client: HttpClient, method: Method, url: String) -> Self {
        Self {
            client,
            method,
            url,
            body: BodyKind::None,
            body_error: None,
            content_type: None,
            headers: Vec::new(),
            header_hook: None,
            on_start: None,
            on_success: None,
            on_error: None,
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn body_kind(&self) -> &BodyKind {
        &self.body
    }

    /// Set the body
    pub fn body(mut self, body: impl Into<BodyKind>) -> Self {
        self.body = body.into();
        self.body_error = None;
        self
    }

    /// Raw text body
    pub fn text(self, text: impl Into<String>) -> Self {
        self.body(BodyKind::Text(text.into()))
    }

    /// Structured body, serialized to JSON text at send time
    ///
    /// A value that cannot be serialized makes the send fail on the
    /// transport-failure path.
    pub fn json<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        match BodyKind::structured(value) {
            Ok(body) => self.body(body),
            Err(e) => {
                self.body = BodyKind::None;
                self.body_error = Some(e.to_string());
                self
            }
        }
    }

    /// Name/value form body
    pub fn form<I, K, V>(self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.body(BodyKind::form(pairs))
    }

    /// Multipart body, sent as-is
    pub fn multipart(self, form: MultipartForm) -> Self {
        self.body(BodyKind::Multipart(form))
    }

    /// Content type for text, structured and form bodies
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Add a single header
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Add headers from name/value pairs
    pub fn set_headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.headers
            .extend(headers.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Mutate the outgoing headers just before the interceptor sees them
    pub fn headers<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut HeaderMap) + Send + Sync + 'static,
    {
        self.header_hook = Some(Arc::new(hook));
        self
    }

    /// Observe the assembled request before it is handed to the interceptor
    pub fn on_start<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Request) + Send + Sync + 'static,
    {
        self.on_start = Some(Arc::new(hook));
        self
    }

    pub fn on_success<F>(mut self, callback: F) -> Self
    where
        F: Fn(&ResponseBody) + Send + Sync + 'static,
    {
        self.on_success = Some(Arc::new(callback));
        self
    }

    pub fn on_error<F>(mut self, callback: F) -> Self
    where
        F: Fn(&ResponseBody) + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(callback));
        self
    }

    /// Send the request
    pub async fn send(self) -> Outcome {
        let transport = self.client.inner.clone();
        self.dispatch(&transport).await
    }

    /// Send the request, blocking the current thread until callbacks have run
    ///
    /// Runs on a private runtime with its own connection pool, so it must not
    /// be called from within an async context.
    pub fn send_blocking(self) -> Outcome {
        let runtime = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(e) => return self.fail(HttpError::Runtime(e)),
        };

        let transport = match build_transport(&self.client.config) {
            Ok(transport) => transport,
            Err(e) => return self.fail(e),
        };

        runtime.block_on(self.dispatch(&transport))
    }

    async fn dispatch(self, transport: &reqwest::Client) -> Outcome {
        let mut request = match self.build_request(transport) {
            Ok(request) => request,
            Err(e) => return self.fail(e),
        };

        if let Some(hook) = &self.header_hook {
            hook(request.headers_mut());
        }
        if let Some(hook) = &self.on_start {
            hook(&request);
        }
        self.client.interceptors.slot().config(&mut request);

        debug!("HTTP {}: {}", request.method(), request.url());

        let response = match transport.execute(request).await {
            Ok(response) => response,
            Err(e) => return self.fail(HttpError::RequestFailed(e)),
        };

        let status = response.status();
        match response.bytes().await {
            Ok(raw) => self.classify(status, raw),
            Err(e) => self.fail(HttpError::RequestFailed(e)),
        }
    }

    fn build_request(&self, transport: &reqwest::Client) -> Result<Request> {
        if let Some(message) = &self.body_error {
            return Err(HttpError::Serialization(message.clone()));
        }

        let url = reqwest::Url::parse(&self.url)
            .map_err(|e| HttpError::InvalidUrl(format!("{}: {e}", self.url)))?;

        // Accept lives on the request itself so the hooks can see and replace it
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
        for (name, value) in &self.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| HttpError::InvalidHeader(format!("{name}: {e}")))?;
            let header_value = HeaderValue::from_str(value)
                .map_err(|e| HttpError::InvalidHeader(format!("{name}: {e}")))?;
            headers.insert(header_name, header_value);
        }

        let mut builder = transport.request(self.method.clone(), url).headers(headers);

        match &self.body {
            BodyKind::Multipart(form) => builder = builder.multipart(form.to_reqwest()?),
            body => {
                if let Some(encoded) =
                    body.encode(self.content_type.as_deref(), &self.client.config.content_type)?
                {
                    let content_type = HeaderValue::from_str(&encoded.content_type).map_err(
                        |e| HttpError::InvalidHeader(format!("{}: {e}", encoded.content_type)),
                    )?;
                    builder = builder.header(CONTENT_TYPE, content_type).body(encoded.text);
                }
            }
        }

        builder.build().map_err(HttpError::RequestFailed)
    }

    fn classify(&self, status: StatusCode, raw: Bytes) -> Outcome {
        let mut body = ResponseBody::received(status, raw);

        if self.client.config.success_policy.is_success(status) {
            body.decode_generic();
            debug!("HTTP {} {}: success ({})", self.method, self.url, status);
            self.succeed(body)
        } else {
            debug!("HTTP {} {}: error status ({})", self.method, self.url, status);
            self.reject(body)
        }
    }

    fn fail(&self, error: HttpError) -> Outcome {
        warn!("HTTP {} {} failed: {}", self.method, self.url, error);
        let body = ResponseBody::transport_failure(&self.client.config.error_prefix, error);
        self.reject(body)
    }

    fn succeed(&self, body: ResponseBody) -> Outcome {
        self.client.interceptors.slot().notify_success(&body);
        if let Some(callback) = &self.on_success {
            callback(&body);
        }
        Outcome::Success(body)
    }

    fn reject(&self, body: ResponseBody) -> Outcome {
        self.client.interceptors.slot().notify_error(&body);
        if let Some(callback) = &self.on_error {
            callback(&body);
        }
        Outcome::Failure(body)
    }
}

impl fmt::Debug for RequestBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestBuilder")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("body", &self.body)
            .field("content_type", &self.content_type)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}
