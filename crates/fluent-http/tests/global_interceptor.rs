//! Tests for the process-wide interceptor
//!
//! The global slot cannot be cleared, so every test installs its own handler
//! first and the tests run serially.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

use fluent_http::{
    header::HeaderValue, interceptor, HttpClient, Interceptor, Request, ResponseBody,
};
use serde_json::json;
use serial_test::serial;
use wiremock::{
    matchers::{header, method},
    Mock, MockServer, ResponseTemplate,
};

#[derive(Default)]
struct Counters {
    configured: AtomicUsize,
    successes: AtomicUsize,
    errors: AtomicUsize,
}

struct Counting(Arc<Counters>);

impl Interceptor for Counting {
    fn configure(&self, request: &mut Request) {
        self.0.configured.fetch_add(1, Ordering::SeqCst);
        request
            .headers_mut()
            .insert("x-tenant", HeaderValue::from_static("acme"));
    }

    fn on_success(&self, _response: &ResponseBody) {
        self.0.successes.fetch_add(1, Ordering::SeqCst);
    }

    fn on_error(&self, _response: &ResponseBody) {
        self.0.errors.fetch_add(1, Ordering::SeqCst);
    }
}

fn install() -> Arc<Counters> {
    let counters = Arc::new(Counters::default());
    interceptor::init(Counting(counters.clone()));
    counters
}

#[tokio::test]
#[serial]
async fn test_global_interceptor_sees_every_client() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(header("x-tenant", "acme"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(2)
        .mount(&server)
        .await;

    let counters = install();
    assert!(interceptor::global().is_initialized());

    let first = HttpClient::with_defaults().unwrap();
    let second = HttpClient::with_defaults().unwrap();
    assert!(first.get(server.uri()).send().await.is_success());
    assert!(second.get(server.uri()).send().await.is_success());

    assert_eq!(counters.configured.load(Ordering::SeqCst), 2);
    assert_eq!(counters.successes.load(Ordering::SeqCst), 2);
    assert_eq!(counters.errors.load(Ordering::SeqCst), 0);
}

#[tokio::test]
#[serial]
async fn test_global_error_hook_fires_before_local_callback() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let counters = install();
    let seen_by_local = Arc::new(Mutex::new(None));
    let slot = seen_by_local.clone();
    let observed = counters.clone();

    let outcome = HttpClient::with_defaults()
        .unwrap()
        .get(server.uri())
        .on_error(move |_| {
            *slot.lock().unwrap() = Some(observed.errors.load(Ordering::SeqCst));
        })
        .send()
        .await;

    assert_eq!(outcome.body().status_code(), 404);
    assert_eq!(*seen_by_local.lock().unwrap(), Some(1));
}

#[tokio::test]
#[serial]
async fn test_reinit_replaces_handler() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let replaced = install();
    let current = install();

    HttpClient::with_defaults()
        .unwrap()
        .get(server.uri())
        .send()
        .await;

    assert_eq!(replaced.configured.load(Ordering::SeqCst), 0);
    assert_eq!(current.configured.load(Ordering::SeqCst), 1);
}

#[tokio::test]
#[serial]
async fn test_explicit_interceptor_bypasses_global() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let global = install();
    let own = Arc::new(Counters::default());
    let client = HttpClient::builder()
        .interceptor(Counting(own.clone()))
        .build()
        .unwrap();

    client.get(server.uri()).send().await;

    assert_eq!(global.configured.load(Ordering::SeqCst), 0);
    assert_eq!(own.configured.load(Ordering::SeqCst), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[serial]
async fn test_concurrent_sends_share_handler() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(16)
        .mount(&server)
        .await;

    let counters = install();
    let client = HttpClient::with_defaults().unwrap();

    let mut tasks = tokio::task::JoinSet::new();
    for i in 0..16 {
        let request = client.get(format!("{}/item/{i}", server.uri()));
        tasks.spawn(request.send());
    }
    while let Some(outcome) = tasks.join_next().await {
        assert!(outcome.unwrap().is_success());
    }

    assert_eq!(counters.configured.load(Ordering::SeqCst), 16);
    assert_eq!(counters.successes.load(Ordering::SeqCst), 16);
}

#[test]
#[serial]
fn test_module_level_hooks_delegate() {
    let counters = install();

    let mut request = Request::new(
        fluent_http::Method::GET,
        "http://localhost/".parse().unwrap(),
    );
    interceptor::config(&mut request);
    assert_eq!(request.headers()["x-tenant"], "acme");

    let client = HttpClient::with_defaults().unwrap();
    let outcome = client.get("not a url").send_blocking();
    // an unparseable URL fails before configure runs
    assert_eq!(counters.configured.load(Ordering::SeqCst), 1);
    interceptor::notify_success(outcome.body());

    assert_eq!(counters.configured.load(Ordering::SeqCst), 1);
    assert_eq!(counters.errors.load(Ordering::SeqCst), 1);
    assert_eq!(counters.successes.load(Ordering::SeqCst), 1);
}
