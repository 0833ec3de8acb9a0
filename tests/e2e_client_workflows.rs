//! End-to-end client workflows
//!
//! Drives the client the way an embedding application does: one interceptor
//! installed at startup, several requests with per-call callbacks, and typed
//! decoding of echoed payloads.

use std::sync::{Arc, Mutex};

use fluent_http::{
    interceptor, BodyKind, HttpClient, Interceptor, Method, Outcome, Request, ResponseBody,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, Respond, ResponseTemplate,
};

/// Responds with the request body it received
struct Echo;

impl Respond for Echo {
    fn respond(&self, request: &wiremock::Request) -> ResponseTemplate {
        ResponseTemplate::new(200)
            .set_body_raw(request.body.clone(), "application/json")
    }
}

#[derive(Default)]
struct AuditLog {
    lines: Mutex<Vec<String>>,
}

struct Audit(Arc<AuditLog>);

impl Interceptor for Audit {
    fn configure(&self, request: &mut Request) {
        self.0
            .lines
            .lock()
            .unwrap()
            .push(format!("{} {}", request.method(), request.url().path()));
    }

    fn on_success(&self, response: &ResponseBody) {
        tracing::info!("audit: success {}", response.status_code());
        self.0.lines.lock().unwrap().push("success".to_string());
    }

    fn on_error(&self, response: &ResponseBody) {
        tracing::info!("audit: error {}", response.status_code());
        self.0.lines.lock().unwrap().push(format!("error {}", response.status_code()));
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct Employee {
    name: String,
    job: String,
    skills: Vec<String>,
    manager: Option<Box<Employee>>,
}

#[tokio::test]
async fn test_structured_body_round_trips_through_echo() {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/echo"))
        .respond_with(Echo)
        .mount(&server)
        .await;

    let client = HttpClient::builder().without_interceptor().build().unwrap();
    let samples = vec![
        Employee {
            name: "morpheus".to_string(),
            job: "zion resident".to_string(),
            skills: vec![],
            manager: None,
        },
        Employee {
            name: "trinity".to_string(),
            job: "operator".to_string(),
            skills: vec!["hacking".to_string(), "piloting".to_string()],
            manager: Some(Box::new(Employee {
                name: "morpheus".to_string(),
                job: "captain".to_string(),
                skills: vec!["leadership".to_string()],
                manager: None,
            })),
        },
    ];

    for employee in samples {
        let outcome = client
            .post(format!("{}/echo", server.uri()))
            .json(&employee)
            .send()
            .await;

        assert!(outcome.is_success());
        let echoed: Employee = outcome.body().to_object().unwrap();
        assert_eq!(echoed, employee);
    }
}

#[tokio::test]
async fn test_startup_interceptor_audits_a_session() {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"page": 2, "data": []})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/register"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"error": "Missing password"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/users/2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"updatedAt": "2026-10-18"})))
        .mount(&server)
        .await;

    let audit = Arc::new(AuditLog::default());
    interceptor::init(Audit(audit.clone()));

    let client = HttpClient::with_defaults().unwrap();
    let callbacks = Arc::new(Mutex::new(Vec::new()));

    let calls: Vec<(Method, String, BodyKind)> = vec![
        (Method::GET, "/api/users?page=2".to_string(), BodyKind::None),
        (
            Method::POST,
            "/api/register".to_string(),
            BodyKind::structured(&json!({"email": "sydney@fife"})).unwrap(),
        ),
        (
            Method::PUT,
            "/api/users/2".to_string(),
            BodyKind::structured(&json!({"name": "morpheus", "job": "zion resident"})).unwrap(),
        ),
    ];

    let mut outcomes = Vec::new();
    for (verb, route, body) in calls {
        let ok = callbacks.clone();
        let err = callbacks.clone();
        let outcome = client
            .request(verb, format!("{}{route}", server.uri()))
            .body(body)
            .on_success(move |_| ok.lock().unwrap().push("OnSuccess"))
            .on_error(move |_| err.lock().unwrap().push("OnError"))
            .send()
            .await;
        outcomes.push(outcome);
    }

    assert!(matches!(outcomes[0], Outcome::Success(_)));
    assert!(matches!(outcomes[1], Outcome::Failure(_)));
    assert!(matches!(outcomes[2], Outcome::Success(_)));
    assert_eq!(
        *callbacks.lock().unwrap(),
        vec!["OnSuccess", "OnError", "OnSuccess"]
    );
    assert_eq!(
        *audit.lines.lock().unwrap(),
        vec![
            "GET /api/users",
            "success",
            "POST /api/register",
            "error 400",
            "PUT /api/users/2",
            "success",
        ]
    );
}
