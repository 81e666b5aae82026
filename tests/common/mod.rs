//! In-process mock of the ECPP back-office API, shared by the integration tests.

#![allow(dead_code)]

use axum::extract::State;
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

pub const TOKEN: &str = "abc123";

/// How `/auth/login` hands out the session id.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LoginMode {
    /// `{"data": {"cookies": ["emqsess=abc123; Path=/; HttpOnly"]}}`
    JsonCookie,
    /// Plain-text body with a `Set-Cookie: emqsess=...` header.
    SetCookieHeader,
    /// JSON body without cookies.
    NoCookie,
}

#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
    pub body: Value,
}

#[derive(Clone)]
pub struct MockEcpp {
    pub login_mode: LoginMode,
    pub authenticate_response: Value,
    pub me_response: Value,
    /// Raw body returned by `/senders/search`.
    pub search_response: String,
    pub create_response: Value,
    pub reviews_response: Value,
    pub requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl Default for MockEcpp {
    fn default() -> Self {
        Self {
            login_mode: LoginMode::JsonCookie,
            authenticate_response: json!({
                "status": {"code": 200, "message": "OK"},
                "data": {"user_id": 42}
            }),
            me_response: json!({
                "status": {"code": 200, "message": "OK"},
                "data": {
                    "username": "alice",
                    "display_name": "Alice Tan",
                    "partner": {"name": "EMQ"},
                    "roles": ["maker", "viewer"]
                }
            }),
            search_response: json!({
                "status": {"code": 200, "message": "OK"},
                "data": {"senders": [
                    {"business": {"company_name": "Acme Ltd"}},
                    {"business": null, "legal_name_last": "Tan", "legal_name_first": "Mei"}
                ]}
            })
            .to_string(),
            create_response: json!({
                "status": {"code": 200, "message": "OK"},
                "data": {"business": {"company_name": "Acme Ltd"}}
            }),
            reviews_response: json!({
                "status": {"code": 200, "message": "OK"},
                "data": {"batches": [
                    {
                        "batch_id": "B-1001",
                        "checker": "bob",
                        "transfers_principal_info": [
                            {"exchange_amount": 1500, "to_currency_code": "PHP"}
                        ]
                    },
                    {
                        "batch_id": "B-1002",
                        "checker": "carol",
                        "transfers_principal_info": [
                            {"exchange_amount": 25.5, "to_currency_code": "IDR"}
                        ]
                    }
                ]}
            }),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl MockEcpp {
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.path.ends_with(path))
            .collect()
    }

    /// Serve on an ephemeral port and return the API base URL.
    pub async fn spawn(self) -> String {
        let app = Router::new().fallback(handle).with_state(self);
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/api/v1", addr)
    }
}

fn json_response(value: &Value) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        value.to_string(),
    )
        .into_response()
}

async fn handle(
    State(mock): State<MockEcpp>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> Response {
    let path = uri.path().trim_start_matches("/api/v1").to_string();
    mock.requests.lock().unwrap().push(RecordedRequest {
        method: method.to_string(),
        path: path.clone(),
        authorization: headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body: serde_json::from_str(&body).unwrap_or(Value::Null),
    });

    match path.as_str() {
        "/auth/login" => match mock.login_mode {
            LoginMode::JsonCookie => json_response(&json!({
                "status": {"code": 200, "message": "OK"},
                "data": {"cookies": [format!("emqsess={}; Path=/; HttpOnly", TOKEN)]}
            })),
            LoginMode::SetCookieHeader => (
                StatusCode::OK,
                [(header::SET_COOKIE, "emqsess=fromheader; Path=/; HttpOnly")],
                "login ok",
            )
                .into_response(),
            LoginMode::NoCookie => json_response(&json!({
                "status": {"code": 401, "message": "bad credentials"},
                "data": {}
            })),
        },
        "/auth/authenticate" => json_response(&mock.authenticate_response),
        "/auth/me" => json_response(&mock.me_response),
        "/senders/search" => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            mock.search_response.clone(),
        )
            .into_response(),
        "/senders/business" => json_response(&mock.create_response),
        "/transfer-batch/created-by-you" => json_response(&mock.reviews_response),
        _ => (StatusCode::NOT_FOUND, "not found").into_response(),
    }
}

pub fn business_sender_arguments() -> Value {
    json!({
        "companyName": "Acme Ltd",
        "companyTradingName": "Acme",
        "countryCode": "SG",
        "companyRegistrationNumber": "201912345K",
        "companyRegistrationCountry": "SG",
        "addressLine": "1 Raffles Place",
        "addressCity": "Singapore",
        "addressCountry": "SG",
        "mobileNumber": "+6591234567"
    })
}
