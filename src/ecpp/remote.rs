//! Client for the ECPP back-office HTTP API.
//!
//! Every endpoint takes a JSON body and answers with
//! `{"status": {"code", "message"}, "data": {...}}`. Authenticated calls put
//! the raw session token in the `Authorization` header; the token comes from
//! [`EcppOperations::login`] and lives in the client's own [`SessionContext`].
//!
//! ```rust,no_run
//! use ecpp_assistant::remote::{EcppClient, EcppOperations};
//!
//! # async fn run() -> Result<(), ecpp_assistant::EcppError> {
//! let client = EcppClient::new("http://localhost:18000/api/v1");
//! let profile = client.login("alice", "secret").await?;
//! println!("logged in as {}", profile.display_name);
//! let found = client.search_senders("Acme").await?;
//! println!("{:?}", found);
//! # Ok(())
//! # }
//! ```

use crate::ecpp::clients::http_pool::get_http_client;
use crate::ecpp::config::{EcppConfig, DEFAULT_HTTP_TIMEOUT_SECS};
use crate::ecpp::error::EcppError;
use crate::ecpp::session::{token_preview, SessionContext};
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use reqwest::header::{HeaderMap, AUTHORIZATION, SET_COOKIE};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

lazy_static! {
    static ref EMQSESS_RE: Regex = Regex::new(r"emqsess=([^;]+)").unwrap();
    static ref SET_COOKIE_RE: Regex =
        Regex::new(r"(?im)^set-cookie:\s*emqsess=([^;\r\n]+)").unwrap();
}

/// Session id carried by a cookie string such as `emqsess=abc; Path=/`.
pub fn extract_emqsess(cookie: &str) -> Option<String> {
    EMQSESS_RE
        .captures(cookie)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Session id from a raw HTTP transcript containing `Set-Cookie: emqsess=...`.
pub fn scan_set_cookie(raw: &str) -> Option<String> {
    SET_COOKIE_RE
        .captures(raw)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Input of `createBusinessSender`, named as the tool arguments are.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessSenderFields {
    pub company_name: String,
    pub company_trading_name: String,
    pub country_code: String,
    pub company_registration_number: String,
    pub company_registration_country: String,
    pub address_line: String,
    pub address_city: String,
    pub address_country: String,
    pub mobile_number: String,
}

impl BusinessSenderFields {
    /// Request body for `POST /senders/business`.
    pub fn to_request_body(&self) -> Value {
        json!({
            "segment": "business",
            "country": self.country_code,
            "company_name": self.company_name,
            "company_trading_name": self.company_trading_name,
            "company_registration_number": self.company_registration_number,
            "company_registration_country": self.company_registration_country,
            "address_line": self.address_line,
            "address_city": self.address_city,
            "address_country": self.address_country,
            "mobile_number": self.mobile_number,
        })
    }
}

/// The logged-in user as reported by `/auth/me`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Profile {
    pub username: String,
    pub display_name: String,
    pub partner: String,
    pub roles: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SenderSummary {
    Business { company_name: String },
    Individual { last_name: String, first_name: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum SenderSearch {
    /// Senders in the order the server returned them; may be empty.
    Found(Vec<SenderSummary>),
    /// The response had no `data.senders`.
    NoData { status_code: Option<String> },
}

/// One transfer batch created by the current user.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchSummary {
    pub batch_id: String,
    pub exchange_amount: String,
    pub to_currency_code: String,
    pub checker: String,
}

/// The four ECPP business operations.
#[async_trait]
pub trait EcppOperations: Send + Sync {
    /// Log in, store the session token and return the user's profile.
    async fn login(&self, username: &str, password: &str) -> Result<Profile, EcppError>;

    async fn search_senders(&self, name_filter: &str) -> Result<SenderSearch, EcppError>;

    /// Create a business sender and return its company name.
    async fn create_business_sender(
        &self,
        fields: &BusinessSenderFields,
    ) -> Result<String, EcppError>;

    async fn list_created_reviews(&self) -> Result<Vec<BatchSummary>, EcppError>;
}

pub struct EcppClient {
    base_url: String,
    timeout: Duration,
    session: SessionContext,
}

struct RawResponse {
    status: reqwest::StatusCode,
    headers: HeaderMap,
    body: String,
}

impl EcppClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            session: SessionContext::new(),
        }
    }

    pub fn from_config(config: &EcppConfig) -> Self {
        Self::new(&config.api_base_url).with_timeout(config.http_timeout)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn require_token(&self) -> Result<String, EcppError> {
        let token = self.session.token();
        if token.is_empty() {
            log::error!("No valid session ID found. Please login again.");
            return Err(EcppError::Unauthenticated);
        }
        Ok(token)
    }

    async fn send(
        &self,
        method: reqwest::Method,
        path: &str,
        body: &Value,
        token: Option<&str>,
    ) -> Result<RawResponse, EcppError> {
        let client = get_http_client(&self.base_url, self.timeout)?;
        let mut request = client.request(method.clone(), self.url(path)).json(body);
        if let Some(token) = token {
            request = request.header(AUTHORIZATION, token);
        }

        log::debug!("{} {}", method, self.url(path));
        let response = request.send().await.map_err(|e| {
            log::error!("{} {} failed: {}", method, path, e);
            EcppError::from(e)
        })?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await?;
        log::debug!("{} {} -> {}", method, path, status);
        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }

    async fn post(
        &self,
        path: &str,
        body: &Value,
        token: Option<&str>,
    ) -> Result<RawResponse, EcppError> {
        self.send(reqwest::Method::POST, path, body, token).await
    }

    fn session_id_from_login(response: &RawResponse) -> Option<String> {
        match serde_json::from_str::<Value>(&response.body) {
            Ok(parsed) => parsed
                .pointer("/data/cookies/0")
                .and_then(Value::as_str)
                .and_then(extract_emqsess),
            Err(e) => {
                log::warn!("Login response is not JSON ({}), scanning raw response", e);
                scan_set_cookie(&raw_transcript(response))
            }
        }
    }
}

/// Status line, headers and body laid out like a verbose HTTP trace.
fn raw_transcript(response: &RawResponse) -> String {
    let mut raw = format!("HTTP {}\r\n", response.status);
    for (name, value) in response.headers.iter() {
        let value = String::from_utf8_lossy(value.as_bytes());
        let name = if *name == SET_COOKIE {
            "Set-Cookie"
        } else {
            name.as_str()
        };
        raw.push_str(&format!("{}: {}\r\n", name, value));
    }
    raw.push_str("\r\n");
    raw.push_str(&response.body);
    raw
}

fn parse_json(context: &str, body: &str) -> Result<Value, EcppError> {
    serde_json::from_str(body).map_err(|e| {
        let err = EcppError::parse(context, body);
        if let EcppError::Parse { raw_prefix, .. } = &err {
            log::error!("Failed to parse {}: {} (raw: {})", context, e, raw_prefix);
        }
        err
    })
}

/// Render a JSON scalar the way it reads in a sentence.
fn value_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => match n.as_f64() {
            Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e15 => {
                format!("{}", f as i64)
            }
            _ => n.to_string(),
        },
        Some(other) => other.to_string(),
    }
}

fn profile_from(value: &Value) -> Profile {
    let record = value.get("data").filter(|d| d.is_object()).unwrap_or(value);
    Profile {
        username: value_text(record.get("username")),
        display_name: value_text(record.get("display_name")),
        partner: value_text(record.pointer("/partner/name")),
        roles: record
            .get("roles")
            .and_then(Value::as_array)
            .map(|roles| roles.iter().map(|r| value_text(Some(r))).collect())
            .unwrap_or_default(),
    }
}

fn sender_from(value: &Value) -> SenderSummary {
    match value.get("business").filter(|b| !b.is_null()) {
        Some(business) => SenderSummary::Business {
            company_name: value_text(business.get("company_name")),
        },
        None => SenderSummary::Individual {
            last_name: value_text(value.get("legal_name_last")),
            first_name: value_text(value.get("legal_name_first")),
        },
    }
}

fn batch_from(value: &Value) -> BatchSummary {
    let principal = value.pointer("/transfers_principal_info/0");
    BatchSummary {
        batch_id: value_text(value.get("batch_id")),
        exchange_amount: value_text(principal.and_then(|p| p.get("exchange_amount"))),
        to_currency_code: value_text(principal.and_then(|p| p.get("to_currency_code"))),
        checker: value_text(value.get("checker")),
    }
}

#[async_trait]
impl EcppOperations for EcppClient {
    async fn login(&self, username: &str, password: &str) -> Result<Profile, EcppError> {
        let login_body = json!({
            "username": username,
            "password": password,
            "admin": false,
        });
        let response = self.post("/auth/login", &login_body, None).await?;

        let session_id = Self::session_id_from_login(&response).ok_or_else(|| {
            log::error!("login failed, no emqsess (status {})", response.status);
            EcppError::Auth("login failed, no emqsess".to_string())
        })?;
        log::info!("Obtained session {}", token_preview(&session_id));

        let session_body = json!({ "emqsess": session_id });
        let auth = self.post("/auth/authenticate", &session_body, None).await?;
        let auth_result = parse_json("authenticate response", &auth.body)?;
        if auth_result.get("data").map_or(true, Value::is_null) {
            log::error!("Authenticate returned no user data");
            return Err(EcppError::Auth("no user data".to_string()));
        }

        let me = self
            .send(reqwest::Method::GET, "/auth/me", &session_body, None)
            .await?;
        let me_result = parse_json("profile response", &me.body)?;
        let profile = profile_from(&me_result);

        self.session.set_token(session_id);
        log::info!("Logged in as {}", profile.username);
        Ok(profile)
    }

    async fn search_senders(&self, name_filter: &str) -> Result<SenderSearch, EcppError> {
        let token = self.require_token()?;
        let body = json!({
            "page": 1,
            "name": name_filter,
            "recipient_name": "",
            "page_size": 20,
            "include_recipeint": false,
        });

        log::info!("Searching senders with name: {}", name_filter);
        log::debug!("Using session ID: {}", token_preview(&token));
        let response = self.post("/senders/search", &body, Some(&token)).await?;
        let result = parse_json("sender search response", &response.body)?;

        match result.pointer("/data/senders").and_then(Value::as_array) {
            Some(senders) => Ok(SenderSearch::Found(senders.iter().map(sender_from).collect())),
            None => {
                let code = result.pointer("/status/code").filter(|c| !c.is_null());
                Ok(SenderSearch::NoData {
                    status_code: code.map(|c| value_text(Some(c))),
                })
            }
        }
    }

    async fn create_business_sender(
        &self,
        fields: &BusinessSenderFields,
    ) -> Result<String, EcppError> {
        let token = self.require_token()?;
        let response = self
            .post("/senders/business", &fields.to_request_body(), Some(&token))
            .await?;
        let result = parse_json("create sender response", &response.body)?;

        let code = result.pointer("/status/code").and_then(Value::as_i64);
        if code != Some(200) {
            let message = result
                .pointer("/status/message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| format!("unexpected response status {}", response.status));
            log::error!("createBusinessSender failed: {}", message);
            return Err(EcppError::Remote(message));
        }

        let created = result
            .pointer("/data/business/company_name")
            .and_then(Value::as_str)
            .unwrap_or(fields.company_name.as_str())
            .to_string();
        log::info!("Created business sender {}", created);
        Ok(created)
    }

    async fn list_created_reviews(&self) -> Result<Vec<BatchSummary>, EcppError> {
        let token = self.require_token()?;
        let body = json!({ "page_number": 0, "status": -1, "business_type": "all" });
        let response = self
            .post("/transfer-batch/created-by-you", &body, Some(&token))
            .await?;
        let result = parse_json("transfer batch response", &response.body)?;

        let batches = result
            .pointer("/data/batches")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                log::error!("Transfer batch response has no data.batches");
                EcppError::parse("transfer batch response", &response.body)
            })?;
        Ok(batches.iter().map(batch_from).collect())
    }
}
