//! Test session and the single-check operation

use anyhow::Result;
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;
use tracing::{debug, warn};

use super::Tally;
use crate::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, MultipartPayload};
use crate::models::{CheckRecord, CheckStatus};
use crate::utils::Timer;

const MAX_PRINTED_BODY: usize = 500;

/// Which credential a check presents
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Auth {
    /// Stored user token, if any
    #[default]
    Session,
    /// Stored admin token, if any
    Admin,
    /// Explicit token, wins over anything stored
    Bearer(String),
    /// No Authorization header at all
    Anonymous,
}

/// Parsed body of a passing check
#[derive(Clone, Debug, PartialEq)]
pub enum ResponseBody {
    Json(Value),
    Empty,
}

impl ResponseBody {
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            ResponseBody::Json(value) => value.get(key),
            ResponseBody::Empty => None,
        }
    }

    /// String field, also accepting numeric ids
    pub fn string_field(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn bool_field(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    /// Array items; empty when the body is not a JSON array
    pub fn items(&self) -> &[Value] {
        match self {
            ResponseBody::Json(Value::Array(items)) => items,
            _ => &[],
        }
    }

    /// First array item whose `key` equals `expected`
    pub fn find_item(&self, key: &str, expected: &str) -> Option<&Value> {
        self.items()
            .iter()
            .find(|item| item.get(key).and_then(Value::as_str) == Some(expected))
    }
}

/// Result of [`TestSession::check`]
#[derive(Clone, Debug)]
pub struct CheckOutcome {
    pub passed: bool,
    pub body: ResponseBody,
}

impl CheckOutcome {
    fn failed() -> Self {
        Self {
            passed: false,
            body: ResponseBody::Empty,
        }
    }
}

/// One named expectation against one endpoint
#[derive(Clone, Debug)]
pub struct Check {
    pub name: String,
    pub method: HttpMethod,
    pub endpoint: String,
    pub expected_status: u16,
    pub json: Option<Value>,
    pub multipart: Option<MultipartPayload>,
    pub auth: Auth,
}

impl Check {
    pub fn new(
        name: impl Into<String>,
        method: HttpMethod,
        endpoint: impl Into<String>,
        expected_status: u16,
    ) -> Self {
        Self {
            name: name.into(),
            method,
            endpoint: endpoint.into(),
            expected_status,
            json: None,
            multipart: None,
            auth: Auth::Session,
        }
    }

    pub fn get(name: impl Into<String>, endpoint: impl Into<String>, expected: u16) -> Self {
        Self::new(name, HttpMethod::Get, endpoint, expected)
    }

    pub fn post(name: impl Into<String>, endpoint: impl Into<String>, expected: u16) -> Self {
        Self::new(name, HttpMethod::Post, endpoint, expected)
    }

    pub fn put(name: impl Into<String>, endpoint: impl Into<String>, expected: u16) -> Self {
        Self::new(name, HttpMethod::Put, endpoint, expected)
    }

    pub fn delete(name: impl Into<String>, endpoint: impl Into<String>, expected: u16) -> Self {
        Self::new(name, HttpMethod::Delete, endpoint, expected)
    }

    pub fn json(mut self, body: Value) -> Self {
        self.json = Some(body);
        self
    }

    pub fn multipart(mut self, payload: MultipartPayload) -> Self {
        self.multipart = Some(payload);
        self
    }

    pub fn auth(mut self, auth: Auth) -> Self {
        self.auth = auth;
        self
    }

    pub fn as_admin(self) -> Self {
        self.auth(Auth::Admin)
    }

    pub fn anonymous(self) -> Self {
        self.auth(Auth::Anonymous)
    }

    pub fn bearer(self, token: impl Into<String>) -> Self {
        self.auth(Auth::Bearer(token.into()))
    }
}

/// State for one run: base URL, tokens and the tally
pub struct TestSession {
    client: HttpClient,
    base_url: String,
    token: Option<String>,
    admin_token: Option<String>,
    tally: Tally,
}

impl TestSession {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into();
        let client = HttpClient::new()?.base_url(base_url.clone());
        Ok(Self {
            client,
            base_url,
            token: None,
            admin_token: None,
            tally: Tally::new(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn set_token(&mut self, token: impl Into<String>) {
        self.token = Some(token.into());
    }

    pub fn set_admin_token(&mut self, token: impl Into<String>) {
        self.admin_token = Some(token.into());
    }

    pub fn admin_token(&self) -> Option<&str> {
        self.admin_token.as_deref()
    }

    pub fn tally(&self) -> &Tally {
        &self.tally
    }

    pub fn tally_mut(&mut self) -> &mut Tally {
        &mut self.tally
    }

    /// `auth/login` -> `/api/auth/login`
    pub fn api_path(endpoint: &str) -> String {
        format!("/api/{}", endpoint.trim_start_matches('/'))
    }

    fn resolve_token(&self, auth: &Auth) -> Option<String> {
        match auth {
            Auth::Bearer(token) => Some(token.clone()),
            Auth::Session => self.token.clone(),
            Auth::Admin => self.admin_token.clone(),
            Auth::Anonymous => None,
        }
    }

    fn build_request(&self, method: HttpMethod, path: String, auth: &Auth) -> HttpRequest {
        let request = HttpRequest::new(method, path);
        match self.resolve_token(auth) {
            Some(token) => request.bearer(&token),
            None => request,
        }
    }

    /// Run one check. Never returns an error; every failure is recorded.
    pub async fn check(&mut self, check: Check) -> CheckOutcome {
        let path = Self::api_path(&check.endpoint);
        let target = format!("{} {}", check.method, path);
        let mut request = self.build_request(check.method, path, &check.auth);

        request = match (check.multipart, check.json) {
            (Some(payload), _) => request.multipart(payload),
            (None, Some(body)) => request
                .header(CONTENT_TYPE.as_str(), "application/json")
                .json(body),
            (None, None) => request.header(CONTENT_TYPE.as_str(), "application/json"),
        };

        println!("\n🔍 Testing {}...", check.name);
        debug!("{} expecting {}", target, check.expected_status);

        let timer = Timer::start(&check.name);
        let result = self.client.send(request).await;
        let duration_ms = timer.stop();

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                println!("✗ Failed - Error: {e}");
                warn!("{} errored: {}", target, e);
                self.tally.record(
                    CheckRecord::new(&check.name, target, CheckStatus::Error)
                        .with_statuses(check.expected_status, None)
                        .with_duration(duration_ms)
                        .with_message(e.to_string()),
                );
                return CheckOutcome::failed();
            }
        };

        let record = CheckRecord::new(&check.name, target, CheckStatus::Pass)
            .with_statuses(check.expected_status, Some(response.status_code))
            .with_duration(duration_ms);

        if response.status_code == check.expected_status {
            println!("✓ Passed - Status: {}", response.status_code);
            self.tally.record(record);
            let body = match response.json() {
                Some(value) => ResponseBody::Json(value),
                None => ResponseBody::Empty,
            };
            CheckOutcome { passed: true, body }
        } else {
            println!(
                "✗ Failed - Expected {}, got {}",
                check.expected_status, response.status_code
            );
            let printed = printable_body(&response);
            println!("Response: {printed}");
            let mut record = record.with_message(format!(
                "expected {}, got {}",
                check.expected_status, response.status_code
            ));
            record.status = CheckStatus::Fail;
            self.tally.record(record);
            CheckOutcome::failed()
        }
    }

    /// Uncounted request, used for snapshots. `None` on transport failure.
    pub async fn probe(
        &self,
        method: HttpMethod,
        endpoint: &str,
        auth: &Auth,
    ) -> Option<HttpResponse> {
        let request = self.build_request(method, Self::api_path(endpoint), auth);
        match self.client.send(request).await {
            Ok(response) => Some(response),
            Err(e) => {
                debug!("Probe of {} failed: {}", endpoint, e);
                None
            }
        }
    }

    /// Fetch a non-API path relative to the base URL, uncounted
    pub async fn fetch(&self, path: &str) -> Result<HttpResponse> {
        self.client.get(path).await
    }

    /// Record a non-HTTP assertion in the tally
    pub fn verify(&mut self, name: &str, condition: bool, failure: impl Into<String>) -> bool {
        self.tally.verify(name, "assert", condition, failure)
    }

    /// Record a deliberately skipped step
    pub fn skip(&mut self, name: &str, reason: impl Into<String>) {
        self.tally.skip(name, "skip", reason);
    }
}

fn printable_body(response: &HttpResponse) -> String {
    let text = match response.json() {
        Some(value) => value.to_string(),
        None => response.body.clone(),
    };
    if text.chars().count() > MAX_PRINTED_BODY {
        let truncated: String = text.chars().take(MAX_PRINTED_BODY).collect();
        format!("{truncated}...")
    } else {
        text
    }
}
