//! Test doubles for the API layer.

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::Method;
use serde_json::Value;
use std::time::Duration;

use super::client::Credentials;
use super::request::ApiRequest;
use super::transport::{RawResponse, Transport};
use super::ApiError;

struct Scripted {
    method: Method,
    target: String,
    outcome: Result<RawResponse, String>,
    delay: Option<Duration>,
}

/// Transport that answers from a script and records every request.
///
/// Lookups match on method plus path-and-query. Later entries win, so a test
/// can re-script an endpoint midway. Unscripted requests get a 404.
#[derive(Default)]
pub struct MockTransport {
    script: Mutex<Vec<Scripted>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, method: Method, target: &str, outcome: Result<RawResponse, String>, delay: Option<Duration>) {
        self.script.lock().push(Scripted {
            method,
            target: target.to_string(),
            outcome,
            delay,
        });
    }

    pub fn on(&self, method: Method, target: &str, status: u16, body: &str) {
        self.push(method, target, Ok(RawResponse::new(status, body)), None);
    }

    pub fn on_json(&self, method: Method, target: &str, status: u16, body: Value) {
        self.push(method, target, Ok(RawResponse::new(status, body.to_string())), None);
    }

    pub fn on_delayed(&self, method: Method, target: &str, delay: Duration, status: u16, body: Value) {
        self.push(
            method,
            target,
            Ok(RawResponse::new(status, body.to_string())),
            Some(delay),
        );
    }

    /// Fail with no response at all.
    pub fn fail(&self, method: Method, target: &str, message: &str) {
        self.push(method, target, Err(message.to_string()), None);
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn targets(&self) -> Vec<String> {
        self.requests
            .lock()
            .iter()
            .map(|r| format!("{} {}", r.method, r.target()))
            .collect()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: &ApiRequest) -> Result<RawResponse, ApiError> {
        self.requests.lock().push(request.clone());
        let target = request.target();

        let (outcome, delay) = {
            let script = self.script.lock();
            match script
                .iter()
                .rev()
                .find(|s| s.method == request.method && s.target == target)
            {
                Some(s) => (s.outcome.clone(), s.delay),
                None => (Ok(RawResponse::new(404, "")), None),
            }
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        outcome.map_err(ApiError::Network)
    }
}

/// Fixed token source that counts revocations.
pub struct StaticCredentials {
    token: Mutex<Option<String>>,
    revoked: Mutex<usize>,
}

impl StaticCredentials {
    pub fn new(token: Option<&str>) -> Self {
        Self {
            token: Mutex::new(token.map(str::to_string)),
            revoked: Mutex::new(0),
        }
    }

    pub fn revocations(&self) -> usize {
        *self.revoked.lock()
    }
}

impl Credentials for StaticCredentials {
    fn bearer(&self) -> Option<String> {
        self.token.lock().clone()
    }

    fn revoke(&self) {
        *self.token.lock() = None;
        *self.revoked.lock() += 1;
    }
}
