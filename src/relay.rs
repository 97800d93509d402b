//! Code-analysis relay: validates a `{ "code": ... }` POST, wraps the code in
//! a fixed prompt and forwards it to a generative-language endpoint, relaying
//! the upstream JSON verbatim.

use crate::error::{FieldError, Result};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent";
pub const API_KEY_VAR: &str = "GEMINI_API_KEY";
pub const ENDPOINT_VAR: &str = "GEMINI_ENDPOINT";

const REQUEST_TIMEOUT_SECS: u64 = 60;

const PROMPT_TEMPLATE: &str = "Act as a senior software architect. Analyze this Python code.
1. Briefly explain what it does.
2. Point out any errors.
3. Suggest one optimization.
Keep the tone technical, concise, and \"cyberpunk/hacker\" style.
Code:

";

/// Incoming request as seen by the handler
#[derive(Debug, Clone)]
pub struct RelayRequest {
    pub method: String,
    pub body: Option<String>,
}

impl RelayRequest {
    pub fn post(body: impl Into<String>) -> Self {
        Self {
            method: "POST".to_string(),
            body: Some(body.into()),
        }
    }
}

/// Status code plus JSON body returned to the caller
#[derive(Debug, Clone, PartialEq)]
pub struct RelayResponse {
    pub status: u16,
    pub body: Value,
}

impl RelayResponse {
    fn error(status: u16, message: &str) -> Self {
        Self {
            status,
            body: json!({ "error": message }),
        }
    }
}

/// Where the upstream lives and how to authenticate
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
}

impl RelayConfig {
    /// Read the credential and optional endpoint override from the environment
    pub fn from_env() -> Self {
        let non_empty = |var: &str| std::env::var(var).ok().filter(|v| !v.trim().is_empty());
        Self {
            endpoint: non_empty(ENDPOINT_VAR).unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            api_key: non_empty(API_KEY_VAR),
        }
    }
}

/// The upstream text-generation service
pub trait Upstream {
    fn generate(&self, endpoint: &str, api_key: &str, payload: &Value) -> Result<Value>;
}

/// Upstream reached over HTTPS with ureq
pub struct HttpUpstream {
    agent: ureq::Agent,
}

impl HttpUpstream {
    pub fn new() -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(REQUEST_TIMEOUT_SECS)))
            // Upstream error payloads are relayed like any other JSON
            .http_status_as_error(false)
            .build();
        Self { agent: config.into() }
    }
}

impl Default for HttpUpstream {
    fn default() -> Self {
        Self::new()
    }
}

impl Upstream for HttpUpstream {
    fn generate(&self, endpoint: &str, api_key: &str, payload: &Value) -> Result<Value> {
        let mut response = self
            .agent
            .post(endpoint)
            .header("Content-Type", "application/json")
            .header("x-goog-api-key", api_key)
            .send_json(payload)
            .map_err(|e| FieldError::Upstream(e.to_string()))?;

        tracing::debug!(status = response.status().as_u16(), "upstream responded");

        response
            .body_mut()
            .read_json::<Value>()
            .map_err(|e| FieldError::Upstream(format!("unreadable response: {}", e)))
    }
}

#[derive(Deserialize)]
struct AnalyzeBody {
    code: Option<String>,
}

/// Request payload for the upstream model
pub fn build_payload(code: &str) -> Value {
    json!({
        "contents": [{
            "parts": [{ "text": format!("{}{}", PROMPT_TEMPLATE, code) }]
        }]
    })
}

/// Handle one analyze request. Failure detail goes to the log only; callers
/// get a generic message.
pub fn handle(request: &RelayRequest, config: &RelayConfig, upstream: &dyn Upstream) -> RelayResponse {
    if !request.method.eq_ignore_ascii_case("POST") {
        return RelayResponse::error(405, "Method Not Allowed");
    }

    let Some(body) = request.body.as_deref().filter(|b| !b.trim().is_empty()) else {
        return RelayResponse::error(400, "No code provided");
    };

    let code = match serde_json::from_str::<AnalyzeBody>(body) {
        Ok(AnalyzeBody { code: Some(code) }) if !code.trim().is_empty() => code,
        Ok(_) => return RelayResponse::error(400, "No code provided"),
        Err(err) => {
            tracing::warn!(%err, "rejecting malformed analyze body");
            return RelayResponse::error(400, "Invalid request body");
        }
    };

    let Some(api_key) = config.api_key.as_deref() else {
        tracing::error!("{} is not set", API_KEY_VAR);
        return RelayResponse::error(500, "Server Configuration Error");
    };

    match upstream.generate(&config.endpoint, api_key, &build_payload(&code)) {
        Ok(data) => {
            tracing::info!(code_len = code.len(), "analysis relayed");
            RelayResponse { status: 200, body: data }
        }
        Err(err) => {
            tracing::error!(%err, "analysis request failed");
            RelayResponse::error(500, "Analysis failed")
        }
    }
}
