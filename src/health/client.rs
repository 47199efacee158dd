use reqwest::blocking::Client;
use serde_json::{json, Value};
use std::time::Duration;

use crate::config::Settings;

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// A text-in, text-out oracle. The pipeline only relies on getting a string
/// back; what the string means is the caller's problem.
pub trait Reasoner {
    fn complete(&self, prompt: &str) -> Result<String, String>;
}

/// Messages API client: one user-role message per request.
pub struct AnthropicClient {
    http: Client,
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    timeout: Option<Duration>,
}

impl AnthropicClient {
    /// Without `request_timeout_secs` a request waits until the service
    /// answers; the HTTP client's own 30s default is switched off.
    pub fn new(settings: &Settings, api_key: String) -> Result<Self, String> {
        let timeout = settings.request_timeout_secs.map(Duration::from_secs);
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| format!("Failed to build HTTP client: {e}"))?;
        Ok(AnthropicClient {
            http,
            base_url: settings.api_base_url.clone(),
            api_key,
            model: settings.model.clone(),
            max_tokens: settings.max_tokens,
            timeout,
        })
    }

    fn request_body(&self, prompt: &str) -> Value {
        json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "messages": [{"role": "user", "content": prompt}],
        })
    }
}

impl Reasoner for AnthropicClient {
    fn complete(&self, prompt: &str) -> Result<String, String> {
        let url = format!("{}/v1/messages", self.base_url.trim_end_matches('/'));
        let resp = self
            .http
            .post(url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&self.request_body(prompt))
            .send()
            .map_err(|e| format!("messages request failed: {e}"))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().unwrap_or_default();
            return Err(format!("messages API returned {status}: {body}"));
        }

        let v: Value = resp
            .json()
            .map_err(|e| format!("Failed to decode messages response: {e}"))?;
        first_text_part(&v).ok_or_else(|| "messages response has no text content".to_string())
    }
}

/// `{ content: [ {type: "text", text: ".."}, .. ] }` → the first text part.
fn first_text_part(v: &Value) -> Option<String> {
    v.get("content")?
        .as_array()?
        .iter()
        .filter(|part| part.get("type").and_then(Value::as_str).unwrap_or("text") == "text")
        .find_map(|part| part.get("text").and_then(Value::as_str))
        .map(str::to_string)
}
