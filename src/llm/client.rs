// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Blocking client for OpenAI-compatible `/chat/completions` endpoints.

use reqwest::Url;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::LlmError;
use crate::utils::http_client;

pub const COMPLETION_TIMEOUT: Duration = Duration::from_secs(30);
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Everything needed to reach one model.
#[derive(Debug, Clone)]
pub struct Endpoint {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub json_mode: bool,
}

#[derive(Debug, Clone)]
pub struct CompletionOptions {
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    /// Ask for `response_format: json_object` where the endpoint supports it.
    pub json_object: bool,
    pub timeout: Duration,
}

impl CompletionOptions {
    pub fn intent() -> Self {
        Self {
            temperature: 0.1,
            max_tokens: Some(400),
            json_object: true,
            timeout: COMPLETION_TIMEOUT,
        }
    }

    pub fn voice() -> Self {
        Self::intent()
    }

    pub fn extraction() -> Self {
        Self {
            temperature: 0.3,
            max_tokens: Some(400),
            json_object: true,
            timeout: COMPLETION_TIMEOUT,
        }
    }

    pub fn answer() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: Some(600),
            json_object: false,
            timeout: COMPLETION_TIMEOUT,
        }
    }

    pub fn probe() -> Self {
        Self {
            temperature: 0.0,
            max_tokens: Some(5),
            json_object: false,
            timeout: PROBE_TIMEOUT,
        }
    }
}

/// One system + user round trip returning the cleaned assistant content.
pub trait Completion {
    fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        options: &CompletionOptions,
    ) -> Result<String, LlmError>;
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub format_type: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetails,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetails {
    message: String,
}

pub fn completions_url(base_url: &str) -> String {
    format!("{}/chat/completions", base_url.trim().trim_end_matches('/'))
}

/// Removes one leading ```` ```json ```` / ```` ``` ```` fence and one trailing
/// ```` ``` ```` fence. Content without fences is only trimmed.
pub fn strip_code_fence(content: &str) -> String {
    let mut s = content.trim();
    if let Some(rest) = s.strip_prefix("```json").or_else(|| s.strip_prefix("```JSON")) {
        s = rest;
    } else if let Some(rest) = s.strip_prefix("```") {
        s = rest;
    }
    if let Some(rest) = s.strip_suffix("```") {
        s = rest;
    }
    s.trim().to_string()
}

/// Pulls `choices[0].message.content` out of a success body.
pub fn extract_content(body: &str) -> Result<String, LlmError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| LlmError::Decoding(format!("response body is not JSON: {}", e)))?;
    let content = value
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(Value::as_str)
        .ok_or_else(|| {
            LlmError::InvalidResponse("missing choices[0].message.content".to_string())
        })?;
    Ok(strip_code_fence(content))
}

/// Error for a non-2xx response, preferring the `{error:{message}}` payload.
pub fn api_error(status: u16, body: &str) -> LlmError {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(parsed) => LlmError::Api {
            status,
            message: parsed.error.message,
        },
        Err(_) => LlmError::Api {
            status,
            message: format!("HTTP {}", status),
        },
    }
}

pub struct ChatClient {
    http: reqwest::blocking::Client,
    url: Url,
    endpoint: Endpoint,
}

impl ChatClient {
    /// Validates the endpoint; no request is made here.
    pub fn new(endpoint: Endpoint) -> Result<Self, LlmError> {
        if endpoint.api_key.trim().is_empty() {
            return Err(LlmError::ConfigurationInvalid("API key is missing".into()));
        }
        if endpoint.model.trim().is_empty() {
            return Err(LlmError::ConfigurationInvalid("model name is missing".into()));
        }
        let raw = completions_url(&endpoint.base_url);
        let url = Url::parse(&raw).map_err(|e| {
            LlmError::ConfigurationInvalid(format!("invalid base URL '{}': {}", endpoint.base_url, e))
        })?;
        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            return Err(LlmError::ConfigurationInvalid(format!(
                "base URL '{}' must be an http(s) URL with a host",
                endpoint.base_url
            )));
        }
        let http = http_client(COMPLETION_TIMEOUT).map_err(LlmError::Network)?;
        Ok(Self {
            http,
            url,
            endpoint,
        })
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn build_request(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        options: &CompletionOptions,
    ) -> ChatRequest {
        ChatRequest {
            model: self.endpoint.model.clone(),
            messages: vec![ChatMessage::system(system_prompt), ChatMessage::user(user_prompt)],
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            response_format: (options.json_object && self.endpoint.json_mode).then(|| {
                ResponseFormat {
                    format_type: "json_object".to_string(),
                }
            }),
        }
    }

    /// Lightweight connectivity check with the short timeout.
    pub fn probe(&self) -> Result<String, LlmError> {
        self.complete(
            "You are a connectivity check. Reply with the single word OK.",
            "ping",
            &CompletionOptions::probe(),
        )
    }
}

impl Completion for ChatClient {
    fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        options: &CompletionOptions,
    ) -> Result<String, LlmError> {
        let request = self.build_request(system_prompt, user_prompt, options);
        debug!(
            url = %self.url,
            model = %request.model,
            temperature = request.temperature,
            json_object = request.response_format.is_some(),
            "sending chat completion"
        );

        let response = self
            .http
            .post(self.url.clone())
            .timeout(options.timeout)
            .header(AUTHORIZATION, format!("Bearer {}", self.endpoint.api_key))
            .header(CONTENT_TYPE, "application/json")
            .json(&request)
            .send()
            .map_err(|e| {
                warn!(error = %e, "chat completion request failed");
                LlmError::Network(e)
            })?;

        let status = response.status();
        let body = response.text().map_err(LlmError::Network)?;
        if !status.is_success() {
            let err = api_error(status.as_u16(), &body);
            warn!(status = status.as_u16(), error = %err, "chat completion rejected");
            return Err(err);
        }
        let content = extract_content(&body)?;
        debug!(chars = content.len(), "chat completion received");
        Ok(content)
    }
}
