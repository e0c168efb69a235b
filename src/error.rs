// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Error taxonomy shared by the LLM pipeline and the ledger store.

use thiserror::Error;

/// Failures of a remote completion round trip or of decoding its content.
#[derive(Debug, Error)]
pub enum LlmError {
    /// Missing or malformed key, base URL or model. No request was sent.
    #[error("LLM configuration invalid: {0}")]
    ConfigurationInvalid(String),

    /// Transport-level failure, including timeouts.
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),

    /// HTTP success but the envelope lacks the expected keys.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Body or cleaned content is not valid JSON for the expected schema.
    #[error("decoding error: {0}")]
    Decoding(String),

    /// The remote service rejected the request.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("corrupt record: {0}")]
    Corrupt(String),

    #[error("not found: {0}")]
    NotFound(String),
}

/// Errors of the natural-language orchestrator.
#[derive(Debug, Error)]
pub enum AssistantError {
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("no amount found in the model output")]
    MissingAmount,

    #[error("no categories available")]
    NoCategory,
}

impl From<rusqlite::Error> for AssistantError {
    fn from(e: rusqlite::Error) -> Self {
        AssistantError::Store(StoreError::Sqlite(e))
    }
}

impl AssistantError {
    /// Text suitable for showing to the end user.
    pub fn user_message(&self) -> String {
        match self {
            AssistantError::Llm(LlmError::ConfigurationInvalid(msg)) => {
                format!("The AI service is not configured correctly: {msg}")
            }
            AssistantError::Llm(LlmError::Network(e)) if e.is_timeout() => {
                "The AI service did not answer in time. Please try again.".to_string()
            }
            AssistantError::Llm(LlmError::Network(_)) => {
                "Could not reach the AI service. Check your network connection.".to_string()
            }
            AssistantError::Llm(LlmError::Api { message, .. }) => {
                format!("The AI service rejected the request: {message}")
            }
            AssistantError::Llm(LlmError::InvalidResponse(_) | LlmError::Decoding(_)) => {
                "The AI service returned something I could not understand.".to_string()
            }
            AssistantError::Store(_) => "Saving to the local ledger failed.".to_string(),
            AssistantError::MissingAmount => "Could not identify an amount.".to_string(),
            AssistantError::NoCategory => {
                "There are no categories yet. Add one before recording.".to_string()
            }
        }
    }
}
