// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Known OpenAI-compatible providers used to pre-fill configurations.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy)]
pub struct ProviderPreset {
    pub display_name: &'static str,
    pub base_url: &'static str,
    pub default_model: &'static str,
    /// Whether the endpoint honours `response_format: json_object`.
    pub json_mode: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    OpenAi,
    DeepSeek,
    Moonshot,
    Zhipu,
    Qwen,
    Doubao,
    SiliconFlow,
    OpenRouter,
    Groq,
    Mistral,
    Xai,
    Gemini,
    Ollama,
    Custom,
}

impl ProviderType {
    pub const ALL: [ProviderType; 14] = [
        ProviderType::OpenAi,
        ProviderType::DeepSeek,
        ProviderType::Moonshot,
        ProviderType::Zhipu,
        ProviderType::Qwen,
        ProviderType::Doubao,
        ProviderType::SiliconFlow,
        ProviderType::OpenRouter,
        ProviderType::Groq,
        ProviderType::Mistral,
        ProviderType::Xai,
        ProviderType::Gemini,
        ProviderType::Ollama,
        ProviderType::Custom,
    ];

    pub fn slug(&self) -> &'static str {
        match self {
            ProviderType::OpenAi => "openai",
            ProviderType::DeepSeek => "deepseek",
            ProviderType::Moonshot => "moonshot",
            ProviderType::Zhipu => "zhipu",
            ProviderType::Qwen => "qwen",
            ProviderType::Doubao => "doubao",
            ProviderType::SiliconFlow => "siliconflow",
            ProviderType::OpenRouter => "openrouter",
            ProviderType::Groq => "groq",
            ProviderType::Mistral => "mistral",
            ProviderType::Xai => "xai",
            ProviderType::Gemini => "gemini",
            ProviderType::Ollama => "ollama",
            ProviderType::Custom => "custom",
        }
    }

    /// `None` for [`ProviderType::Custom`].
    pub fn preset(&self) -> Option<ProviderPreset> {
        let (display_name, base_url, default_model, json_mode) = match self {
            ProviderType::OpenAi => ("OpenAI", "https://api.openai.com/v1", "gpt-4o-mini", true),
            ProviderType::DeepSeek => ("DeepSeek", "https://api.deepseek.com/v1", "deepseek-chat", true),
            ProviderType::Moonshot => ("Moonshot (Kimi)", "https://api.moonshot.cn/v1", "moonshot-v1-8k", true),
            ProviderType::Zhipu => ("Zhipu GLM", "https://open.bigmodel.cn/api/paas/v4", "glm-4-flash", true),
            ProviderType::Qwen => (
                "Qwen (DashScope)",
                "https://dashscope.aliyuncs.com/compatible-mode/v1",
                "qwen-turbo",
                true,
            ),
            ProviderType::Doubao => (
                "Doubao (Volcengine Ark)",
                "https://ark.cn-beijing.volces.com/api/v3",
                "doubao-pro-32k",
                true,
            ),
            ProviderType::SiliconFlow => (
                "SiliconFlow",
                "https://api.siliconflow.cn/v1",
                "Qwen/Qwen2.5-7B-Instruct",
                true,
            ),
            ProviderType::OpenRouter => ("OpenRouter", "https://openrouter.ai/api/v1", "openai/gpt-4o-mini", true),
            ProviderType::Groq => ("Groq", "https://api.groq.com/openai/v1", "llama-3.1-8b-instant", true),
            ProviderType::Mistral => ("Mistral", "https://api.mistral.ai/v1", "mistral-small-latest", true),
            ProviderType::Xai => ("xAI Grok", "https://api.x.ai/v1", "grok-2-latest", false),
            ProviderType::Gemini => (
                "Google Gemini",
                "https://generativelanguage.googleapis.com/v1beta/openai",
                "gemini-1.5-flash",
                true,
            ),
            ProviderType::Ollama => ("Ollama (local)", "http://localhost:11434/v1", "llama3.2", false),
            ProviderType::Custom => return None,
        };
        Some(ProviderPreset {
            display_name,
            base_url,
            default_model,
            json_mode,
        })
    }

    pub fn display_name(&self) -> &'static str {
        self.preset().map(|p| p.display_name).unwrap_or("Custom")
    }

    pub fn supports_json_mode(&self) -> bool {
        self.preset().map(|p| p.json_mode).unwrap_or(false)
    }
}

impl fmt::Display for ProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for ProviderType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        ProviderType::ALL
            .iter()
            .copied()
            .find(|p| p.slug() == wanted)
            .ok_or_else(|| format!("Unknown provider '{}'", s.trim()))
    }
}
