// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Stored LLM endpoint configurations and the active-configuration pointer.

use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::info;

use crate::error::{AssistantError, LlmError, StoreError};
use crate::llm::client::Endpoint;
use crate::llm::providers::ProviderType;
use crate::models::LlmConfig;
use crate::secrets::{SecretStore, api_key_slot};

const ACTIVE_KEY: &str = "active_llm_config";

/// Environment variable that overrides the stored key of the active configuration.
pub const API_KEY_ENV: &str = "CHATLEDGER_API_KEY";

#[derive(Debug, Clone, Default)]
pub struct NewLlmConfig {
    pub name: String,
    pub provider: Option<ProviderType>,
    pub base_url: Option<String>,
    pub model_name: Option<String>,
    pub api_key: Option<String>,
}

pub struct ConfigStore<'c, S: SecretStore> {
    conn: &'c Connection,
    secrets: S,
}

fn config_from_row(row: &Row<'_>) -> Result<LlmConfig, StoreError> {
    let provider: String = row.get(2)?;
    Ok(LlmConfig {
        id: row.get(0)?,
        name: row.get(1)?,
        provider: provider.parse().map_err(StoreError::Corrupt)?,
        base_url: row.get(3)?,
        model_name: row.get(4)?,
        created_at: row.get(5)?,
    })
}

impl<'c, S: SecretStore> ConfigStore<'c, S> {
    pub fn new(conn: &'c Connection, secrets: S) -> Self {
        Self { conn, secrets }
    }

    pub fn list(&self) -> Result<Vec<LlmConfig>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, provider, base_url, model_name, created_at FROM llm_configs ORDER BY id",
        )?;
        let mut rows = stmt.query([])?;
        let mut out = Vec::new();
        while let Some(r) = rows.next()? {
            out.push(config_from_row(r)?);
        }
        Ok(out)
    }

    pub fn get(&self, id: i64) -> Result<Option<LlmConfig>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, provider, base_url, model_name, created_at FROM llm_configs WHERE id=?1",
        )?;
        let mut rows = stmt.query(params![id])?;
        match rows.next()? {
            Some(r) => Ok(Some(config_from_row(r)?)),
            None => Ok(None),
        }
    }

    /// Missing base URL and model are taken from the provider preset.
    pub fn add(&self, new: NewLlmConfig) -> Result<LlmConfig, AssistantError> {
        let provider = new.provider.unwrap_or(ProviderType::Custom);
        let preset = provider.preset();
        let base_url = new
            .base_url
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .or_else(|| preset.map(|p| p.base_url.to_string()))
            .ok_or_else(|| {
                LlmError::ConfigurationInvalid("a custom provider needs a base URL".into())
            })?;
        let model_name = new
            .model_name
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .or_else(|| preset.map(|p| p.default_model.to_string()))
            .ok_or_else(|| {
                LlmError::ConfigurationInvalid("a custom provider needs a model name".into())
            })?;
        let name = if new.name.trim().is_empty() {
            provider.display_name().to_string()
        } else {
            new.name.trim().to_string()
        };

        // the row and its key land together or not at all
        let tx = self.conn.unchecked_transaction().map_err(StoreError::from)?;
        tx.execute(
            "INSERT INTO llm_configs(name, provider, base_url, model_name) VALUES (?1,?2,?3,?4)",
            params![name, provider.slug(), base_url, model_name],
        )
        .map_err(StoreError::from)?;
        let id = tx.last_insert_rowid();
        if let Some(key) = new.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty()) {
            self.secrets.save(&api_key_slot(id), key)?;
        }
        tx.commit().map_err(StoreError::from)?;
        info!(id, provider = %provider, "LLM configuration added");
        self.get(id)?
            .ok_or_else(|| StoreError::NotFound(format!("LLM configuration {}", id)).into())
    }

    /// Removes the configuration, its key, and the active pointer if it pointed here.
    pub fn remove(&self, id: i64) -> Result<bool, StoreError> {
        let removed = self
            .conn
            .execute("DELETE FROM llm_configs WHERE id=?1", params![id])?
            > 0;
        self.secrets.delete(&api_key_slot(id))?;
        if self.active_pointer()? == Some(id) {
            self.conn
                .execute("DELETE FROM settings WHERE key=?1", params![ACTIVE_KEY])?;
        }
        Ok(removed)
    }

    fn active_pointer(&self) -> Result<Option<i64>, StoreError> {
        let raw: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM settings WHERE key=?1",
                params![ACTIVE_KEY],
                |r| r.get(0),
            )
            .optional()?;
        Ok(raw.and_then(|v| v.parse().ok()))
    }

    pub fn set_active(&self, id: i64) -> Result<(), StoreError> {
        if self.get(id)?.is_none() {
            return Err(StoreError::NotFound(format!("LLM configuration {}", id)));
        }
        self.conn.execute(
            "INSERT INTO settings(key, value) VALUES(?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value=excluded.value",
            params![ACTIVE_KEY, id.to_string()],
        )?;
        info!(id, "active LLM configuration changed");
        Ok(())
    }

    /// The pointed-to configuration, else the earliest created one.
    pub fn active(&self) -> Result<Option<LlmConfig>, StoreError> {
        if let Some(id) = self.active_pointer()? {
            if let Some(cfg) = self.get(id)? {
                return Ok(Some(cfg));
            }
        }
        Ok(self.list()?.into_iter().next())
    }

    pub fn set_api_key(&self, id: i64, key: &str) -> Result<bool, StoreError> {
        self.secrets.save(&api_key_slot(id), key.trim())
    }

    pub fn api_key(&self, id: i64) -> Result<Option<String>, StoreError> {
        self.secrets.read(&api_key_slot(id))
    }

    pub fn endpoint_for(
        &self,
        cfg: &LlmConfig,
        key_override: Option<String>,
    ) -> Result<Endpoint, AssistantError> {
        let api_key = match key_override.filter(|k| !k.trim().is_empty()) {
            Some(k) => k,
            None => self.api_key(cfg.id)?.unwrap_or_default(),
        };
        Ok(Endpoint {
            base_url: cfg.base_url.clone(),
            api_key,
            model: cfg.model_name.clone(),
            json_mode: cfg.provider.supports_json_mode(),
        })
    }

    /// Endpoint of the active configuration; fails without touching the network.
    pub fn active_endpoint(&self, key_override: Option<String>) -> Result<Endpoint, AssistantError> {
        let cfg = self.active()?.ok_or_else(|| {
            LlmError::ConfigurationInvalid(
                "no LLM configuration; add one with `chatledger llm add`".into(),
            )
        })?;
        self.endpoint_for(&cfg, key_override)
    }
}
