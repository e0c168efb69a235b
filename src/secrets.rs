// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Opaque key/value vault for API keys.

use rusqlite::{Connection, OptionalExtension, params};
use std::cell::RefCell;
use std::collections::HashMap;

use crate::error::StoreError;

pub trait SecretStore {
    fn save(&self, key: &str, value: &str) -> Result<bool, StoreError>;
    fn read(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn delete(&self, key: &str) -> Result<bool, StoreError>;
}

/// Vault key holding the API key of configuration `config_id`.
pub fn api_key_slot(config_id: i64) -> String {
    format!("llm_api_key.{}", config_id)
}

/// Vault backed by the `secrets` table of the ledger database.
pub struct SqliteSecretStore<'c> {
    conn: &'c Connection,
}

impl<'c> SqliteSecretStore<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }
}

impl SecretStore for SqliteSecretStore<'_> {
    fn save(&self, key: &str, value: &str) -> Result<bool, StoreError> {
        let n = self.conn.execute(
            "INSERT INTO secrets(key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value=excluded.value",
            params![key, value],
        )?;
        Ok(n > 0)
    }

    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self
            .conn
            .query_row("SELECT value FROM secrets WHERE key=?1", params![key], |r| {
                r.get(0)
            })
            .optional()?)
    }

    fn delete(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self
            .conn
            .execute("DELETE FROM secrets WHERE key=?1", params![key])?
            > 0)
    }
}

#[derive(Debug, Default)]
pub struct MemorySecretStore {
    values: RefCell<HashMap<String, String>>,
}

impl SecretStore for MemorySecretStore {
    fn save(&self, key: &str, value: &str) -> Result<bool, StoreError> {
        self.values
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(true)
    }

    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.values.borrow().get(key).cloned())
    }

    fn delete(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.values.borrow_mut().remove(key).is_some())
    }
}
