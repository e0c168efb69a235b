// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chatledger::db;
use chatledger::error::{AssistantError, LlmError, StoreError};
use chatledger::llm::client::ChatClient;
use chatledger::llm::config::{ConfigStore, NewLlmConfig};
use chatledger::llm::providers::ProviderType;
use chatledger::secrets::{MemorySecretStore, SecretStore, SqliteSecretStore, api_key_slot};

fn deepseek(key: Option<&str>) -> NewLlmConfig {
    NewLlmConfig {
        name: String::new(),
        provider: Some(ProviderType::DeepSeek),
        api_key: key.map(str::to_string),
        ..NewLlmConfig::default()
    }
}

#[test]
fn presets_fill_in_url_model_and_name() {
    let conn = db::open_in_memory().unwrap();
    let store = ConfigStore::new(&conn, MemorySecretStore::default());
    let cfg = store.add(deepseek(Some("sk-1"))).unwrap();
    assert_eq!(cfg.name, "DeepSeek");
    assert_eq!(cfg.base_url, "https://api.deepseek.com/v1");
    assert_eq!(cfg.model_name, "deepseek-chat");
    assert_eq!(cfg.provider, ProviderType::DeepSeek);
    assert_eq!(store.api_key(cfg.id).unwrap().as_deref(), Some("sk-1"));
}

#[test]
fn custom_provider_needs_url_and_model() {
    let conn = db::open_in_memory().unwrap();
    let store = ConfigStore::new(&conn, MemorySecretStore::default());
    let err = store
        .add(NewLlmConfig {
            name: "mine".into(),
            provider: Some(ProviderType::Custom),
            model_name: Some("m".into()),
            ..NewLlmConfig::default()
        })
        .unwrap_err();
    assert!(matches!(
        err,
        AssistantError::Llm(LlmError::ConfigurationInvalid(_))
    ));
    assert!(store.list().unwrap().is_empty());

    let cfg = store
        .add(NewLlmConfig {
            name: "mine".into(),
            provider: Some(ProviderType::Custom),
            base_url: Some("http://192.168.1.5:8000/v1".into()),
            model_name: Some("local-model".into()),
            api_key: None,
        })
        .unwrap();
    assert_eq!(cfg.name, "mine");
}

#[test]
fn active_defaults_to_earliest_and_follows_pointer() {
    let conn = db::open_in_memory().unwrap();
    let store = ConfigStore::new(&conn, MemorySecretStore::default());
    assert!(store.active().unwrap().is_none());
    let first = store.add(deepseek(None)).unwrap();
    let second = store
        .add(NewLlmConfig {
            provider: Some(ProviderType::OpenAi),
            ..NewLlmConfig::default()
        })
        .unwrap();
    assert_eq!(store.active().unwrap().unwrap().id, first.id);

    store.set_active(second.id).unwrap();
    assert_eq!(store.active().unwrap().unwrap().id, second.id);
    assert!(store.set_active(999).is_err());

    store.remove(second.id).unwrap();
    assert_eq!(store.active().unwrap().unwrap().id, first.id);
}

#[test]
fn removing_a_configuration_deletes_its_key() {
    let conn = db::open_in_memory().unwrap();
    let secrets = SqliteSecretStore::new(&conn);
    let store = ConfigStore::new(&conn, SqliteSecretStore::new(&conn));
    let cfg = store.add(deepseek(Some("sk-abc"))).unwrap();
    assert_eq!(
        secrets.read(&api_key_slot(cfg.id)).unwrap().as_deref(),
        Some("sk-abc")
    );
    assert!(store.remove(cfg.id).unwrap());
    assert_eq!(secrets.read(&api_key_slot(cfg.id)).unwrap(), None);
    assert!(!store.remove(cfg.id).unwrap());
}

#[test]
fn env_key_overrides_the_stored_key() {
    let conn = db::open_in_memory().unwrap();
    let store = ConfigStore::new(&conn, MemorySecretStore::default());
    let cfg = store.add(deepseek(Some("stored"))).unwrap();
    let ep = store.active_endpoint(None).unwrap();
    assert_eq!(ep.api_key, "stored");
    assert!(ep.json_mode);
    let ep = store.endpoint_for(&cfg, Some("from-env".into())).unwrap();
    assert_eq!(ep.api_key, "from-env");
    let ep = store.endpoint_for(&cfg, Some("  ".into())).unwrap();
    assert_eq!(ep.api_key, "stored");
}

#[test]
fn missing_configuration_or_key_fails_before_any_request() {
    let conn = db::open_in_memory().unwrap();
    let store = ConfigStore::new(&conn, MemorySecretStore::default());
    assert!(matches!(
        store.active_endpoint(None),
        Err(AssistantError::Llm(LlmError::ConfigurationInvalid(_)))
    ));

    store.add(deepseek(None)).unwrap();
    let ep = store.active_endpoint(None).unwrap();
    assert!(ep.api_key.is_empty());
    assert!(matches!(
        ChatClient::new(ep),
        Err(LlmError::ConfigurationInvalid(_))
    ));
}

/// Writes through to the SQLite vault, then reports failure.
struct BrokenVault<'c> {
    inner: SqliteSecretStore<'c>,
}

impl SecretStore for BrokenVault<'_> {
    fn save(&self, key: &str, value: &str) -> Result<bool, StoreError> {
        self.inner.save(key, value)?;
        Err(StoreError::Corrupt("vault refused the key".into()))
    }

    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.inner.read(key)
    }

    fn delete(&self, key: &str) -> Result<bool, StoreError> {
        self.inner.delete(key)
    }
}

#[test]
fn failed_key_save_leaves_no_configuration_behind() {
    let conn = db::open_in_memory().unwrap();
    let broken = ConfigStore::new(
        &conn,
        BrokenVault {
            inner: SqliteSecretStore::new(&conn),
        },
    );
    let err = broken.add(deepseek(Some("sk-lost"))).unwrap_err();
    assert!(matches!(err, AssistantError::Store(StoreError::Corrupt(_))));
    assert!(broken.list().unwrap().is_empty());
    assert!(broken.active().unwrap().is_none());

    let vault = SqliteSecretStore::new(&conn);
    assert_eq!(vault.read(&api_key_slot(1)).unwrap(), None);

    let store = ConfigStore::new(&conn, SqliteSecretStore::new(&conn));
    let cfg = store.add(deepseek(Some("sk-kept"))).unwrap();
    assert_eq!(store.list().unwrap().len(), 1);
    assert_eq!(store.api_key(cfg.id).unwrap().as_deref(), Some("sk-kept"));
}

#[test]
fn memory_vault_round_trips() {
    let vault = MemorySecretStore::default();
    assert!(vault.save("k", "v").unwrap());
    assert_eq!(vault.read("k").unwrap().as_deref(), Some("v"));
    assert!(vault.delete("k").unwrap());
    assert!(!vault.delete("k").unwrap());
    assert_eq!(vault.read("k").unwrap(), None);
}

#[test]
fn provider_slugs_parse_back() {
    for p in ProviderType::ALL {
        assert_eq!(p.slug().parse::<ProviderType>().unwrap(), p);
    }
    assert!(ProviderType::Custom.preset().is_none());
    assert!(!ProviderType::Ollama.supports_json_mode());
}
