// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::AssistantError;
use crate::llm::client::ChatClient;
use crate::llm::config::{API_KEY_ENV, ConfigStore, NewLlmConfig};
use crate::llm::providers::ProviderType;
use crate::secrets::SqliteSecretStore;
use crate::utils::{maybe_print_json, pretty_table, required_arg};
use anyhow::{Result, anyhow};
use rusqlite::Connection;

fn required_id(sub: &clap::ArgMatches) -> Result<i64> {
    sub.get_one::<i64>("id")
        .copied()
        .ok_or_else(|| anyhow!("Missing required argument 'id'"))
}

/// Key from the environment wins over the stored one.
pub fn env_api_key() -> Option<String> {
    std::env::var(API_KEY_ENV)
        .ok()
        .filter(|k| !k.trim().is_empty())
}

/// Client for the active configuration.
pub fn active_client(conn: &Connection) -> Result<ChatClient, AssistantError> {
    let store = ConfigStore::new(conn, SqliteSecretStore::new(conn));
    let endpoint = store.active_endpoint(env_api_key())?;
    Ok(ChatClient::new(endpoint)?)
}

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    let store = ConfigStore::new(conn, SqliteSecretStore::new(conn));
    match m.subcommand() {
        Some(("providers", _)) => {
            let data = ProviderType::ALL
                .iter()
                .map(|p| match p.preset() {
                    Some(preset) => vec![
                        p.slug().to_string(),
                        preset.display_name.to_string(),
                        preset.base_url.to_string(),
                        preset.default_model.to_string(),
                    ],
                    None => vec![
                        p.slug().to_string(),
                        p.display_name().to_string(),
                        "(required)".to_string(),
                        "(required)".to_string(),
                    ],
                })
                .collect();
            println!(
                "{}",
                pretty_table(&["Slug", "Provider", "Base URL", "Default model"], data)
            );
        }
        Some(("add", sub)) => {
            let provider: ProviderType = required_arg(sub, "provider")?
                .parse()
                .map_err(|e: String| anyhow!(e))?;
            let cfg = store
                .add(NewLlmConfig {
                    name: sub.get_one::<String>("name").cloned().unwrap_or_default(),
                    provider: Some(provider),
                    base_url: sub.get_one::<String>("base_url").cloned(),
                    model_name: sub.get_one::<String>("model").cloned(),
                    api_key: sub.get_one::<String>("api_key").cloned(),
                })
                .map_err(|e| anyhow!(e.user_message()))?;
            println!(
                "Added LLM configuration #{} '{}' ({} @ {})",
                cfg.id, cfg.name, cfg.model_name, cfg.base_url
            );
        }
        Some(("list", sub)) => {
            let configs = store.list()?;
            let active = store.active()?.map(|c| c.id);
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &configs)? {
                let mut data = Vec::new();
                for c in &configs {
                    let has_key = store.api_key(c.id)?.is_some();
                    data.push(vec![
                        (if active == Some(c.id) { "*" } else { "" }).to_string(),
                        c.id.to_string(),
                        c.name.clone(),
                        c.provider.to_string(),
                        c.model_name.clone(),
                        c.base_url.clone(),
                        (if has_key { "yes" } else { "no" }).to_string(),
                    ]);
                }
                println!(
                    "{}",
                    pretty_table(
                        &["", "ID", "Name", "Provider", "Model", "Base URL", "Key"],
                        data
                    )
                );
            }
        }
        Some(("use", sub)) => {
            let id = required_id(sub)?;
            store.set_active(id)?;
            println!("Active LLM configuration is now #{}", id);
        }
        Some(("set-key", sub)) => {
            let id = required_id(sub)?;
            if store.get(id)?.is_none() {
                return Err(anyhow!("No LLM configuration #{}", id));
            }
            store.set_api_key(id, required_arg(sub, "api_key")?)?;
            println!("Stored API key for #{}", id);
        }
        Some(("rm", sub)) => {
            let id = required_id(sub)?;
            if store.remove(id)? {
                println!("Removed LLM configuration #{}", id);
            } else {
                println!("No LLM configuration #{}", id);
            }
        }
        Some(("test", sub)) => {
            let cfg = match sub.get_one::<i64>("id") {
                Some(id) => store.get(*id)?,
                None => store.active()?,
            }
            .ok_or_else(|| anyhow!("No LLM configuration to test"))?;
            let probe = store
                .endpoint_for(&cfg, env_api_key())
                .and_then(|ep| Ok(ChatClient::new(ep)?))
                .and_then(|client| Ok(client.probe()?));
            match probe {
                Ok(reply) => println!("OK: {} answered '{}'", cfg.name, reply.trim()),
                Err(e) => println!("FAILED: {}", e.user_message()),
            }
        }
        _ => {}
    }
    Ok(())
}
