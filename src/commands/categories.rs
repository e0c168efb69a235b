// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger;
use crate::models::CategoryKind;
use crate::utils::{maybe_print_json, pretty_table, required_arg};
use anyhow::{Result, anyhow};
use rusqlite::Connection;

fn parse_kind(raw: &str) -> Result<CategoryKind> {
    raw.parse().map_err(|e: String| anyhow!(e))
}

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = required_arg(sub, "name")?.trim();
            let kind = parse_kind(required_arg(sub, "type")?)?;
            let symbol = sub.get_one::<String>("symbol").map(|s| s.as_str()).unwrap_or("");
            let color = sub.get_one::<String>("color").map(|s| s.as_str()).unwrap_or("");
            ledger::add_category(conn, name, kind, symbol, color)?;
            println!("Added {} category '{}'", kind, name);
        }
        Some(("list", sub)) => {
            let kind = sub.get_one::<String>("type").map(|s| parse_kind(s)).transpose()?;
            let categories = ledger::list_categories(conn, kind)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &categories)? {
                let data = categories
                    .iter()
                    .map(|c| {
                        vec![
                            c.name.clone(),
                            c.kind.to_string(),
                            c.usage_count.to_string(),
                        ]
                    })
                    .collect();
                println!("{}", pretty_table(&["Category", "Type", "Used"], data));
            }
        }
        Some(("rm", sub)) => {
            let name = required_arg(sub, "name")?;
            if ledger::remove_category(conn, name)? {
                println!("Removed category '{}'", name);
            } else {
                println!("No category named '{}'", name);
            }
        }
        _ => {}
    }
    Ok(())
}
