// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger;
use crate::models::AccountKind;
use crate::utils::{fmt_money, maybe_print_json, parse_decimal, pretty_table, required_arg};
use anyhow::{Result, anyhow};
use chrono::Local;
use rusqlite::Connection;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = required_arg(sub, "name")?.trim();
            let kind: AccountKind = required_arg(sub, "type")?
                .parse()
                .map_err(|e: String| anyhow!(e))?;
            let balance = parse_decimal(required_arg(sub, "balance")?)?;
            let color = sub.get_one::<String>("color").map(|s| s.as_str()).unwrap_or("");
            let icon = sub.get_one::<String>("icon").map(|s| s.as_str()).unwrap_or("");
            ledger::add_account(conn, name, kind, balance, color, icon)?;
            println!("Added account '{}' ({}, balance {})", name, kind, fmt_money(&balance));
        }
        Some(("list", sub)) => {
            let accounts = ledger::list_accounts(conn)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &accounts)? {
                let data = accounts
                    .iter()
                    .map(|a| vec![a.name.clone(), a.kind.to_string(), fmt_money(&a.balance)])
                    .collect();
                println!("{}", pretty_table(&["Name", "Type", "Balance"], data));
            }
        }
        Some(("rm", sub)) => {
            let name = required_arg(sub, "name")?;
            if ledger::remove_account(conn, name)? {
                println!("Removed account '{}'", name);
            } else {
                println!("No account named '{}'", name);
            }
        }
        Some(("set-balance", sub)) => {
            let name = required_arg(sub, "name")?;
            let balance = parse_decimal(required_arg(sub, "balance")?)?;
            let now = Local::now().naive_local();
            match ledger::set_account_balance(conn, name, balance, now)? {
                Some(adj) => println!(
                    "Balance of '{}' set to {} (adjustment #{}: {})",
                    name,
                    fmt_money(&balance),
                    adj.id,
                    adj.title
                ),
                None => println!("Balance of '{}' already {}", name, fmt_money(&balance)),
            }
        }
        _ => {}
    }
    Ok(())
}
