// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger::{self, TransactionFilter};
use crate::utils::{fmt_money, required_arg};
use anyhow::{Context, Result};
use rusqlite::Connection;
use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Spreadsheet apps need the BOM to detect UTF-8.
pub const UTF8_BOM: &str = "\u{FEFF}";
pub const CSV_HEADER: [&str; 7] = ["Date", "Time", "Type", "Amount", "Category", "Account", "Note"];

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("transactions", sub)) => {
            let out = required_arg(sub, "out")?;
            let n = export_transactions(conn, Path::new(out))?;
            println!("Exported {} transactions to {}", n, out);
            Ok(())
        }
        _ => Ok(()),
    }
}

/// Writes every transaction, oldest first; returns the row count.
pub fn export_transactions(conn: &Connection, out: &Path) -> Result<usize> {
    let mut rows = ledger::fetch_transactions(conn, &TransactionFilter::default())?;
    rows.reverse();

    let mut file =
        File::create(out).with_context(|| format!("Create {}", out.display()))?;
    file.write_all(UTF8_BOM.as_bytes())?;
    let mut wtr = csv::Writer::from_writer(file);
    wtr.write_record(CSV_HEADER)?;

    let mut kinds = HashMap::new();
    for t in &rows {
        let kind = match kinds.get(&t.category_name) {
            Some(k) => *k,
            None => {
                let k = ledger::effective_kind(conn, &t.category_name)?;
                kinds.insert(t.category_name.clone(), k);
                k
            }
        };
        wtr.write_record([
            t.date.format("%Y-%m-%d").to_string(),
            t.date.format("%H:%M").to_string(),
            kind.to_string(),
            fmt_money(&t.amount),
            t.category_name.clone(),
            t.account_name.clone().unwrap_or_default(),
            t.title.clone(),
        ])?;
    }
    wtr.flush()?;
    Ok(rows.len())
}
