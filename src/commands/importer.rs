// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::exporter::UTF8_BOM;
use crate::ledger;
use crate::models::{CategoryKind, NewTransaction};
use crate::utils::{parse_date, parse_decimal, required_arg};
use anyhow::{Context, Result, bail};
use csv::ReaderBuilder;
use rusqlite::Connection;
use std::collections::HashSet;
use std::path::Path;
use tracing::info;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("transactions", sub)) => {
            let path = required_arg(sub, "path")?.trim();
            let n = import_transactions(conn, Path::new(path))?;
            println!("Imported {} transactions from {}", n, path);
            Ok(())
        }
        _ => Ok(()),
    }
}

fn parse_kind(raw: &str) -> Result<CategoryKind> {
    match raw.trim() {
        "支出" => Ok(CategoryKind::Expense),
        "收入" => Ok(CategoryKind::Income),
        other => other.parse().map_err(|e: String| anyhow::anyhow!(e)),
    }
}

/// Reads the export format back in a single commit; any bad row aborts the
/// whole import. Unknown categories are created with the row's type.
pub fn import_transactions(conn: &mut Connection, path: &Path) -> Result<usize> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Open CSV {}", path.display()))?;
    let body = raw.strip_prefix(UTF8_BOM).unwrap_or(&raw);
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .from_reader(body.as_bytes());

    let tx = conn.transaction()?;
    let mut known: HashSet<String> = ledger::list_categories(&tx, None)?
        .into_iter()
        .map(|c| c.name)
        .collect();
    let mut count = 0usize;

    for (i, result) in rdr.records().enumerate() {
        let line = i + 2;
        let rec = result?;
        let field = |idx: usize| rec.get(idx).unwrap_or("").trim();

        let date_raw = match field(1) {
            "" => field(0).to_string(),
            time => format!("{} {}", field(0), time),
        };
        let date = parse_date(&date_raw)
            .with_context(|| format!("line {}: invalid date '{}'", line, date_raw))?;
        let kind = parse_kind(field(2)).with_context(|| format!("line {}", line))?;
        let amount = parse_decimal(field(3)).with_context(|| format!("line {}", line))?;
        let category = field(4).to_string();
        if category.is_empty() {
            bail!("line {}: category missing", line);
        }
        let account = Some(field(5).to_string()).filter(|a| !a.is_empty());

        if known.insert(category.clone()) {
            ledger::add_category(&tx, &category, kind, "", "")?;
            info!(category = %category, %kind, "created category during import");
        }
        ledger::insert_within(
            &tx,
            &NewTransaction {
                amount,
                title: field(6).to_string(),
                date,
                category_name: category,
                account_name: account,
            },
        )
        .with_context(|| format!("line {}", line))?;
        count += 1;
    }
    tx.commit()?;
    Ok(count)
}
