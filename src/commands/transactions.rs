// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger::{self, TransactionFilter};
use crate::models::{NewTransaction, Transaction};
use crate::utils::{
    fmt_money, maybe_print_json, parse_date, parse_decimal, pretty_table, required_arg,
};
use anyhow::{Result, bail};
use chrono::{Duration, Local};
use rusqlite::Connection;
use serde::Serialize;
use tracing::warn;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("rm", sub)) => {
            let id = *sub
                .get_one::<i64>("id")
                .ok_or_else(|| anyhow::anyhow!("Missing required argument 'id'"))?;
            let removed = ledger::delete_transaction(conn, id)?;
            println!(
                "Deleted #{} {} {} ({})",
                removed.id,
                fmt_money(&removed.amount),
                removed.title,
                removed.category_name
            );
        }
        _ => {}
    }
    Ok(())
}

fn add(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let amount = parse_decimal(required_arg(sub, "amount")?)?;
    let category = required_arg(sub, "category")?.trim().to_string();
    let date = match sub.get_one::<String>("date") {
        Some(d) => parse_date(d)?,
        None => Local::now().naive_local(),
    };
    let account_name = match sub.get_one::<String>("account") {
        Some(name) => match ledger::find_account(conn, name.trim())? {
            Some(a) => Some(a.name),
            None => bail!("Account '{}' not found", name),
        },
        None => None,
    };
    if ledger::category_kind(conn, &category)?.is_none() {
        warn!(category = %category, "unknown category, recording as expense");
    }

    let inserted = ledger::insert_transaction(
        conn,
        &NewTransaction {
            amount,
            title: sub.get_one::<String>("title").cloned().unwrap_or_default(),
            date,
            category_name: category,
            account_name,
        },
    )?;
    let t = &inserted.transaction;
    println!(
        "Recorded #{} {} {} '{}' on {}",
        t.id,
        inserted.kind,
        fmt_money(&t.amount),
        t.title,
        t.date.format("%Y-%m-%d %H:%M")
    );
    if let (Some(acct), Some(bal)) = (&t.account_name, inserted.account_balance) {
        println!("{} balance: {}", acct, fmt_money(&bal));
    }
    Ok(())
}

#[derive(Serialize)]
pub struct TransactionRow {
    pub id: i64,
    pub date: String,
    pub title: String,
    pub amount: String,
    pub category: String,
    pub account: String,
}

impl From<&Transaction> for TransactionRow {
    fn from(t: &Transaction) -> Self {
        Self {
            id: t.id,
            date: t.date.format("%Y-%m-%d %H:%M").to_string(),
            title: t.title.clone(),
            amount: fmt_money(&t.amount),
            category: t.category_name.clone(),
            account: t.account_name.clone().unwrap_or_default(),
        }
    }
}

/// Rows for `tx list`; `--to` is an inclusive day.
pub fn query_rows(conn: &Connection, sub: &clap::ArgMatches) -> Result<Vec<TransactionRow>> {
    let filter = TransactionFilter {
        start: sub.get_one::<String>("from").map(|s| parse_date(s)).transpose()?,
        end: sub
            .get_one::<String>("to")
            .map(|s| parse_date(s).map(|d| d + Duration::days(1)))
            .transpose()?,
        category_name: sub.get_one::<String>("category").cloned(),
        account_name: sub.get_one::<String>("account").cloned(),
        kind: None,
    };
    let mut rows = ledger::fetch_transactions(conn, &filter)?;
    if let Some(limit) = sub.get_one::<usize>("limit") {
        rows.truncate(*limit);
    }
    Ok(rows.iter().map(TransactionRow::from).collect())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let data = query_rows(conn, sub)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|r| {
                vec![
                    r.id.to_string(),
                    r.date.clone(),
                    r.title.clone(),
                    r.amount.clone(),
                    r.category.clone(),
                    r.account.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["ID", "Date", "Title", "Amount", "Category", "Account"], rows)
        );
    }
    Ok(())
}
