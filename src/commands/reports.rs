// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger::{self, TransactionFilter};
use crate::models::{CategoryKind, Transaction};
use crate::utils::{fmt_money, maybe_print_json, parse_month, pretty_table, required_arg};
use anyhow::{Result, anyhow};
use chrono::Months;
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("summary", sub)) => summary(conn, sub)?,
        Some(("by-category", sub)) => by_category(conn, sub)?,
        _ => {}
    }
    Ok(())
}

#[derive(Debug, Serialize, PartialEq)]
pub struct MonthSummary {
    pub month: String,
    pub income: Decimal,
    pub expense: Decimal,
    pub net: Decimal,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct CategoryTotal {
    pub category: String,
    pub total: Decimal,
    pub records: usize,
}

/// Resolves each distinct category name once.
fn kinds_for(conn: &Connection, rows: &[Transaction]) -> Result<HashMap<String, CategoryKind>> {
    let mut kinds = HashMap::new();
    for t in rows {
        if !kinds.contains_key(&t.category_name) {
            let k = ledger::effective_kind(conn, &t.category_name)?;
            kinds.insert(t.category_name.clone(), k);
        }
    }
    Ok(kinds)
}

/// Income and expense per calendar month, newest `months` first.
pub fn monthly_summary(conn: &Connection, months: usize) -> Result<Vec<MonthSummary>> {
    let rows = ledger::fetch_transactions(conn, &TransactionFilter::default())?;
    let kinds = kinds_for(conn, &rows)?;
    let mut map: BTreeMap<String, (Decimal, Decimal)> = BTreeMap::new();
    for t in &rows {
        let entry = map
            .entry(t.date.format("%Y-%m").to_string())
            .or_insert((Decimal::ZERO, Decimal::ZERO));
        match kinds.get(&t.category_name) {
            Some(CategoryKind::Income) => entry.0 += t.amount,
            _ => entry.1 += t.amount,
        }
    }
    Ok(map
        .into_iter()
        .rev()
        .take(months)
        .map(|(month, (income, expense))| MonthSummary {
            month,
            income,
            expense,
            net: income - expense,
        })
        .collect())
}

/// Totals per category for one `YYYY-MM`, largest first.
pub fn category_totals(
    conn: &Connection,
    month: &str,
    kind: CategoryKind,
) -> Result<Vec<CategoryTotal>> {
    let start = parse_month(month)?;
    let end = start
        .checked_add_months(Months::new(1))
        .ok_or_else(|| anyhow!("Month '{}' out of range", month))?;
    let filter = TransactionFilter {
        start: Some(crate::utils::start_of_day(start)),
        end: Some(crate::utils::start_of_day(end)),
        kind: Some(kind),
        ..TransactionFilter::default()
    };
    let mut agg: HashMap<String, (Decimal, usize)> = HashMap::new();
    for t in ledger::fetch_transactions(conn, &filter)? {
        let e = agg.entry(t.category_name).or_insert((Decimal::ZERO, 0));
        e.0 += t.amount;
        e.1 += 1;
    }
    let mut items: Vec<CategoryTotal> = agg
        .into_iter()
        .map(|(category, (total, records))| CategoryTotal {
            category,
            total,
            records,
        })
        .collect();
    items.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.category.cmp(&b.category)));
    Ok(items)
}

fn summary(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let months: usize = *sub.get_one::<usize>("months").unwrap_or(&12);
    let data = monthly_summary(conn, months)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows = data
            .iter()
            .map(|s| {
                vec![
                    s.month.clone(),
                    fmt_money(&s.income),
                    fmt_money(&s.expense),
                    fmt_money(&s.net),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Month", "Income", "Expense", "Net"], rows)
        );
    }
    Ok(())
}

fn by_category(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let month = required_arg(sub, "month")?;
    let kind: CategoryKind = required_arg(sub, "type")?
        .parse()
        .map_err(|e: String| anyhow!(e))?;
    let data = category_totals(conn, month, kind)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows = data
            .iter()
            .map(|c| vec![c.category.clone(), fmt_money(&c.total), c.records.to_string()])
            .collect();
        println!("{}", pretty_table(&["Category", "Total", "Records"], rows));
    }
    Ok(())
}
