// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Runs a decoded query intent against the ledger and renders the compact
//! text block handed to the answer-phrasing call.

use chrono::Duration;
use rusqlite::Connection;
use rust_decimal::Decimal;
use std::fmt;
use tracing::debug;

use crate::error::StoreError;
use crate::ledger::{TransactionFilter, fetch_transactions};
use crate::llm::intent::{QueryIntent, QueryOperation};
use crate::models::Transaction;
use crate::utils::fmt_datetime;

pub const LIST_LIMIT: usize = 20;
pub const DEFAULT_GREETING: &str =
    "Hi! Ask me about your spending, or tell me what you bought and I'll record it.";
pub const NO_RECORDS: &str = "No records found.";

#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    pub operation: QueryOperation,
    /// Matching rows before truncation; always 0 for chat.
    pub record_count: usize,
    pub text: String,
    /// Human-readable echo of the applied filters.
    pub filters: Vec<String>,
}

impl QueryResult {
    pub fn filter_summary(&self) -> String {
        if self.filters.is_empty() {
            "no filters".to_string()
        } else {
            self.filters.join(", ")
        }
    }
}

impl fmt::Display for QueryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// The end date is an inclusive calendar day.
pub fn filter_for(intent: &QueryIntent) -> TransactionFilter {
    TransactionFilter {
        start: intent.start_date,
        end: intent.end_date.map(|d| d + Duration::days(1)),
        category_name: intent.category_name.clone(),
        account_name: intent.account_name.clone(),
        kind: intent.kind,
    }
}

fn describe(intent: &QueryIntent) -> Vec<String> {
    let mut out = Vec::new();
    if let Some(s) = intent.start_date {
        out.push(format!("date >= {}", fmt_datetime(&s)));
    }
    if let Some(e) = intent.end_date {
        out.push(format!("date <= {} (whole day)", e.format("%Y-%m-%d")));
    }
    if let Some(c) = &intent.category_name {
        out.push(format!("category = {}", c));
    }
    if let Some(a) = &intent.account_name {
        out.push(format!("account = {}", a));
    }
    if let Some(k) = intent.kind {
        out.push(format!("type = {}", k));
    }
    out
}

pub fn format_sum(rows: &[Transaction]) -> String {
    let total: Decimal = rows.iter().map(|t| t.amount).sum();
    format!("Total: {:.2}\nRecords: {}", total.round_dp(2), rows.len())
}

pub fn format_count(n: usize) -> String {
    if n == 1 {
        "Found 1 record.".to_string()
    } else {
        format!("Found {} records.", n)
    }
}

/// CSV-like block of the newest [`LIST_LIMIT`] rows.
pub fn format_list(rows: &[Transaction]) -> String {
    if rows.is_empty() {
        return NO_RECORDS.to_string();
    }
    let mut out = String::from("Date,Name,Amount,Category,Account");
    for t in rows.iter().take(LIST_LIMIT) {
        out.push('\n');
        out.push_str(&format!(
            "{},{},{:.2},{},{}",
            t.date.format("%Y-%m-%d %H:%M"),
            t.title.replace(',', ";"),
            t.amount.round_dp(2),
            t.category_name.replace(',', ";"),
            t.account_name.as_deref().unwrap_or("").replace(',', ";"),
        ));
    }
    if rows.len() > LIST_LIMIT {
        out.push_str(&format!("\n… showing {} of {}", LIST_LIMIT, rows.len()));
    }
    out
}

fn chat_result(intent: &QueryIntent) -> QueryResult {
    let reply = intent
        .chat_response
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_GREETING);
    QueryResult {
        operation: QueryOperation::Chat,
        record_count: 0,
        text: reply.to_string(),
        filters: Vec::new(),
    }
}

/// Read-only; chat intents never touch the store.
pub fn execute(conn: &Connection, intent: &QueryIntent) -> Result<QueryResult, StoreError> {
    let render: fn(&[Transaction]) -> String = match intent.operation {
        QueryOperation::Chat => return Ok(chat_result(intent)),
        QueryOperation::Sum => format_sum,
        QueryOperation::List => format_list,
        QueryOperation::Count => |rows: &[Transaction]| format_count(rows.len()),
    };

    let filters = describe(intent);
    let rows = fetch_transactions(conn, &filter_for(intent))?;
    debug!(
        operation = ?intent.operation,
        filters = %filters.join(", "),
        matched = rows.len(),
        "query executed"
    );
    Ok(QueryResult {
        operation: intent.operation,
        record_count: rows.len(),
        text: render(&rows),
        filters,
    })
}
