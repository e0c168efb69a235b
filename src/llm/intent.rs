// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Typed intents decoded from cleaned model output.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::LlmError;
use crate::models::CategoryKind;
use crate::utils::start_of_day;

static RELATIVE_DAYS: Lazy<Result<Regex, regex::Error>> =
    Lazy::new(|| Regex::new(r"^([+-]?)(\d+)d$"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryOperation {
    Sum,
    List,
    Count,
    Chat,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryIntent {
    pub operation: QueryOperation,
    pub start_date: Option<NaiveDateTime>,
    pub end_date: Option<NaiveDateTime>,
    pub category_name: Option<String>,
    pub account_name: Option<String>,
    pub kind: Option<CategoryKind>,
    pub chat_response: Option<String>,
}

impl QueryIntent {
    pub fn chat(reply: impl Into<String>) -> Self {
        Self {
            operation: QueryOperation::Chat,
            start_date: None,
            end_date: None,
            category_name: None,
            account_name: None,
            kind: None,
            chat_response: Some(reply.into()),
        }
    }
}

/// A transaction the model pulled out of free text, dates still raw.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TransactionDraft {
    pub amount: Option<Decimal>,
    pub category_name: Option<String>,
    pub account_name: Option<String>,
    pub note: Option<String>,
    pub date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawQueryIntent {
    operation: QueryOperation,
    #[serde(default)]
    start_date: Option<Value>,
    #[serde(default)]
    end_date: Option<Value>,
    #[serde(default)]
    category_name: Option<String>,
    #[serde(default)]
    account_name: Option<String>,
    #[serde(default)]
    kind: Option<String>,
    #[serde(default)]
    chat_response: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawExtraction {
    #[serde(default, deserialize_with = "lenient_amount")]
    amount: Option<Decimal>,
    #[serde(default)]
    category_name: Option<String>,
    #[serde(default)]
    account_name: Option<String>,
    #[serde(default)]
    note: Option<String>,
    #[serde(default)]
    date: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct RawVoice {
    #[serde(default, deserialize_with = "lenient_amount")]
    amount: Option<Decimal>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    account: Option<String>,
    #[serde(default)]
    note: Option<String>,
    #[serde(default)]
    date: Option<Value>,
}

/// Numbers or numeric strings; anything else is treated as absent.
fn lenient_amount<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<Value>::deserialize(deserializer)?;
    Ok(v.and_then(|v| match v {
        Value::Number(n) => n
            .as_f64()
            .and_then(Decimal::from_f64_retain)
            .map(|d| d.round_dp(2)),
        Value::String(s) => s
            .trim()
            .trim_start_matches(['¥', '$', '￥'])
            .replace(',', "")
            .parse::<Decimal>()
            .ok(),
        _ => None,
    }))
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty() && s != "null")
}

fn raw_date(v: Option<Value>) -> Option<String> {
    match v {
        Some(Value::String(s)) => non_empty(Some(s)),
        _ => None,
    }
}

/// Three-tier decode: relative offset, keyword, ISO-8601. Always lands on a
/// start of day; unrecognised input is `None`.
pub fn decode_date(raw: &str, now: NaiveDateTime) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    let lowered = s.to_lowercase();
    if let Ok(re) = RELATIVE_DAYS.as_ref() {
        if let Some(caps) = re.captures(&lowered) {
            let days: i64 = caps[2].parse().ok()?;
            // an unsigned "7d" reads as seven days ago
            let offset = if &caps[1] == "+" { days } else { -days };
            // offsets past the calendar's range decode to nothing
            let delta = Duration::try_days(offset)?;
            return now.date().checked_add_signed(delta).map(start_of_day);
        }
    }

    match lowered.as_str() {
        "today" | "今天" | "今日" | "now" => return Some(start_of_day(now.date())),
        "yesterday" | "昨天" | "昨日" => return now.date().pred_opt().map(start_of_day),
        _ => {}
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(start_of_day(dt.naive_local().date()));
    }
    for fmt in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(start_of_day(dt.date()));
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .map(start_of_day)
}

fn decode<'a, T: Deserialize<'a>>(json: &'a str, what: &str) -> Result<T, LlmError> {
    serde_json::from_str(json).map_err(|e| LlmError::Decoding(format!("{}: {}", what, e)))
}

pub fn parse_query_intent(json: &str, now: NaiveDateTime) -> Result<QueryIntent, LlmError> {
    let raw: RawQueryIntent = decode(json, "query intent")?;
    let decode_opt = |v: Option<Value>| raw_date(v).and_then(|s| decode_date(&s, now));
    Ok(QueryIntent {
        operation: raw.operation,
        start_date: decode_opt(raw.start_date),
        end_date: decode_opt(raw.end_date),
        category_name: non_empty(raw.category_name),
        account_name: non_empty(raw.account_name),
        // "both" or anything unexpected means no kind filter
        kind: non_empty(raw.kind).and_then(|k| k.parse::<CategoryKind>().ok()),
        chat_response: raw.chat_response,
    })
}

pub fn parse_transaction_extraction(json: &str) -> Result<TransactionDraft, LlmError> {
    let raw: RawExtraction = decode(json, "transaction extraction")?;
    Ok(TransactionDraft {
        amount: raw.amount,
        category_name: non_empty(raw.category_name),
        account_name: non_empty(raw.account_name),
        note: non_empty(raw.note),
        date: raw_date(raw.date),
    })
}

pub fn parse_voice_transaction(json: &str) -> Result<TransactionDraft, LlmError> {
    let raw: RawVoice = decode(json, "voice transaction")?;
    Ok(TransactionDraft {
        amount: raw.amount,
        category_name: non_empty(raw.category),
        account_name: non_empty(raw.account),
        note: non_empty(raw.note),
        date: raw_date(raw.date),
    })
}
