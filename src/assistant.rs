// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Natural-language front end over the ledger.
//!
//! ```text
//! question ─► intent prompt ─► LLM #1 ─► QueryIntent ─┬─ chat ──────────────► reply
//!                                                     └─ execute ─┬─ 0 rows ─► canned reply
//!                                                                 └─ LLM #2 ─► phrased answer
//!
//! statement ─► split ─► extraction prompt ─► LLM ─► draft ─► resolve ─► insert (one commit)
//! ```

use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::Connection;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::error::{AssistantError, StoreError};
use crate::ledger::{self, Inserted};
use crate::llm::client::{Completion, CompletionOptions};
use crate::llm::intent::{
    QueryIntent, QueryOperation, TransactionDraft, decode_date, parse_query_intent,
    parse_transaction_extraction, parse_voice_transaction,
};
use crate::llm::prompts::{
    self, OTHER_CATEGORY_NAMES, PromptContext, PromptKind, default_account,
    final_answer_user_prompt,
};
use crate::models::NewTransaction;
use crate::query::{self, QueryResult};
use crate::utils::match_name;

pub const NO_MATCH_MESSAGE: &str = "I couldn't find any matching records.";

static SEGMENT_SPLIT: Lazy<Result<Regex, regex::Error>> = Lazy::new(|| {
    Regex::new(r"(?i)[。！？；;!?\n]+|然后|还有|另外|以及|\band then\b|\balso\b|\bplus\b")
});

const CURRENCY_WORDS: [&str; 11] = [
    "元", "块", "毛", "角", "¥", "￥", "$", "yuan", "rmb", "dollar", "buck",
];

/// Payment-method keyword groups; the first group found in the text whose
/// keywords also appear in an account name picks that account.
const PAYMENT_KEYWORDS: [&[&str]; 6] = [
    &["花呗", "huabei"],
    &["微信", "wechat", "weixin"],
    &["支付宝", "alipay"],
    &["信用卡", "credit"],
    &["银行卡", "储蓄卡", "借记卡", "debit", "bank"],
    &["现金", "cash"],
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputSource {
    Typed,
    /// Transcript from an external speech engine.
    Voice,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerKind {
    Chat,
    NoData,
    Phrased,
}

#[derive(Debug, Clone)]
pub struct Answer {
    pub text: String,
    pub kind: AnswerKind,
    pub intent: QueryIntent,
    pub data: Option<QueryResult>,
}

#[derive(Debug)]
pub struct SegmentOutcome {
    pub segment: String,
    pub result: Result<Inserted, AssistantError>,
}

fn unique_names(names: impl Iterator<Item = String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for n in names {
        if !out.contains(&n) {
            out.push(n);
        }
    }
    out
}

/// Current category (picker order) and account names.
pub fn prompt_context(conn: &Connection, now: NaiveDateTime) -> Result<PromptContext, StoreError> {
    let categories = unique_names(
        ledger::list_categories(conn, None)?
            .into_iter()
            .map(|c| c.name),
    );
    let accounts = unique_names(ledger::list_accounts(conn)?.into_iter().map(|a| a.name));
    Ok(PromptContext {
        now,
        categories,
        accounts,
    })
}

/// Model's pick when it names a real category, else "Other", else the first one.
pub fn resolve_category(wanted: Option<&str>, categories: &[String]) -> Option<String> {
    if let Some(hit) = wanted.and_then(|w| match_name(w, categories)) {
        return Some(hit.to_string());
    }
    OTHER_CATEGORY_NAMES
        .iter()
        .find(|o| categories.iter().any(|c| c == *o))
        .map(|o| o.to_string())
        .or_else(|| categories.first().cloned())
}

fn account_from_keywords(text: &str, accounts: &[String]) -> Option<String> {
    let text = text.to_lowercase();
    for group in PAYMENT_KEYWORDS {
        if !group.iter().any(|k| text.contains(k)) {
            continue;
        }
        let hit = accounts.iter().find(|a| {
            let a = a.to_lowercase();
            group.iter().any(|k| a.contains(k))
        });
        if let Some(a) = hit {
            return Some(a.clone());
        }
    }
    None
}

/// Model's pick, then payment keywords in the raw text, then the cash
/// account, then the first account.
pub fn resolve_account(wanted: Option<&str>, raw_text: &str, accounts: &[String]) -> Option<String> {
    if let Some(hit) = wanted.and_then(|w| match_name(w, accounts)) {
        return Some(hit.to_string());
    }
    account_from_keywords(raw_text, accounts)
        .or_else(|| default_account(accounts).map(str::to_string))
}

fn looks_like_transaction(segment: &str) -> bool {
    let lower = segment.to_lowercase();
    lower.chars().any(|c| c.is_ascii_digit()) || CURRENCY_WORDS.iter().any(|w| lower.contains(w))
}

/// Best-effort split of an utterance into transaction-like pieces.
///
/// Splits on sentence-final punctuation, newlines and connector words, and
/// keeps pieces with a digit or a currency word. Commas are not split points,
/// so "午饭50，晚饭30" stays one piece; a date said once for several pieces
/// only reaches the first one.
pub fn split_segments(text: &str) -> Vec<String> {
    let pieces: Vec<&str> = match SEGMENT_SPLIT.as_ref() {
        Ok(re) => re.split(text).collect(),
        Err(_) => vec![text],
    };
    pieces
        .into_iter()
        .map(|p| p.trim().trim_matches([',', '，', '、']).trim())
        .filter(|p| !p.is_empty() && looks_like_transaction(p))
        .map(str::to_string)
        .collect()
}

pub struct Assistant<'a> {
    llm: &'a dyn Completion,
}

impl<'a> Assistant<'a> {
    pub fn new(llm: &'a dyn Completion) -> Self {
        Self { llm }
    }

    /// First round trip of the query flow.
    pub fn interpret(
        &self,
        ctx: &PromptContext,
        question: &str,
    ) -> Result<QueryIntent, AssistantError> {
        let system = prompts::render(PromptKind::QueryIntent, ctx);
        let content = self
            .llm
            .complete(&system, question, &CompletionOptions::intent())?;
        let intent = parse_query_intent(&content, ctx.now)?;
        debug!(?intent, "query intent decoded");
        Ok(intent)
    }

    /// Answers a question about the ledger with at most two model calls.
    pub fn ask(
        &self,
        conn: &Connection,
        question: &str,
        now: NaiveDateTime,
    ) -> Result<Answer, AssistantError> {
        let ctx = prompt_context(conn, now)?;
        let intent = self.interpret(&ctx, question)?;
        let result = query::execute(conn, &intent)?;

        if intent.operation == QueryOperation::Chat {
            return Ok(Answer {
                text: result.text,
                kind: AnswerKind::Chat,
                intent,
                data: None,
            });
        }
        if result.record_count == 0 {
            info!(filters = %result.filter_summary(), "no matching records, skipping answer call");
            return Ok(Answer {
                text: NO_MATCH_MESSAGE.to_string(),
                kind: AnswerKind::NoData,
                intent,
                data: Some(result),
            });
        }

        let system = prompts::render(PromptKind::FinalAnswer, &ctx);
        let phrased = self.llm.complete(
            &system,
            &final_answer_user_prompt(question, &result.text),
            &CompletionOptions::answer(),
        )?;
        let text = if phrased.trim().is_empty() {
            result.text.clone()
        } else {
            phrased
        };
        Ok(Answer {
            text,
            kind: AnswerKind::Phrased,
            intent,
            data: Some(result),
        })
    }

    /// Asks the model for a transaction draft without touching the store.
    pub fn extract(
        &self,
        ctx: &PromptContext,
        text: &str,
        source: InputSource,
    ) -> Result<TransactionDraft, AssistantError> {
        let (kind, options) = match source {
            InputSource::Typed => (PromptKind::TransactionParsing, CompletionOptions::extraction()),
            InputSource::Voice => (PromptKind::VoiceParsing, CompletionOptions::voice()),
        };
        let system = prompts::render(kind, ctx);
        let content = self.llm.complete(&system, text, &options)?;
        let draft = match source {
            InputSource::Typed => parse_transaction_extraction(&content),
            InputSource::Voice => parse_voice_transaction(&content),
        }?;
        debug!(?draft, "transaction draft decoded");
        Ok(draft)
    }

    /// Records one transaction described in natural language.
    pub fn record(
        &self,
        conn: &mut Connection,
        text: &str,
        now: NaiveDateTime,
        source: InputSource,
    ) -> Result<Inserted, AssistantError> {
        let ctx = prompt_context(conn, now)?;
        if ctx.categories.is_empty() {
            return Err(AssistantError::NoCategory);
        }
        let draft = self.extract(&ctx, text, source)?;

        let amount = draft
            .amount
            .filter(|a| *a > Decimal::ZERO)
            .ok_or(AssistantError::MissingAmount)?;
        let category_name = resolve_category(draft.category_name.as_deref(), &ctx.categories)
            .ok_or(AssistantError::NoCategory)?;
        let account_name = resolve_account(draft.account_name.as_deref(), text, &ctx.accounts);
        // a decoded "today" keeps the current time of day
        let date = match draft.date.as_deref().and_then(|d| decode_date(d, now)) {
            Some(d) if d.date() != now.date() => d,
            _ => now,
        };

        let new = NewTransaction {
            amount,
            title: draft.note.unwrap_or_default(),
            date,
            category_name,
            account_name,
        };
        Ok(ledger::insert_transaction(conn, &new)?)
    }

    /// Records every transaction-like segment independently.
    pub fn record_batch(
        &self,
        conn: &mut Connection,
        text: &str,
        now: NaiveDateTime,
        source: InputSource,
    ) -> Vec<SegmentOutcome> {
        let mut segments = split_segments(text);
        if segments.is_empty() && !text.trim().is_empty() {
            segments.push(text.trim().to_string());
        }
        segments
            .into_iter()
            .map(|segment| {
                let result = self.record(conn, &segment, now, source);
                if let Err(e) = &result {
                    warn!(segment = %segment, error = %e, "segment not recorded");
                }
                SegmentOutcome { segment, result }
            })
            .collect()
    }
}
