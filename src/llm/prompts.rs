// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! System prompt templates.
//!
//! Rendering is pure: the same `now` and name lists always produce the same
//! string, which keeps the prompts testable with a frozen clock.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};

use crate::utils::{fmt_datetime, start_of_day};

pub const OTHER_CATEGORY_NAMES: [&str; 2] = ["其他", "Other"];
pub const CASH_ACCOUNT_NAMES: [&str; 2] = ["现金", "Cash"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    TransactionParsing,
    VoiceParsing,
    QueryIntent,
    FinalAnswer,
}

#[derive(Debug, Clone)]
pub struct PromptContext {
    pub now: NaiveDateTime,
    pub categories: Vec<String>,
    pub accounts: Vec<String>,
}

/// Calendar anchors relative to `now`, already formatted for interpolation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateAnchors {
    pub now: String,
    pub today_start: String,
    pub yesterday_start: String,
    pub yesterday_end: String,
    pub week_start: String,
    pub month_start: String,
    pub last_month_start: String,
    pub last_month_end: String,
    pub last_7_days_start: String,
}

fn end_of_day(d: NaiveDate) -> NaiveDateTime {
    start_of_day(d) + Duration::days(1) - Duration::seconds(1)
}

impl DateAnchors {
    pub fn new(now: NaiveDateTime) -> Self {
        let today = now.date();
        let yesterday = today - Duration::days(1);
        let week_start = today - Duration::days(today.weekday().num_days_from_monday() as i64);
        let month_start = today.with_day(1).unwrap_or(today);
        let last_month_end = month_start - Duration::days(1);
        let last_month_start = last_month_end.with_day(1).unwrap_or(last_month_end);
        Self {
            now: fmt_datetime(&now),
            today_start: fmt_datetime(&start_of_day(today)),
            yesterday_start: fmt_datetime(&start_of_day(yesterday)),
            yesterday_end: fmt_datetime(&end_of_day(yesterday)),
            week_start: fmt_datetime(&start_of_day(week_start)),
            month_start: fmt_datetime(&start_of_day(month_start)),
            last_month_start: fmt_datetime(&start_of_day(last_month_start)),
            last_month_end: fmt_datetime(&end_of_day(last_month_end)),
            last_7_days_start: fmt_datetime(&start_of_day(today - Duration::days(7))),
        }
    }
}

fn join_names(names: &[String]) -> String {
    if names.is_empty() {
        "(none)".to_string()
    } else {
        names.join(", ")
    }
}

fn other_category(ctx: &PromptContext) -> Option<&str> {
    OTHER_CATEGORY_NAMES
        .iter()
        .find(|o| ctx.categories.iter().any(|c| c == *o))
        .copied()
}

/// "Cash"/"现金" when present, else the first account.
pub fn default_account(accounts: &[String]) -> Option<&str> {
    CASH_ACCOUNT_NAMES
        .iter()
        .find(|c| accounts.iter().any(|a| a == *c))
        .copied()
        .or_else(|| accounts.first().map(|s| s.as_str()))
}

fn category_fallback_rule(ctx: &PromptContext) -> String {
    match other_category(ctx) {
        Some(other) => format!("If no category fits, use \"{}\".", other),
        None => "If no category fits, return null for the category.".to_string(),
    }
}

fn account_fallback_rule(ctx: &PromptContext) -> String {
    match default_account(&ctx.accounts) {
        Some(acct) => format!(
            "If no payment method is mentioned, use \"{}\".",
            acct
        ),
        None => "If no payment method is mentioned, return null for the account.".to_string(),
    }
}

pub fn render(kind: PromptKind, ctx: &PromptContext) -> String {
    match kind {
        PromptKind::TransactionParsing => transaction_prompt(ctx),
        PromptKind::VoiceParsing => voice_prompt(ctx),
        PromptKind::QueryIntent => query_intent_prompt(ctx),
        PromptKind::FinalAnswer => final_answer_prompt(ctx),
    }
}

fn transaction_prompt(ctx: &PromptContext) -> String {
    let a = DateAnchors::new(ctx.now);
    format!(
        r#"You are a bookkeeping assistant. Extract ONE transaction from the user's message.

Current time: {now}
Today starts at: {today}
Yesterday: {yesterday}

Available categories: {categories}
Available accounts: {accounts}

Return ONLY a JSON object, no markdown, no explanation:
{{"amount": number, "category_name": string or null, "account_name": string or null, "note": string or null, "date": string or null}}

Rules:
- "amount" is a positive number. If the message contains no amount, return null for "amount".
- "category_name" MUST be copied exactly from the available categories. {category_rule}
- "account_name" MUST be copied exactly from the available accounts. {account_rule}
- "note" is a short memo in the user's language describing what was bought or received.
- "date": use "today" for today, "-Nd" for N days ago (yesterday is "-1d"), or an ISO-8601 date like {today_date}. Use null when no date is mentioned."#,
        now = a.now,
        today = a.today_start,
        yesterday = a.yesterday_start,
        categories = join_names(&ctx.categories),
        accounts = join_names(&ctx.accounts),
        category_rule = category_fallback_rule(ctx),
        account_rule = account_fallback_rule(ctx),
        today_date = &a.today_start[..10],
    )
}

fn voice_prompt(ctx: &PromptContext) -> String {
    let a = DateAnchors::new(ctx.now);
    format!(
        r#"You turn a speech-recognition transcript into ONE bookkeeping record.
The transcript may contain recognition errors, homophones and filler words; infer the intended meaning.
Spoken numbers (for example "五十块", "fifty bucks") are amounts.

Current time: {now}
Today starts at: {today}
Yesterday: {yesterday} to {yesterday_end}

Available categories: {categories}
Available accounts: {accounts}

Return ONLY a JSON object:
{{"amount": number, "category": string or null, "account": string or null, "note": string or null, "date": string or null}}

Rules:
- "amount" must be positive; return null when no amount was spoken.
- "category" must be one of the available categories. {category_rule}
- "account" must be one of the available accounts. {account_rule}
- "date": "today", "-Nd" for N days ago, or an ISO-8601 date. null when not mentioned."#,
        now = a.now,
        today = a.today_start,
        yesterday = a.yesterday_start,
        yesterday_end = a.yesterday_end,
        categories = join_names(&ctx.categories),
        accounts = join_names(&ctx.accounts),
        category_rule = category_fallback_rule(ctx),
        account_rule = account_fallback_rule(ctx),
    )
}

fn query_intent_prompt(ctx: &PromptContext) -> String {
    let a = DateAnchors::new(ctx.now);
    format!(
        r#"You translate questions about a personal ledger into a query. You never answer the question yourself.

Current time: {now}
Date anchors:
- today: {today} to {now}
- yesterday: {yesterday} to {yesterday_end}
- this week (starts Monday): {week} to {now}
- this month: {month} to {now}
- last month: {last_month_start} to {last_month_end}
- last 7 days: {last7} to {now}

Available categories: {categories}
Available accounts: {accounts}

Return ONLY a JSON object:
{{"operation": "sum" | "list" | "count" | "chat", "start_date": string or null, "end_date": string or null, "category_name": string or null, "account_name": string or null, "kind": "expense" | "income" | null, "chat_response": string or null}}

Rules:
- "sum" for totals, "list" to show records, "count" for how many records.
- "chat" when the message is not about the ledger (greetings, small talk); put a short friendly reply in "chat_response".
- Dates are ISO-8601 (use the anchors above), "today", or "-Nd" for N days ago. Use null for an open bound.
- "category_name" and "account_name" must be copied exactly from the lists above, or null.
- "kind" is "expense" for spending questions, "income" for earnings questions, null when both count."#,
        now = a.now,
        today = a.today_start,
        yesterday = a.yesterday_start,
        yesterday_end = a.yesterday_end,
        week = a.week_start,
        month = a.month_start,
        last_month_start = a.last_month_start,
        last_month_end = a.last_month_end,
        last7 = a.last_7_days_start,
        categories = join_names(&ctx.categories),
        accounts = join_names(&ctx.accounts),
    )
}

fn final_answer_prompt(ctx: &PromptContext) -> String {
    let a = DateAnchors::new(ctx.now);
    format!(
        r#"You are a friendly personal finance assistant. Current time: {now}.
Answer the user's question using ONLY the query result provided.
Never invent amounts, dates or records that are not in the result.
Keep the answer short (one to three sentences), answer in the language of the question, and format money with two decimals."#,
        now = a.now,
    )
}

/// User half of the final-answer call.
pub fn final_answer_user_prompt(question: &str, data_result: &str) -> String {
    format!(
        "Question: {}\n\nQuery result:\n{}",
        question.trim(),
        data_result.trim()
    )
}
