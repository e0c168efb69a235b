// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

#![allow(dead_code)]

use chatledger::db;
use chatledger::error::LlmError;
use chatledger::ledger;
use chatledger::llm::client::{Completion, CompletionOptions};
use chatledger::models::{AccountKind, CategoryKind};
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::Connection;
use rust_decimal::Decimal;
use std::cell::RefCell;
use std::collections::VecDeque;

/// One recorded call to the scripted model.
#[derive(Debug, Clone)]
pub struct Call {
    pub system: String,
    pub user: String,
    pub temperature: f32,
    pub json_object: bool,
}

/// Replays canned replies in order and records every request.
#[derive(Default)]
pub struct ScriptedLlm {
    replies: RefCell<VecDeque<Result<String, LlmError>>>,
    pub calls: RefCell<Vec<Call>>,
}

impl ScriptedLlm {
    pub fn new(replies: &[&str]) -> Self {
        let s = Self::default();
        for r in replies {
            s.replies.borrow_mut().push_back(Ok(r.to_string()));
        }
        s
    }

    pub fn push_err(&self, e: LlmError) {
        self.replies.borrow_mut().push_back(Err(e));
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }

    pub fn call(&self, i: usize) -> Call {
        self.calls.borrow()[i].clone()
    }
}

impl Completion for ScriptedLlm {
    fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        options: &CompletionOptions,
    ) -> Result<String, LlmError> {
        self.calls.borrow_mut().push(Call {
            system: system_prompt.to_string(),
            user: user_prompt.to_string(),
            temperature: options.temperature,
            json_object: options.json_object,
        });
        self.replies
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::InvalidResponse("script exhausted".into())))
    }
}

pub fn dt(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").unwrap()
}

pub fn day(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

/// Saturday 2024-06-15 10:00.
pub fn frozen_now() -> NaiveDateTime {
    dt("2024-06-15T10:00:00")
}

/// Categories 餐饮 (expense), 其他 (expense), 工资 (income); account 现金 at 0.
pub fn small_ledger() -> Connection {
    let conn = db::open_in_memory().unwrap();
    ledger::add_category(&conn, "餐饮", CategoryKind::Expense, "fork.knife", "").unwrap();
    ledger::add_category(&conn, "其他", CategoryKind::Expense, "ellipsis", "").unwrap();
    ledger::add_category(&conn, "工资", CategoryKind::Income, "banknote", "").unwrap();
    ledger::add_account(&conn, "现金", AccountKind::Cash, Decimal::ZERO, "", "").unwrap();
    conn
}

pub fn balance_of(conn: &Connection, account: &str) -> Decimal {
    ledger::find_account(conn, account).unwrap().unwrap().balance
}

pub fn usage_of(conn: &Connection, category: &str) -> i64 {
    ledger::list_categories(conn, None)
        .unwrap()
        .into_iter()
        .find(|c| c.name == category)
        .unwrap()
        .usage_count
}
