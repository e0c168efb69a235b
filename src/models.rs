// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::llm::providers::ProviderType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryKind {
    Expense,
    Income,
}

impl CategoryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryKind::Expense => "expense",
            CategoryKind::Income => "income",
        }
    }

    /// Signed effect of `amount` on an account balance.
    pub fn balance_delta(&self, amount: Decimal) -> Decimal {
        match self {
            CategoryKind::Expense => -amount,
            CategoryKind::Income => amount,
        }
    }
}

impl fmt::Display for CategoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CategoryKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "expense" => Ok(CategoryKind::Expense),
            "income" => Ok(CategoryKind::Income),
            other => Err(format!("Unknown category type '{}' (use expense|income)", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    Cash,
    Debit,
    Credit,
    Ewallet,
    Investment,
    Renovation,
    Other,
}

impl AccountKind {
    pub const ALL: [AccountKind; 7] = [
        AccountKind::Cash,
        AccountKind::Debit,
        AccountKind::Credit,
        AccountKind::Ewallet,
        AccountKind::Investment,
        AccountKind::Renovation,
        AccountKind::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AccountKind::Cash => "cash",
            AccountKind::Debit => "debit",
            AccountKind::Credit => "credit",
            AccountKind::Ewallet => "ewallet",
            AccountKind::Investment => "investment",
            AccountKind::Renovation => "renovation",
            AccountKind::Other => "other",
        }
    }
}

impl fmt::Display for AccountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        AccountKind::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == wanted)
            .ok_or_else(|| {
                format!(
                    "Unknown account type '{}' (use cash|debit|credit|ewallet|investment|renovation|other)",
                    s
                )
            })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub name: String,
    pub balance: Decimal,
    pub kind: AccountKind,
    pub color: String,
    pub icon: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub symbol: String,
    pub color: String,
    pub kind: CategoryKind,
    pub sort_order: i64,
    pub usage_count: i64,
}

/// Category and account are referenced by name; renaming either orphans
/// existing records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub amount: Decimal,
    pub title: String,
    pub date: NaiveDateTime,
    pub category_name: String,
    pub account_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub amount: Decimal,
    pub title: String,
    pub date: NaiveDateTime,
    pub category_name: String,
    pub account_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub id: i64,
    pub name: String,
    pub provider: ProviderType,
    pub base_url: String,
    pub model_name: String,
    pub created_at: String,
}
