// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Record-level operations on the embedded ledger.
//!
//! Every user action that touches more than one row (insert + usage count +
//! balance, delete + reversal, balance correction) runs inside a single
//! SQLite transaction so a failure never leaves a half-applied change.

use chrono::NaiveDateTime;
use rusqlite::{Connection, OptionalExtension, Row, params};
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::error::StoreError;
use crate::models::{Account, AccountKind, Category, CategoryKind, NewTransaction, Transaction};
use crate::utils::{fmt_datetime, parse_stored_datetime};

pub const BALANCE_ADJUSTMENT_CATEGORY: &str = "Balance Adjustment";

/// Differences below this are treated as equal balances.
pub const BALANCE_EPSILON: Decimal = Decimal::from_parts(1, 0, 0, false, 3);

pub type Result<T> = std::result::Result<T, StoreError>;

/// AND-combined filter; `None` fields do not constrain.
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub start: Option<NaiveDateTime>,
    /// Exclusive upper bound.
    pub end: Option<NaiveDateTime>,
    pub category_name: Option<String>,
    pub account_name: Option<String>,
    pub kind: Option<CategoryKind>,
}

impl TransactionFilter {
    pub fn is_empty(&self) -> bool {
        self.start.is_none()
            && self.end.is_none()
            && self.category_name.is_none()
            && self.account_name.is_none()
            && self.kind.is_none()
    }
}

fn decimal_col(row: &Row<'_>, idx: usize) -> Result<Decimal> {
    let raw: String = row.get(idx)?;
    raw.parse::<Decimal>()
        .map_err(|_| StoreError::Corrupt(format!("invalid amount '{}'", raw)))
}

fn transaction_from_row(row: &Row<'_>) -> Result<Transaction> {
    let raw_date: String = row.get(3)?;
    let date = parse_stored_datetime(&raw_date)
        .ok_or_else(|| StoreError::Corrupt(format!("invalid date '{}'", raw_date)))?;
    Ok(Transaction {
        id: row.get(0)?,
        amount: decimal_col(row, 1)?,
        title: row.get(2)?,
        date,
        category_name: row.get(4)?,
        account_name: row.get(5)?,
    })
}

fn category_from_row(row: &Row<'_>) -> Result<Category> {
    let typ: String = row.get(4)?;
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        symbol: row.get(2)?,
        color: row.get(3)?,
        kind: typ.parse().map_err(StoreError::Corrupt)?,
        sort_order: row.get(5)?,
        usage_count: row.get(6)?,
    })
}

fn account_from_row(row: &Row<'_>) -> Result<Account> {
    let typ: String = row.get(3)?;
    Ok(Account {
        id: row.get(0)?,
        name: row.get(1)?,
        balance: decimal_col(row, 2)?,
        kind: typ.parse().map_err(StoreError::Corrupt)?,
        color: row.get(4)?,
        icon: row.get(5)?,
    })
}

/// Picker order: most used first, then manual sort order.
pub fn list_categories(conn: &Connection, kind: Option<CategoryKind>) -> Result<Vec<Category>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, symbol, color, type, sort_order, usage_count FROM categories
         WHERE ?1 IS NULL OR type = ?1
         ORDER BY usage_count DESC, sort_order ASC, id ASC",
    )?;
    let mut rows = stmt.query(params![kind.map(|k| k.as_str())])?;
    let mut out = Vec::new();
    while let Some(r) = rows.next()? {
        out.push(category_from_row(r)?);
    }
    Ok(out)
}

pub fn list_accounts(conn: &Connection) -> Result<Vec<Account>> {
    let mut stmt =
        conn.prepare("SELECT id, name, balance, type, color, icon FROM accounts ORDER BY id")?;
    let mut rows = stmt.query([])?;
    let mut out = Vec::new();
    while let Some(r) = rows.next()? {
        out.push(account_from_row(r)?);
    }
    Ok(out)
}

pub fn find_account(conn: &Connection, name: &str) -> Result<Option<Account>> {
    let mut stmt = conn
        .prepare("SELECT id, name, balance, type, color, icon FROM accounts WHERE name = ?1")?;
    let mut rows = stmt.query(params![name])?;
    match rows.next()? {
        Some(r) => Ok(Some(account_from_row(r)?)),
        None => Ok(None),
    }
}

/// Kind of the first category carrying `name`, if any.
pub fn category_kind(conn: &Connection, name: &str) -> Result<Option<CategoryKind>> {
    let typ: Option<String> = conn
        .query_row(
            "SELECT type FROM categories WHERE name = ?1 ORDER BY id LIMIT 1",
            params![name],
            |r| r.get(0),
        )
        .optional()?;
    typ.map(|t| t.parse().map_err(StoreError::Corrupt))
        .transpose()
}

/// Orphaned category names count as expenses.
pub fn effective_kind(conn: &Connection, category_name: &str) -> Result<CategoryKind> {
    Ok(category_kind(conn, category_name)?.unwrap_or(CategoryKind::Expense))
}

pub fn add_category(
    conn: &Connection,
    name: &str,
    kind: CategoryKind,
    symbol: &str,
    color: &str,
) -> Result<i64> {
    let next_order: i64 = conn.query_row(
        "SELECT COALESCE(MAX(sort_order), -1) + 1 FROM categories",
        [],
        |r| r.get(0),
    )?;
    conn.execute(
        "INSERT INTO categories(name, symbol, color, type, sort_order) VALUES (?1,?2,?3,?4,?5)",
        params![name, symbol, color, kind.as_str(), next_order],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Transactions referencing the category are left untouched.
pub fn remove_category(conn: &Connection, name: &str) -> Result<bool> {
    Ok(conn.execute("DELETE FROM categories WHERE name = ?1", params![name])? > 0)
}

pub fn add_account(
    conn: &Connection,
    name: &str,
    kind: AccountKind,
    balance: Decimal,
    color: &str,
    icon: &str,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO accounts(name, balance, type, color, icon) VALUES (?1,?2,?3,?4,?5)",
        params![name, balance.to_string(), kind.as_str(), color, icon],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn remove_account(conn: &Connection, name: &str) -> Result<bool> {
    Ok(conn.execute("DELETE FROM accounts WHERE name = ?1", params![name])? > 0)
}

/// Matching transactions, newest first.
pub fn fetch_transactions(conn: &Connection, filter: &TransactionFilter) -> Result<Vec<Transaction>> {
    let mut sql = String::from(
        "SELECT t.id, t.amount, t.title, t.date, t.category_name, t.account_name FROM transactions t WHERE 1=1",
    );
    let mut params_vec: Vec<String> = Vec::new();

    if let Some(start) = filter.start {
        sql.push_str(" AND t.date >= ?");
        params_vec.push(fmt_datetime(&start));
    }
    if let Some(end) = filter.end {
        sql.push_str(" AND t.date < ?");
        params_vec.push(fmt_datetime(&end));
    }
    if let Some(cat) = &filter.category_name {
        sql.push_str(" AND t.category_name = ?");
        params_vec.push(cat.clone());
    }
    if let Some(acct) = &filter.account_name {
        sql.push_str(" AND t.account_name = ?");
        params_vec.push(acct.clone());
    }
    match filter.kind {
        Some(CategoryKind::Income) => sql.push_str(
            " AND (SELECT c.type FROM categories c WHERE c.name = t.category_name ORDER BY c.id LIMIT 1) = 'income'",
        ),
        Some(CategoryKind::Expense) => sql.push_str(
            " AND COALESCE((SELECT c.type FROM categories c WHERE c.name = t.category_name ORDER BY c.id LIMIT 1), 'expense') = 'expense'",
        ),
        None => {}
    }
    sql.push_str(" ORDER BY t.date DESC, t.id DESC");
    debug!(%sql, params = ?params_vec, "fetching transactions");

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(rusqlite::params_from_iter(params_vec.iter()))?;
    let mut out = Vec::new();
    while let Some(r) = rows.next()? {
        out.push(transaction_from_row(r)?);
    }
    Ok(out)
}

pub fn get_transaction(conn: &Connection, id: i64) -> Result<Option<Transaction>> {
    let mut stmt = conn.prepare(
        "SELECT id, amount, title, date, category_name, account_name FROM transactions WHERE id = ?1",
    )?;
    let mut rows = stmt.query(params![id])?;
    match rows.next()? {
        Some(r) => Ok(Some(transaction_from_row(r)?)),
        None => Ok(None),
    }
}

/// Adds `delta` to the named account's balance; returns the new balance or
/// `None` when no such account exists.
fn apply_balance_delta(conn: &Connection, account_name: &str, delta: Decimal) -> Result<Option<Decimal>> {
    let current: Option<String> = conn
        .query_row(
            "SELECT balance FROM accounts WHERE name = ?1",
            params![account_name],
            |r| r.get(0),
        )
        .optional()?;
    let Some(raw) = current else {
        return Ok(None);
    };
    let balance = raw
        .parse::<Decimal>()
        .map_err(|_| StoreError::Corrupt(format!("invalid balance '{}'", raw)))?;
    let updated = balance + delta;
    conn.execute(
        "UPDATE accounts SET balance = ?1 WHERE name = ?2",
        params![updated.to_string(), account_name],
    )?;
    Ok(Some(updated))
}

fn insert_row(conn: &Connection, new: &NewTransaction) -> Result<Transaction> {
    let title = if new.title.trim().is_empty() {
        new.category_name.clone()
    } else {
        new.title.trim().to_string()
    };
    conn.execute(
        "INSERT INTO transactions(amount, title, date, category_name, account_name) VALUES (?1,?2,?3,?4,?5)",
        params![
            new.amount.to_string(),
            title,
            fmt_datetime(&new.date),
            new.category_name,
            new.account_name
        ],
    )?;
    Ok(Transaction {
        id: conn.last_insert_rowid(),
        amount: new.amount,
        title,
        date: new.date,
        category_name: new.category_name.clone(),
        account_name: new.account_name.clone(),
    })
}

#[derive(Debug, Clone)]
pub struct Inserted {
    pub transaction: Transaction,
    pub kind: CategoryKind,
    /// Balance of the linked account after the insert.
    pub account_balance: Option<Decimal>,
}

/// Inserts a record, bumps the category's usage count and moves the linked
/// account's balance, all in one commit.
pub fn insert_transaction(conn: &mut Connection, new: &NewTransaction) -> Result<Inserted> {
    let tx = conn.transaction()?;
    let inserted = insert_within(&tx, new)?;
    tx.commit()?;
    info!(
        id = inserted.transaction.id,
        amount = %inserted.transaction.amount,
        category = %inserted.transaction.category_name,
        "transaction recorded"
    );
    Ok(inserted)
}

/// Same as [`insert_transaction`] for callers that already hold a transaction.
pub fn insert_within(conn: &Connection, new: &NewTransaction) -> Result<Inserted> {
    if new.amount <= Decimal::ZERO {
        return Err(StoreError::Corrupt(format!(
            "transaction amount must be positive, got {}",
            new.amount
        )));
    }
    let transaction = insert_row(conn, new)?;
    let kind = effective_kind(conn, &transaction.category_name)?;
    conn.execute(
        "UPDATE categories SET usage_count = usage_count + 1
         WHERE id = (SELECT id FROM categories WHERE name = ?1 ORDER BY id LIMIT 1)",
        params![transaction.category_name],
    )?;
    let account_balance = match &transaction.account_name {
        Some(acct) => apply_balance_delta(conn, acct, kind.balance_delta(transaction.amount))?,
        None => None,
    };
    Ok(Inserted {
        transaction,
        kind,
        account_balance,
    })
}

/// Deletes a record and reverses its balance effect exactly.
pub fn delete_transaction(conn: &mut Connection, id: i64) -> Result<Transaction> {
    let tx = conn.transaction()?;
    let existing = get_transaction(&tx, id)?
        .ok_or_else(|| StoreError::NotFound(format!("transaction {}", id)))?;
    tx.execute("DELETE FROM transactions WHERE id = ?1", params![id])?;
    if let Some(acct) = &existing.account_name {
        let kind = effective_kind(&tx, &existing.category_name)?;
        apply_balance_delta(&tx, acct, -kind.balance_delta(existing.amount))?;
    }
    tx.commit()?;
    info!(id, "transaction deleted");
    Ok(existing)
}

/// Name of the adjustment category holding differences of `kind`.
pub fn adjustment_category_name(kind: CategoryKind) -> String {
    format!("{} ({})", BALANCE_ADJUSTMENT_CATEGORY, kind)
}

/// Finds or creates an adjustment category whose first row by name has
/// `kind`; a same-named category of the other kind gets a numbered sibling.
fn adjustment_category(conn: &Connection, kind: CategoryKind) -> Result<String> {
    let base = adjustment_category_name(kind);
    let mut n = 1;
    loop {
        let name = if n == 1 {
            base.clone()
        } else {
            format!("{} {}", base, n)
        };
        match category_kind(conn, &name)? {
            Some(k) if k == kind => return Ok(name),
            Some(_) => n += 1,
            None => {
                add_category(conn, &name, kind, "slider.horizontal.3", "#8E8E93")?;
                return Ok(name);
            }
        }
    }
}

/// Reconciles an account to `new_balance`, recording the difference as a
/// synthetic transaction. The balance is assigned directly, not through the
/// transaction's side effect.
pub fn set_account_balance(
    conn: &mut Connection,
    account_name: &str,
    new_balance: Decimal,
    now: NaiveDateTime,
) -> Result<Option<Transaction>> {
    let tx = conn.transaction()?;
    let account = find_account(&tx, account_name)?
        .ok_or_else(|| StoreError::NotFound(format!("account '{}'", account_name)))?;
    let diff = new_balance - account.balance;
    if diff.abs() < BALANCE_EPSILON {
        debug!(account = account_name, "balance unchanged");
        return Ok(None);
    }
    let kind = if diff > Decimal::ZERO {
        CategoryKind::Income
    } else {
        CategoryKind::Expense
    };
    let category_name = adjustment_category(&tx, kind)?;
    let adjustment = insert_row(
        &tx,
        &NewTransaction {
            amount: diff.abs(),
            title: BALANCE_ADJUSTMENT_CATEGORY.to_string(),
            date: now,
            category_name,
            account_name: Some(account.name.clone()),
        },
    )?;
    tx.execute(
        "UPDATE accounts SET balance = ?1 WHERE id = ?2",
        params![new_balance.to_string(), account.id],
    )?;
    tx.commit()?;
    info!(account = account_name, %diff, "balance adjusted");
    Ok(Some(adjustment))
}
