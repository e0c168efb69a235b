// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use rusqlite::{Connection, params};
use std::fs;
use std::path::PathBuf;
use tracing::info;

static APP: Lazy<(&str, &str, &str)> =
    Lazy::new(|| ("com.alphavelocity", "Chatledger", "chatledger"));

/// Environment variable overriding the database location.
pub const DB_ENV: &str = "CHATLEDGER_DB";

/// (name, symbol, color, type)
const DEFAULT_CATEGORIES: [(&str, &str, &str, &str); 26] = [
    ("餐饮", "fork.knife", "#FF9500", "expense"),
    ("交通", "car", "#007AFF", "expense"),
    ("购物", "bag", "#FF2D55", "expense"),
    ("日用", "basket", "#34C759", "expense"),
    ("住房", "house", "#5856D6", "expense"),
    ("水电", "bolt", "#FFCC00", "expense"),
    ("通讯", "phone", "#5AC8FA", "expense"),
    ("娱乐", "gamecontroller", "#AF52DE", "expense"),
    ("医疗", "cross.case", "#FF3B30", "expense"),
    ("教育", "book", "#30B0C7", "expense"),
    ("服饰", "tshirt", "#FF6482", "expense"),
    ("美容", "sparkles", "#FF7EB6", "expense"),
    ("运动", "figure.run", "#32ADE6", "expense"),
    ("旅行", "airplane", "#00C7BE", "expense"),
    ("数码", "desktopcomputer", "#8E8E93", "expense"),
    ("宠物", "pawprint", "#A2845E", "expense"),
    ("人情", "gift", "#FF453A", "expense"),
    ("烟酒", "wineglass", "#BF5AF2", "expense"),
    ("零食", "cup.and.saucer", "#FFB340", "expense"),
    ("其他", "ellipsis.circle", "#636366", "expense"),
    ("工资", "banknote", "#34C759", "income"),
    ("奖金", "star", "#FFD60A", "income"),
    ("理财", "chart.line.uptrend.xyaxis", "#0A84FF", "income"),
    ("兼职", "briefcase", "#64D2FF", "income"),
    ("红包", "envelope", "#FF375F", "income"),
    ("其他收入", "plus.circle", "#30D158", "income"),
];

pub fn db_path() -> Result<PathBuf> {
    if let Ok(p) = std::env::var(DB_ENV) {
        if !p.trim().is_empty() {
            return Ok(PathBuf::from(p.trim()));
        }
    }
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2)
        .context("Could not determine platform-specific data dir")?;
    let data_dir = proj.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data dir")?;
    Ok(data_dir.join("chatledger.sqlite"))
}

pub fn open_or_init() -> Result<Connection> {
    let path = db_path()?;
    let conn =
        Connection::open(&path).with_context(|| format!("Open DB at {}", path.display()))?;
    init_schema(&conn)?;
    seed_defaults(&conn)?;
    Ok(conn)
}

/// Empty in-memory ledger with the full schema and no seed data.
pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
    CREATE TABLE IF NOT EXISTS settings(
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );

    -- opaque key/value vault for API keys
    CREATE TABLE IF NOT EXISTS secrets(
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS accounts(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        balance TEXT NOT NULL DEFAULT '0',
        type TEXT NOT NULL,
        color TEXT NOT NULL DEFAULT '',
        icon TEXT NOT NULL DEFAULT ''
    );

    -- names are unique in practice only
    CREATE TABLE IF NOT EXISTS categories(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        symbol TEXT NOT NULL DEFAULT '',
        color TEXT NOT NULL DEFAULT '',
        type TEXT NOT NULL CHECK(type IN ('expense','income')),
        sort_order INTEGER NOT NULL DEFAULT 0,
        usage_count INTEGER NOT NULL DEFAULT 0
    );

    -- category/account are loose references by name
    CREATE TABLE IF NOT EXISTS transactions(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        amount TEXT NOT NULL,
        title TEXT NOT NULL,
        date TEXT NOT NULL,
        category_name TEXT NOT NULL,
        account_name TEXT,
        created_at TEXT NOT NULL DEFAULT (datetime('now'))
    );
    CREATE INDEX IF NOT EXISTS idx_transactions_date ON transactions(date);

    CREATE TABLE IF NOT EXISTS llm_configs(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        provider TEXT NOT NULL,
        base_url TEXT NOT NULL,
        model_name TEXT NOT NULL,
        created_at TEXT NOT NULL DEFAULT (datetime('now'))
    );
    "#,
    )?;
    Ok(())
}

/// Seeds default categories and a cash account into an empty ledger.
pub fn seed_defaults(conn: &Connection) -> Result<()> {
    let categories: i64 = conn.query_row("SELECT COUNT(*) FROM categories", [], |r| r.get(0))?;
    if categories == 0 {
        for (i, (name, symbol, color, typ)) in DEFAULT_CATEGORIES.iter().enumerate() {
            conn.execute(
                "INSERT INTO categories(name, symbol, color, type, sort_order) VALUES (?1,?2,?3,?4,?5)",
                params![name, symbol, color, typ, i as i64],
            )?;
        }
        info!(count = DEFAULT_CATEGORIES.len(), "seeded default categories");
    }
    let accounts: i64 = conn.query_row("SELECT COUNT(*) FROM accounts", [], |r| r.get(0))?;
    if accounts == 0 && categories == 0 {
        conn.execute(
            "INSERT INTO accounts(name, balance, type, color, icon) VALUES ('现金', '0', 'cash', '#34C759', 'banknote')",
            [],
        )?;
    }
    Ok(())
}
