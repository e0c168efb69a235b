// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

mod common;

use chatledger::commands::reports::{self, CategoryTotal};
use chatledger::ledger;
use chatledger::models::{CategoryKind, NewTransaction};
use common::{dec, dt, small_ledger};
use rusqlite::Connection;

fn seeded() -> Connection {
    let mut conn = small_ledger();
    for (amt, cat, date) in [
        ("50", "餐饮", "2024-05-20T12:00:00"),
        ("30", "餐饮", "2024-06-01T12:00:00"),
        ("20", "其他", "2024-06-02T12:00:00"),
        ("15", "餐饮", "2024-06-30T23:59:00"),
        ("3000", "工资", "2024-06-10T09:00:00"),
    ] {
        ledger::insert_transaction(
            &mut conn,
            &NewTransaction {
                amount: dec(amt),
                title: String::new(),
                date: dt(date),
                category_name: cat.into(),
                account_name: None,
            },
        )
        .unwrap();
    }
    conn
}

#[test]
fn monthly_summary_splits_income_and_expense() {
    let conn = seeded();
    let months = reports::monthly_summary(&conn, 12).unwrap();
    assert_eq!(months.len(), 2);
    assert_eq!(months[0].month, "2024-06");
    assert_eq!(months[0].income, dec("3000"));
    assert_eq!(months[0].expense, dec("65"));
    assert_eq!(months[0].net, dec("2935"));
    assert_eq!(months[1].month, "2024-05");

    assert_eq!(reports::monthly_summary(&conn, 1).unwrap().len(), 1);
}

#[test]
fn category_totals_cover_the_calendar_month() {
    let conn = seeded();
    let totals = reports::category_totals(&conn, "2024-06", CategoryKind::Expense).unwrap();
    assert_eq!(
        totals,
        vec![
            CategoryTotal {
                category: "餐饮".into(),
                total: dec("45"),
                records: 2
            },
            CategoryTotal {
                category: "其他".into(),
                total: dec("20"),
                records: 1
            },
        ]
    );
    let income = reports::category_totals(&conn, "2024-06", CategoryKind::Income).unwrap();
    assert_eq!(income.len(), 1);
    assert!(reports::category_totals(&conn, "June", CategoryKind::Expense).is_err());
}
