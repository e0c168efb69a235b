// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

mod common;

use chatledger::commands::exporter::{self, UTF8_BOM};
use chatledger::{cli, ledger};
use chatledger::models::NewTransaction;
use common::{dec, dt, small_ledger};
use tempfile::tempdir;

#[test]
fn export_writes_bom_header_and_rows_oldest_first() {
    let mut conn = small_ledger();
    for (amt, cat, title, date) in [
        ("3000", "工资", "June salary", "2024-06-10T09:00:00"),
        ("12.3", "餐饮", "noodles, spicy", "2024-06-01T12:05:00"),
    ] {
        ledger::insert_transaction(
            &mut conn,
            &NewTransaction {
                amount: dec(amt),
                title: title.into(),
                date: dt(date),
                category_name: cat.into(),
                account_name: Some("现金".into()),
            },
        )
        .unwrap();
    }

    let dir = tempdir().unwrap();
    let out_path = dir.path().join("export.csv");
    let out_str = out_path.to_string_lossy().to_string();

    let matches = cli::build_cli().get_matches_from([
        "chatledger",
        "export",
        "transactions",
        "--out",
        &out_str,
    ]);
    if let Some(("export", export_m)) = matches.subcommand() {
        exporter::handle(&conn, export_m).unwrap();
    } else {
        panic!("no export subcommand");
    }

    let contents = std::fs::read_to_string(&out_path).unwrap();
    assert!(contents.starts_with(UTF8_BOM));
    let lines: Vec<&str> = contents.trim_start_matches(UTF8_BOM).lines().collect();
    assert_eq!(lines[0], "Date,Time,Type,Amount,Category,Account,Note");
    assert_eq!(lines[1], "2024-06-01,12:05,expense,12.30,餐饮,现金,\"noodles, spicy\"");
    assert_eq!(lines[2], "2024-06-10,09:00,income,3000.00,工资,现金,June salary");
    assert_eq!(lines.len(), 3);
}

#[test]
fn export_of_empty_ledger_is_just_the_header() {
    let conn = small_ledger();
    let dir = tempdir().unwrap();
    let out_path = dir.path().join("empty.csv");
    let n = exporter::export_transactions(&conn, &out_path).unwrap();
    assert_eq!(n, 0);
    let contents = std::fs::read_to_string(&out_path).unwrap();
    assert_eq!(
        contents.trim_start_matches(UTF8_BOM).trim_end(),
        "Date,Time,Type,Amount,Category,Account,Note"
    );
}
