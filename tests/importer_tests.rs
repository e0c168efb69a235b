// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

mod common;

use chatledger::commands::{exporter, importer};
use chatledger::ledger::{self, TransactionFilter};
use chatledger::models::{CategoryKind, NewTransaction};
use chatledger::cli;
use common::{balance_of, dec, dt, small_ledger};
use std::io::Write;
use tempfile::{NamedTempFile, tempdir};

fn csv_file(body: &str) -> NamedTempFile {
    let mut f = NamedTempFile::new().unwrap();
    f.write_all(body.as_bytes()).unwrap();
    f
}

#[test]
fn import_with_bom_creates_missing_categories() {
    let mut conn = small_ledger();
    let file = csv_file(
        "\u{FEFF}Date,Time,Type,Amount,Category,Account,Note\n\
         2024-06-01,12:05,expense,12.30,餐饮,现金,lunch\n\
         2024-06-02,,income,500,Freelance,现金,\n",
    );
    let path = file.path().to_string_lossy().to_string();
    let matches =
        cli::build_cli().get_matches_from(["chatledger", "import", "transactions", "--path", &path]);
    if let Some(("import", import_m)) = matches.subcommand() {
        importer::handle(&mut conn, import_m).unwrap();
    } else {
        panic!("no import subcommand");
    }

    assert_eq!(
        ledger::category_kind(&conn, "Freelance").unwrap(),
        Some(CategoryKind::Income)
    );
    assert_eq!(balance_of(&conn, "现金"), dec("487.70"));
    let rows = ledger::fetch_transactions(&conn, &TransactionFilter::default()).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].date, dt("2024-06-02T00:00:00"));
    assert_eq!(rows[0].title, "Freelance");
    assert_eq!(rows[1].date, dt("2024-06-01T12:05:00"));
}

#[test]
fn bad_row_rolls_back_the_whole_import() {
    let mut conn = small_ledger();
    let file = csv_file(
        "Date,Time,Type,Amount,Category,Account,Note\n\
         2024-06-01,08:00,expense,5,餐饮,现金,ok\n\
         2024-06-02,08:00,expense,abc,餐饮,现金,broken\n",
    );
    let err = importer::import_transactions(&mut conn, file.path()).unwrap_err();
    assert!(format!("{:#}", err).contains("line 3"));
    assert!(
        ledger::fetch_transactions(&conn, &TransactionFilter::default())
            .unwrap()
            .is_empty()
    );
    assert_eq!(balance_of(&conn, "现金"), dec("0"));
}

#[test]
fn exported_file_imports_into_a_fresh_ledger() {
    let mut source = small_ledger();
    for (amt, cat, title, date) in [
        ("20", "餐饮", "dinner, with friends", "2024-06-03T19:00:00"),
        ("3000", "工资", "salary", "2024-06-10T09:00:00"),
    ] {
        ledger::insert_transaction(
            &mut source,
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
    let path = dir.path().join("roundtrip.csv");
    exporter::export_transactions(&source, &path).unwrap();

    let mut target = small_ledger();
    let n = importer::import_transactions(&mut target, &path).unwrap();
    assert_eq!(n, 2);
    let before = ledger::fetch_transactions(&source, &TransactionFilter::default()).unwrap();
    let after = ledger::fetch_transactions(&target, &TransactionFilter::default()).unwrap();
    let strip = |v: &[chatledger::models::Transaction]| {
        v.iter()
            .map(|t| (t.amount, t.title.clone(), t.date, t.category_name.clone()))
            .collect::<Vec<_>>()
    };
    assert_eq!(strip(&before), strip(&after));
    assert_eq!(balance_of(&target, "现金"), balance_of(&source, "现金"));
}
