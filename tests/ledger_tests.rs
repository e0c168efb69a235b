// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

mod common;

use chatledger::db;
use chatledger::error::StoreError;
use chatledger::ledger::{
    self, BALANCE_ADJUSTMENT_CATEGORY, TransactionFilter, adjustment_category_name,
};
use chatledger::models::{CategoryKind, NewTransaction};
use common::{balance_of, dec, dt, small_ledger, usage_of};
use rust_decimal::Decimal;

fn new_tx(amount: &str, category: &str, account: Option<&str>, date: &str) -> NewTransaction {
    NewTransaction {
        amount: dec(amount),
        title: String::new(),
        date: dt(date),
        category_name: category.to_string(),
        account_name: account.map(str::to_string),
    }
}

#[test]
fn expense_insert_then_delete_restores_balance() {
    let mut conn = small_ledger();
    let ins = ledger::insert_transaction(
        &mut conn,
        &new_tx("12.50", "餐饮", Some("现金"), "2024-06-15T09:00:00"),
    )
    .unwrap();
    assert_eq!(ins.kind, CategoryKind::Expense);
    assert_eq!(ins.account_balance, Some(dec("-12.50")));
    assert_eq!(balance_of(&conn, "现金"), dec("-12.50"));
    assert_eq!(ins.transaction.title, "餐饮");
    assert_eq!(usage_of(&conn, "餐饮"), 1);

    ledger::delete_transaction(&mut conn, ins.transaction.id).unwrap();
    assert_eq!(balance_of(&conn, "现金"), Decimal::ZERO);
    assert!(ledger::get_transaction(&conn, ins.transaction.id).unwrap().is_none());
}

#[test]
fn income_insert_then_delete_restores_balance() {
    let mut conn = small_ledger();
    let ins = ledger::insert_transaction(
        &mut conn,
        &new_tx("3000", "工资", Some("现金"), "2024-06-10T09:00:00"),
    )
    .unwrap();
    assert_eq!(ins.kind, CategoryKind::Income);
    assert_eq!(balance_of(&conn, "现金"), dec("3000"));
    ledger::delete_transaction(&mut conn, ins.transaction.id).unwrap();
    assert_eq!(balance_of(&conn, "现金"), Decimal::ZERO);
}

#[test]
fn orphaned_category_counts_as_expense() {
    let mut conn = small_ledger();
    let ins = ledger::insert_transaction(
        &mut conn,
        &new_tx("8", "Gone", Some("现金"), "2024-06-15T09:00:00"),
    )
    .unwrap();
    assert_eq!(ins.kind, CategoryKind::Expense);
    assert_eq!(balance_of(&conn, "现金"), dec("-8"));
    let expenses = ledger::fetch_transactions(
        &conn,
        &TransactionFilter {
            kind: Some(CategoryKind::Expense),
            ..TransactionFilter::default()
        },
    )
    .unwrap();
    assert_eq!(expenses.len(), 1);
}

#[test]
fn unknown_account_leaves_balances_alone() {
    let mut conn = small_ledger();
    let ins = ledger::insert_transaction(
        &mut conn,
        &new_tx("5", "餐饮", Some("Nowhere"), "2024-06-15T09:00:00"),
    )
    .unwrap();
    assert_eq!(ins.account_balance, None);
    assert_eq!(balance_of(&conn, "现金"), Decimal::ZERO);
}

#[test]
fn non_positive_amount_is_rejected_without_writing() {
    let mut conn = small_ledger();
    let err = ledger::insert_transaction(
        &mut conn,
        &new_tx("0", "餐饮", Some("现金"), "2024-06-15T09:00:00"),
    )
    .unwrap_err();
    assert!(matches!(err, StoreError::Corrupt(_)));
    assert!(
        ledger::fetch_transactions(&conn, &TransactionFilter::default())
            .unwrap()
            .is_empty()
    );
    assert_eq!(usage_of(&conn, "餐饮"), 0);
}

#[test]
fn deleting_missing_transaction_is_not_found() {
    let mut conn = small_ledger();
    assert!(matches!(
        ledger::delete_transaction(&mut conn, 42),
        Err(StoreError::NotFound(_))
    ));
}

#[test]
fn fetch_filters_and_orders_newest_first() {
    let mut conn = small_ledger();
    for (amt, cat, date) in [
        ("10", "餐饮", "2024-06-01T08:00:00"),
        ("20", "餐饮", "2024-06-14T12:00:00"),
        ("30", "其他", "2024-06-14T18:00:00"),
        ("3000", "工资", "2024-06-10T09:00:00"),
    ] {
        ledger::insert_transaction(&mut conn, &new_tx(amt, cat, Some("现金"), date)).unwrap();
    }

    let june_14 = ledger::fetch_transactions(
        &conn,
        &TransactionFilter {
            start: Some(dt("2024-06-14T00:00:00")),
            end: Some(dt("2024-06-15T00:00:00")),
            ..TransactionFilter::default()
        },
    )
    .unwrap();
    let amounts: Vec<Decimal> = june_14.iter().map(|t| t.amount).collect();
    assert_eq!(amounts, vec![dec("30"), dec("20")]);

    let food = ledger::fetch_transactions(
        &conn,
        &TransactionFilter {
            category_name: Some("餐饮".into()),
            ..TransactionFilter::default()
        },
    )
    .unwrap();
    assert_eq!(food.len(), 2);

    let income = ledger::fetch_transactions(
        &conn,
        &TransactionFilter {
            kind: Some(CategoryKind::Income),
            ..TransactionFilter::default()
        },
    )
    .unwrap();
    assert_eq!(income.len(), 1);
    assert_eq!(income[0].category_name, "工资");
}

#[test]
fn categories_come_back_in_picker_order() {
    let mut conn = small_ledger();
    ledger::insert_transaction(&mut conn, &new_tx("1", "其他", None, "2024-06-15T09:00:00"))
        .unwrap();
    let names: Vec<String> = ledger::list_categories(&conn, None)
        .unwrap()
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert_eq!(names, vec!["其他", "餐饮", "工资"]);

    let income: Vec<String> = ledger::list_categories(&conn, Some(CategoryKind::Income))
        .unwrap()
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert_eq!(income, vec!["工资"]);
}

#[test]
fn raising_a_balance_records_income_adjustment() {
    let mut conn = small_ledger();
    let adj = ledger::set_account_balance(&mut conn, "现金", dec("100"), dt("2024-06-15T10:00:00"))
        .unwrap()
        .unwrap();
    assert_eq!(adj.amount, dec("100"));
    assert_eq!(adj.title, BALANCE_ADJUSTMENT_CATEGORY);
    assert_eq!(adj.category_name, adjustment_category_name(CategoryKind::Income));
    assert_eq!(balance_of(&conn, "现金"), dec("100"));
    assert_eq!(
        ledger::effective_kind(&conn, &adj.category_name).unwrap(),
        CategoryKind::Income
    );
}

#[test]
fn lowering_a_balance_records_expense_sized_difference() {
    let mut conn = small_ledger();
    ledger::set_account_balance(&mut conn, "现金", dec("100"), dt("2024-06-15T10:00:00")).unwrap();
    let adj = ledger::set_account_balance(&mut conn, "现金", dec("60.5"), dt("2024-06-15T11:00:00"))
        .unwrap()
        .unwrap();
    assert_eq!(adj.amount, dec("39.5"));
    assert_eq!(balance_of(&conn, "现金"), dec("60.5"));
    assert_eq!(
        ledger::effective_kind(&conn, &adj.category_name).unwrap(),
        CategoryKind::Expense
    );
    let all = ledger::fetch_transactions(&conn, &TransactionFilter::default()).unwrap();
    assert_eq!(all.len(), 2);

    let by_kind = |kind| {
        ledger::fetch_transactions(
            &conn,
            &TransactionFilter {
                kind: Some(kind),
                ..Default::default()
            },
        )
        .unwrap()
    };
    assert_eq!(by_kind(CategoryKind::Income).len(), 1);
    let expenses = by_kind(CategoryKind::Expense);
    assert_eq!(expenses.len(), 1);
    assert_eq!(expenses[0].id, adj.id);

    // reversing the decrease gives the money back
    ledger::delete_transaction(&mut conn, adj.id).unwrap();
    assert_eq!(balance_of(&conn, "现金"), dec("100"));
}

#[test]
fn adjustment_steps_around_a_same_named_category_of_the_other_kind() {
    let mut conn = small_ledger();
    let taken = adjustment_category_name(CategoryKind::Expense);
    ledger::add_category(&conn, &taken, CategoryKind::Income, "", "").unwrap();
    ledger::set_account_balance(&mut conn, "现金", dec("50"), dt("2024-06-15T10:00:00")).unwrap();

    let adj = ledger::set_account_balance(&mut conn, "现金", dec("20"), dt("2024-06-15T11:00:00"))
        .unwrap()
        .unwrap();
    assert_ne!(adj.category_name, taken);
    assert_eq!(
        ledger::effective_kind(&conn, &adj.category_name).unwrap(),
        CategoryKind::Expense
    );
    assert_eq!(
        ledger::category_kind(&conn, &taken).unwrap(),
        Some(CategoryKind::Income)
    );

    ledger::delete_transaction(&mut conn, adj.id).unwrap();
    assert_eq!(balance_of(&conn, "现金"), dec("50"));
}

#[test]
fn tiny_balance_difference_is_a_no_op() {
    let mut conn = small_ledger();
    let adj =
        ledger::set_account_balance(&mut conn, "现金", dec("0.0005"), dt("2024-06-15T10:00:00"))
            .unwrap();
    assert!(adj.is_none());
    assert_eq!(balance_of(&conn, "现金"), Decimal::ZERO);
    assert!(
        ledger::fetch_transactions(&conn, &TransactionFilter::default())
            .unwrap()
            .is_empty()
    );
}

#[test]
fn adjusting_unknown_account_is_not_found() {
    let mut conn = small_ledger();
    assert!(matches!(
        ledger::set_account_balance(&mut conn, "Bank", dec("1"), dt("2024-06-15T10:00:00")),
        Err(StoreError::NotFound(_))
    ));
}

#[test]
fn seeding_fills_an_empty_ledger_once() {
    let conn = db::open_in_memory().unwrap();
    db::seed_defaults(&conn).unwrap();
    db::seed_defaults(&conn).unwrap();
    let cats = ledger::list_categories(&conn, None).unwrap();
    assert_eq!(cats.len(), 26);
    assert!(cats.iter().any(|c| c.name == "其他" && c.kind == CategoryKind::Expense));
    assert!(cats.iter().any(|c| c.name == "工资" && c.kind == CategoryKind::Income));
    let accounts = ledger::list_accounts(&conn).unwrap();
    assert_eq!(accounts.len(), 1);
    assert_eq!(accounts[0].name, "现金");
}
