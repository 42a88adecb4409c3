// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use moneybook::commands::{asset_transactions, assets, fixed_savings};
use moneybook::db;
use moneybook::errors::LedgerError;
use moneybook::models::{
    AssetKind, AssetTransactionPatch, FixedSavingPatch, NewFixedSaving, Session,
};
use rusqlite::Connection;
use rust_decimal::Decimal;

fn setup() -> (Connection, Session, i64) {
    let mut conn = Connection::open_in_memory().unwrap();
    db::init_schema(&mut conn).unwrap();
    conn.execute("INSERT INTO users(name) VALUES('alice')", [])
        .unwrap();
    let session = Session {
        user_id: conn.last_insert_rowid(),
    };
    let asset = assets::create(&conn, &session, "Savings pot", AssetKind::Savings)
        .unwrap()
        .id;
    (conn, session, asset)
}

fn d(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn def(asset_id: i64, amount: &str, day: u32, start: &str, end: &str) -> NewFixedSaving {
    NewFixedSaving {
        title: "Monthly saving".to_string(),
        amount: amount.parse().unwrap(),
        scheduled_day: day,
        asset_id,
        start_month: start.to_string(),
        end_month: end.to_string(),
    }
}

fn balance(conn: &Connection, asset_id: i64) -> Decimal {
    let s: String = conn
        .query_row("SELECT balance FROM assets WHERE id=?1", [asset_id], |r| {
            r.get(0)
        })
        .unwrap();
    s.parse().unwrap()
}

fn generated_dates(conn: &Connection, def_id: i64) -> Vec<String> {
    let mut stmt = conn
        .prepare("SELECT date FROM asset_transactions WHERE fixed_saving_id=?1 ORDER BY date")
        .unwrap();
    let rows = stmt.query_map([def_id], |r| r.get::<_, String>(0)).unwrap();
    rows.map(|r| r.unwrap()).collect()
}

#[test]
fn create_generates_deposits_and_funds_the_asset() {
    let (mut conn, session, asset) = setup();
    let fs = fixed_savings::create(
        &mut conn,
        &session,
        &def(asset, "200", 5, "2025-01", "2025-04"),
    )
    .unwrap();

    assert_eq!(
        generated_dates(&conn, fs.id),
        vec!["2025-01-05", "2025-02-05", "2025-03-05", "2025-04-05"]
    );
    assert_eq!(balance(&conn, asset), dec("800"));

    let (kind, is_fixed): (String, bool) = conn
        .query_row(
            "SELECT kind, is_fixed FROM asset_transactions WHERE fixed_saving_id=?1 LIMIT 1",
            [fs.id],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .unwrap();
    assert_eq!(kind, "deposit");
    assert!(is_fixed);
}

#[test]
fn unknown_asset_is_rejected_without_partial_state() {
    let (mut conn, session, _) = setup();
    let err = fixed_savings::create(
        &mut conn,
        &session,
        &def(9999, "200", 5, "2025-01", "2025-04"),
    )
    .unwrap_err();
    assert!(matches!(err, LedgerError::NotFound));
    let defs: i64 = conn
        .query_row("SELECT COUNT(*) FROM fixed_savings", [], |r| r.get(0))
        .unwrap();
    assert_eq!(defs, 0);
}

#[test]
fn amount_change_replaces_future_deposits_and_rebalances() {
    let (mut conn, session, asset) = setup();
    let fs = fixed_savings::create(
        &mut conn,
        &session,
        &def(asset, "100", 10, "2025-01", "2025-04"),
    )
    .unwrap();
    assert_eq!(balance(&conn, asset), dec("400"));

    let today = d("2025-02-15");
    let patch = FixedSavingPatch {
        amount: Some(dec("150")),
        ..Default::default()
    };
    fixed_savings::update(&mut conn, &session, fs.id, &patch, today).unwrap();

    // Two elapsed deposits at 100, two regenerated at 150.
    assert_eq!(balance(&conn, asset), dec("500"));
    let amounts: Vec<String> = conn
        .prepare("SELECT amount FROM asset_transactions WHERE fixed_saving_id=?1 ORDER BY date")
        .unwrap()
        .query_map([fs.id], |r| r.get::<_, String>(0))
        .unwrap()
        .map(|r| r.unwrap())
        .collect();
    assert_eq!(amounts, vec!["100", "100", "150", "150"]);
}

#[test]
fn retargeting_moves_future_deposits_to_the_new_asset() {
    let (mut conn, session, asset) = setup();
    let other = assets::create(&conn, &session, "New pot", AssetKind::Deposit)
        .unwrap()
        .id;
    let fs = fixed_savings::create(
        &mut conn,
        &session,
        &def(asset, "100", 10, "2025-01", "2025-04"),
    )
    .unwrap();

    let today = d("2025-02-15");
    let patch = FixedSavingPatch {
        asset_id: Some(other),
        ..Default::default()
    };
    fixed_savings::update(&mut conn, &session, fs.id, &patch, today).unwrap();

    assert_eq!(balance(&conn, asset), dec("200"));
    assert_eq!(balance(&conn, other), dec("200"));
}

#[test]
fn toggle_unwinds_and_regenerates_future_deposits() {
    let (mut conn, session, asset) = setup();
    let fs = fixed_savings::create(
        &mut conn,
        &session,
        &def(asset, "50", 1, "2025-01", "2025-06"),
    )
    .unwrap();
    assert_eq!(balance(&conn, asset), dec("300"));

    let today = d("2025-03-15");
    let off = fixed_savings::toggle(&mut conn, &session, fs.id, today).unwrap();
    assert!(!off.is_active);
    assert_eq!(
        generated_dates(&conn, fs.id),
        vec!["2025-01-01", "2025-02-01", "2025-03-01"]
    );
    assert_eq!(balance(&conn, asset), dec("150"));

    let on = fixed_savings::toggle(&mut conn, &session, fs.id, today).unwrap();
    assert!(on.is_active);
    assert_eq!(balance(&conn, asset), dec("300"));
}

#[test]
fn remove_keeps_elapsed_deposits_and_their_balance() {
    let (mut conn, session, asset) = setup();
    let fs = fixed_savings::create(
        &mut conn,
        &session,
        &def(asset, "50", 1, "2025-01", "2025-06"),
    )
    .unwrap();
    let today = d("2025-04-15");

    fixed_savings::remove(&mut conn, &session, fs.id, today).unwrap();
    let defs: i64 = conn
        .query_row("SELECT COUNT(*) FROM fixed_savings", [], |r| r.get(0))
        .unwrap();
    assert_eq!(defs, 0);
    assert_eq!(balance(&conn, asset), dec("200"));

    let remaining: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM asset_transactions WHERE is_fixed=1",
            [],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(remaining, 4);
}

#[test]
fn generated_deposits_resist_direct_edits() {
    let (mut conn, session, asset) = setup();
    let fs = fixed_savings::create(
        &mut conn,
        &session,
        &def(asset, "50", 1, "2025-01", "2025-02"),
    )
    .unwrap();
    let row_id: i64 = conn
        .query_row(
            "SELECT id FROM asset_transactions WHERE fixed_saving_id=?1 ORDER BY date LIMIT 1",
            [fs.id],
            |r| r.get(0),
        )
        .unwrap();

    let patch = AssetTransactionPatch {
        amount: Some(dec("9999")),
        ..Default::default()
    };
    let err = asset_transactions::update(&mut conn, &session, row_id, &patch).unwrap_err();
    assert!(matches!(err, LedgerError::Permission(_)));
    let err = asset_transactions::remove(&mut conn, &session, row_id).unwrap_err();
    assert!(matches!(err, LedgerError::Permission(_)));
    assert_eq!(balance(&conn, asset), dec("100"));
}

#[test]
fn future_generated_deposits_stay_out_of_the_listing() {
    let (mut conn, session, asset) = setup();
    fixed_savings::create(
        &mut conn,
        &session,
        &def(asset, "50", 1, "2025-01", "2025-12"),
    )
    .unwrap();

    let today = d("2025-03-10");
    let listed = asset_transactions::list(&conn, &session, Some(asset), today).unwrap();
    let dates: Vec<String> = listed.iter().map(|r| r.date.to_string()).collect();
    assert_eq!(dates, vec!["2025-03-01", "2025-02-01", "2025-01-01"]);
    // The balance still carries the full generated range.
    assert_eq!(balance(&conn, asset), dec("600"));
}

#[test]
fn deleting_the_asset_cascades_to_its_fixed_savings() {
    let (mut conn, session, asset) = setup();
    fixed_savings::create(
        &mut conn,
        &session,
        &def(asset, "50", 1, "2025-01", "2025-06"),
    )
    .unwrap();

    assets::remove(&mut conn, &session, asset).unwrap();
    let defs: i64 = conn
        .query_row("SELECT COUNT(*) FROM fixed_savings", [], |r| r.get(0))
        .unwrap();
    let rows: i64 = conn
        .query_row("SELECT COUNT(*) FROM asset_transactions", [], |r| r.get(0))
        .unwrap();
    assert_eq!((defs, rows), (0, 0));
}
