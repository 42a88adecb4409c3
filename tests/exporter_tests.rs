// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use moneybook::{cli, commands::exporter, db};
use rusqlite::Connection;
use serde_json::json;
use tempfile::tempdir;

fn base_conn() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    db::init_schema(&mut conn).unwrap();
    conn.execute("INSERT INTO users(name) VALUES('alice')", [])
        .unwrap();
    conn.execute(
        "INSERT INTO settings(key, value) VALUES('current_user', 'alice')",
        [],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO categories(user_id, name, kind) VALUES (1, 'Groceries', 'expense')",
        [],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO transactions(user_id, kind, title, amount, date, category_id, memo) VALUES \
        (1, 'expense', 'Corner Shop', '12.34', '2025-01-02', 1, 'Weekly run')",
        [],
    )
    .unwrap();
    conn
}

#[test]
fn export_transactions_streams_pretty_json() {
    let conn = base_conn();
    let dir = tempdir().unwrap();
    let out_path = dir.path().join("export.json");
    let out_str = out_path.to_string_lossy().to_string();

    let cli = cli::build_cli();
    let matches = cli.get_matches_from([
        "moneybook",
        "export",
        "transactions",
        "--format",
        "json",
        "--out",
        &out_str,
    ]);
    if let Some(("export", export_m)) = matches.subcommand() {
        exporter::handle(&conn, export_m).unwrap();
    } else {
        panic!("no export subcommand");
    }

    let contents = std::fs::read_to_string(&out_path).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&contents).unwrap();
    assert_eq!(
        parsed,
        json!([
            {
                "date": "2025-01-02",
                "kind": "expense",
                "title": "Corner Shop",
                "amount": "12.34",
                "category": "Groceries",
                "memo": "Weekly run",
                "fixed": false
            }
        ])
    );
}

#[test]
fn export_transactions_writes_csv_for_the_current_user_only() {
    let conn = base_conn();
    conn.execute("INSERT INTO users(name) VALUES('bob')", [])
        .unwrap();
    conn.execute(
        "INSERT INTO transactions(user_id, kind, title, amount, date) VALUES \
        (2, 'income', 'Not yours', '999', '2025-01-03')",
        [],
    )
    .unwrap();

    let dir = tempdir().unwrap();
    let out_path = dir.path().join("export.csv");
    let out_str = out_path.to_string_lossy().to_string();

    let cli = cli::build_cli();
    let matches = cli.get_matches_from([
        "moneybook",
        "export",
        "transactions",
        "--format",
        "csv",
        "--out",
        &out_str,
    ]);
    if let Some(("export", export_m)) = matches.subcommand() {
        exporter::handle(&conn, export_m).unwrap();
    } else {
        panic!("no export subcommand");
    }

    let contents = std::fs::read_to_string(&out_path).unwrap();
    let mut lines = contents.lines();
    assert_eq!(
        lines.next().unwrap(),
        "date,kind,title,amount,category,memo,fixed"
    );
    assert_eq!(
        lines.next().unwrap(),
        "2025-01-02,expense,Corner Shop,12.34,Groceries,Weekly run,0"
    );
    assert_eq!(lines.next(), None);
}

#[test]
fn export_asset_transactions_joins_asset_names() {
    let conn = base_conn();
    conn.execute(
        "INSERT INTO assets(user_id, name, kind, balance) VALUES (1, 'Pot', 'savings', '40')",
        [],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO asset_transactions(user_id, asset_id, kind, amount, date) VALUES \
        (1, 1, 'deposit', '40', '2025-01-05')",
        [],
    )
    .unwrap();

    let dir = tempdir().unwrap();
    let out_path = dir.path().join("atx.json");
    let out_str = out_path.to_string_lossy().to_string();

    let cli = cli::build_cli();
    let matches = cli.get_matches_from([
        "moneybook",
        "export",
        "asset-transactions",
        "--format",
        "json",
        "--out",
        &out_str,
    ]);
    if let Some(("export", export_m)) = matches.subcommand() {
        exporter::handle(&conn, export_m).unwrap();
    } else {
        panic!("no export subcommand");
    }

    let contents = std::fs::read_to_string(&out_path).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&contents).unwrap();
    assert_eq!(
        parsed,
        json!([
            {
                "date": "2025-01-05",
                "asset": "Pot",
                "kind": "deposit",
                "amount": "40",
                "to_asset": null,
                "memo": null,
                "fixed": false
            }
        ])
    );
}
