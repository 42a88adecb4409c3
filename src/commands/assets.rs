// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::errors::{LedgerError, Result as LedgerResult};
use crate::ledger::{self, BalanceOp};
use crate::models::{Asset, AssetKind, Session};
use crate::utils::{current_session, maybe_print_json, pretty_table, stored_decimal};

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let session = current_session(conn)?;
            let name = sub.get_one::<String>("name").unwrap();
            let kind = parse_kind(sub.get_one::<String>("kind").unwrap())?;
            let asset = create(conn, &session, name, kind)?;
            println!("Added asset '{}' ({})", asset.name, asset.kind.as_str());
        }
        Some(("list", sub)) => {
            let session = current_session(conn)?;
            let json_flag = sub.get_flag("json");
            let jsonl_flag = sub.get_flag("jsonl");
            let assets = list(conn, &session)?;
            if !maybe_print_json(json_flag, jsonl_flag, &assets)? {
                let rows = assets
                    .iter()
                    .map(|a| {
                        vec![
                            a.id.to_string(),
                            a.name.clone(),
                            a.kind.as_str().to_string(),
                            a.balance.to_string(),
                            if a.is_active { "yes".into() } else { "no".into() },
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(&["Id", "Name", "Kind", "Balance", "Active"], rows)
                );
            }
        }
        Some(("toggle", sub)) => {
            let session = current_session(conn)?;
            let id = *sub.get_one::<i64>("id").unwrap();
            let asset = toggle(conn, &session, id)?;
            println!(
                "Asset '{}' is now {}",
                asset.name,
                if asset.is_active { "active" } else { "inactive" }
            );
        }
        Some(("rm", sub)) => {
            let session = current_session(conn)?;
            let id = *sub.get_one::<i64>("id").unwrap();
            remove(conn, &session, id)?;
            println!("Removed asset {}", id);
        }
        _ => {}
    }
    Ok(())
}

fn parse_kind(raw: &str) -> LedgerResult<AssetKind> {
    AssetKind::from_str(raw).ok_or_else(|| {
        LedgerError::validation(format!(
            "invalid kind '{}', expected savings|deposit|stock|fund|crypto|real_estate|other",
            raw
        ))
    })
}

fn row_to_asset(r: &Row<'_>) -> rusqlite::Result<(i64, i64, String, String, String, bool)> {
    Ok((
        r.get(0)?,
        r.get(1)?,
        r.get(2)?,
        r.get(3)?,
        r.get(4)?,
        r.get(5)?,
    ))
}

fn decode(raw: (i64, i64, String, String, String, bool)) -> LedgerResult<Asset> {
    let (id, user_id, name, kind_s, balance_s, is_active) = raw;
    let kind = AssetKind::from_str(&kind_s)
        .ok_or_else(|| LedgerError::corrupt(format!("asset kind '{}'", kind_s)))?;
    Ok(Asset {
        id,
        user_id,
        name,
        kind,
        balance: stored_decimal(&balance_s, "asset balance")?,
        is_active,
    })
}

pub fn fetch(conn: &Connection, user_id: i64, id: i64) -> LedgerResult<Asset> {
    let raw = conn
        .query_row(
            "SELECT id, user_id, name, kind, balance, is_active FROM assets
             WHERE id=?1 AND user_id=?2",
            params![id, user_id],
            row_to_asset,
        )
        .optional()?;
    decode(raw.ok_or(LedgerError::NotFound)?)
}

/// New assets start at balance zero; only asset transactions move it.
pub fn create(
    conn: &Connection,
    session: &Session,
    name: &str,
    kind: AssetKind,
) -> LedgerResult<Asset> {
    if name.trim().is_empty() {
        return Err(LedgerError::validation("name must not be empty"));
    }
    conn.execute(
        "INSERT INTO assets(user_id, name, kind) VALUES (?1, ?2, ?3)",
        params![session.user_id, name, kind.as_str()],
    )?;
    fetch(conn, session.user_id, conn.last_insert_rowid())
}

pub fn list(conn: &Connection, session: &Session) -> LedgerResult<Vec<Asset>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, name, kind, balance, is_active FROM assets
         WHERE user_id=?1 ORDER BY name",
    )?;
    let mut rows = stmt.query(params![session.user_id])?;
    let mut assets = Vec::new();
    while let Some(r) = rows.next()? {
        assets.push(decode(row_to_asset(r)?)?);
    }
    Ok(assets)
}

pub fn toggle(conn: &Connection, session: &Session, id: i64) -> LedgerResult<Asset> {
    fetch(conn, session.user_id, id)?;
    conn.execute(
        "UPDATE assets SET is_active = 1 - is_active WHERE id=?1 AND user_id=?2",
        params![id, session.user_id],
    )?;
    fetch(conn, session.user_id, id)
}

/// Delete an asset. Outgoing transfer counter-legs are reversed on the
/// receiving assets first, so surviving balances stay consistent with their
/// remaining rows; the schema cascade then removes this asset's transactions
/// and fixed-saving definitions.
pub fn remove(conn: &mut Connection, session: &Session, id: i64) -> LedgerResult<()> {
    let tx = conn.transaction()?;
    fetch(&tx, session.user_id, id)?;

    let mut stmt = tx.prepare(
        "SELECT amount, to_asset_id FROM asset_transactions
         WHERE user_id=?1 AND asset_id=?2 AND kind='transfer' AND to_asset_id IS NOT NULL",
    )?;
    let mut rows = stmt.query(params![session.user_id, id])?;
    let mut counter_legs = Vec::new();
    while let Some(r) = rows.next()? {
        let amount_s: String = r.get(0)?;
        let to: i64 = r.get(1)?;
        counter_legs.push((to, stored_decimal(&amount_s, "asset transaction amount")?));
    }
    drop(rows);
    drop(stmt);
    for (to, amount) in counter_legs {
        ledger::adjust_balance(&tx, session.user_id, to, BalanceOp::Subtract, amount)?;
    }

    tx.execute(
        "DELETE FROM assets WHERE id=?1 AND user_id=?2",
        params![id, session.user_id],
    )?;
    tx.commit()?;
    Ok(())
}
