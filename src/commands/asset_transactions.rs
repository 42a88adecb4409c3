// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use chrono::{Local, NaiveDate};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::errors::{LedgerError, Result as LedgerResult};
use crate::ledger;
use crate::models::{
    AssetTransaction, AssetTransactionPatch, AssetTxKind, NewAssetTransaction, Session,
};
use crate::utils::{
    current_session, maybe_print_json, parse_date, parse_decimal, pretty_table, stored_date,
    stored_decimal,
};
use rust_decimal::Decimal;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("edit", sub)) => edit(conn, sub)?,
        Some(("rm", sub)) => rm(conn, sub)?,
        Some(("list", sub)) => list_cmd(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn add(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let session = current_session(conn)?;
    let kind = parse_kind(sub.get_one::<String>("kind").unwrap())?;
    let input = NewAssetTransaction {
        asset_id: *sub.get_one::<i64>("asset").unwrap(),
        kind,
        amount: parse_decimal(sub.get_one::<String>("amount").unwrap())?,
        date: parse_date(sub.get_one::<String>("date").unwrap())?,
        memo: sub.get_one::<String>("memo").cloned(),
        to_asset_id: sub.get_one::<i64>("to").copied(),
    };
    let record = create(conn, &session, &input)?;
    println!(
        "Recorded {} {} on {} (asset {})",
        record.kind.as_str(),
        record.amount,
        record.date,
        record.asset_id
    );
    Ok(())
}

fn edit(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let session = current_session(conn)?;
    let id = *sub.get_one::<i64>("id").unwrap();
    let patch = AssetTransactionPatch {
        asset_id: sub.get_one::<i64>("asset").copied(),
        kind: match sub.get_one::<String>("kind") {
            Some(raw) => Some(parse_kind(raw)?),
            None => None,
        },
        amount: match sub.get_one::<String>("amount") {
            Some(raw) => Some(parse_decimal(raw)?),
            None => None,
        },
        date: match sub.get_one::<String>("date") {
            Some(raw) => Some(parse_date(raw)?),
            None => None,
        },
        memo: sub.get_one::<String>("memo").cloned(),
        to_asset_id: sub.get_one::<i64>("to").copied(),
    };
    let record = update(conn, &session, id, &patch)?;
    println!("Updated asset transaction {}", record.id);
    Ok(())
}

fn rm(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let session = current_session(conn)?;
    let id = *sub.get_one::<i64>("id").unwrap();
    remove(conn, &session, id)?;
    println!("Removed asset transaction {}", id);
    Ok(())
}

fn list_cmd(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let session = current_session(conn)?;
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let asset_id = sub.get_one::<i64>("asset").copied();
    let today = Local::now().date_naive();
    let records = list(conn, &session, asset_id, today)?;
    if !maybe_print_json(json_flag, jsonl_flag, &records)? {
        let rows = records
            .iter()
            .map(|r| {
                vec![
                    r.id.to_string(),
                    r.date.to_string(),
                    r.asset_id.to_string(),
                    r.kind.as_str().to_string(),
                    r.amount.to_string(),
                    r.to_asset_id.map(|t| t.to_string()).unwrap_or_default(),
                    if r.is_fixed { "yes".into() } else { String::new() },
                    r.memo.clone().unwrap_or_default(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["Id", "Date", "Asset", "Kind", "Amount", "To", "Fixed", "Memo"],
                rows,
            )
        );
    }
    Ok(())
}

fn parse_kind(raw: &str) -> LedgerResult<AssetTxKind> {
    AssetTxKind::from_str(raw).ok_or_else(|| {
        LedgerError::validation(format!(
            "invalid kind '{}', expected deposit|withdraw|profit|loss|transfer",
            raw
        ))
    })
}

fn row_to_record(r: &Row<'_>) -> rusqlite::Result<(i64, i64, i64, String, String, String, Option<String>, bool, Option<i64>, Option<i64>)> {
    Ok((
        r.get(0)?,
        r.get(1)?,
        r.get(2)?,
        r.get(3)?,
        r.get(4)?,
        r.get(5)?,
        r.get(6)?,
        r.get(7)?,
        r.get(8)?,
        r.get(9)?,
    ))
}

fn decode(
    raw: (i64, i64, i64, String, String, String, Option<String>, bool, Option<i64>, Option<i64>),
) -> LedgerResult<AssetTransaction> {
    let (id, user_id, asset_id, kind_s, amount_s, date_s, memo, is_fixed, to_asset_id, fixed_saving_id) =
        raw;
    let kind = AssetTxKind::from_str(&kind_s)
        .ok_or_else(|| LedgerError::corrupt(format!("asset transaction kind '{}'", kind_s)))?;
    Ok(AssetTransaction {
        id,
        user_id,
        asset_id,
        kind,
        amount: stored_decimal(&amount_s, "asset transaction amount")?,
        date: stored_date(&date_s, "asset transaction date")?,
        memo,
        is_fixed,
        to_asset_id,
        fixed_saving_id,
    })
}

const SELECT_COLS: &str = "id, user_id, asset_id, kind, amount, date, memo, is_fixed, \
                           to_asset_id, fixed_saving_id";

fn fetch(conn: &Connection, user_id: i64, id: i64) -> LedgerResult<AssetTransaction> {
    let raw = conn
        .query_row(
            &format!(
                "SELECT {} FROM asset_transactions WHERE id=?1 AND user_id=?2",
                SELECT_COLS
            ),
            params![id, user_id],
            row_to_record,
        )
        .optional()?;
    decode(raw.ok_or(LedgerError::NotFound)?)
}

pub fn ensure_asset(conn: &Connection, user_id: i64, asset_id: i64) -> LedgerResult<()> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT id FROM assets WHERE id=?1 AND user_id=?2",
            params![asset_id, user_id],
            |r| r.get(0),
        )
        .optional()?;
    found.map(|_| ()).ok_or(LedgerError::NotFound)
}

fn validate_shape(
    kind: AssetTxKind,
    amount: Decimal,
    asset_id: i64,
    to_asset_id: Option<i64>,
) -> LedgerResult<()> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::validation("amount must be positive"));
    }
    if kind == AssetTxKind::Transfer {
        let to = to_asset_id
            .ok_or_else(|| LedgerError::validation("transfer requires a target asset"))?;
        if to == asset_id {
            return Err(LedgerError::validation("cannot transfer an asset to itself"));
        }
    } else if to_asset_id.is_some() {
        return Err(LedgerError::validation(
            "target asset is only valid for transfers",
        ));
    }
    Ok(())
}

/// Insert a record and apply its balance effect in one atomic batch.
pub fn create(
    conn: &mut Connection,
    session: &Session,
    input: &NewAssetTransaction,
) -> LedgerResult<AssetTransaction> {
    validate_shape(input.kind, input.amount, input.asset_id, input.to_asset_id)?;

    let tx = conn.transaction()?;
    ensure_asset(&tx, session.user_id, input.asset_id)?;
    if let Some(to) = input.to_asset_id {
        ensure_asset(&tx, session.user_id, to)?;
    }
    tx.execute(
        "INSERT INTO asset_transactions(user_id, asset_id, kind, amount, date, memo, to_asset_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            session.user_id,
            input.asset_id,
            input.kind.as_str(),
            input.amount.to_string(),
            input.date.to_string(),
            input.memo,
            input.to_asset_id
        ],
    )?;
    let id = tx.last_insert_rowid();
    ledger::apply_effect(
        &tx,
        session.user_id,
        input.asset_id,
        input.kind,
        input.amount,
        input.to_asset_id,
    )?;
    let record = fetch(&tx, session.user_id, id)?;
    tx.commit()?;
    Ok(record)
}

/// Rewrite a record under the reverse-then-reapply rule: fully undo the old
/// balance effect, write the merged fields, apply the new effect. Amount,
/// kind, and both asset references may all change in one call.
pub fn update(
    conn: &mut Connection,
    session: &Session,
    id: i64,
    patch: &AssetTransactionPatch,
) -> LedgerResult<AssetTransaction> {
    let tx = conn.transaction()?;
    let existing = fetch(&tx, session.user_id, id)?;
    if existing.is_fixed {
        return Err(LedgerError::permission(
            "system-generated records are immutable",
        ));
    }

    let kind = patch.kind.unwrap_or(existing.kind);
    let amount = patch.amount.unwrap_or(existing.amount);
    let asset_id = patch.asset_id.unwrap_or(existing.asset_id);
    let date = patch.date.unwrap_or(existing.date);
    let memo = patch.memo.clone().or_else(|| existing.memo.clone());
    let to_asset_id = if kind == AssetTxKind::Transfer {
        patch.to_asset_id.or(existing.to_asset_id)
    } else {
        None
    };
    validate_shape(kind, amount, asset_id, to_asset_id)?;
    ensure_asset(&tx, session.user_id, asset_id)?;
    if let Some(to) = to_asset_id {
        ensure_asset(&tx, session.user_id, to)?;
    }

    ledger::revert_effect(
        &tx,
        session.user_id,
        existing.asset_id,
        existing.kind,
        existing.amount,
        existing.to_asset_id,
    )?;
    tx.execute(
        "UPDATE asset_transactions
         SET asset_id=?1, kind=?2, amount=?3, date=?4, memo=?5, to_asset_id=?6
         WHERE id=?7 AND user_id=?8",
        params![
            asset_id,
            kind.as_str(),
            amount.to_string(),
            date.to_string(),
            memo,
            to_asset_id,
            id,
            session.user_id
        ],
    )?;
    ledger::apply_effect(&tx, session.user_id, asset_id, kind, amount, to_asset_id)?;
    let record = fetch(&tx, session.user_id, id)?;
    tx.commit()?;
    Ok(record)
}

/// Undo the record's balance effect and delete it, atomically.
pub fn remove(conn: &mut Connection, session: &Session, id: i64) -> LedgerResult<()> {
    let tx = conn.transaction()?;
    let existing = fetch(&tx, session.user_id, id)?;
    if existing.is_fixed {
        return Err(LedgerError::permission(
            "system-generated records are immutable",
        ));
    }
    ledger::revert_effect(
        &tx,
        session.user_id,
        existing.asset_id,
        existing.kind,
        existing.amount,
        existing.to_asset_id,
    )?;
    tx.execute(
        "DELETE FROM asset_transactions WHERE id=?1 AND user_id=?2",
        params![id, session.user_id],
    )?;
    tx.commit()?;
    Ok(())
}

/// Records dated on or before `today`; rows generated ahead of schedule stay
/// hidden until their date arrives.
pub fn list(
    conn: &Connection,
    session: &Session,
    asset_id: Option<i64>,
    today: NaiveDate,
) -> LedgerResult<Vec<AssetTransaction>> {
    let mut sql = format!(
        "SELECT {} FROM asset_transactions WHERE user_id=?1 AND date<=?2",
        SELECT_COLS
    );
    if let Some(aid) = asset_id {
        ensure_asset(conn, session.user_id, aid)?;
        sql.push_str(" AND asset_id=?3");
    }
    sql.push_str(" ORDER BY date DESC, id DESC");

    let mut stmt = conn.prepare(&sql)?;
    let mut records = Vec::new();
    let today_s = today.to_string();
    if let Some(aid) = asset_id {
        let mut rows = stmt.query(params![session.user_id, today_s, aid])?;
        while let Some(r) = rows.next()? {
            records.push(decode(row_to_record(r)?)?);
        }
    } else {
        let mut rows = stmt.query(params![session.user_id, today_s])?;
        while let Some(r) = rows.next()? {
            records.push(decode(row_to_record(r)?)?);
        }
    }
    Ok(records)
}
