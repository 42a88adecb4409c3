// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use chrono::{Local, NaiveDate};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::errors::{LedgerError, Result as LedgerResult};
use crate::ledger::{self, BalanceOp};
use crate::models::{FixedSaving, FixedSavingPatch, NewFixedSaving, Session};
use crate::schedule;
use crate::utils::{
    current_session, maybe_print_json, parse_decimal, pretty_table, stored_decimal,
};
use rust_decimal::Decimal;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("edit", sub)) => edit(conn, sub)?,
        Some(("rm", sub)) => rm(conn, sub)?,
        Some(("toggle", sub)) => toggle_cmd(conn, sub)?,
        Some(("list", sub)) => list_cmd(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn add(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let session = current_session(conn)?;
    let input = NewFixedSaving {
        title: sub.get_one::<String>("title").unwrap().clone(),
        amount: parse_decimal(sub.get_one::<String>("amount").unwrap())?,
        scheduled_day: *sub.get_one::<u32>("day").unwrap(),
        asset_id: *sub.get_one::<i64>("asset").unwrap(),
        start_month: sub.get_one::<String>("start").unwrap().clone(),
        end_month: sub.get_one::<String>("end").unwrap().clone(),
    };
    let def = create(conn, &session, &input)?;
    println!(
        "Added fixed saving '{}' ({} monthly on day {} into asset {}, {}..{})",
        def.title, def.amount, def.scheduled_day, def.asset_id, def.start_month, def.end_month
    );
    Ok(())
}

fn edit(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let session = current_session(conn)?;
    let id = *sub.get_one::<i64>("id").unwrap();
    let patch = FixedSavingPatch {
        title: sub.get_one::<String>("title").cloned(),
        amount: match sub.get_one::<String>("amount") {
            Some(raw) => Some(parse_decimal(raw)?),
            None => None,
        },
        scheduled_day: sub.get_one::<u32>("day").copied(),
        asset_id: sub.get_one::<i64>("asset").copied(),
        start_month: sub.get_one::<String>("start").cloned(),
        end_month: sub.get_one::<String>("end").cloned(),
    };
    let today = Local::now().date_naive();
    let def = update(conn, &session, id, &patch, today)?;
    println!("Updated fixed saving {}", def.id);
    Ok(())
}

fn rm(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let session = current_session(conn)?;
    let id = *sub.get_one::<i64>("id").unwrap();
    let today = Local::now().date_naive();
    remove(conn, &session, id, today)?;
    println!("Removed fixed saving {}", id);
    Ok(())
}

fn toggle_cmd(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let session = current_session(conn)?;
    let id = *sub.get_one::<i64>("id").unwrap();
    let today = Local::now().date_naive();
    let def = toggle(conn, &session, id, today)?;
    println!(
        "Fixed saving {} is now {}",
        def.id,
        if def.is_active { "active" } else { "inactive" }
    );
    Ok(())
}

fn list_cmd(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let session = current_session(conn)?;
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let defs = list(conn, &session)?;
    if !maybe_print_json(json_flag, jsonl_flag, &defs)? {
        let rows = defs
            .iter()
            .map(|d| {
                vec![
                    d.id.to_string(),
                    d.title.clone(),
                    d.amount.to_string(),
                    d.scheduled_day.to_string(),
                    d.asset_id.to_string(),
                    format!("{}..{}", d.start_month, d.end_month),
                    if d.is_active { "yes".into() } else { "no".into() },
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["Id", "Title", "Amount", "Day", "Asset", "Range", "Active"],
                rows
            )
        );
    }
    Ok(())
}

const SELECT_COLS: &str = "id, user_id, title, amount, scheduled_day, asset_id, is_active, \
                           start_month, end_month, last_generated_month";

fn row_to_def(
    r: &Row<'_>,
) -> rusqlite::Result<(i64, i64, String, String, u32, i64, bool, String, String, Option<String>)> {
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
    raw: (i64, i64, String, String, u32, i64, bool, String, String, Option<String>),
) -> LedgerResult<FixedSaving> {
    let (id, user_id, title, amount_s, scheduled_day, asset_id, is_active, start_month, end_month, last_generated_month) =
        raw;
    Ok(FixedSaving {
        id,
        user_id,
        title,
        amount: stored_decimal(&amount_s, "fixed saving amount")?,
        scheduled_day,
        asset_id,
        is_active,
        start_month,
        end_month,
        last_generated_month,
    })
}

fn fetch(conn: &Connection, user_id: i64, id: i64) -> LedgerResult<FixedSaving> {
    let raw = conn
        .query_row(
            &format!(
                "SELECT {} FROM fixed_savings WHERE id=?1 AND user_id=?2",
                SELECT_COLS
            ),
            params![id, user_id],
            row_to_def,
        )
        .optional()?;
    decode(raw.ok_or(LedgerError::NotFound)?)
}

/// Generate one deposit per date into the target asset, each adjusting the
/// balance like a user-entered deposit. Dates before `min_date` are skipped.
fn insert_rows(
    conn: &Connection,
    user_id: i64,
    def_id: i64,
    asset_id: i64,
    title: &str,
    amount: Decimal,
    dates: &[NaiveDate],
    min_date: Option<NaiveDate>,
) -> LedgerResult<()> {
    for date in dates {
        if let Some(min) = min_date {
            if *date < min {
                continue;
            }
        }
        conn.execute(
            "INSERT INTO asset_transactions(user_id, asset_id, kind, amount, date, memo,
                                            is_fixed, fixed_saving_id)
             VALUES (?1, ?2, 'deposit', ?3, ?4, ?5, 1, ?6)",
            params![
                user_id,
                asset_id,
                amount.to_string(),
                date.to_string(),
                title,
                def_id
            ],
        )?;
        ledger::adjust_balance(conn, user_id, asset_id, BalanceOp::Add, amount)?;
    }
    Ok(())
}

/// Delete generated rows dated `today` or later, reversing each row's own
/// balance effect. Row amounts are read back rather than taken from the
/// definition, since the definition amount may have changed since they were
/// generated.
fn delete_future_rows(
    conn: &Connection,
    user_id: i64,
    def_id: i64,
    today: NaiveDate,
) -> LedgerResult<()> {
    let mut stmt = conn.prepare(
        "SELECT id, asset_id, amount FROM asset_transactions
         WHERE user_id=?1 AND fixed_saving_id=?2 AND date>=?3",
    )?;
    let mut rows = stmt.query(params![user_id, def_id, today.to_string()])?;
    let mut doomed: Vec<(i64, i64, Decimal)> = Vec::new();
    while let Some(r) = rows.next()? {
        let id: i64 = r.get(0)?;
        let asset_id: i64 = r.get(1)?;
        let amount_s: String = r.get(2)?;
        doomed.push((id, asset_id, stored_decimal(&amount_s, "fixed saving amount")?));
    }
    drop(rows);
    drop(stmt);
    for (id, asset_id, amount) in doomed {
        ledger::adjust_balance(conn, user_id, asset_id, BalanceOp::Subtract, amount)?;
        conn.execute(
            "DELETE FROM asset_transactions WHERE id=?1 AND user_id=?2",
            params![id, user_id],
        )?;
    }
    Ok(())
}

fn validate_amount(amount: Decimal) -> LedgerResult<()> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::validation("amount must be positive"));
    }
    Ok(())
}

/// Insert the definition and generate one deposit for every covered month,
/// as one atomic batch.
pub fn create(
    conn: &mut Connection,
    session: &Session,
    input: &NewFixedSaving,
) -> LedgerResult<FixedSaving> {
    validate_amount(input.amount)?;
    if input.title.trim().is_empty() {
        return Err(LedgerError::validation("title must not be empty"));
    }
    let dates = schedule::expand(&input.start_month, &input.end_month, input.scheduled_day)?;

    let tx = conn.transaction()?;
    super::asset_transactions::ensure_asset(&tx, session.user_id, input.asset_id)?;
    tx.execute(
        "INSERT INTO fixed_savings(user_id, title, amount, scheduled_day, asset_id,
                                   is_active, start_month, end_month, last_generated_month)
         VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6, ?7, ?7)",
        params![
            session.user_id,
            input.title,
            input.amount.to_string(),
            input.scheduled_day,
            input.asset_id,
            input.start_month,
            input.end_month
        ],
    )?;
    let id = tx.last_insert_rowid();
    insert_rows(
        &tx,
        session.user_id,
        id,
        input.asset_id,
        &input.title,
        input.amount,
        &dates,
        None,
    )?;
    let def = fetch(&tx, session.user_id, id)?;
    tx.commit()?;
    Ok(def)
}

/// Replace future generated deposits with ones matching the merged
/// definition; elapsed deposits keep their recorded amounts and balances.
pub fn update(
    conn: &mut Connection,
    session: &Session,
    id: i64,
    patch: &FixedSavingPatch,
    today: NaiveDate,
) -> LedgerResult<FixedSaving> {
    let tx = conn.transaction()?;
    let existing = fetch(&tx, session.user_id, id)?;

    let title = patch.title.clone().unwrap_or_else(|| existing.title.clone());
    let amount = patch.amount.unwrap_or(existing.amount);
    let scheduled_day = patch.scheduled_day.unwrap_or(existing.scheduled_day);
    let asset_id = patch.asset_id.unwrap_or(existing.asset_id);
    let start_month = patch
        .start_month
        .clone()
        .unwrap_or_else(|| existing.start_month.clone());
    let end_month = patch
        .end_month
        .clone()
        .unwrap_or_else(|| existing.end_month.clone());

    validate_amount(amount)?;
    if title.trim().is_empty() {
        return Err(LedgerError::validation("title must not be empty"));
    }
    let dates = schedule::expand(&start_month, &end_month, scheduled_day)?;
    super::asset_transactions::ensure_asset(&tx, session.user_id, asset_id)?;

    delete_future_rows(&tx, session.user_id, id, today)?;
    tx.execute(
        "UPDATE fixed_savings
         SET title=?1, amount=?2, scheduled_day=?3, asset_id=?4, start_month=?5, end_month=?6
         WHERE id=?7 AND user_id=?8",
        params![
            title,
            amount.to_string(),
            scheduled_day,
            asset_id,
            start_month,
            end_month,
            id,
            session.user_id
        ],
    )?;
    if existing.is_active {
        insert_rows(
            &tx,
            session.user_id,
            id,
            asset_id,
            &title,
            amount,
            &dates,
            Some(today),
        )?;
        tx.execute(
            "UPDATE fixed_savings SET last_generated_month=?1 WHERE id=?2 AND user_id=?3",
            params![end_month, id, session.user_id],
        )?;
    }
    let def = fetch(&tx, session.user_id, id)?;
    tx.commit()?;
    Ok(def)
}

/// Delete future generated deposits (reversing their balance effects), then
/// the definition itself.
pub fn remove(
    conn: &mut Connection,
    session: &Session,
    id: i64,
    today: NaiveDate,
) -> LedgerResult<()> {
    let tx = conn.transaction()?;
    fetch(&tx, session.user_id, id)?;
    delete_future_rows(&tx, session.user_id, id, today)?;
    tx.execute(
        "DELETE FROM fixed_savings WHERE id=?1 AND user_id=?2",
        params![id, session.user_id],
    )?;
    tx.commit()?;
    Ok(())
}

/// Deactivating deletes future deposits; reactivating regenerates
/// today-or-later deposits from the stored range.
pub fn toggle(
    conn: &mut Connection,
    session: &Session,
    id: i64,
    today: NaiveDate,
) -> LedgerResult<FixedSaving> {
    let tx = conn.transaction()?;
    let existing = fetch(&tx, session.user_id, id)?;
    if existing.is_active {
        delete_future_rows(&tx, session.user_id, id, today)?;
        tx.execute(
            "UPDATE fixed_savings SET is_active=0 WHERE id=?1 AND user_id=?2",
            params![id, session.user_id],
        )?;
    } else {
        let dates = schedule::expand(
            &existing.start_month,
            &existing.end_month,
            existing.scheduled_day,
        )?;
        tx.execute(
            "UPDATE fixed_savings SET is_active=1, last_generated_month=?1
             WHERE id=?2 AND user_id=?3",
            params![existing.end_month, id, session.user_id],
        )?;
        insert_rows(
            &tx,
            session.user_id,
            id,
            existing.asset_id,
            &existing.title,
            existing.amount,
            &dates,
            Some(today),
        )?;
    }
    let def = fetch(&tx, session.user_id, id)?;
    tx.commit()?;
    Ok(def)
}

pub fn list(conn: &Connection, session: &Session) -> LedgerResult<Vec<FixedSaving>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM fixed_savings WHERE user_id=?1 ORDER BY id",
        SELECT_COLS
    ))?;
    let mut rows = stmt.query(params![session.user_id])?;
    let mut defs = Vec::new();
    while let Some(r) = rows.next()? {
        defs.push(decode(row_to_def(r)?)?);
    }
    Ok(defs)
}
