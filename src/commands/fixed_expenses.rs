// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use chrono::{Local, NaiveDate};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::errors::{LedgerError, Result as LedgerResult};
use crate::models::{FixedExpense, FixedExpensePatch, NewFixedExpense, Session};
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
    let input = NewFixedExpense {
        title: sub.get_one::<String>("title").unwrap().clone(),
        amount: parse_decimal(sub.get_one::<String>("amount").unwrap())?,
        scheduled_day: *sub.get_one::<u32>("day").unwrap(),
        category_id: sub.get_one::<i64>("category").copied(),
        start_month: sub.get_one::<String>("start").unwrap().clone(),
        end_month: sub.get_one::<String>("end").unwrap().clone(),
    };
    let def = create(conn, &session, &input)?;
    println!(
        "Added fixed expense '{}' ({} monthly on day {}, {}..{})",
        def.title, def.amount, def.scheduled_day, def.start_month, def.end_month
    );
    Ok(())
}

fn edit(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let session = current_session(conn)?;
    let id = *sub.get_one::<i64>("id").unwrap();
    let patch = FixedExpensePatch {
        title: sub.get_one::<String>("title").cloned(),
        amount: match sub.get_one::<String>("amount") {
            Some(raw) => Some(parse_decimal(raw)?),
            None => None,
        },
        scheduled_day: sub.get_one::<u32>("day").copied(),
        category_id: sub.get_one::<i64>("category").copied(),
        start_month: sub.get_one::<String>("start").cloned(),
        end_month: sub.get_one::<String>("end").cloned(),
    };
    let today = Local::now().date_naive();
    let def = update(conn, &session, id, &patch, today)?;
    println!("Updated fixed expense {}", def.id);
    Ok(())
}

fn rm(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let session = current_session(conn)?;
    let id = *sub.get_one::<i64>("id").unwrap();
    let today = Local::now().date_naive();
    remove(conn, &session, id, today)?;
    println!("Removed fixed expense {}", id);
    Ok(())
}

fn toggle_cmd(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let session = current_session(conn)?;
    let id = *sub.get_one::<i64>("id").unwrap();
    let today = Local::now().date_naive();
    let def = toggle(conn, &session, id, today)?;
    println!(
        "Fixed expense {} is now {}",
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
                    format!("{}..{}", d.start_month, d.end_month),
                    if d.is_active { "yes".into() } else { "no".into() },
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Id", "Title", "Amount", "Day", "Range", "Active"], rows)
        );
    }
    Ok(())
}

const SELECT_COLS: &str = "id, user_id, title, amount, scheduled_day, category_id, is_active, \
                           start_month, end_month, last_generated_month";

fn row_to_def(
    r: &Row<'_>,
) -> rusqlite::Result<(i64, i64, String, String, u32, Option<i64>, bool, String, String, Option<String>)>
{
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
    raw: (i64, i64, String, String, u32, Option<i64>, bool, String, String, Option<String>),
) -> LedgerResult<FixedExpense> {
    let (id, user_id, title, amount_s, scheduled_day, category_id, is_active, start_month, end_month, last_generated_month) =
        raw;
    Ok(FixedExpense {
        id,
        user_id,
        title,
        amount: stored_decimal(&amount_s, "fixed expense amount")?,
        scheduled_day,
        category_id,
        is_active,
        start_month,
        end_month,
        last_generated_month,
    })
}

fn fetch(conn: &Connection, user_id: i64, id: i64) -> LedgerResult<FixedExpense> {
    let raw = conn
        .query_row(
            &format!(
                "SELECT {} FROM fixed_expenses WHERE id=?1 AND user_id=?2",
                SELECT_COLS
            ),
            params![id, user_id],
            row_to_def,
        )
        .optional()?;
    decode(raw.ok_or(LedgerError::NotFound)?)
}

fn validate_amount(amount: Decimal) -> LedgerResult<()> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::validation("amount must be positive"));
    }
    Ok(())
}

/// Insert one generated expense row per date, skipping dates before
/// `min_date` when given.
fn insert_rows(
    conn: &Connection,
    user_id: i64,
    def_id: i64,
    title: &str,
    amount: Decimal,
    category_id: Option<i64>,
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
            "INSERT INTO transactions(user_id, kind, title, amount, date, category_id, is_fixed, fixed_expense_id)
             VALUES (?1, 'expense', ?2, ?3, ?4, ?5, 1, ?6)",
            params![
                user_id,
                title,
                amount.to_string(),
                date.to_string(),
                category_id,
                def_id
            ],
        )?;
    }
    Ok(())
}

fn delete_future_rows(
    conn: &Connection,
    user_id: i64,
    def_id: i64,
    today: NaiveDate,
) -> LedgerResult<()> {
    conn.execute(
        "DELETE FROM transactions WHERE user_id=?1 AND fixed_expense_id=?2 AND date>=?3",
        params![user_id, def_id, today.to_string()],
    )?;
    Ok(())
}

/// Insert the definition and generate one expense row for every covered
/// month, as one atomic batch.
pub fn create(
    conn: &mut Connection,
    session: &Session,
    input: &NewFixedExpense,
) -> LedgerResult<FixedExpense> {
    validate_amount(input.amount)?;
    if input.title.trim().is_empty() {
        return Err(LedgerError::validation("title must not be empty"));
    }
    let dates = schedule::expand(&input.start_month, &input.end_month, input.scheduled_day)?;

    let tx = conn.transaction()?;
    if let Some(cat) = input.category_id {
        super::transactions::ensure_category(&tx, session.user_id, cat)?;
    }
    tx.execute(
        "INSERT INTO fixed_expenses(user_id, title, amount, scheduled_day, category_id,
                                    is_active, start_month, end_month, last_generated_month)
         VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6, ?7, ?7)",
        params![
            session.user_id,
            input.title,
            input.amount.to_string(),
            input.scheduled_day,
            input.category_id,
            input.start_month,
            input.end_month
        ],
    )?;
    let id = tx.last_insert_rowid();
    insert_rows(
        &tx,
        session.user_id,
        id,
        &input.title,
        input.amount,
        input.category_id,
        &dates,
        None,
    )?;
    let def = fetch(&tx, session.user_id, id)?;
    tx.commit()?;
    Ok(def)
}

/// Replace future generated rows with rows matching the merged definition;
/// rows dated before `today` are history and stay untouched.
pub fn update(
    conn: &mut Connection,
    session: &Session,
    id: i64,
    patch: &FixedExpensePatch,
    today: NaiveDate,
) -> LedgerResult<FixedExpense> {
    let tx = conn.transaction()?;
    let existing = fetch(&tx, session.user_id, id)?;

    let title = patch.title.clone().unwrap_or_else(|| existing.title.clone());
    let amount = patch.amount.unwrap_or(existing.amount);
    let scheduled_day = patch.scheduled_day.unwrap_or(existing.scheduled_day);
    let category_id = patch.category_id.or(existing.category_id);
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
    if let Some(cat) = patch.category_id {
        super::transactions::ensure_category(&tx, session.user_id, cat)?;
    }

    delete_future_rows(&tx, session.user_id, id, today)?;
    tx.execute(
        "UPDATE fixed_expenses
         SET title=?1, amount=?2, scheduled_day=?3, category_id=?4, start_month=?5, end_month=?6
         WHERE id=?7 AND user_id=?8",
        params![
            title,
            amount.to_string(),
            scheduled_day,
            category_id,
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
            &title,
            amount,
            category_id,
            &dates,
            Some(today),
        )?;
        tx.execute(
            "UPDATE fixed_expenses SET last_generated_month=?1 WHERE id=?2 AND user_id=?3",
            params![end_month, id, session.user_id],
        )?;
    }
    let def = fetch(&tx, session.user_id, id)?;
    tx.commit()?;
    Ok(def)
}

/// Delete future generated rows, then the definition itself.
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
        "DELETE FROM fixed_expenses WHERE id=?1 AND user_id=?2",
        params![id, session.user_id],
    )?;
    tx.commit()?;
    Ok(())
}

/// Deactivating deletes future rows; reactivating regenerates today-or-later
/// rows from the stored range.
pub fn toggle(
    conn: &mut Connection,
    session: &Session,
    id: i64,
    today: NaiveDate,
) -> LedgerResult<FixedExpense> {
    let tx = conn.transaction()?;
    let existing = fetch(&tx, session.user_id, id)?;
    if existing.is_active {
        delete_future_rows(&tx, session.user_id, id, today)?;
        tx.execute(
            "UPDATE fixed_expenses SET is_active=0 WHERE id=?1 AND user_id=?2",
            params![id, session.user_id],
        )?;
    } else {
        let dates = schedule::expand(
            &existing.start_month,
            &existing.end_month,
            existing.scheduled_day,
        )?;
        tx.execute(
            "UPDATE fixed_expenses SET is_active=1, last_generated_month=?1
             WHERE id=?2 AND user_id=?3",
            params![existing.end_month, id, session.user_id],
        )?;
        insert_rows(
            &tx,
            session.user_id,
            id,
            &existing.title,
            existing.amount,
            existing.category_id,
            &dates,
            Some(today),
        )?;
    }
    let def = fetch(&tx, session.user_id, id)?;
    tx.commit()?;
    Ok(def)
}

pub fn list(conn: &Connection, session: &Session) -> LedgerResult<Vec<FixedExpense>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM fixed_expenses WHERE user_id=?1 ORDER BY id",
        SELECT_COLS
    ))?;
    let mut rows = stmt.query(params![session.user_id])?;
    let mut defs = Vec::new();
    while let Some(r) = rows.next()? {
        defs.push(decode(row_to_def(r)?)?);
    }
    Ok(defs)
}
