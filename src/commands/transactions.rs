// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use chrono::{Local, NaiveDate};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::errors::{LedgerError, Result as LedgerResult};
use crate::models::{NewTransaction, Session, Transaction, TransactionKind, TransactionPatch};
use crate::utils::{
    current_session, maybe_print_json, parse_date, parse_decimal, pretty_table, stored_date,
    stored_decimal,
};
use rust_decimal::Decimal;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("edit", sub)) => edit(conn, sub)?,
        Some(("rm", sub)) => rm(conn, sub)?,
        Some(("list", sub)) => list_cmd(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let session = current_session(conn)?;
    let input = NewTransaction {
        kind: parse_kind(sub.get_one::<String>("kind").unwrap())?,
        title: sub.get_one::<String>("title").unwrap().clone(),
        amount: parse_decimal(sub.get_one::<String>("amount").unwrap())?,
        date: parse_date(sub.get_one::<String>("date").unwrap())?,
        category_id: sub.get_one::<i64>("category").copied(),
        memo: sub.get_one::<String>("memo").cloned(),
    };
    let record = create(conn, &session, &input)?;
    println!(
        "Recorded {} {} '{}' on {}",
        record.kind.as_str(),
        record.amount,
        record.title,
        record.date
    );
    Ok(())
}

fn edit(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let session = current_session(conn)?;
    let id = *sub.get_one::<i64>("id").unwrap();
    let patch = TransactionPatch {
        kind: match sub.get_one::<String>("kind") {
            Some(raw) => Some(parse_kind(raw)?),
            None => None,
        },
        title: sub.get_one::<String>("title").cloned(),
        amount: match sub.get_one::<String>("amount") {
            Some(raw) => Some(parse_decimal(raw)?),
            None => None,
        },
        date: match sub.get_one::<String>("date") {
            Some(raw) => Some(parse_date(raw)?),
            None => None,
        },
        category_id: sub.get_one::<i64>("category").copied(),
        memo: sub.get_one::<String>("memo").cloned(),
    };
    let record = update(conn, &session, id, &patch)?;
    println!("Updated transaction {}", record.id);
    Ok(())
}

fn rm(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let session = current_session(conn)?;
    let id = *sub.get_one::<i64>("id").unwrap();
    remove(conn, &session, id)?;
    println!("Removed transaction {}", id);
    Ok(())
}

fn list_cmd(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let session = current_session(conn)?;
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let month = sub.get_one::<String>("month").map(|s| s.as_str());
    let kind = match sub.get_one::<String>("kind") {
        Some(raw) => Some(parse_kind(raw)?),
        None => None,
    };
    let today = Local::now().date_naive();
    let records = list(conn, &session, month, kind, today)?;
    if !maybe_print_json(json_flag, jsonl_flag, &records)? {
        let rows = records
            .iter()
            .map(|r| {
                vec![
                    r.id.to_string(),
                    r.date.to_string(),
                    r.kind.as_str().to_string(),
                    r.title.clone(),
                    r.amount.to_string(),
                    if r.is_fixed { "yes".into() } else { String::new() },
                    r.memo.clone().unwrap_or_default(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Id", "Date", "Kind", "Title", "Amount", "Fixed", "Memo"], rows)
        );
    }
    Ok(())
}

fn parse_kind(raw: &str) -> LedgerResult<TransactionKind> {
    TransactionKind::from_str(raw).ok_or_else(|| {
        LedgerError::validation(format!(
            "invalid kind '{}', expected income|expense|saving",
            raw
        ))
    })
}

const SELECT_COLS: &str =
    "id, user_id, kind, title, amount, date, category_id, memo, is_fixed, fixed_expense_id";

fn row_to_record(
    r: &Row<'_>,
) -> rusqlite::Result<(i64, i64, String, String, String, String, Option<i64>, Option<String>, bool, Option<i64>)>
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
    raw: (i64, i64, String, String, String, String, Option<i64>, Option<String>, bool, Option<i64>),
) -> LedgerResult<Transaction> {
    let (id, user_id, kind_s, title, amount_s, date_s, category_id, memo, is_fixed, fixed_expense_id) =
        raw;
    let kind = TransactionKind::from_str(&kind_s)
        .ok_or_else(|| LedgerError::corrupt(format!("transaction kind '{}'", kind_s)))?;
    Ok(Transaction {
        id,
        user_id,
        kind,
        title,
        amount: stored_decimal(&amount_s, "transaction amount")?,
        date: stored_date(&date_s, "transaction date")?,
        category_id,
        memo,
        is_fixed,
        fixed_expense_id,
    })
}

fn fetch(conn: &Connection, user_id: i64, id: i64) -> LedgerResult<Transaction> {
    let raw = conn
        .query_row(
            &format!(
                "SELECT {} FROM transactions WHERE id=?1 AND user_id=?2",
                SELECT_COLS
            ),
            params![id, user_id],
            row_to_record,
        )
        .optional()?;
    decode(raw.ok_or(LedgerError::NotFound)?)
}

pub fn ensure_category(conn: &Connection, user_id: i64, category_id: i64) -> LedgerResult<()> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT id FROM categories WHERE id=?1 AND user_id=?2",
            params![category_id, user_id],
            |r| r.get(0),
        )
        .optional()?;
    found.map(|_| ()).ok_or(LedgerError::NotFound)
}

pub fn create(
    conn: &Connection,
    session: &Session,
    input: &NewTransaction,
) -> LedgerResult<Transaction> {
    if input.amount <= Decimal::ZERO {
        return Err(LedgerError::validation("amount must be positive"));
    }
    if input.title.trim().is_empty() {
        return Err(LedgerError::validation("title must not be empty"));
    }
    if let Some(cat) = input.category_id {
        ensure_category(conn, session.user_id, cat)?;
    }
    conn.execute(
        "INSERT INTO transactions(user_id, kind, title, amount, date, category_id, memo)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            session.user_id,
            input.kind.as_str(),
            input.title,
            input.amount.to_string(),
            input.date.to_string(),
            input.category_id,
            input.memo
        ],
    )?;
    fetch(conn, session.user_id, conn.last_insert_rowid())
}

pub fn update(
    conn: &Connection,
    session: &Session,
    id: i64,
    patch: &TransactionPatch,
) -> LedgerResult<Transaction> {
    let existing = fetch(conn, session.user_id, id)?;
    if existing.is_fixed {
        return Err(LedgerError::permission(
            "system-generated records are immutable",
        ));
    }
    let kind = patch.kind.unwrap_or(existing.kind);
    let title = patch.title.clone().unwrap_or_else(|| existing.title.clone());
    let amount = patch.amount.unwrap_or(existing.amount);
    let date = patch.date.unwrap_or(existing.date);
    let category_id = patch.category_id.or(existing.category_id);
    let memo = patch.memo.clone().or_else(|| existing.memo.clone());

    if amount <= Decimal::ZERO {
        return Err(LedgerError::validation("amount must be positive"));
    }
    if title.trim().is_empty() {
        return Err(LedgerError::validation("title must not be empty"));
    }
    if let Some(cat) = patch.category_id {
        ensure_category(conn, session.user_id, cat)?;
    }
    conn.execute(
        "UPDATE transactions SET kind=?1, title=?2, amount=?3, date=?4, category_id=?5, memo=?6
         WHERE id=?7 AND user_id=?8",
        params![
            kind.as_str(),
            title,
            amount.to_string(),
            date.to_string(),
            category_id,
            memo,
            id,
            session.user_id
        ],
    )?;
    fetch(conn, session.user_id, id)
}

pub fn remove(conn: &Connection, session: &Session, id: i64) -> LedgerResult<()> {
    let existing = fetch(conn, session.user_id, id)?;
    if existing.is_fixed {
        return Err(LedgerError::permission(
            "system-generated records are immutable",
        ));
    }
    conn.execute(
        "DELETE FROM transactions WHERE id=?1 AND user_id=?2",
        params![id, session.user_id],
    )?;
    Ok(())
}

/// Rows dated on or before `today`, optionally narrowed to one month or one
/// kind, newest first.
pub fn list(
    conn: &Connection,
    session: &Session,
    month: Option<&str>,
    kind: Option<TransactionKind>,
    today: NaiveDate,
) -> LedgerResult<Vec<Transaction>> {
    let mut sql = format!(
        "SELECT {} FROM transactions WHERE user_id=? AND date<=?",
        SELECT_COLS
    );
    let mut args: Vec<String> = vec![session.user_id.to_string(), today.to_string()];
    if let Some(m) = month {
        sql.push_str(" AND substr(date,1,7)=?");
        args.push(m.to_string());
    }
    if let Some(k) = kind {
        sql.push_str(" AND kind=?");
        args.push(k.as_str().to_string());
    }
    sql.push_str(" ORDER BY date DESC, id DESC");

    let mut stmt = conn.prepare(&sql)?;
    let params: Vec<&dyn rusqlite::ToSql> =
        args.iter().map(|s| s as &dyn rusqlite::ToSql).collect();
    let mut rows = stmt.query(rusqlite::params_from_iter(params))?;
    let mut records = Vec::new();
    while let Some(r) = rows.next()? {
        records.push(decode(row_to_record(r)?)?);
    }
    Ok(records)
}
