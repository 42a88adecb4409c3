// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use comfy_table::{presets::UTF8_FULL, Cell, Table};
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;

use crate::errors::LedgerError;
use crate::models::Session;

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))
}

pub fn parse_decimal(s: &str) -> Result<Decimal> {
    s.parse::<Decimal>()
        .with_context(|| format!("Invalid decimal '{}'", s))
}

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}

pub fn maybe_print_json<T: serde::Serialize>(
    json_flag: bool,
    jsonl_flag: bool,
    v: &T,
) -> Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    if jsonl_flag {
        // If v is an array, stream each element; else stream single line
        let val = serde_json::to_value(v)?;
        if let Some(arr) = val.as_array() {
            for item in arr {
                println!("{}", serde_json::to_string(item)?);
            }
        } else {
            println!("{}", serde_json::to_string(&val)?);
        }
        return Ok(true);
    }
    Ok(false)
}

/// Resolve the active session from the settings-backed current-user pointer.
/// Missing pointer or dangling user name both fail as unauthenticated.
pub fn current_session(conn: &Connection) -> crate::errors::Result<Session> {
    let name: Option<String> = conn
        .query_row(
            "SELECT value FROM settings WHERE key='current_user'",
            [],
            |r| r.get(0),
        )
        .optional()?;
    let name = name.ok_or(LedgerError::Auth)?;
    let user_id: Option<i64> = conn
        .query_row("SELECT id FROM users WHERE name=?1", params![name], |r| {
            r.get(0)
        })
        .optional()?;
    user_id.map(|user_id| Session { user_id }).ok_or(LedgerError::Auth)
}

pub fn set_current_user(conn: &Connection, name: &str) -> crate::errors::Result<()> {
    let exists: Option<i64> = conn
        .query_row("SELECT id FROM users WHERE name=?1", params![name], |r| {
            r.get(0)
        })
        .optional()?;
    if exists.is_none() {
        return Err(LedgerError::NotFound);
    }
    conn.execute(
        "INSERT INTO settings(key, value) VALUES('current_user', ?1)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        params![name],
    )?;
    Ok(())
}

/// Decode a stored decimal column, failing as corrupt rather than invalid
/// input since the value never came from the caller.
pub fn stored_decimal(s: &str, what: &str) -> crate::errors::Result<Decimal> {
    Decimal::from_str_exact(s)
        .map_err(|_| LedgerError::corrupt(format!("{} '{}'", what, s)))
}

pub fn stored_date(s: &str, what: &str) -> crate::errors::Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| LedgerError::corrupt(format!("{} '{}'", what, s)))
}
