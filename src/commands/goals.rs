// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use chrono::{Local, NaiveDate};
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;

use crate::errors::{LedgerError, Result as LedgerResult};
use crate::models::{Goal, Session};
use crate::utils::{current_session, parse_decimal, pretty_table, stored_decimal};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("set", sub)) => {
            let session = current_session(conn)?;
            let target = parse_decimal(sub.get_one::<String>("target").unwrap())?;
            let initial = match sub.get_one::<String>("initial") {
                Some(raw) => parse_decimal(raw)?,
                None => Decimal::ZERO,
            };
            let goal = set(conn, &session, target, initial)?;
            println!(
                "Goal set: target {} (initial {})",
                goal.target_amount, goal.initial_amount
            );
        }
        Some(("status", _)) => {
            let session = current_session(conn)?;
            let today = Local::now().date_naive();
            let worth = net_worth(conn, &session, today)?;
            let rows = match get(conn, &session)? {
                Some(goal) => {
                    let remaining = goal.target_amount - worth;
                    vec![vec![
                        goal.target_amount.to_string(),
                        worth.to_string(),
                        remaining.to_string(),
                    ]]
                }
                None => vec![vec!["-".into(), worth.to_string(), "-".into()]],
            };
            println!("{}", pretty_table(&["Target", "Net Worth", "Remaining"], rows));
        }
        _ => {}
    }
    Ok(())
}

/// One goal per user; setting again overwrites the previous target.
pub fn set(
    conn: &Connection,
    session: &Session,
    target_amount: Decimal,
    initial_amount: Decimal,
) -> LedgerResult<Goal> {
    if target_amount <= Decimal::ZERO {
        return Err(LedgerError::validation("target amount must be positive"));
    }
    conn.execute(
        "INSERT INTO goals(user_id, target_amount, initial_amount) VALUES (?1, ?2, ?3)
         ON CONFLICT(user_id) DO UPDATE
         SET target_amount=excluded.target_amount, initial_amount=excluded.initial_amount",
        params![
            session.user_id,
            target_amount.to_string(),
            initial_amount.to_string()
        ],
    )?;
    Ok(Goal {
        user_id: session.user_id,
        target_amount,
        initial_amount,
    })
}

pub fn get(conn: &Connection, session: &Session) -> LedgerResult<Option<Goal>> {
    let raw: Option<(String, String)> = conn
        .query_row(
            "SELECT target_amount, initial_amount FROM goals WHERE user_id=?1",
            params![session.user_id],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .optional()?;
    match raw {
        Some((target_s, initial_s)) => Ok(Some(Goal {
            user_id: session.user_id,
            target_amount: stored_decimal(&target_s, "goal target amount")?,
            initial_amount: stored_decimal(&initial_s, "goal initial amount")?,
        })),
        None => Ok(None),
    }
}

fn sum_transactions(
    conn: &Connection,
    user_id: i64,
    kind: &str,
    today: NaiveDate,
) -> LedgerResult<Decimal> {
    let mut stmt = conn.prepare_cached(
        "SELECT amount FROM transactions WHERE user_id=?1 AND kind=?2 AND date<=?3",
    )?;
    let mut rows = stmt.query(params![user_id, kind, today.to_string()])?;
    let mut total = Decimal::ZERO;
    while let Some(r) = rows.next()? {
        let amount_s: String = r.get(0)?;
        total += stored_decimal(&amount_s, "transaction amount")?;
    }
    Ok(total)
}

/// Net worth = initial amount + income − expense + active asset balances,
/// counting only rows dated on or before `today`.
pub fn net_worth(conn: &Connection, session: &Session, today: NaiveDate) -> LedgerResult<Decimal> {
    let initial = get(conn, session)?
        .map(|g| g.initial_amount)
        .unwrap_or(Decimal::ZERO);
    let income = sum_transactions(conn, session.user_id, "income", today)?;
    let expense = sum_transactions(conn, session.user_id, "expense", today)?;

    let mut stmt = conn.prepare_cached(
        "SELECT balance FROM assets WHERE user_id=?1 AND is_active=1",
    )?;
    let mut rows = stmt.query(params![session.user_id])?;
    let mut assets_total = Decimal::ZERO;
    while let Some(r) = rows.next()? {
        let balance_s: String = r.get(0)?;
        assets_total += stored_decimal(&balance_s, "asset balance")?;
    }

    Ok(initial + income - expense + assets_total)
}
