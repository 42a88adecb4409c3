// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use rusqlite::{params, Connection};
use serde_json::json;

use crate::utils::current_session;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("transactions", sub)) => export_transactions(conn, sub),
        Some(("asset-transactions", sub)) => export_asset_transactions(conn, sub),
        _ => Ok(()),
    }
}

fn export_transactions(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let session = current_session(conn)?;
    let fmt = sub.get_one::<String>("format").unwrap().to_lowercase();
    let out = sub.get_one::<String>("out").unwrap();

    let mut stmt = conn.prepare(
        "SELECT t.date, t.kind, t.title, t.amount, c.name as category, t.memo, t.is_fixed
         FROM transactions t
         LEFT JOIN categories c ON t.category_id=c.id
         WHERE t.user_id=?1
         ORDER BY t.date, t.id",
    )?;
    let rows = stmt.query_map(params![session.user_id], |r| {
        Ok((
            r.get::<_, String>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, String>(2)?,
            r.get::<_, String>(3)?,
            r.get::<_, Option<String>>(4)?,
            r.get::<_, Option<String>>(5)?,
            r.get::<_, bool>(6)?,
        ))
    })?;

    match fmt.as_str() {
        "csv" => {
            let mut wtr = csv::Writer::from_path(out)?;
            wtr.write_record(["date", "kind", "title", "amount", "category", "memo", "fixed"])?;
            for row in rows {
                let (d, k, t, amt, cat, memo, fixed) = row?;
                wtr.write_record([
                    d,
                    k,
                    t,
                    amt,
                    cat.unwrap_or_default(),
                    memo.unwrap_or_default(),
                    if fixed { "1".into() } else { "0".into() },
                ])?;
            }
            wtr.flush()?;
        }
        "json" => {
            let mut items = Vec::new();
            for row in rows {
                let (d, k, t, amt, cat, memo, fixed) = row?;
                items.push(json!({
                    "date": d, "kind": k, "title": t, "amount": amt,
                    "category": cat, "memo": memo, "fixed": fixed
                }));
            }
            std::fs::write(out, serde_json::to_string_pretty(&items)?)?;
        }
        _ => {
            eprintln!("Unknown format: {} (use csv|json)", fmt);
        }
    }
    println!("Exported transactions to {}", out);
    Ok(())
}

fn export_asset_transactions(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let session = current_session(conn)?;
    let fmt = sub.get_one::<String>("format").unwrap().to_lowercase();
    let out = sub.get_one::<String>("out").unwrap();

    let mut stmt = conn.prepare(
        "SELECT t.date, a.name as asset, t.kind, t.amount, b.name as to_asset, t.memo, t.is_fixed
         FROM asset_transactions t
         LEFT JOIN assets a ON t.asset_id=a.id
         LEFT JOIN assets b ON t.to_asset_id=b.id
         WHERE t.user_id=?1
         ORDER BY t.date, t.id",
    )?;
    let rows = stmt.query_map(params![session.user_id], |r| {
        Ok((
            r.get::<_, String>(0)?,
            r.get::<_, Option<String>>(1)?,
            r.get::<_, String>(2)?,
            r.get::<_, String>(3)?,
            r.get::<_, Option<String>>(4)?,
            r.get::<_, Option<String>>(5)?,
            r.get::<_, bool>(6)?,
        ))
    })?;

    match fmt.as_str() {
        "csv" => {
            let mut wtr = csv::Writer::from_path(out)?;
            wtr.write_record(["date", "asset", "kind", "amount", "to_asset", "memo", "fixed"])?;
            for row in rows {
                let (d, asset, k, amt, to, memo, fixed) = row?;
                wtr.write_record([
                    d,
                    asset.unwrap_or_default(),
                    k,
                    amt,
                    to.unwrap_or_default(),
                    memo.unwrap_or_default(),
                    if fixed { "1".into() } else { "0".into() },
                ])?;
            }
            wtr.flush()?;
        }
        "json" => {
            let mut items = Vec::new();
            for row in rows {
                let (d, asset, k, amt, to, memo, fixed) = row?;
                items.push(json!({
                    "date": d, "asset": asset, "kind": k, "amount": amt,
                    "to_asset": to, "memo": memo, "fixed": fixed
                }));
            }
            std::fs::write(out, serde_json::to_string_pretty(&items)?)?;
        }
        _ => {
            eprintln!("Unknown format: {} (use csv|json)", fmt);
        }
    }
    println!("Exported asset transactions to {}", out);
    Ok(())
}
