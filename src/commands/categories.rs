// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension};

use crate::errors::{LedgerError, Result as LedgerResult};
use crate::models::{Category, CategoryKind, Session};
use crate::utils::{current_session, pretty_table};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let session = current_session(conn)?;
            let name = sub.get_one::<String>("name").unwrap();
            let kind = parse_kind(sub.get_one::<String>("kind").unwrap())?;
            create(conn, &session, name, kind)?;
            println!("Added category '{}' ({})", name, kind.as_str());
        }
        Some(("list", _)) => {
            let session = current_session(conn)?;
            let cats = list(conn, &session)?;
            let rows = cats
                .into_iter()
                .map(|c| vec![c.id.to_string(), c.name, c.kind.as_str().to_string()])
                .collect();
            println!("{}", pretty_table(&["Id", "Category", "Kind"], rows));
        }
        Some(("rm", sub)) => {
            let session = current_session(conn)?;
            let id = *sub.get_one::<i64>("id").unwrap();
            remove(conn, &session, id)?;
            println!("Removed category {}", id);
        }
        _ => {}
    }
    Ok(())
}

fn parse_kind(raw: &str) -> LedgerResult<CategoryKind> {
    CategoryKind::from_str(raw).ok_or_else(|| {
        LedgerError::validation(format!("invalid kind '{}', expected income|expense", raw))
    })
}

pub fn create(
    conn: &Connection,
    session: &Session,
    name: &str,
    kind: CategoryKind,
) -> LedgerResult<Category> {
    if name.trim().is_empty() {
        return Err(LedgerError::validation("name must not be empty"));
    }
    conn.execute(
        "INSERT INTO categories(user_id, name, kind) VALUES (?1, ?2, ?3)",
        params![session.user_id, name, kind.as_str()],
    )?;
    let id = conn.last_insert_rowid();
    Ok(Category {
        id,
        user_id: session.user_id,
        name: name.to_string(),
        kind,
    })
}

pub fn list(conn: &Connection, session: &Session) -> LedgerResult<Vec<Category>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, kind FROM categories WHERE user_id=?1 ORDER BY kind, name",
    )?;
    let mut rows = stmt.query(params![session.user_id])?;
    let mut cats = Vec::new();
    while let Some(r) = rows.next()? {
        let id: i64 = r.get(0)?;
        let name: String = r.get(1)?;
        let kind_s: String = r.get(2)?;
        let kind = CategoryKind::from_str(&kind_s)
            .ok_or_else(|| LedgerError::corrupt(format!("category kind '{}'", kind_s)))?;
        cats.push(Category {
            id,
            user_id: session.user_id,
            name,
            kind,
        });
    }
    Ok(cats)
}

pub fn remove(conn: &Connection, session: &Session, id: i64) -> LedgerResult<()> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT id FROM categories WHERE id=?1 AND user_id=?2",
            params![id, session.user_id],
            |r| r.get(0),
        )
        .optional()?;
    if found.is_none() {
        return Err(LedgerError::NotFound);
    }
    conn.execute(
        "DELETE FROM categories WHERE id=?1 AND user_id=?2",
        params![id, session.user_id],
    )?;
    Ok(())
}
