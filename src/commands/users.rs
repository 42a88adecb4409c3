// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use rusqlite::{params, Connection};

use crate::errors::{LedgerError, Result as LedgerResult};
use crate::utils::{pretty_table, set_current_user};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = sub.get_one::<String>("name").unwrap();
            create(conn, name)?;
            println!("Added user '{}'", name);
        }
        Some(("list", _)) => {
            let mut stmt =
                conn.prepare("SELECT name, created_at FROM users ORDER BY name")?;
            let rows = stmt.query_map([], |r| {
                Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?))
            })?;
            let mut data = Vec::new();
            for row in rows {
                let (n, cr) = row?;
                data.push(vec![n, cr]);
            }
            println!("{}", pretty_table(&["Name", "Created"], data));
        }
        Some(("use", sub)) => {
            let name = sub.get_one::<String>("name").unwrap();
            set_current_user(conn, name)?;
            println!("Now acting as '{}'", name);
        }
        _ => {}
    }
    Ok(())
}

pub fn create(conn: &Connection, name: &str) -> LedgerResult<i64> {
    if name.trim().is_empty() {
        return Err(LedgerError::validation("name must not be empty"));
    }
    conn.execute("INSERT INTO users(name) VALUES (?1)", params![name])?;
    Ok(conn.last_insert_rowid())
}
