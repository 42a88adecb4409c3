// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;

use crate::errors::{LedgerError, Result};
use crate::models::AssetTxKind;
use crate::utils::stored_decimal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceOp {
    Add,
    Subtract,
}

impl BalanceOp {
    pub fn invert(self) -> BalanceOp {
        match self {
            BalanceOp::Add => BalanceOp::Subtract,
            BalanceOp::Subtract => BalanceOp::Add,
        }
    }
}

/// Source-side balance effect of a transaction kind. Transfers also add the
/// same amount on the target asset, handled by `apply_effect`.
pub fn operation_for(kind: AssetTxKind) -> BalanceOp {
    match kind {
        AssetTxKind::Deposit | AssetTxKind::Profit => BalanceOp::Add,
        AssetTxKind::Withdraw | AssetTxKind::Loss | AssetTxKind::Transfer => BalanceOp::Subtract,
    }
}

/// Read-modify-write of one stored balance. Callers run this inside an open
/// SQL transaction so the record write and the adjustment commit together.
pub fn adjust_balance(
    conn: &Connection,
    user_id: i64,
    asset_id: i64,
    op: BalanceOp,
    amount: Decimal,
) -> Result<()> {
    let stored: Option<String> = conn
        .query_row(
            "SELECT balance FROM assets WHERE id=?1 AND user_id=?2",
            params![asset_id, user_id],
            |r| r.get(0),
        )
        .optional()?;
    let stored = stored.ok_or(LedgerError::NotFound)?;
    let balance = stored_decimal(&stored, "asset balance")?;
    let next = match op {
        BalanceOp::Add => balance + amount,
        BalanceOp::Subtract => balance - amount,
    };
    conn.execute(
        "UPDATE assets SET balance=?1 WHERE id=?2 AND user_id=?3",
        params![next.to_string(), asset_id, user_id],
    )?;
    Ok(())
}

/// Apply the full balance effect of one asset transaction: the source-side
/// operation, plus the counter-leg for transfers.
pub fn apply_effect(
    conn: &Connection,
    user_id: i64,
    asset_id: i64,
    kind: AssetTxKind,
    amount: Decimal,
    to_asset_id: Option<i64>,
) -> Result<()> {
    adjust_balance(conn, user_id, asset_id, operation_for(kind), amount)?;
    if kind == AssetTxKind::Transfer {
        if let Some(to) = to_asset_id {
            adjust_balance(conn, user_id, to, BalanceOp::Add, amount)?;
        }
    }
    Ok(())
}

/// Exact inverse of `apply_effect`, used before rewriting or deleting a
/// record. A transfer whose target asset has since been removed only has its
/// source leg left to undo.
pub fn revert_effect(
    conn: &Connection,
    user_id: i64,
    asset_id: i64,
    kind: AssetTxKind,
    amount: Decimal,
    to_asset_id: Option<i64>,
) -> Result<()> {
    adjust_balance(conn, user_id, asset_id, operation_for(kind).invert(), amount)?;
    if kind == AssetTxKind::Transfer {
        if let Some(to) = to_asset_id {
            adjust_balance(conn, user_id, to, BalanceOp::Subtract, amount)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE assets(id INTEGER PRIMARY KEY, user_id INTEGER, name TEXT,
             kind TEXT, balance TEXT NOT NULL DEFAULT '0', is_active INTEGER DEFAULT 1);",
        )
        .unwrap();
        conn.execute(
            "INSERT INTO assets(id, user_id, name, kind, balance) VALUES (1, 1, 'A', 'savings', '100')",
            [],
        )
        .unwrap();
        conn
    }

    fn balance(conn: &Connection, id: i64) -> String {
        conn.query_row("SELECT balance FROM assets WHERE id=?1", [id], |r| r.get(0))
            .unwrap()
    }

    #[test]
    fn deposit_and_profit_add_others_subtract() {
        assert_eq!(operation_for(AssetTxKind::Deposit), BalanceOp::Add);
        assert_eq!(operation_for(AssetTxKind::Profit), BalanceOp::Add);
        assert_eq!(operation_for(AssetTxKind::Withdraw), BalanceOp::Subtract);
        assert_eq!(operation_for(AssetTxKind::Loss), BalanceOp::Subtract);
        assert_eq!(operation_for(AssetTxKind::Transfer), BalanceOp::Subtract);
    }

    #[test]
    fn adjust_balance_is_exact() {
        let conn = setup();
        adjust_balance(&conn, 1, 1, BalanceOp::Add, Decimal::new(25, 1)).unwrap();
        assert_eq!(balance(&conn, 1), "102.5");
        adjust_balance(&conn, 1, 1, BalanceOp::Subtract, Decimal::new(25, 1)).unwrap();
        assert_eq!(balance(&conn, 1), "100.0");
    }

    #[test]
    fn unowned_asset_is_not_found() {
        let conn = setup();
        let err = adjust_balance(&conn, 2, 1, BalanceOp::Add, Decimal::ONE).unwrap_err();
        assert!(matches!(err, LedgerError::NotFound));
    }

    #[test]
    fn transfer_effect_moves_both_legs() {
        let conn = setup();
        conn.execute(
            "INSERT INTO assets(id, user_id, name, kind, balance) VALUES (2, 1, 'B', 'savings', '0')",
            [],
        )
        .unwrap();
        apply_effect(&conn, 1, 1, AssetTxKind::Transfer, Decimal::from(40), Some(2)).unwrap();
        assert_eq!(balance(&conn, 1), "60");
        assert_eq!(balance(&conn, 2), "40");
        revert_effect(&conn, 1, 1, AssetTxKind::Transfer, Decimal::from(40), Some(2)).unwrap();
        assert_eq!(balance(&conn, 1), "100");
        assert_eq!(balance(&conn, 2), "0");
    }
}
