// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use thiserror::Error;

/// Error taxonomy for the ledger engine. `NotFound` is deliberately generic:
/// a record that exists but belongs to another user is reported exactly like
/// a record that does not exist at all.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("authentication required")]
    Auth,
    #[error("{0}")]
    Validation(String),
    #[error("not found")]
    NotFound,
    #[error("{0}")]
    Permission(String),
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("corrupt ledger value: {0}")]
    Corrupt(String),
}

impl LedgerError {
    pub fn validation(msg: impl Into<String>) -> Self {
        LedgerError::Validation(msg.into())
    }

    pub fn permission(msg: impl Into<String>) -> Self {
        LedgerError::Permission(msg.into())
    }

    pub fn corrupt(msg: impl Into<String>) -> Self {
        LedgerError::Corrupt(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
