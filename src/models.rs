// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Authenticated caller identity, threaded explicitly into every engine
/// operation. Constructed by `utils::current_session`; never read from
/// ambient state inside the engine.
#[derive(Debug, Clone, Copy)]
pub struct Session {
    pub user_id: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    Savings,
    Deposit,
    Stock,
    Fund,
    Crypto,
    RealEstate,
    Other,
}

impl AssetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetKind::Savings => "savings",
            AssetKind::Deposit => "deposit",
            AssetKind::Stock => "stock",
            AssetKind::Fund => "fund",
            AssetKind::Crypto => "crypto",
            AssetKind::RealEstate => "real_estate",
            AssetKind::Other => "other",
        }
    }

    pub fn from_str(s: &str) -> Option<AssetKind> {
        match s {
            "savings" => Some(AssetKind::Savings),
            "deposit" => Some(AssetKind::Deposit),
            "stock" => Some(AssetKind::Stock),
            "fund" => Some(AssetKind::Fund),
            "crypto" => Some(AssetKind::Crypto),
            "real_estate" => Some(AssetKind::RealEstate),
            "other" => Some(AssetKind::Other),
            _ => None,
        }
    }
}

/// Balance-affecting event kinds. deposit/profit add to the asset balance,
/// withdraw/loss/transfer subtract from it; transfer also adds to the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetTxKind {
    Deposit,
    Withdraw,
    Profit,
    Loss,
    Transfer,
}

impl AssetTxKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetTxKind::Deposit => "deposit",
            AssetTxKind::Withdraw => "withdraw",
            AssetTxKind::Profit => "profit",
            AssetTxKind::Loss => "loss",
            AssetTxKind::Transfer => "transfer",
        }
    }

    pub fn from_str(s: &str) -> Option<AssetTxKind> {
        match s {
            "deposit" => Some(AssetTxKind::Deposit),
            "withdraw" => Some(AssetTxKind::Withdraw),
            "profit" => Some(AssetTxKind::Profit),
            "loss" => Some(AssetTxKind::Loss),
            "transfer" => Some(AssetTxKind::Transfer),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Income,
    Expense,
    Saving,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
            TransactionKind::Saving => "saving",
        }
    }

    pub fn from_str(s: &str) -> Option<TransactionKind> {
        match s {
            "income" => Some(TransactionKind::Income),
            "expense" => Some(TransactionKind::Expense),
            "saving" => Some(TransactionKind::Saving),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryKind {
    Income,
    Expense,
}

impl CategoryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryKind::Income => "income",
            CategoryKind::Expense => "expense",
        }
    }

    pub fn from_str(s: &str) -> Option<CategoryKind> {
        match s {
            "income" => Some(CategoryKind::Income),
            "expense" => Some(CategoryKind::Expense),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Asset {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub kind: AssetKind,
    /// Running total kept in sync with every asset transaction touching
    /// this asset. There is no independent source of truth.
    pub balance: Decimal,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssetTransaction {
    pub id: i64,
    pub user_id: i64,
    pub asset_id: i64,
    pub kind: AssetTxKind,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub memo: Option<String>,
    pub is_fixed: bool,
    pub to_asset_id: Option<i64>,
    pub fixed_saving_id: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct NewAssetTransaction {
    pub asset_id: i64,
    pub kind: AssetTxKind,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub memo: Option<String>,
    pub to_asset_id: Option<i64>,
}

/// Partial update; `None` leaves the stored field unchanged. Changing the
/// kind away from transfer drops the target asset automatically.
#[derive(Debug, Clone, Default)]
pub struct AssetTransactionPatch {
    pub asset_id: Option<i64>,
    pub kind: Option<AssetTxKind>,
    pub amount: Option<Decimal>,
    pub date: Option<NaiveDate>,
    pub memo: Option<String>,
    pub to_asset_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Transaction {
    pub id: i64,
    pub user_id: i64,
    pub kind: TransactionKind,
    pub title: String,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub category_id: Option<i64>,
    pub memo: Option<String>,
    pub is_fixed: bool,
    pub fixed_expense_id: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub kind: TransactionKind,
    pub title: String,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub category_id: Option<i64>,
    pub memo: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct TransactionPatch {
    pub kind: Option<TransactionKind>,
    pub title: Option<String>,
    pub amount: Option<Decimal>,
    pub date: Option<NaiveDate>,
    pub category_id: Option<i64>,
    pub memo: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Category {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub kind: CategoryKind,
}

#[derive(Debug, Clone, Serialize)]
pub struct FixedExpense {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub amount: Decimal,
    pub scheduled_day: u32,
    pub category_id: Option<i64>,
    pub is_active: bool,
    pub start_month: String,
    pub end_month: String,
    pub last_generated_month: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewFixedExpense {
    pub title: String,
    pub amount: Decimal,
    pub scheduled_day: u32,
    pub category_id: Option<i64>,
    pub start_month: String,
    pub end_month: String,
}

#[derive(Debug, Clone, Default)]
pub struct FixedExpensePatch {
    pub title: Option<String>,
    pub amount: Option<Decimal>,
    pub scheduled_day: Option<u32>,
    pub category_id: Option<i64>,
    pub start_month: Option<String>,
    pub end_month: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FixedSaving {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub amount: Decimal,
    pub scheduled_day: u32,
    pub asset_id: i64,
    pub is_active: bool,
    pub start_month: String,
    pub end_month: String,
    pub last_generated_month: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewFixedSaving {
    pub title: String,
    pub amount: Decimal,
    pub scheduled_day: u32,
    pub asset_id: i64,
    pub start_month: String,
    pub end_month: String,
}

#[derive(Debug, Clone, Default)]
pub struct FixedSavingPatch {
    pub title: Option<String>,
    pub amount: Option<Decimal>,
    pub scheduled_day: Option<u32>,
    pub asset_id: Option<i64>,
    pub start_month: Option<String>,
    pub end_month: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Goal {
    pub user_id: i64,
    pub target_amount: Decimal,
    pub initial_amount: Decimal,
}
