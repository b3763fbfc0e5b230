//! Lending ledger: borrow and return transactions

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::enums::TransactionType;
use crate::error::{AppError, AppResult};

/// Ledger entry from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Transaction {
    pub id: i32,
    pub book_id: i32,
    pub member_id: i32,
    pub transaction_type: TransactionType,
    pub transaction_date: DateTime<Utc>,
    pub due_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub fine_amount: Decimal,
    pub is_returned: bool,
    /// For return records, the borrow they closed
    pub related_transaction_id: Option<i32>,
}

impl Transaction {
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        !self.is_returned && today > self.due_date
    }

    /// Close an open borrow: stamp the return date and compute the fine once
    pub fn close(&mut self, today: NaiveDate, fine_per_day: Decimal) -> AppResult<()> {
        if self.is_returned {
            return Err(AppError::AlreadyReturned(
                "This book has already been returned.".to_string(),
            ));
        }
        self.is_returned = true;
        self.return_date = Some(today);
        self.fine_amount = fine_for(self.due_date, today, fine_per_day);
        Ok(())
    }
}

/// Largest fine the `fine_amount` column holds (NUMERIC(6, 2))
pub const MAX_FINE: Decimal = Decimal::from_parts(999_999, 0, 0, false, 2);

/// Fine owed for returning on `returned` something due on `due`, capped at [`MAX_FINE`]
pub fn fine_for(due: NaiveDate, returned: NaiveDate, fine_per_day: Decimal) -> Decimal {
    let days_overdue = (returned - due).num_days().max(0);
    fine_per_day
        .checked_mul(Decimal::from(days_overdue))
        .map_or(MAX_FINE, |fine| fine.min(MAX_FINE))
}

/// Ledger entry about to be inserted
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub book_id: i32,
    pub member_id: i32,
    pub transaction_type: TransactionType,
    pub due_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub fine_amount: Decimal,
    pub is_returned: bool,
    pub related_transaction_id: Option<i32>,
}

impl NewTransaction {
    /// Open borrow; without an explicit due date the loan period applies
    pub fn borrow(
        book_id: i32,
        member_id: i32,
        due_date: Option<NaiveDate>,
        today: NaiveDate,
        loan_period_days: i64,
    ) -> Self {
        Self {
            book_id,
            member_id,
            transaction_type: TransactionType::Borrow,
            due_date: due_date.unwrap_or(today + Duration::days(loan_period_days)),
            return_date: None,
            fine_amount: Decimal::ZERO,
            is_returned: false,
            related_transaction_id: None,
        }
    }

    /// Terminal audit record for a borrow that was just closed
    pub fn return_of(borrow: &Transaction, today: NaiveDate) -> Self {
        Self {
            book_id: borrow.book_id,
            member_id: borrow.member_id,
            transaction_type: TransactionType::Return,
            due_date: borrow.due_date,
            return_date: Some(today),
            fine_amount: Decimal::ZERO,
            is_returned: true,
            related_transaction_id: Some(borrow.id),
        }
    }
}

/// Ledger entry joined with what a page needs to show it
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct TransactionDetails {
    pub id: i32,
    pub book_id: i32,
    pub book_title: String,
    pub member_id: i32,
    pub membership_id: String,
    pub username: String,
    pub transaction_type: TransactionType,
    pub transaction_date: DateTime<Utc>,
    pub due_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub fine_amount: Decimal,
    pub is_returned: bool,
    pub related_transaction_id: Option<i32>,
    #[sqlx(skip)]
    pub is_overdue: bool,
}

impl TransactionDetails {
    pub fn with_overdue(mut self, today: NaiveDate) -> Self {
        self.is_overdue = !self.is_returned && today > self.due_date;
        self
    }
}

/// Outcome of returning every open loan of a member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "count", rename_all = "snake_case")]
pub enum BulkReturn {
    /// The member had no open loan
    Nothing,
    Returned(usize),
}
