//! Lending service: borrow, return and bulk return

use serde::Serialize;
use utoipa::ToSchema;

use super::today;
use crate::{
    config::LendingConfig,
    error::{AppError, AppResult},
    models::{
        book::Book,
        member::Member,
        transaction::{BulkReturn, Transaction, TransactionDetails},
    },
    repository::Repository,
};

/// Loans of one member, split by state
#[derive(Debug, Serialize, ToSchema)]
pub struct MemberLoans {
    pub current_transactions: Vec<TransactionDetails>,
    pub past_transactions: Vec<TransactionDetails>,
}

#[derive(Clone)]
pub struct LendingService {
    repository: Repository,
    config: LendingConfig,
}

impl LendingService {
    pub fn new(repository: Repository, config: LendingConfig) -> Self {
        Self { repository, config }
    }

    /// Borrow one copy of a book for the member owned by `user_id`
    pub async fn borrow(&self, book_id: i32, user_id: i32) -> AppResult<(Transaction, Book)> {
        self.repository.books.get_by_id(book_id).await?;
        let member = self.member_for(user_id).await?;

        let result = self
            .repository
            .transactions
            .borrow(book_id, member.id, today(), self.config.loan_period_days)
            .await;

        match &result {
            Ok((loan, book)) => tracing::info!(
                "Borrow: member={} book={} transaction={} due={} available={}/{}",
                member.membership_id,
                book.id,
                loan.id,
                loan.due_date,
                book.available_copies,
                book.total_copies
            ),
            Err(e) => tracing::warn!(
                "Borrow rejected: member={} book={}: {}",
                member.membership_id,
                book_id,
                e
            ),
        }
        result
    }

    /// Return a loan; only its borrower may do so
    pub async fn return_loan(
        &self,
        transaction_id: i32,
        user_id: i32,
    ) -> AppResult<(Transaction, Book)> {
        let result = self
            .repository
            .transactions
            .return_loan(transaction_id, user_id, today(), self.config.fine_per_day())
            .await;

        match &result {
            Ok((loan, book)) => tracing::info!(
                "Return: transaction={} book={} fine={} available={}/{}",
                loan.id,
                book.id,
                loan.fine_amount,
                book.available_copies,
                book.total_copies
            ),
            Err(e) => tracing::warn!(
                "Return rejected: transaction={} user={}: {}",
                transaction_id,
                user_id,
                e
            ),
        }
        result
    }

    /// Return every open loan of the caller's member record
    pub async fn return_all(&self, user_id: i32) -> AppResult<BulkReturn> {
        let member = self.member_for(user_id).await?;
        let outcome = self
            .repository
            .transactions
            .return_all(member.id, today(), self.config.fine_per_day())
            .await?;

        if let BulkReturn::Returned(count) = outcome {
            tracing::info!("Bulk return: member={} returned={}", member.membership_id, count);
        }
        Ok(outcome)
    }

    /// Current and past loans of a member, with overdue flags as of today
    pub async fn member_loans(&self, member_id: i32) -> AppResult<MemberLoans> {
        let today = today();
        let current_transactions = self
            .repository
            .transactions
            .list_open_for_member(member_id)
            .await?
            .into_iter()
            .map(|t| t.with_overdue(today))
            .collect();
        let past_transactions = self
            .repository
            .transactions
            .list_closed_for_member(member_id)
            .await?;

        Ok(MemberLoans {
            current_transactions,
            past_transactions,
        })
    }

    async fn member_for(&self, user_id: i32) -> AppResult<Member> {
        self.repository
            .members
            .find_by_user(user_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound("Your account is not a lending member.".to_string())
            })
    }
}
