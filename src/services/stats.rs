//! Statistics service for the staff dashboard

use serde::Serialize;
use utoipa::ToSchema;

use super::today;
use crate::{
    config::LendingConfig, error::AppResult, models::transaction::TransactionDetails,
    repository::Repository,
};

/// Staff dashboard context
#[derive(Debug, Serialize, ToSchema)]
pub struct Dashboard {
    pub total_books: i64,
    pub total_members: i64,
    /// Borrows not yet returned
    pub borrowed_books: i64,
    /// Borrows not yet returned and past their due date
    pub overdue_books: i64,
    pub recent_transactions: Vec<TransactionDetails>,
}

#[derive(Clone)]
pub struct StatsService {
    repository: Repository,
    config: LendingConfig,
}

impl StatsService {
    pub fn new(repository: Repository, config: LendingConfig) -> Self {
        Self { repository, config }
    }

    /// Aggregate counts and the latest ledger entries
    pub async fn dashboard(&self) -> AppResult<Dashboard> {
        let today = today();

        let recent_transactions = self
            .repository
            .transactions
            .recent(self.config.recent_transactions)
            .await?
            .into_iter()
            .map(|t| t.with_overdue(today))
            .collect();

        Ok(Dashboard {
            total_books: self.repository.books.count().await?,
            total_members: self.repository.members.count().await?,
            borrowed_books: self.repository.transactions.count_active().await?,
            overdue_books: self.repository.transactions.count_overdue(today).await?,
            recent_transactions,
        })
    }
}
