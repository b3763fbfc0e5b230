//! Lending ledger repository.
//!
//! Every write that touches a loan also updates the copy counter of the
//! book, inside one database transaction with the book row locked.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{FromRow, PgConnection, Pool, Postgres};

use super::{books, is_unique_violation};
use crate::{
    error::{AppError, AppResult},
    models::{
        book::Book,
        enums::TransactionType,
        transaction::{BulkReturn, NewTransaction, Transaction, TransactionDetails},
    },
};

const DETAILS_SELECT: &str = r#"
    SELECT t.id, t.book_id, b.title AS book_title, t.member_id, m.membership_id, u.username,
           t.transaction_type, t.transaction_date, t.due_date, t.return_date,
           t.fine_amount, t.is_returned, t.related_transaction_id
    FROM transactions t
    JOIN books b ON b.id = t.book_id
    JOIN members m ON m.id = t.member_id
    JOIN users u ON u.id = m.user_id
"#;

/// Ledger row together with the user account owning its member
#[derive(Debug, FromRow)]
struct OwnedTransaction {
    #[sqlx(flatten)]
    transaction: Transaction,
    owner_user_id: i32,
}

#[derive(Clone)]
pub struct TransactionsRepository {
    pool: Pool<Postgres>,
}

impl TransactionsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Lend one copy of a book to a member
    pub async fn borrow(
        &self,
        book_id: i32,
        member_id: i32,
        today: NaiveDate,
        loan_period_days: i64,
    ) -> AppResult<(Transaction, Book)> {
        let mut tx = self.pool.begin().await?;

        let mut book = books::lock(&mut *tx, book_id)
            .await?
            .ok_or_else(|| books::not_found(book_id))?;
        book.check_out()?;

        if open_loan(&mut *tx, book_id, member_id).await?.is_some() {
            return Err(AppError::DuplicateBorrow(
                "You have already borrowed this book.".to_string(),
            ));
        }

        let new = NewTransaction::borrow(book_id, member_id, None, today, loan_period_days);
        let loan = insert(&mut *tx, &new).await.map_err(|err| match err {
            AppError::Database(e) if is_unique_violation(&e) => AppError::Conflict(
                "This book was borrowed by you in a concurrent request.".to_string(),
            ),
            other => other,
        })?;
        books::save_availability(&mut *tx, &book).await?;

        tx.commit().await?;
        Ok((loan, book))
    }

    /// Return one loan on behalf of `user_id`
    pub async fn return_loan(
        &self,
        transaction_id: i32,
        user_id: i32,
        today: NaiveDate,
        fine_per_day: Decimal,
    ) -> AppResult<(Transaction, Book)> {
        let mut tx = self.pool.begin().await?;

        let owned = sqlx::query_as::<_, OwnedTransaction>(
            r#"
            SELECT t.*, m.user_id AS owner_user_id
            FROM transactions t
            JOIN members m ON m.id = t.member_id
            WHERE t.id = $1
            FOR UPDATE OF t
            "#,
        )
        .bind(transaction_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| not_found(transaction_id))?;

        if owned.owner_user_id != user_id {
            return Err(AppError::Forbidden(
                "You are not authorized to return this book.".to_string(),
            ));
        }

        let mut loan = owned.transaction;
        let book = close_loan(&mut *tx, &mut loan, today, fine_per_day).await?;

        tx.commit().await?;
        Ok((loan, book))
    }

    /// Return every open loan of a member, all or nothing
    pub async fn return_all(
        &self,
        member_id: i32,
        today: NaiveDate,
        fine_per_day: Decimal,
    ) -> AppResult<BulkReturn> {
        let mut tx = self.pool.begin().await?;

        let mut loans = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT * FROM transactions
            WHERE member_id = $1 AND transaction_type = $2 AND is_returned = FALSE
            ORDER BY book_id
            FOR UPDATE
            "#,
        )
        .bind(member_id)
        .bind(TransactionType::Borrow)
        .fetch_all(&mut *tx)
        .await?;

        if loans.is_empty() {
            return Ok(BulkReturn::Nothing);
        }

        for loan in loans.iter_mut() {
            close_loan(&mut *tx, loan, today, fine_per_day).await?;
        }

        tx.commit().await?;
        Ok(BulkReturn::Returned(loans.len()))
    }

    /// Open borrow of a book by a member, if any
    pub async fn open_loan_for(&self, book_id: i32, member_id: i32) -> AppResult<Option<Transaction>> {
        let mut conn = self.pool.acquire().await?;
        open_loan(&mut *conn, book_id, member_id).await
    }

    /// Number of times a book was ever borrowed
    pub async fn count_borrows_for_book(&self, book_id: i32) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM transactions WHERE book_id = $1 AND transaction_type = $2",
        )
        .bind(book_id)
        .bind(TransactionType::Borrow)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// Loans a member still holds
    pub async fn list_open_for_member(&self, member_id: i32) -> AppResult<Vec<TransactionDetails>> {
        let rows = sqlx::query_as::<_, TransactionDetails>(&format!(
            "{} WHERE t.member_id = $1 AND t.transaction_type = $2 AND t.is_returned = FALSE \
             ORDER BY t.due_date, t.id",
            DETAILS_SELECT
        ))
        .bind(member_id)
        .bind(TransactionType::Borrow)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Closed history of a member: returned borrows and return records
    pub async fn list_closed_for_member(&self, member_id: i32) -> AppResult<Vec<TransactionDetails>> {
        let rows = sqlx::query_as::<_, TransactionDetails>(&format!(
            "{} WHERE t.member_id = $1 AND t.is_returned = TRUE \
             ORDER BY t.transaction_date DESC, t.id DESC",
            DETAILS_SELECT
        ))
        .bind(member_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Latest ledger entries across all members
    pub async fn recent(&self, limit: i64) -> AppResult<Vec<TransactionDetails>> {
        let rows = sqlx::query_as::<_, TransactionDetails>(&format!(
            "{} ORDER BY t.transaction_date DESC, t.id DESC LIMIT $1",
            DETAILS_SELECT
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Count borrows not yet returned
    pub async fn count_active(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM transactions WHERE transaction_type = $1 AND is_returned = FALSE",
        )
        .bind(TransactionType::Borrow)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// Count borrows not yet returned whose due date has passed
    pub async fn count_overdue(&self, today: NaiveDate) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM transactions
            WHERE transaction_type = $1 AND is_returned = FALSE AND due_date < $2
            "#,
        )
        .bind(TransactionType::Borrow)
        .bind(today)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }
}

async fn open_loan(
    conn: &mut PgConnection,
    book_id: i32,
    member_id: i32,
) -> AppResult<Option<Transaction>> {
    let loan = sqlx::query_as::<_, Transaction>(
        r#"
        SELECT * FROM transactions
        WHERE book_id = $1 AND member_id = $2 AND transaction_type = $3 AND is_returned = FALSE
        LIMIT 1
        "#,
    )
    .bind(book_id)
    .bind(member_id)
    .bind(TransactionType::Borrow)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(loan)
}

async fn insert(conn: &mut PgConnection, new: &NewTransaction) -> AppResult<Transaction> {
    let transaction = sqlx::query_as::<_, Transaction>(
        r#"
        INSERT INTO transactions (
            book_id, member_id, transaction_type, due_date, return_date,
            fine_amount, is_returned, related_transaction_id
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING *
        "#,
    )
    .bind(new.book_id)
    .bind(new.member_id)
    .bind(new.transaction_type)
    .bind(new.due_date)
    .bind(new.return_date)
    .bind(new.fine_amount)
    .bind(new.is_returned)
    .bind(new.related_transaction_id)
    .fetch_one(&mut *conn)
    .await?;
    Ok(transaction)
}

/// Close a locked borrow, put its copy back and write the return record
async fn close_loan(
    conn: &mut PgConnection,
    loan: &mut Transaction,
    today: NaiveDate,
    fine_per_day: Decimal,
) -> AppResult<Book> {
    loan.close(today, fine_per_day)?;

    sqlx::query(
        "UPDATE transactions SET is_returned = TRUE, return_date = $1, fine_amount = $2 WHERE id = $3",
    )
    .bind(loan.return_date)
    .bind(loan.fine_amount)
    .bind(loan.id)
    .execute(&mut *conn)
    .await?;

    let mut book = books::lock(&mut *conn, loan.book_id)
        .await?
        .ok_or_else(|| books::not_found(loan.book_id))?;
    book.check_in();
    books::save_availability(&mut *conn, &book).await?;

    insert(&mut *conn, &NewTransaction::return_of(loan, today)).await?;
    Ok(book)
}

fn not_found(id: i32) -> AppError {
    AppError::NotFound(format!("Transaction with id {} not found", id))
}
