//! Books repository for database operations

use sqlx::{PgConnection, Pool, Postgres};

use super::{contains_pattern, is_unique_violation};
use crate::{
    error::{AppError, AppResult},
    models::{
        book::{Book, BookForm, BookQuery},
        enums::BookStatus,
    },
};

const BOOK_COLUMNS: &str = "id, title, author, isbn, genre, published_date, publisher, \
                            description, total_copies, available_copies, status";

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get book by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Book> {
        sqlx::query_as::<_, Book>(&format!("SELECT {} FROM books WHERE id = $1", BOOK_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found(id))
    }

    /// Search books with pagination
    pub async fn search(&self, query: &BookQuery) -> AppResult<(Vec<Book>, i64)> {
        let mut conditions = Vec::new();
        let mut params: Vec<String> = Vec::new();

        if let Some(term) = query.term() {
            params.push(contains_pattern(term));
            conditions.push(format!(
                "(LOWER(title) LIKE ${n} OR LOWER(author) LIKE ${n} OR LOWER(isbn) LIKE ${n})",
                n = params.len()
            ));
        }

        if let Some(genre) = query.genre_filter() {
            params.push(contains_pattern(genre));
            conditions.push(format!("LOWER(genre) LIKE ${}", params.len()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let count_query = format!("SELECT COUNT(*) FROM books {}", where_clause);
        let mut count_builder = sqlx::query_scalar::<_, i64>(&count_query);
        for param in &params {
            count_builder = count_builder.bind(param);
        }
        let total = count_builder.fetch_one(&self.pool).await?;

        let select_query = format!(
            "SELECT {} FROM books {} ORDER BY title, id LIMIT {} OFFSET {}",
            BOOK_COLUMNS,
            where_clause,
            query.per_page(),
            query.offset()
        );
        let mut select_builder = sqlx::query_as::<_, Book>(&select_query);
        for param in &params {
            select_builder = select_builder.bind(param);
        }
        let books = select_builder.fetch_all(&self.pool).await?;

        Ok((books, total))
    }

    /// Most recently catalogued books
    pub async fn recent(&self, limit: i64) -> AppResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(&format!(
            "SELECT {} FROM books ORDER BY id DESC LIMIT $1",
            BOOK_COLUMNS
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(books)
    }

    pub async fn count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Count books with at least one copy on the shelf
    pub async fn count_available(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books WHERE status = $1")
            .bind(BookStatus::Available)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Check if an ISBN is already catalogued
    pub async fn isbn_exists(&self, isbn: &str, exclude_id: Option<i32>) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM books WHERE isbn = $1 AND ($2::INTEGER IS NULL OR id != $2))",
        )
        .bind(isbn)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// Create a new book; every copy starts on the shelf
    pub async fn create(&self, form: &BookForm) -> AppResult<Book> {
        let book = sqlx::query_as::<_, Book>(&format!(
            r#"
            INSERT INTO books (
                title, author, isbn, genre, published_date, publisher,
                description, total_copies, available_copies, status
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8, $9)
            RETURNING {}
            "#,
            BOOK_COLUMNS
        ))
        .bind(&form.title)
        .bind(&form.author)
        .bind(&form.isbn)
        .bind(form.genre)
        .bind(form.published_date)
        .bind(&form.publisher)
        .bind(&form.description)
        .bind(form.total_copies)
        .bind(BookStatus::for_available(form.total_copies))
        .fetch_one(&self.pool)
        .await
        .map_err(duplicate_isbn)?;

        Ok(book)
    }

    /// Update the editable fields of a book
    pub async fn update(&self, id: i32, form: &BookForm) -> AppResult<Book> {
        let mut tx = self.pool.begin().await?;

        let mut book = lock(&mut *tx, id).await?.ok_or_else(|| not_found(id))?;
        book.apply_form(form)?;

        let book = sqlx::query_as::<_, Book>(&format!(
            r#"
            UPDATE books SET
                title = $1, author = $2, isbn = $3, genre = $4, published_date = $5,
                publisher = $6, description = $7, total_copies = $8,
                available_copies = $9, status = $10
            WHERE id = $11
            RETURNING {}
            "#,
            BOOK_COLUMNS
        ))
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.isbn)
        .bind(book.genre)
        .bind(book.published_date)
        .bind(&book.publisher)
        .bind(&book.description)
        .bind(book.total_copies)
        .bind(book.available_copies)
        .bind(book.status)
        .bind(id)
        .fetch_one(&mut *tx)
        .await
        .map_err(duplicate_isbn)?;

        tx.commit().await?;
        Ok(book)
    }
}

/// Read a book and hold its row lock until the surrounding transaction ends
pub(crate) async fn lock(conn: &mut PgConnection, id: i32) -> AppResult<Option<Book>> {
    let book = sqlx::query_as::<_, Book>(&format!(
        "SELECT {} FROM books WHERE id = $1 FOR UPDATE",
        BOOK_COLUMNS
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(book)
}

/// Persist the copy counter and the status derived from it
pub(crate) async fn save_availability(conn: &mut PgConnection, book: &Book) -> AppResult<()> {
    sqlx::query("UPDATE books SET available_copies = $1, status = $2 WHERE id = $3")
        .bind(book.available_copies)
        .bind(BookStatus::for_available(book.available_copies))
        .bind(book.id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

pub(crate) fn not_found(id: i32) -> AppError {
    AppError::NotFound(format!("Book with id {} not found", id))
}

fn duplicate_isbn(err: sqlx::Error) -> AppError {
    if is_unique_violation(&err) {
        AppError::Validation("isbn: Book with this ISBN already exists.".to_string())
    } else {
        AppError::Database(err)
    }
}
