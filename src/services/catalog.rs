//! Catalog service: books, search and the pages built on them

use serde::Serialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{Book, BookForm, BookQuery},
        member::Member,
    },
    repository::Repository,
};

/// Number of books featured on the home page
pub const HOME_RECENT_BOOKS: i64 = 6;

/// Home page context
#[derive(Debug, Serialize, ToSchema)]
pub struct HomePage {
    pub recent_books: Vec<Book>,
    pub total_books: i64,
    pub available_books: i64,
}

/// Book detail context, including the caller's own loan if any
#[derive(Debug, Serialize, ToSchema)]
pub struct BookDetail {
    pub book: Book,
    pub user_has_borrowed: bool,
    pub current_transaction_id: Option<i32>,
    pub total_borrow_count: i64,
}

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn get_book(&self, id: i32) -> AppResult<Book> {
        self.repository.books.get_by_id(id).await
    }

    pub async fn search_books(&self, query: &BookQuery) -> AppResult<(Vec<Book>, i64)> {
        self.repository.books.search(query).await
    }

    pub async fn home(&self) -> AppResult<HomePage> {
        Ok(HomePage {
            recent_books: self.repository.books.recent(HOME_RECENT_BOOKS).await?,
            total_books: self.repository.books.count().await?,
            available_books: self.repository.books.count_available().await?,
        })
    }

    /// Book detail; `member` is the caller's member record when logged in
    pub async fn book_detail(&self, id: i32, member: Option<&Member>) -> AppResult<BookDetail> {
        let book = self.repository.books.get_by_id(id).await?;

        let current = match member {
            Some(member) => {
                self.repository
                    .transactions
                    .open_loan_for(book.id, member.id)
                    .await?
            }
            None => None,
        };
        let total_borrow_count = self
            .repository
            .transactions
            .count_borrows_for_book(book.id)
            .await?;

        Ok(BookDetail {
            book,
            user_has_borrowed: current.is_some(),
            current_transaction_id: current.map(|t| t.id),
            total_borrow_count,
        })
    }

    /// Add a book to the catalog
    pub async fn create_book(&self, form: &BookForm) -> AppResult<Book> {
        let form = form.trimmed();
        form.validate()?;
        if self.repository.books.isbn_exists(&form.isbn, None).await? {
            return Err(duplicate_isbn());
        }

        let book = self.repository.books.create(&form).await?;
        tracing::info!("Catalog create: book id={} isbn={}", book.id, book.isbn);
        Ok(book)
    }

    /// Edit a book; the copy count shifts availability by the same delta
    pub async fn update_book(&self, id: i32, form: &BookForm) -> AppResult<Book> {
        let form = form.trimmed();
        form.validate()?;
        if self.repository.books.isbn_exists(&form.isbn, Some(id)).await? {
            return Err(duplicate_isbn());
        }

        let book = self.repository.books.update(id, &form).await?;
        tracing::info!(
            "Catalog update: book id={} copies={}/{}",
            book.id,
            book.available_copies,
            book.total_copies
        );
        Ok(book)
    }
}

fn duplicate_isbn() -> AppError {
    AppError::Validation("isbn: Book with this ISBN already exists.".to_string())
}
