//! Book (catalog) model and related types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, NoneAsEmptyString};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::enums::{BookStatus, Genre};
use crate::error::{AppError, AppResult};

/// Book model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub genre: Genre,
    pub published_date: Option<NaiveDate>,
    pub publisher: String,
    pub description: String,
    pub total_copies: i32,
    pub available_copies: i32,
    pub status: BookStatus,
}

impl Book {
    /// Take one copy off the shelf for a loan
    pub fn check_out(&mut self) -> AppResult<()> {
        if self.available_copies <= 0 {
            return Err(AppError::Unavailable(
                "Sorry, this book is not available for borrowing.".to_string(),
            ));
        }
        self.available_copies -= 1;
        self.status = BookStatus::for_available(self.available_copies);
        Ok(())
    }

    /// Put a returned copy back on the shelf, never above the owned total
    pub fn check_in(&mut self) {
        if self.available_copies < self.total_copies {
            self.available_copies += 1;
        } else {
            tracing::warn!(
                "Book {} returned while all {} copies were already on the shelf",
                self.id,
                self.total_copies
            );
        }
        self.status = BookStatus::for_available(self.available_copies);
    }

    /// Number of copies currently out on loan
    pub fn copies_on_loan(&self) -> i32 {
        self.total_copies - self.available_copies
    }

    /// Change the owned copy count, keeping the loaned copies out
    pub fn resize(&mut self, total_copies: i32) -> AppResult<()> {
        let on_loan = self.copies_on_loan();
        if total_copies < on_loan {
            return Err(AppError::Validation(format!(
                "total_copies: {} copies are currently on loan, the total cannot go below that.",
                on_loan
            )));
        }
        self.total_copies = total_copies;
        self.available_copies = total_copies - on_loan;
        self.status = BookStatus::for_available(self.available_copies);
        Ok(())
    }

    /// Overwrite the staff-editable fields from a trimmed, validated form
    pub fn apply_form(&mut self, form: &BookForm) -> AppResult<()> {
        self.resize(form.total_copies)?;
        self.title = form.title.clone();
        self.author = form.author.clone();
        self.isbn = form.isbn.clone();
        self.genre = form.genre;
        self.published_date = form.published_date;
        self.publisher = form.publisher.clone();
        self.description = form.description.clone();
        Ok(())
    }
}

/// Staff form for creating or editing a book
#[serde_as]
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct BookForm {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,
    #[validate(length(min = 1, max = 100, message = "Author must be 1-100 characters"))]
    pub author: String,
    #[validate(length(min = 1, max = 13, message = "ISBN must be 1-13 characters"))]
    pub isbn: String,
    #[serde(default)]
    pub genre: Genre,
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    pub published_date: Option<NaiveDate>,
    #[serde(default)]
    #[validate(length(max = 100, message = "Publisher must be at most 100 characters"))]
    pub publisher: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_total_copies")]
    #[validate(range(min = 0, max = 10000, message = "Total copies must be between 0 and 10000"))]
    pub total_copies: i32,
}

fn default_total_copies() -> i32 {
    1
}

impl BookForm {
    /// Copy with surrounding whitespace stripped from the text fields
    pub fn trimmed(&self) -> Self {
        Self {
            title: self.title.trim().to_string(),
            author: self.author.trim().to_string(),
            isbn: self.isbn.trim().to_string(),
            publisher: self.publisher.trim().to_string(),
            ..self.clone()
        }
    }
}

/// Catalog search parameters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct BookQuery {
    /// Free text matched against title, author and ISBN
    pub q: Option<String>,
    /// Genre slug (substring match)
    pub genre: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl BookQuery {
    pub const DEFAULT_PER_PAGE: i64 = 20;
    pub const MAX_PER_PAGE: i64 = 100;

    /// Trimmed free-text term, `None` when blank
    pub fn term(&self) -> Option<&str> {
        self.q.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    pub fn genre_filter(&self) -> Option<&str> {
        self.genre.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn per_page(&self) -> i64 {
        self.per_page
            .unwrap_or(Self::DEFAULT_PER_PAGE)
            .clamp(1, Self::MAX_PER_PAGE)
    }

    pub fn offset(&self) -> i64 {
        (self.page() - 1) * self.per_page()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn book(total: i32, available: i32) -> Book {
        Book {
            id: 1,
            title: "Dune".to_string(),
            author: "Frank Herbert".to_string(),
            isbn: "9780441013593".to_string(),
            genre: Genre::Fiction,
            published_date: None,
            publisher: String::new(),
            description: String::new(),
            total_copies: total,
            available_copies: available,
            status: BookStatus::for_available(available),
        }
    }

    #[test]
    fn checking_out_the_last_copy_marks_the_book_borrowed() {
        let mut b = book(1, 1);
        b.check_out().unwrap();
        assert_eq!(b.available_copies, 0);
        assert_eq!(b.status, BookStatus::Borrowed);
    }

    #[test]
    fn checking_out_with_no_copy_left_changes_nothing() {
        let mut b = book(2, 0);
        let err = b.check_out().unwrap_err();
        assert!(matches!(err, AppError::Unavailable(_)));
        assert_eq!(b.available_copies, 0);
        assert_eq!(b.status, BookStatus::Borrowed);
    }

    #[test]
    fn check_in_restores_availability_without_exceeding_total() {
        let mut b = book(2, 0);
        b.check_in();
        assert_eq!(b.available_copies, 1);
        assert_eq!(b.status, BookStatus::Available);
        b.check_in();
        b.check_in();
        assert_eq!(b.available_copies, 2);
    }

    #[test]
    fn copy_counts_stay_in_bounds_over_a_lending_sequence() {
        let mut b = book(3, 3);
        let ops = [true, true, false, true, true, true, false, false, false, false];
        for borrow in ops {
            if borrow {
                let _ = b.check_out();
            } else {
                b.check_in();
            }
            assert!(0 <= b.available_copies && b.available_copies <= b.total_copies);
            assert_eq!(b.status, BookStatus::for_available(b.available_copies));
        }
    }

    #[test]
    fn resize_keeps_loaned_copies_out() {
        let mut b = book(3, 1);
        b.resize(5).unwrap();
        assert_eq!((b.total_copies, b.available_copies), (5, 3));
        b.resize(2).unwrap();
        assert_eq!((b.total_copies, b.available_copies), (2, 0));
        assert_eq!(b.status, BookStatus::Borrowed);
        assert!(matches!(b.resize(1), Err(AppError::Validation(_))));
        assert_eq!((b.total_copies, b.available_copies), (2, 0));
    }

    #[test]
    fn form_accepts_empty_published_date() {
        let form: BookForm = serde_json::from_value(serde_json::json!({
            "title": "Dune",
            "author": "Frank Herbert",
            "isbn": "9780441013593",
            "genre": "non-fiction",
            "published_date": "",
        }))
        .unwrap();
        assert!(form.published_date.is_none());
        assert_eq!(form.genre, Genre::NonFiction);
        assert_eq!(form.total_copies, 1);
        assert!(form.validate().is_ok());

        let dated: BookForm = serde_json::from_value(serde_json::json!({
            "title": "Dune",
            "author": "Frank Herbert",
            "isbn": "9780441013593",
            "published_date": "1965-08-01",
        }))
        .unwrap();
        assert_eq!(dated.published_date, NaiveDate::from_ymd_opt(1965, 8, 1));
        assert_eq!(dated.genre, Genre::Other);
    }

    #[test]
    fn overlong_isbn_is_rejected() {
        let form = BookForm {
            title: "T".into(),
            author: "A".into(),
            isbn: "97804410135931".into(),
            genre: Genre::Other,
            published_date: None,
            publisher: String::new(),
            description: String::new(),
            total_copies: 1,
        };
        assert!(form.validate().is_err());
    }

    #[test]
    fn blank_title_fails_once_trimmed() {
        let form = BookForm {
            title: "   ".into(),
            author: "  Frank Herbert ".into(),
            isbn: " 9780441013593 ".into(),
            genre: Genre::Fiction,
            published_date: None,
            publisher: String::new(),
            description: String::new(),
            total_copies: 1,
        };
        assert!(form.validate().is_ok());

        let trimmed = form.trimmed();
        assert_eq!(trimmed.author, "Frank Herbert");
        assert_eq!(trimmed.isbn, "9780441013593");
        let err: AppError = trimmed.validate().unwrap_err().into();
        assert!(matches!(err, AppError::Validation(msg) if msg.starts_with("title")));
    }

    #[test]
    fn query_paging_is_clamped() {
        let query = BookQuery {
            q: Some("  ".into()),
            genre: Some(" sci ".into()),
            page: Some(0),
            per_page: Some(1000),
        };
        assert_eq!(query.term(), None);
        assert_eq!(query.genre_filter(), Some("sci"));
        assert_eq!(query.page(), 1);
        assert_eq!(query.per_page(), BookQuery::MAX_PER_PAGE);
        assert_eq!(query.offset(), 0);
    }
}
