//! Repository layer for database operations

pub mod books;
pub mod members;
pub mod transactions;
pub mod users;

use sqlx::{Pool, Postgres};

/// Per-table repositories sharing one connection pool
#[derive(Clone)]
pub struct Repository {
    pub books: books::BooksRepository,
    pub members: members::MembersRepository,
    pub transactions: transactions::TransactionsRepository,
    pub users: users::UsersRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            books: books::BooksRepository::new(pool.clone()),
            members: members::MembersRepository::new(pool.clone()),
            transactions: transactions::TransactionsRepository::new(pool.clone()),
            users: users::UsersRepository::new(pool),
        }
    }
}

/// True when the database rejected a write on a unique index
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

/// Case-insensitive `LIKE` pattern matching `term` anywhere
pub(crate) fn contains_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.to_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}
