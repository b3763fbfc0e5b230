//! Data models for Libris

pub mod book;
pub mod enums;
pub mod member;
pub mod transaction;
pub mod user;

// Re-export commonly used types
pub use book::{Book, BookForm, BookQuery};
pub use enums::{BookStatus, Genre, TransactionType};
pub use member::{Member, MemberForm, MemberProfile};
pub use transaction::{BulkReturn, NewTransaction, Transaction, TransactionDetails};
pub use user::{LoginForm, RegisterForm, User, UserClaims};
