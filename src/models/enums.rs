//! Shared domain enums, stored as TEXT slugs

use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, Postgres};
use utoipa::ToSchema;

/// Maps an enum with `as_str`/`FromStr` onto a Postgres TEXT column
macro_rules! text_column {
    ($ty:ty) => {
        impl sqlx::Type<Postgres> for $ty {
            fn type_info() -> sqlx::postgres::PgTypeInfo {
                <String as sqlx::Type<Postgres>>::type_info()
            }

            fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
                <String as sqlx::Type<Postgres>>::compatible(ty)
            }
        }

        impl<'r> Decode<'r, Postgres> for $ty {
            fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
                let s = <&str as Decode<Postgres>>::decode(value)?;
                s.parse().map_err(|e: String| e.into())
            }
        }

        impl Encode<'_, Postgres> for $ty {
            fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
                <&str as Encode<Postgres>>::encode(self.as_str(), buf)
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Genre
// ---------------------------------------------------------------------------

/// Book genre classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Genre {
    Fiction,
    NonFiction,
    Science,
    Technology,
    History,
    Biography,
    Children,
    #[default]
    Other,
}

impl Genre {
    pub const ALL: [Genre; 8] = [
        Genre::Fiction,
        Genre::NonFiction,
        Genre::Science,
        Genre::Technology,
        Genre::History,
        Genre::Biography,
        Genre::Children,
        Genre::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Genre::Fiction => "fiction",
            Genre::NonFiction => "non-fiction",
            Genre::Science => "science",
            Genre::Technology => "technology",
            Genre::History => "history",
            Genre::Biography => "biography",
            Genre::Children => "children",
            Genre::Other => "other",
        }
    }

    /// Human readable label
    pub fn label(&self) -> &'static str {
        match self {
            Genre::Fiction => "Fiction",
            Genre::NonFiction => "Non-Fiction",
            Genre::Science => "Science",
            Genre::Technology => "Technology",
            Genre::History => "History",
            Genre::Biography => "Biography",
            Genre::Children => "Children",
            Genre::Other => "Other",
        }
    }
}

impl std::str::FromStr for Genre {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Genre::ALL
            .into_iter()
            .find(|g| g.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Invalid genre: {}", s))
    }
}

text_column!(Genre);

// ---------------------------------------------------------------------------
// BookStatus
// ---------------------------------------------------------------------------

/// Shelf status of a book, derived from its available copies.
///
/// `Reserved` is a legal stored value but no operation ever produces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum BookStatus {
    Available,
    Borrowed,
    Reserved,
}

impl BookStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookStatus::Available => "available",
            BookStatus::Borrowed => "borrowed",
            BookStatus::Reserved => "reserved",
        }
    }

    /// Status implied by a count of copies on the shelf
    pub fn for_available(available_copies: i32) -> Self {
        if available_copies > 0 {
            BookStatus::Available
        } else {
            BookStatus::Borrowed
        }
    }
}

impl std::str::FromStr for BookStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "available" => Ok(BookStatus::Available),
            "borrowed" => Ok(BookStatus::Borrowed),
            "reserved" => Ok(BookStatus::Reserved),
            _ => Err(format!("Invalid book status: {}", s)),
        }
    }
}

text_column!(BookStatus);

// ---------------------------------------------------------------------------
// TransactionType
// ---------------------------------------------------------------------------

/// Kind of ledger entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Borrow,
    Return,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Borrow => "borrow",
            TransactionType::Return => "return",
        }
    }
}

impl std::str::FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "borrow" => Ok(TransactionType::Borrow),
            "return" => Ok(TransactionType::Return),
            _ => Err(format!("Invalid transaction type: {}", s)),
        }
    }
}

text_column!(TransactionType);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn genre_slugs_round_trip_through_serde_and_from_str() {
        for genre in Genre::ALL {
            let json = serde_json::to_string(&genre).unwrap();
            assert_eq!(json, format!("\"{}\"", genre.as_str()));
            assert_eq!(genre.as_str().parse::<Genre>().unwrap(), genre);
        }
        assert_eq!("Non-Fiction".parse::<Genre>().unwrap(), Genre::NonFiction);
        assert!("poetry".parse::<Genre>().is_err());
    }

    #[test]
    fn status_follows_available_copies() {
        assert_eq!(BookStatus::for_available(3), BookStatus::Available);
        assert_eq!(BookStatus::for_available(1), BookStatus::Available);
        assert_eq!(BookStatus::for_available(0), BookStatus::Borrowed);
    }

    #[test]
    fn reserved_is_parsed_but_never_derived() {
        assert_eq!("reserved".parse::<BookStatus>().unwrap(), BookStatus::Reserved);
        assert!((-1..5).all(|n| BookStatus::for_available(n) != BookStatus::Reserved));
    }
}
