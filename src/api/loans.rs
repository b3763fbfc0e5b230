//! Borrow and return endpoints

use axum::extract::{Path, State};
use rust_decimal::Decimal;

use crate::{error::AppError, models::transaction::BulkReturn, AppState};

use super::{
    flash::{FlashRedirect, PageError, PageResult},
    AuthenticatedUser,
};

/// Borrow one copy of a book
#[utoipa::path(
    post,
    path = "/borrow/{id}/",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 303, description = "Redirect to /profile/ on success, back to the book with an error otherwise")
    )
)]
pub async fn borrow_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> PageResult<FlashRedirect> {
    let (loan, book) = state
        .services
        .lending
        .borrow(id, claims.user_id)
        .await
        .map_err(|e| match e {
            AppError::NotFound(_) => PageError::from(e),
            e => e.redirect_to(format!("/book/{}/", id)),
        })?;

    Ok(FlashRedirect::success(
        "/profile/",
        format!(
            "You have successfully borrowed \"{}\". Due date: {}",
            book.title, loan.due_date
        ),
    ))
}

/// Return one of the caller's loans
#[utoipa::path(
    post,
    path = "/return/{id}/",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Transaction ID of the borrow")
    ),
    responses(
        (status = 303, description = "Redirect to /profile/ with the outcome")
    )
)]
pub async fn return_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> PageResult<FlashRedirect> {
    let (loan, book) = state
        .services
        .lending
        .return_loan(id, claims.user_id)
        .await
        .map_err(|e| e.redirect_to("/profile/"))?;

    Ok(FlashRedirect::success(
        "/profile/",
        return_message(&book.title, loan.fine_amount),
    ))
}

/// Return every open loan of the caller
#[utoipa::path(
    post,
    path = "/return-all/",
    tag = "loans",
    security(("bearer_auth" = [])),
    responses(
        (status = 303, description = "Redirect to /profile/ with the number of books returned")
    )
)]
pub async fn return_all(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> PageResult<FlashRedirect> {
    let outcome = state
        .services
        .lending
        .return_all(claims.user_id)
        .await
        .map_err(|e| e.redirect_to("/profile/"))?;

    Ok(match outcome {
        BulkReturn::Nothing => FlashRedirect::info("/profile/", "No books to return."),
        BulkReturn::Returned(count) => FlashRedirect::success(
            "/profile/",
            format!("Successfully returned {} books!", count),
        ),
    })
}

fn return_message(title: &str, fine: Decimal) -> String {
    if fine > Decimal::ZERO {
        format!(
            "You have successfully returned \"{}\". A late fine of {} is due.",
            title, fine
        )
    } else {
        format!("You have successfully returned \"{}\".", title)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fine_is_mentioned_only_when_owed() {
        assert_eq!(
            return_message("Dune", Decimal::ZERO),
            "You have successfully returned \"Dune\"."
        );
        assert_eq!(
            return_message("Dune", Decimal::new(900, 2)),
            "You have successfully returned \"Dune\". A late fine of 9.00 is due."
        );
    }
}
