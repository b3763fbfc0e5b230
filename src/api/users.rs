//! Member profile endpoints

use axum::{
    extract::{rejection::FormRejection, State},
    Form, Json,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppError,
    models::{
        member::{Member, MemberForm, MemberProfile},
        transaction::TransactionDetails,
    },
    AppState,
};

use super::{
    flash::{render, FlashRedirect, Page, PageResult},
    AuthenticatedUser,
};

/// Profile page context
#[derive(Serialize, ToSchema)]
pub struct ProfilePage {
    pub member: MemberProfile,
    /// Borrows not yet returned
    pub current_transactions: Vec<TransactionDetails>,
    /// Returned borrows and their return records
    pub past_transactions: Vec<TransactionDetails>,
}

async fn member_of(state: &AppState, user_id: i32) -> Result<Member, AppError> {
    state
        .services
        .users
        .find_member_for_user(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("No member profile is linked to your account.".to_string()))
}

/// Member profile with current and past loans
#[utoipa::path(
    get,
    path = "/profile/",
    tag = "users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Profile context", body = ProfilePage),
        (status = 303, description = "Not logged in, or not a lending member")
    )
)]
pub async fn profile(
    State(state): State<AppState>,
    jar: CookieJar,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> PageResult<(CookieJar, Json<Page<ProfilePage>>)> {
    let member = member_of(&state, claims.user_id).await?;

    let profile = state.services.users.member_profile(&member).await?;
    let loans = state.services.lending.member_loans(member.id).await?;

    Ok(render(
        jar,
        ProfilePage {
            member: profile,
            current_transactions: loans.current_transactions,
            past_transactions: loans.past_transactions,
        },
    ))
}

/// Update phone and address
#[utoipa::path(
    post,
    path = "/profile/",
    tag = "users",
    security(("bearer_auth" = [])),
    request_body(content = MemberForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Redirect to /profile/")
    )
)]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    form: Result<Form<MemberForm>, FormRejection>,
) -> PageResult<FlashRedirect> {
    let Form(form) = form.map_err(|e| AppError::from(e).redirect_to("/profile/"))?;
    let member = member_of(&state, claims.user_id).await?;

    state
        .services
        .users
        .update_profile(&member, &form)
        .await
        .map_err(|e| e.redirect_to("/profile/"))?;

    Ok(FlashRedirect::success("/profile/", "Your profile has been updated!"))
}
