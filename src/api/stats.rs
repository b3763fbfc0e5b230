//! Staff dashboard endpoint

use axum::{extract::State, Json};
use axum_extra::extract::cookie::CookieJar;

use crate::{services::stats::Dashboard, AppState};

use super::{
    flash::{render, Page, PageResult},
    AuthenticatedUser,
};

/// Lending statistics for staff
#[utoipa::path(
    get,
    path = "/admin-dashboard/",
    tag = "stats",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Dashboard context", body = Dashboard),
        (status = 303, description = "Caller is not staff, redirect home")
    )
)]
pub async fn dashboard(
    State(state): State<AppState>,
    jar: CookieJar,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> PageResult<(CookieJar, Json<Page<Dashboard>>)> {
    state.services.users.require_staff(&claims).await?;

    let dashboard = state.services.stats.dashboard().await?;
    Ok(render(jar, dashboard))
}
