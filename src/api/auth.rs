//! Registration, login and logout

use axum::{
    extract::{rejection::FormRejection, State},
    Form, Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppError,
    models::user::{LoginForm, RegisterForm, UserClaims},
    AppState,
};

use super::{
    flash::{render, FlashRedirect, Page, PageResult},
    AuthenticatedUser, SESSION_COOKIE,
};

/// Identity of the caller as shown on pages
#[derive(Serialize, ToSchema)]
pub struct CurrentUser {
    pub user_id: i32,
    pub username: String,
    pub is_staff: bool,
}

impl From<UserClaims> for CurrentUser {
    fn from(claims: UserClaims) -> Self {
        Self {
            user_id: claims.user_id,
            username: claims.sub,
            is_staff: claims.is_staff,
        }
    }
}

/// Context of the login and registration pages
#[derive(Serialize, ToSchema)]
pub struct SessionInfo {
    pub user: Option<CurrentUser>,
}

fn session_info(user: Option<AuthenticatedUser>) -> SessionInfo {
    SessionInfo {
        user: user.map(|AuthenticatedUser(claims)| claims.into()),
    }
}

/// Registration page
#[utoipa::path(
    get,
    path = "/register/",
    tag = "auth",
    responses(
        (status = 200, description = "Registration page context", body = SessionInfo)
    )
)]
pub async fn register_page(
    jar: CookieJar,
    user: Option<AuthenticatedUser>,
) -> (CookieJar, Json<Page<SessionInfo>>) {
    render(jar, session_info(user))
}

/// Create a user account and its member record
#[utoipa::path(
    post,
    path = "/register/",
    tag = "auth",
    request_body(content = RegisterForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Redirect to /login/ on success, back to /register/ with an error otherwise")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    form: Result<Form<RegisterForm>, FormRejection>,
) -> PageResult<FlashRedirect> {
    let Form(form) = form.map_err(|e| AppError::from(e).redirect_to("/register/"))?;
    let (user, _member) = state
        .services
        .users
        .register(&form)
        .await
        .map_err(|e| e.redirect_to("/register/"))?;

    Ok(FlashRedirect::success(
        "/login/",
        format!("Account created for {}! You can now log in.", user.username),
    ))
}

/// Login page
#[utoipa::path(
    get,
    path = "/login/",
    tag = "auth",
    responses(
        (status = 200, description = "Login page context", body = SessionInfo)
    )
)]
pub async fn login_page(
    jar: CookieJar,
    user: Option<AuthenticatedUser>,
) -> (CookieJar, Json<Page<SessionInfo>>) {
    render(jar, session_info(user))
}

/// Authenticate and open a session
#[utoipa::path(
    post,
    path = "/login/",
    tag = "auth",
    request_body(content = LoginForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Redirect home with the session cookie set, or back to /login/")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    form: Result<Form<LoginForm>, FormRejection>,
) -> PageResult<FlashRedirect> {
    let Form(form) = form.map_err(|e| AppError::from(e).redirect_to("/login/"))?;
    let (token, user) = state
        .services
        .users
        .authenticate(&form.username, &form.password)
        .await?;

    let session = Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.config.auth.secure_cookies)
        .build();

    Ok(
        FlashRedirect::success("/", format!("Welcome back, {}!", user.username))
            .with_cookies(jar.add(session)),
    )
}

/// Close the session
#[utoipa::path(
    post,
    path = "/logout/",
    tag = "auth",
    responses(
        (status = 303, description = "Redirect home with the session cookie cleared")
    )
)]
pub async fn logout(jar: CookieJar) -> FlashRedirect {
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    FlashRedirect::success("/", "You have been successfully logged out.").with_cookies(jar)
}
