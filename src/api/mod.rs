//! HTTP handlers for Libris pages

pub mod auth;
pub mod books;
pub mod flash;
pub mod health;
pub mod loans;
pub mod openapi;
pub mod stats;
pub mod users;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    routing::{get, post},
    Router,
};
use axum_extra::extract::cookie::CookieJar;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{error::AppError, models::user::UserClaims, AppState};
use flash::PageError;

/// Cookie holding the session token set at login
pub const SESSION_COOKIE: &str = "session";

/// Extractor for the logged-in user, from a bearer header or the session cookie
pub struct AuthenticatedUser(pub UserClaims);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = PageError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)
            .or_else(|| {
                CookieJar::from_headers(&parts.headers)
                    .get(SESSION_COOKIE)
                    .map(|cookie| cookie.value().to_string())
            })
            .ok_or_else(|| {
                AppError::Authentication("Please log in to access this page.".to_string())
            })?;

        let claims = state.services.users.decode_token(&token)?;
        Ok(AuthenticatedUser(claims))
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
}

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let pages = Router::new()
        .route("/health", get(health::health_check))
        // Catalog
        .route("/", get(books::home))
        .route("/books/", get(books::list_books))
        .route("/books/new/", post(books::create_book))
        .route("/book/:id/", get(books::book_detail))
        .route("/book/:id/edit/", post(books::update_book))
        // Accounts
        .route("/register/", get(auth::register_page).post(auth::register))
        .route("/login/", get(auth::login_page).post(auth::login))
        .route("/logout/", get(auth::logout).post(auth::logout))
        .route("/profile/", get(users::profile).post(users::update_profile))
        // Lending
        .route("/borrow/:id/", post(loans::borrow_book))
        .route("/return/:id/", post(loans::return_book))
        .route("/return-all/", post(loans::return_all))
        // Staff
        .route("/admin-dashboard/", get(stats::dashboard))
        .with_state(state);

    Router::new()
        .merge(pages)
        .merge(openapi::create_openapi_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
