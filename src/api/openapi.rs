//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{auth, books, flash, health, loans, stats, users};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Libris API",
        version = "1.0.0",
        description = "Library lending pages. GET pages return their view context as JSON; \
                       form posts answer 303 with a `flash` cookie."
    ),
    paths(
        // Health
        health::health_check,
        // Auth
        auth::register_page,
        auth::register,
        auth::login_page,
        auth::login,
        auth::logout,
        // Books
        books::home,
        books::list_books,
        books::book_detail,
        books::create_book,
        books::update_book,
        // Loans
        loans::borrow_book,
        loans::return_book,
        loans::return_all,
        // Users
        users::profile,
        users::update_profile,
        // Stats
        stats::dashboard,
    ),
    components(
        schemas(
            // Auth
            auth::CurrentUser,
            auth::SessionInfo,
            crate::models::user::RegisterForm,
            crate::models::user::LoginForm,
            // Books
            books::BookListPage,
            books::GenreChoice,
            crate::models::book::Book,
            crate::models::book::BookForm,
            crate::models::enums::Genre,
            crate::models::enums::BookStatus,
            crate::services::catalog::HomePage,
            crate::services::catalog::BookDetail,
            // Members and loans
            users::ProfilePage,
            crate::models::member::MemberProfile,
            crate::models::member::MemberForm,
            crate::models::transaction::TransactionDetails,
            crate::models::enums::TransactionType,
            // Stats
            crate::services::stats::Dashboard,
            // Messages
            flash::Flash,
            flash::FlashLevel,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Registration and sessions"),
        (name = "books", description = "Catalog pages and book management"),
        (name = "loans", description = "Borrowing and returning"),
        (name = "users", description = "Member profile"),
        (name = "stats", description = "Staff dashboard")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
