//! Router tests run in-process.
//!
//! The pool is lazy and never connects: every request here is answered
//! before any database access.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use chrono::Utc;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;

use libris_server::{
    api::{
        self,
        flash::{Flash, FlashLevel},
    },
    models::{User, UserClaims},
    repository::Repository,
    services::Services,
    AppConfig, AppState,
};

fn app() -> (Router, AppConfig) {
    let config = AppConfig::default();
    let pool = PgPoolOptions::new()
        .connect_lazy(&config.database.url)
        .expect("lazy pool");
    let services = Services::new(Repository::new(pool), &config);
    let state = AppState {
        config: Arc::new(config.clone()),
        services: Arc::new(services),
    };
    (api::create_router(state), config)
}

fn token_for(config: &AppConfig, is_staff: bool) -> String {
    let user = User {
        id: 5,
        username: "reader".into(),
        first_name: "Rea".into(),
        last_name: "Der".into(),
        email: "reader@example.org".into(),
        password_hash: String::new(),
        is_staff,
        date_joined: Utc::now(),
    };
    UserClaims::for_user(&user, 1)
        .create_token(&config.auth.jwt_secret)
        .expect("token")
}

fn flash_of(response: &Response) -> Option<Flash> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|value| value.strip_prefix("flash="))
        .filter_map(|rest| rest.split(';').next())
        .find_map(Flash::decode)
}

fn location(response: &Response) -> &str {
    response.headers()[header::LOCATION].to_str().unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_reports_healthy() {
    let (app, _) = app();
    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "healthy");
}

#[tokio::test]
async fn anonymous_profile_redirects_to_login() {
    let (app, _) = app();
    let response = app
        .oneshot(Request::get("/profile/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login/");
    assert_eq!(flash_of(&response).map(|f| f.level), Some(FlashLevel::Error));
}

#[tokio::test]
async fn anonymous_borrow_redirects_to_login() {
    let (app, _) = app();
    let response = app
        .oneshot(Request::post("/borrow/1/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login/");
}

#[tokio::test]
async fn forged_token_is_treated_as_anonymous() {
    let (app, _) = app();
    let response = app
        .oneshot(
            Request::post("/return-all/")
                .header(header::AUTHORIZATION, "Bearer not.a.token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login/");
}

#[tokio::test]
async fn non_staff_dashboard_access_is_refused_before_any_query() {
    let (app, config) = app();
    let response = app
        .oneshot(
            Request::get("/admin-dashboard/")
                .header(header::AUTHORIZATION, format!("Bearer {}", token_for(&config, false)))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
    assert_eq!(
        flash_of(&response),
        Some(Flash::error("You are not authorized to access this page."))
    );
}

#[tokio::test]
async fn non_staff_cannot_add_books() {
    let (app, config) = app();
    let response = app
        .oneshot(
            Request::post("/books/new/")
                .header(header::COOKIE, format!("session={}", token_for(&config, false)))
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from("title=Dune&author=Frank+Herbert&isbn=9780441013593"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
    assert_eq!(flash_of(&response).map(|f| f.level), Some(FlashLevel::Error));
}

#[tokio::test]
async fn mismatched_registration_goes_back_to_the_form() {
    let (app, _) = app();
    let response = app
        .oneshot(
            Request::post("/register/")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(
                    "username=ada&first_name=Ada&last_name=Lovelace&email=ada%40example.org\
                     &password1=analytical-engine&password2=difference-engine",
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/register/");
    let flash = flash_of(&response).unwrap();
    assert_eq!(flash.level, FlashLevel::Error);
    assert!(flash.message.contains("didn't match"));
}

#[tokio::test]
async fn registration_missing_a_field_goes_back_to_the_form() {
    let (app, _) = app();
    let response = app
        .oneshot(
            Request::post("/register/")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(
                    "username=ada&first_name=Ada&last_name=Lovelace&email=ada%40example.org\
                     &password1=analytical-engine",
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/register/");
    let flash = flash_of(&response).unwrap();
    assert_eq!(flash.level, FlashLevel::Error);
    assert!(flash.message.contains("password2"));
}

#[tokio::test]
async fn login_without_password_goes_back_to_login() {
    let (app, _) = app();
    let response = app
        .oneshot(
            Request::post("/login/")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from("username=ada"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login/");
    assert_eq!(flash_of(&response).map(|f| f.level), Some(FlashLevel::Error));
}

#[tokio::test]
async fn unparsable_book_form_goes_back_to_the_catalog() {
    for body in [
        "title=Dune&author=Frank+Herbert&isbn=9780441013593&genre=poetry",
        "title=Dune&author=Frank+Herbert&isbn=9780441013593&total_copies=abc",
        "title=Dune&author=Frank+Herbert&isbn=9780441013593&published_date=2024-13-40",
    ] {
        let (app, config) = app();
        let response = app
            .oneshot(
                Request::post("/books/new/")
                    .header(header::COOKIE, format!("session={}", token_for(&config, true)))
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{body}");
        assert_eq!(location(&response), "/books/");
        assert_eq!(flash_of(&response).map(|f| f.level), Some(FlashLevel::Error));
    }
}

#[tokio::test]
async fn logout_clears_the_session() {
    let (app, config) = app();
    let response = app
        .oneshot(
            Request::get("/logout/")
                .header(header::COOKIE, format!("session={}", token_for(&config, false)))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
    assert_eq!(
        flash_of(&response),
        Some(Flash::success("You have been successfully logged out."))
    );
    let cleared = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| v.starts_with("session=;") || v.starts_with("session=; "));
    assert!(cleared);
}

#[tokio::test]
async fn login_page_shows_and_consumes_pending_flash() {
    let (app, _) = app();
    let pending = Flash::error("Invalid username or password.");
    let response = app
        .oneshot(
            Request::get("/login/")
                .header(header::COOKIE, format!("flash={}", pending.encode()))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let removed = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| v.starts_with("flash=;"));
    assert!(removed);

    let body = json_body(response).await;
    assert_eq!(body["flash"]["message"], "Invalid username or password.");
    assert!(body["user"].is_null());
}

#[tokio::test]
async fn openapi_document_lists_lending_routes() {
    let (app, _) = app();
    let response = app
        .oneshot(
            Request::get("/api-docs/openapi.json")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let doc = json_body(response).await;
    assert!(doc["paths"]["/borrow/{id}/"].is_object());
    assert!(doc["paths"]["/return-all/"].is_object());
}
