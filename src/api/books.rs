//! Catalog pages and staff book management

use axum::{
    extract::{rejection::FormRejection, Path, Query, State},
    Form, Json,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppError,
    models::{
        book::{Book, BookForm, BookQuery},
        enums::Genre,
    },
    services::catalog::{BookDetail, HomePage},
    AppState,
};

use super::{
    flash::{render, FlashRedirect, Page, PageResult},
    AuthenticatedUser,
};

/// Genre choice offered by the search form
#[derive(Serialize, ToSchema)]
pub struct GenreChoice {
    pub value: Genre,
    pub label: &'static str,
}

/// Catalog search page context
#[derive(Serialize, ToSchema)]
pub struct BookListPage {
    pub books: Vec<Book>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub query: Option<String>,
    pub genre_filter: Option<String>,
    pub genres: Vec<GenreChoice>,
}

/// Home page: most recent books and catalog totals
#[utoipa::path(
    get,
    path = "/",
    tag = "books",
    responses(
        (status = 200, description = "Home page context", body = HomePage)
    )
)]
pub async fn home(
    State(state): State<AppState>,
    jar: CookieJar,
) -> PageResult<(CookieJar, Json<Page<HomePage>>)> {
    let home = state.services.catalog.home().await?;
    Ok(render(jar, home))
}

/// Search and filter the catalog
#[utoipa::path(
    get,
    path = "/books/",
    tag = "books",
    params(BookQuery),
    responses(
        (status = 200, description = "Matching books", body = BookListPage)
    )
)]
pub async fn list_books(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<BookQuery>,
) -> PageResult<(CookieJar, Json<Page<BookListPage>>)> {
    let (books, total) = state.services.catalog.search_books(&query).await?;

    let page = BookListPage {
        books,
        total,
        page: query.page(),
        per_page: query.per_page(),
        query: query.term().map(str::to_string),
        genre_filter: query.genre_filter().map(str::to_string),
        genres: Genre::ALL
            .iter()
            .map(|g| GenreChoice {
                value: *g,
                label: g.label(),
            })
            .collect(),
    };
    Ok(render(jar, page))
}

/// Book detail, with the caller's open loan when logged in
#[utoipa::path(
    get,
    path = "/book/{id}/",
    tag = "books",
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book detail context", body = BookDetail),
        (status = 303, description = "Book not found, redirect home")
    )
)]
pub async fn book_detail(
    State(state): State<AppState>,
    jar: CookieJar,
    user: Option<AuthenticatedUser>,
    Path(id): Path<i32>,
) -> PageResult<(CookieJar, Json<Page<BookDetail>>)> {
    let member = match user {
        Some(AuthenticatedUser(claims)) => {
            state
                .services
                .users
                .find_member_for_user(claims.user_id)
                .await?
        }
        None => None,
    };

    let detail = state
        .services
        .catalog
        .book_detail(id, member.as_ref())
        .await?;
    Ok(render(jar, detail))
}

/// Add a book to the catalog (staff only)
#[utoipa::path(
    post,
    path = "/books/new/",
    tag = "books",
    security(("bearer_auth" = [])),
    request_body(content = BookForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Redirect to the new book, or back with an error")
    )
)]
pub async fn create_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    form: Result<Form<BookForm>, FormRejection>,
) -> PageResult<FlashRedirect> {
    claims.require_staff()?;
    let Form(form) = form.map_err(|e| AppError::from(e).redirect_to("/books/"))?;
    state.services.users.require_staff(&claims).await?;

    let book = state
        .services
        .catalog
        .create_book(&form)
        .await
        .map_err(|e| e.redirect_to("/books/"))?;

    Ok(FlashRedirect::success(
        format!("/book/{}/", book.id),
        format!("Book \"{}\" has been added to the catalog.", book.title),
    ))
}

/// Edit a book (staff only)
#[utoipa::path(
    post,
    path = "/book/{id}/edit/",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    request_body(content = BookForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Redirect to the book page")
    )
)]
pub async fn update_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    form: Result<Form<BookForm>, FormRejection>,
) -> PageResult<FlashRedirect> {
    claims.require_staff()?;
    let Form(form) =
        form.map_err(|e| AppError::from(e).redirect_to(format!("/book/{}/", id)))?;
    state.services.users.require_staff(&claims).await?;

    let book = state
        .services
        .catalog
        .update_book(id, &form)
        .await
        .map_err(|e| e.redirect_to(format!("/book/{}/", id)))?;

    Ok(FlashRedirect::success(
        format!("/book/{}/", book.id),
        format!("Book \"{}\" has been updated.", book.title),
    ))
}
