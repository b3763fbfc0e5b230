//! One-shot flash messages carried across a redirect in a cookie

use axum::{
    response::{IntoResponse, Redirect, Response},
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{AppError, ErrorResponse};

pub const FLASH_COOKIE: &str = "flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Success,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Error,
            message: message.into(),
        }
    }

    /// Cookie-safe encoding: base64url of the JSON form
    pub fn encode(&self) -> String {
        // Serializing two plain fields cannot fail
        let json = serde_json::to_vec(self).unwrap_or_default();
        URL_SAFE_NO_PAD.encode(json)
    }

    pub fn decode(value: &str) -> Option<Self> {
        let bytes = URL_SAFE_NO_PAD.decode(value).ok()?;
        serde_json::from_slice(&bytes).ok()
    }
}

fn flash_cookie(flash: &Flash) -> Cookie<'static> {
    Cookie::build((FLASH_COOKIE, flash.encode()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

/// `303 See Other` carrying a flash message
pub struct FlashRedirect {
    to: String,
    flash: Flash,
    jar: CookieJar,
}

impl FlashRedirect {
    pub fn new(to: impl Into<String>, flash: Flash) -> Self {
        Self {
            to: to.into(),
            flash,
            jar: CookieJar::new(),
        }
    }

    pub fn success(to: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(to, Flash::success(message))
    }

    pub fn info(to: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(to, Flash::info(message))
    }

    pub fn error(to: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(to, Flash::error(message))
    }

    /// Send other cookie changes (session) along with the redirect
    pub fn with_cookies(mut self, jar: CookieJar) -> Self {
        self.jar = jar;
        self
    }
}

impl IntoResponse for FlashRedirect {
    fn into_response(self) -> Response {
        let jar = self.jar.add(flash_cookie(&self.flash));
        (jar, Redirect::to(&self.to)).into_response()
    }
}

/// Page context together with the flash message it consumed
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub flash: Option<Flash>,
    #[serde(flatten)]
    pub context: T,
}

/// Render a page context, consuming the pending flash message
pub fn render<T: Serialize>(jar: CookieJar, context: T) -> (CookieJar, Json<Page<T>>) {
    let flash = jar
        .get(FLASH_COOKIE)
        .and_then(|cookie| Flash::decode(cookie.value()));
    let jar = if jar.get(FLASH_COOKIE).is_some() {
        jar.remove(Cookie::build(FLASH_COOKIE).path("/"))
    } else {
        jar
    };
    (jar, Json(Page { flash, context }))
}

/// Handler error: user-facing failures go back to a page with an error
/// message, server failures answer 500 with a JSON body
#[derive(Debug)]
pub struct PageError {
    pub error: AppError,
    pub redirect: String,
}

impl PageError {
    pub fn new(error: AppError, redirect: impl Into<String>) -> Self {
        Self {
            error,
            redirect: redirect.into(),
        }
    }
}

impl From<AppError> for PageError {
    fn from(error: AppError) -> Self {
        let redirect = error.default_redirect();
        Self::new(error, redirect)
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        match self.error.user_message() {
            Some(message) => FlashRedirect::error(self.redirect, message).into_response(),
            None => {
                let body = ErrorResponse::from_error(&self.error);
                (self.error.status(), Json(body)).into_response()
            }
        }
    }
}

/// Result type of page handlers
pub type PageResult<T> = Result<T, PageError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, HeaderMap, HeaderValue, StatusCode};

    #[test]
    fn flash_survives_cookie_encoding() {
        let flash = Flash::success("You have successfully borrowed \"Dune\". Due date: 2024-05-15");
        let encoded = flash.encode();
        assert!(!encoded.contains(['"', ';', ',', ' ']));
        assert_eq!(Flash::decode(&encoded), Some(flash));
        assert_eq!(Flash::decode("%%%not-base64"), None);
    }

    #[test]
    fn redirect_is_see_other_with_flash_cookie() {
        let response = FlashRedirect::info("/profile/", "No books to return.").into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/profile/");

        let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
        let value = set_cookie
            .strip_prefix("flash=")
            .and_then(|rest| rest.split(';').next())
            .unwrap();
        assert_eq!(Flash::decode(value), Some(Flash::info("No books to return.")));
    }

    #[test]
    fn user_facing_errors_redirect_with_error_flash() {
        let response = PageError::from(AppError::Authentication("Please log in.".into())).into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/login/");

        let response = AppError::AlreadyReturned("This book has already been returned.".into())
            .redirect_to("/profile/")
            .into_response();
        assert_eq!(response.headers()[header::LOCATION], "/profile/");
    }

    #[test]
    fn server_failures_are_plain_500() {
        let response = PageError::from(AppError::Internal("boom".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.headers().get(header::LOCATION).is_none());
    }

    #[test]
    fn rendering_consumes_the_pending_flash() {
        let mut headers = HeaderMap::new();
        let cookie = format!("flash={}", Flash::error("Invalid username or password.").encode());
        headers.insert(header::COOKIE, HeaderValue::from_str(&cookie).unwrap());

        let (jar, Json(page)) = render(CookieJar::from_headers(&headers), serde_json::json!({"x": 1}));
        assert_eq!(page.flash, Some(Flash::error("Invalid username or password.")));
        assert!(jar.get(FLASH_COOKIE).is_none());

        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["x"], 1);
        assert_eq!(json["flash"]["level"], "error");
    }
}
