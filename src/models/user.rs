//! User identity model, registration/login forms and session claims

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::error::AppError;

/// User account from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// Hashed password (argon2)
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_staff: bool,
    pub date_joined: DateTime<Utc>,
}

/// Registration form
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RegisterForm {
    #[validate(length(min = 1, max = 150, message = "Username must be 1-150 characters"))]
    pub username: String,
    #[validate(length(min = 1, max = 30, message = "First name must be 1-30 characters"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 30, message = "Last name must be 1-30 characters"))]
    pub last_name: String,
    #[validate(email(message = "Enter a valid email address"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password1: String,
    pub password2: String,
}

impl RegisterForm {
    /// Field checks plus the password confirmation
    pub fn check(&self) -> Result<(), AppError> {
        self.validate()?;
        if self.password1 != self.password2 {
            return Err(AppError::Validation(
                "password2: The two password fields didn't match.".to_string(),
            ));
        }
        if self.username.trim() != self.username {
            return Err(AppError::Validation(
                "username: Username cannot start or end with whitespace.".to_string(),
            ));
        }
        Ok(())
    }
}

/// Login form
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// JWT claims carried by the session cookie or bearer header
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    pub sub: String,
    pub user_id: i32,
    pub is_staff: bool,
    pub exp: i64,
    pub iat: i64,
}

impl UserClaims {
    pub fn for_user(user: &User, expiration_hours: u64) -> Self {
        let now = Utc::now().timestamp();
        Self {
            sub: user.username.clone(),
            user_id: user.id,
            is_staff: user.is_staff,
            exp: now + (expiration_hours as i64 * 3600),
            iat: now,
        }
    }

    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    pub fn require_staff(&self) -> Result<(), AppError> {
        if self.is_staff {
            Ok(())
        } else {
            Err(AppError::Unauthorized(
                "You are not authorized to access this page.".to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> RegisterForm {
        RegisterForm {
            username: "ada".into(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: "ada@example.org".into(),
            password1: "analytical-engine".into(),
            password2: "analytical-engine".into(),
        }
    }

    fn user(is_staff: bool) -> User {
        User {
            id: 3,
            username: "ada".into(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: "ada@example.org".into(),
            password_hash: String::new(),
            is_staff,
            date_joined: Utc::now(),
        }
    }

    #[test]
    fn valid_registration_passes() {
        assert!(form().check().is_ok());
    }

    #[test]
    fn mismatched_passwords_are_rejected() {
        let mut f = form();
        f.password2 = "something-else".into();
        assert!(matches!(f.check(), Err(AppError::Validation(msg)) if msg.starts_with("password2")));
    }

    #[test]
    fn short_password_and_bad_email_are_reported() {
        let mut f = form();
        f.password1 = "short".into();
        f.password2 = "short".into();
        f.email = "not-an-email".into();
        match f.check() {
            Err(AppError::Validation(msg)) => {
                assert!(msg.contains("email"));
                assert!(msg.contains("password1"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn token_round_trip_keeps_identity() {
        let claims = UserClaims::for_user(&user(true), 1);
        let token = claims.create_token("secret").unwrap();
        let parsed = UserClaims::from_token(&token, "secret").unwrap();
        assert_eq!(parsed.user_id, 3);
        assert_eq!(parsed.sub, "ada");
        assert!(parsed.is_staff);
        assert!(UserClaims::from_token(&token, "other-secret").is_err());
    }

    #[test]
    fn only_staff_pass_the_staff_check() {
        assert!(UserClaims::for_user(&user(true), 1).require_staff().is_ok());
        assert!(matches!(
            UserClaims::for_user(&user(false), 1).require_staff(),
            Err(AppError::Unauthorized(_))
        ));
    }
}
