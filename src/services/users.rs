//! Authentication and membership service

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use validator::Validate;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::{
        member::{Member, MemberForm, MemberProfile},
        user::{RegisterForm, User, UserClaims},
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
    config: AuthConfig,
}

impl UsersService {
    pub fn new(repository: Repository, config: AuthConfig) -> Self {
        Self { repository, config }
    }

    /// Register a reader: user account plus member record
    pub async fn register(&self, form: &RegisterForm) -> AppResult<(User, Member)> {
        form.check()?;

        if self.repository.users.username_exists(&form.username).await? {
            return Err(AppError::Validation(
                "username: A user with that username already exists.".to_string(),
            ));
        }

        let hash = self.hash_password(&form.password1)?;
        let (user, member) = self
            .repository
            .users
            .create_with_member(form, &hash)
            .await?;

        tracing::info!(
            "Registered user {} (id={}) as member {}",
            user.username,
            user.id,
            member.membership_id
        );
        Ok((user, member))
    }

    /// Authenticate by username and return a session token
    pub async fn authenticate(&self, username: &str, password: &str) -> AppResult<(String, User)> {
        let invalid = || AppError::Authentication("Invalid username or password.".to_string());

        let user = self
            .repository
            .users
            .get_by_username(username.trim())
            .await?
            .ok_or_else(invalid)?;

        if !self.verify_password(&user, password)? {
            tracing::warn!("Failed login for user {}", user.username);
            return Err(invalid());
        }

        let token = self.create_token_for_user(&user)?;
        tracing::info!("User {} logged in", user.username);
        Ok((token, user))
    }

    /// Decode a session token issued by [`Self::authenticate`]
    pub fn decode_token(&self, token: &str) -> AppResult<UserClaims> {
        UserClaims::from_token(token, &self.config.jwt_secret)
            .map_err(|_| AppError::Authentication("Please log in to continue.".to_string()))
    }

    pub fn create_token_for_user(&self, user: &User) -> AppResult<String> {
        UserClaims::for_user(user, self.config.jwt_expiration_hours)
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }

    /// Staff check against the stored account as well as the token
    pub async fn require_staff(&self, claims: &UserClaims) -> AppResult<()> {
        claims.require_staff()?;

        let still_staff = self
            .repository
            .users
            .get_by_id(claims.user_id)
            .await?
            .is_some_and(|user| user.is_staff);
        if !still_staff {
            tracing::warn!("Staff access refused to {}: flag revoked", claims.sub);
            return Err(AppError::Unauthorized(
                "You are not authorized to access this page.".to_string(),
            ));
        }
        Ok(())
    }

    /// Member record of a user, if the user is a lending member
    pub async fn find_member_for_user(&self, user_id: i32) -> AppResult<Option<Member>> {
        self.repository.members.find_by_user(user_id).await
    }

    pub async fn member_profile(&self, member: &Member) -> AppResult<MemberProfile> {
        self.repository.members.profile(member.id).await
    }

    /// Update the contact details of a member
    pub async fn update_profile(&self, member: &Member, form: &MemberForm) -> AppResult<Member> {
        form.validate()?;
        let member = self.repository.members.update(member.id, form).await?;
        tracing::info!("Member {} updated their profile", member.membership_id);
        Ok(member)
    }

    /// Create the configured staff account if it does not exist yet
    pub async fn ensure_staff_account(&self) -> AppResult<Option<User>> {
        let (Some(username), Some(password)) = (
            self.config.staff_username.as_deref(),
            self.config.staff_password.as_deref(),
        ) else {
            return Ok(None);
        };

        if self.repository.users.username_exists(username).await? {
            tracing::debug!("Staff account {} already present", username);
            return Ok(None);
        }

        let hash = self.hash_password(password)?;
        let user = self.repository.users.create_staff(username, &hash).await?;
        tracing::info!("Created staff account {} (id={})", user.username, user.id);
        Ok(Some(user))
    }

    fn verify_password(&self, user: &User, password: &str) -> AppResult<bool> {
        let parsed_hash = PasswordHash::new(&user.password_hash)
            .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Hash a password using Argon2
    pub fn hash_password(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
        Ok(hash.to_string())
    }
}
