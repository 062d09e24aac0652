//! Staff user accounts: register, login, mock password reset.

use crate::credentials::{normalize_email, required, PasswordHasher};
use chrono::Utc;
use healthtrack_core::{Credentials, DocId, Error, Result, User, UserSummary};
use healthtrack_storage::UserStore;
use std::sync::Arc;
use tracing::info;

/// Acknowledgement returned by the mock password reset.
pub const USER_RESET_MESSAGE: &str =
    "Password reset instructions sent to your email (simulated).";

/// User-facing operations
pub struct UserAccounts {
    users: Arc<dyn UserStore>,
    hasher: Arc<dyn PasswordHasher>,
}

impl UserAccounts {
    /// Create the service over a user store.
    pub fn new(users: Arc<dyn UserStore>, hasher: Arc<dyn PasswordHasher>) -> Self {
        UserAccounts { users, hasher }
    }

    /// Create a user account.
    ///
    /// # Errors
    /// `ValidationFailed` unless name, email and password are all given;
    /// `DuplicateEmail` if the email is taken.
    pub fn register(&self, credentials: &Credentials) -> Result<UserSummary> {
        let (Some(name), Some(email), Some(password)) = (
            required(&credentials.name),
            required(&credentials.email),
            required(&credentials.password),
        ) else {
            return Err(Error::validation("All fields are required"));
        };
        let email = normalize_email(email);
        if !email.contains('@') {
            return Err(Error::validation(format!("{} is not a valid email", email)));
        }
        if self.users.find_user_by_email(&email)?.is_some() {
            return Err(Error::DuplicateEmail { email });
        }

        let now = Utc::now();
        let user = self.users.insert_user(User {
            id: DocId::new(),
            name: name.to_string(),
            email,
            password_hash: self.hasher.hash(password)?,
            created_at: now,
            updated_at: now,
        })?;
        info!(target: "healthtrack::users", user = %user.id, "User registered");
        Ok(UserSummary::from(&user))
    }

    /// Check an email/password pair.
    pub fn login(&self, credentials: &Credentials) -> Result<UserSummary> {
        let (Some(email), Some(password)) =
            (required(&credentials.email), required(&credentials.password))
        else {
            return Err(Error::validation("Email and password are required"));
        };
        let user = self
            .users
            .find_user_by_email(&normalize_email(email))?
            .ok_or(Error::InvalidCredentials)?;
        if !self.hasher.verify(password, &user.password_hash) {
            return Err(Error::InvalidCredentials);
        }
        Ok(UserSummary::from(&user))
    }

    /// Mock password reset. Nothing is sent.
    pub fn forgot_password(&self, email: Option<&str>) -> Result<&'static str> {
        let email = email.map(normalize_email).unwrap_or_default();
        match self.users.find_user_by_email(&email)? {
            Some(user) => {
                info!(target: "healthtrack::users", user = %user.id, "Password reset requested");
                Ok(USER_RESET_MESSAGE)
            }
            None => Err(Error::not_found("user", email)),
        }
    }
}
