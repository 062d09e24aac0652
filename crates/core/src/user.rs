//! User accounts (staff logins, separate from patients).

use crate::types::DocId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored user account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// System-assigned identity
    pub id: DocId,
    /// Display name
    pub name: String,
    /// Login email, unique across users
    pub email: String,
    /// Credential digest
    pub password_hash: String,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

/// The public view of a user: identity, name and email only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    /// Identity
    pub id: DocId,
    /// Display name
    pub name: String,
    /// Login email
    pub email: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        UserSummary {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

/// Credentials submitted to a login or registration endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Display name (registration only)
    #[serde(default)]
    pub name: Option<String>,
    /// Login email
    #[serde(default)]
    pub email: Option<String>,
    /// Plain-text password
    #[serde(default)]
    pub password: Option<String>,
}
