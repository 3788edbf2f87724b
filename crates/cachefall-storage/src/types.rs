//! Data types for the user storage abstraction layer.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A user record as stored in the storage backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// The user ID, assigned by the storage backend.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: String,
    /// Job designation.
    pub designation: String,
    /// When the user was originally created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the user was last updated.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl User {
    /// Creates a new `User` with both timestamps set to now.
    #[must_use]
    pub fn new(
        id: i64,
        name: impl Into<String>,
        email: impl Into<String>,
        designation: impl Into<String>,
    ) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            id,
            name: name.into(),
            email: email.into(),
            designation: designation.into(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns a copy of this user with the given fields applied and
    /// `updated_at` refreshed.
    #[must_use]
    pub fn with_update(&self, update: &NewUser) -> Self {
        Self {
            id: self.id,
            name: update.name.clone(),
            email: update.email.clone(),
            designation: update.designation.clone(),
            created_at: self.created_at,
            updated_at: OffsetDateTime::now_utc(),
        }
    }
}

/// Payload for creating or replacing a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewUser {
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: String,
    /// Job designation.
    #[serde(default)]
    pub designation: String,
}

impl NewUser {
    /// Validates the payload, returning a human-readable reason on failure.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name must not be empty".into());
        }
        if self.email.trim().is_empty() {
            return Err("email must not be empty".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_update_preserves_identity() {
        let user = User::new(7, "Alice", "alice@example.com", "Engineer");
        let update = NewUser {
            name: "Alice B".into(),
            email: "alice@example.com".into(),
            designation: "Staff Engineer".into(),
        };

        let updated = user.with_update(&update);
        assert_eq!(updated.id, 7);
        assert_eq!(updated.name, "Alice B");
        assert_eq!(updated.created_at, user.created_at);
        assert!(updated.updated_at >= user.updated_at);
    }

    #[test]
    fn test_new_user_validation() {
        let ok = NewUser {
            name: "Bob".into(),
            email: "bob@example.com".into(),
            designation: String::new(),
        };
        assert!(ok.validate().is_ok());

        let bad = NewUser {
            name: "  ".into(),
            email: "bob@example.com".into(),
            designation: String::new(),
        };
        assert!(bad.validate().is_err());
    }
}
