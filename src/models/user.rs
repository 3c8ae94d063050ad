//! User record as served by the record store, with role-based access control.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    User,
    Moderator,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Moderator => "moderator",
            Self::Admin => "admin",
        }
    }

    /// Moderators and admins may read platform-wide statistics.
    pub fn can_view_platform_stats(&self) -> bool {
        matches!(self, Self::Moderator | Self::Admin)
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "moderator" => Ok(Self::Moderator),
            "admin" => Ok(Self::Admin),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

/// User row from the record store.
///
/// `created_at` stays a raw string: a malformed or missing value must not
/// fail the whole listing, only drop the record from time-based views.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserRecord {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub role: Option<UserRole>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl UserRecord {
    /// Role with the store's default applied.
    pub fn effective_role(&self) -> UserRole {
        self.role.unwrap_or_default()
    }

    pub fn email_field(&self) -> Option<&str> {
        Some(&self.email)
    }

    pub fn display_name_field(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    pub fn created_at_field(&self) -> Option<&str> {
        self.created_at.as_deref()
    }
}

/// Body of a role change request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateRole {
    pub role: UserRole,
}
