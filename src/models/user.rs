//! User model for storage and API.

use serde::{Deserialize, Serialize};
use std::fmt;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Account role. Fixed at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    JobSeeker,
    Employer,
    Interviewer,
    Admin,
}

impl Role {
    pub const ALL: [Role; 4] = [
        Role::JobSeeker,
        Role::Employer,
        Role::Interviewer,
        Role::Admin,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::JobSeeker => "jobseeker",
            Role::Employer => "employer",
            Role::Interviewer => "interviewer",
            Role::Admin => "admin",
        }
    }

    pub fn parse(raw: &str) -> Option<Role> {
        Role::ALL.into_iter().find(|r| r.as_str() == raw)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User account stored in Firestore (document ID = `id`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    /// Lowercased email address, unique
    pub email: String,
    pub phone: Option<String>,
    pub role: Role,
    pub is_verified: bool,
    pub is_active: bool,
    /// Credits granted by bonuses, earnings and admins
    pub credits_free: i64,
    /// Purchased credits, spent before free credits
    pub credits_paid: i64,
    /// SHA-256 (hex) of the outstanding magic-link token
    pub magic_link_hash: Option<String>,
    pub magic_link_created_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub last_login: Option<String>,
}

impl User {
    pub fn new(id: String, email: String, phone: Option<String>, role: Role, now: &str) -> Self {
        Self {
            id,
            email,
            phone,
            role,
            is_verified: false,
            is_active: true,
            credits_free: 0,
            credits_paid: 0,
            magic_link_hash: None,
            magic_link_created_at: None,
            created_at: now.to_string(),
            updated_at: now.to_string(),
            last_login: None,
        }
    }

    pub fn total_credits(&self) -> i64 {
        self.credits_free + self.credits_paid
    }
}

/// User as returned by the API, without login secrets.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PublicUser {
    pub id: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: Role,
    pub is_verified: bool,
    pub is_active: bool,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub credits_free: i64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub credits_paid: i64,
    pub created_at: String,
    pub last_login: Option<String>,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            phone: user.phone,
            role: user.role,
            is_verified: user.is_verified,
            is_active: user.is_active,
            credits_free: user.credits_free,
            credits_paid: user.credits_paid,
            created_at: user.created_at,
            last_login: user.last_login,
        }
    }
}
