//! Paid access to a job seeker's contact details.

use serde::{Deserialize, Serialize};

/// Grant allowing an employer to see a job seeker's contact details until
/// `access_expires_at`. Document ID is `{employer_id}_{jobseeker_id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactAccess {
    pub id: String,
    pub employer_id: String,
    pub jobseeker_id: String,
    pub credits_spent: i64,
    pub access_granted_at: String,
    pub access_expires_at: String,
    pub is_active: bool,
    pub revealed_email: String,
    pub revealed_phone: Option<String>,
    pub revealed_current_company: Option<String>,
}

impl ContactAccess {
    pub fn doc_id(employer_id: &str, jobseeker_id: &str) -> String {
        format!("{}_{}", employer_id, jobseeker_id)
    }

    /// Active and not yet expired at `now` (both storage-format timestamps).
    pub fn is_valid_at(&self, now: &str) -> bool {
        self.is_active && self.access_expires_at.as_str() > now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn access(expires: &str, active: bool) -> ContactAccess {
        ContactAccess {
            id: ContactAccess::doc_id("e", "j"),
            employer_id: "e".into(),
            jobseeker_id: "j".into(),
            credits_spent: 10_000,
            access_granted_at: "2025-01-01T00:00:00Z".into(),
            access_expires_at: expires.into(),
            is_active: active,
            revealed_email: "j@example.com".into(),
            revealed_phone: None,
            revealed_current_company: None,
        }
    }

    #[test]
    fn test_validity_window() {
        let now = "2026-01-01T00:00:00Z";
        assert!(access("2026-06-01T00:00:00Z", true).is_valid_at(now));
        assert!(!access("2025-12-31T23:59:59Z", true).is_valid_at(now));
        assert!(!access("2026-06-01T00:00:00Z", false).is_valid_at(now));
    }
}
