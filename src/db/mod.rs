//! Database layer (Firestore).

pub mod firestore;

pub use firestore::{Doc, FirestoreDb};

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    /// Singleton pricing document, see [`super::firestore::SETTINGS_DOC_ID`]
    pub const PLATFORM_SETTINGS: &str = "platform_settings";
    pub const CREDIT_TRANSACTIONS: &str = "credit_transactions";
    pub const JOBS: &str = "jobs";
    pub const APPLICATIONS: &str = "applications";
    /// Profiles are keyed by user ID
    pub const JOBSEEKER_PROFILES: &str = "jobseeker_profiles";
    pub const EMPLOYER_PROFILES: &str = "employer_profiles";
    pub const INTERVIEWER_PROFILES: &str = "interviewer_profiles";
    pub const COMPANIES: &str = "companies";
    pub const INTERVIEW_REQUESTS: &str = "interview_requests";
    pub const INTERVIEW_RATINGS: &str = "interview_ratings";
    pub const CONTACT_ACCESS: &str = "contact_access";
    pub const NOTIFICATIONS: &str = "notifications";
    pub const CUSTOM_CODE: &str = "custom_code";
    pub const DONATIONS: &str = "credit_donations";
    pub const SESSIONS: &str = "user_sessions";
    pub const LOGIN_HISTORY: &str = "login_history";
    pub const ACL_OVERRIDES: &str = "acl_overrides";
}

/// Fresh document ID.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
