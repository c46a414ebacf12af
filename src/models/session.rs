//! Login sessions and login history.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceType {
    DesktopBrowser,
    MobileBrowser,
    MobileApp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub device_type: DeviceType,
    pub user_agent: String,
    pub ip_address: Option<String>,
    pub browser: Option<String>,
    pub os: Option<String>,
}

/// One issued session token. Document ID = `id` (the JWT `sid` claim).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSession {
    pub id: String,
    pub user_id: String,
    pub device: DeviceInfo,
    pub is_active: bool,
    pub created_at: String,
    pub last_activity: String,
    pub expires_at: String,
    pub logged_out_at: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoginStatus {
    Success,
    Failed,
    LoggedOut,
    ForcedLogout,
}

/// Audit entry per login. Shares its ID with the session it opened.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginHistory {
    pub id: String,
    pub user_id: String,
    pub email: String,
    pub session_id: String,
    pub device: DeviceInfo,
    pub status: LoginStatus,
    pub login_at: String,
    pub logout_at: Option<String>,
    pub session_duration_secs: Option<i64>,
}
