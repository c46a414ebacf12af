//! Device classification from request headers.

use crate::models::{DeviceInfo, DeviceType};
use axum::http::HeaderMap;

pub fn device_type(user_agent: &str) -> DeviceType {
    let ua = user_agent.to_lowercase();
    if ua.contains("mobile") {
        if ua.contains("app") {
            DeviceType::MobileApp
        } else {
            DeviceType::MobileBrowser
        }
    } else {
        DeviceType::DesktopBrowser
    }
}

fn browser(ua: &str) -> Option<&'static str> {
    // Order matters: Edge and Opera UAs also contain "Chrome"
    [
        ("edg/", "Edge"),
        ("opr/", "Opera"),
        ("firefox/", "Firefox"),
        ("chrome/", "Chrome"),
        ("safari/", "Safari"),
    ]
    .into_iter()
    .find(|(needle, _)| ua.contains(needle))
    .map(|(_, name)| name)
}

fn os(ua: &str) -> Option<&'static str> {
    [
        ("android", "Android"),
        ("iphone", "iOS"),
        ("ipad", "iOS"),
        ("windows", "Windows"),
        ("mac os", "macOS"),
        ("linux", "Linux"),
    ]
    .into_iter()
    .find(|(needle, _)| ua.contains(needle))
    .map(|(_, name)| name)
}

/// Describe the client from `User-Agent` and the first `X-Forwarded-For` hop.
pub fn from_headers(headers: &HeaderMap) -> DeviceInfo {
    let user_agent = headers
        .get(axum::http::header::USER_AGENT)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("")
        .to_string();
    let ip_address = headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    let lower = user_agent.to_lowercase();
    DeviceInfo {
        device_type: device_type(&user_agent),
        browser: browser(&lower).map(String::from),
        os: os(&lower).map(String::from),
        user_agent,
        ip_address,
    }
}
