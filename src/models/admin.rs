// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Admin-managed content: banners, injected code, donations, ACL overrides.

use crate::models::Role;
use serde::{Deserialize, Serialize};

/// Audience of a notification banner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BannerType {
    Public,
    JobSeeker,
    Employer,
    Interviewer,
    Admin,
}

impl BannerType {
    /// Banner audience matching a signed-in role.
    pub fn for_role(role: Role) -> Self {
        match role {
            Role::JobSeeker => BannerType::JobSeeker,
            Role::Employer => BannerType::Employer,
            Role::Interviewer => BannerType::Interviewer,
            Role::Admin => BannerType::Admin,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationBanner {
    pub id: String,
    pub title: String,
    pub message: String,
    pub banner_type: BannerType,
    /// Set for banners addressed to one user (e.g. donation notices)
    pub target_user_id: Option<String>,
    pub is_active: bool,
    #[serde(default)]
    pub priority: i32,
    pub bg_color: Option<String>,
    pub text_color: Option<String>,
    pub icon: Option<String>,
    pub link_url: Option<String>,
    pub link_text: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub created_by: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeType {
    Css,
    Js,
}

/// Admin-authored CSS/JS injected into every page by the frontend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomCode {
    pub id: String,
    pub name: String,
    pub code_type: CodeType,
    pub code: String,
    pub is_active: bool,
    pub created_by: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Record of credits gifted by an admin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditDonation {
    pub id: String,
    pub user_id: String,
    pub amount: i64,
    pub reason: Option<String>,
    pub donated_by: String,
    pub notification_id: Option<String>,
    pub transaction_id: String,
    pub created_at: String,
}

/// Admin override of one cell in the default permission matrix.
/// Document ID is `{role}_{resource}_{action}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AclOverride {
    pub id: String,
    pub role: Role,
    pub resource: String,
    pub action: String,
    pub allowed: bool,
    pub updated_at: String,
    pub updated_by: String,
}

impl AclOverride {
    pub fn doc_id(role: Role, resource: &str, action: &str) -> String {
        format!("{}_{}_{}", role.as_str(), resource, action)
    }
}
