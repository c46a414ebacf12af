// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Role-specific profiles and the company directory.
//!
//! Profiles are keyed by the owning user's ID, so each user has at most one
//! profile per kind.

use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Skill {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(range(min = 0.0, max = 60.0))]
    pub years_of_experience: f64,
    #[serde(default)]
    pub is_primary: bool,
    /// Relative importance the candidate assigns, 1-10
    #[serde(default)]
    pub weightage: Option<u8>,
    /// Latest interviewer rating, 0.5-5.0
    #[serde(default)]
    pub rating: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Experience {
    pub company: String,
    pub position: String,
    pub start_date: String,
    pub end_date: Option<String>,
    #[serde(default)]
    pub is_current: bool,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Education {
    pub institution: String,
    pub degree: String,
    pub field_of_study: Option<String>,
    pub start_year: Option<i32>,
    pub end_year: Option<i32>,
    pub grade: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub technologies: Vec<String>,
    pub url: Option<String>,
}

/// Notification and visibility preferences.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileSettings {
    pub email_notifications: bool,
    pub job_alerts: bool,
    pub application_alerts: bool,
    /// `public`, `employers_only` or `private`
    pub profile_visibility: String,
}

impl Default for ProfileSettings {
    fn default() -> Self {
        Self {
            email_notifications: true,
            job_alerts: true,
            application_alerts: true,
            profile_visibility: "public".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSeekerProfile {
    pub user_id: String,
    pub full_name: String,
    pub headline: Option<String>,
    pub summary: Option<String>,
    pub location: Option<String>,
    pub current_company: Option<String>,
    pub current_position: Option<String>,
    pub profile_image_url: Option<String>,
    pub resume_url: Option<String>,
    #[serde(default)]
    pub skills: Vec<Skill>,
    #[serde(default)]
    pub experience: Vec<Experience>,
    #[serde(default)]
    pub education: Vec<Education>,
    #[serde(default)]
    pub projects: Vec<Project>,
    pub theme: Option<String>,
    #[serde(default)]
    pub total_experience_years: f64,
    pub expected_salary: Option<i64>,
    pub notice_period_days: Option<u32>,
    /// Mean of interview overall ratings
    pub overall_rating: Option<f64>,
    #[serde(default)]
    pub verification_count: u32,
    #[serde(default)]
    pub is_profile_complete: bool,
    #[serde(default)]
    pub settings: ProfileSettings,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployerProfile {
    pub user_id: String,
    pub company_name: String,
    pub contact_person: String,
    pub designation: Option<String>,
    pub company_website: Option<String>,
    pub company_size: Option<String>,
    pub industry: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterviewerProfile {
    pub user_id: String,
    pub full_name: String,
    pub headline: Option<String>,
    pub current_company: Option<String>,
    #[serde(default)]
    pub expertise_areas: Vec<String>,
    #[serde(default)]
    pub secondary_expertise: Vec<String>,
    #[serde(default)]
    pub years_of_experience: f64,
    #[serde(default)]
    pub interviews_conducted: u32,
    #[serde(default)]
    pub is_certified: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// Company directory entry used for autocomplete.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Company {
    pub id: String,
    pub name: String,
    /// Lowercased name for prefix matching
    pub name_lower: String,
    /// e.g. `mnc`, `startup`, `new` for self-registered companies
    pub category: String,
    #[serde(default)]
    pub display_order: i32,
    pub created_at: String,
}

impl Company {
    pub fn new(name: &str, category: &str, display_order: i32, now: &str) -> Self {
        let name = name.trim().to_string();
        let name_lower = name.to_lowercase();
        Self {
            id: Self::doc_id(&name),
            name,
            name_lower,
            category: category.to_string(),
            display_order,
            created_at: now.to_string(),
        }
    }

    /// Document ID derived from the case-folded name, so a company can only
    /// be registered once.
    pub fn doc_id(name: &str) -> String {
        urlencoding::encode(&name.trim().to_lowercase()).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_company_doc_id_is_case_insensitive() {
        assert_eq!(Company::doc_id("Acme Corp"), Company::doc_id(" acme corp "));
        assert_eq!(Company::doc_id("A/B"), "a%2Fb");
    }
}
