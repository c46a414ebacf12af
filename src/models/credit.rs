// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Credit ledger entries and platform pricing parameters.

use crate::models::Role;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Direction/kind of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Earn,
    Spend,
    Bonus,
    AdminAdd,
    AdminDeduct,
}

impl TransactionType {
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionType::Earn => "earn",
            TransactionType::Spend => "spend",
            TransactionType::Bonus => "bonus",
            TransactionType::AdminAdd => "admin_add",
            TransactionType::AdminDeduct => "admin_deduct",
        }
    }
}

/// What a ledger entry was for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionCategory {
    SignupBonus,
    InterviewCompletion,
    ContactReveal,
    InterviewRequest,
    InterviewerCertification,
    AdminAdjustment,
    ReferralBonus,
    DailyLogin,
    SessionTime,
}

impl TransactionCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionCategory::SignupBonus => "signup_bonus",
            TransactionCategory::InterviewCompletion => "interview_completion",
            TransactionCategory::ContactReveal => "contact_reveal",
            TransactionCategory::InterviewRequest => "interview_request",
            TransactionCategory::InterviewerCertification => "interviewer_certification",
            TransactionCategory::AdminAdjustment => "admin_adjustment",
            TransactionCategory::ReferralBonus => "referral_bonus",
            TransactionCategory::DailyLogin => "daily_login",
            TransactionCategory::SessionTime => "session_time",
        }
    }
}

/// One balance change. `balance_*` are the balances after the change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditTransaction {
    pub id: String,
    pub user_id: String,
    /// Signed: negative for spends and deductions
    pub amount: i64,
    pub transaction_type: TransactionType,
    pub category: TransactionCategory,
    pub description: String,
    pub reference_id: Option<String>,
    pub reference_type: Option<String>,
    pub balance_free: i64,
    pub balance_paid: i64,
    pub created_at: String,
    pub created_by: Option<String>,
}

/// Admin-tunable prices and bonuses (single document).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformSettings {
    pub contact_reveal_cost: i64,
    pub contact_access_duration_days: i64,
    pub interview_request_cost: i64,
    pub interview_completion_earning: i64,
    pub interviewer_certification_cost: i64,
    pub jobseeker_signup_bonus: i64,
    pub employer_signup_bonus: i64,
    pub interviewer_signup_bonus: i64,
    #[serde(default)]
    pub updated_at: String,
    #[serde(default)]
    pub updated_by: Option<String>,
}

impl Default for PlatformSettings {
    fn default() -> Self {
        Self {
            contact_reveal_cost: 10_000,
            contact_access_duration_days: 365,
            interview_request_cost: 5_000,
            interview_completion_earning: 500,
            interviewer_certification_cost: 0,
            jobseeker_signup_bonus: 200,
            employer_signup_bonus: 10_000,
            interviewer_signup_bonus: 500,
            updated_at: String::new(),
            updated_by: None,
        }
    }
}

impl PlatformSettings {
    /// Credits granted on registration for a role.
    pub fn signup_bonus(&self, role: Role) -> i64 {
        match role {
            Role::JobSeeker => self.jobseeker_signup_bonus,
            Role::Employer => self.employer_signup_bonus,
            Role::Interviewer => self.interviewer_signup_bonus,
            Role::Admin => 0,
        }
    }

    /// Merge the provided fields of an update.
    pub fn apply(&mut self, update: PlatformSettingsUpdate) {
        let PlatformSettingsUpdate {
            contact_reveal_cost,
            contact_access_duration_days,
            interview_request_cost,
            interview_completion_earning,
            interviewer_certification_cost,
            jobseeker_signup_bonus,
            employer_signup_bonus,
            interviewer_signup_bonus,
        } = update;

        let merge = |slot: &mut i64, value: Option<i64>| {
            if let Some(v) = value {
                *slot = v;
            }
        };
        merge(&mut self.contact_reveal_cost, contact_reveal_cost);
        merge(
            &mut self.contact_access_duration_days,
            contact_access_duration_days,
        );
        merge(&mut self.interview_request_cost, interview_request_cost);
        merge(
            &mut self.interview_completion_earning,
            interview_completion_earning,
        );
        merge(
            &mut self.interviewer_certification_cost,
            interviewer_certification_cost,
        );
        merge(&mut self.jobseeker_signup_bonus, jobseeker_signup_bonus);
        merge(&mut self.employer_signup_bonus, employer_signup_bonus);
        merge(&mut self.interviewer_signup_bonus, interviewer_signup_bonus);
    }
}

/// Partial settings update; omitted fields keep their value.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct PlatformSettingsUpdate {
    #[validate(range(min = 0, max = 1_000_000_000))]
    pub contact_reveal_cost: Option<i64>,
    #[validate(range(min = 1, max = 36500))]
    pub contact_access_duration_days: Option<i64>,
    #[validate(range(min = 0, max = 1_000_000_000))]
    pub interview_request_cost: Option<i64>,
    #[validate(range(min = 0, max = 1_000_000_000))]
    pub interview_completion_earning: Option<i64>,
    #[validate(range(min = 0, max = 1_000_000_000))]
    pub interviewer_certification_cost: Option<i64>,
    #[validate(range(min = 0, max = 1_000_000_000))]
    pub jobseeker_signup_bonus: Option<i64>,
    #[validate(range(min = 0, max = 1_000_000_000))]
    pub employer_signup_bonus: Option<i64>,
    #[validate(range(min = 0, max = 1_000_000_000))]
    pub interviewer_signup_bonus: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signup_bonus_defaults() {
        let settings = PlatformSettings::default();
        assert_eq!(settings.signup_bonus(Role::JobSeeker), 200);
        assert_eq!(settings.signup_bonus(Role::Employer), 10_000);
        assert_eq!(settings.signup_bonus(Role::Interviewer), 500);
        assert_eq!(settings.signup_bonus(Role::Admin), 0);
    }

    #[test]
    fn test_partial_update_merges() {
        let mut settings = PlatformSettings::default();
        settings.apply(PlatformSettingsUpdate {
            contact_reveal_cost: Some(7_500),
            ..Default::default()
        });
        assert_eq!(settings.contact_reveal_cost, 7_500);
        assert_eq!(settings.interview_request_cost, 5_000);
    }

    #[test]
    fn test_update_rejects_negative_prices() {
        let update = PlatformSettingsUpdate {
            interview_request_cost: Some(-1),
            ..Default::default()
        };
        assert!(update.validate().is_err());
    }

    #[test]
    fn test_update_caps_large_values() {
        let update = PlatformSettingsUpdate {
            contact_access_duration_days: Some(1_000_000_000_000),
            ..Default::default()
        };
        assert!(update.validate().is_err());

        let update = PlatformSettingsUpdate {
            contact_reveal_cost: Some(i64::MAX),
            ..Default::default()
        };
        assert!(update.validate().is_err());

        let update = PlatformSettingsUpdate {
            contact_access_duration_days: Some(36_500),
            ..Default::default()
        };
        assert!(update.validate().is_ok());
    }

    #[test]
    fn test_category_wire_name_matches_as_str() {
        let json = serde_json::to_string(&TransactionCategory::InterviewerCertification).unwrap();
        assert_eq!(json, "\"interviewer_certification\"");
        assert_eq!(
            serde_json::to_string(&TransactionType::AdminDeduct).unwrap(),
            format!("\"{}\"", TransactionType::AdminDeduct.as_str())
        );
    }
}
