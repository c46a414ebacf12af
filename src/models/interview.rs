// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Skill-verification interviews.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterviewStatus {
    Pending,
    Assigned,
    Scheduled,
    Completed,
    Cancelled,
    Expired,
}

impl InterviewStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            InterviewStatus::Pending => "pending",
            InterviewStatus::Assigned => "assigned",
            InterviewStatus::Scheduled => "scheduled",
            InterviewStatus::Completed => "completed",
            InterviewStatus::Cancelled => "cancelled",
            InterviewStatus::Expired => "expired",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            InterviewStatus::Completed | InterviewStatus::Cancelled | InterviewStatus::Expired
        )
    }
}

/// A job seeker's paid request to have skills verified.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterviewRequest {
    pub id: String,
    pub jobseeker_id: String,
    pub skills_to_verify: Vec<String>,
    pub preferred_date: Option<String>,
    pub jobseeker_notes: Option<String>,
    pub status: InterviewStatus,
    pub credits_paid: i64,
    pub interviewer_id: Option<String>,
    /// Interviewers whose expertise matched at creation time
    #[serde(default)]
    pub notified_interviewers: Vec<String>,
    pub assigned_at: Option<String>,
    pub assigned_by: Option<String>,
    pub scheduled_at: Option<String>,
    pub completed_at: Option<String>,
    pub admin_notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillRating {
    pub skill: String,
    /// 0.5-5.0 in half steps
    pub rating: f64,
    pub comments: Option<String>,
}

/// Interviewer's verdict for a completed request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterviewRating {
    pub id: String,
    pub interview_request_id: String,
    pub jobseeker_id: String,
    pub interviewer_id: String,
    pub skill_ratings: Vec<SkillRating>,
    /// Mean of skill ratings, one decimal
    pub overall_rating: f64,
    pub feedback: Option<String>,
    pub strengths: Option<String>,
    pub improvements: Option<String>,
    pub credits_earned: i64,
    pub created_at: String,
}
