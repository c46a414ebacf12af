// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Interview workflow rules: matching, status transitions and ratings.

use crate::error::AppError;
use crate::models::{
    InterviewRequest, InterviewStatus, InterviewerProfile, JobSeekerProfile, SkillRating,
};
use std::collections::HashSet;

pub const MIN_RATING: f64 = 0.5;
pub const MAX_RATING: f64 = 5.0;

fn fold(s: &str) -> String {
    s.trim().to_lowercase()
}

/// IDs of interviewers whose primary expertise covers any requested skill.
pub fn matching_interviewers(skills: &[String], interviewers: &[InterviewerProfile]) -> Vec<String> {
    let wanted: HashSet<String> = skills.iter().map(|s| fold(s)).collect();
    interviewers
        .iter()
        .filter(|p| p.expertise_areas.iter().any(|e| wanted.contains(&fold(e))))
        .map(|p| p.user_id.clone())
        .collect()
}

/// What an interviewer may pick up: every pending request plus any request
/// that notified them, whatever its status. Newest first, no duplicates.
pub fn available_for(
    pending: Vec<InterviewRequest>,
    notified: Vec<InterviewRequest>,
) -> Vec<InterviewRequest> {
    let mut requests = pending;
    for request in notified {
        if !requests.iter().any(|r| r.id == request.id) {
            requests.push(request);
        }
    }
    requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    requests
}

/// Allowed forward moves. Cancelling or expiring is possible from any
/// non-terminal state.
pub fn can_transition(from: InterviewStatus, to: InterviewStatus) -> bool {
    use InterviewStatus::*;
    if from == to {
        return !from.is_terminal();
    }
    match (from, to) {
        (_, Cancelled) | (_, Expired) => !from.is_terminal(),
        (Pending, Assigned) => true,
        (Assigned, Scheduled) | (Assigned, Pending) => true,
        (Assigned, Completed) | (Scheduled, Completed) => true,
        (Scheduled, Assigned) => true,
        _ => false,
    }
}

/// A rating must be within 0.5..=5.0 and a multiple of 0.5.
pub fn is_valid_rating(value: f64) -> bool {
    (MIN_RATING..=MAX_RATING).contains(&value) && (value * 2.0).fract() == 0.0
}

/// Validate ratings and return their mean rounded to one decimal.
pub fn overall_rating(ratings: &[SkillRating]) -> Result<f64, AppError> {
    if ratings.is_empty() {
        return Err(AppError::BadRequest(
            "At least one skill rating is required".to_string(),
        ));
    }
    if let Some(bad) = ratings.iter().find(|r| !is_valid_rating(r.rating)) {
        return Err(AppError::BadRequest(format!(
            "Rating for {} must be between 0.5 and 5.0 in steps of 0.5",
            bad.skill
        )));
    }
    let mean = ratings.iter().map(|r| r.rating).sum::<f64>() / ratings.len() as f64;
    Ok((mean * 10.0).round() / 10.0)
}

/// Fold a completed interview into the job seeker's profile: update the
/// running average, bump the verification count and copy per-skill ratings
/// onto matching skills.
pub fn apply_rating(profile: &mut JobSeekerProfile, overall: f64, ratings: &[SkillRating]) {
    let previous = profile.verification_count as f64;
    let average = match profile.overall_rating {
        Some(current) if profile.verification_count > 0 => {
            (current * previous + overall) / (previous + 1.0)
        }
        _ => overall,
    };
    profile.overall_rating = Some((average * 10.0).round() / 10.0);
    profile.verification_count += 1;

    for rating in ratings {
        let name = fold(&rating.skill);
        if let Some(skill) = profile.skills.iter_mut().find(|s| fold(&s.name) == name) {
            skill.rating = Some(rating.rating);
        }
    }
}
