// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Job search filtering and ordering.
//!
//! Firestore cannot do substring or multi-range filters, so the route reads
//! a bounded set of active jobs and narrows it here.

use crate::models::{Job, JobStatus, WorkMode};
use crate::time_utils::days_since;
use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    #[default]
    CreatedAt,
    Salary,
}

/// Search parameters, all optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobSearch {
    /// Free text over title and description
    pub query: Option<String>,
    pub location: Option<String>,
    pub job_type: Option<String>,
    pub work_mode: Option<WorkMode>,
    pub min_experience: Option<f64>,
    pub max_experience: Option<f64>,
    pub min_salary: Option<i64>,
    /// Comma-separated skill names; any match qualifies
    pub skills: Option<String>,
    pub company: Option<String>,
    /// Only jobs posted within this many days
    pub freshness: Option<i64>,
    #[serde(default)]
    pub sort_by: SortBy,
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.trim().to_lowercase())
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl JobSearch {
    fn skill_list(&self) -> Vec<String> {
        non_empty(&self.skills)
            .map(|s| {
                s.split(',')
                    .map(|p| p.trim().to_lowercase())
                    .filter(|p| !p.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Whether `job` satisfies every provided filter.
    pub fn matches(&self, job: &Job, now: DateTime<Utc>) -> bool {
        if job.status != JobStatus::Active {
            return false;
        }
        if let Some(q) = non_empty(&self.query) {
            if !contains_ci(&job.job_title, q) && !contains_ci(&job.description, q) {
                return false;
            }
        }
        if let Some(loc) = non_empty(&self.location) {
            if !contains_ci(&job.location, loc) {
                return false;
            }
        }
        if let Some(job_type) = non_empty(&self.job_type) {
            if !job.job_type.eq_ignore_ascii_case(job_type) {
                return false;
            }
        }
        if self.work_mode.is_some_and(|m| m != job.work_mode) {
            return false;
        }
        // Experience filters select jobs whose range overlaps the request.
        if let Some(min) = self.min_experience {
            if job.max_experience.is_some_and(|max| max < min) {
                return false;
            }
        }
        if let Some(max) = self.max_experience {
            if job.min_experience.is_some_and(|min| min > max) {
                return false;
            }
        }
        if let Some(min_salary) = self.min_salary {
            let offered = job.max_salary.or(job.min_salary);
            if offered.is_none_or(|s| s < min_salary) {
                return false;
            }
        }
        if let Some(company) = non_empty(&self.company) {
            if !contains_ci(&job.company_name, company) {
                return false;
            }
        }
        let wanted = self.skill_list();
        if !wanted.is_empty() {
            let has_any = job
                .required_skills
                .iter()
                .chain(job.preferred_skills.iter())
                .any(|s| wanted.contains(&s.trim().to_lowercase()));
            if !has_any {
                return false;
            }
        }
        if let Some(days) = self.freshness {
            if days_since(&job.created_at, now) > days {
                return false;
            }
        }
        true
    }

    /// Filter and order jobs, filling in `freshness_days`.
    pub fn apply(&self, jobs: Vec<Job>, now: DateTime<Utc>) -> Vec<Job> {
        let mut found: Vec<Job> = jobs
            .into_iter()
            .filter(|j| self.matches(j, now))
            .map(|mut j| {
                j.freshness_days = days_since(&j.created_at, now);
                j
            })
            .collect();

        match self.sort_by {
            SortBy::CreatedAt => found.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            SortBy::Salary => found.sort_by(|a, b| {
                b.max_salary
                    .or(b.min_salary)
                    .cmp(&a.max_salary.or(a.min_salary))
            }),
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::ats::tests::job;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 21, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_empty_search_matches_active_only() {
        let search = JobSearch::default();
        assert!(search.matches(&job(), now()));

        let mut closed = job();
        closed.status = JobStatus::Closed;
        assert!(!search.matches(&closed, now()));
    }

    #[test]
    fn test_text_and_location() {
        let search = JobSearch {
            query: Some("backend".into()),
            location: Some("bangalore".into()),
            ..Default::default()
        };
        assert!(search.matches(&job(), now()));

        let search = JobSearch {
            query: Some("designer".into()),
            ..Default::default()
        };
        assert!(!search.matches(&job(), now()));
    }

    #[test]
    fn test_experience_overlap_and_salary() {
        let mut j = job();
        j.min_salary = Some(1_000_000);
        j.max_salary = Some(1_800_000);

        let senior = JobSearch {
            min_experience: Some(8.0),
            ..Default::default()
        };
        assert!(!senior.matches(&j, now()));

        let pay = JobSearch {
            min_salary: Some(1_500_000),
            ..Default::default()
        };
        assert!(pay.matches(&j, now()));

        let pay = JobSearch {
            min_salary: Some(2_000_000),
            ..Default::default()
        };
        assert!(!pay.matches(&j, now()));
    }

    #[test]
    fn test_skills_and_freshness() {
        let search = JobSearch {
            skills: Some("go, kubernetes".into()),
            freshness: Some(30),
            ..Default::default()
        };
        assert!(search.matches(&job(), now()));

        let stale = JobSearch {
            freshness: Some(7),
            ..Default::default()
        };
        assert!(!stale.matches(&job(), now()));
    }

    #[test]
    fn test_apply_sorts_and_sets_freshness() {
        let mut older = job();
        older.id = "old".into();
        older.created_at = "2026-01-01T00:00:00Z".into();
        older.max_salary = Some(90);
        let mut newer = job();
        newer.id = "new".into();
        newer.created_at = "2026-01-20T00:00:00Z".into();
        newer.max_salary = Some(50);

        let by_date = JobSearch::default().apply(vec![older.clone(), newer.clone()], now());
        assert_eq!(by_date[0].id, "new");
        assert_eq!(by_date[0].freshness_days, 1);

        let by_salary = JobSearch {
            sort_by: SortBy::Salary,
            ..Default::default()
        }
        .apply(vec![newer, older], now());
        assert_eq!(by_salary[0].id, "old");
    }
}
