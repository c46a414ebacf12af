// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Job postings and applications.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Active,
    Closed,
    Draft,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkMode {
    Onsite,
    Remote,
    Hybrid,
}

/// Job posting (document ID = `id`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub employer_id: String,
    pub company_name: String,
    pub job_title: String,
    /// e.g. `full_time`, `contract`
    pub job_type: String,
    pub location: String,
    pub work_mode: WorkMode,
    pub description: String,
    #[serde(default)]
    pub responsibilities: Vec<String>,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub required_skills: Vec<String>,
    #[serde(default)]
    pub preferred_skills: Vec<String>,
    pub min_experience: Option<f64>,
    pub max_experience: Option<f64>,
    pub min_salary: Option<i64>,
    pub max_salary: Option<i64>,
    pub number_of_openings: u32,
    pub status: JobStatus,
    #[serde(default)]
    pub applications_count: u32,
    #[serde(default)]
    pub views_count: u32,
    /// Days since posting, computed on read
    #[serde(default)]
    pub freshness_days: i64,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Shortlisted,
    Interviewed,
    Rejected,
    Hired,
}

/// A job seeker's application (one per job and applicant).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobApplication {
    pub id: String,
    pub job_id: String,
    pub jobseeker_id: String,
    pub employer_id: String,
    pub cover_letter: Option<String>,
    pub resume_url: Option<String>,
    pub status: ApplicationStatus,
    pub employer_notes: Option<String>,
    pub applied_at: String,
    pub updated_at: String,
}

impl JobApplication {
    /// Deterministic document ID, so a second application for the same job
    /// lands on the same document.
    pub fn doc_id(job_id: &str, jobseeker_id: &str) -> String {
        format!("{}_{}", job_id, jobseeker_id)
    }
}
