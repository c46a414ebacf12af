// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Job posting and application routes.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Extension, Json, Router,
};
use futures_util::{stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use validator::Validate;

use crate::db::new_id;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{ApplicationStatus, Job, JobApplication, JobStatus, Role, WorkMode};
use crate::pagination::{paginate, PageParams};
use crate::routes::MessageResponse;
use crate::services::job_search::JobSearch;
use crate::time_utils::{days_since, now_rfc3339};
use crate::AppState;

const SEARCH_PAGE_SIZE: u32 = 20;
const MAX_CONCURRENT_LOOKUPS: usize = 20;

pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/jobs/jobs", get(search_jobs))
        .route("/api/jobs/jobs/{job_id}", get(get_job))
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/jobs/jobs", post(create_job))
        .route("/api/jobs/jobs/{job_id}", put(update_job).delete(delete_job))
        .route("/api/jobs/my-jobs", get(my_jobs))
        .route("/api/jobs/applications", post(apply))
        .route("/api/jobs/applications/my-applications", get(my_applications))
        .route("/api/jobs/applications/job/{job_id}", get(job_applications))
        .route("/api/jobs/applications/{application_id}", put(update_application))
}

// ─── Job Postings ────────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
pub struct CreateJobRequest {
    #[validate(length(min = 1, max = 200))]
    pub job_title: String,
    #[validate(length(min = 1, max = 50))]
    pub job_type: String,
    #[validate(length(min = 1, max = 200))]
    pub location: String,
    pub work_mode: WorkMode,
    #[validate(length(min = 1, max = 20000))]
    pub description: String,
    #[serde(default)]
    pub responsibilities: Vec<String>,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub required_skills: Vec<String>,
    #[serde(default)]
    pub preferred_skills: Vec<String>,
    #[validate(range(min = 0.0, max = 60.0))]
    pub min_experience: Option<f64>,
    #[validate(range(min = 0.0, max = 60.0))]
    pub max_experience: Option<f64>,
    #[validate(range(min = 0))]
    pub min_salary: Option<i64>,
    #[validate(range(min = 0))]
    pub max_salary: Option<i64>,
    #[serde(default = "one_opening")]
    #[validate(range(min = 1))]
    pub number_of_openings: u32,
    pub status: Option<JobStatus>,
}

fn one_opening() -> u32 {
    1
}

/// Reject inverted experience or salary ranges.
fn check_ranges(
    min_exp: Option<f64>,
    max_exp: Option<f64>,
    min_salary: Option<i64>,
    max_salary: Option<i64>,
) -> Result<()> {
    if let (Some(min), Some(max)) = (min_exp, max_exp) {
        if min > max {
            return Err(AppError::BadRequest(
                "min_experience cannot exceed max_experience".to_string(),
            ));
        }
    }
    if let (Some(min), Some(max)) = (min_salary, max_salary) {
        if min > max {
            return Err(AppError::BadRequest(
                "min_salary cannot exceed max_salary".to_string(),
            ));
        }
    }
    Ok(())
}

async fn create_job(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<CreateJobRequest>,
) -> Result<(StatusCode, Json<Job>)> {
    auth.require_role(&[Role::Employer])?;
    body.validate()?;
    check_ranges(
        body.min_experience,
        body.max_experience,
        body.min_salary,
        body.max_salary,
    )?;

    let employer = state
        .db
        .get_employer_profile(&auth.user_id)
        .await?
        .ok_or_else(|| {
            AppError::BadRequest("Please complete your company profile first".to_string())
        })?;

    let now = now_rfc3339();
    let job = Job {
        id: new_id(),
        employer_id: auth.user_id.clone(),
        company_name: employer.company_name,
        job_title: body.job_title,
        job_type: body.job_type,
        location: body.location,
        work_mode: body.work_mode,
        description: body.description,
        responsibilities: body.responsibilities,
        requirements: body.requirements,
        required_skills: body.required_skills,
        preferred_skills: body.preferred_skills,
        min_experience: body.min_experience,
        max_experience: body.max_experience,
        min_salary: body.min_salary,
        max_salary: body.max_salary,
        number_of_openings: body.number_of_openings,
        status: body.status.unwrap_or(JobStatus::Active),
        applications_count: 0,
        views_count: 0,
        freshness_days: 0,
        created_at: now.clone(),
        updated_at: now,
    };
    state.db.put_job(&job).await?;

    tracing::info!(job_id = %job.id, employer_id = %job.employer_id, "Job posted");
    Ok((StatusCode::CREATED, Json(job)))
}

/// Job details. Each read counts as a view.
async fn get_job(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
) -> Result<Json<Job>> {
    let mut job = state
        .db
        .record_job_view(&job_id)
        .await?
        .ok_or_else(|| AppError::not_found("Job", &job_id))?;
    job.freshness_days = days_since(&job.created_at, chrono::Utc::now());
    Ok(Json(job))
}

#[derive(Serialize)]
pub struct JobSearchResponse {
    pub jobs: Vec<Job>,
    pub total: usize,
    pub page: u32,
    pub limit: u32,
    pub pages: u32,
}

async fn search_jobs(
    State(state): State<Arc<AppState>>,
    Query(search): Query<JobSearch>,
    Query(page): Query<PageParams>,
) -> Result<Json<JobSearchResponse>> {
    let jobs = state.db.list_active_jobs().await?;
    let found = search.apply(jobs, chrono::Utc::now());
    let page = paginate(found, page, SEARCH_PAGE_SIZE)?;

    Ok(Json(JobSearchResponse {
        jobs: page.items,
        total: page.total,
        page: page.page,
        limit: page.limit,
        pages: page.pages,
    }))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateJobRequest {
    #[validate(length(min = 1, max = 200))]
    pub job_title: Option<String>,
    pub job_type: Option<String>,
    pub location: Option<String>,
    pub work_mode: Option<WorkMode>,
    #[validate(length(min = 1, max = 20000))]
    pub description: Option<String>,
    pub responsibilities: Option<Vec<String>>,
    pub requirements: Option<Vec<String>>,
    pub required_skills: Option<Vec<String>>,
    pub preferred_skills: Option<Vec<String>>,
    #[validate(range(min = 0.0, max = 60.0))]
    pub min_experience: Option<f64>,
    #[validate(range(min = 0.0, max = 60.0))]
    pub max_experience: Option<f64>,
    #[validate(range(min = 0))]
    pub min_salary: Option<i64>,
    #[validate(range(min = 0))]
    pub max_salary: Option<i64>,
    #[validate(range(min = 1))]
    pub number_of_openings: Option<u32>,
    pub status: Option<JobStatus>,
}

impl UpdateJobRequest {
    fn apply(self, job: &mut Job) {
        fn set<T>(slot: &mut T, value: Option<T>) {
            if let Some(v) = value {
                *slot = v;
            }
        }
        set(&mut job.job_title, self.job_title);
        set(&mut job.job_type, self.job_type);
        set(&mut job.location, self.location);
        set(&mut job.work_mode, self.work_mode);
        set(&mut job.description, self.description);
        set(&mut job.responsibilities, self.responsibilities);
        set(&mut job.requirements, self.requirements);
        set(&mut job.required_skills, self.required_skills);
        set(&mut job.preferred_skills, self.preferred_skills);
        if self.min_experience.is_some() {
            job.min_experience = self.min_experience;
        }
        if self.max_experience.is_some() {
            job.max_experience = self.max_experience;
        }
        if self.min_salary.is_some() {
            job.min_salary = self.min_salary;
        }
        if self.max_salary.is_some() {
            job.max_salary = self.max_salary;
        }
        set(&mut job.number_of_openings, self.number_of_openings);
        set(&mut job.status, self.status);
    }
}

/// Load a job the caller owns. Other employers get the same 404 as a
/// missing job.
async fn owned_job(state: &AppState, auth: &AuthUser, job_id: &str) -> Result<Job> {
    state
        .db
        .get_job(job_id)
        .await?
        .filter(|j| j.employer_id == auth.user_id)
        .ok_or_else(|| AppError::NotFound("Job not found or unauthorized".to_string()))
}

async fn update_job(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(job_id): Path<String>,
    Json(body): Json<UpdateJobRequest>,
) -> Result<Json<Job>> {
    auth.require_role(&[Role::Employer])?;
    body.validate()?;

    let mut job = owned_job(&state, &auth, &job_id).await?;
    body.apply(&mut job);
    check_ranges(
        job.min_experience,
        job.max_experience,
        job.min_salary,
        job.max_salary,
    )?;
    job.updated_at = now_rfc3339();
    state.db.put_job(&job).await?;

    Ok(Json(job))
}

async fn delete_job(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(job_id): Path<String>,
) -> Result<Json<MessageResponse>> {
    auth.require_role(&[Role::Employer])?;

    let job = owned_job(&state, &auth, &job_id).await?;
    state.db.delete_job(&job.id).await?;

    tracing::info!(job_id = %job.id, "Job deleted");
    Ok(MessageResponse::new("Job deleted successfully"))
}

async fn my_jobs(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<Vec<Job>>> {
    auth.require_role(&[Role::Employer])?;

    let now = chrono::Utc::now();
    let jobs = state
        .db
        .list_jobs_by_employer(&auth.user_id)
        .await?
        .into_iter()
        .map(|mut j| {
            j.freshness_days = days_since(&j.created_at, now);
            j
        })
        .collect();
    Ok(Json(jobs))
}

// ─── Applications ────────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
pub struct ApplyRequest {
    #[validate(length(min = 1))]
    pub job_id: String,
    #[validate(length(max = 5000))]
    pub cover_letter: Option<String>,
    #[validate(url)]
    pub resume_url: Option<String>,
}

async fn apply(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<ApplyRequest>,
) -> Result<(StatusCode, Json<JobApplication>)> {
    auth.require_role(&[Role::JobSeeker])?;
    body.validate()?;

    let job = state
        .db
        .get_job(&body.job_id)
        .await?
        .filter(|j| j.status == JobStatus::Active)
        .ok_or_else(|| AppError::NotFound("Job not found or no longer active".to_string()))?;

    let now = now_rfc3339();
    let application = JobApplication {
        id: JobApplication::doc_id(&job.id, &auth.user_id),
        job_id: job.id.clone(),
        jobseeker_id: auth.user_id.clone(),
        employer_id: job.employer_id.clone(),
        cover_letter: body.cover_letter,
        resume_url: body.resume_url,
        status: ApplicationStatus::Pending,
        employer_notes: None,
        applied_at: now.clone(),
        updated_at: now,
    };

    if !state.db.submit_application(&application).await? {
        return Err(AppError::BadRequest(
            "You have already applied for this job".to_string(),
        ));
    }
    Ok((StatusCode::CREATED, Json(application)))
}

#[derive(Serialize)]
pub struct MyApplication {
    #[serde(flatten)]
    pub application: JobApplication,
    pub job_title: Option<String>,
    pub company_name: Option<String>,
    pub location: Option<String>,
}

async fn my_applications(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<Vec<MyApplication>>> {
    auth.require_role(&[Role::JobSeeker])?;

    let applications = state
        .db
        .list_applications_by_jobseeker(&auth.user_id)
        .await?;

    let mut job_ids: Vec<String> = applications.iter().map(|a| a.job_id.clone()).collect();
    job_ids.sort();
    job_ids.dedup();
    let lookups = stream::iter(job_ids)
        .map(|id| {
            let db = &state.db;
            async move { db.get_job(&id).await.map(|job| (id, job)) }
        })
        .buffer_unordered(MAX_CONCURRENT_LOOKUPS)
        .collect::<Vec<_>>()
        .await;

    let mut jobs: HashMap<String, Job> = HashMap::new();
    for lookup in lookups {
        if let (id, Some(job)) = lookup? {
            jobs.insert(id, job);
        }
    }

    let enriched = applications
        .into_iter()
        .map(|application| {
            let job = jobs.get(&application.job_id);
            MyApplication {
                job_title: job.map(|j| j.job_title.clone()),
                company_name: job.map(|j| j.company_name.clone()),
                location: job.map(|j| j.location.clone()),
                application,
            }
        })
        .collect();
    Ok(Json(enriched))
}

#[derive(Serialize)]
pub struct ApplicantView {
    #[serde(flatten)]
    pub application: JobApplication,
    pub applicant_name: Option<String>,
    pub applicant_headline: Option<String>,
    pub applicant_location: Option<String>,
    pub applicant_experience: Option<f64>,
    pub applicant_rating: Option<f64>,
}

async fn job_applications(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(job_id): Path<String>,
) -> Result<Json<Vec<ApplicantView>>> {
    auth.require_role(&[Role::Employer])?;

    let job = owned_job(&state, &auth, &job_id).await?;
    let applications = state.db.list_applications_by_job(&job.id).await?;
    let ids: Vec<String> = applications.iter().map(|a| a.jobseeker_id.clone()).collect();
    let profiles: HashMap<String, _> = state
        .db
        .get_jobseeker_profiles(&ids)
        .await?
        .into_iter()
        .map(|p| (p.user_id.clone(), p))
        .collect();

    let views = applications
        .into_iter()
        .map(|application| {
            let profile = profiles.get(&application.jobseeker_id);
            ApplicantView {
                applicant_name: profile.map(|p| p.full_name.clone()),
                applicant_headline: profile.and_then(|p| p.headline.clone()),
                applicant_location: profile.and_then(|p| p.location.clone()),
                applicant_experience: profile.map(|p| p.total_experience_years),
                applicant_rating: profile.and_then(|p| p.overall_rating),
                application,
            }
        })
        .collect();
    Ok(Json(views))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateApplicationRequest {
    pub status: ApplicationStatus,
    #[validate(length(max = 5000))]
    pub employer_notes: Option<String>,
}

async fn update_application(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(application_id): Path<String>,
    Json(body): Json<UpdateApplicationRequest>,
) -> Result<Json<JobApplication>> {
    auth.require_role(&[Role::Employer])?;
    body.validate()?;

    let mut application = state
        .db
        .get_application(&application_id)
        .await?
        .filter(|a| a.employer_id == auth.user_id)
        .ok_or_else(|| AppError::NotFound("Application not found or unauthorized".to_string()))?;

    application.status = body.status;
    if body.employer_notes.is_some() {
        application.employer_notes = body.employer_notes;
    }
    application.updated_at = now_rfc3339();
    state.db.put_application(&application).await?;

    tracing::info!(
        application_id = %application.id,
        status = ?application.status,
        "Application updated"
    );
    Ok(Json(application))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::ats::tests::job;

    #[test]
    fn test_inverted_ranges_rejected() {
        assert!(check_ranges(Some(5.0), Some(2.0), None, None).is_err());
        assert!(check_ranges(None, None, Some(20), Some(10)).is_err());
        assert!(check_ranges(Some(2.0), Some(5.0), Some(10), None).is_ok());
    }

    #[test]
    fn test_partial_job_update() {
        let mut j = job();
        let update = UpdateJobRequest {
            job_title: Some("Staff Engineer".into()),
            job_type: None,
            location: None,
            work_mode: None,
            description: None,
            responsibilities: None,
            requirements: None,
            required_skills: None,
            preferred_skills: None,
            min_experience: None,
            max_experience: Some(12.0),
            min_salary: None,
            max_salary: None,
            number_of_openings: None,
            status: Some(JobStatus::Closed),
        };
        update.apply(&mut j);
        assert_eq!(j.job_title, "Staff Engineer");
        assert_eq!(j.max_experience, Some(12.0));
        assert_eq!(j.status, JobStatus::Closed);
        assert_eq!(j.company_name, "Acme");
    }

    #[test]
    fn test_create_job_defaults() {
        let body: CreateJobRequest = serde_json::from_value(serde_json::json!({
            "job_title": "Rust Developer",
            "job_type": "full_time",
            "location": "Pune",
            "work_mode": "remote",
            "description": "Build services"
        }))
        .unwrap();
        assert_eq!(body.number_of_openings, 1);
        assert!(body.status.is_none());
        assert!(body.validate().is_ok());
    }
}
