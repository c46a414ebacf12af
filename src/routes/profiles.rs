// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Profile routes for each role, the company directory and ATS ranking.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{
    Company, Education, EmployerProfile, Experience, InterviewerProfile, Job, JobSeekerProfile,
    ProfileSettings, Project, Role, Skill,
};
use crate::services::ats::{self, AtsScore};
use crate::services::profile::completion;
use crate::time_utils::now_rfc3339;
use crate::AppState;

const MIN_SUGGEST_QUERY: usize = 2;
const MAX_SUGGESTIONS: usize = 10;
/// Self-registered companies sort after curated ones.
const NEW_COMPANY_ORDER: i32 = 1000;

pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/profiles/companies/suggest", get(suggest_companies))
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/profiles/jobseeker/profile",
            post(create_jobseeker_profile)
                .get(get_jobseeker_profile)
                .put(update_jobseeker_profile),
        )
        .route("/api/profiles/jobseeker/settings", put(update_jobseeker_settings))
        .route(
            "/api/profiles/employer/profile",
            post(create_employer_profile)
                .get(get_employer_profile)
                .put(update_employer_profile),
        )
        .route(
            "/api/profiles/interviewer/profile",
            post(create_interviewer_profile)
                .get(get_interviewer_profile)
                .put(update_interviewer_profile),
        )
        .route("/api/profiles/companies", post(create_company))
        .route("/api/profiles/ats/rank-multiple", post(rank_applicants))
        .route("/api/profiles/ats/rank", post(rank_self))
}

/// Overwrite `slot` when a value was provided.
fn merge<T>(slot: &mut T, value: Option<T>) {
    if let Some(v) = value {
        *slot = v;
    }
}

/// Overwrite an optional `slot` when a value was provided.
fn merge_opt<T>(slot: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *slot = value;
    }
}

// ─── Job Seeker ──────────────────────────────────────────────

/// Job seeker profile fields. All optional so the same body serves create
/// and partial update; create additionally requires `full_name`.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct JobSeekerProfileInput {
    #[validate(length(min = 1, max = 200))]
    pub full_name: Option<String>,
    #[validate(length(max = 300))]
    pub headline: Option<String>,
    #[validate(length(max = 5000))]
    pub summary: Option<String>,
    pub location: Option<String>,
    pub current_company: Option<String>,
    pub current_position: Option<String>,
    #[validate(url)]
    pub profile_image_url: Option<String>,
    #[validate(url)]
    pub resume_url: Option<String>,
    #[validate(nested)]
    pub skills: Option<Vec<Skill>>,
    pub experience: Option<Vec<Experience>>,
    pub education: Option<Vec<Education>>,
    pub projects: Option<Vec<Project>>,
    pub theme: Option<String>,
    #[validate(range(min = 0.0, max = 60.0))]
    pub total_experience_years: Option<f64>,
    #[validate(range(min = 0))]
    pub expected_salary: Option<i64>,
    pub notice_period_days: Option<u32>,
}

impl JobSeekerProfileInput {
    fn apply(self, profile: &mut JobSeekerProfile) {
        merge(&mut profile.full_name, self.full_name);
        merge_opt(&mut profile.headline, self.headline);
        merge_opt(&mut profile.summary, self.summary);
        merge_opt(&mut profile.location, self.location);
        merge_opt(&mut profile.current_company, self.current_company);
        merge_opt(&mut profile.current_position, self.current_position);
        merge_opt(&mut profile.profile_image_url, self.profile_image_url);
        merge_opt(&mut profile.resume_url, self.resume_url);
        merge(&mut profile.skills, self.skills);
        merge(&mut profile.experience, self.experience);
        merge(&mut profile.education, self.education);
        merge(&mut profile.projects, self.projects);
        merge_opt(&mut profile.theme, self.theme);
        merge(&mut profile.total_experience_years, self.total_experience_years);
        merge_opt(&mut profile.expected_salary, self.expected_salary);
        merge_opt(&mut profile.notice_period_days, self.notice_period_days);
    }
}

fn empty_jobseeker_profile(user_id: &str, now: &str) -> JobSeekerProfile {
    JobSeekerProfile {
        user_id: user_id.to_string(),
        full_name: String::new(),
        headline: None,
        summary: None,
        location: None,
        current_company: None,
        current_position: None,
        profile_image_url: None,
        resume_url: None,
        skills: Vec::new(),
        experience: Vec::new(),
        education: Vec::new(),
        projects: Vec::new(),
        theme: None,
        total_experience_years: 0.0,
        expected_salary: None,
        notice_period_days: None,
        overall_rating: None,
        verification_count: 0,
        is_profile_complete: false,
        settings: ProfileSettings::default(),
        created_at: now.to_string(),
        updated_at: now.to_string(),
    }
}

#[derive(Serialize)]
pub struct JobSeekerProfileResponse {
    #[serde(flatten)]
    pub profile: JobSeekerProfile,
    pub completion_percentage: u32,
    pub missing_fields: Vec<&'static str>,
}

impl From<JobSeekerProfile> for JobSeekerProfileResponse {
    fn from(profile: JobSeekerProfile) -> Self {
        let status = completion(&profile);
        Self {
            profile,
            completion_percentage: status.completion_percentage,
            missing_fields: status.missing_fields,
        }
    }
}

async fn create_jobseeker_profile(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<JobSeekerProfileInput>,
) -> Result<(StatusCode, Json<JobSeekerProfileResponse>)> {
    auth.require_role(&[Role::JobSeeker])?;
    body.validate()?;
    if body.full_name.as_deref().is_none_or(|n| n.trim().is_empty()) {
        return Err(AppError::BadRequest("full_name is required".to_string()));
    }

    if state.db.get_jobseeker_profile(&auth.user_id).await?.is_some() {
        return Err(AppError::BadRequest("Profile already exists".to_string()));
    }

    let mut profile = empty_jobseeker_profile(&auth.user_id, &now_rfc3339());
    body.apply(&mut profile);
    profile.is_profile_complete = completion(&profile).is_profile_complete;
    state.db.put_jobseeker_profile(&profile).await?;

    tracing::info!(user_id = %auth.user_id, "Job seeker profile created");
    Ok((StatusCode::CREATED, Json(profile.into())))
}

async fn get_jobseeker_profile(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<JobSeekerProfileResponse>> {
    auth.require_role(&[Role::JobSeeker])?;
    let profile = state
        .db
        .get_jobseeker_profile(&auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))?;
    Ok(Json(profile.into()))
}

async fn update_jobseeker_profile(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<JobSeekerProfileInput>,
) -> Result<Json<JobSeekerProfileResponse>> {
    auth.require_role(&[Role::JobSeeker])?;
    body.validate()?;

    let mut profile = state
        .db
        .get_jobseeker_profile(&auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))?;
    body.apply(&mut profile);
    profile.is_profile_complete = completion(&profile).is_profile_complete;
    profile.updated_at = now_rfc3339();
    state.db.put_jobseeker_profile(&profile).await?;

    Ok(Json(profile.into()))
}

#[derive(Debug, Deserialize, Validate)]
pub struct SettingsUpdate {
    pub email_notifications: Option<bool>,
    pub job_alerts: Option<bool>,
    pub application_alerts: Option<bool>,
    #[validate(custom(function = "validate_visibility"))]
    pub profile_visibility: Option<String>,
}

fn validate_visibility(value: &str) -> std::result::Result<(), validator::ValidationError> {
    match value {
        "public" | "employers_only" | "private" => Ok(()),
        _ => Err(validator::ValidationError::new("profile_visibility")),
    }
}

async fn update_jobseeker_settings(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<SettingsUpdate>,
) -> Result<Json<ProfileSettings>> {
    auth.require_role(&[Role::JobSeeker])?;
    body.validate()?;

    let mut profile = state
        .db
        .get_jobseeker_profile(&auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))?;
    let settings = &mut profile.settings;
    merge(&mut settings.email_notifications, body.email_notifications);
    merge(&mut settings.job_alerts, body.job_alerts);
    merge(&mut settings.application_alerts, body.application_alerts);
    merge(&mut settings.profile_visibility, body.profile_visibility);
    profile.updated_at = now_rfc3339();
    state.db.put_jobseeker_profile(&profile).await?;

    Ok(Json(profile.settings))
}

// ─── Employer ────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize, Validate)]
pub struct EmployerProfileInput {
    #[validate(length(min = 1, max = 200))]
    pub company_name: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub contact_person: Option<String>,
    pub designation: Option<String>,
    #[validate(url)]
    pub company_website: Option<String>,
    pub company_size: Option<String>,
    pub industry: Option<String>,
    pub location: Option<String>,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
}

impl EmployerProfileInput {
    fn apply(self, profile: &mut EmployerProfile) {
        merge(&mut profile.company_name, self.company_name);
        merge(&mut profile.contact_person, self.contact_person);
        merge_opt(&mut profile.designation, self.designation);
        merge_opt(&mut profile.company_website, self.company_website);
        merge_opt(&mut profile.company_size, self.company_size);
        merge_opt(&mut profile.industry, self.industry);
        merge_opt(&mut profile.location, self.location);
        merge_opt(&mut profile.description, self.description);
    }
}

/// Add the employer's company to the directory if it is not listed yet.
async fn register_company(state: &AppState, name: &str) -> Result<()> {
    let id = Company::doc_id(name);
    if id.is_empty() || state.db.get_company(&id).await?.is_some() {
        return Ok(());
    }
    let company = Company::new(name, "new", NEW_COMPANY_ORDER, &now_rfc3339());
    state.db.put_company(&company).await?;
    tracing::info!(company = %company.name, "Company added to directory");
    Ok(())
}

async fn create_employer_profile(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<EmployerProfileInput>,
) -> Result<(StatusCode, Json<EmployerProfile>)> {
    auth.require_role(&[Role::Employer])?;
    body.validate()?;
    let (Some(company_name), Some(contact_person)) =
        (body.company_name.clone(), body.contact_person.clone())
    else {
        return Err(AppError::BadRequest(
            "company_name and contact_person are required".to_string(),
        ));
    };

    if state.db.get_employer_profile(&auth.user_id).await?.is_some() {
        return Err(AppError::BadRequest("Profile already exists".to_string()));
    }

    let now = now_rfc3339();
    let mut profile = EmployerProfile {
        user_id: auth.user_id.clone(),
        company_name,
        contact_person,
        designation: None,
        company_website: None,
        company_size: None,
        industry: None,
        location: None,
        description: None,
        created_at: now.clone(),
        updated_at: now,
    };
    body.apply(&mut profile);
    state.db.put_employer_profile(&profile).await?;
    register_company(&state, &profile.company_name).await?;

    tracing::info!(user_id = %auth.user_id, company = %profile.company_name, "Employer profile created");
    Ok((StatusCode::CREATED, Json(profile)))
}

async fn get_employer_profile(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<EmployerProfile>> {
    auth.require_role(&[Role::Employer])?;
    let profile = state
        .db
        .get_employer_profile(&auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))?;
    Ok(Json(profile))
}

async fn update_employer_profile(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<EmployerProfileInput>,
) -> Result<Json<EmployerProfile>> {
    auth.require_role(&[Role::Employer])?;
    body.validate()?;

    let mut profile = state
        .db
        .get_employer_profile(&auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))?;
    let renamed = body.company_name.is_some();
    body.apply(&mut profile);
    profile.updated_at = now_rfc3339();
    state.db.put_employer_profile(&profile).await?;
    if renamed {
        register_company(&state, &profile.company_name).await?;
    }

    Ok(Json(profile))
}

// ─── Interviewer ─────────────────────────────────────────────

#[derive(Debug, Default, Deserialize, Validate)]
pub struct InterviewerProfileInput {
    #[validate(length(min = 1, max = 200))]
    pub full_name: Option<String>,
    pub headline: Option<String>,
    pub current_company: Option<String>,
    pub expertise_areas: Option<Vec<String>>,
    pub secondary_expertise: Option<Vec<String>>,
    #[validate(range(min = 0.0, max = 60.0))]
    pub years_of_experience: Option<f64>,
}

impl InterviewerProfileInput {
    fn apply(self, profile: &mut InterviewerProfile) {
        merge(&mut profile.full_name, self.full_name);
        merge_opt(&mut profile.headline, self.headline);
        merge_opt(&mut profile.current_company, self.current_company);
        merge(&mut profile.expertise_areas, self.expertise_areas);
        merge(&mut profile.secondary_expertise, self.secondary_expertise);
        merge(&mut profile.years_of_experience, self.years_of_experience);
    }
}

async fn create_interviewer_profile(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<InterviewerProfileInput>,
) -> Result<(StatusCode, Json<InterviewerProfile>)> {
    auth.require_role(&[Role::Interviewer])?;
    body.validate()?;
    let Some(full_name) = body.full_name.clone() else {
        return Err(AppError::BadRequest("full_name is required".to_string()));
    };

    if state
        .db
        .get_interviewer_profile(&auth.user_id)
        .await?
        .is_some()
    {
        return Err(AppError::BadRequest("Profile already exists".to_string()));
    }

    let now = now_rfc3339();
    let mut profile = InterviewerProfile {
        user_id: auth.user_id.clone(),
        full_name,
        headline: None,
        current_company: None,
        expertise_areas: Vec::new(),
        secondary_expertise: Vec::new(),
        years_of_experience: 0.0,
        interviews_conducted: 0,
        is_certified: false,
        created_at: now.clone(),
        updated_at: now,
    };
    body.apply(&mut profile);
    state.db.put_interviewer_profile(&profile).await?;

    tracing::info!(user_id = %auth.user_id, "Interviewer profile created");
    Ok((StatusCode::CREATED, Json(profile)))
}

async fn get_interviewer_profile(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<InterviewerProfile>> {
    auth.require_role(&[Role::Interviewer])?;
    let profile = state
        .db
        .get_interviewer_profile(&auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))?;
    Ok(Json(profile))
}

async fn update_interviewer_profile(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<InterviewerProfileInput>,
) -> Result<Json<InterviewerProfile>> {
    auth.require_role(&[Role::Interviewer])?;
    body.validate()?;

    let mut profile = state
        .db
        .get_interviewer_profile(&auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))?;
    body.apply(&mut profile);
    profile.updated_at = now_rfc3339();
    state.db.put_interviewer_profile(&profile).await?;

    Ok(Json(profile))
}

// ─── Company Directory ───────────────────────────────────────

#[derive(Deserialize)]
pub struct SuggestParams {
    #[serde(default)]
    pub query: String,
}

#[derive(Serialize)]
pub struct CompaniesResponse {
    pub companies: Vec<Company>,
}

/// Prefix autocomplete over company names.
async fn suggest_companies(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SuggestParams>,
) -> Result<Json<CompaniesResponse>> {
    let query = params.query.trim();
    if query.chars().count() < MIN_SUGGEST_QUERY {
        return Ok(Json(CompaniesResponse {
            companies: Vec::new(),
        }));
    }

    let mut companies = state.db.find_companies_by_prefix(query).await?;
    companies.sort_by(|a, b| {
        a.display_order
            .cmp(&b.display_order)
            .then_with(|| a.name_lower.cmp(&b.name_lower))
    });
    companies.truncate(MAX_SUGGESTIONS);
    Ok(Json(CompaniesResponse { companies }))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCompanyRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(min = 1, max = 50))]
    pub category: String,
    #[serde(default)]
    pub display_order: i32,
}

async fn create_company(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<CreateCompanyRequest>,
) -> Result<(StatusCode, Json<Company>)> {
    auth.require_admin()?;
    body.validate()?;

    let company = Company::new(&body.name, &body.category, body.display_order, &now_rfc3339());
    if state.db.get_company(&company.id).await?.is_some() {
        return Err(AppError::Conflict("Company already exists".to_string()));
    }
    state.db.put_company(&company).await?;
    Ok((StatusCode::CREATED, Json(company)))
}

// ─── ATS Ranking ─────────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
pub struct RankRequest {
    #[validate(length(min = 1))]
    pub job_id: String,
}

#[derive(Serialize)]
pub struct RankingResponse {
    pub job_id: String,
    pub job_title: String,
    pub total_candidates: usize,
    pub candidates: Vec<AtsScore>,
}

async fn load_job(state: &AppState, job_id: &str) -> Result<Job> {
    state
        .db
        .get_job(job_id)
        .await?
        .ok_or_else(|| AppError::not_found("Job", job_id))
}

/// Rank every applicant of a job.
async fn rank_applicants(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<RankRequest>,
) -> Result<Json<RankingResponse>> {
    auth.require_role(&[Role::Employer, Role::Admin])?;
    body.validate()?;

    let job = load_job(&state, &body.job_id).await?;
    if job.employer_id != auth.user_id && !auth.is_admin() {
        return Err(AppError::Forbidden(
            "You can only rank candidates for your own jobs".to_string(),
        ));
    }

    let applicant_ids: Vec<String> = state
        .db
        .list_applications_by_job(&job.id)
        .await?
        .into_iter()
        .map(|a| a.jobseeker_id)
        .collect();
    let profiles = state.db.get_jobseeker_profiles(&applicant_ids).await?;
    let candidates = ats::rank_candidates(&job, &profiles);

    tracing::info!(job_id = %job.id, candidates = candidates.len(), "Ranked applicants");
    Ok(Json(RankingResponse {
        job_id: job.id,
        job_title: job.job_title,
        total_candidates: candidates.len(),
        candidates,
    }))
}

/// The calling job seeker's own score against a job.
async fn rank_self(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<RankRequest>,
) -> Result<Json<AtsScore>> {
    auth.require_role(&[Role::JobSeeker])?;
    body.validate()?;

    let job = load_job(&state, &body.job_id).await?;
    let profile = state
        .db
        .get_jobseeker_profile(&auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Create your profile first".to_string()))?;
    Ok(Json(ats::score_candidate(&job, &profile)))
}
