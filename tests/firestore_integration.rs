// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore integration tests.
//!
//! These tests require the Firestore emulator to be running
//! (`FIRESTORE_EMULATOR_HOST`); they are skipped otherwise.

use talenthub::db::{new_id, Doc};
use talenthub::error::AppError;
use talenthub::models::{
    ApplicationStatus, ContactAccess, Job, JobApplication, JobStatus, Role, TransactionCategory,
    TransactionType, User, WorkMode,
};
use talenthub::services::{magic_link, Memo, Movement};
use talenthub::time_utils::now_rfc3339;

mod common;
use common::test_db;

/// User with a unique address so tests can share one emulator.
fn test_user(role: Role) -> User {
    let id = new_id();
    User::new(
        id.clone(),
        format!("{}@example.com", id),
        None,
        role,
        &now_rfc3339(),
    )
}

fn test_job(employer_id: &str) -> Job {
    let now = now_rfc3339();
    Job {
        id: new_id(),
        employer_id: employer_id.to_string(),
        company_name: "Acme".to_string(),
        job_title: "Backend Engineer".to_string(),
        job_type: "full_time".to_string(),
        location: "Remote".to_string(),
        work_mode: WorkMode::Remote,
        description: "Build the API".to_string(),
        responsibilities: Vec::new(),
        requirements: Vec::new(),
        required_skills: vec!["Rust".to_string()],
        preferred_skills: Vec::new(),
        min_experience: None,
        max_experience: None,
        min_salary: None,
        max_salary: None,
        number_of_openings: 1,
        status: JobStatus::Active,
        applications_count: 0,
        views_count: 0,
        freshness_days: 0,
        created_at: now.clone(),
        updated_at: now,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// USER TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_user_lookup_by_email() {
    require_emulator!();

    let db = test_db().await;
    let user = test_user(Role::JobSeeker);
    assert!(db.get_user(&user.id).await.unwrap().is_none());

    db.upsert_user(&user).await.unwrap();

    let found = db.find_user_by_email(&user.email).await.unwrap().unwrap();
    assert_eq!(found.id, user.id);
    assert_eq!(found.role, Role::JobSeeker);
}

#[tokio::test]
async fn test_magic_link_single_use() {
    require_emulator!();

    let db = test_db().await;
    let mut user = test_user(Role::Employer);
    let issued = magic_link::issue().unwrap();
    assert_eq!(magic_link::hash_token(&issued.token), issued.hash);
    let hash = issued.hash;
    user.magic_link_hash = Some(hash.clone());
    user.magic_link_created_at = Some(now_rfc3339());
    db.upsert_user(&user).await.unwrap();

    let verified = db.consume_magic_link(&hash).await.unwrap().unwrap();
    assert_eq!(verified.id, user.id);
    assert!(verified.is_verified);
    assert!(verified.last_login.is_some());

    // Second use of the same link fails.
    assert!(db.consume_magic_link(&hash).await.unwrap().is_none());
}

// ═══════════════════════════════════════════════════════════════════════════
// LEDGER TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_credit_then_debit() {
    require_emulator!();

    let db = test_db().await;
    let user = test_user(Role::Employer);
    db.upsert_user(&user).await.unwrap();

    let memo = Memo::new(
        TransactionType::AdminAdd,
        TransactionCategory::AdminAdjustment,
        "Starter credits",
    )
    .by("admin");
    let (after_credit, entry) = db
        .apply_credit_change(&user.id, Movement::Credit(15_000), memo, new_id(), &[])
        .await
        .unwrap();
    assert_eq!(after_credit.credits_free, 15_000);
    assert_eq!(entry.amount, 15_000);

    let memo = Memo::new(
        TransactionType::Spend,
        TransactionCategory::ContactReveal,
        "Reveal",
    );
    let (after_debit, entry) = db
        .apply_credit_change(&user.id, Movement::Debit(10_000), memo, new_id(), &[])
        .await
        .unwrap();
    assert_eq!(after_debit.credits_free, 5_000);
    assert_eq!(entry.amount, -10_000);
    assert_eq!(entry.balance_free, 5_000);

    let history = db.list_transactions(Some(&user.id)).await.unwrap();
    assert_eq!(history.len(), 2);
    assert!(history.iter().any(|t| t.id == entry.id));
}

#[tokio::test]
async fn test_insufficient_credits_writes_nothing() {
    require_emulator!();

    let db = test_db().await;
    let employer = test_user(Role::Employer);
    db.upsert_user(&employer).await.unwrap();

    let access = ContactAccess {
        id: ContactAccess::doc_id(&employer.id, "js-unfunded"),
        employer_id: employer.id.clone(),
        jobseeker_id: "js-unfunded".to_string(),
        credits_spent: 10_000,
        access_granted_at: now_rfc3339(),
        access_expires_at: "2099-01-01T00:00:00Z".to_string(),
        is_active: true,
        revealed_email: "js@example.com".to_string(),
        revealed_phone: None,
        revealed_current_company: None,
    };
    let memo = Memo::new(
        TransactionType::Spend,
        TransactionCategory::ContactReveal,
        "Reveal",
    );
    let result = db
        .apply_credit_change(
            &employer.id,
            Movement::Debit(10_000),
            memo,
            new_id(),
            &[Doc::ContactAccess(&access)],
        )
        .await;
    assert!(matches!(
        result,
        Err(AppError::InsufficientCredits {
            required: 10_000,
            available: 0
        })
    ));

    // The companion grant was not written either.
    assert!(db
        .get_contact_access(&employer.id, "js-unfunded")
        .await
        .unwrap()
        .is_none());
    assert!(db
        .list_transactions(Some(&employer.id))
        .await
        .unwrap()
        .is_empty());
}

// ═══════════════════════════════════════════════════════════════════════════
// APPLICATION TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_duplicate_application_ignored() {
    require_emulator!();

    let db = test_db().await;
    let job = test_job("employer-1");
    db.put_job(&job).await.unwrap();

    let now = now_rfc3339();
    let application = JobApplication {
        id: JobApplication::doc_id(&job.id, "js-1"),
        job_id: job.id.clone(),
        jobseeker_id: "js-1".to_string(),
        employer_id: job.employer_id.clone(),
        cover_letter: None,
        resume_url: None,
        status: ApplicationStatus::Pending,
        employer_notes: None,
        applied_at: now.clone(),
        updated_at: now,
    };

    assert!(db.submit_application(&application).await.unwrap());
    assert!(!db.submit_application(&application).await.unwrap());

    let stored = db.get_job(&job.id).await.unwrap().unwrap();
    assert_eq!(stored.applications_count, 1);
    assert_eq!(db.list_applications_by_job(&job.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_job_view_counter() {
    require_emulator!();

    let db = test_db().await;
    let job = test_job("employer-2");
    db.put_job(&job).await.unwrap();

    db.record_job_view(&job.id).await.unwrap();
    let viewed = db.record_job_view(&job.id).await.unwrap().unwrap();
    assert_eq!(viewed.views_count, 2);

    assert!(db.record_job_view("no-such-job").await.unwrap().is_none());
}
