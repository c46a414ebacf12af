// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users and the credit ledger (atomic balance + transaction writes)
//! - Profiles, companies, jobs and applications
//! - Interviews, ratings and contact access grants
//! - Admin content (banners, custom code, donations, ACL overrides)
//! - Sessions and login history
//!
//! Queries use equality filters only; ordering and secondary filters are
//! applied in memory so no composite indexes are needed.

use crate::db::collections;
use crate::error::AppError;
use crate::models::{
    AclOverride, Company, ContactAccess, CreditDonation, CreditTransaction, CustomCode,
    EmployerProfile, InterviewRating, InterviewRequest, InterviewStatus, InterviewerProfile, Job,
    JobApplication, JobSeekerProfile, LoginHistory, NotificationBanner, PlatformSettings, User,
    UserSession,
};
use crate::services::interview;
use crate::services::ledger::{self, Memo, Movement};
use crate::time_utils::now_rfc3339;
use dashmap::DashMap;
use futures_util::{stream, StreamExt};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;

const MAX_CONCURRENT_DB_OPS: usize = 50;
/// Upper bound on documents read by one listing query.
pub const MAX_SCAN: u32 = 1000;
pub const SETTINGS_DOC_ID: &str = "default";
/// Tries for a read-modify-write transaction that keeps losing to
/// concurrent writers.
const TRANSACTION_ATTEMPTS: u32 = 5;

/// Per-key mutexes serializing read-modify-write cycles within an instance.
type KeyLocks = Arc<DashMap<String, Arc<Mutex<()>>>>;

/// A document staged into a multi-document commit.
#[derive(Clone, Copy)]
pub enum Doc<'a> {
    User(&'a User),
    Transaction(&'a CreditTransaction),
    Job(&'a Job),
    Application(&'a JobApplication),
    JobSeekerProfile(&'a JobSeekerProfile),
    EmployerProfile(&'a EmployerProfile),
    InterviewerProfile(&'a InterviewerProfile),
    Company(&'a Company),
    InterviewRequest(&'a InterviewRequest),
    InterviewRating(&'a InterviewRating),
    ContactAccess(&'a ContactAccess),
    Banner(&'a NotificationBanner),
    Donation(&'a CreditDonation),
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
    locks: KeyLocks,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self::with_client(client))
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self::with_client(client))
    }

    fn with_client(client: firestore::FirestoreDb) -> Self {
        Self {
            client: Some(client),
            locks: Arc::new(DashMap::new()),
        }
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self {
            client: None,
            locks: Arc::new(DashMap::new()),
        }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    /// Mutex for one logical record, e.g. `interview:{id}`.
    pub(crate) fn lock_for(&self, key: String) -> Arc<Mutex<()>> {
        self.locks
            .entry(key)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Forget record locks nobody holds or waits on. Returns how many were
    /// dropped.
    pub fn prune_locks(&self) -> usize {
        let before = self.locks.len();
        self.locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        before.saturating_sub(self.locks.len())
    }

    // ─── Generic Helpers ──────────────────────────────────────────

    async fn get_doc<T>(&self, collection: &str, id: &str) -> Result<Option<T>, AppError>
    where
        T: DeserializeOwned + Send,
    {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collection)
            .obj()
            .one(id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn set_doc<T>(&self, collection: &str, id: &str, doc: &T) -> Result<(), AppError>
    where
        T: Serialize + DeserializeOwned + Sync + Send,
    {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collection)
            .document_id(id)
            .object(doc)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn delete_doc(&self, collection: &str, id: &str) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collection)
            .document_id(id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// All documents of a collection, up to `limit`.
    async fn list_docs<T>(&self, collection: &str, limit: u32) -> Result<Vec<T>, AppError>
    where
        T: DeserializeOwned + Send,
    {
        self.get_client()?
            .fluent()
            .select()
            .from(collection)
            .limit(limit)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Documents whose `field` equals `value`, up to [`MAX_SCAN`].
    async fn find_by<T>(&self, collection: &str, field: &str, value: &str) -> Result<Vec<T>, AppError>
    where
        T: DeserializeOwned + Send,
    {
        self.get_client()?
            .fluent()
            .select()
            .from(collection)
            .filter(|q| q.for_all([q.field(field).eq(value)]))
            .limit(MAX_SCAN)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn find_one_by<T>(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> Result<Option<T>, AppError>
    where
        T: DeserializeOwned + Send,
    {
        let found: Vec<T> = self
            .get_client()?
            .fluent()
            .select()
            .from(collection)
            .filter(|q| q.for_all([q.field(field).eq(value)]))
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(found.into_iter().next())
    }

    // ─── Multi-Document Commits ───────────────────────────────────

    fn stage<T>(
        client: &firestore::FirestoreDb,
        transaction: &mut firestore::FirestoreTransaction<'_>,
        collection: &str,
        id: &str,
        doc: &T,
    ) -> Result<(), AppError>
    where
        T: Serialize + DeserializeOwned + Sync + Send,
    {
        client
            .fluent()
            .update()
            .in_col(collection)
            .document_id(id)
            .object(doc)
            .add_to_transaction(transaction)
            .map_err(|e| {
                AppError::Database(format!(
                    "Failed to add {} write to transaction: {}",
                    collection, e
                ))
            })?;
        Ok(())
    }

    fn stage_all(
        client: &firestore::FirestoreDb,
        t: &mut firestore::FirestoreTransaction<'_>,
        docs: &[Doc<'_>],
    ) -> Result<(), AppError> {
        for doc in docs {
            match *doc {
                Doc::User(d) => Self::stage(client, t, collections::USERS, &d.id, d)?,
                Doc::Transaction(d) => {
                    Self::stage(client, t, collections::CREDIT_TRANSACTIONS, &d.id, d)?
                }
                Doc::Job(d) => Self::stage(client, t, collections::JOBS, &d.id, d)?,
                Doc::Application(d) => Self::stage(client, t, collections::APPLICATIONS, &d.id, d)?,
                Doc::JobSeekerProfile(d) => {
                    Self::stage(client, t, collections::JOBSEEKER_PROFILES, &d.user_id, d)?
                }
                Doc::EmployerProfile(d) => {
                    Self::stage(client, t, collections::EMPLOYER_PROFILES, &d.user_id, d)?
                }
                Doc::InterviewerProfile(d) => {
                    Self::stage(client, t, collections::INTERVIEWER_PROFILES, &d.user_id, d)?
                }
                Doc::Company(d) => Self::stage(client, t, collections::COMPANIES, &d.id, d)?,
                Doc::InterviewRequest(d) => {
                    Self::stage(client, t, collections::INTERVIEW_REQUESTS, &d.id, d)?
                }
                Doc::InterviewRating(d) => {
                    Self::stage(client, t, collections::INTERVIEW_RATINGS, &d.id, d)?
                }
                Doc::ContactAccess(d) => {
                    Self::stage(client, t, collections::CONTACT_ACCESS, &d.id, d)?
                }
                Doc::Banner(d) => Self::stage(client, t, collections::NOTIFICATIONS, &d.id, d)?,
                Doc::Donation(d) => Self::stage(client, t, collections::DONATIONS, &d.id, d)?,
            }
        }
        Ok(())
    }

    /// Begin a transaction together with a client whose reads join it.
    /// Firestore rejects the commit if a document read through the returned
    /// client changed in the meantime.
    async fn begin_read_write(
        &self,
    ) -> Result<(firestore::FirestoreTransaction<'_>, firestore::FirestoreDb), AppError> {
        let client = self.get_client()?;
        let transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;
        let reader = client.clone_with_consistency_selector(
            firestore::FirestoreConsistencySelector::Transaction(
                transaction.transaction_id().clone(),
            ),
        );
        Ok((transaction, reader))
    }

    async fn read_in<T>(
        reader: &firestore::FirestoreDb,
        collection: &str,
        id: &str,
    ) -> Result<Option<T>, AppError>
    where
        T: DeserializeOwned + Send,
    {
        reader
            .fluent()
            .select()
            .by_id_in(collection)
            .obj()
            .one(id)
            .await
            .map_err(|e| {
                AppError::Database(format!("Failed to read {} in transaction: {}", collection, e))
            })
    }

    /// Commit a read-write transaction. `Ok(false)` asks the caller to run
    /// the whole cycle again.
    async fn finish(
        transaction: firestore::FirestoreTransaction<'_>,
        attempt: u32,
        operation: &str,
    ) -> Result<bool, AppError> {
        match transaction.commit().await {
            Ok(_) => Ok(true),
            Err(e) if attempt < TRANSACTION_ATTEMPTS => {
                tracing::warn!(attempt, operation, error = %e, "Transaction commit failed, retrying");
                Ok(false)
            }
            Err(e) => Err(AppError::Database(format!("Transaction commit failed: {}", e))),
        }
    }

    /// Write several documents atomically.
    pub async fn commit(&self, docs: &[Doc<'_>]) -> Result<(), AppError> {
        let client = self.get_client()?;

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;
        Self::stage_all(client, &mut transaction, docs)?;
        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;
        Ok(())
    }

    // ─── Credit Ledger ────────────────────────────────────────────

    /// Move credits for a user and record the ledger entry, committing the
    /// user, the entry and any `companions` in one transaction.
    ///
    /// The balance is read inside the transaction, so a concurrent change
    /// from another instance aborts the commit and the cycle is retried.
    /// Within one instance the per-user lock keeps retries rare.
    pub async fn apply_credit_change(
        &self,
        user_id: &str,
        movement: Movement,
        memo: Memo,
        transaction_id: String,
        companions: &[Doc<'_>],
    ) -> Result<(User, CreditTransaction), AppError> {
        let lock = self.lock_for(format!("user:{}", user_id));
        let _guard = lock.lock().await;

        let mut attempt = 0;
        let (user, entry) = loop {
            attempt += 1;
            let (mut transaction, reader) = self.begin_read_write().await?;
            let mut user: User = Self::read_in(&reader, collections::USERS, user_id)
                .await?
                .ok_or_else(|| AppError::not_found("User", user_id))?;

            let now = now_rfc3339();
            let entry = match ledger::post(
                &mut user,
                movement,
                memo.clone(),
                transaction_id.clone(),
                &now,
            ) {
                Ok(entry) => entry,
                Err(e) => {
                    let _ = transaction.rollback().await;
                    return Err(e.into());
                }
            };

            let mut docs = vec![Doc::User(&user), Doc::Transaction(&entry)];
            docs.extend_from_slice(companions);
            Self::stage_all(self.get_client()?, &mut transaction, &docs)?;
            if Self::finish(transaction, attempt, "credit_change").await? {
                break (user, entry);
            }
        };

        tracing::info!(
            user_id,
            amount = entry.amount,
            category = entry.category.as_str(),
            balance_free = entry.balance_free,
            balance_paid = entry.balance_paid,
            "Credit ledger updated"
        );

        Ok((user, entry))
    }

    /// Ledger entries for one user (or everyone), newest first.
    pub async fn list_transactions(
        &self,
        user_id: Option<&str>,
    ) -> Result<Vec<CreditTransaction>, AppError> {
        let mut entries: Vec<CreditTransaction> = match user_id {
            Some(id) => {
                self.find_by(collections::CREDIT_TRANSACTIONS, "user_id", id)
                    .await?
            }
            None => {
                self.get_client()?
                    .fluent()
                    .select()
                    .from(collections::CREDIT_TRANSACTIONS)
                    .order_by([(
                        "created_at",
                        firestore::FirestoreQueryDirection::Descending,
                    )])
                    .limit(MAX_SCAN)
                    .obj()
                    .query()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?
            }
        };
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(entries)
    }

    // ─── User Operations ─────────────────────────────────────────

    pub async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        self.get_doc(collections::USERS, user_id).await
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        self.find_one_by(collections::USERS, "email", email).await
    }

    pub async fn find_user_by_phone(&self, phone: &str) -> Result<Option<User>, AppError> {
        self.find_one_by(collections::USERS, "phone", phone).await
    }

    pub async fn find_user_by_magic_link_hash(&self, hash: &str) -> Result<Option<User>, AppError> {
        self.find_one_by(collections::USERS, "magic_link_hash", hash)
            .await
    }

    pub async fn upsert_user(&self, user: &User) -> Result<(), AppError> {
        self.set_doc(collections::USERS, &user.id, user).await
    }

    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        let mut users: Vec<User> = self.list_docs(collections::USERS, MAX_SCAN).await?;
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users)
    }

    /// Consume a magic link: clear the stored hash and stamp the login,
    /// only if the hash is still current. Returns the updated user.
    pub async fn consume_magic_link(&self, hash: &str) -> Result<Option<User>, AppError> {
        let Some(found) = self.find_user_by_magic_link_hash(hash).await? else {
            return Ok(None);
        };

        let lock = self.lock_for(format!("user:{}", found.id));
        let _guard = lock.lock().await;

        let mut attempt = 0;
        loop {
            attempt += 1;
            let (mut transaction, reader) = self.begin_read_write().await?;
            // Re-read in the transaction so a concurrent verify cannot reuse
            // the token.
            let current: Option<User> = Self::read_in(&reader, collections::USERS, &found.id).await?;
            let Some(mut user) = current.filter(|u| u.magic_link_hash.as_deref() == Some(hash)) else {
                let _ = transaction.rollback().await;
                return Ok(None);
            };

            let now = now_rfc3339();
            user.magic_link_hash = None;
            user.magic_link_created_at = None;
            user.is_verified = true;
            user.last_login = Some(now.clone());
            user.updated_at = now;

            Self::stage_all(self.get_client()?, &mut transaction, &[Doc::User(&user)])?;
            if Self::finish(transaction, attempt, "consume_magic_link").await? {
                return Ok(Some(user));
            }
        }
    }

    // ─── Platform Settings ───────────────────────────────────────

    /// Current settings, falling back to defaults if never saved.
    pub async fn get_settings(&self) -> Result<PlatformSettings, AppError> {
        Ok(self
            .get_doc(collections::PLATFORM_SETTINGS, SETTINGS_DOC_ID)
            .await?
            .unwrap_or_default())
    }

    pub async fn put_settings(&self, settings: &PlatformSettings) -> Result<(), AppError> {
        self.set_doc(collections::PLATFORM_SETTINGS, SETTINGS_DOC_ID, settings)
            .await
    }

    // ─── Profile Operations ──────────────────────────────────────

    pub async fn get_jobseeker_profile(
        &self,
        user_id: &str,
    ) -> Result<Option<JobSeekerProfile>, AppError> {
        self.get_doc(collections::JOBSEEKER_PROFILES, user_id).await
    }

    pub async fn put_jobseeker_profile(&self, profile: &JobSeekerProfile) -> Result<(), AppError> {
        self.set_doc(collections::JOBSEEKER_PROFILES, &profile.user_id, profile)
            .await
    }

    /// Fetch several job seeker profiles concurrently, skipping missing ones.
    pub async fn get_jobseeker_profiles(
        &self,
        user_ids: &[String],
    ) -> Result<Vec<JobSeekerProfile>, AppError> {
        let results = stream::iter(user_ids.iter().cloned())
            .map(|id| async move { self.get_jobseeker_profile(&id).await })
            .buffer_unordered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<Result<Option<JobSeekerProfile>, AppError>>>()
            .await;

        let mut profiles = Vec::with_capacity(results.len());
        for result in results {
            if let Some(profile) = result? {
                profiles.push(profile);
            }
        }
        Ok(profiles)
    }

    pub async fn get_employer_profile(
        &self,
        user_id: &str,
    ) -> Result<Option<EmployerProfile>, AppError> {
        self.get_doc(collections::EMPLOYER_PROFILES, user_id).await
    }

    pub async fn put_employer_profile(&self, profile: &EmployerProfile) -> Result<(), AppError> {
        self.set_doc(collections::EMPLOYER_PROFILES, &profile.user_id, profile)
            .await
    }

    pub async fn get_interviewer_profile(
        &self,
        user_id: &str,
    ) -> Result<Option<InterviewerProfile>, AppError> {
        self.get_doc(collections::INTERVIEWER_PROFILES, user_id)
            .await
    }

    pub async fn put_interviewer_profile(
        &self,
        profile: &InterviewerProfile,
    ) -> Result<(), AppError> {
        self.set_doc(collections::INTERVIEWER_PROFILES, &profile.user_id, profile)
            .await
    }

    pub async fn list_interviewer_profiles(&self) -> Result<Vec<InterviewerProfile>, AppError> {
        self.list_docs(collections::INTERVIEWER_PROFILES, MAX_SCAN)
            .await
    }

    // ─── Company Directory ───────────────────────────────────────

    pub async fn get_company(&self, id: &str) -> Result<Option<Company>, AppError> {
        self.get_doc(collections::COMPANIES, id).await
    }

    pub async fn put_company(&self, company: &Company) -> Result<(), AppError> {
        self.set_doc(collections::COMPANIES, &company.id, company)
            .await
    }

    /// Companies whose lowercased name starts with `prefix`.
    pub async fn find_companies_by_prefix(&self, prefix: &str) -> Result<Vec<Company>, AppError> {
        let lower = prefix.to_lowercase();
        let upper = format!("{}\u{f8ff}", lower);
        self.get_client()?
            .fluent()
            .select()
            .from(collections::COMPANIES)
            .filter(|q| {
                q.for_all([
                    q.field("name_lower").greater_than_or_equal(lower.as_str()),
                    q.field("name_lower").less_than(upper.as_str()),
                ])
            })
            .limit(MAX_SCAN)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Job Operations ──────────────────────────────────────────

    pub async fn get_job(&self, job_id: &str) -> Result<Option<Job>, AppError> {
        self.get_doc(collections::JOBS, job_id).await
    }

    pub async fn put_job(&self, job: &Job) -> Result<(), AppError> {
        self.set_doc(collections::JOBS, &job.id, job).await
    }

    pub async fn delete_job(&self, job_id: &str) -> Result<(), AppError> {
        self.delete_doc(collections::JOBS, job_id).await
    }

    /// Active jobs, newest first.
    pub async fn list_active_jobs(&self) -> Result<Vec<Job>, AppError> {
        let mut jobs: Vec<Job> = self.find_by(collections::JOBS, "status", "active").await?;
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(jobs)
    }

    pub async fn list_jobs_by_employer(&self, employer_id: &str) -> Result<Vec<Job>, AppError> {
        let mut jobs: Vec<Job> = self
            .find_by(collections::JOBS, "employer_id", employer_id)
            .await?;
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(jobs)
    }

    /// Bump a job's view counter and return the updated job.
    pub async fn record_job_view(&self, job_id: &str) -> Result<Option<Job>, AppError> {
        let lock = self.lock_for(format!("job:{}", job_id));
        let _guard = lock.lock().await;

        let mut attempt = 0;
        loop {
            attempt += 1;
            let (mut transaction, reader) = self.begin_read_write().await?;
            let current: Option<Job> = Self::read_in(&reader, collections::JOBS, job_id).await?;
            let Some(mut job) = current else {
                let _ = transaction.rollback().await;
                return Ok(None);
            };
            job.views_count = job.views_count.saturating_add(1);

            Self::stage_all(self.get_client()?, &mut transaction, &[Doc::Job(&job)])?;
            if Self::finish(transaction, attempt, "record_job_view").await? {
                return Ok(Some(job));
            }
        }
    }

    // ─── Application Operations ──────────────────────────────────

    pub async fn get_application(&self, id: &str) -> Result<Option<JobApplication>, AppError> {
        self.get_doc(collections::APPLICATIONS, id).await
    }

    pub async fn put_application(&self, application: &JobApplication) -> Result<(), AppError> {
        self.set_doc(collections::APPLICATIONS, &application.id, application)
            .await
    }

    /// Store a new application and bump the job's counter atomically.
    ///
    /// Returns `false` without writing if the applicant already applied.
    pub async fn submit_application(&self, application: &JobApplication) -> Result<bool, AppError> {
        let lock = self.lock_for(format!("job:{}", application.job_id));
        let _guard = lock.lock().await;

        let mut attempt = 0;
        let job = loop {
            attempt += 1;
            let (mut transaction, reader) = self.begin_read_write().await?;
            let existing: Option<JobApplication> =
                Self::read_in(&reader, collections::APPLICATIONS, &application.id).await?;
            if existing.is_some() {
                let _ = transaction.rollback().await;
                return Ok(false);
            }
            let mut job: Job = Self::read_in(&reader, collections::JOBS, &application.job_id)
                .await?
                .ok_or_else(|| AppError::not_found("Job", &application.job_id))?;
            job.applications_count = job.applications_count.saturating_add(1);

            Self::stage_all(
                self.get_client()?,
                &mut transaction,
                &[Doc::Application(application), Doc::Job(&job)],
            )?;
            if Self::finish(transaction, attempt, "submit_application").await? {
                break job;
            }
        };

        tracing::info!(
            job_id = %application.job_id,
            jobseeker_id = %application.jobseeker_id,
            applications = job.applications_count,
            "Application submitted"
        );
        Ok(true)
    }

    pub async fn list_applications_by_job(
        &self,
        job_id: &str,
    ) -> Result<Vec<JobApplication>, AppError> {
        let mut apps: Vec<JobApplication> = self
            .find_by(collections::APPLICATIONS, "job_id", job_id)
            .await?;
        apps.sort_by(|a, b| b.applied_at.cmp(&a.applied_at));
        Ok(apps)
    }

    pub async fn list_applications_by_jobseeker(
        &self,
        jobseeker_id: &str,
    ) -> Result<Vec<JobApplication>, AppError> {
        let mut apps: Vec<JobApplication> = self
            .find_by(collections::APPLICATIONS, "jobseeker_id", jobseeker_id)
            .await?;
        apps.sort_by(|a, b| b.applied_at.cmp(&a.applied_at));
        Ok(apps)
    }

    // ─── Interview Operations ────────────────────────────────────

    pub async fn get_interview_request(
        &self,
        id: &str,
    ) -> Result<Option<InterviewRequest>, AppError> {
        self.get_doc(collections::INTERVIEW_REQUESTS, id).await
    }

    pub async fn put_interview_request(&self, request: &InterviewRequest) -> Result<(), AppError> {
        self.set_doc(collections::INTERVIEW_REQUESTS, &request.id, request)
            .await
    }

    /// Requests filtered by one field, newest first.
    async fn interview_requests_where(
        &self,
        field: &str,
        value: &str,
    ) -> Result<Vec<InterviewRequest>, AppError> {
        let mut requests: Vec<InterviewRequest> = self
            .find_by(collections::INTERVIEW_REQUESTS, field, value)
            .await?;
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(requests)
    }

    pub async fn list_interview_requests_by_jobseeker(
        &self,
        jobseeker_id: &str,
    ) -> Result<Vec<InterviewRequest>, AppError> {
        self.interview_requests_where("jobseeker_id", jobseeker_id)
            .await
    }

    pub async fn list_interview_requests_by_interviewer(
        &self,
        interviewer_id: &str,
    ) -> Result<Vec<InterviewRequest>, AppError> {
        self.interview_requests_where("interviewer_id", interviewer_id)
            .await
    }

    pub async fn list_interview_requests_by_status(
        &self,
        status: InterviewStatus,
    ) -> Result<Vec<InterviewRequest>, AppError> {
        self.interview_requests_where("status", status.as_str())
            .await
    }

    /// Pending requests plus any that notified this interviewer.
    pub async fn list_available_interview_requests(
        &self,
        interviewer_id: &str,
    ) -> Result<Vec<InterviewRequest>, AppError> {
        let notified: Vec<InterviewRequest> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::INTERVIEW_REQUESTS)
            .filter(|q| {
                q.for_all([q
                    .field("notified_interviewers")
                    .array_contains(interviewer_id)])
            })
            .limit(MAX_SCAN)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let pending = self
            .list_interview_requests_by_status(InterviewStatus::Pending)
            .await?;
        Ok(interview::available_for(pending, notified))
    }

    pub async fn list_all_interview_requests(&self) -> Result<Vec<InterviewRequest>, AppError> {
        let mut requests: Vec<InterviewRequest> = self
            .list_docs(collections::INTERVIEW_REQUESTS, MAX_SCAN)
            .await?;
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(requests)
    }

    /// Ratings for a job seeker, newest first.
    pub async fn list_ratings_by_jobseeker(
        &self,
        jobseeker_id: &str,
    ) -> Result<Vec<InterviewRating>, AppError> {
        let mut ratings: Vec<InterviewRating> = self
            .find_by(collections::INTERVIEW_RATINGS, "jobseeker_id", jobseeker_id)
            .await?;
        ratings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(ratings)
    }

    pub async fn list_all_ratings(&self) -> Result<Vec<InterviewRating>, AppError> {
        let mut ratings: Vec<InterviewRating> = self
            .list_docs(collections::INTERVIEW_RATINGS, MAX_SCAN)
            .await?;
        ratings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(ratings)
    }

    // ─── Contact Access ──────────────────────────────────────────

    pub async fn get_contact_access(
        &self,
        employer_id: &str,
        jobseeker_id: &str,
    ) -> Result<Option<ContactAccess>, AppError> {
        self.get_doc(
            collections::CONTACT_ACCESS,
            &ContactAccess::doc_id(employer_id, jobseeker_id),
        )
        .await
    }

    pub async fn put_contact_access(&self, access: &ContactAccess) -> Result<(), AppError> {
        self.set_doc(collections::CONTACT_ACCESS, &access.id, access)
            .await
    }

    pub async fn list_contact_access_by_employer(
        &self,
        employer_id: &str,
    ) -> Result<Vec<ContactAccess>, AppError> {
        let mut grants: Vec<ContactAccess> = self
            .find_by(collections::CONTACT_ACCESS, "employer_id", employer_id)
            .await?;
        grants.sort_by(|a, b| b.access_granted_at.cmp(&a.access_granted_at));
        Ok(grants)
    }

    pub async fn list_all_contact_access(&self) -> Result<Vec<ContactAccess>, AppError> {
        let mut grants: Vec<ContactAccess> = self
            .list_docs(collections::CONTACT_ACCESS, MAX_SCAN)
            .await?;
        grants.sort_by(|a, b| b.access_granted_at.cmp(&a.access_granted_at));
        Ok(grants)
    }

    // ─── Notification Banners ────────────────────────────────────

    pub async fn get_banner(&self, id: &str) -> Result<Option<NotificationBanner>, AppError> {
        self.get_doc(collections::NOTIFICATIONS, id).await
    }

    pub async fn put_banner(&self, banner: &NotificationBanner) -> Result<(), AppError> {
        self.set_doc(collections::NOTIFICATIONS, &banner.id, banner)
            .await
    }

    pub async fn delete_banner(&self, id: &str) -> Result<(), AppError> {
        self.delete_doc(collections::NOTIFICATIONS, id).await
    }

    pub async fn list_banners(&self) -> Result<Vec<NotificationBanner>, AppError> {
        let mut banners: Vec<NotificationBanner> =
            self.list_docs(collections::NOTIFICATIONS, MAX_SCAN).await?;
        banners.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(banners)
    }

    pub async fn list_active_banners(&self) -> Result<Vec<NotificationBanner>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::NOTIFICATIONS)
            .filter(|q| q.for_all([q.field("is_active").eq(true)]))
            .limit(MAX_SCAN)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Custom Code ─────────────────────────────────────────────

    pub async fn get_custom_code(&self, id: &str) -> Result<Option<CustomCode>, AppError> {
        self.get_doc(collections::CUSTOM_CODE, id).await
    }

    pub async fn put_custom_code(&self, code: &CustomCode) -> Result<(), AppError> {
        self.set_doc(collections::CUSTOM_CODE, &code.id, code).await
    }

    pub async fn delete_custom_code(&self, id: &str) -> Result<(), AppError> {
        self.delete_doc(collections::CUSTOM_CODE, id).await
    }

    /// All snippets, oldest first (injection order).
    pub async fn list_custom_code(&self) -> Result<Vec<CustomCode>, AppError> {
        let mut codes: Vec<CustomCode> =
            self.list_docs(collections::CUSTOM_CODE, MAX_SCAN).await?;
        codes.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(codes)
    }

    // ─── Donations ───────────────────────────────────────────────

    pub async fn list_donations(
        &self,
        user_id: Option<&str>,
    ) -> Result<Vec<CreditDonation>, AppError> {
        let mut donations: Vec<CreditDonation> = match user_id {
            Some(id) => self.find_by(collections::DONATIONS, "user_id", id).await?,
            None => self.list_docs(collections::DONATIONS, MAX_SCAN).await?,
        };
        donations.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(donations)
    }

    // ─── Sessions & Login History ────────────────────────────────

    pub async fn get_session(&self, session_id: &str) -> Result<Option<UserSession>, AppError> {
        self.get_doc(collections::SESSIONS, session_id).await
    }

    pub async fn put_session(&self, session: &UserSession) -> Result<(), AppError> {
        self.set_doc(collections::SESSIONS, &session.id, session)
            .await
    }

    pub async fn list_sessions_by_user(&self, user_id: &str) -> Result<Vec<UserSession>, AppError> {
        let mut sessions: Vec<UserSession> =
            self.find_by(collections::SESSIONS, "user_id", user_id).await?;
        sessions.sort_by(|a, b| b.last_activity.cmp(&a.last_activity));
        Ok(sessions)
    }

    pub async fn get_login_history(&self, id: &str) -> Result<Option<LoginHistory>, AppError> {
        self.get_doc(collections::LOGIN_HISTORY, id).await
    }

    pub async fn put_login_history(&self, entry: &LoginHistory) -> Result<(), AppError> {
        self.set_doc(collections::LOGIN_HISTORY, &entry.id, entry)
            .await
    }

    pub async fn list_login_history(
        &self,
        user_id: Option<&str>,
    ) -> Result<Vec<LoginHistory>, AppError> {
        let mut entries: Vec<LoginHistory> = match user_id {
            Some(id) => {
                self.find_by(collections::LOGIN_HISTORY, "user_id", id)
                    .await?
            }
            None => self.list_docs(collections::LOGIN_HISTORY, MAX_SCAN).await?,
        };
        entries.sort_by(|a, b| b.login_at.cmp(&a.login_at));
        Ok(entries)
    }

    /// Record a new login: the session and its history entry share an ID.
    pub async fn record_login(
        &self,
        session: &UserSession,
        history: &LoginHistory,
    ) -> Result<(), AppError> {
        self.put_session(session).await?;
        self.put_login_history(history).await
    }

    // ─── ACL Overrides ───────────────────────────────────────────

    pub async fn list_acl_overrides(&self) -> Result<Vec<AclOverride>, AppError> {
        self.list_docs(collections::ACL_OVERRIDES, MAX_SCAN).await
    }

    pub async fn get_acl_override(&self, id: &str) -> Result<Option<AclOverride>, AppError> {
        self.get_doc(collections::ACL_OVERRIDES, id).await
    }

    pub async fn put_acl_override(&self, entry: &AclOverride) -> Result<(), AppError> {
        self.set_doc(collections::ACL_OVERRIDES, &entry.id, entry)
            .await
    }

    pub async fn delete_acl_override(&self, id: &str) -> Result<(), AppError> {
        self.delete_doc(collections::ACL_OVERRIDES, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_prune_keeps_held_locks() {
        let db = FirestoreDb::new_mock();
        let held = db.lock_for("user:a".to_string());
        let _guard = held.lock().await;
        drop(db.lock_for("user:b".to_string()));
        drop(db.lock_for("job:c".to_string()));

        assert_eq!(db.prune_locks(), 2);
        assert_eq!(db.locks.len(), 1);
        assert!(db.locks.contains_key("user:a"));

        // The surviving entry is still the lock being held.
        assert!(db.lock_for("user:a".to_string()).try_lock().is_err());
    }

    #[tokio::test]
    async fn test_prune_after_release() {
        let db = FirestoreDb::new_mock();
        {
            let lock = db.lock_for("interview:r1".to_string());
            let _guard = lock.lock().await;
        }
        assert_eq!(db.prune_locks(), 1);
        assert_eq!(db.prune_locks(), 0);
    }
}
