// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod admin;
pub mod contact;
pub mod credit;
pub mod interview;
pub mod job;
pub mod profile;
pub mod session;
pub mod user;

pub use admin::{AclOverride, BannerType, CodeType, CreditDonation, CustomCode, NotificationBanner};
pub use contact::ContactAccess;
pub use credit::{
    CreditTransaction, PlatformSettings, PlatformSettingsUpdate, TransactionCategory,
    TransactionType,
};
pub use interview::{InterviewRating, InterviewRequest, InterviewStatus, SkillRating};
pub use job::{ApplicationStatus, Job, JobApplication, JobStatus, WorkMode};
pub use profile::{
    Company, Education, EmployerProfile, Experience, InterviewerProfile, JobSeekerProfile,
    ProfileSettings, Project, Skill,
};
pub use session::{DeviceInfo, DeviceType, LoginHistory, LoginStatus, UserSession};
pub use user::{PublicUser, Role, User};
