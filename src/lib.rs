// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! TalentHub: job portal backend
//!
//! This crate provides the REST API behind the TalentHub web frontend:
//! passwordless auth, profiles, job postings, a credit ledger that gates
//! premium actions, interviewer verification and ATS candidate ranking.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod pagination;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::FirestoreDb;
use services::{EmailService, MagicLinkThrottle};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub email: EmailService,
    pub magic_link_throttle: MagicLinkThrottle,
}

impl AppState {
    /// Build state from config and a database handle.
    pub fn new(config: Config, db: FirestoreDb) -> Self {
        let email = EmailService::new(config.email.clone());
        let magic_link_throttle =
            MagicLinkThrottle::new(std::time::Duration::from_secs(config.magic_link_cooldown_secs));
        Self {
            config,
            db,
            email,
            magic_link_throttle,
        }
    }
}
