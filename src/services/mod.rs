// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod acl;
pub mod ats;
pub mod device;
pub mod email;
pub mod interview;
pub mod job_search;
pub mod ledger;
pub mod magic_link;
pub mod notifications;
pub mod profile;
pub mod throttle;

pub use email::EmailService;
pub use ledger::{Balance, LedgerError, Memo, Movement};
pub use throttle::MagicLinkThrottle;
