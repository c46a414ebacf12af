// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-address cooldown for magic-link requests.
//!
//! In-memory and per instance, shared across requests through `AppState`.

use dashmap::{mapref::entry::Entry, DashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Clone)]
pub struct MagicLinkThrottle {
    last_sent: Arc<DashMap<String, Instant>>,
    cooldown: Duration,
}

impl MagicLinkThrottle {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            last_sent: Arc::new(DashMap::new()),
            cooldown,
        }
    }

    /// Record an attempt for `key`. Returns the remaining wait if the
    /// previous attempt was too recent.
    pub fn try_acquire(&self, key: &str) -> Result<(), Duration> {
        self.try_acquire_at(key, Instant::now())
    }

    fn try_acquire_at(&self, key: &str, now: Instant) -> Result<(), Duration> {
        match self.last_sent.entry(key.to_string()) {
            Entry::Vacant(slot) => {
                slot.insert(now);
                Ok(())
            }
            Entry::Occupied(mut slot) => {
                let elapsed = now.saturating_duration_since(*slot.get());
                if elapsed < self.cooldown {
                    return Err(self.cooldown - elapsed);
                }
                slot.insert(now);
                Ok(())
            }
        }
    }

    /// Forget `key`, e.g. when sending failed and the user should retry.
    pub fn release(&self, key: &str) {
        self.last_sent.remove(key);
    }

    /// Drop entries older than the cooldown.
    pub fn prune(&self) {
        let cooldown = self.cooldown;
        self.last_sent.retain(|_, at| at.elapsed() < cooldown);
    }
}
