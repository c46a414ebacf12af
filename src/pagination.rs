// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Page/limit pagination over in-memory result sets.

use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};

pub const MAX_LIMIT: u32 = 100;

/// Common `page`/`limit` query parameters.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageParams {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default)]
    pub limit: Option<u32>,
}

fn default_page() -> u32 {
    1
}

impl PageParams {
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page,
            limit: Some(limit),
        }
    }
}

/// One page of results plus totals.
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: u32,
    pub limit: u32,
    pub pages: u32,
}

/// Slice `items` to the requested page. `default_limit` applies when the
/// client sent no limit; any limit is capped at [`MAX_LIMIT`].
pub fn paginate<T>(items: Vec<T>, params: PageParams, default_limit: u32) -> Result<Page<T>> {
    if params.page < 1 {
        return Err(AppError::BadRequest(
            "Page must be greater than 0".to_string(),
        ));
    }
    let limit = params.limit.unwrap_or(default_limit).clamp(1, MAX_LIMIT);
    let total = items.len();

    // Use checked multiplication to prevent overflow
    let start = (params.page as usize - 1)
        .checked_mul(limit as usize)
        .ok_or_else(|| AppError::BadRequest("Page number causes overflow".to_string()))?;

    let items: Vec<T> = items
        .into_iter()
        .skip(start)
        .take(limit as usize)
        .collect();

    Ok(Page {
        items,
        total,
        page: params.page,
        limit,
        pages: total.div_ceil(limit as usize) as u32,
    })
}
