// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Credit ledger arithmetic.
//!
//! Pure functions: the database layer reads a user, posts a movement here,
//! and commits the updated user together with the returned transaction in
//! one Firestore transaction.

use crate::models::{CreditTransaction, TransactionCategory, TransactionType, User};

/// Free/paid split of a user's credits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Balance {
    pub free: i64,
    pub paid: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("Insufficient credits: required {required}, available {available}")]
    Insufficient { required: i64, available: i64 },

    #[error("Amount must be positive, got {0}")]
    NonPositive(i64),

    #[error("Adding {0} credits would overflow the balance")]
    Overflow(i64),
}

impl Balance {
    pub fn of(user: &User) -> Self {
        Self {
            free: user.credits_free,
            paid: user.credits_paid,
        }
    }

    pub fn total(&self) -> i64 {
        self.free.saturating_add(self.paid)
    }

    /// Remove `amount`, consuming paid credits before free ones.
    pub fn debit(&self, amount: i64) -> Result<Balance, LedgerError> {
        if amount <= 0 {
            return Err(LedgerError::NonPositive(amount));
        }
        if self.total() < amount {
            return Err(LedgerError::Insufficient {
                required: amount,
                available: self.total(),
            });
        }
        let from_paid = amount.min(self.paid);
        Ok(Balance {
            paid: self.paid - from_paid,
            free: self.free - (amount - from_paid),
        })
    }

    /// Add `amount` to free credits.
    pub fn credit_free(&self, amount: i64) -> Result<Balance, LedgerError> {
        if amount <= 0 {
            return Err(LedgerError::NonPositive(amount));
        }
        let free = self
            .free
            .checked_add(amount)
            .filter(|free| free.checked_add(self.paid).is_some())
            .ok_or(LedgerError::Overflow(amount))?;
        Ok(Balance {
            free,
            paid: self.paid,
        })
    }
}

/// Which way credits move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Movement {
    Debit(i64),
    Credit(i64),
}

/// Descriptive part of a ledger entry.
#[derive(Debug, Clone)]
pub struct Memo {
    pub transaction_type: TransactionType,
    pub category: TransactionCategory,
    pub description: String,
    pub reference_id: Option<String>,
    pub reference_type: Option<String>,
    pub created_by: Option<String>,
}

impl Memo {
    pub fn new(
        transaction_type: TransactionType,
        category: TransactionCategory,
        description: impl Into<String>,
    ) -> Self {
        Self {
            transaction_type,
            category,
            description: description.into(),
            reference_id: None,
            reference_type: None,
            created_by: None,
        }
    }

    pub fn reference(mut self, id: impl Into<String>, kind: &str) -> Self {
        self.reference_id = Some(id.into());
        self.reference_type = Some(kind.to_string());
        self
    }

    pub fn by(mut self, actor: impl Into<String>) -> Self {
        self.created_by = Some(actor.into());
        self
    }
}

/// Apply a movement to `user` and build the matching ledger entry.
///
/// On error the user is left untouched.
pub fn post(
    user: &mut User,
    movement: Movement,
    memo: Memo,
    transaction_id: String,
    now: &str,
) -> Result<CreditTransaction, LedgerError> {
    let before = Balance::of(user);
    let (after, signed) = match movement {
        Movement::Debit(amount) => (before.debit(amount)?, -amount),
        Movement::Credit(amount) => (before.credit_free(amount)?, amount),
    };

    user.credits_free = after.free;
    user.credits_paid = after.paid;
    user.updated_at = now.to_string();

    Ok(CreditTransaction {
        id: transaction_id,
        user_id: user.id.clone(),
        amount: signed,
        transaction_type: memo.transaction_type,
        category: memo.category,
        description: memo.description,
        reference_id: memo.reference_id,
        reference_type: memo.reference_type,
        balance_free: after.free,
        balance_paid: after.paid,
        created_at: now.to_string(),
        created_by: memo.created_by,
    })
}
