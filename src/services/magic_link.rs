// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Single-use login tokens.
//!
//! The raw token only travels in the e-mailed link; Firestore keeps its
//! SHA-256 digest, so a database read does not yield a usable link.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use ring::rand::{SecureRandom, SystemRandom};
use sha2::{Digest, Sha256};

const TOKEN_BYTES: usize = 32;

/// A freshly issued token and the digest to store.
pub struct IssuedToken {
    pub token: String,
    pub hash: String,
}

/// Generate a random URL-safe token.
pub fn issue() -> anyhow::Result<IssuedToken> {
    let mut bytes = [0u8; TOKEN_BYTES];
    SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|_| anyhow::anyhow!("System RNG failure"))?;
    let token = URL_SAFE_NO_PAD.encode(bytes);
    let hash = hash_token(&token);
    Ok(IssuedToken { token, hash })
}

/// Hex SHA-256 digest of a token, as stored on the user.
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Link the user clicks in the e-mail.
pub fn verify_url(frontend_url: &str, token: &str) -> String {
    format!(
        "{}/auth/verify?token={}",
        frontend_url.trim_end_matches('/'),
        urlencoding::encode(token)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_is_random_and_hash_matches() {
        let a = issue().unwrap();
        let b = issue().unwrap();
        assert_ne!(a.token, b.token);
        assert_eq!(a.hash, hash_token(&a.token));
        assert_eq!(a.hash.len(), 64);
        assert_eq!(a.token.len(), 43);
    }

    #[test]
    fn test_verify_url() {
        assert_eq!(
            verify_url("http://localhost:3000/", "abc-_x"),
            "http://localhost:3000/auth/verify?token=abc-_x"
        );
    }
}
