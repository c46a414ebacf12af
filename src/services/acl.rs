// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Role-based permission matrix.
//!
//! The defaults are compiled in; admins can flip individual cells through
//! [`AclOverride`] documents, which are layered on top at lookup time.

use crate::models::{AclOverride, Role};
use std::collections::{BTreeMap, BTreeSet};

pub const ACTIONS: [&str; 4] = ["create", "read", "update", "delete"];

pub const RESOURCES: [&str; 9] = [
    "users",
    "jobs",
    "profiles",
    "credits",
    "settings",
    "bonus",
    "interviews",
    "applications",
    "verifications",
];

const CRUD: &[&str] = &["create", "read", "update", "delete"];

type Matrix = &'static [(&'static str, &'static [&'static str])];

const ADMIN: Matrix = &[
    ("users", CRUD),
    ("jobs", CRUD),
    ("profiles", CRUD),
    ("credits", CRUD),
    ("settings", CRUD),
    ("bonus", CRUD),
    ("interviews", CRUD),
];

const JOBSEEKER: Matrix = &[
    ("jobs", &["read"]),
    ("profiles", &["create", "read", "update"]),
    ("credits", &["read"]),
    ("applications", &["create", "read", "update"]),
    ("interviews", &["create", "read"]),
];

const EMPLOYER: Matrix = &[
    ("jobs", CRUD),
    ("profiles", &["read"]),
    ("credits", &["read", "update"]),
    ("applications", &["read", "update"]),
    ("interviews", &["create", "read"]),
];

const INTERVIEWER: Matrix = &[
    ("profiles", &["read", "update"]),
    ("credits", &["read"]),
    ("interviews", &["read", "update"]),
    ("verifications", &["create", "read", "update"]),
];

fn matrix(role: Role) -> Matrix {
    match role {
        Role::Admin => ADMIN,
        Role::JobSeeker => JOBSEEKER,
        Role::Employer => EMPLOYER,
        Role::Interviewer => INTERVIEWER,
    }
}

/// Resource -> allowed actions.
pub type Permissions = BTreeMap<String, BTreeSet<String>>;

/// Default permission check, without overrides.
pub fn check_permission(role: Role, resource: &str, action: &str) -> bool {
    matrix(role)
        .iter()
        .any(|(r, actions)| *r == resource && actions.contains(&action))
}

/// Default permissions for a role.
pub fn permissions_for(role: Role) -> Permissions {
    matrix(role)
        .iter()
        .map(|(resource, actions)| {
            (
                resource.to_string(),
                actions.iter().map(|a| a.to_string()).collect(),
            )
        })
        .collect()
}

/// Defaults with the role's overrides applied. Resources left with no
/// allowed action are dropped.
pub fn effective_permissions(role: Role, overrides: &[AclOverride]) -> Permissions {
    let mut perms = permissions_for(role);
    for o in overrides.iter().filter(|o| o.role == role) {
        let actions = perms.entry(o.resource.clone()).or_default();
        if o.allowed {
            actions.insert(o.action.clone());
        } else {
            actions.remove(&o.action);
        }
    }
    perms.retain(|_, actions| !actions.is_empty());
    perms
}

/// Whether a resource/action pair names a real cell of the matrix.
pub fn is_known(resource: &str, action: &str) -> bool {
    RESOURCES.contains(&resource) && ACTIONS.contains(&action)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn override_(role: Role, resource: &str, action: &str, allowed: bool) -> AclOverride {
        AclOverride {
            id: AclOverride::doc_id(role, resource, action),
            role,
            resource: resource.into(),
            action: action.into(),
            allowed,
            updated_at: "2026-01-01T00:00:00Z".into(),
            updated_by: "admin".into(),
        }
    }

    #[test]
    fn test_defaults() {
        assert!(check_permission(Role::Admin, "settings", "delete"));
        assert!(check_permission(Role::JobSeeker, "applications", "create"));
        assert!(!check_permission(Role::JobSeeker, "jobs", "create"));
        assert!(check_permission(Role::Employer, "jobs", "delete"));
        assert!(!check_permission(Role::Interviewer, "jobs", "read"));
        assert!(check_permission(Role::Interviewer, "verifications", "create"));
    }

    #[test]
    fn test_permissions_for_lists_matrix_rows() {
        let perms = permissions_for(Role::Interviewer);
        assert_eq!(perms.len(), 4);
        assert!(perms["interviews"].contains("update"));
    }

    #[test]
    fn test_overrides_grant_and_revoke() {
        let overrides = vec![
            override_(Role::JobSeeker, "jobs", "read", false),
            override_(Role::JobSeeker, "verifications", "read", true),
            override_(Role::Employer, "users", "read", true),
        ];
        let perms = effective_permissions(Role::JobSeeker, &overrides);
        assert!(!perms.contains_key("jobs"));
        assert!(perms["verifications"].contains("read"));
        assert!(!perms.contains_key("users"));
    }

    #[test]
    fn test_is_known() {
        assert!(is_known("jobs", "read"));
        assert!(!is_known("jobs", "publish"));
        assert!(!is_known("payroll", "read"));
    }
}
