//! Capability-based authorization policy.
//!
//! Route handlers check a named permission against the caller's role instead
//! of comparing role strings inline. The grant table is deliberately small
//! until a real policy source exists.

use std::borrow::Cow;
use std::fmt;

use thiserror::Error;

use crate::user::Role;

/// Permission identifier, e.g. `"site.create"`.
///
/// The wildcard permission `"*"` means "allow all" and is only ever granted
/// by the policy table, never required by a handler.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub const fn borrowed(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_wildcard(&self) -> bool {
        self.as_str() == "*"
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Grants everything.
pub const WILDCARD: Permission = Permission::borrowed("*");

/// Required to create a construction site.
pub const SITE_CREATE: Permission = Permission::borrowed("site.create");

static ADMIN_GRANTS: &[Permission] = &[WILDCARD];
static NO_GRANTS: &[Permission] = &[];

/// Effective permissions for a role.
///
/// Admins hold the wildcard; other roles currently have no standing grants
/// beyond the public endpoints.
pub fn permissions_for(role: Role) -> &'static [Permission] {
    match role {
        Role::Admin => ADMIN_GRANTS,
        _ => NO_GRANTS,
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("missing permission '{0}'")]
    Forbidden(String),
}

/// Pure policy check: no IO, no panics.
pub fn authorize(role: Role, required: &Permission) -> Result<(), AuthzError> {
    let granted = permissions_for(role);
    if granted.iter().any(|p| p.is_wildcard() || p == required) {
        Ok(())
    } else {
        Err(AuthzError::Forbidden(required.as_str().to_string()))
    }
}
