//! Current-user context boundary.
//!
//! # Responsibility
//! - Define the identity contract supplied by the external auth layer.
//! - Map an absent identity to a typed authorization failure.
//!
//! # Invariants
//! - The core never inspects or mints identities; `user_id` is opaque.
//! - Absence of a current user is an error result, never a panic.

use crate::model::profile::UserId;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Identity attributes resolved by the external auth layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity {
    /// Opaque identity key; the profile aggregate key.
    pub user_id: UserId,
    /// Human-readable name used for lazily created profiles.
    pub nickname: String,
    /// Contact email recorded on the profile at first access.
    pub email: String,
}

impl UserIdentity {
    pub fn new(
        user_id: impl Into<UserId>,
        nickname: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            nickname: nickname.into(),
            email: email.into(),
        }
    }
}

/// Current-user provider contract, implemented by the transport layer.
pub trait CurrentUser {
    /// Returns the authenticated identity, `None` when unauthenticated.
    fn current_user(&self) -> Option<UserIdentity>;
}

/// Provider with a fixed, already-resolved identity.
///
/// For transports that authenticate upfront, and for tests.
#[derive(Debug, Clone)]
pub struct StaticUser(pub UserIdentity);

impl CurrentUser for StaticUser {
    fn current_user(&self) -> Option<UserIdentity> {
        Some(self.0.clone())
    }
}

/// Provider with no identity; every guarded operation fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct Anonymous;

impl CurrentUser for Anonymous {
    fn current_user(&self) -> Option<UserIdentity> {
        None
    }
}

/// Authorization failure raised when no current user exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotAuthenticated;

impl Display for NotAuthenticated {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "authorization required")
    }
}

impl Error for NotAuthenticated {}

/// Resolves the current user or fails with [`NotAuthenticated`].
pub fn require_user(provider: &dyn CurrentUser) -> Result<UserIdentity, NotAuthenticated> {
    provider.current_user().ok_or(NotAuthenticated)
}
