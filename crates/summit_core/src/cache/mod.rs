//! Derived-cache storage and maintenance.
//!
//! # Responsibility
//! - Persist derived view entries (announcement, featured speaker) in
//!   explicit keyed cache slots.
//! - Recompute entries from aggregate state; entries carry no independent
//!   authority and are always safely reconstructable.
//!
//! # Invariants
//! - An absent slot is distinguishable from an empty payload.
//! - Recomputation is idempotent: it reads current state and overwrites.
//! - Cache failures never propagate to the write that triggered them.

use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod maintainer;
pub mod store;

pub type CacheResult<T> = Result<T, CacheError>;

/// Errors from cache storage and recomputation.
#[derive(Debug)]
pub enum CacheError {
    /// Underlying repository/store failure.
    Repo(RepoError),
    /// Cached payload cannot be encoded or decoded.
    Payload(String),
}

impl Display for CacheError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::Payload(message) => write!(f, "invalid cache payload: {message}"),
        }
    }
}

impl Error for CacheError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Payload(_) => None,
        }
    }
}

impl From<RepoError> for CacheError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<rusqlite::Error> for CacheError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Repo(RepoError::from(value))
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(value: serde_json::Error) -> Self {
        Self::Payload(value.to_string())
    }
}
