//! Profile use-case service.
//!
//! # Responsibility
//! - Provide get-or-create and save entry points for the caller's profile.
//! - Normalize user-modifiable fields before persistence.
//!
//! # Invariants
//! - Profiles are created lazily on first access with defaults.
//! - Blank update fields are skipped, not written.
//! - The recorded email must keep a plausible mailbox shape.

use crate::auth::{require_user, CurrentUser};
use crate::model::profile::{Profile, ShirtSize};
use crate::repo::profile_repo::ProfileRepository;
use crate::repo::RepoError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

/// Service error for profile use-cases.
#[derive(Debug)]
pub enum ProfileServiceError {
    /// No current user; authorization required.
    NotAuthenticated,
    /// Identity email does not look like a mailbox address.
    InvalidEmail(String),
    /// Shirt-size token is not a known size.
    InvalidShirtSize(String),
    /// Repository-level failure.
    Repo(RepoError),
}

impl Display for ProfileServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotAuthenticated => write!(f, "authorization required"),
            Self::InvalidEmail(value) => write!(f, "invalid email address `{value}`"),
            Self::InvalidShirtSize(value) => write!(f, "invalid shirt size `{value}`"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ProfileServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ProfileServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Optional profile field updates; blank values are skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub display_name: Option<String>,
    /// User-facing size token, e.g. `M_W`.
    pub shirt_size: Option<String>,
}

/// Use-case service for the caller's own profile.
pub struct ProfileService<R: ProfileRepository> {
    repo: R,
}

impl<R: ProfileRepository> ProfileService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Returns the caller's profile, creating it on first access.
    pub fn profile(&self, auth: &dyn CurrentUser) -> Result<Profile, ProfileServiceError> {
        let identity = require_user(auth).map_err(|_| ProfileServiceError::NotAuthenticated)?;
        if !EMAIL_RE.is_match(&identity.email) {
            return Err(ProfileServiceError::InvalidEmail(identity.email));
        }
        self.repo
            .get_or_create_profile(&identity.user_id, &identity.nickname, &identity.email)
            .map_err(Into::into)
    }

    /// Applies profile updates and returns the stored result.
    ///
    /// # Contract
    /// - Absent or blank fields keep their current values.
    /// - Unknown shirt-size tokens fail without partial writes.
    pub fn save_profile(
        &self,
        auth: &dyn CurrentUser,
        update: &ProfileUpdate,
    ) -> Result<Profile, ProfileServiceError> {
        let mut profile = self.profile(auth)?;

        if let Some(display_name) = update
            .display_name
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
        {
            profile.display_name = display_name.to_string();
        }

        if let Some(token) = update
            .shirt_size
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
        {
            profile.shirt_size = ShirtSize::parse(token)
                .ok_or_else(|| ProfileServiceError::InvalidShirtSize(token.to_string()))?;
        }

        self.repo.update_profile_fields(
            &profile.user_id,
            &profile.display_name,
            profile.shirt_size,
        )?;
        Ok(profile)
    }
}
