//! Core domain logic for the summit conference-management backend.
//! This crate is the single source of truth for business invariants.

pub mod auth;
pub mod cache;
pub mod db;
pub mod jobs;
pub mod logging;
pub mod model;
pub mod query;
pub mod repo;
pub mod service;

pub use auth::{require_user, Anonymous, CurrentUser, NotAuthenticated, StaticUser, UserIdentity};
pub use cache::maintainer::{CacheMaintainer, FeaturedSpeakerEntry};
pub use cache::store::{featured_speaker_key, CacheStore, ANNOUNCEMENT_KEY};
pub use jobs::{execute_job, Job, JobQueue, NullJobQueue, WorkerJobQueue};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::conference::{Conference, ConferenceId};
pub use model::profile::{Profile, ShirtSize, UserId};
pub use model::session::{Session, SessionId};
pub use query::filter::{
    validate_filters, ConferenceFilter, FilterError, FilterField, FilterOperator, FilterValue,
    RawFilter, ValidatedFilters,
};
pub use query::plan::{build_conference_query, ConferenceQueryPlan, SortKey};
pub use repo::conference_repo::{ConferenceRepository, SqliteConferenceRepository};
pub use repo::profile_repo::{ProfileRepository, SqliteProfileRepository};
pub use repo::session_repo::{SessionRepository, SqliteSessionRepository};
pub use repo::{RepoError, RepoResult};
pub use service::conference_service::{
    ConferenceInput, ConferenceService, ConferenceServiceError, ConferenceView,
};
pub use service::profile_service::{ProfileService, ProfileServiceError, ProfileUpdate};
pub use service::registration_service::{RegistrationError, RegistrationService};
pub use service::session_service::{SessionInput, SessionService, SessionServiceError};
pub use service::wishlist_service::{WishlistError, WishlistService};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
