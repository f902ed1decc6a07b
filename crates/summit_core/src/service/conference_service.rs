//! Conference use-case service.
//!
//! # Responsibility
//! - Create conferences with creation-time defaults under the organizer.
//! - Serve keyed, organizer-scoped, and filtered conference queries with
//!   organizer display-name projections.
//!
//! # Invariants
//! - Conference name is required; everything else falls back to defaults.
//! - `seats_available` starts equal to `max_attendees`; `month` derives
//!   from the start date.
//! - Query filters pass the validator before any SQL is rendered.

use crate::auth::{require_user, CurrentUser};
use crate::jobs::{Job, JobQueue};
use crate::model::conference::{Conference, ConferenceId};
use crate::model::profile::UserId;
use crate::query::filter::{validate_filters, FilterError, RawFilter};
use crate::query::plan::build_conference_query;
use crate::repo::conference_repo::{ConferenceRepository, SqliteConferenceRepository};
use crate::repo::profile_repo::{ProfileRepository, SqliteProfileRepository};
use crate::repo::{RepoError, RepoResult};
use chrono::NaiveDate;
use log::info;
use rusqlite::Connection;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

const DEFAULT_CITY: &str = "Default City";
const DEFAULT_TOPICS: [&str; 2] = ["Default", "Topic"];

/// Seat threshold at or below which a conference is a last-chance pick.
const LAST_CHANCE_SEATS: i64 = 2;

/// Service error for conference use-cases.
#[derive(Debug)]
pub enum ConferenceServiceError {
    /// No current user; authorization required.
    NotAuthenticated,
    /// Conference name field is required.
    NameRequired,
    /// Date input is not a `YYYY-MM-DD` value.
    InvalidDate(String),
    /// Target conference does not exist.
    ConferenceNotFound(ConferenceId),
    /// User-supplied filters failed validation.
    Filter(FilterError),
    /// Repository-level failure.
    Repo(RepoError),
}

impl Display for ConferenceServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotAuthenticated => write!(f, "authorization required"),
            Self::NameRequired => write!(f, "conference name field required"),
            Self::InvalidDate(value) => write!(f, "invalid date `{value}`"),
            Self::ConferenceNotFound(id) => write!(f, "conference not found: {id}"),
            Self::Filter(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ConferenceServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Filter(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ConferenceServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::ConferenceNotFound(id) => Self::ConferenceNotFound(id),
            other => Self::Repo(other),
        }
    }
}

impl From<FilterError> for ConferenceServiceError {
    fn from(value: FilterError) -> Self {
        Self::Filter(value)
    }
}

/// Conference creation input; only `name` is required.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConferenceInput {
    pub name: String,
    pub city: Option<String>,
    pub topics: Vec<String>,
    /// `YYYY-MM-DD`; longer datetime strings are truncated to the date.
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub max_attendees: Option<i64>,
}

/// Conference plus its organizer's display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConferenceView {
    pub conference: Conference,
    pub organizer_display_name: String,
}

/// Use-case service for conference creation and queries.
pub struct ConferenceService<'a> {
    conferences: SqliteConferenceRepository<'a>,
    profiles: SqliteProfileRepository<'a>,
    jobs: &'a dyn JobQueue,
}

impl<'a> ConferenceService<'a> {
    /// Creates the service from a migrated connection and a job queue.
    pub fn try_new(conn: &'a Connection, jobs: &'a dyn JobQueue) -> RepoResult<Self> {
        Ok(Self {
            conferences: SqliteConferenceRepository::try_new(conn)?,
            profiles: SqliteProfileRepository::try_new(conn)?,
            jobs,
        })
    }

    /// Creates a conference under the current user.
    ///
    /// # Contract
    /// - Name is required; city/topics/max-attendees fall back to defaults.
    /// - `month` derives from the start date, `seats_available` from
    ///   `max_attendees`.
    /// - An announcement refresh is enqueued after the write commits.
    pub fn create_conference(
        &self,
        auth: &dyn CurrentUser,
        input: &ConferenceInput,
    ) -> Result<Conference, ConferenceServiceError> {
        let identity = require_user(auth).map_err(|_| ConferenceServiceError::NotAuthenticated)?;
        if input.name.trim().is_empty() {
            return Err(ConferenceServiceError::NameRequired);
        }

        // Organizer profile must exist before becoming a parent key.
        self.profiles
            .get_or_create_profile(&identity.user_id, &identity.nickname, &identity.email)?;

        let start_date = parse_input_date(input.start_date.as_deref())?;
        let end_date = parse_input_date(input.end_date.as_deref())?;

        let city = input
            .city
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(DEFAULT_CITY);
        let topics = if input.topics.is_empty() {
            DEFAULT_TOPICS.iter().map(|topic| topic.to_string()).collect()
        } else {
            input.topics.clone()
        };

        let conference_id = self.conferences.allocate_conference_id()?;
        let conference = Conference::new(
            conference_id,
            identity.user_id,
            input.name.trim(),
            city,
            topics,
            start_date,
            end_date,
            input.max_attendees.unwrap_or(0),
        );
        self.conferences.create_conference(&conference)?;

        info!(
            "event=conference_create module=conference status=ok conference_id={conference_id} \
             max_attendees={}",
            conference.max_attendees
        );
        self.jobs.enqueue(Job::RecomputeAnnouncement);
        Ok(conference)
    }

    /// Returns one conference with its organizer display name.
    pub fn conference(
        &self,
        conference_id: ConferenceId,
    ) -> Result<ConferenceView, ConferenceServiceError> {
        let conference = self
            .conferences
            .get_conference(conference_id)?
            .ok_or(ConferenceServiceError::ConferenceNotFound(conference_id))?;
        let views = self.with_organizer_names(vec![conference])?;
        // with_organizer_names preserves cardinality for a non-empty input.
        views
            .into_iter()
            .next()
            .ok_or(ConferenceServiceError::ConferenceNotFound(conference_id))
    }

    /// Conferences organized by the current user, ordered by name.
    pub fn conferences_created(
        &self,
        auth: &dyn CurrentUser,
    ) -> Result<Vec<ConferenceView>, ConferenceServiceError> {
        let identity = require_user(auth).map_err(|_| ConferenceServiceError::NotAuthenticated)?;
        let conferences = self.conferences.conferences_by_organizer(&identity.user_id)?;
        self.with_organizer_names(conferences)
    }

    /// Runs a filtered conference query.
    ///
    /// Raw filters flow validator -> plan builder -> repository; organizer
    /// display names are batch-loaded for the projection.
    pub fn query_conferences(
        &self,
        raw_filters: &[RawFilter],
    ) -> Result<Vec<ConferenceView>, ConferenceServiceError> {
        let validated = validate_filters(raw_filters)?;
        let plan = build_conference_query(validated);
        let conferences = self.conferences.query(&plan)?;
        self.with_organizer_names(conferences)
    }

    /// Conferences almost out of seats (`0 < seats_available <= 2`).
    pub fn last_chance_conferences(&self) -> Result<Vec<Conference>, ConferenceServiceError> {
        self.conferences
            .nearly_sold_out(LAST_CHANCE_SEATS)
            .map_err(Into::into)
    }

    /// Conferences the current user attends, in registration order.
    pub fn conferences_to_attend(
        &self,
        auth: &dyn CurrentUser,
    ) -> Result<Vec<ConferenceView>, ConferenceServiceError> {
        let identity = require_user(auth).map_err(|_| ConferenceServiceError::NotAuthenticated)?;
        let profile = self.profiles.get_or_create_profile(
            &identity.user_id,
            &identity.nickname,
            &identity.email,
        )?;
        let conferences = self
            .conferences
            .get_conferences(&profile.conferences_to_attend)?;
        self.with_organizer_names(conferences)
    }

    fn with_organizer_names(
        &self,
        conferences: Vec<Conference>,
    ) -> Result<Vec<ConferenceView>, ConferenceServiceError> {
        let mut organizer_ids: Vec<UserId> = conferences
            .iter()
            .map(|conference| conference.organizer_id.clone())
            .collect();
        organizer_ids.sort();
        organizer_ids.dedup();

        let names: HashMap<UserId, String> = self
            .profiles
            .get_profiles(&organizer_ids)?
            .into_iter()
            .map(|profile| (profile.user_id, profile.display_name))
            .collect();

        Ok(conferences
            .into_iter()
            .map(|conference| {
                let organizer_display_name = names
                    .get(&conference.organizer_id)
                    .cloned()
                    .unwrap_or_default();
                ConferenceView {
                    conference,
                    organizer_display_name,
                }
            })
            .collect())
    }
}

fn parse_input_date(value: Option<&str>) -> Result<Option<NaiveDate>, ConferenceServiceError> {
    let Some(raw) = value.map(str::trim).filter(|value| !value.is_empty()) else {
        return Ok(None);
    };

    // Datetime inputs are accepted by truncating to the date part.
    let date_part = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| ConferenceServiceError::InvalidDate(raw.to_string()))
}
