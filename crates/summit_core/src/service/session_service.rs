//! Session use-case service.
//!
//! # Responsibility
//! - Create sessions under a conference, gated to the organizer.
//! - Serve conference-scoped, speaker, and schedule-driven session
//!   queries.
//!
//! # Invariants
//! - Only the conference organizer may add sessions (forbidden otherwise).
//! - Session creation enqueues a featured-speaker refresh for the
//!   (speaker, conference) pair when a speaker is set.
//! - Date and start-time inputs must parse before any write happens.

use crate::auth::{require_user, CurrentUser};
use crate::jobs::{Job, JobQueue};
use crate::model::conference::ConferenceId;
use crate::model::session::Session;
use crate::repo::conference_repo::{ConferenceRepository, SqliteConferenceRepository};
use crate::repo::profile_repo::{ProfileRepository, SqliteProfileRepository};
use crate::repo::session_repo::{SessionRepository, SqliteSessionRepository};
use crate::repo::{RepoError, RepoResult};
use chrono::{NaiveDate, NaiveTime};
use log::info;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for session use-cases.
#[derive(Debug)]
pub enum SessionServiceError {
    /// No current user; authorization required.
    NotAuthenticated,
    /// Session name field is required.
    NameRequired,
    /// Date input is not a `YYYY-MM-DD` value.
    InvalidDate(String),
    /// Start-time input is not an `HH:MM` value.
    InvalidStartTime(String),
    /// Target conference does not exist.
    ConferenceNotFound(ConferenceId),
    /// Caller is not the conference organizer (forbidden).
    NotOrganizer(ConferenceId),
    /// Repository-level failure.
    Repo(RepoError),
}

impl Display for SessionServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotAuthenticated => write!(f, "authorization required"),
            Self::NameRequired => write!(f, "session name field required"),
            Self::InvalidDate(value) => write!(f, "invalid date `{value}`"),
            Self::InvalidStartTime(value) => write!(f, "invalid start time `{value}`"),
            Self::ConferenceNotFound(id) => write!(f, "conference not found: {id}"),
            Self::NotOrganizer(id) => {
                write!(f, "only the organizer may add sessions to conference {id}")
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SessionServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for SessionServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::ConferenceNotFound(id) => Self::ConferenceNotFound(id),
            other => Self::Repo(other),
        }
    }
}

/// Session creation input; only `name` is required.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionInput {
    pub name: String,
    pub speaker: Option<String>,
    pub duration_minutes: Option<i64>,
    pub type_of_session: Option<String>,
    /// `YYYY-MM-DD`; longer datetime strings are truncated to the date.
    pub date: Option<String>,
    /// `HH:MM`; longer time strings are truncated to hour and minute.
    pub start_time: Option<String>,
}

/// Use-case service for session creation and queries.
pub struct SessionService<'a> {
    sessions: SqliteSessionRepository<'a>,
    conferences: SqliteConferenceRepository<'a>,
    profiles: SqliteProfileRepository<'a>,
    jobs: &'a dyn JobQueue,
}

impl<'a> SessionService<'a> {
    /// Creates the service from a migrated connection and a job queue.
    pub fn try_new(conn: &'a Connection, jobs: &'a dyn JobQueue) -> RepoResult<Self> {
        Ok(Self {
            sessions: SqliteSessionRepository::try_new(conn)?,
            conferences: SqliteConferenceRepository::try_new(conn)?,
            profiles: SqliteProfileRepository::try_new(conn)?,
            jobs,
        })
    }

    /// Creates a session under one conference.
    ///
    /// # Contract
    /// - The conference must exist and the caller must be its organizer.
    /// - With a speaker set, a featured-speaker refresh for this
    ///   conference is enqueued after the write.
    pub fn create_session(
        &self,
        auth: &dyn CurrentUser,
        conference_id: ConferenceId,
        input: &SessionInput,
    ) -> Result<Session, SessionServiceError> {
        let identity = require_user(auth).map_err(|_| SessionServiceError::NotAuthenticated)?;
        if input.name.trim().is_empty() {
            return Err(SessionServiceError::NameRequired);
        }

        let conference = self
            .conferences
            .get_conference(conference_id)?
            .ok_or(SessionServiceError::ConferenceNotFound(conference_id))?;
        if conference.organizer_id != identity.user_id {
            return Err(SessionServiceError::NotOrganizer(conference_id));
        }

        let session_date = parse_input_date(input.date.as_deref())?;
        let start_time = parse_input_time(input.start_time.as_deref())?;

        let session = Session {
            session_id: self.sessions.allocate_session_id()?,
            conference_id,
            name: input.name.trim().to_string(),
            speaker: input
                .speaker
                .as_deref()
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string),
            duration_minutes: input.duration_minutes,
            type_of_session: input.type_of_session.clone(),
            session_date,
            start_time,
        };
        self.sessions.create_session(&session)?;

        info!(
            "event=session_create module=session status=ok conference_id={conference_id} \
             session_id={}",
            session.session_id
        );
        if let Some(speaker) = &session.speaker {
            self.jobs.enqueue(Job::RecomputeFeaturedSpeaker {
                speaker: speaker.clone(),
                conference_id,
            });
        }
        Ok(session)
    }

    /// All sessions of one conference.
    pub fn conference_sessions(
        &self,
        conference_id: ConferenceId,
    ) -> Result<Vec<Session>, SessionServiceError> {
        self.ensure_conference_exists(conference_id)?;
        self.sessions
            .sessions_by_conference(conference_id)
            .map_err(Into::into)
    }

    /// Sessions of one conference with a given type tag.
    pub fn conference_sessions_by_type(
        &self,
        conference_id: ConferenceId,
        type_of_session: &str,
    ) -> Result<Vec<Session>, SessionServiceError> {
        self.ensure_conference_exists(conference_id)?;
        self.sessions
            .sessions_by_conference_and_type(conference_id, type_of_session)
            .map_err(Into::into)
    }

    /// All sessions by one speaker, across all conferences.
    pub fn sessions_by_speaker(&self, speaker: &str) -> Result<Vec<Session>, SessionServiceError> {
        self.sessions.sessions_by_speaker(speaker).map_err(Into::into)
    }

    /// Sessions happening on `today` within the conferences the current
    /// user attends.
    pub fn today_sessions(
        &self,
        auth: &dyn CurrentUser,
        today: NaiveDate,
    ) -> Result<Vec<Session>, SessionServiceError> {
        let identity = require_user(auth).map_err(|_| SessionServiceError::NotAuthenticated)?;
        let profile = self.profiles.get_or_create_profile(
            &identity.user_id,
            &identity.nickname,
            &identity.email,
        )?;
        self.sessions
            .sessions_on_date(today, &profile.conferences_to_attend)
            .map_err(Into::into)
    }

    /// Timed non-workshop sessions starting at or before `cutoff`.
    ///
    /// The type check stays in code: the time bound already consumes the
    /// one range predicate the query model allows.
    pub fn daytime_non_workshops(
        &self,
        cutoff: NaiveTime,
    ) -> Result<Vec<Session>, SessionServiceError> {
        let mut sessions = self.sessions.sessions_starting_by(cutoff)?;
        sessions.retain(|session| {
            session
                .type_of_session
                .as_deref()
                .map_or(true, |tag| !tag.contains("workshop") && !tag.contains("Workshop"))
        });
        Ok(sessions)
    }

    fn ensure_conference_exists(
        &self,
        conference_id: ConferenceId,
    ) -> Result<(), SessionServiceError> {
        self.conferences
            .get_conference(conference_id)?
            .ok_or(SessionServiceError::ConferenceNotFound(conference_id))?;
        Ok(())
    }
}

fn parse_input_date(value: Option<&str>) -> Result<Option<NaiveDate>, SessionServiceError> {
    let Some(raw) = value.map(str::trim).filter(|value| !value.is_empty()) else {
        return Ok(None);
    };

    let date_part = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| SessionServiceError::InvalidDate(raw.to_string()))
}

fn parse_input_time(value: Option<&str>) -> Result<Option<NaiveTime>, SessionServiceError> {
    let Some(raw) = value.map(str::trim).filter(|value| !value.is_empty()) else {
        return Ok(None);
    };

    let time_part = raw.get(..5).unwrap_or(raw);
    NaiveTime::parse_from_str(time_part, "%H:%M")
        .map(Some)
        .map_err(|_| SessionServiceError::InvalidStartTime(raw.to_string()))
}
