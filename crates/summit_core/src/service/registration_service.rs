//! Conference registration state machine.
//!
//! # Responsibility
//! - Drive the `NotRegistered`/`Registered` transitions for one
//!   (user, conference) pair.
//! - Mutate the profile attendance list and the conference seat counter as
//!   one all-or-nothing unit.
//!
//! # Invariants
//! - Both aggregate reads, the decision, and both writes happen inside a
//!   single IMMEDIATE transaction; concurrent registrants serialize on the
//!   conference row.
//! - `seats_available` never goes negative and never exceeds
//!   `max_attendees`.
//! - Unregistering a pair that is not registered is a no-op, not an error.

use crate::auth::{require_user, CurrentUser};
use crate::jobs::{Job, JobQueue};
use crate::model::conference::ConferenceId;
use crate::repo::conference_repo::{load_conference, set_seats_available};
use crate::repo::profile_repo::{
    append_attendance, is_attending, load_or_create_profile, remove_attendance,
};
use crate::repo::{ensure_connection_ready, RepoError, RepoResult};
use log::info;
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};

const REGISTRATION_REQUIRED_SCHEMA: &[(&str, &[&str])] = &[
    ("profiles", &["user_id", "display_name", "main_email"]),
    ("conferences", &["conference_id", "seats_available"]),
    ("attendance", &["user_id", "conference_id", "position"]),
];

/// Service error for registration transitions.
#[derive(Debug)]
pub enum RegistrationError {
    /// No current user; authorization required.
    NotAuthenticated,
    /// Target conference does not exist.
    ConferenceNotFound(ConferenceId),
    /// The pair is already in the `Registered` state (conflict).
    AlreadyRegistered(ConferenceId),
    /// The conference has no seats left (conflict).
    NoSeatsAvailable(ConferenceId),
    /// Transaction collision; retry with backoff.
    TransientConflict,
    /// Repository-level failure.
    Repo(RepoError),
}

impl Display for RegistrationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotAuthenticated => write!(f, "authorization required"),
            Self::ConferenceNotFound(id) => write!(f, "conference not found: {id}"),
            Self::AlreadyRegistered(id) => {
                write!(f, "already registered for conference {id}")
            }
            Self::NoSeatsAvailable(id) => {
                write!(f, "no seats available for conference {id}")
            }
            Self::TransientConflict => {
                write!(f, "registration write conflict; retry the operation")
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RegistrationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for RegistrationError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::TransientConflict => Self::TransientConflict,
            RepoError::ConferenceNotFound(id) => Self::ConferenceNotFound(id),
            other => Self::Repo(other),
        }
    }
}

/// Registration state machine over one store connection.
pub struct RegistrationService<'a> {
    conn: &'a Connection,
    jobs: &'a dyn JobQueue,
}

impl<'a> RegistrationService<'a> {
    /// Creates the service from a migrated connection and a job queue.
    pub fn try_new(conn: &'a Connection, jobs: &'a dyn JobQueue) -> RepoResult<Self> {
        ensure_connection_ready(conn, REGISTRATION_REQUIRED_SCHEMA)?;
        Ok(Self { conn, jobs })
    }

    /// Registers the current user for one conference.
    ///
    /// # Contract
    /// - Fails `ConferenceNotFound` when the conference is missing.
    /// - Fails `AlreadyRegistered` when the pair is already registered;
    ///   the seat counter is left unchanged.
    /// - Fails `NoSeatsAvailable` at zero seats; state unchanged.
    /// - On success the attendance append and the seat decrement commit
    ///   together, then an announcement refresh is enqueued.
    pub fn register(
        &self,
        auth: &dyn CurrentUser,
        conference_id: ConferenceId,
    ) -> Result<bool, RegistrationError> {
        let identity = require_user(auth).map_err(|_| RegistrationError::NotAuthenticated)?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)
            .map_err(RepoError::from)?;

        let profile = load_or_create_profile(
            &tx,
            &identity.user_id,
            &identity.nickname,
            &identity.email,
        )?;
        let conference = load_conference(&tx, conference_id)?
            .ok_or(RegistrationError::ConferenceNotFound(conference_id))?;

        if is_attending(&tx, &profile.user_id, conference_id)? {
            return Err(RegistrationError::AlreadyRegistered(conference_id));
        }
        if !conference.has_seats() {
            return Err(RegistrationError::NoSeatsAvailable(conference_id));
        }

        append_attendance(&tx, &profile.user_id, conference_id)?;
        set_seats_available(&tx, conference_id, conference.seats_available - 1)?;
        tx.commit().map_err(RepoError::from)?;

        info!(
            "event=register module=registration status=ok conference_id={conference_id} \
             seats_left={}",
            conference.seats_available - 1
        );
        self.jobs.enqueue(Job::RecomputeAnnouncement);
        Ok(true)
    }

    /// Unregisters the current user from one conference.
    ///
    /// Returns `false` without mutation when the pair is not registered.
    pub fn unregister(
        &self,
        auth: &dyn CurrentUser,
        conference_id: ConferenceId,
    ) -> Result<bool, RegistrationError> {
        let identity = require_user(auth).map_err(|_| RegistrationError::NotAuthenticated)?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)
            .map_err(RepoError::from)?;

        let profile = load_or_create_profile(
            &tx,
            &identity.user_id,
            &identity.nickname,
            &identity.email,
        )?;
        let conference = load_conference(&tx, conference_id)?
            .ok_or(RegistrationError::ConferenceNotFound(conference_id))?;

        let removed = remove_attendance(&tx, &profile.user_id, conference_id)?;
        if removed {
            set_seats_available(&tx, conference_id, conference.seats_available + 1)?;
        }
        tx.commit().map_err(RepoError::from)?;

        info!(
            "event=unregister module=registration status=ok conference_id={conference_id} \
             removed={removed}"
        );
        if removed {
            self.jobs.enqueue(Job::RecomputeAnnouncement);
        }
        Ok(removed)
    }
}
