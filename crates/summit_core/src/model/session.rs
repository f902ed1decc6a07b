//! Session aggregate model.
//!
//! # Responsibility
//! - Define the session record keyed under its parent conference.
//!
//! # Invariants
//! - A session belongs to exactly one conference for its whole lifetime.
//! - `type_of_session` is an open string tag, not a closed enum.

use crate::model::conference::ConferenceId;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// Numeric session id, allocated under the conference before first write.
pub type SessionId = i64;

/// Validation failures for session records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionValidationError {
    /// Name is blank after trim.
    BlankName,
}

impl std::fmt::Display for SessionValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankName => write!(f, "session name must not be blank"),
        }
    }
}

impl std::error::Error for SessionValidationError {}

/// Session record, a child of one conference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub session_id: SessionId,
    /// Parent conference key; the sole ownership link.
    pub conference_id: ConferenceId,
    pub name: String,
    pub speaker: Option<String>,
    pub duration_minutes: Option<i64>,
    /// Open tag such as "workshop", "lecture", "keynote".
    pub type_of_session: Option<String>,
    pub session_date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
}

impl Session {
    /// Checks record-level invariants before persistence.
    pub fn validate(&self) -> Result<(), SessionValidationError> {
        if self.name.trim().is_empty() {
            return Err(SessionValidationError::BlankName);
        }
        Ok(())
    }
}
