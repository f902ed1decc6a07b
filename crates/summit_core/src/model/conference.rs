//! Conference aggregate model.
//!
//! # Responsibility
//! - Define the conference record keyed under its organizer profile.
//! - Apply creation-time defaults for seats and the derived month.
//!
//! # Invariants
//! - `0 <= seats_available <= max_attendees` at rest; the registration
//!   transaction is the enforcement point, not storage.
//! - `month` is derived from `start_date` (0 when no start date).
//! - `organizer_id` is a denormalized copy of the parent key for filtering.

use crate::model::profile::UserId;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Numeric conference id, allocated under the organizer before first write.
pub type ConferenceId = i64;

/// Validation failures for conference records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConferenceValidationError {
    /// Name is blank after trim.
    BlankName,
    /// Seat counter escaped the `[0, max_attendees]` envelope.
    SeatsOutOfRange {
        seats_available: i64,
        max_attendees: i64,
    },
}

impl std::fmt::Display for ConferenceValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankName => write!(f, "conference name must not be blank"),
            Self::SeatsOutOfRange {
                seats_available,
                max_attendees,
            } => write!(
                f,
                "seats_available {seats_available} outside [0, {max_attendees}]"
            ),
        }
    }
}

impl std::error::Error for ConferenceValidationError {}

/// Conference aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conference {
    pub conference_id: ConferenceId,
    /// Parent profile key, denormalized onto the row for fast filtering.
    pub organizer_id: UserId,
    pub name: String,
    pub city: String,
    /// Topic set; filters compare against any element.
    pub topics: Vec<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Derived from `start_date` at creation; 0 when no start date.
    pub month: u32,
    pub max_attendees: i64,
    /// Mutable seat counter; only registration operations touch it.
    pub seats_available: i64,
}

impl Conference {
    /// Creates a conference with creation-time defaults applied.
    ///
    /// # Invariants
    /// - `seats_available` starts equal to `max_attendees`.
    /// - `month` is derived from `start_date`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        conference_id: ConferenceId,
        organizer_id: impl Into<UserId>,
        name: impl Into<String>,
        city: impl Into<String>,
        topics: Vec<String>,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
        max_attendees: i64,
    ) -> Self {
        let max_attendees = max_attendees.max(0);
        Self {
            conference_id,
            organizer_id: organizer_id.into(),
            name: name.into(),
            city: city.into(),
            topics,
            start_date,
            end_date,
            month: start_date.map_or(0, |date| date.month()),
            max_attendees,
            seats_available: max_attendees,
        }
    }

    /// Checks record-level invariants before persistence.
    pub fn validate(&self) -> Result<(), ConferenceValidationError> {
        if self.name.trim().is_empty() {
            return Err(ConferenceValidationError::BlankName);
        }
        if self.seats_available < 0 || self.seats_available > self.max_attendees {
            return Err(ConferenceValidationError::SeatsOutOfRange {
                seats_available: self.seats_available,
                max_attendees: self.max_attendees,
            });
        }
        Ok(())
    }

    /// Returns whether any seats remain.
    pub fn has_seats(&self) -> bool {
        self.seats_available > 0
    }
}
