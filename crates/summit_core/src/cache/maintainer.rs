//! Derived-cache recomputation and read paths.
//!
//! # Responsibility
//! - Recompute the near-sold-out announcement slot from conference state.
//! - Recompute per-conference featured-speaker entries from session state.
//! - Serve cache reads, including the global upcoming-session fallback.
//!
//! # Invariants
//! - Recomputation always reads current aggregate state and overwrites;
//!   duplicate or reordered triggers cause staleness at worst.
//! - Clearing the announcement slot is meaningful: "no announcement" is
//!   distinct from a stale announcement.
//! - A featured-speaker entry for another speaker is never reconciled;
//!   the last writer for a conference key wins.

use crate::cache::store::{featured_speaker_key, CacheStore, ANNOUNCEMENT_KEY};
use crate::cache::CacheResult;
use crate::model::conference::ConferenceId;
use crate::repo::conference_repo::{ConferenceRepository, SqliteConferenceRepository};
use crate::repo::session_repo::{SessionRepository, SqliteSessionRepository};
use chrono::NaiveDate;
use log::info;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

/// Seat threshold at or below which a conference counts as nearly sold out.
const NEARLY_SOLD_OUT_SEATS: i64 = 5;

const ANNOUNCEMENT_TEMPLATE: &str =
    "Last chance to attend! The following conferences are nearly sold out: ";

/// Featured-speaker cache entry for one conference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeaturedSpeakerEntry {
    pub speaker: String,
    /// Comma-joined names of the speaker's sessions.
    pub session_names: String,
}

/// Recomputes and serves the two derived caches.
pub struct CacheMaintainer<'conn> {
    conn: &'conn Connection,
    store: CacheStore<'conn>,
}

impl<'conn> CacheMaintainer<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self {
            conn,
            store: CacheStore::new(conn),
        }
    }

    /// Recomputes the announcement slot from current seat availability.
    ///
    /// # Contract
    /// - Conferences with `0 < seats_available <= 5` are named in the
    ///   published text.
    /// - With no such conference the slot is deleted, not blanked.
    ///
    /// Returns the published text, `None` when the slot was cleared.
    pub fn recompute_announcement(&self) -> CacheResult<Option<String>> {
        let repo = SqliteConferenceRepository::try_new(self.conn)?;
        let nearly_sold_out = repo.nearly_sold_out(NEARLY_SOLD_OUT_SEATS)?;

        if nearly_sold_out.is_empty() {
            self.store.delete(ANNOUNCEMENT_KEY)?;
            info!("event=cache_announcement module=cache status=ok action=cleared");
            return Ok(None);
        }

        let names = nearly_sold_out
            .iter()
            .map(|conference| conference.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let announcement = format!("{ANNOUNCEMENT_TEMPLATE}{names}");
        self.store.set(ANNOUNCEMENT_KEY, &announcement)?;
        info!(
            "event=cache_announcement module=cache status=ok action=published count={}",
            nearly_sold_out.len()
        );
        Ok(Some(announcement))
    }

    /// Recomputes the featured-speaker entry for one (speaker, conference).
    ///
    /// # Contract
    /// - Publishes only when the speaker has more than one session in the
    ///   conference; otherwise the slot is left untouched, including any
    ///   entry for a different speaker.
    pub fn recompute_featured_speaker(
        &self,
        speaker: &str,
        conference_id: ConferenceId,
    ) -> CacheResult<()> {
        let repo = SqliteSessionRepository::try_new(self.conn)?;
        let sessions = repo.sessions_by_speaker_in_conference(speaker, conference_id)?;
        if sessions.len() <= 1 {
            info!(
                "event=cache_featured_speaker module=cache status=ok action=skipped \
                 conference_id={conference_id} sessions={}",
                sessions.len()
            );
            return Ok(());
        }

        let entry = FeaturedSpeakerEntry {
            speaker: speaker.to_string(),
            session_names: joined_session_names(&sessions),
        };
        let payload = serde_json::to_string(&entry)?;
        self.store
            .set(&featured_speaker_key(conference_id), &payload)?;
        info!(
            "event=cache_featured_speaker module=cache status=ok action=published \
             conference_id={conference_id} sessions={}",
            sessions.len()
        );
        Ok(())
    }

    /// Reads the announcement slot; `None` when absent.
    pub fn announcement(&self) -> CacheResult<Option<String>> {
        self.store.get(ANNOUNCEMENT_KEY)
    }

    /// Reads the featured-speaker entry for one conference.
    ///
    /// When the slot is absent, falls back to the next chronologically
    /// upcoming session system-wide and that speaker's full
    /// cross-conference session list. The fallback deliberately ignores
    /// `conference_id`; this mirrors the long-standing behavior callers
    /// depend on and is flagged for product clarification, not fixed here.
    pub fn featured_speaker(
        &self,
        conference_id: ConferenceId,
        today: NaiveDate,
    ) -> CacheResult<Option<FeaturedSpeakerEntry>> {
        if let Some(payload) = self.store.get(&featured_speaker_key(conference_id))? {
            let entry: FeaturedSpeakerEntry = serde_json::from_str(&payload)?;
            return Ok(Some(entry));
        }

        let repo = SqliteSessionRepository::try_new(self.conn)?;
        let Some(upcoming) = repo.next_upcoming_session(today)? else {
            return Ok(None);
        };
        let Some(speaker) = upcoming.speaker else {
            return Ok(None);
        };

        let sessions = repo.sessions_by_speaker(&speaker)?;
        Ok(Some(FeaturedSpeakerEntry {
            session_names: joined_session_names(&sessions),
            speaker,
        }))
    }
}

fn joined_session_names(sessions: &[crate::model::session::Session]) -> String {
    sessions
        .iter()
        .map(|session| session.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
