//! Asynchronous cache-maintenance jobs.
//!
//! # Responsibility
//! - Define the job vocabulary and the at-least-once enqueue boundary.
//! - Provide the idempotent handler that dispatchers run per job.
//!
//! # Invariants
//! - Enqueue is fire-and-forget: failures are logged, never returned to
//!   the caller, and never roll back the triggering write.
//! - Handlers tolerate duplicate and reordered delivery; they read current
//!   state and overwrite.

use crate::cache::maintainer::CacheMaintainer;
use crate::cache::CacheResult;
use crate::model::conference::ConferenceId;
use log::debug;
use rusqlite::Connection;
use uuid::Uuid;

pub mod worker;

pub use worker::WorkerJobQueue;

/// Cache-maintenance job vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Job {
    /// Refresh the global near-sold-out announcement slot.
    RecomputeAnnouncement,
    /// Refresh the featured-speaker entry for one (speaker, conference).
    RecomputeFeaturedSpeaker {
        speaker: String,
        conference_id: ConferenceId,
    },
}

impl Job {
    /// Stable job-type label for logging.
    pub fn job_type(&self) -> &'static str {
        match self {
            Self::RecomputeAnnouncement => "recompute_announcement",
            Self::RecomputeFeaturedSpeaker { .. } => "recompute_featured_speaker",
        }
    }
}

/// One enqueued job with its correlation id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedJob {
    /// Correlation id carried through dispatch logging.
    pub job_id: Uuid,
    pub job: Job,
}

impl QueuedJob {
    pub fn new(job: Job) -> Self {
        Self {
            job_id: Uuid::new_v4(),
            job,
        }
    }
}

/// At-least-once asynchronous enqueue boundary.
///
/// Delivery order is unspecified and duplicates are possible; handlers
/// must stay idempotent. No result flows back to the enqueuer.
pub trait JobQueue {
    fn enqueue(&self, job: Job);
}

/// Queue that drops every job.
///
/// For callers that recompute caches explicitly (tests, cron-style
/// refresh loops).
pub struct NullJobQueue;

impl JobQueue for NullJobQueue {
    fn enqueue(&self, job: Job) {
        debug!(
            "event=job_enqueue module=jobs status=dropped job_type={}",
            job.job_type()
        );
    }
}

/// Runs one job against the given connection.
///
/// Safe to run concurrently with itself for the same key: every branch
/// reads current state and overwrites.
pub fn execute_job(conn: &Connection, job: &Job) -> CacheResult<()> {
    let maintainer = CacheMaintainer::new(conn);
    match job {
        Job::RecomputeAnnouncement => {
            maintainer.recompute_announcement()?;
        }
        Job::RecomputeFeaturedSpeaker {
            speaker,
            conference_id,
        } => {
            maintainer.recompute_featured_speaker(speaker, *conference_id)?;
        }
    }
    Ok(())
}
