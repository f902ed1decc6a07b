//! Keyed cache-slot storage.
//!
//! # Responsibility
//! - Provide get/set/delete over named cache slots.
//! - Keep payload semantics out of the store; values are opaque text.
//!
//! # Invariants
//! - A deleted or never-written slot reads as `None`, never as `""`.
//! - `set` overwrites unconditionally (last writer wins).

use crate::cache::CacheResult;
use crate::model::conference::ConferenceId;
use rusqlite::{params, Connection, OptionalExtension};

/// Global slot for the near-sold-out announcement text.
pub const ANNOUNCEMENT_KEY: &str = "announcement:recent";

/// Per-conference slot for the featured-speaker entry.
pub fn featured_speaker_key(conference_id: ConferenceId) -> String {
    format!("featured_speaker:{conference_id}")
}

/// SQLite-backed cache-slot store.
pub struct CacheStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> CacheStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Reads one slot; `None` when the slot is absent.
    pub fn get(&self, cache_key: &str) -> CacheResult<Option<String>> {
        let payload: Option<String> = self
            .conn
            .query_row(
                "SELECT payload FROM cache_entries WHERE cache_key = ?1;",
                [cache_key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(payload)
    }

    /// Writes one slot, replacing any previous payload.
    pub fn set(&self, cache_key: &str, payload: &str) -> CacheResult<()> {
        self.conn.execute(
            "INSERT INTO cache_entries (cache_key, payload, updated_at)
             VALUES (?1, ?2, (strftime('%s', 'now') * 1000))
             ON CONFLICT (cache_key) DO UPDATE SET
                payload = excluded.payload,
                updated_at = excluded.updated_at;",
            params![cache_key, payload],
        )?;
        Ok(())
    }

    /// Deletes one slot; `false` when it was already absent.
    pub fn delete(&self, cache_key: &str) -> CacheResult<bool> {
        let changed = self.conn.execute(
            "DELETE FROM cache_entries WHERE cache_key = ?1;",
            [cache_key],
        )?;
        Ok(changed > 0)
    }
}
