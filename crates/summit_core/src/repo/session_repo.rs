//! Session repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide create and scoped-scan APIs over the session aggregate.
//! - Keep conference-scoped ("ancestor") scans and speaker scans inside
//!   the persistence boundary.
//!
//! # Invariants
//! - Session ids are allocated from the shared sequence before insert.
//! - Scan ordering is deterministic: name then id for scoped scans, date
//!   then start time for chronological scans.

use crate::model::conference::ConferenceId;
use crate::model::session::{Session, SessionId};
use crate::repo::{
    allocate_id, date_to_db, ensure_connection_ready, parse_db_date, parse_db_time, time_to_db,
    RepoResult,
};
use chrono::{NaiveDate, NaiveTime};
use rusqlite::{params, Connection, Row};

const SESSION_SELECT_SQL: &str = "SELECT
    session_id,
    conference_id,
    name,
    speaker,
    duration_minutes,
    type_of_session,
    session_date,
    start_time
FROM sessions";

const SESSION_REQUIRED_SCHEMA: &[(&str, &[&str])] = &[
    (
        "sessions",
        &[
            "session_id",
            "conference_id",
            "name",
            "speaker",
            "duration_minutes",
            "type_of_session",
            "session_date",
            "start_time",
        ],
    ),
    ("id_allocations", &["kind", "next_id"]),
];

/// Repository interface for session aggregate operations.
pub trait SessionRepository {
    /// Allocates the next session id before first write.
    fn allocate_session_id(&self) -> RepoResult<SessionId>;
    /// Persists a new session.
    fn create_session(&self, session: &Session) -> RepoResult<()>;
    /// Loads one session, `None` when absent.
    fn get_session(&self, session_id: SessionId) -> RepoResult<Option<Session>>;
    /// Multi-get preserving input order; absent ids are skipped.
    fn get_sessions(&self, session_ids: &[SessionId]) -> RepoResult<Vec<Session>>;
    /// Conference-scoped scan, ordered by name.
    fn sessions_by_conference(&self, conference_id: ConferenceId) -> RepoResult<Vec<Session>>;
    /// Conference-scoped scan with a session-type equality predicate.
    fn sessions_by_conference_and_type(
        &self,
        conference_id: ConferenceId,
        type_of_session: &str,
    ) -> RepoResult<Vec<Session>>;
    /// Cross-conference scan by speaker, ordered by name.
    fn sessions_by_speaker(&self, speaker: &str) -> RepoResult<Vec<Session>>;
    /// Speaker scan inside one conference, ordered by name.
    fn sessions_by_speaker_in_conference(
        &self,
        speaker: &str,
        conference_id: ConferenceId,
    ) -> RepoResult<Vec<Session>>;
    /// Next dated session at or after `on_or_after`, system-wide.
    fn next_upcoming_session(&self, on_or_after: NaiveDate) -> RepoResult<Option<Session>>;
    /// Sessions dated exactly `date` within the given conferences.
    fn sessions_on_date(
        &self,
        date: NaiveDate,
        conference_ids: &[ConferenceId],
    ) -> RepoResult<Vec<Session>>;
    /// Timed sessions starting at or before `cutoff`, system-wide.
    fn sessions_starting_by(&self, cutoff: NaiveTime) -> RepoResult<Vec<Session>>;
}

/// SQLite-backed session repository.
pub struct SqliteSessionRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSessionRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, SESSION_REQUIRED_SCHEMA)?;
        Ok(Self { conn })
    }

    fn collect(&self, sql: &str, bind: impl rusqlite::Params) -> RepoResult<Vec<Session>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(bind)?;
        let mut sessions = Vec::new();
        while let Some(row) = rows.next()? {
            sessions.push(parse_session_row(row)?);
        }
        Ok(sessions)
    }
}

impl SessionRepository for SqliteSessionRepository<'_> {
    fn allocate_session_id(&self) -> RepoResult<SessionId> {
        allocate_id(self.conn, "session")
    }

    fn create_session(&self, session: &Session) -> RepoResult<()> {
        session.validate()?;

        self.conn.execute(
            "INSERT INTO sessions (
                session_id,
                conference_id,
                name,
                speaker,
                duration_minutes,
                type_of_session,
                session_date,
                start_time
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                session.session_id,
                session.conference_id,
                session.name,
                session.speaker,
                session.duration_minutes,
                session.type_of_session,
                date_to_db(session.session_date),
                time_to_db(session.start_time),
            ],
        )?;
        Ok(())
    }

    fn get_session(&self, session_id: SessionId) -> RepoResult<Option<Session>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{SESSION_SELECT_SQL} WHERE session_id = ?1;"))?;
        let mut rows = stmt.query([session_id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_session_row(row)?));
        }
        Ok(None)
    }

    fn get_sessions(&self, session_ids: &[SessionId]) -> RepoResult<Vec<Session>> {
        let mut sessions = Vec::with_capacity(session_ids.len());
        for session_id in session_ids {
            if let Some(session) = self.get_session(*session_id)? {
                sessions.push(session);
            }
        }
        Ok(sessions)
    }

    fn sessions_by_conference(&self, conference_id: ConferenceId) -> RepoResult<Vec<Session>> {
        self.collect(
            &format!(
                "{SESSION_SELECT_SQL}
                 WHERE conference_id = ?1
                 ORDER BY name ASC, session_id ASC;"
            ),
            [conference_id],
        )
    }

    fn sessions_by_conference_and_type(
        &self,
        conference_id: ConferenceId,
        type_of_session: &str,
    ) -> RepoResult<Vec<Session>> {
        self.collect(
            &format!(
                "{SESSION_SELECT_SQL}
                 WHERE conference_id = ?1
                   AND type_of_session = ?2
                 ORDER BY name ASC, session_id ASC;"
            ),
            params![conference_id, type_of_session],
        )
    }

    fn sessions_by_speaker(&self, speaker: &str) -> RepoResult<Vec<Session>> {
        self.collect(
            &format!(
                "{SESSION_SELECT_SQL}
                 WHERE speaker = ?1
                 ORDER BY name ASC, session_id ASC;"
            ),
            [speaker],
        )
    }

    fn sessions_by_speaker_in_conference(
        &self,
        speaker: &str,
        conference_id: ConferenceId,
    ) -> RepoResult<Vec<Session>> {
        self.collect(
            &format!(
                "{SESSION_SELECT_SQL}
                 WHERE speaker = ?1
                   AND conference_id = ?2
                 ORDER BY name ASC, session_id ASC;"
            ),
            params![speaker, conference_id],
        )
    }

    fn next_upcoming_session(&self, on_or_after: NaiveDate) -> RepoResult<Option<Session>> {
        let sessions = self.collect(
            &format!(
                "{SESSION_SELECT_SQL}
                 WHERE session_date >= ?1
                 ORDER BY session_date ASC, start_time ASC, session_id ASC
                 LIMIT 1;"
            ),
            [date_to_db(Some(on_or_after))],
        )?;
        Ok(sessions.into_iter().next())
    }

    fn sessions_on_date(
        &self,
        date: NaiveDate,
        conference_ids: &[ConferenceId],
    ) -> RepoResult<Vec<Session>> {
        let mut sessions = Vec::new();
        for conference_id in conference_ids {
            let mut scoped = self.collect(
                &format!(
                    "{SESSION_SELECT_SQL}
                     WHERE conference_id = ?1
                       AND session_date = ?2
                     ORDER BY start_time ASC, session_id ASC;"
                ),
                params![conference_id, date_to_db(Some(date))],
            )?;
            sessions.append(&mut scoped);
        }
        Ok(sessions)
    }

    fn sessions_starting_by(&self, cutoff: NaiveTime) -> RepoResult<Vec<Session>> {
        self.collect(
            &format!(
                "{SESSION_SELECT_SQL}
                 WHERE start_time IS NOT NULL
                   AND start_time <= ?1
                 ORDER BY start_time ASC, session_id ASC;"
            ),
            [time_to_db(Some(cutoff))],
        )
    }
}

fn parse_session_row(row: &Row<'_>) -> RepoResult<Session> {
    let session_date = row
        .get::<_, Option<String>>("session_date")?
        .map(|value| parse_db_date(&value, "sessions.session_date"))
        .transpose()?;
    let start_time = row
        .get::<_, Option<String>>("start_time")?
        .map(|value| parse_db_time(&value, "sessions.start_time"))
        .transpose()?;

    Ok(Session {
        session_id: row.get("session_id")?,
        conference_id: row.get("conference_id")?,
        name: row.get("name")?,
        speaker: row.get("speaker")?,
        duration_minutes: row.get("duration_minutes")?,
        type_of_session: row.get("type_of_session")?,
        session_date,
        start_time,
    })
}
