//! Profile repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD APIs over the profile aggregate, including its ordered
//!   attendance and wishlist membership lists.
//! - Expose connection-level helpers for callers that compose profile
//!   mutations into a wider transaction.
//!
//! # Invariants
//! - Membership lists are returned in `position` order.
//! - List mutations keep `position` values append-only monotonic per user.

use crate::model::conference::ConferenceId;
use crate::model::profile::{Profile, ShirtSize, UserId};
use crate::model::session::SessionId;
use crate::repo::{ensure_connection_ready, RepoError, RepoResult};
use rusqlite::{params, Connection, Row};

const PROFILE_SELECT_SQL: &str = "SELECT
    user_id,
    display_name,
    main_email,
    shirt_size
FROM profiles";

const PROFILE_REQUIRED_SCHEMA: &[(&str, &[&str])] = &[
    (
        "profiles",
        &["user_id", "display_name", "main_email", "shirt_size"],
    ),
    ("attendance", &["user_id", "conference_id", "position"]),
    ("wishlist_entries", &["user_id", "session_id", "position"]),
];

/// Repository interface for profile aggregate operations.
pub trait ProfileRepository {
    /// Loads one profile with its membership lists.
    fn get_profile(&self, user_id: &str) -> RepoResult<Option<Profile>>;
    /// Loads the profile, creating it with defaults on first access.
    fn get_or_create_profile(
        &self,
        user_id: &str,
        display_name: &str,
        main_email: &str,
    ) -> RepoResult<Profile>;
    /// Inserts a new profile row (lists start empty).
    fn insert_profile(&self, profile: &Profile) -> RepoResult<()>;
    /// Updates the user-modifiable profile fields.
    fn update_profile_fields(
        &self,
        user_id: &str,
        display_name: &str,
        shirt_size: ShirtSize,
    ) -> RepoResult<()>;
    /// Loads profiles for the given ids, skipping absent ones.
    fn get_profiles(&self, user_ids: &[UserId]) -> RepoResult<Vec<Profile>>;
}

/// SQLite-backed profile repository.
pub struct SqliteProfileRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteProfileRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, PROFILE_REQUIRED_SCHEMA)?;
        Ok(Self { conn })
    }
}

impl ProfileRepository for SqliteProfileRepository<'_> {
    fn get_profile(&self, user_id: &str) -> RepoResult<Option<Profile>> {
        load_profile(self.conn, user_id)
    }

    fn get_or_create_profile(
        &self,
        user_id: &str,
        display_name: &str,
        main_email: &str,
    ) -> RepoResult<Profile> {
        load_or_create_profile(self.conn, user_id, display_name, main_email)
    }

    fn insert_profile(&self, profile: &Profile) -> RepoResult<()> {
        insert_profile_row(self.conn, profile)
    }

    fn update_profile_fields(
        &self,
        user_id: &str,
        display_name: &str,
        shirt_size: ShirtSize,
    ) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE profiles
             SET display_name = ?2,
                 shirt_size = ?3,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE user_id = ?1;",
            params![user_id, display_name, shirt_size.as_db()],
        )?;
        if changed == 0 {
            return Err(RepoError::ProfileNotFound(user_id.to_string()));
        }
        Ok(())
    }

    fn get_profiles(&self, user_ids: &[UserId]) -> RepoResult<Vec<Profile>> {
        let mut profiles = Vec::with_capacity(user_ids.len());
        for user_id in user_ids {
            if let Some(profile) = load_profile(self.conn, user_id)? {
                profiles.push(profile);
            }
        }
        Ok(profiles)
    }
}

/// Loads a profile and its membership lists from the given connection.
///
/// Exposed at connection level so transactional callers can reuse it.
pub fn load_profile(conn: &Connection, user_id: &str) -> RepoResult<Option<Profile>> {
    let mut stmt = conn.prepare(&format!("{PROFILE_SELECT_SQL} WHERE user_id = ?1;"))?;
    let mut rows = stmt.query([user_id])?;
    let Some(row) = rows.next()? else {
        return Ok(None);
    };

    let mut profile = parse_profile_row(row)?;
    profile.conferences_to_attend = attendance_conference_ids(conn, user_id)?;
    profile.sessions_to_attend = wishlist_session_ids(conn, user_id)?;
    Ok(Some(profile))
}

/// Loads the profile, creating it with the given defaults when absent.
///
/// # Contract
/// - Mirrors lazy first-access creation: the returned profile always exists
///   in storage afterwards.
pub fn load_or_create_profile(
    conn: &Connection,
    user_id: &str,
    display_name: &str,
    main_email: &str,
) -> RepoResult<Profile> {
    if let Some(profile) = load_profile(conn, user_id)? {
        return Ok(profile);
    }

    let profile = Profile::new_default(user_id, display_name, main_email);
    insert_profile_row(conn, &profile)?;
    Ok(profile)
}

fn insert_profile_row(conn: &Connection, profile: &Profile) -> RepoResult<()> {
    conn.execute(
        "INSERT INTO profiles (user_id, display_name, main_email, shirt_size)
         VALUES (?1, ?2, ?3, ?4);",
        params![
            profile.user_id,
            profile.display_name,
            profile.main_email,
            profile.shirt_size.as_db(),
        ],
    )?;
    Ok(())
}

/// Ordered conference ids from the user's attendance list.
pub fn attendance_conference_ids(
    conn: &Connection,
    user_id: &str,
) -> RepoResult<Vec<ConferenceId>> {
    let mut stmt = conn.prepare(
        "SELECT conference_id
         FROM attendance
         WHERE user_id = ?1
         ORDER BY position ASC;",
    )?;
    let mut rows = stmt.query([user_id])?;
    let mut ids = Vec::new();
    while let Some(row) = rows.next()? {
        ids.push(row.get(0)?);
    }
    Ok(ids)
}

/// Ordered session ids from the user's wishlist.
pub fn wishlist_session_ids(conn: &Connection, user_id: &str) -> RepoResult<Vec<SessionId>> {
    let mut stmt = conn.prepare(
        "SELECT session_id
         FROM wishlist_entries
         WHERE user_id = ?1
         ORDER BY position ASC;",
    )?;
    let mut rows = stmt.query([user_id])?;
    let mut ids = Vec::new();
    while let Some(row) = rows.next()? {
        ids.push(row.get(0)?);
    }
    Ok(ids)
}

/// Returns whether the attendance list contains the conference.
pub fn is_attending(
    conn: &Connection,
    user_id: &str,
    conference_id: ConferenceId,
) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM attendance
            WHERE user_id = ?1 AND conference_id = ?2
        );",
        params![user_id, conference_id],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

/// Appends a conference to the end of the user's attendance list.
pub fn append_attendance(
    conn: &Connection,
    user_id: &str,
    conference_id: ConferenceId,
) -> RepoResult<()> {
    conn.execute(
        "INSERT INTO attendance (user_id, conference_id, position)
         VALUES (
            ?1,
            ?2,
            (SELECT COALESCE(MAX(position), -1) + 1
             FROM attendance
             WHERE user_id = ?1)
         );",
        params![user_id, conference_id],
    )?;
    Ok(())
}

/// Removes a conference from the attendance list; `false` when absent.
pub fn remove_attendance(
    conn: &Connection,
    user_id: &str,
    conference_id: ConferenceId,
) -> RepoResult<bool> {
    let changed = conn.execute(
        "DELETE FROM attendance
         WHERE user_id = ?1 AND conference_id = ?2;",
        params![user_id, conference_id],
    )?;
    Ok(changed > 0)
}

/// Returns whether the wishlist contains the session.
pub fn has_wishlisted(
    conn: &Connection,
    user_id: &str,
    session_id: SessionId,
) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM wishlist_entries
            WHERE user_id = ?1 AND session_id = ?2
        );",
        params![user_id, session_id],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

/// Appends a session to the end of the user's wishlist.
pub fn append_wishlist(
    conn: &Connection,
    user_id: &str,
    session_id: SessionId,
) -> RepoResult<()> {
    conn.execute(
        "INSERT INTO wishlist_entries (user_id, session_id, position)
         VALUES (
            ?1,
            ?2,
            (SELECT COALESCE(MAX(position), -1) + 1
             FROM wishlist_entries
             WHERE user_id = ?1)
         );",
        params![user_id, session_id],
    )?;
    Ok(())
}

/// Removes a session from the wishlist; `false` when absent.
pub fn remove_wishlist(
    conn: &Connection,
    user_id: &str,
    session_id: SessionId,
) -> RepoResult<bool> {
    let changed = conn.execute(
        "DELETE FROM wishlist_entries
         WHERE user_id = ?1 AND session_id = ?2;",
        params![user_id, session_id],
    )?;
    Ok(changed > 0)
}

fn parse_profile_row(row: &Row<'_>) -> RepoResult<Profile> {
    let shirt_size_text: String = row.get("shirt_size")?;
    let shirt_size = ShirtSize::parse(&shirt_size_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid shirt size `{shirt_size_text}` in profiles.shirt_size"
        ))
    })?;

    Ok(Profile {
        user_id: row.get("user_id")?,
        display_name: row.get("display_name")?,
        main_email: row.get("main_email")?,
        shirt_size,
        conferences_to_attend: Vec::new(),
        sessions_to_attend: Vec::new(),
    })
}
