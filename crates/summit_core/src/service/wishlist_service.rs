//! Session wishlist use-case service.
//!
//! # Responsibility
//! - Maintain the caller's ordered session wishlist on the profile
//!   aggregate.
//!
//! # Invariants
//! - A session can appear at most once per wishlist; duplicates are a
//!   conflict, not a crash.
//! - Removing an absent entry returns `false` and performs no mutation.

use crate::auth::{require_user, CurrentUser};
use crate::model::session::{Session, SessionId};
use crate::repo::profile_repo::{
    append_wishlist, has_wishlisted, load_or_create_profile, remove_wishlist,
    SqliteProfileRepository,
};
use crate::repo::session_repo::{SessionRepository, SqliteSessionRepository};
use crate::repo::{RepoError, RepoResult};
use log::info;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for wishlist use-cases.
#[derive(Debug)]
pub enum WishlistError {
    /// No current user; authorization required.
    NotAuthenticated,
    /// Target session does not exist.
    SessionNotFound(SessionId),
    /// Session is already wishlisted (conflict).
    AlreadyWishlisted(SessionId),
    /// Repository-level failure.
    Repo(RepoError),
}

impl Display for WishlistError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotAuthenticated => write!(f, "authorization required"),
            Self::SessionNotFound(id) => write!(f, "session not found: {id}"),
            Self::AlreadyWishlisted(id) => {
                write!(f, "session already saved to wishlist: {id}")
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for WishlistError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for WishlistError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::SessionNotFound(id) => Self::SessionNotFound(id),
            other => Self::Repo(other),
        }
    }
}

/// Use-case service for the caller's session wishlist.
pub struct WishlistService<'a> {
    conn: &'a Connection,
    sessions: SqliteSessionRepository<'a>,
}

impl<'a> WishlistService<'a> {
    /// Creates the service from a migrated connection.
    pub fn try_new(conn: &'a Connection) -> RepoResult<Self> {
        // The profile guard also covers the wishlist_entries table.
        SqliteProfileRepository::try_new(conn)?;
        Ok(Self {
            conn,
            sessions: SqliteSessionRepository::try_new(conn)?,
        })
    }

    /// Adds one session to the caller's wishlist and returns it.
    pub fn add_session(
        &self,
        auth: &dyn CurrentUser,
        session_id: SessionId,
    ) -> Result<Session, WishlistError> {
        let identity = require_user(auth).map_err(|_| WishlistError::NotAuthenticated)?;
        let session = self
            .sessions
            .get_session(session_id)?
            .ok_or(WishlistError::SessionNotFound(session_id))?;

        let profile = load_or_create_profile(
            self.conn,
            &identity.user_id,
            &identity.nickname,
            &identity.email,
        )?;
        if has_wishlisted(self.conn, &profile.user_id, session_id)? {
            return Err(WishlistError::AlreadyWishlisted(session_id));
        }

        append_wishlist(self.conn, &profile.user_id, session_id)?;
        info!(
            "event=wishlist_add module=wishlist status=ok session_id={session_id}"
        );
        Ok(session)
    }

    /// Removes one session from the wishlist; `false` when not present.
    pub fn remove_session(
        &self,
        auth: &dyn CurrentUser,
        session_id: SessionId,
    ) -> Result<bool, WishlistError> {
        let identity = require_user(auth).map_err(|_| WishlistError::NotAuthenticated)?;
        self.sessions
            .get_session(session_id)?
            .ok_or(WishlistError::SessionNotFound(session_id))?;

        let profile = load_or_create_profile(
            self.conn,
            &identity.user_id,
            &identity.nickname,
            &identity.email,
        )?;
        let removed = remove_wishlist(self.conn, &profile.user_id, session_id)?;
        info!(
            "event=wishlist_remove module=wishlist status=ok session_id={session_id} \
             removed={removed}"
        );
        Ok(removed)
    }

    /// The caller's wishlisted sessions, in insertion order.
    pub fn sessions(&self, auth: &dyn CurrentUser) -> Result<Vec<Session>, WishlistError> {
        let identity = require_user(auth).map_err(|_| WishlistError::NotAuthenticated)?;
        let profile = load_or_create_profile(
            self.conn,
            &identity.user_id,
            &identity.nickname,
            &identity.email,
        )?;
        self.sessions
            .get_sessions(&profile.sessions_to_attend)
            .map_err(Into::into)
    }
}
