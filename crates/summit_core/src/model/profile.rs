//! Profile aggregate model.
//!
//! # Responsibility
//! - Define the profile record and its shirt-size preference enum.
//! - Own the ordered attendance and wishlist membership lists.
//!
//! # Invariants
//! - `user_id` is an opaque identity issued by the external auth layer.
//! - Profiles are created lazily with defaults and never deleted.

use crate::model::conference::ConferenceId;
use crate::model::session::SessionId;
use serde::{Deserialize, Serialize};

/// Opaque user identity issued by the external auth layer.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type UserId = String;

/// Tee-shirt size preference.
///
/// Sizes are suffixed by cut (`M` men's, `W` women's) to match the
/// registration form the values came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShirtSize {
    NotSpecified,
    XsM,
    XsW,
    SM,
    SW,
    MM,
    MW,
    LM,
    LW,
    XlM,
    XlW,
    XxlM,
    XxlW,
    XxxlM,
    XxxlW,
}

impl ShirtSize {
    /// Stable storage token for this size.
    pub fn as_db(self) -> &'static str {
        match self {
            Self::NotSpecified => "NOT_SPECIFIED",
            Self::XsM => "XS_M",
            Self::XsW => "XS_W",
            Self::SM => "S_M",
            Self::SW => "S_W",
            Self::MM => "M_M",
            Self::MW => "M_W",
            Self::LM => "L_M",
            Self::LW => "L_W",
            Self::XlM => "XL_M",
            Self::XlW => "XL_W",
            Self::XxlM => "XXL_M",
            Self::XxlW => "XXL_W",
            Self::XxxlM => "XXXL_M",
            Self::XxxlW => "XXXL_W",
        }
    }

    /// Parses a storage/user token into a size, `None` for unknown tokens.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "NOT_SPECIFIED" => Some(Self::NotSpecified),
            "XS_M" => Some(Self::XsM),
            "XS_W" => Some(Self::XsW),
            "S_M" => Some(Self::SM),
            "S_W" => Some(Self::SW),
            "M_M" => Some(Self::MM),
            "M_W" => Some(Self::MW),
            "L_M" => Some(Self::LM),
            "L_W" => Some(Self::LW),
            "XL_M" => Some(Self::XlM),
            "XL_W" => Some(Self::XlW),
            "XXL_M" => Some(Self::XxlM),
            "XXL_W" => Some(Self::XxlW),
            "XXXL_M" => Some(Self::XxxlM),
            "XXXL_W" => Some(Self::XxxlW),
            _ => None,
        }
    }
}

/// Profile aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Opaque identity key; also the parent key for organized conferences.
    pub user_id: UserId,
    pub display_name: String,
    pub main_email: String,
    pub shirt_size: ShirtSize,
    /// Conference ids the user attends, in registration order.
    pub conferences_to_attend: Vec<ConferenceId>,
    /// Wishlisted session ids, in insertion order.
    pub sessions_to_attend: Vec<SessionId>,
}

impl Profile {
    /// Creates a default profile for first access.
    ///
    /// # Invariants
    /// - Shirt size starts as `NotSpecified`.
    /// - Both membership lists start empty.
    pub fn new_default(
        user_id: impl Into<UserId>,
        display_name: impl Into<String>,
        main_email: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            display_name: display_name.into(),
            main_email: main_email.into(),
            shirt_size: ShirtSize::NotSpecified,
            conferences_to_attend: Vec::new(),
            sessions_to_attend: Vec::new(),
        }
    }

    /// Returns whether the user is registered for the given conference.
    pub fn attends(&self, conference_id: ConferenceId) -> bool {
        self.conferences_to_attend.contains(&conference_id)
    }
}
