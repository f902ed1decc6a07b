//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Enforce business rules (capacity, idempotency, organizer checks)
//!   above the persistence boundary.
//! - Keep the transport layer decoupled from storage details.

pub mod conference_service;
pub mod profile_service;
pub mod registration_service;
pub mod session_service;
pub mod wishlist_service;
