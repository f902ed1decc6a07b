//! Dynamic conference-query filtering.
//!
//! # Responsibility
//! - Validate user-supplied field/operator/value filter triples.
//! - Compose an executable query plan under the single-inequality-field
//!   restriction.
//!
//! # Invariants
//! - Unknown field or operator tokens are rejected at parse time.
//! - At most one field may carry a non-equality operator per query.
//! - The plan's primary sort key is the inequality field when one exists.

pub mod filter;
pub mod plan;
