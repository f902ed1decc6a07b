//! Conference query plan composition.
//!
//! # Responsibility
//! - Turn validated filters into an abstract ordering + predicate plan.
//! - Encode the store requirement that the first sort key matches the
//!   field under range comparison.
//!
//! # Invariants
//! - Plan building performs no I/O; execution belongs to the repository.
//! - Conference name is always present as a sort key (primary when no
//!   inequality field exists, secondary otherwise).

use crate::query::filter::{ConferenceFilter, FilterField, ValidatedFilters};

/// One sort key in plan order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    /// Sort by a filterable field (the inequality field).
    Field(FilterField),
    /// Sort by conference name.
    Name,
}

/// Executable query plan: ordering list plus predicate list.
///
/// Equality predicates are unordered with respect to each other; the
/// repository applies them conjunctively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConferenceQueryPlan {
    pub ordering: Vec<SortKey>,
    pub predicates: Vec<ConferenceFilter>,
}

impl ConferenceQueryPlan {
    /// Primary sort key of this plan.
    pub fn primary_sort_key(&self) -> SortKey {
        // ordering is never empty: build_conference_query always pushes Name.
        self.ordering.first().copied().unwrap_or(SortKey::Name)
    }
}

/// Builds the query plan for a validated filter set.
///
/// # Contract
/// - With an inequality field, that field is the primary sort key and the
///   conference name the secondary.
/// - Without one, the plan sorts solely by conference name.
pub fn build_conference_query(validated: ValidatedFilters) -> ConferenceQueryPlan {
    let mut ordering = Vec::with_capacity(2);
    if let Some(field) = validated.inequality_field {
        ordering.push(SortKey::Field(field));
    }
    ordering.push(SortKey::Name);

    ConferenceQueryPlan {
        ordering,
        predicates: validated.filters,
    }
}
