//! Common type definitions shared across the crate.
//!
//! # ID Types
//!
//! All entity IDs are UUIDs wrapped in type aliases for readability:
//!
//! - [`UserId`]: User account identifier
//! - [`JobId`]: Microjob identifier
//! - [`CategoryId`]: Job category identifier
//! - [`ReservationId`]: Job reservation identifier
//! - [`FavoriteId`]: Favorite row identifier
//! - [`ReferralId`]: Referral row identifier
//!
//! # Utility Functions
//!
//! - [`abbrev_uuid`]: Abbreviate UUIDs to first 8 chars for logging

use std::fmt;
use uuid::Uuid;

// Type aliases for IDs
pub type UserId = Uuid;
pub type JobId = Uuid;
pub type CategoryId = Uuid;
pub type ReservationId = Uuid;
pub type FavoriteId = Uuid;
pub type ReferralId = Uuid;

/// Abbreviate a UUID to its first 8 characters for more readable logs and traces
/// Example: "550e8400-e29b-41d4-a716-446655440000" -> "550e8400"
pub fn abbrev_uuid(uuid: &Uuid) -> String {
    uuid.to_string().chars().take(8).collect()
}

// Operations that can be performed on resources
// *-All means unrestricted access, *-Own means restricted to own resources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ReadAll,
    UpdateAll,
    UpdateOwn,
    DeleteOwn,
}

// Resources that can be operated on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Jobs,
    CommissionSettings,
    ReservationSettings,
    Reservations,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::ReadAll => write!(f, "Read"),
            Operation::UpdateAll | Operation::UpdateOwn => write!(f, "Update"),
            Operation::DeleteOwn => write!(f, "Delete"),
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Jobs => write!(f, "jobs"),
            Resource::CommissionSettings => write!(f, "commission settings"),
            Resource::ReservationSettings => write!(f, "reservation settings"),
            Resource::Reservations => write!(f, "reservations"),
        }
    }
}
