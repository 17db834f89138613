//! API request and response data models.
//!
//! API models are kept separate from the database models in [`crate::db::models`] so the
//! wire format can evolve independently of storage. Every model derives `utoipa::ToSchema`
//! for the generated OpenAPI document. Request and response bodies use camelCase keys.
//!
//! - [`users`]: User types and the authenticated caller
//! - [`jobs`]: Job listings
//! - [`reservations`]: Reservations, status checks and reservation settings
//! - [`favorites`]: Favorite jobs
//! - [`referrals`]: Referral codes and statistics
//! - [`commission`]: Admin fee settings

pub mod commission;
pub mod favorites;
pub mod jobs;
pub mod referrals;
pub mod reservations;
pub mod users;
