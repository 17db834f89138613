//! HTTP request handlers for all API endpoints.
//!
//! Handlers validate the request body, check the caller through the
//! [`crate::auth`] extractors and delegate to the repositories in [`crate::db`] or to the
//! reservation service in [`crate::reservations`].
//!
//! # Handler Modules
//!
//! - [`commission`]: Admin view and update of marketplace fee settings
//! - [`cron`]: Scheduler entry point guarded by the cron secret
//! - [`favorites`]: The caller's favorite jobs
//! - [`health`]: Liveness endpoint
//! - [`jobs`]: Job listing and reservation status
//! - [`referrals`]: Referral codes and referral statistics
//! - [`reservation_settings`]: Admin view and update of the reservation settings
//! - [`reservations`]: Reserve, cancel, expiry check, listing and cleanup
//!
//! # Authentication
//!
//! Every handler except [`health`] and [`cron`] takes a
//! [`CurrentUser`](crate::api::models::users::CurrentUser), which rejects requests
//! without a valid bearer session token.

pub mod commission;
pub mod cron;
pub mod favorites;
pub mod health;
pub mod jobs;
pub mod referrals;
pub mod reservation_settings;
pub mod reservations;
