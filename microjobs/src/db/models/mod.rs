//! Database record models matching table schemas.
//!
//! This module contains struct definitions that directly correspond to database
//! table rows (or joins of them). These models are used by repositories to return
//! query results and accept insertion/update data.
//!
//! # Design Principles
//!
//! - **Schema Mapping**: Each model struct matches a database table schema
//! - **SQLx Integration**: Models derive `sqlx::FromRow` for query results
//! - **Separation**: Database models are distinct from API models to allow
//!   independent evolution of storage and API representations
//!
//! # Model Categories
//!
//! - [`users`]: User accounts and profile fields used by referrals
//! - [`jobs`]: Microjobs, their reservation columns, and categories
//! - [`reservations`]: Job reservations and the reservation settings singleton
//! - [`favorites`]: Jobs a user has favorited
//! - [`referrals`]: Referral codes and referred users
//! - [`fee_settings`]: Admin commission/fee settings

pub mod favorites;
pub mod fee_settings;
pub mod jobs;
pub mod referrals;
pub mod reservations;
pub mod users;
