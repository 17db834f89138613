//! Repository implementations for database access.
//!
//! Each repository wraps a `&mut PgConnection`, which may be a pooled connection or an open
//! transaction, and returns models from [`crate::db::models`]. Callers that need several
//! statements to commit together begin a transaction and build repositories from it.
//!
//! # Available Repositories
//!
//! - [`Users`]: User accounts
//! - [`Jobs`]: Microjobs, their reservation columns and categories
//! - [`Reservations`]: Job reservations and the reservation settings row
//! - [`Favorites`]: Per-user favorite jobs
//! - [`Referrals`]: Referral codes and referral relationships
//! - [`FeeSettings`]: Admin commission settings
//!
//! # Common Pattern
//!
//! ```ignore
//! use microjobs::db::handlers::{Jobs, Repository};
//!
//! async fn example(pool: &sqlx::PgPool) -> Result<(), Box<dyn std::error::Error>> {
//!     let mut tx = pool.begin().await?;
//!     let mut repo = Jobs::new(&mut tx);
//!     let jobs = repo.list(&JobFilter::new(0, 20)).await?;
//!     tx.commit().await?;
//!     Ok(())
//! }
//! ```

pub mod favorites;
pub mod fee_settings;
pub mod jobs;
pub mod referrals;
pub mod repository;
pub mod reservations;
pub mod users;

pub use favorites::Favorites;
pub use fee_settings::FeeSettings;
pub use jobs::Jobs;
pub use referrals::Referrals;
pub use repository::Repository;
pub use reservations::Reservations;
pub use users::Users;
