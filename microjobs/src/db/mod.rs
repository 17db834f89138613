//! Database layer for data persistence and access.
//!
//! This module implements the data access layer using SQLx with PostgreSQL.
//! It follows the Repository pattern to provide clean abstractions over database operations.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  (API request handlers)
//! └──────┬──────┘
//!        │
//!        ↓
//! ┌─────────────┐
//! │ Repositories│  (db::handlers - queries)
//! └──────┬──────┘
//!        │
//!        ↓
//! ┌─────────────┐
//! │   Models    │  (db::models - database records)
//! └──────┬──────┘
//!        │
//!        ↓
//! ┌─────────────┐
//! │  PostgreSQL │
//! └─────────────┘
//! ```
//!
//! # Transactions
//!
//! Repositories borrow a `&mut PgConnection`, so the caller decides the scope: a pooled
//! connection for single statements, or a transaction when several writes must land
//! together (for example releasing a job and expiring its reservation):
//!
//! ```ignore
//! let mut tx = pool.begin().await?;
//! let outcome = Reservations::new(&mut tx).expire_for_job(job_id, None).await?;
//! tx.commit().await?;
//! ```
//!
//! # Migrations
//!
//! Database migrations are managed by SQLx and located in the `migrations/` directory.
//! The [`crate::migrator`] function provides access to the migrator:
//!
//! ```ignore
//! microjobs::migrator().run(&pool).await?;
//! ```

pub mod errors;
pub mod handlers;
pub mod models;
