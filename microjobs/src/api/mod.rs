//! API layer for HTTP request handling and data models.
//!
//! - **[`handlers`]**: Axum route handlers for all API endpoints
//! - **[`models`]**: Request/response data structures for API communication
//!
//! # API Structure
//!
//! Everything except `/health` and `/docs` is served under `/api`:
//!
//! - **Jobs** (`/api/jobs/*`): Listing, reservation status and reserving
//! - **Reservations** (`/api/reservations/*`): Cancel, expiry check, the caller's reservations, cleanup
//! - **Favorites** (`/api/favorites`)
//! - **Referrals** (`/api/referrals/*`)
//! - **Admin** (`/api/admin/*`): Commission and reservation settings
//! - **Cron** (`/api/cron/*`): Scheduler hooks
//!
//! All endpoints are documented with `utoipa` annotations; the rendered
//! documentation is served at `/docs`.

pub mod handlers;
pub mod models;
