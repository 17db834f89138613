//! Authentication and authorization.
//!
//! Users authenticate with a JWT session token in `Authorization: Bearer <token>`.
//! Tokens carry the user id, email and user type, are signed with `secret_key`, and
//! expire after `jwt_expiry`. The cron endpoint instead takes the shared `cron_secret`
//! as its bearer token.
//!
//! # Modules
//!
//! - [`current_user`]: Extractors for the authenticated user and the cron caller
//! - [`permissions`]: Admin checks
//! - [`session`]: Session token creation and verification
//!
//! # Usage in Handlers
//!
//! ```ignore
//! use microjobs::api::models::users::CurrentUser;
//!
//! async fn protected_handler(user: CurrentUser) -> String {
//!     format!("Hello, {}!", user.email)
//! }
//! ```

pub mod current_user;
pub mod permissions;
pub mod session;
