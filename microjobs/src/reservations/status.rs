//! Reservation status checks and time-left formatting.
//!
//! The decision itself is [`ReservationFields::evaluate`], a pure function of the job's
//! reservation columns and the current instant. [`check_reservation_status`] wraps it with
//! the database read and the expiry side effect.

use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use tracing::instrument;

use crate::db::handlers::Jobs;
use crate::db::models::jobs::JobReservationFields;
use crate::errors::Error;
use crate::types::{JobId, UserId, abbrev_uuid};

use super::{ExpiryOutcome, expire_reservation};

/// Alias for the reservation columns of a job as read for a status check
pub type ReservationFields = JobReservationFields;

/// What [`ReservationFields::evaluate`] decided, before any side effect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Evaluation {
    NotReserved,
    /// The deadline has passed; the reservation must be expired
    Overdue { reserved_until: DateTime<Utc> },
    Reserved {
        remaining: Duration,
        reserved_by: Option<UserId>,
    },
}

/// Result of a reservation status check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReservationCheck {
    NotReserved,
    /// The reservation had lapsed and has just been expired
    Expired,
    Reserved {
        remaining: Duration,
        reserved_by: Option<UserId>,
    },
    /// The backend failed; the status is unknown
    Unavailable { reason: String },
}

impl ReservationCheck {
    pub fn is_reserved(&self) -> bool {
        matches!(self, ReservationCheck::Reserved { .. })
    }
}

impl JobReservationFields {
    pub fn evaluate(&self, now: DateTime<Utc>) -> Evaluation {
        let reserved_until = match (self.is_reserved, self.reserved_until) {
            (true, Some(until)) => until,
            _ => return Evaluation::NotReserved,
        };

        let remaining = reserved_until - now;
        if remaining <= Duration::zero() {
            Evaluation::Overdue { reserved_until }
        } else {
            Evaluation::Reserved {
                remaining,
                reserved_by: self.reserved_by,
            }
        }
    }
}

/// Check whether a job is currently reserved, expiring it when its deadline has passed.
///
/// A missing job reads as not reserved. Database failures are reported as
/// [`ReservationCheck::Unavailable`] rather than as "not reserved".
#[instrument(skip(pool), fields(job_id = %abbrev_uuid(&job_id)))]
pub async fn check_reservation_status(pool: &PgPool, job_id: JobId, now: DateTime<Utc>) -> ReservationCheck {
    match try_check_reservation_status(pool, job_id, now).await {
        Ok(check) => check,
        Err(e) => {
            tracing::error!(error = %e, "Failed to check reservation status");
            ReservationCheck::Unavailable { reason: e.to_string() }
        }
    }
}

async fn read_fields(pool: &PgPool, job_id: JobId) -> Result<Option<ReservationFields>, Error> {
    let mut conn = pool.acquire().await.map_err(crate::db::errors::DbError::from)?;
    Ok(Jobs::new(&mut conn).get_reservation_fields(job_id).await?)
}

/// Status after an expiry that changed nothing: another caller released or renewed the
/// reservation between our read and our write, so report what the row says now.
fn after_lost_race(current: Option<&ReservationFields>, now: DateTime<Utc>) -> ReservationCheck {
    match current.map(|fields| fields.evaluate(now)) {
        Some(Evaluation::Reserved { remaining, reserved_by }) => ReservationCheck::Reserved { remaining, reserved_by },
        Some(Evaluation::Overdue { .. }) => ReservationCheck::Expired,
        Some(Evaluation::NotReserved) | None => ReservationCheck::NotReserved,
    }
}

async fn try_check_reservation_status(pool: &PgPool, job_id: JobId, now: DateTime<Utc>) -> Result<ReservationCheck, Error> {
    let Some(fields) = read_fields(pool, job_id).await? else {
        return Ok(ReservationCheck::NotReserved);
    };

    match fields.evaluate(now) {
        Evaluation::NotReserved => Ok(ReservationCheck::NotReserved),
        Evaluation::Reserved { remaining, reserved_by } => Ok(ReservationCheck::Reserved { remaining, reserved_by }),
        Evaluation::Overdue { reserved_until } => {
            let outcome = expire_reservation(pool, job_id, Some(now)).await?;
            if outcome == ExpiryOutcome::default() {
                let current = read_fields(pool, job_id).await?;
                return Ok(after_lost_race(current.as_ref(), now));
            }
            tracing::info!(
                %reserved_until,
                job_released = outcome.job_released,
                reservations_expired = outcome.reservations_expired,
                "Expired overdue reservation"
            );
            Ok(ReservationCheck::Expired)
        }
    }
}

/// Human-readable time left: `"Expired"`, `"1h 2m 3s"`, `"2m 3s"` or `"3s"`.
pub fn format_time_left(remaining: Duration) -> String {
    if remaining <= Duration::zero() {
        return "Expired".to_string();
    }

    let total = remaining.num_seconds();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;

    if hours > 0 {
        format!("{hours}h {minutes}m {seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m {seconds}s")
    } else {
        format!("{seconds}s")
    }
}
