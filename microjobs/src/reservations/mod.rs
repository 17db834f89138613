//! Time-boxed job reservations.
//!
//! A reservation is stored twice: as the `is_reserved`/`reserved_by`/`reserved_until`
//! columns of the job row, and as a `job_reservations` row with a status. Every operation
//! here changes both inside one transaction.
//!
//! - [`status`]: status checks and time-left formatting
//! - [`settings`]: the reservation settings singleton
//! - [`sweeper`]: the periodic background sweep

pub mod settings;
pub mod status;
pub mod sweeper;

use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use tracing::instrument;

use crate::api::models::users::CurrentUser;
use crate::db::handlers::{Jobs, Reservations};
use crate::db::models::reservations::{Reservation, UserReservationDBResponse};
use crate::errors::{Error, Result};
use crate::types::{JobId, Operation, Resource, abbrev_uuid};

pub use settings::{ReservationSettings, get_reservation_settings, update_reservation_settings};
pub use status::{ReservationCheck, ReservationFields, check_reservation_status, format_time_left};

/// What an expiry changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpiryOutcome {
    /// The job row had reservation columns set and they were cleared
    pub job_released: bool,
    /// Number of active reservation rows moved to `expired`
    pub reservations_expired: u64,
}

/// Release a job and expire its active reservations in one transaction.
///
/// With `due_at` set, a reservation whose deadline is after `due_at` is left untouched.
/// Calling it again after it succeeded changes nothing.
#[instrument(skip(pool), fields(job_id = %abbrev_uuid(&job_id)), err)]
pub async fn expire_reservation(pool: &PgPool, job_id: JobId, due_at: Option<DateTime<Utc>>) -> Result<ExpiryOutcome> {
    let mut tx = pool.begin().await.map_err(|e| Error::Database(e.into()))?;
    let counts = Reservations::new(&mut tx).expire_for_job(job_id, due_at).await?;
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok(ExpiryOutcome {
        job_released: counts.jobs_released > 0,
        reservations_expired: counts.reservations_closed.max(0) as u64,
    })
}

/// Reserve a job for `user` until `now + default_reservation_hours`.
#[instrument(skip(pool, user), fields(user_id = %abbrev_uuid(&user.id), job_id = %abbrev_uuid(&job_id)), err)]
pub async fn reserve_job(pool: &PgPool, user: &CurrentUser, job_id: JobId, now: DateTime<Utc>) -> Result<Reservation> {
    let mut tx = pool.begin().await.map_err(|e| Error::Database(e.into()))?;

    let settings = get_reservation_settings(&mut tx).await?;
    if !settings.is_enabled {
        return Err(Error::BadRequest {
            message: "Job reservations are disabled".to_string(),
        });
    }

    let (owner, fields) = Jobs::new(&mut tx)
        .lock_for_reservation(job_id)
        .await?
        .ok_or_else(|| Error::NotFound {
            resource: "Job".to_string(),
            id: job_id.to_string(),
        })?;

    if owner == user.id {
        return Err(Error::BadRequest {
            message: "You cannot reserve your own job".to_string(),
        });
    }

    let mut reservations = Reservations::new(&mut tx);
    match fields.evaluate(now) {
        status::Evaluation::Reserved { .. } => {
            return Err(Error::Conflict {
                message: "Job is already reserved".to_string(),
            });
        }
        status::Evaluation::Overdue { .. } => {
            reservations.expire_for_job(job_id, Some(now)).await?;
        }
        status::Evaluation::NotReserved => {}
    }

    // The job columns and the reservation row can disagree after a crash; trust the row too
    if let Some(active) = reservations.get_active_for_job(job_id).await? {
        if active.expires_at > now {
            return Err(Error::Conflict {
                message: "Job is already reserved".to_string(),
            });
        }
        reservations.expire_for_job(job_id, Some(now)).await?;
    }

    let active = reservations.count_active_for_user(user.id, now).await?;
    if active >= i64::from(settings.max_concurrent_reservations) {
        return Err(Error::Conflict {
            message: format!(
                "Maximum concurrent reservations reached ({})",
                settings.max_concurrent_reservations
            ),
        });
    }

    let expires_at = now + Duration::hours(i64::from(settings.default_reservation_hours));
    let reservation = reservations.create(job_id, user.id, expires_at).await?;
    Jobs::new(&mut tx).mark_reserved(job_id, user.id, expires_at).await?;

    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    tracing::info!(%expires_at, "Job reserved");
    Ok(reservation)
}

/// Cancel the active reservation on a job. Only the reserving user or an admin may cancel.
///
/// A reservation that has already lapsed at `now` is expired instead, and the call fails
/// with not found since nothing was left to cancel.
#[instrument(skip(pool, user), fields(user_id = %abbrev_uuid(&user.id), job_id = %abbrev_uuid(&job_id)), err)]
pub async fn cancel_reservation(pool: &PgPool, user: &CurrentUser, job_id: JobId, now: DateTime<Utc>) -> Result<()> {
    let mut tx = pool.begin().await.map_err(|e| Error::Database(e.into()))?;

    // Serialize with concurrent reserve/cancel calls on the same job
    if Jobs::new(&mut tx).lock_for_reservation(job_id).await?.is_none() {
        return Err(Error::NotFound {
            resource: "Job".to_string(),
            id: job_id.to_string(),
        });
    }

    let no_active = || Error::NotFound {
        resource: "Active reservation for job".to_string(),
        id: job_id.to_string(),
    };

    let mut reservations = Reservations::new(&mut tx);
    let active = reservations.get_active_for_job(job_id).await?.ok_or_else(no_active)?;

    if active.expires_at <= now {
        reservations.expire_for_job(job_id, Some(now)).await?;
        tx.commit().await.map_err(|e| Error::Database(e.into()))?;
        tracing::info!(reservation_id = %abbrev_uuid(&active.id), "Reservation had lapsed before cancel; expired");
        return Err(no_active());
    }

    if active.user_id != user.id && !user.is_admin() {
        return Err(Error::InsufficientPermissions {
            action: Operation::DeleteOwn,
            resource: Resource::Reservations,
        });
    }

    reservations.cancel_for_job(job_id).await?;
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    tracing::info!(reservation_id = %abbrev_uuid(&active.id), "Reservation cancelled");
    Ok(())
}

/// Active reservations held by `user`, newest first.
#[instrument(skip(pool, user), fields(user_id = %abbrev_uuid(&user.id)), err)]
pub async fn list_user_reservations(pool: &PgPool, user: &CurrentUser) -> Result<Vec<UserReservationDBResponse>> {
    let mut conn = pool.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let reservations = Reservations::new(&mut conn).list_active_for_user(user.id).await?;
    Ok(reservations)
}

/// Expire every reservation whose deadline is at or before `now`, one job per transaction.
///
/// Returns the number of jobs released. A failure on one job is logged and does not stop
/// the sweep; the job is picked up again by the next one.
#[instrument(skip(pool), err)]
pub async fn sweep_expired(pool: &PgPool, now: DateTime<Utc>) -> Result<u64> {
    let due = {
        let mut conn = pool.acquire().await.map_err(|e| Error::Database(e.into()))?;
        Jobs::new(&mut conn).list_overdue_reserved(now).await?
    };

    let mut released = 0;
    for job_id in due {
        match expire_reservation(pool, job_id, Some(now)).await {
            Ok(outcome) if outcome.job_released || outcome.reservations_expired > 0 => released += 1,
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(job_id = %abbrev_uuid(&job_id), error = %e, "Failed to expire reservation");
            }
        }
    }

    if released > 0 {
        tracing::info!(released, "Expired overdue reservations");
    }
    Ok(released)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::users::UserType;
    use crate::db::models::reservations::{ReservationSettingsUpdateDBRequest, ReservationStatus};
    use crate::db::models::users::UserDBResponse;
    use crate::test_utils::{create_test_job, create_test_user};
    use sqlx::PgPool;

    fn caller(user: &UserDBResponse) -> CurrentUser {
        CurrentUser {
            id: user.id,
            email: user.email.clone(),
            user_type: user.user_type,
        }
    }

    async fn enable_reservations(pool: &PgPool, max_concurrent: i32) {
        let mut conn = pool.acquire().await.unwrap();
        update_reservation_settings(
            &mut conn,
            &ReservationSettingsUpdateDBRequest {
                is_enabled: Some(true),
                default_reservation_hours: Some(2),
                max_concurrent_reservations: Some(max_concurrent),
            },
        )
        .await
        .unwrap();
    }

    async fn status_of(pool: &PgPool, reservation: &Reservation) -> ReservationStatus {
        sqlx::query_scalar::<_, ReservationStatus>("SELECT status FROM job_reservations WHERE id = $1")
            .bind(reservation.id)
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_reserve_marks_job_and_creates_row(pool: PgPool) {
        enable_reservations(&pool, 5).await;
        let owner = create_test_user(&pool, UserType::Employer).await;
        let worker = create_test_user(&pool, UserType::Worker).await;
        let job = create_test_job(&pool, owner.id, None).await;
        let now = Utc::now();

        let reservation = reserve_job(&pool, &caller(&worker), job.id, now).await.unwrap();
        assert_eq!(reservation.status, ReservationStatus::Active);
        assert_eq!(reservation.user_id, worker.id);

        let check = check_reservation_status(&pool, job.id, Utc::now()).await;
        assert!(check.is_reserved());
        assert!(matches!(check, ReservationCheck::Reserved { reserved_by: Some(id), .. } if id == worker.id));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_reserve_when_disabled(pool: PgPool) {
        let owner = create_test_user(&pool, UserType::Employer).await;
        let worker = create_test_user(&pool, UserType::Worker).await;
        let job = create_test_job(&pool, owner.id, None).await;

        let err = reserve_job(&pool, &caller(&worker), job.id, Utc::now()).await.unwrap_err();
        assert!(matches!(err, Error::BadRequest { .. }));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_reserve_rules(pool: PgPool) {
        enable_reservations(&pool, 5).await;
        let owner = create_test_user(&pool, UserType::Employer).await;
        let first = create_test_user(&pool, UserType::Worker).await;
        let second = create_test_user(&pool, UserType::Worker).await;
        let job = create_test_job(&pool, owner.id, None).await;
        let now = Utc::now();

        let err = reserve_job(&pool, &caller(&owner), job.id, now).await.unwrap_err();
        assert!(matches!(err, Error::BadRequest { .. }));

        let err = reserve_job(&pool, &caller(&first), uuid::Uuid::new_v4(), now).await.unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));

        reserve_job(&pool, &caller(&first), job.id, now).await.unwrap();
        let err = reserve_job(&pool, &caller(&second), job.id, now).await.unwrap_err();
        assert!(matches!(err, Error::Conflict { .. }));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_reserve_over_max_concurrent(pool: PgPool) {
        enable_reservations(&pool, 1).await;
        let owner = create_test_user(&pool, UserType::Employer).await;
        let worker = create_test_user(&pool, UserType::Worker).await;
        let first = create_test_job(&pool, owner.id, None).await;
        let second = create_test_job(&pool, owner.id, None).await;
        let now = Utc::now();

        reserve_job(&pool, &caller(&worker), first.id, now).await.unwrap();
        let err = reserve_job(&pool, &caller(&worker), second.id, now).await.unwrap_err();
        assert!(matches!(err, Error::Conflict { .. }));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_lapsed_reservations_do_not_count_toward_limit(pool: PgPool) {
        enable_reservations(&pool, 1).await;
        let owner = create_test_user(&pool, UserType::Employer).await;
        let worker = create_test_user(&pool, UserType::Worker).await;
        let lapsed_job = create_test_job(&pool, owner.id, None).await;
        let next_job = create_test_job(&pool, owner.id, None).await;
        let now = Utc::now();

        // Reserved for 2h starting 3h ago; nothing has swept it yet
        let lapsed = reserve_job(&pool, &caller(&worker), lapsed_job.id, now - Duration::hours(3))
            .await
            .unwrap();
        assert_eq!(status_of(&pool, &lapsed).await, ReservationStatus::Active);

        let next = reserve_job(&pool, &caller(&worker), next_job.id, now).await.unwrap();
        assert_eq!(next.status, ReservationStatus::Active);

        let err = reserve_job(&pool, &caller(&worker), lapsed_job.id, now).await.unwrap_err();
        assert!(matches!(err, Error::Conflict { .. }));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_reserve_takes_over_lapsed_reservation(pool: PgPool) {
        enable_reservations(&pool, 5).await;
        let owner = create_test_user(&pool, UserType::Employer).await;
        let first = create_test_user(&pool, UserType::Worker).await;
        let second = create_test_user(&pool, UserType::Worker).await;
        let job = create_test_job(&pool, owner.id, None).await;
        let now = Utc::now();

        let lapsed = reserve_job(&pool, &caller(&first), job.id, now).await.unwrap();
        let later = now + Duration::hours(3);
        let taken = reserve_job(&pool, &caller(&second), job.id, later).await.unwrap();

        assert_eq!(status_of(&pool, &lapsed).await, ReservationStatus::Expired);
        assert_eq!(status_of(&pool, &taken).await, ReservationStatus::Active);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_expire_is_idempotent(pool: PgPool) {
        enable_reservations(&pool, 5).await;
        let owner = create_test_user(&pool, UserType::Employer).await;
        let worker = create_test_user(&pool, UserType::Worker).await;
        let job = create_test_job(&pool, owner.id, None).await;
        reserve_job(&pool, &caller(&worker), job.id, Utc::now()).await.unwrap();

        let first = expire_reservation(&pool, job.id, None).await.unwrap();
        assert_eq!(
            first,
            ExpiryOutcome {
                job_released: true,
                reservations_expired: 1
            }
        );

        let second = expire_reservation(&pool, job.id, None).await.unwrap();
        assert_eq!(second, ExpiryOutcome::default());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_cancel_permissions(pool: PgPool) {
        enable_reservations(&pool, 5).await;
        let owner = create_test_user(&pool, UserType::Employer).await;
        let worker = create_test_user(&pool, UserType::Worker).await;
        let other = create_test_user(&pool, UserType::Worker).await;
        let admin = create_test_user(&pool, UserType::Admin).await;
        let job = create_test_job(&pool, owner.id, None).await;

        let err = cancel_reservation(&pool, &caller(&worker), job.id, Utc::now()).await.unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));

        let reservation = reserve_job(&pool, &caller(&worker), job.id, Utc::now()).await.unwrap();
        let err = cancel_reservation(&pool, &caller(&other), job.id, Utc::now()).await.unwrap_err();
        assert!(matches!(err, Error::InsufficientPermissions { .. }));

        cancel_reservation(&pool, &caller(&admin), job.id, Utc::now()).await.unwrap();
        assert_eq!(status_of(&pool, &reservation).await, ReservationStatus::Cancelled);
        assert_eq!(
            check_reservation_status(&pool, job.id, Utc::now()).await,
            ReservationCheck::NotReserved
        );
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_cancel_lapsed_reservation_expires_it(pool: PgPool) {
        enable_reservations(&pool, 5).await;
        let owner = create_test_user(&pool, UserType::Employer).await;
        let worker = create_test_user(&pool, UserType::Worker).await;
        let job = create_test_job(&pool, owner.id, None).await;
        let now = Utc::now();

        let reservation = reserve_job(&pool, &caller(&worker), job.id, now - Duration::hours(3))
            .await
            .unwrap();

        let err = cancel_reservation(&pool, &caller(&worker), job.id, now).await.unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
        assert_eq!(status_of(&pool, &reservation).await, ReservationStatus::Expired);
        assert_eq!(check_reservation_status(&pool, job.id, now).await, ReservationCheck::NotReserved);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_user_reservations(pool: PgPool) {
        enable_reservations(&pool, 5).await;
        let owner = create_test_user(&pool, UserType::Employer).await;
        let worker = create_test_user(&pool, UserType::Worker).await;
        let first = create_test_job(&pool, owner.id, None).await;
        let second = create_test_job(&pool, owner.id, None).await;

        reserve_job(&pool, &caller(&worker), first.id, Utc::now()).await.unwrap();
        reserve_job(&pool, &caller(&worker), second.id, Utc::now()).await.unwrap();
        cancel_reservation(&pool, &caller(&worker), first.id, Utc::now()).await.unwrap();

        let listed = list_user_reservations(&pool, &caller(&worker)).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].job_id, second.id);
        assert_eq!(listed[0].job_title, second.title);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_sweep_releases_only_overdue_jobs(pool: PgPool) {
        enable_reservations(&pool, 5).await;
        let owner = create_test_user(&pool, UserType::Employer).await;
        let worker = create_test_user(&pool, UserType::Worker).await;
        let overdue = create_test_job(&pool, owner.id, None).await;
        let running = create_test_job(&pool, owner.id, None).await;
        let now = Utc::now();

        reserve_job(&pool, &caller(&worker), overdue.id, now - Duration::hours(3)).await.unwrap();
        reserve_job(&pool, &caller(&worker), running.id, now).await.unwrap();

        assert_eq!(sweep_expired(&pool, now).await.unwrap(), 1);
        assert_eq!(sweep_expired(&pool, now).await.unwrap(), 0);

        assert_eq!(
            check_reservation_status(&pool, overdue.id, now).await,
            ReservationCheck::NotReserved
        );
        assert!(check_reservation_status(&pool, running.id, now).await.is_reserved());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_sweep_continues_past_failing_job(pool: PgPool) {
        enable_reservations(&pool, 5).await;
        let owner = create_test_user(&pool, UserType::Employer).await;
        let worker = create_test_user(&pool, UserType::Worker).await;
        let stuck = create_test_job(&pool, owner.id, None).await;
        let overdue = create_test_job(&pool, owner.id, None).await;
        let now = Utc::now();

        reserve_job(&pool, &caller(&worker), stuck.id, now - Duration::hours(3)).await.unwrap();
        reserve_job(&pool, &caller(&worker), overdue.id, now - Duration::hours(3)).await.unwrap();

        // Releasing `stuck` fails with a constraint error, which is not a connection failure
        sqlx::query(&format!(
            r#"
            CREATE FUNCTION refuse_release() RETURNS trigger AS $$
            BEGIN
                IF OLD.id = '{}' THEN
                    RAISE EXCEPTION 'release refused' USING ERRCODE = 'check_violation';
                END IF;
                RETURN NEW;
            END
            $$ LANGUAGE plpgsql
            "#,
            stuck.id
        ))
        .execute(&pool)
        .await
        .unwrap();
        sqlx::query("CREATE TRIGGER refuse_release BEFORE UPDATE ON microjobs FOR EACH ROW EXECUTE FUNCTION refuse_release()")
            .execute(&pool)
            .await
            .unwrap();

        assert_eq!(sweep_expired(&pool, now).await.unwrap(), 1);
        assert_eq!(
            check_reservation_status(&pool, overdue.id, now).await,
            ReservationCheck::NotReserved
        );
    }
}
