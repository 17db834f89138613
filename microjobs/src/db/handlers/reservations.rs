//! Database repository for job reservations and reservation settings.
//!
//! Statements that touch both `microjobs` and `job_reservations` are written as a single
//! statement with data-modifying CTEs, so the job flag and the reservation row change
//! together or not at all.

use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use tracing::instrument;

use crate::db::errors::Result;
use crate::db::models::reservations::{
    RESERVATION_SETTINGS_ID, Reservation, ReservationSettingsDBResponse, ReservationSettingsUpdateDBRequest,
    UserReservationDBResponse,
};
use crate::types::{JobId, UserId, abbrev_uuid};

/// Row counts of a release (expiry or cancellation).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReleaseCounts {
    pub jobs_released: i64,
    pub reservations_closed: i64,
}

pub struct Reservations<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Reservations<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Insert a new active reservation.
    #[instrument(skip(self), fields(job_id = %abbrev_uuid(&job_id), user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn create(&mut self, job_id: JobId, user_id: UserId, expires_at: DateTime<Utc>) -> Result<Reservation> {
        let reservation = sqlx::query_as::<_, Reservation>(
            r#"
            INSERT INTO job_reservations (job_id, user_id, status, expires_at)
            VALUES ($1, $2, 'active', $3)
            RETURNING *
            "#,
        )
        .bind(job_id)
        .bind(user_id)
        .bind(expires_at)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(reservation)
    }

    #[instrument(skip(self), fields(job_id = %abbrev_uuid(&job_id)), err)]
    pub async fn get_active_for_job(&mut self, job_id: JobId) -> Result<Option<Reservation>> {
        let reservation = sqlx::query_as::<_, Reservation>("SELECT * FROM job_reservations WHERE job_id = $1 AND status = 'active'")
            .bind(job_id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(reservation)
    }

    /// Active reservations of a user that are still running at `now`. Lapsed rows that no
    /// sweep has expired yet are not counted.
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn count_active_for_user(&mut self, user_id: UserId, now: DateTime<Utc>) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM job_reservations WHERE user_id = $1 AND status = 'active' AND expires_at > $2",
        )
        .bind(user_id)
        .bind(now)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(count)
    }

    /// Active reservations of a user, newest first, with a summary of each job.
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn list_active_for_user(&mut self, user_id: UserId) -> Result<Vec<UserReservationDBResponse>> {
        let reservations = sqlx::query_as::<_, UserReservationDBResponse>(
            r#"
            SELECT r.id, r.job_id, r.expires_at, r.status, r.created_at,
                   j.title AS job_title, j.budget_max, c.name AS category_name
            FROM job_reservations r
            JOIN microjobs j ON j.id = r.job_id
            LEFT JOIN categories c ON c.id = j.category_id
            WHERE r.user_id = $1 AND r.status = 'active'
            ORDER BY r.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(reservations)
    }

    /// Release a job and move its active reservations to `expired`.
    ///
    /// With `due_at = Some(t)` only a job whose deadline is at or before `t` is released, and
    /// only reservations whose `expires_at` is at or before `t` are expired; a reservation
    /// taken after the caller looked at the row is left alone. Running it again is a no-op.
    #[instrument(skip(self), fields(job_id = %abbrev_uuid(&job_id)), err)]
    pub async fn expire_for_job(&mut self, job_id: JobId, due_at: Option<DateTime<Utc>>) -> Result<ReleaseCounts> {
        let (jobs_released, reservations_closed) = sqlx::query_as::<_, (i64, i64)>(
            r#"
            WITH released AS (
                UPDATE microjobs
                SET is_reserved = false, reserved_by = NULL, reserved_until = NULL, updated_at = now()
                WHERE id = $1
                  AND (is_reserved OR reserved_by IS NOT NULL OR reserved_until IS NOT NULL)
                  AND ($2::timestamptz IS NULL OR reserved_until IS NULL OR reserved_until <= $2)
                RETURNING id
            ),
            expired AS (
                UPDATE job_reservations
                SET status = 'expired', updated_at = now()
                WHERE job_id = $1
                  AND status = 'active'
                  AND ($2::timestamptz IS NULL OR expires_at <= $2)
                RETURNING id
            )
            SELECT (SELECT COUNT(*) FROM released), (SELECT COUNT(*) FROM expired)
            "#,
        )
        .bind(job_id)
        .bind(due_at)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(ReleaseCounts {
            jobs_released,
            reservations_closed,
        })
    }

    /// Release a job and move its active reservation to `cancelled`.
    #[instrument(skip(self), fields(job_id = %abbrev_uuid(&job_id)), err)]
    pub async fn cancel_for_job(&mut self, job_id: JobId) -> Result<ReleaseCounts> {
        let (jobs_released, reservations_closed) = sqlx::query_as::<_, (i64, i64)>(
            r#"
            WITH released AS (
                UPDATE microjobs
                SET is_reserved = false, reserved_by = NULL, reserved_until = NULL, updated_at = now()
                WHERE id = $1 AND is_reserved
                RETURNING id
            ),
            cancelled AS (
                UPDATE job_reservations
                SET status = 'cancelled', updated_at = now()
                WHERE job_id = $1 AND status = 'active'
                RETURNING id
            )
            SELECT (SELECT COUNT(*) FROM released), (SELECT COUNT(*) FROM cancelled)
            "#,
        )
        .bind(job_id)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(ReleaseCounts {
            jobs_released,
            reservations_closed,
        })
    }

    // ===== Settings =====

    /// Read the settings singleton; `None` when the row was never written.
    #[instrument(skip(self), err)]
    pub async fn get_settings(&mut self) -> Result<Option<ReservationSettingsDBResponse>> {
        let settings = sqlx::query_as::<_, ReservationSettingsDBResponse>("SELECT * FROM reservation_settings WHERE id = $1")
            .bind(RESERVATION_SETTINGS_ID)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(settings)
    }

    /// Upsert the settings singleton. `defaults` fills fields that are neither in the
    /// request nor already stored.
    #[instrument(skip(self, request, defaults), err)]
    pub async fn upsert_settings(
        &mut self,
        request: &ReservationSettingsUpdateDBRequest,
        defaults: &ReservationSettingsUpdateDBRequest,
    ) -> Result<ReservationSettingsDBResponse> {
        let settings = sqlx::query_as::<_, ReservationSettingsDBResponse>(
            r#"
            INSERT INTO reservation_settings (id, is_enabled, default_reservation_hours, max_concurrent_reservations)
            VALUES ($1, COALESCE($2, $5), COALESCE($3, $6), COALESCE($4, $7))
            ON CONFLICT (id) DO UPDATE SET
                is_enabled = COALESCE($2, reservation_settings.is_enabled),
                default_reservation_hours = COALESCE($3, reservation_settings.default_reservation_hours),
                max_concurrent_reservations = COALESCE($4, reservation_settings.max_concurrent_reservations),
                updated_at = now()
            RETURNING *
            "#,
        )
        .bind(RESERVATION_SETTINGS_ID)
        .bind(request.is_enabled)
        .bind(request.default_reservation_hours)
        .bind(request.max_concurrent_reservations)
        .bind(defaults.is_enabled)
        .bind(defaults.default_reservation_hours)
        .bind(defaults.max_concurrent_reservations)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::users::UserType;
    use crate::db::errors::DbError;
    use crate::db::handlers::Jobs;
    use crate::db::models::reservations::ReservationStatus;
    use crate::test_utils::{create_test_job, create_test_user};
    use chrono::Duration;
    use sqlx::PgPool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_one_active_reservation_per_job(pool: PgPool) {
        let owner = create_test_user(&pool, UserType::Employer).await;
        let first = create_test_user(&pool, UserType::Worker).await;
        let second = create_test_user(&pool, UserType::Worker).await;
        let job = create_test_job(&pool, owner.id, None).await;

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Reservations::new(&mut conn);
        let until = Utc::now() + Duration::hours(1);

        repo.create(job.id, first.id, until).await.unwrap();
        let err = repo.create(job.id, second.id, until).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_expire_for_job_releases_both_sides(pool: PgPool) {
        let owner = create_test_user(&pool, UserType::Employer).await;
        let worker = create_test_user(&pool, UserType::Worker).await;
        let job = create_test_job(&pool, owner.id, None).await;
        let until = Utc::now() - Duration::minutes(1);

        let mut conn = pool.acquire().await.unwrap();
        Jobs::new(&mut conn).mark_reserved(job.id, worker.id, until).await.unwrap();
        let mut repo = Reservations::new(&mut conn);
        let reservation = repo.create(job.id, worker.id, until).await.unwrap();

        let counts = repo.expire_for_job(job.id, None).await.unwrap();
        assert_eq!(
            counts,
            ReleaseCounts {
                jobs_released: 1,
                reservations_closed: 1
            }
        );
        assert!(repo.get_active_for_job(job.id).await.unwrap().is_none());

        let status = sqlx::query_scalar::<_, ReservationStatus>("SELECT status FROM job_reservations WHERE id = $1")
            .bind(reservation.id)
            .fetch_one(&mut *conn)
            .await
            .unwrap();
        assert_eq!(status, ReservationStatus::Expired);

        let fields = Jobs::new(&mut conn).get_reservation_fields(job.id).await.unwrap().unwrap();
        assert!(!fields.is_reserved);
        assert_eq!(fields.reserved_by, None);
        assert_eq!(fields.reserved_until, None);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_expire_with_due_date_skips_running_reservation(pool: PgPool) {
        let owner = create_test_user(&pool, UserType::Employer).await;
        let worker = create_test_user(&pool, UserType::Worker).await;
        let job = create_test_job(&pool, owner.id, None).await;
        let until = Utc::now() + Duration::hours(1);

        let mut conn = pool.acquire().await.unwrap();
        Jobs::new(&mut conn).mark_reserved(job.id, worker.id, until).await.unwrap();
        let mut repo = Reservations::new(&mut conn);
        repo.create(job.id, worker.id, until).await.unwrap();

        let counts = repo.expire_for_job(job.id, Some(Utc::now())).await.unwrap();
        assert_eq!(counts, ReleaseCounts::default());
        assert!(repo.get_active_for_job(job.id).await.unwrap().is_some());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_settings_upsert_is_partial(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Reservations::new(&mut conn);
        let defaults = ReservationSettingsUpdateDBRequest {
            is_enabled: Some(false),
            default_reservation_hours: Some(1),
            max_concurrent_reservations: Some(5),
        };

        assert!(repo.get_settings().await.unwrap().is_none());

        let created = repo
            .upsert_settings(
                &ReservationSettingsUpdateDBRequest {
                    is_enabled: Some(true),
                    ..Default::default()
                },
                &defaults,
            )
            .await
            .unwrap();
        assert!(created.is_enabled);
        assert_eq!(created.default_reservation_hours, 1);
        assert_eq!(created.max_concurrent_reservations, 5);

        let updated = repo
            .upsert_settings(
                &ReservationSettingsUpdateDBRequest {
                    default_reservation_hours: Some(4),
                    ..Default::default()
                },
                &defaults,
            )
            .await
            .unwrap();
        assert!(updated.is_enabled);
        assert_eq!(updated.default_reservation_hours, 4);
        assert_eq!(updated.id, RESERVATION_SETTINGS_ID);
    }
}
