//! Database repository for microjobs and categories.

use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use tracing::instrument;

use crate::db::{
    errors::Result,
    handlers::repository::Repository,
    models::jobs::{CategoryDBResponse, JobCreateDBRequest, JobDBResponse, JobReservationFields},
};
use crate::types::{CategoryId, JobId, UserId, abbrev_uuid};

const JOB_COLUMNS: &str = r#"
    j.id, j.title, j.description, j.budget_min, j.budget_max, j.location, j.is_remote,
    j.workers_needed, j.category_id, c.name AS category_name, j.user_id, j.is_reserved,
    j.reserved_by, j.reserved_until, j.created_at, j.updated_at
"#;

/// Filter for listing jobs
#[derive(Debug, Clone)]
pub struct JobFilter {
    pub category_id: Option<CategoryId>,
    pub include_reserved: bool,
    pub skip: i64,
    pub limit: i64,
}

impl JobFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            category_id: None,
            include_reserved: false,
            skip,
            limit,
        }
    }
}

pub struct Jobs<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Jobs<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Read only the reservation columns of a job.
    #[instrument(skip(self), fields(job_id = %abbrev_uuid(&id)), err)]
    pub async fn get_reservation_fields(&mut self, id: JobId) -> Result<Option<JobReservationFields>> {
        let fields = sqlx::query_as::<_, JobReservationFields>("SELECT is_reserved, reserved_by, reserved_until FROM microjobs WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(fields)
    }

    /// Lock the job row for the rest of the enclosing transaction and return its owner and
    /// reservation columns.
    #[instrument(skip(self), fields(job_id = %abbrev_uuid(&id)), err)]
    pub async fn lock_for_reservation(&mut self, id: JobId) -> Result<Option<(UserId, JobReservationFields)>> {
        let row = sqlx::query_as::<_, (UserId, bool, Option<UserId>, Option<DateTime<Utc>>)>(
            "SELECT user_id, is_reserved, reserved_by, reserved_until FROM microjobs WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(row.map(|(owner, is_reserved, reserved_by, reserved_until)| {
            (
                owner,
                JobReservationFields {
                    is_reserved,
                    reserved_by,
                    reserved_until,
                },
            )
        }))
    }

    /// Flag a job as reserved by `user_id` until `until`.
    #[instrument(skip(self), fields(job_id = %abbrev_uuid(&id), user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn mark_reserved(&mut self, id: JobId, user_id: UserId, until: DateTime<Utc>) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE microjobs
            SET is_reserved = true, reserved_by = $2, reserved_until = $3, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(until)
        .execute(&mut *self.db)
        .await?;

        Ok(())
    }

    /// Jobs still flagged as reserved whose deadline is at or before `now`.
    #[instrument(skip(self), err)]
    pub async fn list_overdue_reserved(&mut self, now: DateTime<Utc>) -> Result<Vec<JobId>> {
        let ids = sqlx::query_scalar::<_, JobId>(
            r#"
            SELECT id FROM microjobs WHERE is_reserved AND reserved_until <= $1
            UNION
            SELECT job_id FROM job_reservations WHERE status = 'active' AND expires_at <= $1
            "#,
        )
        .bind(now)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(ids)
    }

    /// Set how many workers a job needs. `None` when the job does not exist.
    #[instrument(skip(self), fields(job_id = %abbrev_uuid(&id)), err)]
    pub async fn update_workers(&mut self, id: JobId, workers_needed: i32) -> Result<Option<JobDBResponse>> {
        let updated = sqlx::query_scalar::<_, JobId>(
            "UPDATE microjobs SET workers_needed = $2, updated_at = now() WHERE id = $1 RETURNING id",
        )
        .bind(id)
        .bind(workers_needed)
        .fetch_optional(&mut *self.db)
        .await?;

        match updated {
            Some(id) => self.get_by_id(id).await,
            None => Ok(None),
        }
    }

    #[instrument(skip(self, name), err)]
    pub async fn create_category(&mut self, name: &str) -> Result<CategoryDBResponse> {
        let category = sqlx::query_as::<_, CategoryDBResponse>("INSERT INTO categories (name) VALUES ($1) RETURNING *")
            .bind(name)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(category)
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Jobs<'c> {
    type CreateRequest = JobCreateDBRequest;
    type Response = JobDBResponse;
    type Id = JobId;
    type Filter = JobFilter;

    #[instrument(skip(self, request), fields(owner = %abbrev_uuid(&request.user_id)), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let id = sqlx::query_scalar::<_, JobId>(
            r#"
            INSERT INTO microjobs
                (title, description, budget_min, budget_max, location, is_remote, workers_needed, category_id, user_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id
            "#,
        )
        .bind(&request.title)
        .bind(&request.description)
        .bind(request.budget_min)
        .bind(request.budget_max)
        .bind(&request.location)
        .bind(request.is_remote)
        .bind(request.workers_needed)
        .bind(request.category_id)
        .bind(request.user_id)
        .fetch_one(&mut *self.db)
        .await?;

        self.get_by_id(id).await?.ok_or(crate::db::errors::DbError::NotFound)
    }

    #[instrument(skip(self), fields(job_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let query = format!("SELECT {JOB_COLUMNS} FROM microjobs j LEFT JOIN categories c ON c.id = j.category_id WHERE j.id = $1");
        let job = sqlx::query_as::<_, JobDBResponse>(&query)
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(job)
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let query = format!(
            r#"
            SELECT {JOB_COLUMNS}
            FROM microjobs j
            LEFT JOIN categories c ON c.id = j.category_id
            WHERE ($1::uuid IS NULL OR j.category_id = $1)
              AND ($2 OR NOT j.is_reserved)
            ORDER BY j.created_at DESC
            LIMIT $3 OFFSET $4
            "#
        );
        let jobs = sqlx::query_as::<_, JobDBResponse>(&query)
            .bind(filter.category_id)
            .bind(filter.include_reserved)
            .bind(filter.limit)
            .bind(filter.skip)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(jobs)
    }
}
