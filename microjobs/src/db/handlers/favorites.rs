//! Database repository for user favorites.

use sqlx::PgConnection;
use tracing::instrument;

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::favorites::{FavoriteCreateDBRequest, FavoriteDBResponse},
};
use crate::types::{FavoriteId, JobId, UserId, abbrev_uuid};

const FAVORITE_COLUMNS: &str = r#"
    f.id, f.user_id, f.job_id, f.created_at,
    j.title AS job_title, j.budget_min, j.budget_max, j.is_reserved, c.name AS category_name
"#;

/// Filter for listing favorites; favorites are always scoped to one user
#[derive(Debug, Clone)]
pub struct FavoriteFilter {
    pub user_id: UserId,
}

pub struct Favorites<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Favorites<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Remove a job from a user's favorites. Returns whether a row was deleted.
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id), job_id = %abbrev_uuid(&job_id)), err)]
    pub async fn delete(&mut self, user_id: UserId, job_id: JobId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM user_favorites WHERE user_id = $1 AND job_id = $2")
            .bind(user_id)
            .bind(job_id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Favorites<'c> {
    type CreateRequest = FavoriteCreateDBRequest;
    type Response = FavoriteDBResponse;
    type Id = FavoriteId;
    type Filter = FavoriteFilter;

    #[instrument(skip(self, request), fields(user_id = %abbrev_uuid(&request.user_id), job_id = %abbrev_uuid(&request.job_id)), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let id = sqlx::query_scalar::<_, FavoriteId>("INSERT INTO user_favorites (user_id, job_id) VALUES ($1, $2) RETURNING id")
            .bind(request.user_id)
            .bind(request.job_id)
            .fetch_one(&mut *self.db)
            .await?;

        self.get_by_id(id).await?.ok_or(DbError::NotFound)
    }

    #[instrument(skip(self), fields(favorite_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let query = format!(
            r#"
            SELECT {FAVORITE_COLUMNS}
            FROM user_favorites f
            JOIN microjobs j ON j.id = f.job_id
            LEFT JOIN categories c ON c.id = j.category_id
            WHERE f.id = $1
            "#
        );
        let favorite = sqlx::query_as::<_, FavoriteDBResponse>(&query)
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(favorite)
    }

    #[instrument(skip(self, filter), fields(user_id = %abbrev_uuid(&filter.user_id)), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let query = format!(
            r#"
            SELECT {FAVORITE_COLUMNS}
            FROM user_favorites f
            JOIN microjobs j ON j.id = f.job_id
            LEFT JOIN categories c ON c.id = j.category_id
            WHERE f.user_id = $1
            ORDER BY f.created_at DESC
            "#
        );
        let favorites = sqlx::query_as::<_, FavoriteDBResponse>(&query)
            .bind(filter.user_id)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(favorites)
    }
}
