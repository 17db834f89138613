use crate::types::{FavoriteId, JobId, UserId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;

#[derive(Debug, Clone)]
pub struct FavoriteCreateDBRequest {
    pub user_id: UserId,
    pub job_id: JobId,
}

/// A favorite joined with the job it points at
#[derive(Debug, Clone, FromRow)]
pub struct FavoriteDBResponse {
    pub id: FavoriteId,
    pub user_id: UserId,
    pub job_id: JobId,
    pub created_at: DateTime<Utc>,
    pub job_title: String,
    pub budget_min: Decimal,
    pub budget_max: Decimal,
    pub is_reserved: bool,
    pub category_name: Option<String>,
}
