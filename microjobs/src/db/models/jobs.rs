//! Database models for microjobs and their categories.

use crate::types::{CategoryId, JobId, UserId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;

/// Database request for creating a new job
#[derive(Debug, Clone)]
pub struct JobCreateDBRequest {
    pub title: String,
    pub description: String,
    pub budget_min: Decimal,
    pub budget_max: Decimal,
    pub location: Option<String>,
    pub is_remote: bool,
    pub workers_needed: i32,
    pub category_id: Option<CategoryId>,
    pub user_id: UserId,
}

/// Database response for a job, including its category name when it has one
#[derive(Debug, Clone, FromRow)]
pub struct JobDBResponse {
    pub id: JobId,
    pub title: String,
    pub description: String,
    pub budget_min: Decimal,
    pub budget_max: Decimal,
    pub location: Option<String>,
    pub is_remote: bool,
    pub workers_needed: i32,
    pub category_id: Option<CategoryId>,
    pub category_name: Option<String>,
    pub user_id: UserId,
    pub is_reserved: bool,
    pub reserved_by: Option<UserId>,
    pub reserved_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The reservation columns of a job row
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct JobReservationFields {
    pub is_reserved: bool,
    pub reserved_by: Option<UserId>,
    pub reserved_until: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, FromRow)]
pub struct CategoryDBResponse {
    pub id: CategoryId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}
