//! API models for job listings and reservation status.

use crate::db::models::jobs::JobDBResponse;
use crate::types::{CategoryId, JobId, UserId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Query parameters for listing jobs
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct ListJobsQuery {
    /// Only jobs in this category
    #[param(value_type = Option<String>, format = "uuid")]
    pub category_id: Option<CategoryId>,
    /// Include jobs currently reserved by someone (default: false)
    pub include_reserved: Option<bool>,
    /// Number of jobs to skip
    pub skip: Option<i64>,
    /// Maximum number of jobs to return (capped at 100)
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JobResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: JobId,
    pub title: String,
    pub description: String,
    #[schema(value_type = String)]
    pub budget_min: Decimal,
    #[schema(value_type = String)]
    pub budget_max: Decimal,
    pub location: Option<String>,
    pub is_remote: bool,
    pub workers_needed: i32,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub category_id: Option<CategoryId>,
    pub category_name: Option<String>,
    #[schema(value_type = String, format = "uuid")]
    pub user_id: UserId,
    pub is_reserved: bool,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub reserved_by: Option<UserId>,
    pub reserved_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<JobDBResponse> for JobResponse {
    fn from(db: JobDBResponse) -> Self {
        Self {
            id: db.id,
            title: db.title,
            description: db.description,
            budget_min: db.budget_min,
            budget_max: db.budget_max,
            location: db.location,
            is_remote: db.is_remote,
            workers_needed: db.workers_needed,
            category_id: db.category_id,
            category_name: db.category_name,
            user_id: db.user_id,
            is_reserved: db.is_reserved,
            reserved_by: db.reserved_by,
            reserved_until: db.reserved_until,
            created_at: db.created_at,
        }
    }
}

/// Body of `PUT /api/jobs`
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateJobWorkersRequest {
    #[schema(value_type = Option<String>, format = "uuid")]
    pub job_id: Option<JobId>,
    pub new_worker_count: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateJobWorkersResponse {
    pub success: bool,
    pub data: JobResponse,
}
