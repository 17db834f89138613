//! API models for favorites.

use crate::db::models::favorites::FavoriteDBResponse;
use crate::types::{FavoriteId, JobId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteRequest {
    #[schema(value_type = Option<String>, format = "uuid")]
    pub job_id: Option<JobId>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: FavoriteId,
    #[schema(value_type = String, format = "uuid")]
    pub job_id: JobId,
    pub job_title: String,
    #[schema(value_type = String)]
    pub budget_min: Decimal,
    #[schema(value_type = String)]
    pub budget_max: Decimal,
    pub is_reserved: bool,
    pub category_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<FavoriteDBResponse> for FavoriteResponse {
    fn from(db: FavoriteDBResponse) -> Self {
        Self {
            id: db.id,
            job_id: db.job_id,
            job_title: db.job_title,
            budget_min: db.budget_min,
            budget_max: db.budget_max,
            is_reserved: db.is_reserved,
            category_name: db.category_name,
            created_at: db.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FavoriteRemovedResponse {
    pub removed: bool,
}
