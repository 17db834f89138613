//! API models for admin commission (fee) settings.
//!
//! Fee rows are returned with their column names, as the admin dashboard reads them.

use crate::db::models::fee_settings::FeeSettingDBResponse;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FeeSettingResponse {
    pub fee_type: String,
    #[schema(value_type = String)]
    pub fee_percentage: Decimal,
    #[schema(value_type = String)]
    pub fee_fixed: Decimal,
    #[schema(value_type = String)]
    pub minimum_fee: Decimal,
    #[schema(value_type = Option<String>)]
    pub maximum_fee: Option<Decimal>,
    pub is_active: bool,
    pub updated_at: DateTime<Utc>,
}

impl From<FeeSettingDBResponse> for FeeSettingResponse {
    fn from(db: FeeSettingDBResponse) -> Self {
        Self {
            fee_type: db.fee_type,
            fee_percentage: db.fee_percentage,
            fee_fixed: db.fee_fixed,
            minimum_fee: db.minimum_fee,
            maximum_fee: db.maximum_fee,
            is_active: db.is_active,
            updated_at: db.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommissionSettingsResponse {
    pub fee_settings: Vec<FeeSettingResponse>,
}

/// New values for one fee type; omitted amounts are stored as zero
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeeSettingValues {
    #[schema(value_type = Option<String>)]
    pub fee_percentage: Option<Decimal>,
    #[schema(value_type = Option<String>)]
    pub fee_fixed: Option<Decimal>,
    #[schema(value_type = Option<String>)]
    pub minimum_fee: Option<Decimal>,
    #[schema(value_type = Option<String>)]
    pub maximum_fee: Option<Decimal>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommissionUpdate {
    pub fee_type: Option<String>,
    pub settings: Option<FeeSettingValues>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CommissionUpdateResponse {
    pub success: bool,
    pub data: FeeSettingResponse,
}
