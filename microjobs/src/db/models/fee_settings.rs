use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct FeeSettingDBResponse {
    pub fee_type: String,
    pub fee_percentage: Decimal,
    pub fee_fixed: Decimal,
    pub minimum_fee: Decimal,
    pub maximum_fee: Option<Decimal>,
    pub is_active: bool,
    pub updated_at: DateTime<Utc>,
}

/// Full replacement of one fee type's settings
#[derive(Debug, Clone)]
pub struct FeeSettingUpsertDBRequest {
    pub fee_type: String,
    pub fee_percentage: Decimal,
    pub fee_fixed: Decimal,
    pub minimum_fee: Decimal,
    pub maximum_fee: Option<Decimal>,
    pub is_active: bool,
}
