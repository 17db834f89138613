use crate::api::models::commission::{
    CommissionSettingsResponse, CommissionUpdate, CommissionUpdateResponse, FeeSettingResponse,
};
use crate::api::models::users::CurrentUser;
use crate::auth::permissions::require_admin;
use crate::db::handlers::FeeSettings;
use crate::db::models::fee_settings::FeeSettingUpsertDBRequest;
use crate::errors::{Error, Result};
use crate::types::{Operation, Resource};
use crate::AppState;
use axum::{Json, extract::State};
use rust_decimal::Decimal;

#[utoipa::path(
    get,
    path = "/admin/commission",
    tag = "admin",
    summary = "List commission settings for every fee type",
    responses(
        (status = 200, description = "Fee settings ordered by fee type", body = CommissionSettingsResponse),
        (status = 401, description = "Missing credentials or caller is not an admin"),
        (status = 500, description = "Internal server error")
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_commission_settings(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> Result<Json<CommissionSettingsResponse>> {
    require_admin(&current_user, Operation::ReadAll, Resource::CommissionSettings)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let settings = FeeSettings::new(&mut conn).list().await?;

    Ok(Json(CommissionSettingsResponse {
        fee_settings: settings.into_iter().map(FeeSettingResponse::from).collect(),
    }))
}

#[utoipa::path(
    put,
    path = "/admin/commission",
    tag = "admin",
    summary = "Replace the commission settings of one fee type",
    request_body = CommissionUpdate,
    responses(
        (status = 200, description = "Stored settings", body = CommissionUpdateResponse),
        (status = 400, description = "Missing required fields"),
        (status = 401, description = "Missing credentials or caller is not an admin"),
        (status = 500, description = "Internal server error")
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_commission_settings(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(update): Json<CommissionUpdate>,
) -> Result<Json<CommissionUpdateResponse>> {
    require_admin(&current_user, Operation::UpdateAll, Resource::CommissionSettings)?;

    let (Some(fee_type), Some(settings)) = (update.fee_type.filter(|t| !t.is_empty()), update.settings) else {
        return Err(Error::BadRequest {
            message: "Missing required fields".to_string(),
        });
    };

    let request = FeeSettingUpsertDBRequest {
        fee_type,
        fee_percentage: settings.fee_percentage.unwrap_or(Decimal::ZERO),
        fee_fixed: settings.fee_fixed.unwrap_or(Decimal::ZERO),
        minimum_fee: settings.minimum_fee.unwrap_or(Decimal::ZERO),
        // A zero maximum means no cap
        maximum_fee: settings.maximum_fee.filter(|max| !max.is_zero()),
        is_active: settings.is_active.unwrap_or(false),
    };

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let stored = FeeSettings::new(&mut conn).upsert(&request).await?;

    tracing::info!(fee_type = %stored.fee_type, "Commission settings updated");
    Ok(Json(CommissionUpdateResponse {
        success: true,
        data: FeeSettingResponse::from(stored),
    }))
}
