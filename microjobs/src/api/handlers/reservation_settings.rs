use crate::api::models::reservations::{ReservationSettingsResponse, ReservationSettingsUpdate};
use crate::api::models::users::CurrentUser;
use crate::auth::permissions::require_admin;
use crate::db::models::reservations::ReservationSettingsUpdateDBRequest;
use crate::errors::{Error, Result};
use crate::reservations::{get_reservation_settings, update_reservation_settings};
use crate::types::{Operation, Resource};
use crate::AppState;
use axum::{Json, extract::State};

#[utoipa::path(
    get,
    path = "/admin/reservation-settings",
    tag = "admin",
    summary = "Get the job reservation settings",
    responses(
        (status = 200, description = "Current settings, or the defaults when never set", body = ReservationSettingsResponse),
        (status = 401, description = "Missing credentials or caller is not an admin"),
        (status = 500, description = "Internal server error")
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_settings(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> Result<Json<ReservationSettingsResponse>> {
    require_admin(&current_user, Operation::ReadAll, Resource::ReservationSettings)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let settings = get_reservation_settings(&mut conn).await?;

    Ok(Json(settings.into()))
}

#[utoipa::path(
    post,
    path = "/admin/reservation-settings",
    tag = "admin",
    summary = "Update the job reservation settings",
    request_body = ReservationSettingsUpdate,
    responses(
        (status = 200, description = "Stored settings", body = ReservationSettingsResponse),
        (status = 400, description = "A value is below its minimum of 1"),
        (status = 401, description = "Missing credentials or caller is not an admin"),
        (status = 500, description = "Internal server error")
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_settings(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(update): Json<ReservationSettingsUpdate>,
) -> Result<Json<ReservationSettingsResponse>> {
    require_admin(&current_user, Operation::UpdateAll, Resource::ReservationSettings)?;

    let request = ReservationSettingsUpdateDBRequest {
        is_enabled: update.is_enabled,
        default_reservation_hours: update.default_reservation_hours,
        max_concurrent_reservations: update.max_concurrent_reservations,
    };

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let settings = update_reservation_settings(&mut conn, &request).await?;

    tracing::info!(?settings, "Reservation settings updated");
    Ok(Json(settings.into()))
}
