use crate::api::handlers::jobs::status_response;
use crate::api::models::reservations::{
    CancelReservationResponse, JobIdRequest, ReservationResponse, ReservationStatusResponse, SweepResponse,
    UserReservationResponse,
};
use crate::api::models::users::CurrentUser;
use crate::auth::permissions::require_admin;
use crate::errors::{Error, Result};
use crate::reservations::{cancel_reservation, list_user_reservations, reserve_job, sweep_expired};
use crate::types::{JobId, Operation, Resource};
use crate::AppState;
use axum::{Json, extract::State, http::StatusCode};
use chrono::Utc;

fn required_job_id(request: &JobIdRequest) -> Result<JobId> {
    request.job_id.ok_or_else(|| Error::BadRequest {
        message: "Job ID is required".to_string(),
    })
}

#[utoipa::path(
    post,
    path = "/jobs/reserve",
    tag = "reservations",
    summary = "Reserve a job",
    description = "Holds the job for the caller for the configured number of hours.",
    request_body = JobIdRequest,
    responses(
        (status = 201, description = "Reservation created", body = ReservationResponse),
        (status = 400, description = "Missing job ID, reservations disabled, or own job"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Job not found"),
        (status = 409, description = "Job already reserved or reservation limit reached"),
        (status = 500, description = "Internal server error")
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn reserve(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<JobIdRequest>,
) -> Result<(StatusCode, Json<ReservationResponse>)> {
    let job_id = required_job_id(&request)?;
    let reservation = reserve_job(&state.db, &current_user, job_id, Utc::now()).await?;

    Ok((StatusCode::CREATED, Json(reservation.into())))
}

#[utoipa::path(
    post,
    path = "/reservations/cancel",
    tag = "reservations",
    summary = "Cancel a reservation",
    request_body = JobIdRequest,
    responses(
        (status = 200, description = "Reservation cancelled", body = CancelReservationResponse),
        (status = 400, description = "Missing job ID"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Reservation belongs to another user"),
        (status = 404, description = "Job or active reservation not found"),
        (status = 500, description = "Internal server error")
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn cancel(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<JobIdRequest>,
) -> Result<Json<CancelReservationResponse>> {
    let job_id = required_job_id(&request)?;
    cancel_reservation(&state.db, &current_user, job_id, Utc::now()).await?;

    Ok(Json(CancelReservationResponse { success: true }))
}

#[utoipa::path(
    post,
    path = "/reservations/check-expiry",
    tag = "reservations",
    summary = "Check a job's reservation, expiring it if overdue",
    request_body = JobIdRequest,
    responses(
        (status = 200, description = "Reservation status", body = ReservationStatusResponse),
        (status = 400, description = "Missing job ID"),
        (status = 401, description = "Unauthorized"),
        (status = 503, description = "Status could not be determined")
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn check_expiry(
    State(state): State<AppState>,
    _: CurrentUser,
    Json(request): Json<JobIdRequest>,
) -> Result<Json<ReservationStatusResponse>> {
    let job_id = required_job_id(&request)?;
    status_response(&state, job_id).await.map(Json)
}

#[utoipa::path(
    get,
    path = "/reservations/user",
    tag = "reservations",
    summary = "List the caller's active reservations",
    responses(
        (status = 200, description = "Active reservations, newest first", body = Vec<UserReservationResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_mine(State(state): State<AppState>, current_user: CurrentUser) -> Result<Json<Vec<UserReservationResponse>>> {
    let now = Utc::now();
    let reservations = list_user_reservations(&state.db, &current_user).await?;

    Ok(Json(
        reservations
            .into_iter()
            .map(|r| UserReservationResponse::from_db(r, now))
            .collect(),
    ))
}

#[utoipa::path(
    post,
    path = "/reservations/cleanup",
    tag = "admin",
    summary = "Expire all overdue reservations",
    description = "Also served on GET.",
    responses(
        (status = 200, description = "Sweep result", body = SweepResponse),
        (status = 401, description = "Missing credentials or caller is not an admin"),
        (status = 500, description = "Internal server error")
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn cleanup(State(state): State<AppState>, current_user: CurrentUser) -> Result<Json<SweepResponse>> {
    require_admin(&current_user, Operation::UpdateAll, Resource::Reservations)?;

    let released = sweep_expired(&state.db, Utc::now()).await?;
    Ok(Json(SweepResponse { success: true, released }))
}
