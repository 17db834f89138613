use crate::api::models::jobs::{JobResponse, ListJobsQuery, UpdateJobWorkersRequest, UpdateJobWorkersResponse};
use crate::api::models::reservations::ReservationStatusResponse;
use crate::api::models::users::CurrentUser;
use crate::db::handlers::{Jobs, Repository, jobs::JobFilter};
use crate::errors::{Error, Result};
use crate::reservations::check_reservation_status;
use crate::types::{JobId, Operation, Resource, abbrev_uuid};
use crate::AppState;
use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::Utc;

/// Upper bound on the page size of job listings
const MAX_JOBS_PAGE: i64 = 100;

#[utoipa::path(
    get,
    path = "/jobs",
    tag = "jobs",
    summary = "List jobs",
    params(ListJobsQuery),
    responses(
        (status = 200, description = "Jobs, newest first", body = Vec<JobResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_jobs(
    State(state): State<AppState>,
    Query(query): Query<ListJobsQuery>,
    _: CurrentUser,
) -> Result<Json<Vec<JobResponse>>> {
    let skip = query.skip.unwrap_or(0).max(0);
    let limit = query.limit.unwrap_or(20).clamp(1, MAX_JOBS_PAGE);

    let mut filter = JobFilter::new(skip, limit);
    filter.category_id = query.category_id;
    filter.include_reserved = query.include_reserved.unwrap_or(false);

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let jobs = Jobs::new(&mut conn).list(&filter).await?;

    Ok(Json(jobs.into_iter().map(JobResponse::from).collect()))
}

#[utoipa::path(
    put,
    path = "/jobs",
    tag = "jobs",
    summary = "Change how many workers a job needs",
    description = "Only the employer who posted the job may change it.",
    request_body = UpdateJobWorkersRequest,
    responses(
        (status = 200, description = "Updated job", body = UpdateJobWorkersResponse),
        (status = 400, description = "Missing required fields or worker count below 1"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Job belongs to another user"),
        (status = 404, description = "Job not found"),
        (status = 500, description = "Internal server error")
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_job_workers(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<UpdateJobWorkersRequest>,
) -> Result<Json<UpdateJobWorkersResponse>> {
    let (Some(job_id), Some(workers_needed)) = (request.job_id, request.new_worker_count) else {
        return Err(Error::BadRequest {
            message: "Missing required fields".to_string(),
        });
    };
    if workers_needed < 1 {
        return Err(Error::BadRequest {
            message: "Worker count must be at least 1".to_string(),
        });
    }

    let not_found = || Error::NotFound {
        resource: "Job".to_string(),
        id: job_id.to_string(),
    };

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let mut jobs = Jobs::new(&mut tx);

    let (owner, _) = jobs.lock_for_reservation(job_id).await?.ok_or_else(not_found)?;
    if owner != current_user.id {
        return Err(Error::InsufficientPermissions {
            action: Operation::UpdateOwn,
            resource: Resource::Jobs,
        });
    }

    let job = jobs.update_workers(job_id, workers_needed).await?.ok_or_else(not_found)?;
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    tracing::info!(job_id = %abbrev_uuid(&job_id), workers_needed, "Job worker count updated");
    Ok(Json(UpdateJobWorkersResponse {
        success: true,
        data: job.into(),
    }))
}

#[utoipa::path(
    get,
    path = "/jobs/{id}/reservation",
    tag = "reservations",
    summary = "Check whether a job is reserved",
    description = "A reservation whose deadline has passed is expired by this call and reported as not reserved.",
    params(("id" = String, Path, description = "Job ID", format = "uuid")),
    responses(
        (status = 200, description = "Reservation status", body = ReservationStatusResponse),
        (status = 401, description = "Unauthorized"),
        (status = 503, description = "Status could not be determined")
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_reservation_status(
    State(state): State<AppState>,
    Path(job_id): Path<JobId>,
    _: CurrentUser,
) -> Result<Json<ReservationStatusResponse>> {
    status_response(&state, job_id).await.map(Json)
}

/// Run a status check and map it to the client representation.
pub(crate) async fn status_response(state: &AppState, job_id: JobId) -> Result<ReservationStatusResponse> {
    let check = check_reservation_status(&state.db, job_id, Utc::now()).await;
    ReservationStatusResponse::from_check(&check).ok_or_else(|| Error::Unavailable {
        message: format!("reservation status of job {job_id}"),
    })
}
