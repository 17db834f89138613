use crate::api::models::favorites::{FavoriteRemovedResponse, FavoriteRequest, FavoriteResponse};
use crate::api::models::users::CurrentUser;
use crate::db::handlers::{Favorites, Jobs, Repository, favorites::FavoriteFilter};
use crate::db::models::favorites::FavoriteCreateDBRequest;
use crate::errors::{Error, Result};
use crate::types::JobId;
use crate::AppState;
use axum::{Json, extract::State, http::StatusCode};

fn required_job_id(request: &FavoriteRequest) -> Result<JobId> {
    request.job_id.ok_or_else(|| Error::BadRequest {
        message: "Job ID is required".to_string(),
    })
}

#[utoipa::path(
    get,
    path = "/favorites",
    tag = "favorites",
    summary = "List the caller's favorite jobs",
    responses(
        (status = 200, description = "Favorite jobs, newest first", body = Vec<FavoriteResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_favorites(State(state): State<AppState>, current_user: CurrentUser) -> Result<Json<Vec<FavoriteResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let favorites = Favorites::new(&mut conn)
        .list(&FavoriteFilter { user_id: current_user.id })
        .await?;

    Ok(Json(favorites.into_iter().map(FavoriteResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/favorites",
    tag = "favorites",
    summary = "Add a job to the caller's favorites",
    request_body = FavoriteRequest,
    responses(
        (status = 201, description = "Favorite created", body = FavoriteResponse),
        (status = 400, description = "Missing job ID"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Job not found"),
        (status = 409, description = "Job is already in favorites"),
        (status = 500, description = "Internal server error")
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn add_favorite(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<FavoriteRequest>,
) -> Result<(StatusCode, Json<FavoriteResponse>)> {
    let job_id = required_job_id(&request)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    if Jobs::new(&mut conn).get_by_id(job_id).await?.is_none() {
        return Err(Error::NotFound {
            resource: "Job".to_string(),
            id: job_id.to_string(),
        });
    }

    // A concurrent duplicate still hits the unique constraint and maps to 409
    let favorite = Favorites::new(&mut conn)
        .create(&FavoriteCreateDBRequest {
            user_id: current_user.id,
            job_id,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(FavoriteResponse::from(favorite))))
}

#[utoipa::path(
    delete,
    path = "/favorites",
    tag = "favorites",
    summary = "Remove a job from the caller's favorites",
    request_body = FavoriteRequest,
    responses(
        (status = 200, description = "Whether a favorite was removed", body = FavoriteRemovedResponse),
        (status = 400, description = "Missing job ID"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn remove_favorite(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<FavoriteRequest>,
) -> Result<Json<FavoriteRemovedResponse>> {
    let job_id = required_job_id(&request)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let removed = Favorites::new(&mut conn).delete(current_user.id, job_id).await?;

    Ok(Json(FavoriteRemovedResponse { removed }))
}
