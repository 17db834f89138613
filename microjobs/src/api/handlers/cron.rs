use crate::api::models::reservations::SweepResponse;
use crate::auth::current_user::CronCaller;
use crate::errors::Result;
use crate::reservations::sweep_expired;
use crate::AppState;
use axum::{Json, extract::State};
use chrono::Utc;

#[utoipa::path(
    post,
    path = "/cron/expire-reservations",
    tag = "cron",
    summary = "Expire all overdue reservations (scheduler entry point)",
    description = "Also served on GET. Authenticated with `Authorization: Bearer <cron_secret>`.",
    responses(
        (status = 200, description = "Sweep result", body = SweepResponse),
        (status = 401, description = "Missing or wrong cron secret"),
        (status = 500, description = "Internal server error")
    ),
    security(("CronSecret" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn expire_reservations(State(state): State<AppState>, _: CronCaller) -> Result<Json<SweepResponse>> {
    let released = sweep_expired(&state.db, Utc::now()).await?;
    tracing::info!(released, "Cron reservation sweep finished");

    Ok(Json(SweepResponse { success: true, released }))
}

#[cfg(test)]
mod tests {
    use crate::api::models::reservations::SweepResponse;
    use crate::api::models::users::UserType;
    use crate::db::handlers::Jobs;
    use crate::test_utils::*;
    use axum::http::StatusCode;
    use chrono::{Duration, Utc};
    use sqlx::PgPool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_cron_requires_secret(pool: PgPool) {
        let (app, _bg_services) = create_test_app(pool.clone()).await;
        let admin = create_test_user(&pool, UserType::Admin).await;

        app.get("/api/cron/expire-reservations")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
        app.get("/api/cron/expire-reservations")
            .add_header("authorization", "Bearer wrong-secret")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
        // A user session is not the cron secret
        app.post("/api/cron/expire-reservations")
            .add_header("authorization", auth_header(&admin))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_cron_sweeps_overdue_jobs(pool: PgPool) {
        let (app, _bg_services) = create_test_app(pool.clone()).await;
        let owner = create_test_user(&pool, UserType::Employer).await;
        let worker = create_test_user(&pool, UserType::Worker).await;
        let job = create_test_job(&pool, owner.id, None).await;

        let mut conn = pool.acquire().await.unwrap();
        Jobs::new(&mut conn)
            .mark_reserved(job.id, worker.id, Utc::now() - Duration::seconds(30))
            .await
            .unwrap();

        let sweep: SweepResponse = app
            .post("/api/cron/expire-reservations")
            .add_header("authorization", "Bearer test-cron-secret")
            .await
            .json();
        assert!(sweep.success);
        assert_eq!(sweep.released, 1);
    }
}
