use crate::api::models::referrals::{ReferralCodeResponse, ReferralEntry, ReferralsResponse};
use crate::api::models::users::CurrentUser;
use crate::db::errors::DbError;
use crate::db::handlers::Referrals;
use crate::errors::{Error, Result};
use crate::AppState;
use axum::{Json, extract::State};
use rand::prelude::RngExt;
use rand::rng;

const REFERRAL_CODE_LENGTH: usize = 8;
const REFERRAL_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
/// Attempts before giving up on a code that collides with another user's
const REFERRAL_CODE_ATTEMPTS: usize = 5;

/// Random uppercase alphanumeric referral code
fn generate_referral_code() -> String {
    let mut rng = rng();
    (0..REFERRAL_CODE_LENGTH)
        .map(|_| REFERRAL_CODE_ALPHABET[rng.random_range(0..REFERRAL_CODE_ALPHABET.len())] as char)
        .collect()
}

#[utoipa::path(
    get,
    path = "/referrals",
    tag = "referrals",
    summary = "Get the caller's referral code, statistics and referred users",
    responses(
        (status = 200, description = "Referral overview", body = ReferralsResponse),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_referrals(State(state): State<AppState>, current_user: CurrentUser) -> Result<Json<ReferralsResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Referrals::new(&mut conn);

    let code = repo.get_code(current_user.id).await?.map(|c| c.code);
    let referrals = repo.list_for_referrer(current_user.id).await?;

    Ok(Json(ReferralsResponse::new(
        code,
        referrals.into_iter().map(ReferralEntry::from).collect(),
    )))
}

#[utoipa::path(
    post,
    path = "/referrals/generate-code",
    tag = "referrals",
    summary = "Get or create the caller's referral code",
    responses(
        (status = 200, description = "The caller's referral code", body = ReferralCodeResponse),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn generate_code(State(state): State<AppState>, current_user: CurrentUser) -> Result<Json<ReferralCodeResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Referrals::new(&mut conn);

    for _ in 0..REFERRAL_CODE_ATTEMPTS {
        match repo.create_code(current_user.id, &generate_referral_code()).await {
            Ok(code) => return Ok(Json(ReferralCodeResponse { referral_code: code.code })),
            Err(DbError::UniqueViolation { .. }) => {
                tracing::debug!("Referral code collision, retrying");
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(Error::Internal {
        operation: "generate a unique referral code".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::users::UserType;
    use crate::db::models::referrals::ReferralStatus;
    use crate::test_utils::*;
    use axum::http::StatusCode;
    use sqlx::PgPool;

    #[test]
    fn test_generated_code_shape() {
        let code = generate_referral_code();
        assert_eq!(code.len(), 8);
        assert!(code.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_generate_code_is_stable(pool: PgPool) {
        let (app, _bg_services) = create_test_app(pool.clone()).await;
        let user = create_test_user(&pool, UserType::Worker).await;

        let first: ReferralCodeResponse = app
            .post("/api/referrals/generate-code")
            .add_header("authorization", auth_header(&user))
            .await
            .json();
        let second: ReferralCodeResponse = app
            .post("/api/referrals/generate-code")
            .add_header("authorization", auth_header(&user))
            .await
            .json();
        assert_eq!(first.referral_code, second.referral_code);

        let overview: ReferralsResponse = app
            .get("/api/referrals")
            .add_header("authorization", auth_header(&user))
            .await
            .json();
        assert_eq!(overview.referral_code, Some(first.referral_code));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_referral_overview(pool: PgPool) {
        let (app, _bg_services) = create_test_app(pool.clone()).await;
        let referrer = create_test_user(&pool, UserType::Worker).await;
        let pending = create_test_user(&pool, UserType::Worker).await;
        let completed = create_test_user(&pool, UserType::Employer).await;

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Referrals::new(&mut conn);
        repo.create_referral(referrer.id, pending.id, ReferralStatus::Pending)
            .await
            .unwrap();
        repo.create_referral(referrer.id, completed.id, ReferralStatus::Completed)
            .await
            .unwrap();

        let response = app.get("/api/referrals").add_header("authorization", auth_header(&referrer)).await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();

        assert_eq!(body["referralCode"], serde_json::Value::Null);
        assert_eq!(body["statistics"]["total"], 2);
        assert_eq!(body["statistics"]["completed"], 1);
        assert_eq!(body["statistics"]["pending"], 1);
        assert_eq!(body["statistics"]["vip"], 1);

        let entries = body["referrals"].as_array().unwrap();
        let vip = entries.iter().find(|e| e["type"] == "VIP").unwrap();
        assert_eq!(vip["userId"], completed.id.to_string());
        assert_eq!(vip["fullName"], completed.full_name());
        assert_eq!(vip["country"], "Not specified");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_referrals_require_auth(pool: PgPool) {
        let (app, _bg_services) = create_test_app(pool).await;
        app.get("/api/referrals").await.assert_status(StatusCode::UNAUTHORIZED);
    }
}
