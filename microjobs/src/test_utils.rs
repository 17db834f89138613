//! Fixtures and app construction shared by the test modules.

use crate::api::models::users::{CurrentUser, UserType};
use crate::auth::session::create_session_token;
use crate::config::{BackgroundServicesConfig, Config, DatabaseConfig, PoolSettings, ReservationSweeperConfig};
use crate::db::{
    handlers::{Jobs, Repository, Users},
    models::{
        jobs::{CategoryDBResponse, JobCreateDBRequest, JobDBResponse},
        users::{UserCreateDBRequest, UserDBResponse},
    },
};
use crate::types::{CategoryId, UserId};
use axum_test::TestServer;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

pub async fn create_test_app(pool: PgPool) -> (TestServer, crate::BackgroundServices) {
    let config = create_test_config();

    let app = crate::Application::new_with_pool(config, Some(pool))
        .await
        .expect("Failed to create application");

    app.into_test_server()
}

pub fn create_test_config() -> Config {
    Config {
        database_url: None,
        database: DatabaseConfig {
            // Unused: tests hand the application a pool
            url: "postgres://localhost/unused".to_string(),
            pool: PoolSettings {
                max_connections: 2,
                min_connections: 0,
                ..Default::default()
            },
        },
        host: "127.0.0.1".to_string(),
        port: 0,
        secret_key: Some("test-secret-key-for-testing-only".to_string()),
        cron_secret: Some("test-cron-secret".to_string()),
        enable_otel_export: false,
        background_services: BackgroundServicesConfig {
            reservation_sweeper: ReservationSweeperConfig {
                enabled: false,
                ..Default::default()
            },
        },
        ..Default::default()
    }
}

pub async fn create_test_user(pool: &PgPool, user_type: UserType) -> UserDBResponse {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    let mut users_repo = Users::new(&mut conn);
    let id = Uuid::new_v4().simple();

    let user_create = UserCreateDBRequest {
        email: format!("testuser_{id}@example.com"),
        first_name: "Test".to_string(),
        last_name: format!("User {}", &id.to_string()[..8]),
        location: None,
        user_type,
    };

    users_repo.create(&user_create).await.expect("Failed to create test user")
}

pub async fn create_test_category(pool: &PgPool, name: &str) -> CategoryDBResponse {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    Jobs::new(&mut conn)
        .create_category(name)
        .await
        .expect("Failed to create test category")
}

pub async fn create_test_job(pool: &PgPool, owner: UserId, category_id: Option<CategoryId>) -> JobDBResponse {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    let mut jobs_repo = Jobs::new(&mut conn);

    let job_create = JobCreateDBRequest {
        title: format!("Test job {}", &Uuid::new_v4().simple().to_string()[..8]),
        description: "Write five product descriptions".to_string(),
        budget_min: Decimal::new(1000, 2),
        budget_max: Decimal::new(2500, 2),
        location: None,
        is_remote: true,
        workers_needed: 1,
        category_id,
        user_id: owner,
    };

    jobs_repo.create(&job_create).await.expect("Failed to create test job")
}

/// Enable reservations with the given limits.
pub async fn enable_test_reservations(pool: &PgPool, default_hours: i32, max_concurrent: i32) {
    sqlx::query(
        r#"
        INSERT INTO reservation_settings (id, is_enabled, default_reservation_hours, max_concurrent_reservations)
        VALUES ('default', true, $1, $2)
        ON CONFLICT (id) DO UPDATE SET
            is_enabled = true,
            default_reservation_hours = EXCLUDED.default_reservation_hours,
            max_concurrent_reservations = EXCLUDED.max_concurrent_reservations
        "#,
    )
    .bind(default_hours)
    .bind(max_concurrent)
    .execute(pool)
    .await
    .expect("Failed to enable reservations");
}

/// `Authorization` header value carrying a session token for `user`.
pub fn auth_header(user: &UserDBResponse) -> String {
    let current = CurrentUser {
        id: user.id,
        email: user.email.clone(),
        user_type: user.user_type,
    };
    let token = create_session_token(&current, &create_test_config()).expect("Failed to create session token");
    format!("Bearer {token}")
}
