//! OpenAPI documentation for the `/api` surface.
//!
//! [`ApiDoc`] collects every annotated handler; the document is rendered with Scalar at
//! `/docs` and served as JSON at `/api-docs/openapi.json`.

use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

use crate::api;

/// Bearer session tokens for users, and the shared secret for the cron hook.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.security_schemes.insert(
                "BearerAuth".to_string(),
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some(
                            "Session token authentication. Include the token in the `Authorization` header:\n\n\
                            ```\nAuthorization: Bearer YOUR_SESSION_TOKEN\n```",
                        ))
                        .build(),
                ),
            );
            components.security_schemes.insert(
                "CronSecret".to_string(),
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .description(Some("The `cron_secret` from the server configuration."))
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    servers(
        (url = "/api", description = "Marketplace API")
    ),
    modifiers(&SecurityAddon),
    paths(
        api::handlers::jobs::list_jobs,
        api::handlers::jobs::update_job_workers,
        api::handlers::jobs::get_reservation_status,
        api::handlers::reservations::reserve,
        api::handlers::reservations::cancel,
        api::handlers::reservations::check_expiry,
        api::handlers::reservations::list_mine,
        api::handlers::reservations::cleanup,
        api::handlers::favorites::list_favorites,
        api::handlers::favorites::add_favorite,
        api::handlers::favorites::remove_favorite,
        api::handlers::referrals::get_referrals,
        api::handlers::referrals::generate_code,
        api::handlers::commission::get_commission_settings,
        api::handlers::commission::update_commission_settings,
        api::handlers::reservation_settings::get_settings,
        api::handlers::reservation_settings::update_settings,
        api::handlers::cron::expire_reservations,
    ),
    components(
        schemas(
            api::models::users::UserType,
            api::models::jobs::JobResponse,
            api::models::jobs::UpdateJobWorkersRequest,
            api::models::jobs::UpdateJobWorkersResponse,
            api::models::reservations::JobIdRequest,
            api::models::reservations::ReservationResponse,
            api::models::reservations::UserReservationResponse,
            api::models::reservations::ReservationStatusResponse,
            api::models::reservations::ReservationSettingsResponse,
            api::models::reservations::ReservationSettingsUpdate,
            api::models::reservations::CancelReservationResponse,
            api::models::reservations::SweepResponse,
            api::models::favorites::FavoriteRequest,
            api::models::favorites::FavoriteResponse,
            api::models::favorites::FavoriteRemovedResponse,
            api::models::referrals::ReferralsResponse,
            api::models::referrals::ReferralStatistics,
            api::models::referrals::ReferralEntry,
            api::models::referrals::ReferralType,
            api::models::referrals::ReferralCodeResponse,
            api::models::commission::FeeSettingResponse,
            api::models::commission::CommissionSettingsResponse,
            api::models::commission::FeeSettingValues,
            api::models::commission::CommissionUpdate,
            api::models::commission::CommissionUpdateResponse,
            crate::db::models::reservations::ReservationStatus,
        )
    ),
    tags(
        (name = "jobs", description = "Job listings"),
        (name = "reservations", description = "Time-boxed job reservations. A reservation holds a job for one worker \
until its deadline; an overdue reservation is expired the next time anyone looks at the job, or by the periodic sweep."),
        (name = "favorites", description = "The caller's favorite jobs"),
        (name = "referrals", description = "Referral codes and referral statistics"),
        (name = "admin", description = "Marketplace administration. Requires an admin account."),
        (name = "cron", description = "Hooks for an external scheduler"),
    ),
    info(
        title = "Microjobs API",
        description = "Marketplace backend for microjobs, favorites, referrals and time-boxed job reservations.",
    )
)]
pub struct ApiDoc;
