//! API models for job reservations and reservation settings.

use crate::db::models::reservations::{Reservation, ReservationStatus, UserReservationDBResponse};
use crate::reservations::status::{ReservationCheck, format_time_left};
use crate::reservations::settings::ReservationSettings;
use crate::types::{JobId, ReservationId, UserId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Body of the reserve, cancel and check-expiry endpoints
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JobIdRequest {
    #[schema(value_type = Option<String>, format = "uuid")]
    pub job_id: Option<JobId>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReservationResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: ReservationId,
    #[schema(value_type = String, format = "uuid")]
    pub job_id: JobId,
    #[schema(value_type = String, format = "uuid")]
    pub user_id: UserId,
    pub status: ReservationStatus,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<Reservation> for ReservationResponse {
    fn from(db: Reservation) -> Self {
        Self {
            id: db.id,
            job_id: db.job_id,
            user_id: db.user_id,
            status: db.status,
            expires_at: db.expires_at,
            created_at: db.created_at,
        }
    }
}

/// One of the caller's active reservations, with a summary of the job
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserReservationResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: ReservationId,
    #[schema(value_type = String, format = "uuid")]
    pub job_id: JobId,
    pub job_title: String,
    #[schema(value_type = String)]
    pub budget_max: Decimal,
    pub category_name: Option<String>,
    pub status: ReservationStatus,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub time_left: String,
}

impl UserReservationResponse {
    pub fn from_db(db: UserReservationDBResponse, now: DateTime<Utc>) -> Self {
        Self {
            id: db.id,
            job_id: db.job_id,
            job_title: db.job_title,
            budget_max: db.budget_max,
            category_name: db.category_name,
            status: db.status,
            expires_at: db.expires_at,
            created_at: db.created_at,
            time_left: format_time_left(db.expires_at - now),
        }
    }
}

/// Reservation status of a job as seen by the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReservationStatusResponse {
    pub is_reserved: bool,
    /// True when this check found the reservation overdue and expired it
    pub expired: bool,
    pub time_left_ms: i64,
    pub time_left: String,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub reserved_by: Option<UserId>,
}

impl ReservationStatusResponse {
    /// `None` for [`ReservationCheck::Unavailable`], which has no client representation.
    pub fn from_check(check: &ReservationCheck) -> Option<Self> {
        let response = match check {
            ReservationCheck::NotReserved => Self {
                is_reserved: false,
                expired: false,
                time_left_ms: 0,
                time_left: String::new(),
                reserved_by: None,
            },
            ReservationCheck::Expired => Self {
                is_reserved: false,
                expired: true,
                time_left_ms: 0,
                time_left: format_time_left(chrono::Duration::zero()),
                reserved_by: None,
            },
            ReservationCheck::Reserved { remaining, reserved_by } => Self {
                is_reserved: true,
                expired: false,
                time_left_ms: remaining.num_milliseconds(),
                time_left: format_time_left(*remaining),
                reserved_by: *reserved_by,
            },
            ReservationCheck::Unavailable { .. } => return None,
        };
        Some(response)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReservationSettingsResponse {
    pub is_enabled: bool,
    pub default_reservation_hours: i32,
    pub max_concurrent_reservations: i32,
}

impl From<ReservationSettings> for ReservationSettingsResponse {
    fn from(settings: ReservationSettings) -> Self {
        Self {
            is_enabled: settings.is_enabled,
            default_reservation_hours: settings.default_reservation_hours,
            max_concurrent_reservations: settings.max_concurrent_reservations,
        }
    }
}

/// Partial update of the reservation settings; omitted fields keep their value
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReservationSettingsUpdate {
    pub is_enabled: Option<bool>,
    pub default_reservation_hours: Option<i32>,
    pub max_concurrent_reservations: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CancelReservationResponse {
    pub success: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SweepResponse {
    pub success: bool,
    /// Number of jobs released by this sweep
    pub released: u64,
}
