//! Database models for job reservations and the reservation settings singleton.

use crate::types::{JobId, ReservationId, UserId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Fixed key of the single `reservation_settings` row
pub const RESERVATION_SETTINGS_ID: &str = "default";

/// Lifecycle state of a reservation row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "reservation_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    Active,
    Expired,
    Cancelled,
}

#[derive(Debug, Clone, FromRow)]
pub struct Reservation {
    pub id: ReservationId,
    pub job_id: JobId,
    pub user_id: UserId,
    pub status: ReservationStatus,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An active reservation joined with a summary of the reserved job
#[derive(Debug, Clone, FromRow)]
pub struct UserReservationDBResponse {
    pub id: ReservationId,
    pub job_id: JobId,
    pub expires_at: DateTime<Utc>,
    pub status: ReservationStatus,
    pub created_at: DateTime<Utc>,
    pub job_title: String,
    pub budget_max: Decimal,
    pub category_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct ReservationSettingsDBResponse {
    pub id: String,
    pub is_enabled: bool,
    pub default_reservation_hours: i32,
    pub max_concurrent_reservations: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial update of the settings row; `None` keeps the stored value
#[derive(Debug, Clone, Default)]
pub struct ReservationSettingsUpdateDBRequest {
    pub is_enabled: Option<bool>,
    pub default_reservation_hours: Option<i32>,
    pub max_concurrent_reservations: Option<i32>,
}
