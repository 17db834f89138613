//! Access to the reservation settings singleton.

use sqlx::PgConnection;
use tracing::instrument;

use crate::db::handlers::Reservations;
use crate::db::models::reservations::ReservationSettingsUpdateDBRequest;
use crate::errors::{Error, Result};

pub const DEFAULT_IS_ENABLED: bool = false;
pub const DEFAULT_RESERVATION_HOURS: i32 = 1;
pub const DEFAULT_MAX_CONCURRENT_RESERVATIONS: i32 = 5;

/// Effective reservation settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReservationSettings {
    pub is_enabled: bool,
    pub default_reservation_hours: i32,
    pub max_concurrent_reservations: i32,
}

impl Default for ReservationSettings {
    fn default() -> Self {
        Self {
            is_enabled: DEFAULT_IS_ENABLED,
            default_reservation_hours: DEFAULT_RESERVATION_HOURS,
            max_concurrent_reservations: DEFAULT_MAX_CONCURRENT_RESERVATIONS,
        }
    }
}

/// Read the settings row. A missing row yields [`ReservationSettings::default`]; any
/// database error is returned to the caller.
#[instrument(skip(conn), err)]
pub async fn get_reservation_settings(conn: &mut PgConnection) -> Result<ReservationSettings> {
    let row = Reservations::new(conn).get_settings().await?;

    Ok(row
        .map(|row| ReservationSettings {
            is_enabled: row.is_enabled,
            default_reservation_hours: row.default_reservation_hours,
            max_concurrent_reservations: row.max_concurrent_reservations,
        })
        .unwrap_or_default())
}

/// Apply a partial update and return the stored settings.
#[instrument(skip(conn), err)]
pub async fn update_reservation_settings(
    conn: &mut PgConnection,
    update: &ReservationSettingsUpdateDBRequest,
) -> Result<ReservationSettings> {
    if update.default_reservation_hours.is_some_and(|h| h < 1) {
        return Err(Error::BadRequest {
            message: "defaultReservationHours must be at least 1".to_string(),
        });
    }
    if update.max_concurrent_reservations.is_some_and(|m| m < 1) {
        return Err(Error::BadRequest {
            message: "maxConcurrentReservations must be at least 1".to_string(),
        });
    }

    let defaults = ReservationSettings::default();
    let defaults = ReservationSettingsUpdateDBRequest {
        is_enabled: Some(defaults.is_enabled),
        default_reservation_hours: Some(defaults.default_reservation_hours),
        max_concurrent_reservations: Some(defaults.max_concurrent_reservations),
    };
    let row = Reservations::new(conn).upsert_settings(update, &defaults).await?;

    Ok(ReservationSettings {
        is_enabled: row.is_enabled,
        default_reservation_hours: row.default_reservation_hours,
        max_concurrent_reservations: row.max_concurrent_reservations,
    })
}
