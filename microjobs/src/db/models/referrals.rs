//! Database models for referral codes and referrals.

use crate::types::{ReferralId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "referral_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ReferralStatus {
    Pending,
    Completed,
}

#[derive(Debug, Clone, FromRow)]
pub struct ReferralCode {
    pub user_id: UserId,
    pub code: String,
    pub created_at: DateTime<Utc>,
}

/// A referral joined with the referred user's profile
#[derive(Debug, Clone, FromRow)]
pub struct ReferralDBResponse {
    pub id: ReferralId,
    pub status: ReferralStatus,
    pub created_at: DateTime<Utc>,
    pub referred_id: UserId,
    pub referred_first_name: String,
    pub referred_last_name: String,
    pub referred_email: String,
    pub referred_location: Option<String>,
    pub referred_created_at: DateTime<Utc>,
}
