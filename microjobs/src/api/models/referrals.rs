//! API models for the referral program.

use crate::db::models::referrals::{ReferralDBResponse, ReferralStatus};
use crate::types::{ReferralId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ReferralStatistics {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
    /// Completed referrals count as VIP
    pub vip: usize,
}

/// How a referral is shown in the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum ReferralType {
    #[serde(rename = "VIP")]
    Vip,
    Regular,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReferralEntry {
    #[schema(value_type = String, format = "uuid")]
    pub id: ReferralId,
    #[schema(value_type = String, format = "uuid")]
    pub user_id: UserId,
    pub full_name: String,
    pub email: String,
    pub country: String,
    pub joining_date: DateTime<Utc>,
    pub status: ReferralStatus,
    #[serde(rename = "type")]
    pub referral_type: ReferralType,
}

impl From<ReferralDBResponse> for ReferralEntry {
    fn from(db: ReferralDBResponse) -> Self {
        let referral_type = match db.status {
            ReferralStatus::Completed => ReferralType::Vip,
            ReferralStatus::Pending => ReferralType::Regular,
        };
        Self {
            id: db.id,
            user_id: db.referred_id,
            full_name: format!("{} {}", db.referred_first_name, db.referred_last_name),
            email: db.referred_email,
            country: db.referred_location.unwrap_or_else(|| "Not specified".to_string()),
            joining_date: db.referred_created_at,
            status: db.status,
            referral_type,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReferralsResponse {
    pub referral_code: Option<String>,
    pub statistics: ReferralStatistics,
    pub referrals: Vec<ReferralEntry>,
}

impl ReferralsResponse {
    pub fn new(referral_code: Option<String>, referrals: Vec<ReferralEntry>) -> Self {
        let completed = referrals
            .iter()
            .filter(|r| r.status == ReferralStatus::Completed)
            .count();
        let pending = referrals.iter().filter(|r| r.status == ReferralStatus::Pending).count();

        Self {
            referral_code,
            statistics: ReferralStatistics {
                total: referrals.len(),
                completed,
                pending,
                vip: completed,
            },
            referrals,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReferralCodeResponse {
    pub referral_code: String,
}
