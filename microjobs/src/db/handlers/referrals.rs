//! Database repository for referral codes and referrals.

use sqlx::PgConnection;
use tracing::instrument;

use crate::db::{
    errors::Result,
    models::referrals::{ReferralCode, ReferralDBResponse, ReferralStatus},
};
use crate::types::{ReferralId, UserId, abbrev_uuid};

pub struct Referrals<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Referrals<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn get_code(&mut self, user_id: UserId) -> Result<Option<ReferralCode>> {
        let code = sqlx::query_as::<_, ReferralCode>("SELECT * FROM referral_codes WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(code)
    }

    /// Store `code` for the user unless they already have one, and return the stored code.
    ///
    /// A collision with another user's code surfaces as a unique violation.
    #[instrument(skip(self, code), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn create_code(&mut self, user_id: UserId, code: &str) -> Result<ReferralCode> {
        let code = sqlx::query_as::<_, ReferralCode>(
            r#"
            WITH inserted AS (
                INSERT INTO referral_codes (user_id, code)
                VALUES ($1, $2)
                ON CONFLICT (user_id) DO NOTHING
                RETURNING *
            )
            SELECT * FROM inserted
            UNION ALL
            SELECT * FROM referral_codes WHERE user_id = $1 AND NOT EXISTS (SELECT 1 FROM inserted)
            "#,
        )
        .bind(user_id)
        .bind(code)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(code)
    }

    #[instrument(skip(self), fields(referrer = %abbrev_uuid(&referrer_id), referred = %abbrev_uuid(&referred_id)), err)]
    pub async fn create_referral(
        &mut self,
        referrer_id: UserId,
        referred_id: UserId,
        status: ReferralStatus,
    ) -> Result<ReferralId> {
        let id = sqlx::query_scalar::<_, ReferralId>(
            "INSERT INTO referrals (referrer_id, referred_id, status) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(referrer_id)
        .bind(referred_id)
        .bind(status)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(id)
    }

    /// Referrals made by a user, newest first, joined with the referred user's profile.
    #[instrument(skip(self), fields(referrer = %abbrev_uuid(&referrer_id)), err)]
    pub async fn list_for_referrer(&mut self, referrer_id: UserId) -> Result<Vec<ReferralDBResponse>> {
        let referrals = sqlx::query_as::<_, ReferralDBResponse>(
            r#"
            SELECT r.id, r.status, r.created_at,
                   u.id AS referred_id, u.first_name AS referred_first_name, u.last_name AS referred_last_name,
                   u.email AS referred_email, u.location AS referred_location, u.created_at AS referred_created_at
            FROM referrals r
            JOIN users u ON u.id = r.referred_id
            WHERE r.referrer_id = $1
            ORDER BY r.created_at DESC
            "#,
        )
        .bind(referrer_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(referrals)
    }
}
