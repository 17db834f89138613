//! Database repository for admin commission (fee) settings.

use sqlx::PgConnection;
use tracing::instrument;

use crate::db::{
    errors::Result,
    models::fee_settings::{FeeSettingDBResponse, FeeSettingUpsertDBRequest},
};

pub struct FeeSettings<'c> {
    db: &'c mut PgConnection,
}

impl<'c> FeeSettings<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self), err)]
    pub async fn list(&mut self) -> Result<Vec<FeeSettingDBResponse>> {
        let settings = sqlx::query_as::<_, FeeSettingDBResponse>("SELECT * FROM admin_fee_settings ORDER BY fee_type")
            .fetch_all(&mut *self.db)
            .await?;

        Ok(settings)
    }

    /// Insert or fully replace the settings of one fee type.
    #[instrument(skip(self, request), fields(fee_type = %request.fee_type), err)]
    pub async fn upsert(&mut self, request: &FeeSettingUpsertDBRequest) -> Result<FeeSettingDBResponse> {
        let setting = sqlx::query_as::<_, FeeSettingDBResponse>(
            r#"
            INSERT INTO admin_fee_settings (fee_type, fee_percentage, fee_fixed, minimum_fee, maximum_fee, is_active)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (fee_type) DO UPDATE SET
                fee_percentage = EXCLUDED.fee_percentage,
                fee_fixed = EXCLUDED.fee_fixed,
                minimum_fee = EXCLUDED.minimum_fee,
                maximum_fee = EXCLUDED.maximum_fee,
                is_active = EXCLUDED.is_active,
                updated_at = now()
            RETURNING *
            "#,
        )
        .bind(&request.fee_type)
        .bind(request.fee_percentage)
        .bind(request.fee_fixed)
        .bind(request.minimum_fee)
        .bind(request.maximum_fee)
        .bind(request.is_active)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(setting)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use sqlx::PgPool;

    fn request(fee_type: &str, percentage: i64) -> FeeSettingUpsertDBRequest {
        FeeSettingUpsertDBRequest {
            fee_type: fee_type.to_string(),
            fee_percentage: Decimal::new(percentage, 0),
            fee_fixed: Decimal::ZERO,
            minimum_fee: Decimal::ZERO,
            maximum_fee: None,
            is_active: true,
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_upsert_replaces_and_lists_in_order(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = FeeSettings::new(&mut conn);

        repo.upsert(&request("withdrawal", 2)).await.unwrap();
        repo.upsert(&request("job_posting", 5)).await.unwrap();
        let updated = repo.upsert(&request("job_posting", 7)).await.unwrap();
        assert_eq!(updated.fee_percentage, Decimal::new(7, 0));

        let all = repo.list().await.unwrap();
        assert_eq!(
            all.iter().map(|s| s.fee_type.as_str()).collect::<Vec<_>>(),
            vec!["job_posting", "withdrawal"]
        );
    }
}
