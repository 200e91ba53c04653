use async_trait::async_trait;
use chrono::{DateTime, Utc};
use eventor_core::commission::{CommissionSetting, NewCommissionSetting};
use eventor_core::repository::CommissionRepository;
use eventor_core::StoreResult;
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::database::db_err;

pub struct PgCommissionRepository {
    pool: PgPool,
}

impl PgCommissionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct CommissionSettingRow {
    id: i64,
    rate: Decimal,
    payment_method: String,
    account_details: String,
    created_at: DateTime<Utc>,
}

impl From<CommissionSettingRow> for CommissionSetting {
    fn from(row: CommissionSettingRow) -> Self {
        CommissionSetting {
            id: row.id,
            rate: row.rate.normalize(),
            payment_method: row.payment_method,
            account_details: row.account_details,
            created_at: Some(row.created_at),
        }
    }
}

#[async_trait]
impl CommissionRepository for PgCommissionRepository {
    async fn active_setting(&self) -> StoreResult<Option<CommissionSetting>> {
        let row: Option<CommissionSettingRow> = sqlx::query_as(
            r#"
            SELECT s.id, s.rate, s.payment_method, s.account_details, s.created_at
            FROM active_commission_setting a
            JOIN commission_settings s ON s.id = a.setting_id
            "#,
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(row.map(CommissionSetting::from))
    }

    async fn append_setting(&self, setting: NewCommissionSetting) -> StoreResult<CommissionSetting> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let row: CommissionSettingRow = sqlx::query_as(
            r#"
            INSERT INTO commission_settings (rate, payment_method, account_details)
            VALUES ($1, $2, $3)
            RETURNING id, rate, payment_method, account_details, created_at
            "#,
        )
        .bind(setting.rate)
        .bind(&setting.payment_method)
        .bind(&setting.account_details)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_err)?;

        sqlx::query(
            r#"
            INSERT INTO active_commission_setting (singleton, setting_id, updated_at)
            VALUES (TRUE, $1, NOW())
            ON CONFLICT (singleton) DO UPDATE
            SET setting_id = EXCLUDED.setting_id, updated_at = NOW()
            "#,
        )
        .bind(row.id)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;

        Ok(row.into())
    }
}
