use async_trait::async_trait;
use chrono::{DateTime, Utc};
use eventor_core::repository::StatsRepository;
use eventor_core::stats::{
    AdminStats, MonthlyBreakdown, RecentTransaction, AVERAGE_RATE_SCALE, DEFAULT_SERVICE_NAME,
    RECENT_TRANSACTIONS, TRAILING_MONTHS,
};
use eventor_core::StoreResult;
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::database::{db_err, parse_column};

pub struct PgStatsRepository {
    pool: PgPool,
}

impl PgStatsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct TotalsRow {
    total_transactions: i64,
    total_commission: Decimal,
    total_revenue: Decimal,
    average_rate: Decimal,
}

#[derive(sqlx::FromRow)]
struct MonthRow {
    month: String,
    transactions: i64,
    revenue: Decimal,
    commission: Decimal,
}

#[derive(sqlx::FromRow)]
struct RecentRow {
    id: i64,
    transaction_id: String,
    booking_id: i64,
    amount: Decimal,
    commission_amount: Decimal,
    provider_amount: Decimal,
    payment_method: String,
    created_at: DateTime<Utc>,
    service_name: Option<String>,
    customer_name: String,
    provider_name: String,
}

#[async_trait]
impl StatsRepository for PgStatsRepository {
    async fn admin_stats(&self) -> StoreResult<AdminStats> {
        let totals: TotalsRow = sqlx::query_as(
            r#"
            SELECT
                COUNT(*) AS total_transactions,
                COALESCE(SUM(commission_amount), 0) AS total_commission,
                COALESCE(SUM(amount), 0) AS total_revenue,
                ROUND(COALESCE(AVG(commission_rate), 0), $1) AS average_rate
            FROM payments
            WHERE status = 'completed'
            "#,
        )
        .bind(AVERAGE_RATE_SCALE as i32)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;

        let months: Vec<MonthRow> = sqlx::query_as(
            r#"
            SELECT
                to_char(date_trunc('month', created_at AT TIME ZONE 'UTC'), 'YYYY-MM') AS month,
                COUNT(*) AS transactions,
                COALESCE(SUM(amount), 0) AS revenue,
                COALESCE(SUM(commission_amount), 0) AS commission
            FROM payments
            WHERE status = 'completed'
              AND created_at >= (date_trunc('month', NOW() AT TIME ZONE 'UTC') AT TIME ZONE 'UTC')
                                 - make_interval(months => $1)
            GROUP BY 1
            ORDER BY 1 DESC
            "#,
        )
        .bind(TRAILING_MONTHS - 1)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        let recent: Vec<RecentRow> = sqlx::query_as(
            r#"
            SELECT
                p.id, p.transaction_id, p.booking_id, p.amount, p.commission_amount,
                p.provider_amount, p.payment_method, p.created_at,
                s.name AS service_name,
                u.first_name || ' ' || u.last_name AS customer_name,
                COALESCE(pp.business_name, '') AS provider_name
            FROM payments p
            JOIN bookings b ON b.id = p.booking_id
            JOIN users u ON u.id = b.seeker_id
            LEFT JOIN services s ON s.id = b.service_id
            LEFT JOIN provider_profiles pp ON pp.id = b.provider_id
            WHERE p.status = 'completed'
            ORDER BY p.created_at DESC, p.id DESC
            LIMIT $1
            "#,
        )
        .bind(RECENT_TRANSACTIONS as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        let recent_transactions = recent
            .into_iter()
            .map(|r| {
                Ok(RecentTransaction {
                    id: r.id,
                    transaction_id: r.transaction_id,
                    booking_id: r.booking_id,
                    amount: r.amount,
                    commission_amount: r.commission_amount,
                    provider_amount: r.provider_amount,
                    payment_method: parse_column("payment_method", &r.payment_method)?,
                    created_at: r.created_at,
                    service_name: r.service_name.unwrap_or_else(|| DEFAULT_SERVICE_NAME.to_string()),
                    customer_name: r.customer_name,
                    provider_name: r.provider_name,
                })
            })
            .collect::<StoreResult<Vec<_>>>()?;

        Ok(AdminStats {
            total_transactions: totals.total_transactions,
            total_commission: totals.total_commission,
            total_revenue: totals.total_revenue,
            average_rate: totals.average_rate.normalize(),
            monthly_breakdown: months
                .into_iter()
                .map(|m| MonthlyBreakdown {
                    month: m.month,
                    transactions: m.transactions,
                    revenue: m.revenue,
                    commission: m.commission,
                })
                .collect(),
            recent_transactions,
        })
    }
}
