use async_trait::async_trait;
use chrono::{DateTime, Utc};
use eventor_core::payment::{NewPayment, Payment};
use eventor_core::repository::PaymentRepository;
use eventor_core::{StoreError, StoreResult};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use tracing::warn;

use crate::database::{db_err, parse_column};

pub struct PgPaymentRepository {
    pool: PgPool,
}

impl PgPaymentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

pub(crate) const PAYMENT_COLUMNS: &str = "id, booking_id, amount, currency, payment_method, status, transaction_id, commission_rate, commission_amount, provider_amount, created_at";

#[derive(sqlx::FromRow)]
pub(crate) struct PaymentRow {
    id: i64,
    booking_id: i64,
    amount: Decimal,
    currency: String,
    payment_method: String,
    status: String,
    transaction_id: String,
    commission_rate: Decimal,
    commission_amount: Decimal,
    provider_amount: Decimal,
    created_at: DateTime<Utc>,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = StoreError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        Ok(Payment {
            id: row.id,
            booking_id: row.booking_id,
            amount: row.amount,
            currency: row.currency,
            payment_method: parse_column("payment_method", &row.payment_method)?,
            status: parse_column("status", &row.status)?,
            transaction_id: row.transaction_id,
            commission_rate: row.commission_rate,
            commission_amount: row.commission_amount,
            provider_amount: row.provider_amount,
            created_at: row.created_at,
        })
    }
}

impl PgPaymentRepository {
    async fn insert(conn: &mut PgConnection, payment: &NewPayment) -> StoreResult<Payment> {
        let row: PaymentRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO payments (booking_id, amount, currency, payment_method, status, transaction_id, commission_rate, commission_amount, provider_amount)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {}
            "#,
            PAYMENT_COLUMNS
        ))
        .bind(payment.booking_id)
        .bind(payment.amount)
        .bind(&payment.currency)
        .bind(payment.payment_method.as_str())
        .bind(payment.status.as_str())
        .bind(&payment.transaction_id)
        .bind(payment.commission_rate)
        .bind(payment.commission_amount)
        .bind(payment.provider_amount)
        .fetch_one(&mut *conn)
        .await
        .map_err(db_err)?;

        Payment::try_from(row)
    }
}

#[async_trait]
impl PaymentRepository for PgPaymentRepository {
    async fn record_completed(&self, payment: NewPayment) -> StoreResult<Payment> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        // Row lock on the booking serializes concurrent charges for it.
        let confirmed = sqlx::query(
            "UPDATE bookings SET status = 'confirmed', updated_at = NOW() WHERE id = $1 AND status = 'pending'",
        )
        .bind(payment.booking_id)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        if confirmed.rows_affected() != 1 {
            tx.rollback().await.map_err(db_err)?;
            warn!(booking_id = payment.booking_id, "Charge approved for a booking that is no longer pending");
            return Err(StoreError::Conflict(format!(
                "booking {} is not awaiting payment",
                payment.booking_id
            )));
        }

        let stored = Self::insert(&mut *tx, &payment).await?;

        tx.commit().await.map_err(db_err)?;

        Ok(stored)
    }

    async fn record_failed(&self, payment: NewPayment) -> StoreResult<Payment> {
        let mut conn = self.pool.acquire().await.map_err(db_err)?;
        Self::insert(&mut conn, &payment).await
    }

    async fn payments_for_booking(&self, booking_id: i64) -> StoreResult<Vec<Payment>> {
        let rows: Vec<PaymentRow> = sqlx::query_as(&format!(
            "SELECT {} FROM payments WHERE booking_id = $1 ORDER BY created_at DESC, id DESC",
            PAYMENT_COLUMNS
        ))
        .bind(booking_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.into_iter().map(Payment::try_from).collect()
    }
}
