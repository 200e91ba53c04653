use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use eventor_core::booking::{Booking, BookingFilter, BookingStatus, NewBooking};
use eventor_core::repository::BookingRepository;
use eventor_core::{StoreError, StoreResult};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::database::{db_err, parse_column};

pub struct PgBookingRepository {
    pool: PgPool,
}

impl PgBookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const BOOKING_COLUMNS: &str = "id, seeker_id, provider_id, service_id, event_date, event_time, location, guest_count, special_requirements, total_amount, status, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct BookingRow {
    id: i64,
    seeker_id: i64,
    provider_id: i64,
    service_id: Option<i64>,
    event_date: NaiveDate,
    event_time: String,
    location: String,
    guest_count: i32,
    special_requirements: Option<String>,
    total_amount: Decimal,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = StoreError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        Ok(Booking {
            id: row.id,
            seeker_id: row.seeker_id,
            provider_id: row.provider_id,
            service_id: row.service_id,
            event_date: row.event_date,
            event_time: row.event_time,
            location: row.location,
            guest_count: row.guest_count,
            special_requirements: row.special_requirements,
            total_amount: row.total_amount,
            status: parse_column("status", &row.status)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl BookingRepository for PgBookingRepository {
    async fn create_booking(&self, booking: NewBooking) -> StoreResult<Booking> {
        let row: BookingRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO bookings (seeker_id, provider_id, service_id, event_date, event_time, location, guest_count, special_requirements, total_amount, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {}
            "#,
            BOOKING_COLUMNS
        ))
        .bind(booking.seeker_id)
        .bind(booking.provider_id)
        .bind(booking.service_id)
        .bind(booking.event_date)
        .bind(&booking.event_time)
        .bind(&booking.location)
        .bind(booking.guest_count)
        .bind(&booking.special_requirements)
        .bind(booking.total_amount)
        .bind(BookingStatus::Pending.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;

        Booking::try_from(row)
    }

    async fn get_booking(&self, id: i64) -> StoreResult<Option<Booking>> {
        let row: Option<BookingRow> = sqlx::query_as(&format!(
            "SELECT {} FROM bookings WHERE id = $1",
            BOOKING_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.map(Booking::try_from).transpose()
    }

    async fn list_bookings(&self, filter: BookingFilter) -> StoreResult<Vec<Booking>> {
        let (column, id) = match filter {
            BookingFilter::Seeker(id) => ("seeker_id", id),
            BookingFilter::Provider(id) => ("provider_id", id),
        };

        let rows: Vec<BookingRow> = sqlx::query_as(&format!(
            "SELECT {} FROM bookings WHERE {} = $1 ORDER BY created_at DESC, id DESC",
            BOOKING_COLUMNS, column
        ))
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.into_iter().map(Booking::try_from).collect()
    }
}
