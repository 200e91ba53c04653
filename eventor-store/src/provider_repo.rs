use async_trait::async_trait;
use chrono::{DateTime, Utc};
use eventor_core::directory::{NewService, ProviderProfile, ProviderProfileUpdate, ProviderSearch, Service};
use eventor_core::repository::ProviderRepository;
use eventor_core::StoreResult;
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::database::db_err;

pub struct PgProviderRepository {
    pool: PgPool,
}

impl PgProviderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

pub(crate) const PROFILE_COLUMNS: &str = "id, user_id, business_name, category, bio, location_city, location_region, hourly_rate, daily_rate, verified, response_time_hours, created_at";

const SERVICE_COLUMNS: &str = "id, provider_id, name, description, price, category, created_at";

#[derive(sqlx::FromRow)]
pub(crate) struct ProviderProfileRow {
    id: i64,
    user_id: i64,
    business_name: String,
    category: String,
    bio: String,
    location_city: String,
    location_region: String,
    hourly_rate: Option<Decimal>,
    daily_rate: Option<Decimal>,
    verified: bool,
    response_time_hours: i32,
    created_at: DateTime<Utc>,
}

impl From<ProviderProfileRow> for ProviderProfile {
    fn from(row: ProviderProfileRow) -> Self {
        ProviderProfile {
            id: row.id,
            user_id: row.user_id,
            business_name: row.business_name,
            category: row.category,
            bio: row.bio,
            location_city: row.location_city,
            location_region: row.location_region,
            hourly_rate: row.hourly_rate,
            daily_rate: row.daily_rate,
            verified: row.verified,
            response_time_hours: row.response_time_hours,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ServiceRow {
    id: i64,
    provider_id: i64,
    name: String,
    description: String,
    price: Option<Decimal>,
    category: String,
    created_at: DateTime<Utc>,
}

impl From<ServiceRow> for Service {
    fn from(row: ServiceRow) -> Self {
        Service {
            id: row.id,
            provider_id: row.provider_id,
            name: row.name,
            description: row.description,
            price: row.price,
            category: row.category,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl ProviderRepository for PgProviderRepository {
    async fn get_profile(&self, id: i64) -> StoreResult<Option<ProviderProfile>> {
        let row: Option<ProviderProfileRow> = sqlx::query_as(&format!(
            "SELECT {} FROM provider_profiles WHERE id = $1",
            PROFILE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(row.map(ProviderProfile::from))
    }

    async fn profile_for_user(&self, user_id: i64) -> StoreResult<Option<ProviderProfile>> {
        let row: Option<ProviderProfileRow> = sqlx::query_as(&format!(
            "SELECT {} FROM provider_profiles WHERE user_id = $1",
            PROFILE_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(row.map(ProviderProfile::from))
    }

    async fn search_profiles(&self, search: &ProviderSearch) -> StoreResult<Vec<ProviderProfile>> {
        let rows: Vec<ProviderProfileRow> = sqlx::query_as(&format!(
            r#"
            SELECT {} FROM provider_profiles
            WHERE ($1::text IS NULL OR lower(category) = lower($1))
              AND ($2::text IS NULL OR lower(location_city) = lower($2))
              AND ($3::text IS NULL
                   OR business_name ILIKE $3 ESCAPE '\'
                   OR bio ILIKE $3 ESCAPE '\')
            ORDER BY verified DESC, business_name ASC
            "#,
            PROFILE_COLUMNS
        ))
        .bind(&search.category)
        .bind(&search.city)
        .bind(search.query.as_deref().map(contains_pattern))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(rows.into_iter().map(ProviderProfile::from).collect())
    }

    async fn update_profile(
        &self,
        id: i64,
        update: &ProviderProfileUpdate,
    ) -> StoreResult<Option<ProviderProfile>> {
        let trimmed = |v: &Option<String>| v.as_deref().map(|s| s.trim().to_string());

        let row: Option<ProviderProfileRow> = sqlx::query_as(&format!(
            r#"
            UPDATE provider_profiles SET
                business_name = COALESCE($2, business_name),
                category = COALESCE(lower($3), category),
                bio = COALESCE($4, bio),
                location_city = COALESCE($5, location_city),
                location_region = COALESCE($6, location_region),
                hourly_rate = COALESCE($7, hourly_rate),
                daily_rate = COALESCE($8, daily_rate),
                response_time_hours = COALESCE($9, response_time_hours)
            WHERE id = $1
            RETURNING {}
            "#,
            PROFILE_COLUMNS
        ))
        .bind(id)
        .bind(trimmed(&update.business_name))
        .bind(trimmed(&update.category))
        .bind(&update.bio)
        .bind(trimmed(&update.location_city))
        .bind(trimmed(&update.location_region))
        .bind(update.hourly_rate)
        .bind(update.daily_rate)
        .bind(update.response_time_hours)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(row.map(ProviderProfile::from))
    }

    async fn add_service(&self, service: NewService) -> StoreResult<Service> {
        let row: ServiceRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO services (provider_id, name, description, price, category)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            SERVICE_COLUMNS
        ))
        .bind(service.provider_id)
        .bind(&service.name)
        .bind(&service.description)
        .bind(service.price)
        .bind(&service.category)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(row.into())
    }

    async fn list_services(&self, provider_id: i64) -> StoreResult<Vec<Service>> {
        let rows: Vec<ServiceRow> = sqlx::query_as(&format!(
            "SELECT {} FROM services WHERE provider_id = $1 ORDER BY created_at, id",
            SERVICE_COLUMNS
        ))
        .bind(provider_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(rows.into_iter().map(Service::from).collect())
    }
}

/// `ILIKE` pattern matching `needle` literally anywhere in the text.
fn contains_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
