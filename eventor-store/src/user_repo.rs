use async_trait::async_trait;
use chrono::{DateTime, Utc};
use eventor_core::directory::{NewProviderProfile, ProviderProfile};
use eventor_core::repository::UserRepository;
use eventor_core::users::{NewUser, User};
use eventor_core::{StoreError, StoreResult};
use sqlx::PgPool;

use crate::database::{db_err, parse_column};
use crate::provider_repo::ProviderProfileRow;

pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const USER_COLUMNS: &str = "id, email, password_hash, first_name, last_name, phone, user_type, avatar_url, email_verified, created_at";

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    email: String,
    password_hash: String,
    first_name: String,
    last_name: String,
    phone: Option<String>,
    user_type: String,
    avatar_url: Option<String>,
    email_verified: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: row.id,
            email: row.email,
            password_hash: row.password_hash,
            first_name: row.first_name,
            last_name: row.last_name,
            phone: row.phone,
            user_type: parse_column("user_type", &row.user_type)?,
            avatar_url: row.avatar_url,
            email_verified: row.email_verified,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create_user(
        &self,
        user: NewUser,
        profile: Option<NewProviderProfile>,
    ) -> StoreResult<(User, Option<ProviderProfile>)> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let row: UserRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO users (email, password_hash, first_name, last_name, phone, user_type)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.phone)
        .bind(user.user_type.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(db_err)?;

        let created_profile = match profile {
            Some(p) => {
                let profile_row: ProviderProfileRow = sqlx::query_as(&format!(
                    r#"
                    INSERT INTO provider_profiles (user_id, business_name, category, bio, location_city, location_region)
                    VALUES ($1, $2, $3, $4, $5, $6)
                    RETURNING {}
                    "#,
                    crate::provider_repo::PROFILE_COLUMNS
                ))
                .bind(row.id)
                .bind(&p.business_name)
                .bind(&p.category)
                .bind(&p.bio)
                .bind(&p.location_city)
                .bind(&p.location_region)
                .fetch_one(&mut *tx)
                .await
                .map_err(db_err)?;
                Some(ProviderProfile::from(profile_row))
            }
            None => None,
        };

        tx.commit().await.map_err(db_err)?;

        Ok((User::try_from(row)?, created_profile))
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "SELECT {} FROM users WHERE email = $1",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.map(User::try_from).transpose()
    }

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.map(User::try_from).transpose()
    }
}
