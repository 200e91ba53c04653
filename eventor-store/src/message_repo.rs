use async_trait::async_trait;
use chrono::{DateTime, Utc};
use eventor_core::messages::{Message, NewMessage};
use eventor_core::repository::MessageRepository;
use eventor_core::StoreResult;
use sqlx::PgPool;

use crate::database::db_err;

pub struct PgMessageRepository {
    pool: PgPool,
}

impl PgMessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct MessageRow {
    id: i64,
    sender_id: i64,
    recipient_id: i64,
    booking_id: Option<i64>,
    content: String,
    read: bool,
    created_at: DateTime<Utc>,
}

impl From<MessageRow> for Message {
    fn from(row: MessageRow) -> Self {
        Message {
            id: row.id,
            sender_id: row.sender_id,
            recipient_id: row.recipient_id,
            booking_id: row.booking_id,
            content: row.content,
            read: row.read,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl MessageRepository for PgMessageRepository {
    async fn send_message(&self, message: NewMessage) -> StoreResult<Message> {
        let row: MessageRow = sqlx::query_as(
            r#"
            INSERT INTO messages (sender_id, recipient_id, booking_id, content)
            VALUES ($1, $2, $3, $4)
            RETURNING id, sender_id, recipient_id, booking_id, content, read, created_at
            "#,
        )
        .bind(message.sender_id)
        .bind(message.recipient_id)
        .bind(message.booking_id)
        .bind(&message.content)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(row.into())
    }

    async fn conversation(&self, user_id: i64, other_id: i64) -> StoreResult<Vec<Message>> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        sqlx::query("UPDATE messages SET read = TRUE WHERE recipient_id = $1 AND sender_id = $2 AND NOT read")
            .bind(user_id)
            .bind(other_id)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;

        let rows: Vec<MessageRow> = sqlx::query_as(
            r#"
            SELECT id, sender_id, recipient_id, booking_id, content, read, created_at
            FROM messages
            WHERE (sender_id = $1 AND recipient_id = $2)
               OR (sender_id = $2 AND recipient_id = $1)
            ORDER BY created_at, id
            "#,
        )
        .bind(user_id)
        .bind(other_id)
        .fetch_all(&mut *tx)
        .await
        .map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;

        Ok(rows.into_iter().map(Message::from).collect())
    }
}
