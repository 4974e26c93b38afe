use sqlx::PgPool;
use tracing::instrument;

use academy_core::AppError;
use academy_models::UserId;

use crate::modules::chat::model::Message;

const MESSAGE_COLUMNS: &str = "id, sender_id, receiver_id, content, timestamp, is_read";

pub struct ChatService;

impl ChatService {
    /// Every message between two users, oldest first.
    #[instrument(skip(db))]
    pub async fn history(db: &PgPool, a: UserId, b: UserId) -> Result<Vec<Message>, AppError> {
        let messages = sqlx::query_as::<_, Message>(&format!(
            "SELECT {} FROM messages
             WHERE (sender_id = $1 AND receiver_id = $2)
                OR (sender_id = $2 AND receiver_id = $1)
             ORDER BY timestamp",
            MESSAGE_COLUMNS
        ))
        .bind(a)
        .bind(b)
        .fetch_all(db)
        .await?;

        Ok(messages)
    }

    #[instrument(skip(db, content))]
    pub async fn save_message(
        db: &PgPool,
        sender_id: UserId,
        receiver_id: UserId,
        content: &str,
    ) -> Result<Message, AppError> {
        let message = sqlx::query_as::<_, Message>(&format!(
            "INSERT INTO messages (sender_id, receiver_id, content)
             VALUES ($1, $2, $3)
             RETURNING {}",
            MESSAGE_COLUMNS
        ))
        .bind(sender_id)
        .bind(receiver_id)
        .bind(content)
        .fetch_one(db)
        .await?;

        Ok(message)
    }
}
