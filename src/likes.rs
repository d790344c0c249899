//! Like edges between users and messages.

use sqlx::SqlitePool;
use time::OffsetDateTime;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::messages::Message;

/// Insert the edge if absent. Liking twice is a no-op; the composite primary
/// key keeps concurrent callers from creating duplicate edges. Users cannot
/// like their own messages.
pub async fn like(db: &SqlitePool, user_id: i64, message_id: i64) -> Result<()> {
    let mut tx = db.begin().await?;

    let author: Option<i64> = sqlx::query_scalar("SELECT user_id FROM messages WHERE id = ?1")
        .bind(message_id)
        .fetch_optional(&mut *tx)
        .await?;
    let author = author.ok_or(Error::NotFound("message"))?;
    if author == user_id {
        return Err(Error::validation("users cannot like their own messages"));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO likes (user_id, message_id, created_at)
        VALUES (?1, ?2, ?3)
        ON CONFLICT (user_id, message_id) DO NOTHING
        "#,
    )
    .bind(user_id)
    .bind(message_id)
    .bind(OffsetDateTime::now_utc())
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;

    if result.rows_affected() == 0 {
        debug!(user_id, message_id, "like edge already present");
    } else {
        info!(user_id, message_id, "like edge created");
    }
    Ok(())
}

/// Delete the edge if present, no-op otherwise.
pub async fn unlike(db: &SqlitePool, user_id: i64, message_id: i64) -> Result<()> {
    let result = sqlx::query("DELETE FROM likes WHERE user_id = ?1 AND message_id = ?2")
        .bind(user_id)
        .bind(message_id)
        .execute(db)
        .await?;

    if result.rows_affected() > 0 {
        info!(user_id, message_id, "like edge removed");
    }
    Ok(())
}

/// Membership check for the (user, message) pair.
pub async fn has_liked(db: &SqlitePool, user_id: i64, message_id: i64) -> Result<bool> {
    let present: i64 = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM likes WHERE user_id = ?1 AND message_id = ?2)",
    )
    .bind(user_id)
    .bind(message_id)
    .fetch_one(db)
    .await?;
    Ok(present != 0)
}

/// The messages `user_id` has liked, most recently liked first.
pub async fn likes_of(db: &SqlitePool, user_id: i64) -> Result<Vec<Message>> {
    let messages = sqlx::query_as::<_, Message>(
        r#"
        SELECT m.id, m.user_id, m.text, m.created_at
        FROM messages m
        JOIN likes l ON l.message_id = m.id
        WHERE l.user_id = ?1
        ORDER BY l.created_at DESC, m.id DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(messages)
}
