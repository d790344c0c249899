use sqlx::SqlitePool;
use time::OffsetDateTime;
use tracing::info;

use crate::error::{Error, Result};
use crate::messages::repo_types::Message;

impl Message {
    pub(crate) async fn insert(db: &SqlitePool, author_id: i64, text: &str) -> Result<Message> {
        let message = sqlx::query_as::<_, Message>(
            r#"
            INSERT INTO messages (user_id, text, created_at)
            VALUES (?1, ?2, ?3)
            RETURNING id, user_id, text, created_at
            "#,
        )
        .bind(author_id)
        .bind(text)
        .bind(OffsetDateTime::now_utc())
        .fetch_one(db)
        .await?;
        info!(message_id = message.id, user_id = author_id, "message posted");
        Ok(message)
    }

    /// Messages authored by `author_id`, newest first.
    pub async fn by_author(db: &SqlitePool, author_id: i64) -> Result<Vec<Message>> {
        let messages = sqlx::query_as::<_, Message>(
            r#"
            SELECT id, user_id, text, created_at
            FROM messages
            WHERE user_id = ?1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(author_id)
        .fetch_all(db)
        .await?;
        Ok(messages)
    }

    pub async fn find(db: &SqlitePool, id: i64) -> Result<Option<Message>> {
        let message = sqlx::query_as::<_, Message>(
            r#"
            SELECT id, user_id, text, created_at
            FROM messages
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(message)
    }

    /// Delete the message; its likes go with it via the cascading key.
    pub async fn delete(db: &SqlitePool, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM messages WHERE id = ?1")
            .bind(id)
            .execute(db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound("message"));
        }
        info!(message_id = id, "message deleted");
        Ok(())
    }
}

/// Home timeline: newest-first messages authored by `user_id` and by the
/// users they follow, bounded by `limit`.
pub async fn feed_for(db: &SqlitePool, user_id: i64, limit: i64) -> Result<Vec<Message>> {
    let messages = sqlx::query_as::<_, Message>(
        r#"
        SELECT id, user_id, text, created_at
        FROM messages
        WHERE user_id = ?1
           OR user_id IN (SELECT followed_id FROM follows WHERE follower_id = ?1)
        ORDER BY created_at DESC, id DESC
        LIMIT ?2
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(db)
    .await?;
    Ok(messages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::follows;
    use crate::users::signup;

    async fn author(pool: &SqlitePool, name: &str, email: &str) -> i64 {
        signup(name, email, "password", None)
            .unwrap()
            .insert(pool)
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn by_author_is_newest_first() {
        let pool = db::connect_in_memory().await.unwrap();
        let u1 = author(&pool, "testuser1", "test1@test.com").await;

        Message::insert(&pool, u1, "first").await.unwrap();
        Message::insert(&pool, u1, "second").await.unwrap();
        Message::insert(&pool, u1, "third").await.unwrap();

        let texts: Vec<String> = Message::by_author(&pool, u1)
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.text)
            .collect();
        assert_eq!(texts, vec!["third", "second", "first"]);
    }

    #[tokio::test]
    async fn find_and_delete() {
        let pool = db::connect_in_memory().await.unwrap();
        let u1 = author(&pool, "testuser1", "test1@test.com").await;
        let msg = Message::insert(&pool, u1, "This is a test message")
            .await
            .unwrap();

        let found = Message::find(&pool, msg.id).await.unwrap().unwrap();
        assert_eq!(found.text, "This is a test message");
        assert_eq!(found.user_id, u1);

        Message::delete(&pool, msg.id).await.unwrap();
        assert!(Message::find(&pool, msg.id).await.unwrap().is_none());

        let err = Message::delete(&pool, msg.id).await.unwrap_err();
        assert!(matches!(err, Error::NotFound("message")));
    }

    #[tokio::test]
    async fn feed_spans_self_and_followed_authors() {
        let pool = db::connect_in_memory().await.unwrap();
        let u1 = author(&pool, "testuser1", "test1@test.com").await;
        let u2 = author(&pool, "testuser2", "test2@test.com").await;
        let u3 = author(&pool, "testuser3", "test3@test.com").await;

        Message::insert(&pool, u1, "from u1").await.unwrap();
        Message::insert(&pool, u2, "from u2").await.unwrap();
        Message::insert(&pool, u3, "from u3").await.unwrap();

        follows::follow(&pool, u2, u1).await.unwrap();

        let texts: Vec<String> = feed_for(&pool, u2, 100)
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.text)
            .collect();
        // u3 is not followed, so their message stays out
        assert_eq!(texts, vec!["from u2", "from u1"]);
    }

    #[tokio::test]
    async fn feed_honors_the_limit() {
        let pool = db::connect_in_memory().await.unwrap();
        let u1 = author(&pool, "testuser1", "test1@test.com").await;

        for i in 0..5 {
            Message::insert(&pool, u1, &format!("msg {i}")).await.unwrap();
        }

        let feed = feed_for(&pool, u1, 3).await.unwrap();
        assert_eq!(feed.len(), 3);
        assert_eq!(feed[0].text, "msg 4");
    }
}
