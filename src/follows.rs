//! Directed follow edges between users.

use sqlx::SqlitePool;
use time::OffsetDateTime;
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Insert the edge if absent. Following twice is a no-op; the composite
/// primary key keeps concurrent callers from creating duplicate edges.
/// Self-follow is rejected.
pub async fn follow(db: &SqlitePool, follower_id: i64, followed_id: i64) -> Result<()> {
    if follower_id == followed_id {
        return Err(Error::validation("users cannot follow themselves"));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO follows (follower_id, followed_id, created_at)
        VALUES (?1, ?2, ?3)
        ON CONFLICT (follower_id, followed_id) DO NOTHING
        "#,
    )
    .bind(follower_id)
    .bind(followed_id)
    .bind(OffsetDateTime::now_utc())
    .execute(db)
    .await?;

    if result.rows_affected() == 0 {
        debug!(follower_id, followed_id, "follow edge already present");
    } else {
        info!(follower_id, followed_id, "follow edge created");
    }
    Ok(())
}

/// Delete the edge if present, no-op otherwise.
pub async fn unfollow(db: &SqlitePool, follower_id: i64, followed_id: i64) -> Result<()> {
    let result = sqlx::query(
        "DELETE FROM follows WHERE follower_id = ?1 AND followed_id = ?2",
    )
    .bind(follower_id)
    .bind(followed_id)
    .execute(db)
    .await?;

    if result.rows_affected() > 0 {
        info!(follower_id, followed_id, "follow edge removed");
    }
    Ok(())
}

/// Membership check for the ordered pair (follower, followed).
pub async fn is_following(db: &SqlitePool, follower_id: i64, followed_id: i64) -> Result<bool> {
    let present: i64 = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM follows WHERE follower_id = ?1 AND followed_id = ?2)",
    )
    .bind(follower_id)
    .bind(followed_id)
    .fetch_one(db)
    .await?;
    Ok(present != 0)
}

/// Ids of the users following `user_id`, most recent first.
pub async fn followers_of(db: &SqlitePool, user_id: i64) -> Result<Vec<i64>> {
    let ids = sqlx::query_scalar(
        "SELECT follower_id FROM follows WHERE followed_id = ?1 ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(ids)
}

/// Ids of the users `user_id` follows, most recent first.
pub async fn following_of(db: &SqlitePool, user_id: i64) -> Result<Vec<i64>> {
    let ids = sqlx::query_scalar(
        "SELECT followed_id FROM follows WHERE follower_id = ?1 ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(ids)
}
