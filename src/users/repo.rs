use sqlx::SqlitePool;
use time::OffsetDateTime;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::users::repo_types::{NewUser, User};

impl NewUser {
    /// Persist the pending record. Unique username/email are enforced by
    /// storage constraints, so a duplicate surfaces here as `DuplicateKey`,
    /// not at signup time.
    pub async fn insert(&self, db: &SqlitePool) -> Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, password_hash, image_url, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            RETURNING id, username, email, password_hash, image_url, created_at
            "#,
        )
        .bind(&self.username)
        .bind(&self.email)
        .bind(&self.password_hash)
        .bind(&self.image_url)
        .bind(OffsetDateTime::now_utc())
        .fetch_one(db)
        .await?;
        info!(user_id = user.id, username = %user.username, "user created");
        Ok(user)
    }
}

impl User {
    pub async fn find_by_id(db: &SqlitePool, id: i64) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, image_url, created_at
            FROM users
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_username(db: &SqlitePool, username: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, image_url, created_at
            FROM users
            WHERE username = ?1
            "#,
        )
        .bind(username)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn list(db: &SqlitePool) -> Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, image_url, created_at
            FROM users
            ORDER BY username
            "#,
        )
        .fetch_all(db)
        .await?;
        Ok(users)
    }

    /// Username substring search for the user directory listing.
    pub async fn search(db: &SqlitePool, q: &str) -> Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, image_url, created_at
            FROM users
            WHERE username LIKE '%' || ?1 || '%'
            ORDER BY username
            "#,
        )
        .bind(q)
        .fetch_all(db)
        .await?;
        Ok(users)
    }

    /// Profile edit. Changing username or email can collide with another
    /// user and fails with `DuplicateKey`.
    pub async fn update_profile(
        db: &SqlitePool,
        id: i64,
        username: &str,
        email: &str,
        image_url: Option<&str>,
    ) -> Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET username = ?1, email = ?2, image_url = ?3
            WHERE id = ?4
            RETURNING id, username, email, password_hash, image_url, created_at
            "#,
        )
        .bind(username)
        .bind(email)
        .bind(image_url)
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or(Error::NotFound("user"))?;
        debug!(user_id = id, "profile updated");
        Ok(user)
    }

    /// Delete the user. Their messages, follow edges and likes go with them
    /// via the cascading foreign keys.
    pub async fn delete(db: &SqlitePool, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?1")
            .bind(id)
            .execute(db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound("user"));
        }
        info!(user_id = id, "user deleted");
        Ok(())
    }

    pub async fn is_following(&self, db: &SqlitePool, other_id: i64) -> Result<bool> {
        crate::follows::is_following(db, self.id, other_id).await
    }

    pub async fn is_followed_by(&self, db: &SqlitePool, other_id: i64) -> Result<bool> {
        crate::follows::is_following(db, other_id, self.id).await
    }

    pub async fn has_liked(&self, db: &SqlitePool, message_id: i64) -> Result<bool> {
        crate::likes::has_liked(db, self.id, message_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::users::services::signup;

    async fn pool_with_user(username: &str, email: &str) -> (SqlitePool, User) {
        let pool = db::connect_in_memory().await.expect("connect");
        let user = signup(username, email, "password", None)
            .expect("signup")
            .insert(&pool)
            .await
            .expect("insert");
        (pool, user)
    }

    #[tokio::test]
    async fn insert_and_find() {
        let (pool, user) = pool_with_user("testuser1", "test1@test.com").await;

        let by_id = User::find_by_id(&pool, user.id).await.unwrap().unwrap();
        assert_eq!(by_id.username, "testuser1");
        assert_eq!(by_id.email, "test1@test.com");

        let by_name = User::find_by_username(&pool, "testuser1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_name.id, user.id);

        assert!(User::find_by_username(&pool, "no-such-user")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn duplicate_username_fails_at_insert() {
        let (pool, _) = pool_with_user("testuser1", "test1@test.com").await;

        // signup itself succeeds; the conflict only shows up on insert
        let pending = signup("testuser1", "test3@test.com", "password", None).unwrap();
        let err = pending.insert(&pool).await.unwrap_err();
        assert!(matches!(err, Error::DuplicateKey(_)));
    }

    #[tokio::test]
    async fn duplicate_email_fails_at_insert() {
        let (pool, _) = pool_with_user("testuser1", "test1@test.com").await;

        let pending = signup("testuser3", "test1@test.com", "password", None).unwrap();
        let err = pending.insert(&pool).await.unwrap_err();
        assert!(matches!(err, Error::DuplicateKey(_)));
    }

    #[tokio::test]
    async fn list_and_search() {
        let (pool, _) = pool_with_user("testuser1", "test1@test.com").await;
        signup("another", "another@test.com", "password", None)
            .unwrap()
            .insert(&pool)
            .await
            .unwrap();

        let all = User::list(&pool).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].username, "another");

        let hits = User::search(&pool, "test").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].username, "testuser1");
    }

    #[tokio::test]
    async fn update_profile_roundtrip_and_collision() {
        let (pool, user) = pool_with_user("testuser1", "test1@test.com").await;
        let other = signup("testuser2", "test2@test.com", "password", None)
            .unwrap()
            .insert(&pool)
            .await
            .unwrap();

        let updated = User::update_profile(
            &pool,
            user.id,
            "renamed",
            "renamed@test.com",
            Some("https://img.test/me.png"),
        )
        .await
        .unwrap();
        assert_eq!(updated.username, "renamed");
        assert_eq!(updated.image_url.as_deref(), Some("https://img.test/me.png"));

        let err = User::update_profile(&pool, other.id, "renamed", "test2@test.com", None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateKey(_)));

        let err = User::update_profile(&pool, 9999, "ghost", "ghost@test.com", None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound("user")));
    }

    #[tokio::test]
    async fn delete_removes_user() {
        let (pool, user) = pool_with_user("testuser1", "test1@test.com").await;

        User::delete(&pool, user.id).await.unwrap();
        assert!(User::find_by_id(&pool, user.id).await.unwrap().is_none());

        let err = User::delete(&pool, user.id).await.unwrap_err();
        assert!(matches!(err, Error::NotFound("user")));
    }
}
