use sqlx::SqlitePool;
use tracing::warn;

use crate::error::{Error, Result};
use crate::messages::repo_types::Message;

/// Upper bound on message text, in characters.
pub const MAX_TEXT_LEN: usize = 140;

/// Validate and store a new message.
pub async fn post(db: &SqlitePool, author_id: i64, text: &str) -> Result<Message> {
    if text.is_empty() {
        warn!(user_id = author_id, "post with empty text");
        return Err(Error::validation("message text must not be empty"));
    }
    if text.chars().count() > MAX_TEXT_LEN {
        warn!(user_id = author_id, len = text.chars().count(), "post too long");
        return Err(Error::validation(format!(
            "message text exceeds {MAX_TEXT_LEN} characters"
        )));
    }
    Message::insert(db, author_id, text).await
}
