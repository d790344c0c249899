use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

/// A short post. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Message {
    pub id: i64,
    pub user_id: i64,
    pub text: String,
    pub created_at: OffsetDateTime,
}
