use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

/// One classification outcome owned by a user.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct HistoryRecord {
    pub id: i64,
    pub user_id: i64,
    pub image_path: String, // storage key of the uploaded image
    pub result: String,
    pub created_at: OffsetDateTime,
}
