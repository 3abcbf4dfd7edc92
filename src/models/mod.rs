use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A stored note. Timestamps are UTC; `created_at` never changes after
/// creation, `updated_at` is refreshed on every successful update.
#[derive(Debug, Clone)]
pub struct Note {
    pub id: String,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Note {
    /// Build a fresh note with a generated id and equal timestamps.
    pub fn new(title: String, content: String) -> Self {
        let now = Utc::now();

        Self {
            id: Uuid::new_v4().to_string(),
            title,
            content,
            created_at: now,
            updated_at: now,
        }
    }
}
