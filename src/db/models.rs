use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::relative_time::time_since;

/// Every comment is attributed to this placeholder; there are no accounts.
pub const ANONYMOUS_USERNAME: &str = "user";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub image_filename: String,
    pub caption: String,
    pub created_at: DateTime<Utc>,
    pub likes: i64,
}

impl Post {
    pub fn time_since(&self, now: DateTime<Utc>) -> String {
        time_since(self.created_at, now)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub post_id: i64,
    pub username: String,
}

impl Comment {
    pub fn time_since(&self, now: DateTime<Utc>) -> String {
        time_since(self.created_at, now)
    }
}
