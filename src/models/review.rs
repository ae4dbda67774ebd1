use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub text: String,
    /// 1 through 10; one review per (bootcamp, user), enforced by a unique
    /// index.
    pub rating: i32,
    pub bootcamp: String,
    pub user: String,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl Review {
    pub fn new(title: String, text: String, rating: i32, bootcamp_id: String, owner_id: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title,
            text,
            rating,
            bootcamp: bootcamp_id,
            user: owner_id,
            created_at: Utc::now(),
        }
    }
}
