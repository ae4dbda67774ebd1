use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MinimumSkill {
    Beginner,
    Intermediate,
    Advanced,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub description: String,
    pub weeks: i32,
    pub tuition: f64,
    pub minimum_skill: MinimumSkill,
    pub scholarship_available: bool,
    /// Parent bootcamp reference.
    pub bootcamp: String,
    /// Owner identity (the bootcamp owner who added the course).
    pub user: String,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl Course {
    pub fn new(
        title: String,
        description: String,
        weeks: i32,
        tuition: f64,
        minimum_skill: MinimumSkill,
        scholarship_available: bool,
        bootcamp_id: String,
        owner_id: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title,
            description,
            weeks,
            tuition,
            minimum_skill,
            scholarship_available,
            bootcamp: bootcamp_id,
            user: owner_id,
            created_at: Utc::now(),
        }
    }
}
