use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::Review;

use super::BootcampSummary;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateReviewPayload {
    #[validate(length(min = 1, max = 100))]
    pub title: String,
    #[validate(length(min = 1))]
    pub text: String,
    #[validate(range(min = 1, max = 10))]
    pub rating: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateReviewPayload {
    #[validate(length(min = 1, max = 100))]
    pub title: Option<String>,
    #[validate(length(min = 1))]
    pub text: Option<String>,
    #[validate(range(min = 1, max = 10))]
    pub rating: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct ReviewWithBootcamp {
    #[serde(flatten)]
    pub review: Review,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bootcamp_summary: Option<BootcampSummary>,
}
