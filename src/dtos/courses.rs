use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{Course, MinimumSkill};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCoursePayload {
    #[validate(length(min = 1, max = 100))]
    pub title: String,
    #[validate(length(min = 1))]
    pub description: String,
    #[validate(range(min = 1))]
    pub weeks: i32,
    #[validate(range(min = 0.0))]
    pub tuition: f64,
    pub minimum_skill: MinimumSkill,
    #[serde(default)]
    pub scholarship_available: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCoursePayload {
    #[validate(length(min = 1, max = 100))]
    pub title: Option<String>,
    #[validate(length(min = 1))]
    pub description: Option<String>,
    #[validate(range(min = 1))]
    pub weeks: Option<i32>,
    #[validate(range(min = 0.0))]
    pub tuition: Option<f64>,
    pub minimum_skill: Option<MinimumSkill>,
    pub scholarship_available: Option<bool>,
}

/// The joined parent shown on single-course reads.
#[derive(Debug, Serialize)]
pub struct BootcampSummary {
    pub name: String,
    pub description: String,
}

/// The course document's own `bootcamp` field carries the parent id; the
/// summary rides alongside under its own key.
#[derive(Debug, Serialize)]
pub struct CourseWithBootcamp {
    #[serde(flatten)]
    pub course: Course,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bootcamp_summary: Option<BootcampSummary>,
}
