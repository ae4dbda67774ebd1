use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{Bootcamp, Course};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateBootcampPayload {
    #[validate(length(min = 1, max = 50))]
    pub name: String,
    #[validate(length(min = 1, max = 500))]
    pub description: String,
    #[validate(url)]
    pub website: Option<String>,
    #[validate(length(max = 20))]
    pub phone: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 1))]
    pub address: String,
    #[serde(default)]
    pub careers: Vec<String>,
    #[serde(default)]
    pub housing: bool,
    #[serde(default)]
    pub job_assistance: bool,
    #[serde(default)]
    pub job_guarantee: bool,
    #[serde(default)]
    pub accept_gi: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateBootcampPayload {
    #[validate(length(min = 1, max = 50))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 500))]
    pub description: Option<String>,
    #[validate(url)]
    pub website: Option<String>,
    #[validate(length(max = 20))]
    pub phone: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub careers: Option<Vec<String>>,
    pub housing: Option<bool>,
    pub job_assistance: Option<bool>,
    pub job_guarantee: Option<bool>,
    pub accept_gi: Option<bool>,
}

/// A bootcamp with its courses eagerly joined for the listing endpoint.
#[derive(Debug, Serialize)]
pub struct BootcampWithCourses {
    #[serde(flatten)]
    pub bootcamp: Bootcamp,
    pub courses: Vec<Course>,
}
