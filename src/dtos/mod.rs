mod auth;
mod bootcamps;
mod courses;
mod reviews;
mod users;

pub use auth::{
    ForgotPasswordPayload, LoginPayload, RegisterPayload, RegisterRole, ResetPasswordPayload,
    TokenResponse, UpdateDetailsPayload, UpdatePasswordPayload,
};
pub use bootcamps::{BootcampWithCourses, CreateBootcampPayload, UpdateBootcampPayload};
pub use courses::{BootcampSummary, CourseWithBootcamp, CreateCoursePayload, UpdateCoursePayload};
pub use reviews::{CreateReviewPayload, ReviewWithBootcamp, UpdateReviewPayload};
pub use users::{CreateUserPayload, UpdateUserPayload, UserResponse};

use serde::Serialize;

/// Uniform success envelope: `{ "success": true, "data": … }`.
#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> DataResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Envelope for unpaginated collections: `{ "success": true, "count": n,
/// "data": […] }`.
#[derive(Debug, Serialize)]
pub struct CountedResponse<T> {
    pub success: bool,
    pub count: usize,
    pub data: Vec<T>,
}

impl<T> CountedResponse<T> {
    pub fn new(data: Vec<T>) -> Self {
        Self {
            success: true,
            count: data.len(),
            data,
        }
    }
}
