use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use futures::stream::TryStreamExt;
use mongodb::bson::{doc, to_bson, Document};
use mongodb::options::{FindOneAndUpdateOptions, ReturnDocument};
use validator::Validate;

use crate::dtos::{
    BootcampSummary, CountedResponse, CourseWithBootcamp, CreateCoursePayload, DataResponse,
    UpdateCoursePayload,
};
use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::models::{Course, Role};
use crate::services::{policy, query};
use crate::startup::AppState;

const COURSE_FIELDS: &[&str] = &[
    "title",
    "weeks",
    "tuition",
    "minimum_skill",
    "scholarship_available",
    "bootcamp",
    "created_at",
];

pub async fn list_courses(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<impl IntoResponse, AppError> {
    let shaped = query::ListQuery::parse(&params, COURSE_FIELDS)?;
    let page = query::run_paged(&state.db.courses(), &shaped).await?;
    Ok(Json(page))
}

pub async fn list_bootcamp_courses(
    State(state): State<AppState>,
    Path(bootcamp_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let mut cursor = state
        .db
        .courses()
        .find(doc! { "bootcamp": &bootcamp_id }, None)
        .await
        .map_err(AppError::from)?;

    let mut courses = Vec::new();
    while let Some(course) = cursor.try_next().await.map_err(AppError::from)? {
        courses.push(course);
    }

    Ok(Json(CountedResponse::new(courses)))
}

pub async fn get_course(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let course = state
        .db
        .courses()
        .find_one(doc! { "_id": &id }, None)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("No course with the id of {}", id)))?;

    let bootcamp = state
        .db
        .bootcamps()
        .find_one(doc! { "_id": &course.bootcamp }, None)
        .await
        .map_err(AppError::from)?
        .map(|b| BootcampSummary {
            name: b.name,
            description: b.description,
        });

    Ok(Json(DataResponse::new(CourseWithBootcamp {
        course,
        bootcamp_summary: bootcamp,
    })))
}

pub async fn add_course(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(bootcamp_id): Path<String>,
    Json(payload): Json<CreateCoursePayload>,
) -> Result<impl IntoResponse, AppError> {
    policy::require_role(&user, &[Role::Publisher, Role::Admin])?;
    payload.validate()?;

    let bootcamp = state
        .db
        .bootcamps()
        .find_one(doc! { "_id": &bootcamp_id }, None)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| {
            AppError::NotFound(anyhow::anyhow!("No bootcamp with the id of {}", bootcamp_id))
        })?;

    // Courses belong to the bootcamp's owner.
    policy::require_owner(&user, &bootcamp.user, &bootcamp.id)?;

    let course = Course::new(
        payload.title,
        payload.description,
        payload.weeks,
        payload.tuition,
        payload.minimum_skill,
        payload.scholarship_available,
        bootcamp.id.clone(),
        user.id.clone(),
    );

    state
        .db
        .courses()
        .insert_one(&course, None)
        .await
        .map_err(AppError::from)?;

    state.db.recompute_average_cost(&bootcamp.id).await?;

    tracing::info!(course_id = %course.id, bootcamp_id = %bootcamp.id, "Course added");

    Ok((StatusCode::CREATED, Json(DataResponse::new(course))))
}

pub async fn update_course(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Json(payload): Json<UpdateCoursePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let course = state
        .db
        .courses()
        .find_one(doc! { "_id": &id }, None)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("No course with the id of {}", id)))?;

    policy::require_owner(&user, &course.user, &course.id)?;

    let mut set = Document::new();
    if let Some(title) = payload.title {
        set.insert("title", title);
    }
    if let Some(description) = payload.description {
        set.insert("description", description);
    }
    if let Some(weeks) = payload.weeks {
        set.insert("weeks", weeks);
    }
    if let Some(tuition) = payload.tuition {
        set.insert("tuition", tuition);
    }
    if let Some(minimum_skill) = payload.minimum_skill {
        set.insert(
            "minimum_skill",
            to_bson(&minimum_skill).map_err(|e| AppError::InternalError(e.into()))?,
        );
    }
    if let Some(scholarship_available) = payload.scholarship_available {
        set.insert("scholarship_available", scholarship_available);
    }
    if set.is_empty() {
        return Err(AppError::BadRequest(anyhow::anyhow!("Nothing to update")));
    }

    let options = FindOneAndUpdateOptions::builder()
        .return_document(ReturnDocument::After)
        .build();

    let updated = state
        .db
        .courses()
        .find_one_and_update(doc! { "_id": &id }, doc! { "$set": set }, options)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("No course with the id of {}", id)))?;

    state.db.recompute_average_cost(&updated.bootcamp).await?;

    Ok(Json(DataResponse::new(updated)))
}

pub async fn delete_course(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let course = state
        .db
        .courses()
        .find_one(doc! { "_id": &id }, None)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("No course with the id of {}", id)))?;

    policy::require_owner(&user, &course.user, &course.id)?;

    state
        .db
        .courses()
        .delete_one(doc! { "_id": &id }, None)
        .await
        .map_err(AppError::from)?;

    state.db.recompute_average_cost(&course.bootcamp).await?;

    Ok(Json(DataResponse::new(serde_json::json!({}))))
}
