use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use futures::stream::TryStreamExt;
use mongodb::bson::{doc, to_bson, Document};
use mongodb::options::{FindOneAndUpdateOptions, ReturnDocument};
use std::collections::HashMap;
use validator::Validate;

use crate::dtos::{
    BootcampWithCourses, CountedResponse, CreateBootcampPayload, DataResponse,
    UpdateBootcampPayload,
};
use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::models::{Bootcamp, Course, Role};
use crate::models::bootcamp::slugify;
use crate::services::{angular_radius, policy, query, radius_filter};
use crate::startup::AppState;

/// Fields bootcamp listings may filter and sort on.
const BOOTCAMP_FIELDS: &[&str] = &[
    "name",
    "slug",
    "careers",
    "housing",
    "job_assistance",
    "job_guarantee",
    "accept_gi",
    "average_cost",
    "average_rating",
    "created_at",
];

pub async fn list_bootcamps(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<impl IntoResponse, AppError> {
    let shaped = query::ListQuery::parse(&params, BOOTCAMP_FIELDS)?;
    let page = query::run_paged(&state.db.bootcamps(), &shaped).await?;

    // Eager join: one query for all courses of the returned page.
    let ids: Vec<String> = page.data.iter().map(|b| b.id.clone()).collect();
    let mut by_bootcamp: HashMap<String, Vec<Course>> = HashMap::new();
    if !ids.is_empty() {
        let mut cursor = state
            .db
            .courses()
            .find(doc! { "bootcamp": { "$in": ids } }, None)
            .await
            .map_err(AppError::from)?;
        while let Some(course) = cursor.try_next().await.map_err(AppError::from)? {
            by_bootcamp.entry(course.bootcamp.clone()).or_default().push(course);
        }
    }

    let data: Vec<BootcampWithCourses> = page
        .data
        .into_iter()
        .map(|bootcamp| {
            let courses = by_bootcamp.remove(&bootcamp.id).unwrap_or_default();
            BootcampWithCourses { bootcamp, courses }
        })
        .collect();

    Ok(Json(query::PagedResult {
        success: true,
        count: data.len(),
        pagination: page.pagination,
        data,
    }))
}

pub async fn get_bootcamp(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let bootcamp = state
        .db
        .bootcamps()
        .find_one(doc! { "_id": &id }, None)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Bootcamp not found with id: {}", id)))?;

    Ok(Json(DataResponse::new(bootcamp)))
}

pub async fn create_bootcamp(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(payload): Json<CreateBootcampPayload>,
) -> Result<impl IntoResponse, AppError> {
    policy::require_role(&user, &[Role::Publisher, Role::Admin])?;
    payload.validate()?;

    // Non-admins may publish only one bootcamp. Check-then-act: two
    // concurrent creates from the same identity can both pass this check
    // before either insert commits.
    let existing = state
        .db
        .bootcamps()
        .find_one(doc! { "user": &user.id }, None)
        .await
        .map_err(AppError::from)?;

    if existing.is_some() && user.role != Role::Admin {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "The user with id {} has already published a bootcamp",
            user.id
        )));
    }

    let mut bootcamp = Bootcamp::new(
        payload.name,
        payload.description,
        payload.address,
        payload.careers,
        user.id.clone(),
    );
    bootcamp.website = payload.website;
    bootcamp.phone = payload.phone;
    bootcamp.email = payload.email;
    bootcamp.housing = payload.housing;
    bootcamp.job_assistance = payload.job_assistance;
    bootcamp.job_guarantee = payload.job_guarantee;
    bootcamp.accept_gi = payload.accept_gi;

    // Best-effort geocoding of the address; a provider failure leaves the
    // bootcamp without a location rather than failing the create.
    match state.geocoder.geocode(&bootcamp.address).await {
        Ok(point) => {
            bootcamp.location =
                Some(crate::models::Location::point(point.longitude, point.latitude));
        }
        Err(e) => {
            tracing::warn!(
                bootcamp_id = %bootcamp.id,
                error = %e,
                "Geocoding failed at create time; location left unset"
            );
        }
    }

    state
        .db
        .bootcamps()
        .insert_one(&bootcamp, None)
        .await
        .map_err(AppError::from)?;

    tracing::info!(bootcamp_id = %bootcamp.id, owner = %bootcamp.user, "Bootcamp created");

    Ok((StatusCode::CREATED, Json(DataResponse::new(bootcamp))))
}

pub async fn update_bootcamp(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Json(payload): Json<UpdateBootcampPayload>,
) -> Result<impl IntoResponse, AppError> {
    policy::require_role(&user, &[Role::Publisher, Role::Admin])?;
    payload.validate()?;

    let bootcamp = state
        .db
        .bootcamps()
        .find_one(doc! { "_id": &id }, None)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Bootcamp not found with id: {}", id)))?;

    policy::require_owner(&user, &bootcamp.user, &bootcamp.id)?;

    let mut set = Document::new();
    if let Some(name) = payload.name {
        set.insert("slug", slugify(&name));
        set.insert("name", name);
    }
    if let Some(description) = payload.description {
        set.insert("description", description);
    }
    if let Some(website) = payload.website {
        set.insert("website", website);
    }
    if let Some(phone) = payload.phone {
        set.insert("phone", phone);
    }
    if let Some(email) = payload.email {
        set.insert("email", email);
    }
    if let Some(careers) = payload.careers {
        set.insert("careers", to_bson(&careers).map_err(|e| AppError::InternalError(e.into()))?);
    }
    if let Some(housing) = payload.housing {
        set.insert("housing", housing);
    }
    if let Some(job_assistance) = payload.job_assistance {
        set.insert("job_assistance", job_assistance);
    }
    if let Some(job_guarantee) = payload.job_guarantee {
        set.insert("job_guarantee", job_guarantee);
    }
    if let Some(accept_gi) = payload.accept_gi {
        set.insert("accept_gi", accept_gi);
    }
    if set.is_empty() {
        return Err(AppError::BadRequest(anyhow::anyhow!("Nothing to update")));
    }

    let options = FindOneAndUpdateOptions::builder()
        .return_document(ReturnDocument::After)
        .build();

    let updated = state
        .db
        .bootcamps()
        .find_one_and_update(doc! { "_id": &id }, doc! { "$set": set }, options)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Bootcamp not found with id: {}", id)))?;

    Ok(Json(DataResponse::new(updated)))
}

pub async fn delete_bootcamp(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    policy::require_role(&user, &[Role::Publisher, Role::Admin])?;

    let bootcamp = state
        .db
        .bootcamps()
        .find_one(doc! { "_id": &id }, None)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Bootcamp not found with id: {}", id)))?;

    policy::require_owner(&user, &bootcamp.user, &bootcamp.id)?;

    // Cascade: a bootcamp's courses and reviews go with it.
    state
        .db
        .courses()
        .delete_many(doc! { "bootcamp": &id }, None)
        .await
        .map_err(AppError::from)?;
    state
        .db
        .reviews()
        .delete_many(doc! { "bootcamp": &id }, None)
        .await
        .map_err(AppError::from)?;
    state
        .db
        .bootcamps()
        .delete_one(doc! { "_id": &id }, None)
        .await
        .map_err(AppError::from)?;

    tracing::info!(bootcamp_id = %id, deleted_by = %user.id, "Bootcamp deleted");

    Ok(Json(DataResponse::new(serde_json::json!({}))))
}

pub async fn bootcamps_in_radius(
    State(state): State<AppState>,
    Path((zipcode, distance)): Path<(String, f64)>,
) -> Result<impl IntoResponse, AppError> {
    let distance = crate::services::validate_distance(distance)?;
    let center = state.geocoder.geocode(&zipcode).await?;
    let radius = angular_radius(distance, state.config.geocoder.units);

    let mut cursor = state
        .db
        .bootcamps()
        .find(radius_filter(center, radius), None)
        .await
        .map_err(AppError::from)?;

    let mut bootcamps = Vec::new();
    while let Some(bootcamp) = cursor.try_next().await.map_err(AppError::from)? {
        bootcamps.push(bootcamp);
    }

    Ok(Json(CountedResponse::new(bootcamps)))
}

pub async fn upload_bootcamp_photo(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    policy::require_role(&user, &[Role::Publisher, Role::Admin])?;

    let bootcamp = state
        .db
        .bootcamps()
        .find_one(doc! { "_id": &id }, None)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Bootcamp not found with id: {}", id)))?;

    policy::require_owner(&user, &bootcamp.user, &bootcamp.id)?;

    let field = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(anyhow::anyhow!("Failed to read multipart field: {}", e)))?
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("Please upload a file")))?;

    let mime_type = field.content_type().unwrap_or("").to_string();
    if !mime_type.starts_with("image/") {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Please upload an image file"
        )));
    }

    let original_name = field.file_name().unwrap_or("photo").to_string();
    let data = field
        .bytes()
        .await
        .map_err(|e| AppError::BadRequest(anyhow::anyhow!("Failed to read file bytes: {}", e)))?;

    if data.len() as u64 > state.config.uploads.max_file_size {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Please upload an image smaller than {} bytes",
            state.config.uploads.max_file_size
        )));
    }

    let extension = std::path::Path::new(&original_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("jpg");
    let file_name = format!("photo_{}.{}", bootcamp.id, extension);

    tokio::fs::create_dir_all(&state.config.uploads.path).await?;
    tokio::fs::write(
        std::path::Path::new(&state.config.uploads.path).join(&file_name),
        &data,
    )
    .await?;

    state
        .db
        .bootcamps()
        .update_one(
            doc! { "_id": &id },
            doc! { "$set": { "photo": &file_name } },
            None,
        )
        .await
        .map_err(AppError::from)?;

    tracing::info!(bootcamp_id = %id, file = %file_name, "Bootcamp photo uploaded");

    Ok(Json(DataResponse::new(file_name)))
}
