use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use futures::stream::TryStreamExt;
use mongodb::bson::{doc, Document};
use mongodb::options::{FindOneAndUpdateOptions, ReturnDocument};
use validator::Validate;

use crate::dtos::{
    BootcampSummary, CountedResponse, CreateReviewPayload, DataResponse, ReviewWithBootcamp,
    UpdateReviewPayload,
};
use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::models::{Review, Role};
use crate::services::{policy, query};
use crate::startup::AppState;

const REVIEW_FIELDS: &[&str] = &["title", "rating", "bootcamp", "user", "created_at"];

pub async fn list_reviews(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<impl IntoResponse, AppError> {
    let shaped = query::ListQuery::parse(&params, REVIEW_FIELDS)?;
    let page = query::run_paged(&state.db.reviews(), &shaped).await?;
    Ok(Json(page))
}

pub async fn list_bootcamp_reviews(
    State(state): State<AppState>,
    Path(bootcamp_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let mut cursor = state
        .db
        .reviews()
        .find(doc! { "bootcamp": &bootcamp_id }, None)
        .await
        .map_err(AppError::from)?;

    let mut reviews = Vec::new();
    while let Some(review) = cursor.try_next().await.map_err(AppError::from)? {
        reviews.push(review);
    }

    Ok(Json(CountedResponse::new(reviews)))
}

pub async fn get_review(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let review = state
        .db
        .reviews()
        .find_one(doc! { "_id": &id }, None)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("No review with the id of {}", id)))?;

    let bootcamp = state
        .db
        .bootcamps()
        .find_one(doc! { "_id": &review.bootcamp }, None)
        .await
        .map_err(AppError::from)?
        .map(|b| BootcampSummary {
            name: b.name,
            description: b.description,
        });

    Ok(Json(DataResponse::new(ReviewWithBootcamp {
        review,
        bootcamp_summary: bootcamp,
    })))
}

pub async fn add_review(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(bootcamp_id): Path<String>,
    Json(payload): Json<CreateReviewPayload>,
) -> Result<impl IntoResponse, AppError> {
    policy::require_role(&user, &[Role::User, Role::Admin])?;
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

    // One review per user per bootcamp; a unique index backs this check
    // against concurrent submissions.
    let existing = state
        .db
        .reviews()
        .find_one(doc! { "bootcamp": &bootcamp.id, "user": &user.id }, None)
        .await
        .map_err(AppError::from)?;
    if existing.is_some() {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "User {} has already submitted a review for bootcamp {}",
            user.id,
            bootcamp.id
        )));
    }

    let review = Review::new(
        payload.title,
        payload.text,
        payload.rating,
        bootcamp.id.clone(),
        user.id.clone(),
    );

    state
        .db
        .reviews()
        .insert_one(&review, None)
        .await
        .map_err(AppError::from)?;

    state.db.recompute_average_rating(&bootcamp.id).await?;

    Ok((StatusCode::CREATED, Json(DataResponse::new(review))))
}

pub async fn update_review(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Json(payload): Json<UpdateReviewPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let review = state
        .db
        .reviews()
        .find_one(doc! { "_id": &id }, None)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("No review with the id of {}", id)))?;

    policy::require_owner(&user, &review.user, &review.id)?;

    let mut set = Document::new();
    if let Some(title) = payload.title {
        set.insert("title", title);
    }
    if let Some(text) = payload.text {
        set.insert("text", text);
    }
    if let Some(rating) = payload.rating {
        set.insert("rating", rating);
    }
    if set.is_empty() {
        return Err(AppError::BadRequest(anyhow::anyhow!("Nothing to update")));
    }

    let options = FindOneAndUpdateOptions::builder()
        .return_document(ReturnDocument::After)
        .build();

    let updated = state
        .db
        .reviews()
        .find_one_and_update(doc! { "_id": &id }, doc! { "$set": set }, options)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("No review with the id of {}", id)))?;

    state.db.recompute_average_rating(&updated.bootcamp).await?;

    Ok(Json(DataResponse::new(updated)))
}

pub async fn delete_review(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let review = state
        .db
        .reviews()
        .find_one(doc! { "_id": &id }, None)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("No review with the id of {}", id)))?;

    policy::require_owner(&user, &review.user, &review.id)?;

    state
        .db
        .reviews()
        .delete_one(doc! { "_id": &id }, None)
        .await
        .map_err(AppError::from)?;

    state.db.recompute_average_rating(&review.bootcamp).await?;

    Ok(Json(DataResponse::new(serde_json::json!({}))))
}
