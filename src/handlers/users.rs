use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use mongodb::bson::{doc, to_bson, Document};
use mongodb::options::{FindOneAndUpdateOptions, ReturnDocument};
use validator::Validate;

use crate::dtos::{CreateUserPayload, DataResponse, UpdateUserPayload, UserResponse};
use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::models::{Role, User};
use crate::services::{policy, query};
use crate::startup::AppState;
use crate::utils::password::hash_password;

const USER_FIELDS: &[&str] = &["name", "email", "role", "created_at"];

pub async fn list_users(
    State(state): State<AppState>,
    AuthUser(current): AuthUser,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<impl IntoResponse, AppError> {
    policy::require_role(&current, &[Role::Admin])?;

    let shaped = query::ListQuery::parse(&params, USER_FIELDS)?;
    let page = query::run_paged(&state.db.users(), &shaped).await?;

    let data: Vec<UserResponse> = page.data.into_iter().map(Into::into).collect();
    Ok(Json(query::PagedResult {
        success: true,
        count: data.len(),
        pagination: page.pagination,
        data,
    }))
}

pub async fn get_user(
    State(state): State<AppState>,
    AuthUser(current): AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    policy::require_role(&current, &[Role::Admin])?;

    let user = state
        .db
        .users()
        .find_one(doc! { "_id": &id }, None)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("User not found with id: {}", id)))?;

    Ok(Json(DataResponse::new(UserResponse::from(user))))
}

pub async fn create_user(
    State(state): State<AppState>,
    AuthUser(current): AuthUser,
    Json(payload): Json<CreateUserPayload>,
) -> Result<impl IntoResponse, AppError> {
    policy::require_role(&current, &[Role::Admin])?;
    payload.validate()?;

    if state.db.email_taken(&payload.email, None).await? {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Email already registered"
        )));
    }

    let password_hash = hash_password(&payload.password)?;
    let user = User::new(payload.name, payload.email, payload.role, password_hash);

    state
        .db
        .users()
        .insert_one(&user, None)
        .await
        .map_err(AppError::from)?;

    tracing::info!(user_id = %user.id, created_by = %current.id, "User created");

    Ok((
        StatusCode::CREATED,
        Json(DataResponse::new(UserResponse::from(user))),
    ))
}

pub async fn update_user(
    State(state): State<AppState>,
    AuthUser(current): AuthUser,
    Path(id): Path<String>,
    Json(payload): Json<UpdateUserPayload>,
) -> Result<impl IntoResponse, AppError> {
    policy::require_role(&current, &[Role::Admin])?;
    payload.validate()?;

    let mut set = Document::new();
    if let Some(name) = payload.name {
        set.insert("name", name);
    }
    if let Some(email) = payload.email {
        if state.db.email_taken(&email, Some(&id)).await? {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Email already registered"
            )));
        }
        set.insert("email", email);
    }
    if let Some(role) = payload.role {
        set.insert(
            "role",
            to_bson(&role).map_err(|e| AppError::InternalError(e.into()))?,
        );
    }
    if set.is_empty() {
        return Err(AppError::BadRequest(anyhow::anyhow!("Nothing to update")));
    }

    let options = FindOneAndUpdateOptions::builder()
        .return_document(ReturnDocument::After)
        .build();

    let updated = state
        .db
        .users()
        .find_one_and_update(doc! { "_id": &id }, doc! { "$set": set }, options)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("User not found with id: {}", id)))?;

    Ok(Json(DataResponse::new(UserResponse::from(updated))))
}

pub async fn delete_user(
    State(state): State<AppState>,
    AuthUser(current): AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    policy::require_role(&current, &[Role::Admin])?;

    let deleted = state
        .db
        .users()
        .delete_one(doc! { "_id": &id }, None)
        .await
        .map_err(AppError::from)?;

    if deleted.deleted_count == 0 {
        return Err(AppError::NotFound(anyhow::anyhow!(
            "User not found with id: {}",
            id
        )));
    }

    Ok(Json(DataResponse::new(serde_json::json!({}))))
}
