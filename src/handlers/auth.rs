use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{Duration, Utc};
use mongodb::bson::{doc, Document};
use rand::RngCore;
use sha2::{Digest, Sha256};
use validator::Validate;

use crate::dtos::{
    DataResponse, ForgotPasswordPayload, LoginPayload, RegisterPayload, ResetPasswordPayload,
    TokenResponse, UpdateDetailsPayload, UpdatePasswordPayload, UserResponse,
};
use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::models::{Role, User};
use crate::startup::AppState;
use crate::utils::password::{hash_password, verify_password};

const RESET_TOKEN_TTL_MINUTES: i64 = 10;

fn invalid_credentials() -> AppError {
    AppError::Unauthorized(anyhow::anyhow!("Invalid credentials"))
}

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    if state.db.email_taken(&payload.email, None).await? {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Email already registered"
        )));
    }

    let role: Role = payload.role.map(Into::into).unwrap_or(Role::User);
    let password_hash = hash_password(&payload.password)?;
    let user = User::new(payload.name, payload.email, role, password_hash);

    state
        .db
        .users()
        .insert_one(&user, None)
        .await
        .map_err(AppError::from)?;

    tracing::info!(user_id = %user.id, role = %user.role, "User registered");

    let token = state.jwt.generate_token(&user.id)?;
    Ok((
        StatusCode::CREATED,
        Json(TokenResponse {
            success: true,
            token,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    // Unknown email and wrong password are indistinguishable to the caller.
    let user = state
        .db
        .users()
        .find_one(doc! { "email": &payload.email }, None)
        .await
        .map_err(AppError::from)?
        .ok_or_else(invalid_credentials)?;

    verify_password(&payload.password, &user.password).map_err(|_| invalid_credentials())?;

    let token = state.jwt.generate_token(&user.id)?;
    Ok(Json(TokenResponse {
        success: true,
        token,
    }))
}

pub async fn logout() -> impl IntoResponse {
    // Tokens are stateless; logout is an acknowledgement for clients that
    // discard their copy.
    Json(DataResponse::new(serde_json::json!({})))
}

pub async fn me(
    State(state): State<AppState>,
    AuthUser(current): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let user = state
        .db
        .users()
        .find_one(doc! { "_id": &current.id }, None)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("User not found")))?;

    Ok(Json(DataResponse::new(UserResponse::from(user))))
}

pub async fn update_details(
    State(state): State<AppState>,
    AuthUser(current): AuthUser,
    Json(payload): Json<UpdateDetailsPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let mut set = Document::new();
    if let Some(name) = payload.name {
        set.insert("name", name);
    }
    if let Some(email) = payload.email {
        if state.db.email_taken(&email, Some(&current.id)).await? {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Email already registered"
            )));
        }
        set.insert("email", email);
    }
    if set.is_empty() {
        return Err(AppError::BadRequest(anyhow::anyhow!("Nothing to update")));
    }

    let options = mongodb::options::FindOneAndUpdateOptions::builder()
        .return_document(mongodb::options::ReturnDocument::After)
        .build();

    let updated = state
        .db
        .users()
        .find_one_and_update(doc! { "_id": &current.id }, doc! { "$set": set }, options)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("User not found")))?;

    Ok(Json(DataResponse::new(UserResponse::from(updated))))
}

pub async fn update_password(
    State(state): State<AppState>,
    AuthUser(current): AuthUser,
    Json(payload): Json<UpdatePasswordPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let user = state
        .db
        .users()
        .find_one(doc! { "_id": &current.id }, None)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("User not found")))?;

    verify_password(&payload.current_password, &user.password)
        .map_err(|_| AppError::Unauthorized(anyhow::anyhow!("Password is incorrect")))?;

    let new_hash = hash_password(&payload.new_password)?;
    state
        .db
        .users()
        .update_one(
            doc! { "_id": &current.id },
            doc! { "$set": { "password": new_hash } },
            None,
        )
        .await
        .map_err(AppError::from)?;

    let token = state.jwt.generate_token(&current.id)?;
    Ok(Json(TokenResponse {
        success: true,
        token,
    }))
}

pub async fn forgot_password(
    State(state): State<AppState>,
    Json(payload): Json<ForgotPasswordPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let user = state
        .db
        .users()
        .find_one(doc! { "email": &payload.email }, None)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("There is no user with that email")))?;

    // The raw token goes to the user; only its SHA-256 hash is stored.
    let mut token_bytes = [0u8; 20];
    rand::thread_rng().fill_bytes(&mut token_bytes);
    let reset_token = hex::encode(token_bytes);
    let hashed = hex::encode(Sha256::digest(reset_token.as_bytes()));

    let expire = mongodb::bson::DateTime::from_chrono(
        Utc::now() + Duration::minutes(RESET_TOKEN_TTL_MINUTES),
    );

    state
        .db
        .users()
        .update_one(
            doc! { "_id": &user.id },
            doc! { "$set": {
                "reset_password_token": &hashed,
                "reset_password_expire": expire,
            }},
            None,
        )
        .await
        .map_err(AppError::from)?;

    if let Err(e) = state
        .email
        .send_password_reset_email(&user.email, &reset_token)
        .await
    {
        // Undo the stored token so a half-completed request leaves no
        // dangling reset state.
        state
            .db
            .users()
            .update_one(
                doc! { "_id": &user.id },
                doc! { "$unset": {
                    "reset_password_token": "",
                    "reset_password_expire": "",
                }},
                None,
            )
            .await
            .map_err(AppError::from)?;
        return Err(e);
    }

    Ok(Json(DataResponse::new("Email sent".to_string())))
}

pub async fn reset_password(
    State(state): State<AppState>,
    Path(reset_token): Path<String>,
    Json(payload): Json<ResetPasswordPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let hashed = hex::encode(Sha256::digest(reset_token.as_bytes()));
    let now = mongodb::bson::DateTime::from_chrono(Utc::now());

    let user = state
        .db
        .users()
        .find_one(
            doc! {
                "reset_password_token": &hashed,
                "reset_password_expire": { "$gt": now },
            },
            None,
        )
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("Invalid token")))?;

    let new_hash = hash_password(&payload.password)?;
    state
        .db
        .users()
        .update_one(
            doc! { "_id": &user.id },
            doc! {
                "$set": { "password": new_hash },
                "$unset": {
                    "reset_password_token": "",
                    "reset_password_expire": "",
                },
            },
            None,
        )
        .await
        .map_err(AppError::from)?;

    tracing::info!(user_id = %user.id, "Password reset completed");

    let token = state.jwt.generate_token(&user.id)?;
    Ok(Json(TokenResponse {
        success: true,
        token,
    }))
}
