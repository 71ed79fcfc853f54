use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use mongodb::bson::doc;
use service_core::error::AppError;

use crate::{
    dtos::auth::{LoginRequest, RegisterRequest},
    middleware::CurrentUser,
    models::User,
    services::{database::is_duplicate_key, ServiceError},
    utils::{hash_password, verify_against_dummy, verify_password, Password, ValidatedJson},
    AppState,
};

pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    if !req.role.is_self_assignable() {
        return Err(AppError::forbidden(format!(
            "Role '{}' cannot be self-assigned",
            req.role
        )));
    }

    let email = req.email.to_lowercase();
    let existing = state
        .db
        .users()
        .find_one(doc! { "email": &email }, None)
        .await?;
    if existing.is_some() {
        return Err(ServiceError::EmailAlreadyRegistered.into());
    }

    let password_hash = hash_password(&Password::new(req.password))?;
    let user = User::new(
        email,
        password_hash,
        req.name,
        req.role,
        req.phone_number,
    );

    if let Err(e) = state.db.users().insert_one(&user, None).await {
        if is_duplicate_key(&e) {
            return Err(ServiceError::EmailAlreadyRegistered.into());
        }
        tracing::error!(error = %e, "Failed to insert user");
        return Err(e.into());
    }

    tracing::info!(user_id = %user.id, role = %user.role, "User registered");

    let tokens = state
        .jwt
        .token_response(&user.id, &user.email, user.role)?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "user": user.sanitized(),
            "token": tokens,
        })),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let password = Password::new(req.password);
    let Some(user) = state
        .db
        .users()
        .find_one(doc! { "email": req.email.to_lowercase() }, None)
        .await?
    else {
        verify_against_dummy(&password);
        return Err(ServiceError::InvalidCredentials.into());
    };

    if !verify_password(&password, &user.password_hash) {
        tracing::info!(user_id = %user.id, "Login failed");
        return Err(ServiceError::InvalidCredentials.into());
    }

    let tokens = state
        .jwt
        .token_response(&user.id, &user.email, user.role)?;

    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(tokens))
}

pub async fn me(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    let record = state
        .db
        .users()
        .find_one(doc! { "_id": &user.user_id }, None)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;

    Ok(Json(record.sanitized()))
}
