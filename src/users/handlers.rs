use anyhow::Context;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};

use super::dto::{CurrentUserResponse, NewUserBody};
use crate::{
    auth::{password::hash_password, CurrentUser},
    error::{json_body, AppError},
    state::AppState,
    store::NewUser,
    validation::{self, normalize_email},
};

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/users", get(current_user).post(create_user))
}

#[instrument(skip_all)]
pub async fn current_user(CurrentUser(user): CurrentUser) -> Json<CurrentUserResponse> {
    Json(CurrentUserResponse {
        id: user.id,
        name: user.full_name(),
        username: user.email_address,
    })
}

#[instrument(skip_all)]
pub async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<NewUserBody>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let body = json_body(payload)?;
    validation::new_user(state.store.as_ref(), &body).await?;

    // Validation guarantees every field is present.
    let NewUserBody {
        first_name: Some(first_name),
        last_name: Some(last_name),
        email_address: Some(email_address),
        password: Some(password),
    } = body
    else {
        return Err(anyhow::anyhow!("validated signup body is missing fields").into());
    };

    let password_hash = hash_password(&password).context("hash signup password")?;
    let user = state
        .store
        .create_user(NewUser {
            first_name,
            last_name,
            email_address: normalize_email(&email_address),
            password_hash,
        })
        .await
        .map_err(validation::duplicate_email)?;

    info!(user_id = %user.id, email = %user.email_address, "user registered");
    Ok((StatusCode::CREATED, [(header::LOCATION, "/")]))
}
