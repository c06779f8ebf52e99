use axum::{
    extract::State,
    http::StatusCode,
    routing::post,
    Json, Router,
};
use tracing::{error, info, instrument, warn};

use crate::{
    state::AppState,
    users::{
        dto::{LoginRequest, PublicUser, RegisterRequest},
        services::{authenticate, register, RegisterError},
    },
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register_user))
        .route("/auth/login", post(login_user))
}

#[instrument(skip(state, payload), fields(role = %payload.form.role()))]
pub async fn register_user(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<PublicUser>), (StatusCode, String)> {
    match register(state.store.as_ref(), payload).await {
        Ok(user) => {
            info!(user_id = ?user.id, name = %user.name, "user registered");
            Ok((StatusCode::CREATED, Json(PublicUser::from(user))))
        }
        Err(RegisterError::Validation(e)) => Err((StatusCode::BAD_REQUEST, e.to_string())),
        Err(RegisterError::Duplicate(e)) => {
            warn!(error = %e, "duplicate registration");
            Err((StatusCode::CONFLICT, e.to_string()))
        }
        Err(e) => {
            error!(error = %e, "register failed");
            Err((StatusCode::INTERNAL_SERVER_ERROR, "Failed to save user data".into()))
        }
    }
}

#[instrument(skip(state, payload), fields(role = %payload.role, method = ?payload.method))]
pub async fn login_user(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<PublicUser>, (StatusCode, String)> {
    let user = authenticate(
        state.store.as_ref(),
        payload.method,
        &payload.identifier,
        &payload.password,
        payload.role,
    )
    .await;

    match user {
        Some(user) => {
            info!(user_id = ?user.id, "user logged in");
            Ok(Json(PublicUser::from(user)))
        }
        None => {
            warn!("login failed");
            Err((StatusCode::UNAUTHORIZED, "Invalid credentials".into()))
        }
    }
}
