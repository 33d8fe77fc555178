use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2,
};
use axum::{
    extract::Extension,
    http::StatusCode,
    middleware::from_fn_with_state,
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};
use validator::Validate;

use super::extract::AppJson;
use crate::config::AuthConfig;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::{generate_token, shared_token_middleware};
use crate::repositories::ApiUserRepository;
use crate::AppState;

//ROUTERS
pub fn user_router(auth: Arc<AuthConfig>) -> Router {
    Router::new()
        .route(
            "/register",
            post(register_user).route_layer(from_fn_with_state(auth, shared_token_middleware)),
        )
        .route("/login", post(login))
}

//ROUTES
async fn register_user(
    Extension(state): Extension<AppState>,
    AppJson(payload): AppJson<Credentials>,
) -> AppResult<impl IntoResponse> {
    let payload = payload.trimmed()?;
    payload.validate()?;

    if ApiUserRepository::username_taken(state.db.as_ref(), &payload.username).await? {
        return Err(AppError::Conflict("Username already exists".into()));
    }

    let password = hash_password(&payload.password)
        .map_err(|err| AppError::Internal(format!("Failed to hash password: {err}")))?;
    ApiUserRepository::create(state.db.as_ref(), &payload.username, password).await?;

    info!(username = %payload.username, "User registered");
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User registered successfully"
        })),
    ))
}

async fn login(
    Extension(state): Extension<AppState>,
    AppJson(payload): AppJson<Credentials>,
) -> AppResult<impl IntoResponse> {
    let payload = payload.trimmed()?;
    let invalid = || AppError::Unauthorized("Invalid username or password".into());

    let user = ApiUserRepository::find_by_username(state.db.as_ref(), &payload.username)
        .await?
        .ok_or_else(invalid)?;
    if user.check_hash(&payload.password).is_err() {
        warn!(username = %payload.username, "Login with a wrong password");
        return Err(invalid());
    }

    let token = generate_token(&state.auth, &user.username)?;
    Ok(Json(json!({
        "token": token
    })))
}

fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    Ok(argon2.hash_password(password.as_bytes(), &salt)?.to_string())
}

//STRUCTS
#[derive(Deserialize, Validate, Clone, Debug)]
struct Credentials {
    #[serde(default)]
    #[validate(regex(path = *USERNAME_REGEX, message = "Username may only hold letters, digits and _.@-"))]
    username: String,
    #[serde(default)]
    password: String,
}

impl Credentials {
    fn trimmed(self) -> AppResult<Self> {
        let username = self.username.trim().to_string();
        if username.is_empty() || self.password.trim().is_empty() {
            return Err(AppError::Validation("Username and password are required".into()));
        }
        Ok(Credentials {
            username,
            password: self.password,
        })
    }
}

static USERNAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_.@-]{1,100}$").unwrap());
