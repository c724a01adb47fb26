use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use minikart::{Account, Role};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::info;

use crate::server::auth::{hash_password, mint_token, verify_password};
use crate::server::error::ApiError;
use crate::server::now_millis;
use crate::server::routes::authenticate;
use crate::server::state::SharedState;

#[derive(Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Public view of an account; never carries the password digest.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub id: Option<u64>,
    pub member_id: Option<String>,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub profile_image: String,
    pub role: Role,
}

impl From<&Account> for ProfileResponse {
    fn from(account: &Account) -> Self {
        Self {
            id: account.key,
            member_id: account.member_id.clone(),
            name: account.name.clone(),
            email: account.email.clone(),
            phone: account.phone.clone(),
            profile_image: account.profile_image.clone(),
            role: account.role,
        }
    }
}

pub async fn register(
    State(state): State<SharedState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let name = req.name.trim();
    let email = req.email.trim().to_lowercase();

    if name.is_empty() || email.is_empty() || req.password.is_empty() {
        return Err(ApiError::BadRequest(
            "Name, email, and password are required".into(),
        ));
    }
    if req.password.len() < 6 {
        return Err(ApiError::BadRequest(
            "Password must be at least 6 characters long".into(),
        ));
    }
    if state.store.account_by_email(&email)?.is_some() {
        return Err(ApiError::Conflict(
            "User with this email already exists".into(),
        ));
    }

    let mut account = Account::new(name, email, hash_password(&req.password), now_millis());
    // The member ID lands on the record before it first hits the store.
    let member_id = state.allocator.ensure(&state.store, &mut account)?;
    state.store.persist_account(&mut account)?;

    info!("account registered: {member_id}");
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User registered successfully",
            "userId": member_id,
            "user": ProfileResponse::from(&account),
        })),
    ))
}

pub async fn login(
    State(state): State<SharedState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<Value>, ApiError> {
    let email = req.email.trim().to_lowercase();
    let account = state
        .store
        .account_by_email(&email)?
        .ok_or(ApiError::InvalidCredentials)?;

    if !verify_password(&account.password_hash, &req.password) {
        return Err(ApiError::InvalidCredentials);
    }
    let key = account.key.ok_or(ApiError::InvalidCredentials)?;

    let token = mint_token(
        &state.config.token_secret,
        key,
        now_millis() + state.config.token_ttl_millis,
    );
    Ok(Json(json!({
        "token": token,
        "user": ProfileResponse::from(&account),
    })))
}

pub async fn profile(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> Result<Json<ProfileResponse>, ApiError> {
    let mut caller = authenticate(&state, &headers)?;

    // Legacy records acquire their member ID on first read.
    state
        .allocator
        .ensure(&state.store, &mut caller.account)?;

    Ok(Json(ProfileResponse::from(&caller.account)))
}

pub async fn update_profile(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<Value>, ApiError> {
    let mut caller = authenticate(&state, &headers)?;

    if let Some(name) = req.name {
        caller.account.name = name.trim().to_string();
    }
    if let Some(email) = req.email {
        let email = email.trim().to_lowercase();
        if let Some(existing) = state.store.account_by_email(&email)? {
            if existing.key != caller.account.key {
                return Err(ApiError::Conflict(
                    "User with this email already exists".into(),
                ));
            }
        }
        caller.account.email = email;
    }
    if let Some(phone) = req.phone {
        caller.account.phone = Some(phone);
    }
    caller.account.updated_at = now_millis();
    state.store.persist_account(&mut caller.account)?;

    Ok(Json(json!({
        "message": "Profile updated successfully",
        "user": ProfileResponse::from(&caller.account),
    })))
}
