use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use parley_persist::{NewUser, PersistError, Subscription, User};
use serde::{Deserialize, Serialize};

use super::present;
use crate::auth::MaybeUser;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

const BCRYPT_COST: u32 = 10;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
    pub username: Option<String>,
    pub phone: Option<String>,
    pub lastname: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionView {
    pub plan: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl SubscriptionView {
    /// Shown to callers without an account
    fn free() -> Self {
        Self {
            plan: "free".to_string(),
            start_date: None,
            end_date: None,
            status: None,
        }
    }
}

impl From<&Subscription> for SubscriptionView {
    fn from(sub: &Subscription) -> Self {
        Self {
            plan: sub.plan.clone(),
            start_date: Some(sub.start_date),
            end_date: sub.end_date,
            status: Some(sub.status.clone()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserView {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub username: Option<String>,
    pub phone: Option<String>,
    pub lastname: Option<String>,
    pub subscription: SubscriptionView,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
            username: user.username.clone(),
            phone: user.phone.clone(),
            lastname: user.lastname.clone(),
            subscription: SubscriptionView::from(&user.subscription),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserView,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionStatusResponse {
    pub is_active: bool,
    pub subscription: SubscriptionView,
    pub message: String,
}

async fn hash_password(password: String) -> ApiResult<String> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, BCRYPT_COST))
        .await
        .map_err(ApiError::internal)?
        .map_err(ApiError::internal)
}

async fn verify_password(password: String, hash: String) -> bool {
    match tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash)).await {
        Ok(Ok(valid)) => valid,
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "stored password hash unreadable");
            false
        }
        Err(e) => {
            tracing::error!(error = %e, "password check task failed");
            false
        }
    }
}

/// Create an account on the free plan and log it in
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let (Some(email), Some(password)) = (present(req.email), req.password.filter(|p| !p.is_empty()))
    else {
        return Err(ApiError::bad_request("Email and password required"));
    };

    let mut new_user = NewUser::new(email, hash_password(password).await?);
    new_user.name = req.name;
    new_user.username = req.username;
    new_user.phone = req.phone;
    new_user.lastname = req.lastname;

    let user = match state.engine.users().create_user(new_user).await {
        Ok(user) => user,
        Err(PersistError::DuplicateEmail(_)) => {
            return Err(ApiError::bad_request("User already exists"));
        }
        Err(e) => return Err(e.into()),
    };

    tracing::info!(user_id = %user.id, "user registered");
    let token = state.keys.issue(&user.id, &user.email)?;
    Ok(Json(AuthResponse {
        token,
        user: UserView::from(&user),
    }))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let invalid = || ApiError::Unauthorized("Invalid credentials");
    let (Some(email), Some(password)) = (present(req.email), req.password) else {
        return Err(invalid());
    };

    let user = state
        .engine
        .users()
        .find_by_email(&email)
        .await?
        .ok_or_else(invalid)?;
    if !verify_password(password, user.password_hash.clone()).await {
        return Err(invalid());
    }

    let token = state.keys.issue(&user.id, &user.email)?;
    Ok(Json(AuthResponse {
        token,
        user: UserView::from(&user),
    }))
}

pub async fn subscription_status(
    State(state): State<AppState>,
    user: MaybeUser,
) -> ApiResult<Json<SubscriptionStatusResponse>> {
    let inactive = |message: &str| {
        Json(SubscriptionStatusResponse {
            is_active: false,
            subscription: SubscriptionView::free(),
            message: message.to_string(),
        })
    };

    let Some(id) = user.id() else {
        return Ok(inactive("Not logged in"));
    };
    let Some(account) = state.engine.users().find_by_id(id).await? else {
        return Ok(inactive("User not found"));
    };

    let is_active = account.subscription.is_active(Utc::now());
    Ok(Json(SubscriptionStatusResponse {
        is_active,
        subscription: SubscriptionView::from(&account.subscription),
        message: if is_active {
            "Subscription active".to_string()
        } else {
            "Subscription inactive or expired".to_string()
        },
    }))
}
