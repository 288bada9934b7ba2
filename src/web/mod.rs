use axum::{
    Extension, Json, Router,
    extract::State,
    middleware as axum_middleware,
    routing::{get, post},
};
use rand::RngCore;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::db::models::StoreStats;
use crate::db::store::Store;
use crate::scheduler::CheckScheduler;
use crate::server::config::ServerConfig;
use crate::web::{
    error::AppError,
    models::{
        AccountResponse, AuthResponse, AuthenticatedUser, LoginRequest, NewsletterRequest,
        RegisterRequest,
    },
};

pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    pub scheduler: Arc<CheckScheduler>,
    pub config: Arc<ServerConfig>,
}

pub fn create_axum_router(state: Arc<AppState>) -> Router {
    let protected = Router::new()
        .nest("/api/monitors", routes::monitor_routes::create_monitor_router())
        .route("/api/account", get(account_handler))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::auth,
        ));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/register", post(register_handler))
        .route("/api/login", post(login_handler))
        .route("/api/stats", get(stats_handler))
        .route("/api/newsletter", post(newsletter_handler))
        .merge(protected)
        .layer(cors)
        .with_state(state)
}

async fn register_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    if payload.email.trim().is_empty() || payload.password.is_empty() {
        return Err(AppError::InvalidInput(
            "Email and password required".to_string(),
        ));
    }
    if state
        .store
        .get_user_by_email(&payload.email)
        .await
        .is_some()
    {
        return Err(AppError::InvalidInput(
            "Email already registered".to_string(),
        ));
    }

    let password_hash = bcrypt::hash(&payload.password, bcrypt::DEFAULT_COST)
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {e}")))?;
    let user = state
        .store
        .create_user(payload.email, password_hash, generate_api_key())
        .await?;

    Ok(Json(AuthResponse {
        success: true,
        api_key: user.api_key,
        plan: user.plan,
    }))
}

async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let user = state
        .store
        .get_user_by_email(&payload.email)
        .await
        .ok_or(AppError::InvalidCredentials)?;

    let valid = bcrypt::verify(&payload.password, &user.password_hash)
        .map_err(|e| AppError::Internal(format!("Password verification failed: {e}")))?;
    if !valid {
        return Err(AppError::InvalidCredentials);
    }

    Ok(Json(AuthResponse {
        success: true,
        api_key: user.api_key,
        plan: user.plan,
    }))
}

async fn account_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<AccountResponse>, AppError> {
    let monitors = state.store.monitors_for_user(user.id).await.len();
    Ok(Json(AccountResponse {
        email: user.email,
        plan: user.plan,
        monitors,
        limits: user.plan.limits(),
    }))
}

async fn stats_handler(State(state): State<Arc<AppState>>) -> Json<StoreStats> {
    Json(state.store.stats().await)
}

async fn newsletter_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<NewsletterRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    if payload.email.trim().is_empty() {
        return Err(AppError::InvalidInput("Email required".to_string()));
    }
    match state.store.add_newsletter_subscriber(&payload.email).await? {
        Some(_) => Ok(Json(serde_json::json!({ "success": true }))),
        None => Err(AppError::InvalidInput("Already subscribed".to_string())),
    }
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

fn generate_api_key() -> String {
    let mut bytes = [0u8; 24];
    rand::rng().fill_bytes(&mut bytes);
    format!("pp_{}", hex::encode(bytes))
}
