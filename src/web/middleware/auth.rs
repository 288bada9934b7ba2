use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use std::sync::Arc;

use crate::web::models::AuthenticatedUser;
use crate::web::{AppState, error::AppError};

/// API-key auth: `x-api-key` header, falling back to an `api_key` query
/// parameter.
pub async fn auth(
    State(state): State<Arc<AppState>>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let api_key = req
        .headers()
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .or_else(|| query_param(req.uri().query(), "api_key"))
        .ok_or(AppError::MissingApiKey)?;

    let user = state
        .store
        .get_user_by_api_key(&api_key)
        .await
        .ok_or(AppError::InvalidApiKey)?;

    req.extensions_mut().insert(AuthenticatedUser {
        id: user.id,
        email: user.email,
        plan: user.plan,
    });
    Ok(next.run(req).await)
}

fn query_param(query: Option<&str>, name: &str) -> Option<String> {
    query?.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        (key == name).then(|| value.to_string())
    })
}
