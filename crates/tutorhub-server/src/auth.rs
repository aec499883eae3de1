// SPDX-License-Identifier: Apache-2.0

//! Bearer-token authentication. Tokens are opaque strings resolved against
//! `users.token_identifier`; the role always comes from the user row, never
//! from the request.

use crate::AppState;
use axum::http::HeaderMap;
use tutorhub_api::ApiError;
use tutorhub_model::User;

pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let raw = headers.get("authorization")?.to_str().ok()?;
    let token = raw.strip_prefix("Bearer ").or_else(|| raw.strip_prefix("bearer "))?;
    let token = token.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

pub(crate) fn require_user(state: &AppState, headers: &HeaderMap) -> Result<User, ApiError> {
    let token = bearer_token(headers).ok_or_else(ApiError::unauthorized)?;
    match state.store.find_user_by_token(token) {
        Ok(Some(user)) => Ok(user),
        Ok(None) => Err(ApiError::unauthorized()),
        Err(err) => {
            tracing::error!(error = %err, "token lookup failed");
            Err(ApiError::internal())
        }
    }
}
