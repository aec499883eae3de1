// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum ApiErrorCode {
    Unauthorized,
    Forbidden,
    NotFound,
    MissingBodyField,
    InvalidBodyField,
    InvalidQueryParameter,
    ValidationFailed,
    BookingConflict,
    RateLimited,
    NotReady,
    Internal,
}

/// Wire error: serialized as `{"error": {code, message, details}}` by the
/// server, with the request id carried in the `x-request-id` header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    pub code: ApiErrorCode,
    pub message: String,
    pub details: Value,
}

impl ApiError {
    #[must_use]
    pub fn new(code: ApiErrorCode, message: impl Into<String>, details: Value) -> Self {
        Self {
            code,
            message: message.into(),
            details,
        }
    }

    #[must_use]
    pub fn unauthorized() -> Self {
        Self::new(ApiErrorCode::Unauthorized, "unauthorized", json!({}))
    }

    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ApiErrorCode::Forbidden, message, json!({}))
    }

    #[must_use]
    pub fn not_found(entity: &str) -> Self {
        Self::new(
            ApiErrorCode::NotFound,
            format!("{entity} not found"),
            json!({"entity": entity}),
        )
    }

    #[must_use]
    pub fn missing_field(name: &str) -> Self {
        Self::new(
            ApiErrorCode::MissingBodyField,
            format!("missing required field: {name}"),
            json!({"field_errors": [{"field": name, "reason": "missing"}]}),
        )
    }

    #[must_use]
    pub fn invalid_field(name: &str, reason: &str) -> Self {
        Self::new(
            ApiErrorCode::InvalidBodyField,
            format!("invalid field: {name}"),
            json!({"field_errors": [{"field": name, "reason": reason}]}),
        )
    }

    #[must_use]
    pub fn invalid_param(name: &str, value: &str) -> Self {
        Self::new(
            ApiErrorCode::InvalidQueryParameter,
            format!("invalid query parameter: {name}"),
            json!({"field_errors": [{"parameter": name, "reason": "invalid", "value": value}]}),
        )
    }

    #[must_use]
    pub fn missing_param(name: &str) -> Self {
        Self::new(
            ApiErrorCode::InvalidQueryParameter,
            format!("missing required query parameter: {name}"),
            json!({"field_errors": [{"parameter": name, "reason": "missing"}]}),
        )
    }

    #[must_use]
    pub fn booking_conflict() -> Self {
        Self::new(
            ApiErrorCode::BookingConflict,
            "tutor already has a session in this time slot",
            json!({}),
        )
    }

    #[must_use]
    pub fn invalid_status_transition(from: &str, to: &str) -> Self {
        Self::new(
            ApiErrorCode::ValidationFailed,
            format!("invalid status transition: {from} -> {to}"),
            json!({"from": from, "to": to}),
        )
    }

    #[must_use]
    pub fn not_ready() -> Self {
        Self::new(
            ApiErrorCode::NotReady,
            "server is not accepting requests",
            json!({}),
        )
    }

    #[must_use]
    pub fn rate_limited() -> Self {
        Self::new(ApiErrorCode::RateLimited, "rate limited", json!({}))
    }

    #[must_use]
    pub fn internal() -> Self {
        Self::new(ApiErrorCode::Internal, "internal error", json!({}))
    }
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

const _: fn() = || {
    fn assert_traits<T: Serialize + for<'de> Deserialize<'de>>() {}
    assert_traits::<ApiErrorCode>();
};
