// SPDX-License-Identifier: Apache-2.0

use crate::{ApiError, ApiErrorCode};

pub const API_ERROR_SCHEMA_REF: &str = "#/components/schemas/ApiError";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiErrorMapping {
    pub status_code: u16,
    pub schema_ref: &'static str,
}

#[must_use]
pub fn map_error(error: &ApiError) -> ApiErrorMapping {
    let status_code = match error.code {
        ApiErrorCode::Unauthorized => 401,
        ApiErrorCode::Forbidden => 403,
        ApiErrorCode::NotFound => 404,
        ApiErrorCode::MissingBodyField
        | ApiErrorCode::InvalidBodyField
        | ApiErrorCode::InvalidQueryParameter
        | ApiErrorCode::ValidationFailed => 400,
        ApiErrorCode::BookingConflict => 409,
        ApiErrorCode::RateLimited => 429,
        ApiErrorCode::NotReady => 503,
        _ => 500,
    };

    ApiErrorMapping {
        status_code,
        schema_ref: API_ERROR_SCHEMA_REF,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_maps_to_409() {
        assert_eq!(map_error(&ApiError::booking_conflict()).status_code, 409);
    }

    #[test]
    fn draining_maps_to_503() {
        assert_eq!(map_error(&ApiError::not_ready()).status_code, 503);
    }

    #[test]
    fn unknown_codes_fall_through_to_500() {
        assert_eq!(map_error(&ApiError::internal()).status_code, 500);
    }
}
