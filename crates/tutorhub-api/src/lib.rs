#![forbid(unsafe_code)]

//! HTTP-facing contract for tutorhub: error codes and their status mapping,
//! request body shapes, and query parameter parsing. No I/O lives here; the
//! server crate wires these into axum handlers.

pub mod dto;
mod error_mapping;
mod errors;
pub mod params;

pub use error_mapping::{map_error, ApiErrorMapping, API_ERROR_SCHEMA_REF};
pub use errors::{ApiError, ApiErrorCode};

use serde_json::{json, Value};

pub const CRATE_NAME: &str = "tutorhub-api";

#[must_use]
pub fn openapi_v1_spec() -> Value {
    json!({
      "openapi": "3.0.3",
      "info": {
        "title": "tutorhub API",
        "version": "v1"
      },
      "paths": {
        "/healthz": {"get": {"responses": {"200": {"description": "ok"}}}},
        "/readyz": {"get": {"responses": {"200": {"description": "ready"}, "503": {"description": "not ready"}}}},
        "/metrics": {"get": {"responses": {"200": {"description": "prometheus metrics"}}}},
        "/v1/version": {"get": {"responses": {"200": {"description": "build identity"}}}},
        "/v1/sessions": {
          "get": {
            "parameters": [
              {"name": "status", "in": "query", "schema": {"type": "string", "enum": ["scheduled", "in_progress", "completed", "cancelled"]}},
              {"name": "from", "in": "query", "schema": {"type": "string", "format": "date"}},
              {"name": "to", "in": "query", "schema": {"type": "string", "format": "date"}}
            ],
            "responses": {
              "200": {"description": "role-scoped session list"},
              "401": {"description": "missing or unknown bearer token", "content": {"application/json": {"schema": {"$ref": API_ERROR_SCHEMA_REF}}}}
            }
          },
          "post": {
            "responses": {
              "201": {"description": "session booked"},
              "400": {"description": "invalid body", "content": {"application/json": {"schema": {"$ref": API_ERROR_SCHEMA_REF}}}},
              "409": {"description": "tutor slot already booked", "content": {"application/json": {"schema": {"$ref": API_ERROR_SCHEMA_REF}}}}
            }
          }
        },
        "/v1/sessions/{id}": {
          "get": {"responses": {"200": {"description": "session"}, "403": {"description": "not yours"}, "404": {"description": "unknown id"}}},
          "patch": {"responses": {"200": {"description": "updated session"}, "400": {"description": "invalid transition"}, "409": {"description": "reschedule conflict"}}},
          "delete": {"responses": {"200": {"description": "deleted"}}}
        },
        "/v1/tutors": {
          "get": {
            "parameters": [
              {"name": "subject", "in": "query", "schema": {"type": "string", "description": "subject id filter"}}
            ],
            "responses": {"200": {"description": "tutor list"}}
          }
        },
        "/v1/tutors/{id}": {
          "get": {"responses": {"200": {"description": "tutor with subjects"}, "404": {"description": "not a tutor"}}},
          "patch": {"responses": {"200": {"description": "updated profile"}, "403": {"description": "admin or self only"}}}
        },
        "/v1/tutors/{id}/slots": {
          "get": {
            "parameters": [
              {"name": "date", "in": "query", "required": true, "schema": {"type": "string", "format": "date"}},
              {"name": "duration", "in": "query", "schema": {"type": "integer", "minimum": 1, "maximum": 240}}
            ],
            "responses": {"200": {"description": "free slot start times"}}
          }
        },
        "/v1/tutors/availability": {
          "get": {
            "parameters": [
              {"name": "tutor_id", "in": "query", "required": true, "schema": {"type": "string"}}
            ],
            "responses": {"200": {"description": "windows plus upcoming booked sessions"}}
          },
          "post": {"responses": {"201": {"description": "window created"}, "403": {"description": "tutor only"}}}
        },
        "/v1/tutors/availability/{id}": {
          "delete": {"responses": {"200": {"description": "window removed"}, "403": {"description": "owner or admin only"}}}
        },
        "/v1/tutors/availability/exceptions": {
          "post": {"responses": {"201": {"description": "exception recorded"}, "403": {"description": "tutor only"}}}
        },
        "/v1/students": {
          "get": {
            "parameters": [
              {"name": "tutor_id", "in": "query", "schema": {"type": "string"}},
              {"name": "parent_id", "in": "query", "schema": {"type": "string"}}
            ],
            "responses": {"200": {"description": "role-scoped student list"}}
          }
        },
        "/v1/children": {
          "get": {"responses": {"200": {"description": "linked students of the calling parent"}}},
          "post": {"responses": {"201": {"description": "link created"}, "403": {"description": "parent or admin only"}}}
        },
        "/v1/subjects": {
          "get": {"responses": {"200": {"description": "subject catalog"}}},
          "post": {"responses": {"201": {"description": "subject created"}, "403": {"description": "admin only"}}}
        },
        "/v1/subjects/{id}": {
          "get": {"responses": {"200": {"description": "subject"}, "404": {"description": "unknown id"}}},
          "patch": {"responses": {"200": {"description": "updated subject"}, "403": {"description": "admin only"}}},
          "delete": {"responses": {"200": {"description": "deleted"}, "403": {"description": "admin only"}}}
        },
        "/v1/progress": {
          "get": {
            "parameters": [
              {"name": "student_id", "in": "query", "schema": {"type": "string"}},
              {"name": "subject", "in": "query", "schema": {"type": "string"}},
              {"name": "timeframe", "in": "query", "schema": {"type": "string", "default": "3months"}}
            ],
            "responses": {"200": {"description": "progress report"}, "403": {"description": "relationship required"}}
          },
          "post": {"responses": {"201": {"description": "record appended"}, "403": {"description": "tutor or admin only"}}}
        },
        "/v1/ai/quiz": {"post": {"responses": {"200": {"description": "generated quiz"}, "400": {"description": "both question types disabled"}}}},
        "/v1/ai/teaching-plan": {"post": {"responses": {"200": {"description": "generated plan"}}}},
        "/v1/ai/recommendations": {"post": {"responses": {"200": {"description": "recommendation list"}, "403": {"description": "relationship required"}}}},
        "/v1/quizzes/{id}/attempts": {"post": {"responses": {"201": {"description": "attempt recorded"}}}}
      },
      "components": {
        "schemas": {
          "ApiError": {
            "type": "object",
            "required": ["code", "message"],
            "properties": {
              "code": {"type": "string"},
              "message": {"type": "string"},
              "details": {"type": "object"}
            }
          }
        },
        "securitySchemes": {
          "bearerAuth": {"type": "http", "scheme": "bearer"}
        }
      },
      "security": [{"bearerAuth": []}]
    })
}
