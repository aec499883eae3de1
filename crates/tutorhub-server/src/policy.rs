// SPDX-License-Identifier: Apache-2.0

//! Role-based access checks shared by the handlers. Everything funnels
//! through these so an endpoint cannot forget a relationship lookup.

use crate::http::support::store_error;
use crate::AppState;
use tutorhub_api::ApiError;
use tutorhub_model::{Role, Session, User, UserId};

pub(crate) fn require_admin(user: &User) -> Result<(), ApiError> {
    if user.role == Role::Admin {
        Ok(())
    } else {
        Err(ApiError::forbidden("administrator role required"))
    }
}

pub(crate) fn require_tutor(user: &User) -> Result<(), ApiError> {
    if user.role == Role::Tutor {
        Ok(())
    } else {
        Err(ApiError::forbidden("tutor role required"))
    }
}

/// Whether `actor` may read `student_id`'s data (progress, recommendations):
/// the student themselves, a linked parent, a tutor with at least one shared
/// session, or an admin.
pub(crate) fn can_access_student(
    state: &AppState,
    actor: &User,
    student_id: &UserId,
) -> Result<(), ApiError> {
    match actor.role {
        Role::Admin => Ok(()),
        Role::Student => {
            if &actor.id == student_id {
                Ok(())
            } else {
                Err(ApiError::forbidden("students may only access their own data"))
            }
        }
        Role::Parent => {
            if state
                .store
                .is_parent_of(&actor.id, student_id)
                .map_err(store_error)?
            {
                Ok(())
            } else {
                Err(ApiError::forbidden(
                    "parents may only access their linked children",
                ))
            }
        }
        Role::Tutor => {
            if state
                .store
                .has_session_between(&actor.id, student_id)
                .map_err(store_error)?
            {
                Ok(())
            } else {
                Err(ApiError::forbidden(
                    "tutors may only access students they have sessions with",
                ))
            }
        }
    }
}

/// Per-role ownership of a single session record.
pub(crate) fn can_access_session(
    state: &AppState,
    actor: &User,
    session: &Session,
) -> Result<(), ApiError> {
    match actor.role {
        Role::Admin => Ok(()),
        Role::Student => {
            if actor.id == session.student_id {
                Ok(())
            } else {
                Err(ApiError::forbidden("not your session"))
            }
        }
        Role::Tutor => {
            if actor.id == session.tutor_id {
                Ok(())
            } else {
                Err(ApiError::forbidden("not your session"))
            }
        }
        Role::Parent => {
            if state
                .store
                .is_parent_of(&actor.id, &session.student_id)
                .map_err(store_error)?
            {
                Ok(())
            } else {
                Err(ApiError::forbidden("not your child's session"))
            }
        }
    }
}
