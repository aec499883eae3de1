// SPDX-License-Identifier: Apache-2.0

use crate::errors::ApiError;
use chrono::NaiveDate;
use std::collections::HashMap;
use tutorhub_model::{SessionStatus, UserId, SLOT_STEP_MINUTES};

pub const DEFAULT_PROGRESS_TIMEFRAME: &str = "3months";
pub const MAX_SLOT_DURATION_MINUTES: u32 = 240;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionListParams {
    pub status: Option<SessionStatus>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

pub fn parse_session_list_params(
    query: &HashMap<String, String>,
) -> Result<SessionListParams, ApiError> {
    let status = query
        .get("status")
        .map(|raw| SessionStatus::parse(raw).map_err(|_| ApiError::invalid_param("status", raw)))
        .transpose()?;
    let from = parse_date_param(query, "from")?;
    let to = parse_date_param(query, "to")?;
    Ok(SessionListParams { status, from, to })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotsParams {
    pub date: NaiveDate,
    pub duration_minutes: u32,
    pub step_minutes: u32,
}

pub fn parse_slots_params(query: &HashMap<String, String>) -> Result<SlotsParams, ApiError> {
    let date = parse_date_param(query, "date")?.ok_or_else(|| ApiError::missing_param("date"))?;
    let duration_minutes = match query.get("duration") {
        Some(raw) => {
            let value = raw
                .parse::<u32>()
                .map_err(|_| ApiError::invalid_param("duration", raw))?;
            if value == 0 || value > MAX_SLOT_DURATION_MINUTES {
                return Err(ApiError::invalid_param("duration", raw));
            }
            value
        }
        None => 60,
    };
    Ok(SlotsParams {
        date,
        duration_minutes,
        step_minutes: SLOT_STEP_MINUTES,
    })
}

#[derive(Debug, Clone, Default)]
pub struct StudentsParams {
    pub tutor_id: Option<UserId>,
    pub parent_id: Option<UserId>,
}

pub fn parse_students_params(query: &HashMap<String, String>) -> Result<StudentsParams, ApiError> {
    Ok(StudentsParams {
        tutor_id: parse_user_id_param(query, "tutor_id")?,
        parent_id: parse_user_id_param(query, "parent_id")?,
    })
}

#[derive(Debug, Clone)]
pub struct ProgressParams {
    /// Defaults to the caller when absent.
    pub student_id: Option<UserId>,
    pub subject: Option<String>,
    pub timeframe: String,
}

pub fn parse_progress_params(query: &HashMap<String, String>) -> Result<ProgressParams, ApiError> {
    Ok(ProgressParams {
        student_id: parse_user_id_param(query, "student_id")?,
        subject: query.get("subject").cloned(),
        timeframe: query
            .get("timeframe")
            .cloned()
            .unwrap_or_else(|| DEFAULT_PROGRESS_TIMEFRAME.to_string()),
    })
}

pub fn parse_user_id_param(
    query: &HashMap<String, String>,
    name: &str,
) -> Result<Option<UserId>, ApiError> {
    query
        .get(name)
        .map(|raw| UserId::parse(raw).map_err(|_| ApiError::invalid_param(name, raw)))
        .transpose()
}

pub fn require_user_id_param(
    query: &HashMap<String, String>,
    name: &str,
) -> Result<UserId, ApiError> {
    parse_user_id_param(query, name)?.ok_or_else(|| ApiError::missing_param(name))
}

pub fn parse_date_param(
    query: &HashMap<String, String>,
    name: &str,
) -> Result<Option<NaiveDate>, ApiError> {
    query
        .get(name)
        .map(|raw| {
            raw.parse::<NaiveDate>()
                .map_err(|_| ApiError::invalid_param(name, raw))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn session_list_params_parse_filters() {
        let params = parse_session_list_params(&q(&[
            ("status", "scheduled"),
            ("from", "2026-09-01"),
            ("to", "2026-09-30"),
        ]))
        .expect("parse");
        assert_eq!(params.status, Some(SessionStatus::Scheduled));
        assert!(params.from.unwrap() < params.to.unwrap());
    }

    #[test]
    fn bad_status_is_invalid_param() {
        let err = parse_session_list_params(&q(&[("status", "done")])).expect_err("bad");
        assert_eq!(err.code, crate::ApiErrorCode::InvalidQueryParameter);
    }

    #[test]
    fn slots_require_a_date() {
        let err = parse_slots_params(&q(&[])).expect_err("missing date");
        assert_eq!(err.code, crate::ApiErrorCode::InvalidQueryParameter);
        let params = parse_slots_params(&q(&[("date", "2026-09-07")])).expect("ok");
        assert_eq!(params.duration_minutes, 60);
        assert_eq!(params.step_minutes, SLOT_STEP_MINUTES);
    }

    #[test]
    fn zero_duration_is_rejected() {
        let err = parse_slots_params(&q(&[("date", "2026-09-07"), ("duration", "0")]))
            .expect_err("zero");
        assert_eq!(err.code, crate::ApiErrorCode::InvalidQueryParameter);
    }

    #[test]
    fn progress_timeframe_defaults() {
        let params = parse_progress_params(&q(&[])).expect("parse");
        assert_eq!(params.timeframe, DEFAULT_PROGRESS_TIMEFRAME);
        assert!(params.student_id.is_none());
    }
}
