// src/validation.rs

use chrono::{DateTime, Utc};
use validator::ValidateLength;

use crate::{
    error::{ValidationError, ValidationReason},
    models::score_entry::{ScoreEntry, ScoreSubmissionInput},
};

/// Upper bound for `userId`, `username` and `topicId`, in characters.
pub const MAX_IDENTIFIER_LENGTH: u64 = 128;

/// Turns a raw submission into a `ScoreEntry`.
///
/// Checks run in a fixed order and stop at the first failure:
/// identifiers, `totalQuestions`, `score`, then `completedAt`.
/// `now` is used when `completedAt` is absent and as a provisional
/// `submittedAt`, which the store replaces on commit.
pub fn validate(
    input: &ScoreSubmissionInput,
    now: DateTime<Utc>,
) -> Result<ScoreEntry, ValidationError> {
    let user_id = required_text("userId", input.user_id.as_deref())?;
    let username = required_text("username", input.username.as_deref())?;
    let topic_id = required_text("topicId", input.topic_id.as_deref())?;

    let total_questions = required_integer("totalQuestions", input.total_questions.as_ref())?;
    if total_questions <= 0 {
        return Err(ValidationError::new(
            "totalQuestions",
            ValidationReason::InvalidRange,
        ));
    }

    let score = required_integer("score", input.score.as_ref())?;
    if !(0..=total_questions).contains(&score) {
        return Err(ValidationError::new("score", ValidationReason::InvalidRange));
    }

    let completed_at = match input.completed_at.as_deref().map(str::trim) {
        None | Some("") => now,
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .map(|ts| ts.with_timezone(&Utc))
            .map_err(|_| ValidationError::new("completedAt", ValidationReason::InvalidFormat))?,
    };

    Ok(ScoreEntry {
        user_id,
        username,
        topic_id,
        score,
        total_questions,
        completed_at,
        submitted_at: now,
    })
}

/// Non-blank string within `MAX_IDENTIFIER_LENGTH`, returned trimmed.
fn required_text(field: &'static str, value: Option<&str>) -> Result<String, ValidationError> {
    let value = value.map(str::trim).unwrap_or_default();
    if value.is_empty() {
        return Err(ValidationError::new(field, ValidationReason::MissingField));
    }
    if !value.validate_length(None, Some(MAX_IDENTIFIER_LENGTH), None) {
        return Err(ValidationError::new(field, ValidationReason::InvalidRange));
    }
    Ok(value.to_string())
}

/// Present and representable as an `i64`. Integral floats such as `8.0` are
/// accepted; fractions and overflow are range errors.
fn required_integer(
    field: &'static str,
    value: Option<&serde_json::Number>,
) -> Result<i64, ValidationError> {
    let number = value.ok_or(ValidationError::new(field, ValidationReason::MissingField))?;
    if let Some(integer) = number.as_i64() {
        return Ok(integer);
    }
    match number.as_f64() {
        // i64::MAX as f64 rounds up to 2^63, so the upper bound is exclusive.
        Some(float) if float.fract() == 0.0 && float >= i64::MIN as f64 && float < i64::MAX as f64 => {
            Ok(float as i64)
        }
        _ => Err(ValidationError::new(field, ValidationReason::InvalidRange)),
    }
}
