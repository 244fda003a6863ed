//! Validation helpers for user input.

use validator::ValidationError;

/// Validates an answer once trimmed: non-empty and at most `max_len` characters.
///
/// # Examples
///
/// ```ignore
/// validate_answer_text("Tokyo", 200) // Ok
/// validate_answer_text("   ", 200)   // Err - blank
/// ```
pub fn validate_answer_text(text: &str, max_len: usize) -> Result<(), ValidationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        let mut err = ValidationError::new("answer_blank");
        err.message = Some("Answer must not be empty".into());
        return Err(err);
    }

    let len = trimmed.chars().count();
    if len > max_len {
        let mut err = ValidationError::new("answer_length");
        err.message =
            Some(format!("Answer must be at most {max_len} characters (got {len})").into());
        return Err(err);
    }

    Ok(())
}
