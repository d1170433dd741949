//! Common validation rules shared across request payloads.

use validator::ValidationError;

/// Maximum length of a request reason or approval remark.
pub const MAX_TEXT_LENGTH: usize = 500;

/// Validates free-text reasons.
///
/// Requirements:
/// - Not blank once trimmed
/// - At most 500 characters
pub fn validate_reason(reason: &str) -> Result<(), ValidationError> {
    if reason.trim().is_empty() {
        return Err(ValidationError::new("reason_required"));
    }
    if reason.chars().count() > MAX_TEXT_LENGTH {
        return Err(ValidationError::new("reason_too_long"));
    }
    Ok(())
}

/// Validates optional approval remarks: blank is allowed, overly long is not.
pub fn validate_remarks(remarks: &str) -> Result<(), ValidationError> {
    if remarks.chars().count() > MAX_TEXT_LENGTH {
        return Err(ValidationError::new("remarks_too_long"));
    }
    Ok(())
}

/// Validates that offset hours are within acceptable range.
///
/// Requirements:
/// - Greater than 0 and at most 24 hours
pub fn validate_offset_hours(hours: f64) -> Result<(), ValidationError> {
    if !(hours > 0.0 && hours <= 24.0) {
        return Err(ValidationError::new("offset_hours_out_of_range"));
    }
    Ok(())
}

/// Validates administrative leave credits.
///
/// Requirements:
/// - Greater than 0 and at most 366 days, in half-day steps
pub fn validate_leave_credit(days: f64) -> Result<(), ValidationError> {
    if !(days > 0.0 && days <= 366.0) {
        return Err(ValidationError::new("leave_credit_out_of_range"));
    }
    if (days * 2.0).fract() != 0.0 {
        return Err(ValidationError::new("leave_credit_not_half_day_step"));
    }
    Ok(())
}
