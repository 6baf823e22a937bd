//! Input validation shared by the HTTP facade and the CLI.
//!
//! The aggregation engine trusts its arguments; every caller-facing entry
//! point runs its parameters through these helpers first.

use crate::error::AppError;

/// Minimum number of characters in a drug search term.
pub const MIN_SEARCH_LENGTH: usize = 3;

/// Default number of drugs returned by a search.
pub const DEFAULT_SEARCH_LIMIT: usize = 20;

/// Upper bound on the number of drugs returned by a search.
pub const MAX_SEARCH_LIMIT: usize = 100;

/// Earliest accepted statistics year.
pub const MIN_YEAR: i32 = 1900;

/// Latest accepted statistics year.
pub const MAX_YEAR: i32 = 2100;

/// Validates a drug search term and returns it trimmed.
///
/// # Examples
///
/// ```
/// use medimap_core::validate::validate_search_term;
///
/// assert_eq!(validate_search_term(" par ").unwrap(), "par");
/// assert!(validate_search_term("pa").is_err());
/// ```
pub fn validate_search_term(term: &str) -> Result<&str, AppError> {
    let trimmed = term.trim();
    // Characters, not bytes: "éth" is three characters.
    if trimmed.chars().count() < MIN_SEARCH_LENGTH {
        return Err(AppError::ValidationError(format!(
            "Search term must be at least {} characters",
            MIN_SEARCH_LENGTH
        )));
    }
    Ok(trimmed)
}

/// Validates a statistics year.
pub fn validate_year(year: i32) -> Result<i32, AppError> {
    if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
        return Err(AppError::ValidationError(format!(
            "Year must be between {} and {}, got {}",
            MIN_YEAR, MAX_YEAR, year
        )));
    }
    Ok(year)
}

/// Applies a default and an upper bound to an optional limit.
///
/// A requested limit of zero is a validation error rather than an empty page.
pub fn clamp_limit(requested: Option<usize>, default: usize, max: usize) -> Result<usize, AppError> {
    match requested {
        Some(0) => Err(AppError::ValidationError(
            "Limit must be greater than zero".to_string(),
        )),
        Some(n) => Ok(n.min(max)),
        None => Ok(default),
    }
}

/// Validates a page offset. Storage offsets are signed 64-bit.
pub fn validate_skip(skip: usize) -> Result<usize, AppError> {
    if i64::try_from(skip).is_err() {
        return Err(AppError::ValidationError(format!(
            "Skip must be at most {}, got {}",
            i64::MAX,
            skip
        )));
    }
    Ok(skip)
}
