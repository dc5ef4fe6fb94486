//! Substring extraction for blocking keys
//!
//! Positions count characters, not bytes, and both ends are clamped to the
//! string length, so a window past the end yields whatever is left.

use crate::error::{LinkageError, Result};

/// Extract the characters in `[start, end)` of `s`.
///
/// # Errors
/// Returns [`LinkageError::InvalidSubstring`] if `start > end`.
///
/// # Examples
/// ```
/// use recordlink::algorithms::substring::get_substring;
/// assert_eq!(get_substring("hello", 0, 3).unwrap(), "hel");
/// assert!(get_substring("hello", 3, 1).is_err());
/// ```
pub fn get_substring(s: &str, start: usize, end: usize) -> Result<String> {
    if start > end {
        return Err(LinkageError::InvalidSubstring { start, end });
    }
    Ok(s.chars().skip(start).take(end - start).collect())
}
