//! Jaro similarity
//!
//! The classic record-linkage formulation: common characters are collected by
//! scanning each string against the other within a half-window, and the two
//! directional scans must agree on how many characters they share.
//!
//! # Performance Optimization
//!
//! ASCII inputs are compared as bytes; everything else is compared as `char`s.
//! Used-position masks live in `SmallVec`s so typical field values never
//! allocate.

use smallvec::SmallVec;

use crate::error::{LinkageError, Result};

/// Common characters collected by one directional scan, in scan order
type CommonChars<T> = SmallVec<[T; 64]>;

/// Calculate the Jaro similarity between two strings.
///
/// Identical strings return 1.0 and strings without common characters return
/// 0.0. Any other pair yields a value strictly inside (0, 1); a value outside
/// that range, or directional scans that disagree on the number of common
/// characters, is reported as an internal error.
pub fn jaro_similarity(a: &str, b: &str) -> Result<f64> {
    if a == b {
        return Ok(1.0);
    }

    if a.is_ascii() && b.is_ascii() {
        return jaro_checked(a, b, a.as_bytes(), b.as_bytes());
    }

    let a_chars: SmallVec<[char; 64]> = a.chars().collect();
    let b_chars: SmallVec<[char; 64]> = b.chars().collect();
    jaro_checked(a, b, &a_chars, &b_chars)
}

/// Half-width of the search window.
///
/// Signed on purpose: two single-character strings give -1, which yields an
/// empty window.
#[inline]
fn half_window(a_len: usize, b_len: usize) -> isize {
    (a_len.max(b_len) / 2) as isize - 1
}

/// Scan `from` against `to`, marking each matched position of `to` as used.
fn common_characters<T: PartialEq + Copy>(from: &[T], to: &[T], half: isize) -> CommonChars<T> {
    let mut used: SmallVec<[bool; 64]> = smallvec::smallvec![false; to.len()];
    let mut common = CommonChars::new();

    for (i, &c) in from.iter().enumerate() {
        let i = i as isize;
        let start = (i - half).max(0) as usize;
        let end = ((i + half + 1).max(0) as usize).min(to.len());

        if let Some(j) = (start..end).find(|&j| !used[j] && to[j] == c) {
            used[j] = true;
            common.push(c);
        }
    }

    common
}

fn jaro_checked<T: PartialEq + Copy>(a_str: &str, b_str: &str, a: &[T], b: &[T]) -> Result<f64> {
    let half = half_window(a.len(), b.len());

    let common_a = common_characters(a, b, half);
    let common_b = common_characters(b, a, half);

    if common_a.len() != common_b.len() {
        return Err(LinkageError::JaroCommonMismatch {
            a: a_str.to_string(),
            b: b_str.to_string(),
            forward: common_a.len(),
            backward: common_b.len(),
        });
    }

    if common_a.is_empty() {
        return Ok(0.0);
    }

    // Half a transposition per out-of-order position
    let transpositions = common_a
        .iter()
        .zip(common_b.iter())
        .filter(|(x, y)| x != y)
        .count() as f64
        * 0.5;

    let common = common_a.len() as f64;
    let similarity = (common / a.len() as f64
        + common / b.len() as f64
        + (common - transpositions) / common)
        / 3.0;

    if !(similarity > 0.0 && similarity < 1.0) {
        return Err(LinkageError::JaroOutOfRange {
            a: a_str.to_string(),
            b: b_str.to_string(),
            value: similarity,
        });
    }

    Ok(similarity)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 0.001
    }

    fn jaro(a: &str, b: &str) -> f64 {
        jaro_similarity(a, b).unwrap()
    }

    #[test]
    fn test_jaro_basic() {
        assert!(approx_eq(jaro("", ""), 1.0));
        assert!(approx_eq(jaro("abc", "abc"), 1.0));
        assert!(approx_eq(jaro("abc", "xyz"), 0.0));
        assert!(approx_eq(jaro("abc", ""), 0.0));
    }

    #[test]
    fn test_jaro_examples() {
        assert!(approx_eq(jaro("martha", "marhta"), 0.944));
        assert!(approx_eq(jaro("dwayne", "duane"), 0.822));
        assert!(approx_eq(jaro("dixon", "dicksonx"), 0.767));
    }

    #[test]
    fn test_jaro_symmetric() {
        let pairs = [
            ("martha", "marhta"),
            ("dwayne", "duane"),
            ("smith", "smyth"),
            ("jones", "johnson"),
            ("abcd", "dcba"),
            ("a", "ab"),
        ];
        for (a, b) in pairs {
            assert_eq!(jaro(a, b), jaro(b, a), "{a} vs {b}");
        }
    }

    #[test]
    fn test_single_characters_have_empty_window() {
        assert_eq!(half_window(1, 1), -1);
        assert!(approx_eq(jaro("a", "b"), 0.0));
    }

    #[test]
    fn test_jaro_strictly_inside_unit_interval() {
        let s = jaro("smith", "smyth");
        assert!(s > 0.0 && s < 1.0);
    }

    #[test]
    fn test_jaro_unicode_path() {
        let ascii = jaro("cafe", "cafx");
        let unicode = jaro("café", "cafx");
        assert!(approx_eq(ascii, unicode));
        assert!(jaro("café", "cafe") > 0.8);
    }

    #[test]
    fn test_common_characters_marks_positions_once() {
        // Both a's in "aa" can only consume the single a in "ab"
        let common = common_characters(b"aa", b"ab", half_window(2, 2));
        assert_eq!(common.as_slice(), b"a");
    }
}
