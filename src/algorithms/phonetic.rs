//! Phonetic name encoding
//!
//! NYSIIS maps names that sound alike to the same short code, which makes it
//! a good blocking key: "catherine" and "katherine" both encode to `cata`.
//!
//! The rewrite steps run in a fixed order and later steps see the output of
//! earlier ones, so the order below is part of the encoding.

/// Default maximum code length
pub const NYSIIS_DEFAULT_MAX_LENGTH: usize = 4;

/// Two-character suffix substitutions, applied once to the end of the name
const SUFFIX_TABLE: [(&str, &str); 10] = [
    ("ix", "ic"),
    ("ex", "ec"),
    ("ye", "y"),
    ("ee", "y"),
    ("ie", "y"),
    ("dt", "d"),
    ("rt", "d"),
    ("rd", "d"),
    ("nt", "n"),
    ("nd", "n"),
];

/// Split a string into its first character and the rest.
#[inline]
fn split_first(s: &str) -> (&str, &str) {
    match s.char_indices().nth(1) {
        Some((idx, _)) => s.split_at(idx),
        None => (s, ""),
    }
}

/// Split off the last `n` characters (fewer if the string is shorter).
#[inline]
fn split_last_chars(s: &str, n: usize) -> (&str, &str) {
    let count = s.chars().count();
    if count <= n {
        return ("", s);
    }
    match s.char_indices().nth(count - n) {
        Some((idx, _)) => s.split_at(idx),
        None => (s, ""),
    }
}

/// Replace `from` with `to` everywhere except in the first character.
fn replace_after_first(s: &str, from: &str, to: &str) -> String {
    let (head, tail) = split_first(s);
    let mut out = String::with_capacity(s.len());
    out.push_str(head);
    out.push_str(&tail.replace(from, to));
    out
}

/// Replace `from` with `to` except in the first and the last character.
fn replace_interior(s: &str, from: char, to: char) -> String {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= 2 {
        return s.to_string();
    }
    let last = chars.len() - 1;
    chars
        .iter()
        .enumerate()
        .map(|(i, &c)| if i != 0 && i != last && c == from { to } else { c })
        .collect()
}

/// Encode a string using the NYSIIS algorithm.
///
/// The input is lower-cased first. Returns at most `max_len` characters, or
/// the whole code when `max_len` is 0. Empty or whitespace-only input
/// encodes to an empty string.
///
/// # Examples
/// ```
/// use recordlink::algorithms::phonetic::nysiis;
/// assert_eq!(nysiis("Catherine", 4), nysiis("Katherine", 4));
/// assert_eq!(nysiis("smith", 3), "sna");
/// assert_eq!(nysiis("", 4), "");
/// ```
#[must_use]
pub fn nysiis(s: &str, max_len: usize) -> String {
    let mut s = s.to_lowercase();

    if s.is_empty() {
        return String::new();
    }

    while s.ends_with(|c: char| c == 's' || c == 'z') {
        s.pop();
    }

    if let Some(rest) = s.strip_prefix("mac") {
        s = format!("mc{rest}");
    } else if s.starts_with("pf") {
        s.remove(0);
    }

    let (stem, suffix) = split_last_chars(&s, 2);
    let suffix = SUFFIX_TABLE
        .iter()
        .find(|(from, _)| *from == suffix)
        .map_or(suffix, |(_, to)| *to);
    s = format!("{stem}{suffix}");

    // EV -> EF, leaving the first two characters alone
    if let Some((idx, _)) = s.char_indices().nth(2) {
        if s[idx..].contains("ev") {
            s = format!("{}{}", &s[..idx], s[idx..].replace("ev", "ef"));
        }
    }

    let Some(first) = s.chars().next() else {
        return String::new();
    };

    // Fold vowels to 'a' and drop blanks
    let mut code: String = s
        .chars()
        .filter(|&c| c != ' ')
        .map(|c| if matches!(c, 'e' | 'i' | 'o' | 'u') { 'a' } else { c })
        .collect();

    if code.is_empty() {
        return String::new();
    }

    code = code.replace("aw", "a");
    code = code.replace("ght", "gt");
    code = code.replace("dg", "g");
    code = code.replace("ph", "f");
    code = replace_after_first(&code, "ah", "a");
    code = replace_after_first(&code, "ha", "a");
    code = code.replace("kn", "n");
    code = code.replace('k', "c");
    code = replace_after_first(&code, "m", "n");
    code = replace_after_first(&code, "q", "g");
    code = code.replace("sh", "s");
    code = code.replace("sch", "s");
    code = code.replace("yw", "y");
    code = code.replace("wr", "r");
    code = replace_interior(&code, 'y', 'a');
    code = replace_after_first(&code, "z", "s");

    if code.ends_with("ay") {
        code.truncate(code.len() - 2);
        code.push('y');
    }

    while code.ends_with('a') {
        code.pop();
    }

    let mut result = String::with_capacity(code.len());
    for c in code.chars() {
        if !result.ends_with(c) {
            result.push(c);
        }
    }

    if matches!(first, 'a' | 'e' | 'i' | 'o' | 'u') {
        let (_, rest) = split_first(&result);
        result = format!("{first}{rest}");
    }

    if max_len > 0 {
        if let Some((idx, _)) = result.char_indices().nth(max_len) {
            result.truncate(idx);
        }
    }

    result
}
