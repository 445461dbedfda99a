// src/utils/text.rs

//! Text helpers for upstream cell values.

/// Collapse runs of whitespace to single spaces and trim.
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// True when `s` has at least one cased character and none are lower-case.
///
/// `"VINHO DE MESA"` and `"SUCO 100%"` qualify; `"Tinto"`, `"123"` and `""`
/// do not.
pub fn is_upper(s: &str) -> bool {
    let mut cased = false;
    for c in s.chars() {
        if c.is_lowercase() {
            return false;
        }
        if c.is_uppercase() {
            cased = true;
        }
    }
    cased
}

/// Undo UTF-8 text that was decoded as Latin-1 (`"AmÃ©rica"` -> `"América"`).
///
/// Returns the input unchanged when it contains characters outside Latin-1 or
/// when the reinterpreted bytes are not valid UTF-8.
pub fn repair_latin1(s: &str) -> String {
    let bytes: Option<Vec<u8>> = s.chars().map(|c| u8::try_from(u32::from(c)).ok()).collect();
    bytes
        .and_then(|b| String::from_utf8(b).ok())
        .unwrap_or_else(|| s.to_string())
}
