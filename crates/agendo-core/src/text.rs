// SPDX-FileCopyrightText: 2026 Agendo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Address and text normalization helpers.

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Number of trailing digits used to match phone numbers across formats.
pub const PHONE_SUFFIX_LEN: usize = 8;

/// Reduces a transport address to its phone digits.
///
/// Anything after an `@` (transport JID suffix) is dropped.
pub fn normalize_phone(raw: &str) -> String {
    let local = raw.split('@').next().unwrap_or(raw);
    local.chars().filter(char::is_ascii_digit).collect()
}

/// The last [`PHONE_SUFFIX_LEN`] digits of a phone, or all of them if shorter.
pub fn phone_suffix(phone: &str) -> String {
    let digits = normalize_phone(phone);
    let start = digits.len().saturating_sub(PHONE_SUFFIX_LEN);
    digits[start..].to_string()
}

/// Lowercases and strips diacritics, for tolerant keyword matching.
pub fn fold(text: &str) -> String {
    text.trim()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}
