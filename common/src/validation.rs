// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // local@domain.tld with no whitespace and a single '@'.
    static ref EMAIL_PATTERN: Regex =
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern must compile");
}

/// Returns true when `email` looks like `local@domain.tld`.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

/// Pushes `message` when `value` is blank.
pub(crate) fn require_text(value: &str, message: &str, errors: &mut Vec<String>) {
    if value.trim().is_empty() {
        errors.push(message.to_string());
    }
}

/// Email is both required and format-checked.
pub(crate) fn require_email(email: &str, errors: &mut Vec<String>) {
    if email.trim().is_empty() {
        errors.push("email is required".to_string());
    } else if !is_valid_email(email) {
        errors.push("email format is invalid".to_string());
    }
}

pub(crate) fn into_result(errors: Vec<String>) -> Result<(), Vec<String>> {
    if errors.is_empty() { Ok(()) } else { Err(errors) }
}
