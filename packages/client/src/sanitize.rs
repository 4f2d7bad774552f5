//! Pre-parse repair of non-standard JSON number literals.
//!
//! The analytics service serializes floats with Python's JSON encoder, which
//! emits bare `Infinity`, `-Infinity` and `NaN` tokens. Those are not valid
//! JSON, so every response body goes through [`replace_non_standard_numbers`]
//! before it reaches `serde_json`:
//!
//! | Token       | Replacement |
//! |-------------|-------------|
//! | `Infinity`  | `999`       |
//! | `+Infinity` | `999`       |
//! | `-Infinity` | `-999`      |
//! | `NaN`       | `null`      |
//!
//! Text inside string literals is never touched, so a crime type literally
//! named `"Infinity"` survives.

use std::borrow::Cow;

/// Magnitude substituted for an infinite value.
pub const INFINITY_SENTINEL: f64 = 999.0;

/// Token/replacement pairs, longest token first so `-Infinity` wins over
/// `Infinity`.
const NON_STANDARD_LITERALS: &[(&str, &str)] = &[
    ("-Infinity", "-999"),
    ("+Infinity", "999"),
    ("Infinity", "999"),
    ("NaN", "null"),
];

/// Replaces bare infinity and `NaN` tokens outside of string literals.
///
/// Returns the input unchanged (borrowed) when it contains no candidate
/// token.
#[must_use]
pub fn replace_non_standard_numbers(text: &str) -> Cow<'_, str> {
    if !text.contains("Infinity") && !text.contains("NaN") {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    let mut in_string = false;
    let mut escaped = false;

    while let Some(c) = rest.chars().next() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            out.push(c);
            rest = &rest[c.len_utf8()..];
            continue;
        }

        if c == '"' {
            in_string = true;
        } else if let Some((token, replacement)) = NON_STANDARD_LITERALS
            .iter()
            .find(|(token, _)| rest.starts_with(token))
        {
            out.push_str(replacement);
            rest = &rest[token.len()..];
            continue;
        }

        out.push(c);
        rest = &rest[c.len_utf8()..];
    }

    Cow::Owned(out)
}
