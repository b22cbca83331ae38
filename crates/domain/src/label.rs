//! Timer label helpers.

use crate::error::ValidationError;

/// Upper bound on user-supplied label length, in characters.
pub const MAX_LABEL_CHARS: usize = 100;

/// HTML-escape a label before it leaves the domain for display.
#[must_use]
pub fn sanitize_label(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    for ch in label.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Check a user-supplied label against [`MAX_LABEL_CHARS`].
///
/// # Errors
///
/// Returns [`ValidationError::LabelTooLong`] when the label is too long.
pub fn validate_label(label: &str) -> Result<(), ValidationError> {
    let actual = label.chars().count();
    if actual > MAX_LABEL_CHARS {
        return Err(ValidationError::LabelTooLong {
            max: MAX_LABEL_CHARS,
            actual,
        });
    }
    Ok(())
}
