//! CPR number validation and redaction.

use crate::error::CprError;
use std::fmt;

/// Token appended to the visible prefix of a redacted CPR number.
pub const MASK: &str = "-XXXX";

const VISIBLE_CHARS: usize = 6;

/// Check the shape of a CPR number.
///
/// Exactly 10 ASCII digits, day in 1..=31 and month in 1..=12. Calendar
/// validity (e.g. 30 February) and century digits are not checked.
pub fn validate(identifier: &str) -> bool {
    if identifier.len() != 10 {
        return false;
    }

    if !identifier.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }

    let in_range = |digits: &str, max: u8| {
        digits
            .parse::<u8>()
            .map(|n| (1..=max).contains(&n))
            .unwrap_or(false)
    };

    in_range(&identifier[0..2], 31) && in_range(&identifier[2..4], 12)
}

/// Mask everything after the first six characters.
pub fn redact(identifier: &str) -> String {
    let visible: String = identifier.chars().take(VISIBLE_CHARS).collect();
    format!("{}{}", visible, MASK)
}

/// A CPR number that passed [`validate`].
///
/// Formatting with `{}` or `{:?}` prints the redacted form. Use
/// [`Cpr::as_str`] where the full number is required on the wire.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Cpr(String);

impl Cpr {
    /// Validate and wrap a CPR number.
    pub fn parse(identifier: &str) -> Result<Self, CprError> {
        if validate(identifier) {
            Ok(Self(identifier.to_string()))
        } else {
            Err(CprError::InvalidIdentifier)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn redacted(&self) -> String {
        redact(&self.0)
    }
}

impl fmt::Display for Cpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.redacted())
    }
}

impl fmt::Debug for Cpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Cpr").field(&self.redacted()).finish()
    }
}
