//! Recognizes normalized mechanics sections and isolates their inner text.

use std::sync::OnceLock;

use regex::Regex;

use super::error::{MalformedReason, MechanicsError};

static START_REGEX: OnceLock<Regex> = OnceLock::new();
static SECTION_REGEX: OnceLock<Regex> = OnceLock::new();

fn start_regex() -> &'static Regex {
    START_REGEX.get_or_init(|| {
        Regex::new(r"(?:^|\n),,,iron-vault-mechanics(?:\n|$)").expect("Invalid section start regex")
    })
}

fn section_regex() -> &'static Regex {
    SECTION_REGEX.get_or_init(|| {
        Regex::new(r"(?:^|\n),,,iron-vault-mechanics\n(?P<mechanics>[\s\S]*)\n,,,(?:\n|$)")
            .expect("Invalid section regex")
    })
}

/// Whether `unit` contains the opening marker on a line of its own.
pub fn recognizes(unit: &str) -> bool {
    start_regex().is_match(unit)
}

/// Returns the text between the markers of a recognized unit.
pub fn extract(unit: &str) -> Result<&str, MechanicsError> {
    let malformed = |reason| MechanicsError::MalformedSection {
        reason,
        unit: unit.to_string(),
    };

    let caps = section_regex()
        .captures(unit)
        .ok_or_else(|| malformed(MalformedReason::NoMatch))?;
    let (Some(whole), Some(inner)) = (caps.get(0), caps.name("mechanics")) else {
        return Err(malformed(MalformedReason::NoMatch));
    };

    if !unit[..whole.start()].trim().is_empty() || !unit[whole.end()..].trim().is_empty() {
        return Err(malformed(MalformedReason::LeftoverContent));
    }
    Ok(inner.as_str())
}
