use std::fmt;

use thiserror::Error;

/// Why a recognized section could not be extracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedReason {
    /// Content before the opening or after the closing marker.
    LeftoverContent,
    /// The unit does not have the opening marker, inner lines and closing
    /// marker shape, e.g. an empty section or a missing closing marker.
    NoMatch,
}

impl fmt::Display for MalformedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MalformedReason::LeftoverContent => f.write_str("content outside the markers"),
            MalformedReason::NoMatch => f.write_str("no inner lines between the markers"),
        }
    }
}

/// Errors that abort the conversion of a whole document.
#[derive(Debug, Error)]
pub enum MechanicsError {
    #[error("mechanics section opened on line {line} while another is still open")]
    NestedSection { line: usize },

    #[error("malformed mechanics section ({reason}): {unit:?}")]
    MalformedSection {
        reason: MalformedReason,
        unit: String,
    },
}
