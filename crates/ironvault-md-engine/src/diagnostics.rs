use std::collections::BTreeSet;
use std::sync::{LazyLock, Mutex, PoisonError};

/// A recovered problem noticed while parsing a mechanics section.
///
/// Diagnostics never abort a conversion. They are logged through the `log`
/// facade when recorded and also collected so callers can report them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub level: log::Level,
    pub message: String,
}

impl Diagnostic {
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: log::Level::Warn,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.level, self.message)
    }
}

/// Names of nodes and blocks seen without a registered parser.
static UNHANDLED: LazyLock<Mutex<BTreeSet<String>>> = LazyLock::new(Default::default);

/// Records `name` in the process-wide unhandled-name set.
///
/// Returns `true` the first time a name is recorded.
pub fn record_unhandled(name: &str) -> bool {
    let mut names = UNHANDLED.lock().unwrap_or_else(PoisonError::into_inner);
    names.insert(name.to_string())
}

/// Returns all unhandled names recorded so far, sorted.
pub fn unhandled_names() -> Vec<String> {
    let names = UNHANDLED.lock().unwrap_or_else(PoisonError::into_inner);
    names.iter().cloned().collect()
}
