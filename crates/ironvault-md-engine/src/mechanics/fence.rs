//! Rewrites ```` ```iron-vault-mechanics ```` fences into `,,,` markers.
//!
//! Host Markdown parsers treat a fenced block as code and hand it over
//! verbatim. Rewriting the fence keeps the section out of their hands, and the
//! blank lines inserted around it make every section a unit of its own.

use super::error::MechanicsError;

/// Opening fence as written in documents.
pub const FENCE_START: &str = "```iron-vault-mechanics";
/// Closing fence as written in documents.
pub const FENCE_END: &str = "```";
/// Opening marker after normalization.
pub const SECTION_START: &str = ",,,iron-vault-mechanics";
/// Closing marker after normalization.
pub const SECTION_END: &str = ",,,";

fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

/// Line-by-line normalizer state.
///
/// Feed lines with [`FenceNormalizer::push`] and collect the output with
/// [`FenceNormalizer::finish`].
#[derive(Debug, Default)]
pub struct FenceNormalizer {
    lines: Vec<String>,
    /// 1-based line number of the currently open section's fence.
    open_since: Option<usize>,
    /// The previous line closed a section and the next one needs a separator.
    after_close: bool,
    line_no: usize,
}

impl FenceNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    fn separate(&mut self) {
        if self.lines.last().is_some_and(|l| !is_blank(l)) {
            self.lines.push(String::new());
        }
    }

    pub fn push(&mut self, line: &str) -> Result<(), MechanicsError> {
        self.line_no += 1;
        let is_start = line.trim_end() == FENCE_START;

        if let Some(opened) = self.open_since {
            if is_start {
                log::debug!("Section opened on line {opened} is still open");
                return Err(MechanicsError::NestedSection { line: self.line_no });
            }
            if line.trim() == FENCE_END {
                self.lines.push(SECTION_END.to_string());
                self.open_since = None;
                self.after_close = true;
            } else if !is_blank(line) {
                self.lines.push(line.trim().to_string());
            }
            return Ok(());
        }

        if self.after_close {
            self.after_close = false;
            if !is_blank(line) {
                self.lines.push(String::new());
            }
        }

        if is_start {
            self.separate();
            self.lines.push(SECTION_START.to_string());
            self.open_since = Some(self.line_no);
        } else {
            self.lines.push(line.to_string());
        }
        Ok(())
    }

    pub fn finish(self) -> Vec<String> {
        if let Some(opened) = self.open_since {
            log::debug!("Section opened on line {opened} is never closed");
        }
        self.lines
    }
}

/// Normalizes every mechanics fence in `lines`.
pub fn normalize_fences<S: AsRef<str>>(lines: &[S]) -> Result<Vec<String>, MechanicsError> {
    let mut normalizer = FenceNormalizer::new();
    for line in lines {
        normalizer.push(line.as_ref())?;
    }
    Ok(normalizer.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn normalize(text: &str) -> Vec<String> {
        let lines: Vec<&str> = text.lines().collect();
        normalize_fences(&lines).unwrap()
    }

    #[test]
    fn rewrites_markers_and_trims_interior() {
        let out = normalize("```iron-vault-mechanics\n  roll \"Iron\"  \n\n   \n}\n```");
        assert_eq!(out, vec![SECTION_START, "roll \"Iron\"", "}", SECTION_END]);
    }

    #[test]
    fn inserts_separators_only_next_to_content() {
        let out = normalize("before\n```iron-vault-mechanics\nxp from=1 to=2\n```\nafter");
        assert_eq!(
            out,
            vec!["before", "", SECTION_START, "xp from=1 to=2", SECTION_END, "", "after"]
        );

        let out = normalize("before\n\n```iron-vault-mechanics\nxp from=1 to=2\n```\n\nafter");
        assert_eq!(
            out,
            vec!["before", "", SECTION_START, "xp from=1 to=2", SECTION_END, "", "after"]
        );
    }

    #[test]
    fn adjacent_sections_get_one_separator() {
        let out = normalize(
            "```iron-vault-mechanics\nxp from=1 to=2\n```\n```iron-vault-mechanics\nxp from=2 to=3\n```",
        );
        assert_eq!(
            out,
            vec![
                SECTION_START,
                "xp from=1 to=2",
                SECTION_END,
                "",
                SECTION_START,
                "xp from=2 to=3",
                SECTION_END,
            ]
        );
    }

    #[test]
    fn other_fences_are_untouched() {
        let text = "```rust\nfn main() {}\n```";
        assert_eq!(normalize(text), vec!["```rust", "fn main() {}", "```"]);
    }

    #[test]
    fn trailing_whitespace_after_fence_is_accepted() {
        let out = normalize("```iron-vault-mechanics   \nxp from=1 to=2\n  ```  ");
        assert_eq!(out, vec![SECTION_START, "xp from=1 to=2", SECTION_END]);
    }

    #[test]
    fn unterminated_section_runs_to_end() {
        let out = normalize("text\n```iron-vault-mechanics\nxp from=1 to=2");
        assert_eq!(out, vec!["text", "", SECTION_START, "xp from=1 to=2"]);
    }

    #[test]
    fn nested_section_is_an_error() {
        let lines = [
            "```iron-vault-mechanics",
            "xp from=1 to=2",
            "```iron-vault-mechanics",
        ];
        let err = normalize_fences(&lines).unwrap_err();
        assert!(matches!(err, MechanicsError::NestedSection { line: 3 }));
    }
}
