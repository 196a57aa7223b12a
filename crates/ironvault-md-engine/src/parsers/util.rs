//! Small helpers shared by the node and block parsers.

use std::str::FromStr;
use std::sync::OnceLock;

use regex::{Captures, Regex};

/// Progress tracks hold ten boxes of four ticks.
pub const MAX_TICKS: i64 = 40;

static MARKDOWN_LINK_REGEX: OnceLock<Regex> = OnceLock::new();
static WIKI_LINK_REGEX: OnceLock<Regex> = OnceLock::new();
static WIKI_LABEL_LINK_REGEX: OnceLock<Regex> = OnceLock::new();

fn markdown_link_regex() -> &'static Regex {
    MARKDOWN_LINK_REGEX.get_or_init(|| {
        Regex::new(r"\[(?P<link_name>[^\]]+)\]\([^)]*\)").expect("Invalid markdown link regex")
    })
}

fn wiki_link_regex() -> &'static Regex {
    WIKI_LINK_REGEX.get_or_init(|| {
        Regex::new(r"\[\[(?P<link_name>[^\]|]+)\]\]").expect("Invalid wiki link regex")
    })
}

fn wiki_label_link_regex() -> &'static Regex {
    WIKI_LABEL_LINK_REGEX.get_or_init(|| {
        Regex::new(r"\[\[[^\]|]*\|(?P<link_name>[^\]]+)\]\]").expect("Invalid wiki label regex")
    })
}

/// Replaces the first link in `raw` by its display text and unescapes `\/`.
///
/// Markdown links `[Text](url)` are tried first, then `[[Page]]`, then
/// `[[Page|Label]]`.
pub fn convert_link_name(raw: &str) -> String {
    let found: Option<Captures<'_>> = markdown_link_regex()
        .captures(raw)
        .or_else(|| wiki_link_regex().captures(raw))
        .or_else(|| wiki_label_link_regex().captures(raw));

    let Some(caps) = found else {
        return raw.replace(r"\/", "/");
    };

    let (Some(whole), Some(name)) = (caps.get(0), caps.name("link_name")) else {
        return raw.replace(r"\/", "/");
    };

    format!(
        "{}{}{}",
        &raw[..whole.start()],
        name.as_str().replace(r"\/", "/"),
        &raw[whole.end()..]
    )
}

/// Challenge rank of a progress track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rank {
    Troublesome,
    Dangerous,
    Formidable,
    Extreme,
    Epic,
}

impl Rank {
    pub fn ticks_per_step(&self) -> i64 {
        match self {
            Rank::Troublesome => 12,
            Rank::Dangerous => 8,
            Rank::Formidable => 4,
            Rank::Extreme => 2,
            Rank::Epic => 1,
        }
    }
}

impl FromStr for Rank {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "troublesome" => Ok(Rank::Troublesome),
            "dangerous" => Ok(Rank::Dangerous),
            "formidable" => Ok(Rank::Formidable),
            "extreme" => Ok(Rank::Extreme),
            "epic" => Ok(Rank::Epic),
            other => Err(other.to_string()),
        }
    }
}

/// Returns `(ticks gained, new total)` for marking `steps` progress on a
/// track of `rank`. Unknown ranks gain nothing.
pub fn check_ticks(rank: &str, current: i64, steps: i64) -> (i64, i64) {
    let per_step = match rank.parse::<Rank>() {
        Ok(rank) => rank.ticks_per_step(),
        Err(unknown) => {
            log::warn!("Cannot mark progress, unknown rank {unknown:?}");
            0
        }
    };
    let gained = per_step.saturating_mul(steps);
    (gained, current.saturating_add(gained).min(MAX_TICKS))
}

/// Splits a tick count into `(boxes, ticks)`.
pub fn ticks_to_progress(total_ticks: i64) -> (i64, i64) {
    (total_ticks.div_euclid(4), total_ticks.rem_euclid(4))
}

/// Tick count as fractional boxes, e.g. 7 ticks is 1.75.
pub fn ticks_to_float(total_ticks: i64) -> f64 {
    let (boxes, ticks) = ticks_to_progress(total_ticks);
    boxes as f64 + ticks as f64 * 0.25
}

/// CSS slug for an initiative label.
pub fn initiative_slugify(initiative: &str) -> &'static str {
    match initiative {
        "out of combat" => "nocombat",
        "has initiative" => "initiative",
        "no initiative" => "noinitiative",
        other => {
            log::warn!("Unhandled initiative {other:?}");
            "unknown"
        }
    }
}

/// CSS slug for a combat position label.
pub fn position_slugify(position: &str) -> &'static str {
    match position {
        "out of combat" => "nocombat",
        "in control" => "control",
        "in a bad spot" => "badspot",
        other => {
            log::warn!("Unhandled position {other:?}");
            "unknown"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("plain text", "plain text")]
    #[case(r"Starship \/ Integrity", "Starship / Integrity")]
    #[case("[Face Danger](datasworn:move:starforged\\/adventure\\/face_danger)", "Face Danger")]
    #[case(r"[Core Oracles \/ Theme](datasworn:oracle)", "Core Oracles / Theme")]
    #[case("[[Page]]", "Page")]
    #[case(r"[[Campaign\/Progress\/Track.md|Track]]", "Track")]
    #[case("before [[Page|Label]] after", "before Label after")]
    #[case("[[First]] and [[Second]]", "First and [[Second]]")]
    fn converts_links(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(convert_link_name(raw), expected);
    }

    #[rstest]
    #[case("epic", 0, 1, 1, 1)]
    #[case("extreme", 4, 2, 4, 8)]
    #[case("formidable", 0, 3, 12, 12)]
    #[case("dangerous", 8, 1, 8, 16)]
    #[case("troublesome", 36, 1, 12, 40)]
    #[case("legendary", 10, 2, 0, 10)]
    #[case("troublesome", 0, i64::MAX, i64::MAX, 40)]
    #[case("epic", i64::MAX, 1, 1, 40)]
    fn ticks_for_rank(
        #[case] rank: &str,
        #[case] current: i64,
        #[case] steps: i64,
        #[case] gained: i64,
        #[case] total: i64,
    ) {
        assert_eq!(check_ticks(rank, current, steps), (gained, total));
    }

    #[test]
    fn tick_conversions() {
        assert_eq!(ticks_to_progress(7), (1, 3));
        assert_eq!(ticks_to_progress(40), (10, 0));
        assert_eq!(ticks_to_progress(-5), (-2, 3));
        assert_eq!(ticks_to_float(7), 1.75);
        assert_eq!(ticks_to_float(16), 4.0);
    }

    #[rstest]
    #[case("out of combat", "nocombat")]
    #[case("has initiative", "initiative")]
    #[case("no initiative", "noinitiative")]
    #[case("winning", "unknown")]
    fn initiative_slugs(#[case] label: &str, #[case] slug: &str) {
        assert_eq!(initiative_slugify(label), slug);
    }

    #[rstest]
    #[case("out of combat", "nocombat")]
    #[case("in control", "control")]
    #[case("in a bad spot", "badspot")]
    #[case("", "unknown")]
    fn position_slugs(#[case] label: &str, #[case] slug: &str) {
        assert_eq!(position_slugify(label), slug);
    }
}
