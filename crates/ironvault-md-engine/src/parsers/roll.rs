//! Roll bookkeeping for one mechanics scope.
//!
//! A [`RollState`] accumulates the dice of an action roll or a progress roll
//! and any later adjustments (rerolls, momentum burns). [`RollState::get`]
//! recomputes the [`RollResult`] from scratch every time.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use super::args::{Args, Value};

/// Action scores are capped at this value.
pub const MAX_ACTION_SCORE: i64 = 10;

/// Outcome classification of a roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Hitmiss {
    Strong,
    Weak,
    Miss,
}

impl Hitmiss {
    /// Strong if `score` beats both challenge dice, weak if it beats one.
    pub fn classify(score: i64, vs1: i64, vs2: i64) -> Self {
        match (score > vs1, score > vs2) {
            (true, true) => Hitmiss::Strong,
            (true, false) | (false, true) => Hitmiss::Weak,
            (false, false) => Hitmiss::Miss,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Hitmiss::Strong => "strong",
            Hitmiss::Weak => "weak",
            Hitmiss::Miss => "miss",
        }
    }
}

impl fmt::Display for Hitmiss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Die that can be rerolled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Die {
    Action,
    Vs1,
    Vs2,
}

impl Die {
    pub fn as_str(&self) -> &'static str {
        match self {
            Die::Action => "action",
            Die::Vs1 => "vs1",
            Die::Vs2 => "vs2",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown die `{0}`")]
pub struct UnknownDie(pub String);

impl FromStr for Die {
    type Err = UnknownDie;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "action" => Ok(Die::Action),
            "vs1" => Ok(Die::Vs1),
            "vs2" => Ok(Die::Vs2),
            other => Err(UnknownDie(other.to_string())),
        }
    }
}

/// Snapshot of a roll outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RollResult {
    pub stat_name: String,
    pub score: i64,
    pub vs1: i64,
    pub vs2: i64,
    pub hitmiss: Hitmiss,
    #[serde(rename = "match")]
    pub is_match: bool,
}

impl RollResult {
    /// Writes the result fields into `args`, replacing existing entries.
    pub fn merge_into(&self, args: &mut Args) {
        args.insert("stat_name".into(), Value::from(self.stat_name.as_str()));
        args.insert("score".into(), Value::Int(self.score));
        args.insert("vs1".into(), Value::Int(self.vs1));
        args.insert("vs2".into(), Value::Int(self.vs2));
        args.insert("hitmiss".into(), Value::from(self.hitmiss.as_str()));
        args.insert("match".into(), Value::Bool(self.is_match));
    }

    pub fn to_args(&self) -> Args {
        let mut args = Args::new();
        self.merge_into(&mut args);
        args
    }
}

/// Mutable roll record owned by one block frame or the section root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RollState {
    stat_name: String,
    action: i64,
    stat: i64,
    adds: i64,
    vs1: i64,
    vs2: i64,
    momentum: i64,
    progress: i64,
    rolled: bool,
}

impl RollState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether any roll was made in this scope.
    pub fn rolled(&self) -> bool {
        self.rolled
    }

    /// Records an action roll.
    pub fn roll(
        &mut self,
        stat_name: &str,
        action: i64,
        stat: i64,
        adds: i64,
        vs1: i64,
        vs2: i64,
    ) -> RollResult {
        if self.rolled {
            log::warn!("Action roll overwrites existing roll data");
        }
        self.stat_name = stat_name.to_string();
        self.action = action;
        self.stat = stat;
        self.adds = adds;
        self.vs1 = vs1;
        self.vs2 = vs2;
        self.rolled = true;
        self.get()
    }

    /// Records a progress roll. The progress value becomes the score.
    pub fn progress_roll(&mut self, progress: i64, vs1: i64, vs2: i64) -> RollResult {
        if self.rolled {
            log::warn!("Progress roll overwrites existing roll data");
        }
        self.progress = progress;
        self.vs1 = vs1;
        self.vs2 = vs2;
        self.rolled = true;
        self.get()
    }

    /// Replaces one die. Unknown dice and action rerolls on a progress roll
    /// are ignored.
    pub fn reroll(&mut self, die: &str, value: i64) -> RollResult {
        if !self.rolled {
            log::warn!("Reroll without existing roll data");
        }
        match die.parse::<Die>() {
            Ok(Die::Action) if self.progress > 0 => {
                log::warn!("Ignoring action die reroll on a progress roll");
            }
            Ok(Die::Action) => self.action = value,
            Ok(Die::Vs1) => self.vs1 = value,
            Ok(Die::Vs2) => self.vs2 = value,
            Err(err) => log::warn!("Ignoring reroll: {err}"),
        }
        self.get()
    }

    /// Burns momentum, replacing the action score. Ignored on progress rolls.
    pub fn burn(&mut self, value: i64) -> RollResult {
        if !self.rolled {
            log::warn!("Momentum burn without existing roll data");
        }
        if self.progress > 0 {
            log::warn!("Ignoring momentum burn on a progress roll");
        } else {
            self.momentum = value;
        }
        self.get()
    }

    pub fn get(&self) -> RollResult {
        let score = if self.progress > 0 {
            self.progress
        } else if self.momentum > 0 {
            self.momentum
        } else {
            self.action
                .saturating_add(self.stat)
                .saturating_add(self.adds)
                .min(MAX_ACTION_SCORE)
        };

        RollResult {
            stat_name: self.stat_name.clone(),
            score,
            vs1: self.vs1,
            vs2: self.vs2,
            hitmiss: Hitmiss::classify(score, self.vs1, self.vs2),
            is_match: self.vs1 == self.vs2,
        }
    }

    /// Current value of a rerollable die, or `None` for unknown names.
    pub fn value(&self, die: &str) -> Option<i64> {
        match die.parse::<Die>().ok()? {
            Die::Action => Some(self.action),
            Die::Vs1 => Some(self.vs1),
            Die::Vs2 => Some(self.vs2),
        }
    }
}
