//! Single-line node parsers.
//!
//! One parser per node name. Most take a fixed regex over their parameters;
//! `clock`, `oracle`, `progress`, `progress-roll` and `track` take free-order
//! `key=value` parameters instead. Parsers that roll dice update the
//! [`RollState`](super::RollState) of the innermost open block.

use super::args::{Args, ParsedLine, Value, coerce_int, int_or_zero, str_arg};
use super::base::{NodeParser, ParserBase, Pattern};
use super::context::Context;
use super::names::NameCollection;
use super::util::{
    check_ticks, convert_link_name, initiative_slugify, position_slugify, ticks_to_float,
    ticks_to_progress,
};

/// Separator the dispatcher joins continued out-of-character lines with.
pub const OOC_LINE_BREAK: &str = "<br>";

macro_rules! node_parsers {
    ($($(#[$meta:meta])* $name:ident),+ $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(Debug)]
            pub struct $name(ParserBase);

            impl Default for $name {
                fn default() -> Self {
                    Self::new()
                }
            }
        )+
    };
}

node_parsers! {
    /// `add 2 "Tech asset"`
    AddNodeParser,
    /// `burn from=8 to=2`
    BurnNodeParser,
    /// `clock from=2 name="[[Clocks\/Doom.md|Doom]]" out-of=6 to=3`
    ClockNodeParser,
    /// `impact "Battered" true`
    ImpactNodeParser,
    /// `initiative from="out of combat" to="has initiative"`
    InitiativeNodeParser,
    /// `meter "Momentum" from=2 to=3`
    MeterNodeParser,
    /// `move "[Face Danger](datasworn:...)"` outside a move block
    MoveNodeParser,
    /// `- "Out of character remark"`
    OocNodeParser,
    /// `oracle name="[Action](datasworn:...)" result="Bolster" roll=4`
    OracleNodeParser,
    /// `position from="in a bad spot" to="in control"`
    PositionNodeParser,
    /// `progress from=8 name="[[Vows\/Ship.md|Ship]]" rank="dangerous" steps=1`
    ProgressNodeParser,
    /// `progress-roll name="[[Vows\/Ship.md|Ship]]" score=8 vs1=4 vs2=10`
    ProgressRollNodeParser,
    /// `reroll action="5"`
    RerollNodeParser,
    /// `roll "Heart" action=5 adds=0 stat=2 vs1=4 vs2=8`
    RollNodeParser,
    /// `rolls 3 5 dice="2d10"`
    RollsNodeParser,
    /// `track name="[[Vows\/Ship.md|Ship]]" status="added"`
    TrackNodeParser,
    /// `xp from=2 to=4`
    XpNodeParser,
}

/// Replaces the `name` parameter by its display text, or `default`.
fn take_name(line: &mut ParsedLine, default: &str) -> String {
    match line.remove("name") {
        Some(Value::Str(raw)) => convert_link_name(&raw),
        _ => default.to_string(),
    }
}

/// Shapes oracle parameters, shared with the oracle block.
pub(crate) fn oracle_args(mut line: ParsedLine) -> Args {
    let oracle = take_name(&mut line, "unknown");
    let result = match str_arg(&line, "result") {
        Some(raw) => convert_link_name(raw),
        None => "unknown".to_string(),
    };
    line.insert("oracle".into(), Value::from(oracle));
    line.insert("result".into(), Value::from(result));
    line
}

impl AddNodeParser {
    pub fn new() -> Self {
        Self(ParserBase::new(
            NameCollection::from_name("Add"),
            Pattern::line(r#"^(?P<add>\d+)(?: "(?P<reason>.+)")?$"#),
        ))
    }
}

impl NodeParser for AddNodeParser {
    fn base(&self) -> &ParserBase {
        &self.0
    }

    fn handle_args(&self, mut line: ParsedLine, _ctx: &mut Context<'_>) -> Args {
        coerce_int(&mut line, "add");
        line
    }
}

impl BurnNodeParser {
    pub fn new() -> Self {
        Self(ParserBase::new(
            NameCollection::from_name("Burn"),
            Pattern::line(r"^from=(?P<from>-?\d+) to=(?P<to>-?\d+)$"),
        ))
    }
}

impl NodeParser for BurnNodeParser {
    fn base(&self) -> &ParserBase {
        &self.0
    }

    fn handle_args(&self, mut line: ParsedLine, ctx: &mut Context<'_>) -> Args {
        coerce_int(&mut line, "from");
        coerce_int(&mut line, "to");
        let result = ctx.roll_mut().burn(int_or_zero(&line, "from"));
        result.merge_into(&mut line);
        line
    }
}

impl ClockNodeParser {
    pub fn new() -> Self {
        Self(ParserBase::new(
            NameCollection::from_name("Clock"),
            Pattern::params(&["name", "from", "to", "out-of", "status"]),
        ))
    }
}

impl NodeParser for ClockNodeParser {
    fn base(&self) -> &ParserBase {
        &self.0
    }

    fn handle_args(&self, mut line: ParsedLine, _ctx: &mut Context<'_>) -> Args {
        let name = take_name(&mut line, "unknown");
        line.insert("name".into(), Value::from(name));
        if let Some(segments) = line.remove("out-of") {
            line.insert("segments".into(), segments);
        }
        line
    }
}

impl ImpactNodeParser {
    pub fn new() -> Self {
        Self(ParserBase::new(
            NameCollection::from_name("Impact"),
            Pattern::line(r#"^"(?P<impact>[^"]+)" (?P<marked>true|false)$"#),
        ))
    }
}

impl NodeParser for ImpactNodeParser {
    fn base(&self) -> &ParserBase {
        &self.0
    }

    fn handle_args(&self, mut line: ParsedLine, _ctx: &mut Context<'_>) -> Args {
        let marked = str_arg(&line, "marked") == Some("true");
        line.insert("marked".into(), Value::Bool(marked));
        if let Some(impact) = str_arg(&line, "impact").map(convert_link_name) {
            line.insert("impact".into(), Value::from(impact));
        }
        line
    }
}

const FROM_TO_LABELS: &str = r#"^from="(?P<from>[^"]+)" to="(?P<to>[^"]+)"$"#;

fn add_slugs(line: &mut ParsedLine, slugify: fn(&str) -> &'static str) {
    for key in ["from", "to"] {
        let slug = slugify(str_arg(line, key).unwrap_or_default());
        line.insert(format!("{key}_slug"), Value::from(slug));
    }
}

impl InitiativeNodeParser {
    pub fn new() -> Self {
        Self(ParserBase::new(
            NameCollection::from_name("Initiative"),
            Pattern::line(FROM_TO_LABELS),
        ))
    }
}

impl NodeParser for InitiativeNodeParser {
    fn base(&self) -> &ParserBase {
        &self.0
    }

    fn handle_args(&self, mut line: ParsedLine, _ctx: &mut Context<'_>) -> Args {
        add_slugs(&mut line, initiative_slugify);
        line
    }
}

impl MeterNodeParser {
    pub fn new() -> Self {
        Self(ParserBase::new(
            NameCollection::from_name("Meter"),
            Pattern::line(r#"^"(?P<meter_name>[^"]+)" from=(?P<from>-?\d+) to=(?P<to>-?\d+)$"#),
        ))
    }
}

impl NodeParser for MeterNodeParser {
    fn base(&self) -> &ParserBase {
        &self.0
    }

    fn handle_args(&self, mut line: ParsedLine, _ctx: &mut Context<'_>) -> Args {
        if let Some(name) = str_arg(&line, "meter_name").map(convert_link_name) {
            line.insert("meter_name".into(), Value::from(name));
        }
        coerce_int(&mut line, "from");
        coerce_int(&mut line, "to");
        let diff = int_or_zero(&line, "to").saturating_sub(int_or_zero(&line, "from"));
        line.insert("diff".into(), Value::Int(diff));
        line
    }
}

/// Pattern of a quoted Markdown link to a move, shared with the move block.
pub(crate) const MOVE_LINK: &str = r#"^"\[(?P<name>[^\]]+)\]\((?P<link>[^)]+)\)"$"#;

impl MoveNodeParser {
    pub fn new() -> Self {
        Self(ParserBase::new(
            NameCollection::from_name("Move"),
            Pattern::line(MOVE_LINK),
        ))
    }
}

impl NodeParser for MoveNodeParser {
    fn base(&self) -> &ParserBase {
        &self.0
    }

    fn handle_args(&self, line: ParsedLine, _ctx: &mut Context<'_>) -> Args {
        let name = str_arg(&line, "name").map(convert_link_name);
        crate::args! { "name" => name }
    }
}

impl OocNodeParser {
    pub fn new() -> Self {
        Self(ParserBase::new(
            NameCollection::new("OOC", "-", "ooc"),
            Pattern::line(r#"^"(?P<comment>(?:[^"\\]|\\.)*)"$"#),
        ))
    }
}

impl NodeParser for OocNodeParser {
    fn base(&self) -> &ParserBase {
        &self.0
    }

    fn handle_args(&self, line: ParsedLine, _ctx: &mut Context<'_>) -> Args {
        let comment = str_arg(&line, "comment")
            .unwrap_or_default()
            .replace(r#"\""#, "\"");
        let lines: Vec<Value> = comment
            .split(OOC_LINE_BREAK)
            .map(|l| Value::from(l.trim()))
            .collect();
        crate::args! { "comment" => comment, "lines" => Value::List(lines) }
    }
}

/// Oracle parameter names, shared with the oracle block.
pub(crate) const ORACLE_KEYS: &[&str] = &["name", "result", "roll", "cursed", "replaced"];

impl OracleNodeParser {
    pub fn new() -> Self {
        Self(ParserBase::new(
            NameCollection::from_name("Oracle"),
            Pattern::params(ORACLE_KEYS),
        ))
    }
}

impl NodeParser for OracleNodeParser {
    fn base(&self) -> &ParserBase {
        &self.0
    }

    fn handle_args(&self, line: ParsedLine, _ctx: &mut Context<'_>) -> Args {
        oracle_args(line)
    }
}

impl PositionNodeParser {
    pub fn new() -> Self {
        Self(ParserBase::new(
            NameCollection::from_name("Position"),
            Pattern::line(FROM_TO_LABELS),
        ))
    }
}

impl NodeParser for PositionNodeParser {
    fn base(&self) -> &ParserBase {
        &self.0
    }

    fn handle_args(&self, mut line: ParsedLine, _ctx: &mut Context<'_>) -> Args {
        add_slugs(&mut line, position_slugify);
        line
    }
}

impl ProgressNodeParser {
    pub fn new() -> Self {
        Self(ParserBase::new(
            NameCollection::from_name("Progress"),
            Pattern::params(&["name", "from", "rank", "steps"]),
        ))
    }
}

impl NodeParser for ProgressNodeParser {
    fn base(&self) -> &ParserBase {
        &self.0
    }

    fn handle_args(&self, mut line: ParsedLine, _ctx: &mut Context<'_>) -> Args {
        let name = take_name(&mut line, "undefined");
        let rank = str_arg(&line, "rank").unwrap_or_default().to_string();
        let from_ticks = int_or_zero(&line, "from");
        let steps = line.get("steps").and_then(Value::as_int).unwrap_or(1);

        let (ticks, to_ticks) = check_ticks(&rank, from_ticks, steps);
        let extra = line.remove("extra").unwrap_or(Value::Map(Args::new()));

        crate::args! {
            "name" => name,
            "rank" => rank,
            "steps" => steps,
            "from" => ticks_to_progress(from_ticks),
            "to" => ticks_to_progress(to_ticks),
            "from_ticks" => from_ticks,
            "to_ticks" => to_ticks,
            "from_fract" => ticks_to_float(from_ticks),
            "to_fract" => ticks_to_float(to_ticks),
            "ticks" => ticks,
            "extra" => extra,
        }
    }
}

impl ProgressRollNodeParser {
    pub fn new() -> Self {
        Self(ParserBase::new(
            NameCollection::from_name("Progress Roll"),
            Pattern::params(&["name", "score", "vs1", "vs2"]),
        ))
    }
}

impl NodeParser for ProgressRollNodeParser {
    fn base(&self) -> &ParserBase {
        &self.0
    }

    fn handle_args(&self, mut line: ParsedLine, ctx: &mut Context<'_>) -> Args {
        let name = take_name(&mut line, "undefined");
        line.insert("name".into(), Value::from(name));
        let result = ctx.roll_mut().progress_roll(
            int_or_zero(&line, "score"),
            int_or_zero(&line, "vs1"),
            int_or_zero(&line, "vs2"),
        );
        result.merge_into(&mut line);
        line
    }
}

impl RerollNodeParser {
    pub fn new() -> Self {
        Self(ParserBase::new(
            NameCollection::from_name("Reroll"),
            Pattern::line(r#"^(?P<die>action|vs1|vs2)="(?P<value>\d+)"$"#),
        ))
    }
}

impl NodeParser for RerollNodeParser {
    fn base(&self) -> &ParserBase {
        &self.0
    }

    fn handle_args(&self, mut line: ParsedLine, ctx: &mut Context<'_>) -> Args {
        coerce_int(&mut line, "value");
        let die = str_arg(&line, "die").unwrap_or_default().to_string();
        let old_value = ctx.roll().value(&die);
        let result = ctx.roll_mut().reroll(&die, int_or_zero(&line, "value"));
        line.insert("old_value".into(), Value::from(old_value));
        result.merge_into(&mut line);
        line
    }
}

impl RollNodeParser {
    pub fn new() -> Self {
        Self(ParserBase::new(
            NameCollection::from_name("Roll"),
            Pattern::line(
                r#"^"(?P<stat_name>[^"]+)" action=(?P<action>\d+) adds=(?P<adds>\d+) stat=(?P<stat>-?\d+) vs1=(?P<vs1>\d+) vs2=(?P<vs2>\d+)$"#,
            ),
        ))
    }
}

impl NodeParser for RollNodeParser {
    fn base(&self) -> &ParserBase {
        &self.0
    }

    fn handle_args(&self, mut line: ParsedLine, ctx: &mut Context<'_>) -> Args {
        for key in ["action", "adds", "stat", "vs1", "vs2"] {
            coerce_int(&mut line, key);
        }
        let stat_name = convert_link_name(str_arg(&line, "stat_name").unwrap_or_default());
        let result = ctx.roll_mut().roll(
            &stat_name,
            int_or_zero(&line, "action"),
            int_or_zero(&line, "stat"),
            int_or_zero(&line, "adds"),
            int_or_zero(&line, "vs1"),
            int_or_zero(&line, "vs2"),
        );
        result.merge_into(&mut line);
        line
    }
}

impl RollsNodeParser {
    pub fn new() -> Self {
        Self(ParserBase::new(
            NameCollection::from_name("Rolls"),
            Pattern::line(r#"^(?P<rolls>\d+(?: \d+)*) dice="(?P<dice>[^"]+)"$"#),
        ))
    }
}

impl NodeParser for RollsNodeParser {
    fn base(&self) -> &ParserBase {
        &self.0
    }

    fn handle_args(&self, mut line: ParsedLine, _ctx: &mut Context<'_>) -> Args {
        let rolls: Vec<Value> = str_arg(&line, "rolls")
            .unwrap_or_default()
            .split_whitespace()
            .filter_map(|n| n.parse::<i64>().ok())
            .map(Value::Int)
            .collect();
        line.insert("rolls_array".into(), Value::List(rolls));
        line
    }
}

impl TrackNodeParser {
    pub fn new() -> Self {
        Self(ParserBase::new(
            NameCollection::from_name("Track"),
            Pattern::params(&["name", "status"]),
        ))
    }
}

impl NodeParser for TrackNodeParser {
    fn base(&self) -> &ParserBase {
        &self.0
    }

    fn handle_args(&self, mut line: ParsedLine, _ctx: &mut Context<'_>) -> Args {
        let name = take_name(&mut line, "undefined");
        line.insert("name".into(), Value::from(name));
        line
    }
}

impl XpNodeParser {
    pub fn new() -> Self {
        Self(ParserBase::new(
            NameCollection::from_name("XP"),
            Pattern::line(r"^from=(?P<from>\d+) to=(?P<to>\d+)$"),
        ))
    }
}

impl NodeParser for XpNodeParser {
    fn base(&self) -> &ParserBase {
        &self.0
    }

    fn handle_args(&self, mut line: ParsedLine, _ctx: &mut Context<'_>) -> Args {
        coerce_int(&mut line, "from");
        coerce_int(&mut line, "to");
        let diff = int_or_zero(&line, "to").saturating_sub(int_or_zero(&line, "from"));
        line.insert("diff".into(), Value::Int(diff));
        line
    }
}
