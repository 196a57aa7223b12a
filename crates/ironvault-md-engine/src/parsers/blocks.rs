//! Block parsers.
//!
//! Blocks open with `<name> <params> {`, collect the nodes and blocks up to the
//! matching `}` as children, and render over their placeholder when closed.
//! Each open block has its own roll state, so a `move` block sees only the
//! rolls made inside it.

use super::args::{Args, ParsedLine, Value, str_arg};
use super::base::{BlockParser, ParserBase, Pattern};
use super::context::Context;
use super::names::NameCollection;
use super::nodes::{MOVE_LINK, ORACLE_KEYS, oracle_args};
use super::util::convert_link_name;
use crate::render::TemplateKind;

/// Renderer key of the node summarizing a move's roll.
pub const ROLL_RESULT: &str = "roll_result";

macro_rules! block_parsers {
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

block_parsers! {
    /// `actor name="[[Characters\/Kira.md|Kira]]" {`
    ActorBlockParser,
    /// `move "[Face Danger](datasworn:...)" {`
    MoveBlockParser,
    /// `oracle-group name="Character" {`
    OracleGroupBlockParser,
    /// `oracle name="[Action](datasworn:...)" result="Bolster" roll=4 {`
    OracleBlockParser,
    /// `- "What is in the box?" {`
    OraclePromptBlockParser,
}

/// Replaces the value under `key` by its link display text.
fn convert_link_arg(line: &mut ParsedLine, key: &str) {
    if let Some(text) = str_arg(line, key).map(convert_link_name) {
        line.insert(key.to_string(), Value::from(text));
    }
}

impl ActorBlockParser {
    pub fn new() -> Self {
        Self(ParserBase::new(
            NameCollection::from_name("Actor"),
            Pattern::line(r#"^name="(?P<name>[^"]*)"$"#),
        ))
    }
}

impl BlockParser for ActorBlockParser {
    fn base(&self) -> &ParserBase {
        &self.0
    }

    fn handle_args(&self, mut line: ParsedLine, _ctx: &mut Context<'_>) -> Args {
        convert_link_arg(&mut line, "name");
        line
    }
}

impl MoveBlockParser {
    pub fn new() -> Self {
        Self(ParserBase::new(
            NameCollection::from_name("Move"),
            Pattern::line(MOVE_LINK),
        ))
    }
}

impl BlockParser for MoveBlockParser {
    fn base(&self) -> &ParserBase {
        &self.0
    }

    fn handle_args(&self, mut line: ParsedLine, _ctx: &mut Context<'_>) -> Args {
        convert_link_arg(&mut line, "name");
        line
    }

    /// Adds a roll result node when anything was rolled inside the move.
    fn finalize_nodes(&self, ctx: &mut Context<'_>) {
        if !ctx.roll().rolled() {
            log::debug!("No roll in {} block", self.names().name());
            return;
        }
        let args = ctx.roll().get().to_args();
        if let Some(element) = ctx.render(ROLL_RESULT, TemplateKind::Node, &args) {
            ctx.attach(element);
        }
    }

    fn finalize_args(&self, ctx: &mut Context<'_>) -> Args {
        let mut args = ctx.args().cloned().unwrap_or_default();
        let rolled = ctx.roll().rolled();
        args.insert("rolled".into(), Value::Bool(rolled));
        if rolled {
            ctx.roll().get().merge_into(&mut args);
        }
        args
    }
}

impl OracleGroupBlockParser {
    pub fn new() -> Self {
        Self(ParserBase::new(
            NameCollection::new("Oracle Group", "oracle-group", "oracle"),
            Pattern::line(r#"^name="(?P<oracle>[^"]*)"$"#),
        ))
    }
}

impl BlockParser for OracleGroupBlockParser {
    fn base(&self) -> &ParserBase {
        &self.0
    }

    fn handle_args(&self, mut line: ParsedLine, _ctx: &mut Context<'_>) -> Args {
        convert_link_arg(&mut line, "oracle");
        line
    }
}

impl OracleBlockParser {
    pub fn new() -> Self {
        Self(ParserBase::new(
            NameCollection::from_name("Oracle"),
            Pattern::params(ORACLE_KEYS),
        ))
    }
}

impl BlockParser for OracleBlockParser {
    fn base(&self) -> &ParserBase {
        &self.0
    }

    fn handle_args(&self, line: ParsedLine, _ctx: &mut Context<'_>) -> Args {
        oracle_args(line)
    }
}

impl OraclePromptBlockParser {
    pub fn new() -> Self {
        Self(ParserBase::new(
            NameCollection::new("Oracle Prompt", "-", "oracle"),
            Pattern::line(r#"^"(?P<prompt>[^"]*)"$"#),
        ))
    }
}

impl BlockParser for OraclePromptBlockParser {
    fn base(&self) -> &ParserBase {
        &self.0
    }
}
