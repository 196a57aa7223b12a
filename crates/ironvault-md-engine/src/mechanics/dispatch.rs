//! Line dispatcher.
//!
//! Walks the inner text of a mechanics section and drives the parsers:
//!
//! 1. `- "text` without a closing quote starts an out-of-character remark
//!    that continues until a line ends with `"`
//! 2. `name params {` opens a block
//! 3. `name params` is a node
//! 4. `}` closes the innermost block
//!
//! Anything else is skipped with a diagnostic.

use std::sync::OnceLock;

use regex::Regex;

use super::error::MechanicsError;
use super::section;
use crate::diagnostics::record_unhandled;
use crate::parsers::nodes::OOC_LINE_BREAK;
use crate::parsers::{
    BlockParser, Context, GenericBlockParser, GenericNodeParser, NodeParser, ParserRegistry,
};

/// Line closing the innermost block.
pub const BLOCK_CLOSE: &str = "}";
/// Node name of out-of-character remarks.
const OOC_NAME: &str = "-";
const OOC_PREFIX: &str = "- ";

static BLOCK_REGEX: OnceLock<Regex> = OnceLock::new();
static NODE_REGEX: OnceLock<Regex> = OnceLock::new();
static OOC_START_REGEX: OnceLock<Regex> = OnceLock::new();

fn block_regex() -> &'static Regex {
    BLOCK_REGEX.get_or_init(|| {
        Regex::new(r"^(?P<name>[\w-]+)(?: (?P<params>[^{]*))? \{$").expect("Invalid block regex")
    })
}

fn node_regex() -> &'static Regex {
    NODE_REGEX.get_or_init(|| {
        Regex::new(r"^(?P<name>[\w-]+) (?P<params>.*)$").expect("Invalid node regex")
    })
}

fn ooc_start_regex() -> &'static Regex {
    OOC_START_REGEX.get_or_init(|| Regex::new(r#"^- "[^"]*$"#).expect("Invalid OOC regex"))
}

/// Shape of one trimmed section line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind<'a> {
    /// First line of a remark spanning several lines.
    OocStart,
    BlockOpen { name: &'a str, params: &'a str },
    Node { name: &'a str, params: &'a str },
    BlockClose,
    Unrecognized,
}

/// Classifies a trimmed line. Remark continuation is left to the caller.
pub fn classify(line: &str) -> LineKind<'_> {
    if ooc_start_regex().is_match(line) {
        return LineKind::OocStart;
    }
    if let Some(caps) = block_regex().captures(line)
        && let Some(name) = caps.name("name")
    {
        let params = caps.name("params").map_or("", |m| m.as_str());
        return LineKind::BlockOpen {
            name: name.as_str(),
            params: params.trim(),
        };
    }
    if let Some(caps) = node_regex().captures(line)
        && let (Some(name), Some(params)) = (caps.name("name"), caps.name("params"))
    {
        return LineKind::Node {
            name: name.as_str(),
            params: params.as_str(),
        };
    }
    if line == BLOCK_CLOSE {
        return LineKind::BlockClose;
    }
    LineKind::Unrecognized
}

/// Parses mechanics sections with the parsers of a [`ParserRegistry`].
pub struct LineDispatcher {
    registry: ParserRegistry,
}

impl Default for LineDispatcher {
    fn default() -> Self {
        Self::new(ParserRegistry::with_defaults())
    }
}

impl LineDispatcher {
    pub fn new(registry: ParserRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ParserRegistry {
        &self.registry
    }

    /// Whether `unit` is a mechanics section.
    pub fn test(&self, unit: &str) -> bool {
        section::recognizes(unit)
    }

    /// Extracts the section in `unit` and parses it into `ctx`.
    pub fn run(&self, ctx: &mut Context<'_>, unit: &str) -> Result<(), MechanicsError> {
        let content = section::extract(unit)?;
        self.parse_content(ctx, content);
        Ok(())
    }

    /// Parses the inner text of a section.
    pub fn parse_content(&self, ctx: &mut Context<'_>, content: &str) {
        let mut remark: Option<Vec<&str>> = None;

        for line in content.lines().map(str::trim).filter(|l| !l.is_empty()) {
            if let Some(parts) = remark.as_mut() {
                parts.push(line);
                if line.ends_with('"') {
                    let merged = parts.join(OOC_LINE_BREAK);
                    remark = None;
                    self.dispatch(ctx, &merged);
                }
                continue;
            }

            match classify(line) {
                LineKind::OocStart => remark = Some(vec![line]),
                _ => self.dispatch(ctx, line),
            }
        }

        if let Some(parts) = remark {
            ctx.warn("Out-of-character remark is never closed");
            let merged = parts.join(OOC_LINE_BREAK);
            let params = merged.strip_prefix(OOC_PREFIX).unwrap_or(&merged);
            self.dispatch_node(ctx, OOC_NAME, params);
        }

        while ctx.depth() > 0 {
            ctx.warn(format!("{} block is never closed", ctx.names().name()));
            self.close_block(ctx);
        }
    }

    fn dispatch(&self, ctx: &mut Context<'_>, line: &str) {
        log::debug!("Dispatching {line:?}");
        match classify(line) {
            LineKind::BlockOpen { name, params } => match self.registry.block(name) {
                Some(parser) => parser.begin(ctx, params),
                None => {
                    self.note_unhandled(ctx, "block", name);
                    GenericBlockParser::unhandled(name).begin(ctx, params);
                }
            },
            LineKind::Node { name, params } => self.dispatch_node(ctx, name, params),
            LineKind::BlockClose => {
                if ctx.depth() == 0 {
                    ctx.warn("Closing brace without an open block");
                } else {
                    self.close_block(ctx);
                }
            }
            LineKind::OocStart | LineKind::Unrecognized => {
                ctx.warn(format!("Skipping unrecognized line {line:?}"));
            }
        }
    }

    fn dispatch_node(&self, ctx: &mut Context<'_>, name: &str, params: &str) {
        match self.registry.node(name) {
            Some(parser) => parser.parse(ctx, params),
            None => {
                self.note_unhandled(ctx, "node", name);
                GenericNodeParser::unhandled(name).parse(ctx, params);
            }
        }
    }

    fn close_block(&self, ctx: &mut Context<'_>) {
        let key = ctx.names().parser().to_string();
        match self.registry.block(&key) {
            Some(parser) => parser.finalize(ctx),
            None => GenericBlockParser::unhandled(&key).finalize(ctx),
        }
    }

    fn note_unhandled(&self, ctx: &mut Context<'_>, kind: &str, name: &str) {
        if record_unhandled(name) {
            log::info!("First unhandled {kind} {name}");
        }
        ctx.warn(format!("No parser for {kind} {name}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{OutputTree, TemplateRenderer};
    use crate::unhandled_names;
    use insta::assert_snapshot;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case(r#"- "open remark"#, LineKind::OocStart)]
    #[case(r#"- "closed remark""#, LineKind::Node { name: "-", params: r#""closed remark""# })]
    #[case(r#"move "[Face Danger](x)" {"#, LineKind::BlockOpen { name: "move", params: r#""[Face Danger](x)""# })]
    #[case("oracle-group {", LineKind::BlockOpen { name: "oracle-group", params: "" })]
    #[case("xp from=1 to=2", LineKind::Node { name: "xp", params: "from=1 to=2" })]
    #[case("}", LineKind::BlockClose)]
    #[case("unknown", LineKind::Unrecognized)]
    #[case("{", LineKind::Unrecognized)]
    fn classification(#[case] line: &str, #[case] expected: LineKind<'_>) {
        assert_eq!(classify(line), expected);
    }

    fn run(content: &str) -> (String, Vec<String>) {
        let renderer = TemplateRenderer::new();
        let dispatcher = LineDispatcher::default();
        let mut tree = OutputTree::new();
        let root = tree.root();
        let mut ctx = Context::with_root(&mut tree, &renderer, root);
        dispatcher.parse_content(&mut ctx, content);
        assert_eq!(ctx.depth(), 0);
        let messages = ctx.diagnostics().iter().map(|d| d.message.clone()).collect();
        (ctx.tree().inner_html(root), messages)
    }

    #[test]
    fn nodes_render_in_order() {
        let (html, diagnostics) = run("xp from=1 to=3\n\n   add 2\n");
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
        assert_snapshot!(
            html,
            @r#"<div class="ivm-xp">XP: 1 → 3</div><div class="ivm-add">Add +2</div>"#
        );
    }

    #[test]
    fn multi_line_remark_is_merged() {
        let (html, _) = run("- \"first line\nsecond line\nlast\"");
        assert_snapshot!(
            html,
            @r#"<div class="ivm-ooc">first line<br>second line<br>last</div>"#
        );
    }

    #[test]
    fn unclosed_remark_falls_back() {
        let (html, diagnostics) = run("- \"never\nclosed");
        assert_eq!(diagnostics.len(), 2);
        assert_snapshot!(
            html,
            @r#"<div class="ivm-node">OOC: "never&lt;br&gt;closed</div>"#
        );
    }

    #[test]
    fn move_block_wraps_its_roll() {
        let (html, diagnostics) = run(
            "move \"[Face Danger](datasworn:move:face_danger)\" {\n\
             roll \"Wits\" action=1 adds=0 stat=2 vs1=3 vs2=3\n\
             }",
        );
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
        assert_snapshot!(
            html,
            @r#"<div class="ivm-move ivm-move-result-miss ivm-move-result-match"><div class="ivm-move-name">Face Danger</div><div class="ivm-roll ivm-roll-miss ivm-roll-match">Roll +Wits: 1 + 2 + 0 = 3 vs 3 | 3</div><div class="ivm-roll-result ivm-roll-miss ivm-roll-match">Miss with a match</div></div>"#
        );
    }

    #[test]
    fn unknown_names_fall_back_and_are_recorded() {
        let (html, diagnostics) = run("dispatch-test-node 1 2 3\ndispatch-test-node 4");
        assert_eq!(diagnostics.len(), 4);
        assert_snapshot!(
            html,
            @r#"<div class="ivm-node">dispatch-test-node: 1 2 3</div><div class="ivm-node">dispatch-test-node: 4</div>"#
        );
        let recorded = unhandled_names()
            .into_iter()
            .filter(|n| n == "dispatch-test-node")
            .count();
        assert_eq!(recorded, 1);
    }

    #[test]
    fn unknown_block_closes_with_fallback() {
        let (html, _) = run("dispatch-test-block \"x\" {\nadd 1\n}");
        assert_snapshot!(
            html,
            @r#"<div class="ivm-block">dispatch-test-block: "x"<div class="ivm-add">Add +1</div></div>"#
        );
    }

    #[test]
    fn stray_close_and_garbage_are_skipped() {
        let (html, diagnostics) = run("}\n???\nxp from=1 to=2");
        assert_eq!(diagnostics.len(), 2);
        assert_snapshot!(html, @r#"<div class="ivm-xp">XP: 1 → 2</div>"#);
    }

    #[test]
    fn open_blocks_are_closed_at_the_end() {
        let (html, diagnostics) = run("actor name=\"Kira\" {\nmove \"[Strike](x)\" {\nadd 1");
        assert_eq!(diagnostics.len(), 2);
        assert_snapshot!(
            html,
            @r#"<div class="ivm-actor"><div class="ivm-actor-name">Kira</div><div class="ivm-move"><div class="ivm-move-name">Strike</div><div class="ivm-add">Add +1</div></div></div>"#
        );
    }
}
