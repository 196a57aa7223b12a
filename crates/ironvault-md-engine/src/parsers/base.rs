//! Node and block parser traits.
//!
//! Every parser owns a [`ParserBase`]: its [`NameCollection`] and the
//! [`Pattern`] its parameters must match. The provided trait methods do the
//! shared work (match, shape args, render, attach) so concrete parsers only
//! override the `handle_args` and finalize hooks they need.

use regex::Regex;

use super::args::{Args, ParsedLine, Value};
use super::context::{BlockContext, Context};
use super::names::NameCollection;
use super::params::{parse_params, split_known};
use crate::render::{FALLBACK_BLOCK, FALLBACK_NODE, TemplateKind};

/// What a parser accepts after its name.
#[derive(Debug)]
pub enum Pattern {
    /// A regex over the whole parameter text. Named groups become the
    /// [`ParsedLine`]; groups that did not participate map to `Null`.
    Line(Regex),
    /// Free-order `key=value` parameters split into declared keys and `extra`.
    Params(Vec<String>),
    /// Accepts nothing. Used for names without a registered parser.
    Reject,
}

/// Result of matching parameter text against a [`Pattern`].
#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
    Matched(ParsedLine),
    Unmatched(String),
}

impl Pattern {
    /// Compiles a line pattern. Only used with literal patterns.
    pub fn line(regex: &str) -> Self {
        Pattern::Line(Regex::new(regex).expect("Invalid parser regex"))
    }

    pub fn params(known: &[&str]) -> Self {
        Pattern::Params(known.iter().map(|k| k.to_string()).collect())
    }

    pub fn matches(&self, data: &str) -> MatchOutcome {
        match self {
            Pattern::Line(regex) => match regex.captures(data) {
                Some(caps) => {
                    let line = regex
                        .capture_names()
                        .flatten()
                        .map(|name| {
                            let value = caps
                                .name(name)
                                .map_or(Value::Null, |m| Value::from(m.as_str()));
                            (name.to_string(), value)
                        })
                        .collect();
                    MatchOutcome::Matched(line)
                }
                None => MatchOutcome::Unmatched(format!("does not match {}", regex.as_str())),
            },
            Pattern::Params(known) => match parse_params(data) {
                Ok(pairs) => MatchOutcome::Matched(split_known(pairs, known)),
                Err(err) => MatchOutcome::Unmatched(err.to_string()),
            },
            Pattern::Reject => MatchOutcome::Unmatched("no parser registered".to_string()),
        }
    }
}

/// Names and pattern shared by every parser.
#[derive(Debug)]
pub struct ParserBase {
    names: NameCollection,
    pattern: Pattern,
}

impl ParserBase {
    pub fn new(names: NameCollection, pattern: Pattern) -> Self {
        Self { names, pattern }
    }

    pub fn names(&self) -> &NameCollection {
        &self.names
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    /// Matches `data`, recording a diagnostic when it is rejected.
    fn matches(&self, ctx: &mut Context<'_>, data: &str) -> Option<ParsedLine> {
        match self.pattern.matches(data) {
            MatchOutcome::Matched(line) => {
                log::debug!("Matched {}: {line:?}", self.names.name());
                Some(line)
            }
            MatchOutcome::Unmatched(reason) => {
                ctx.warn(format!(
                    "Failed to match {} parameters {data:?}: {reason}",
                    self.names.name()
                ));
                None
            }
        }
    }
}

/// Arguments for the fallback templates: the display name and raw parameters.
pub fn fallback_args(names: &NameCollection, data: &str) -> Args {
    crate::args! { "name" => names.name(), "content" => data }
}

/// Parser for single-line nodes.
pub trait NodeParser: Send + Sync {
    fn base(&self) -> &ParserBase;

    fn names(&self) -> &NameCollection {
        self.base().names()
    }

    /// Shapes matched captures into template arguments.
    fn handle_args(&self, line: ParsedLine, _ctx: &mut Context<'_>) -> Args {
        line
    }

    /// Parses the parameters of one node line and attaches its output.
    fn parse(&self, ctx: &mut Context<'_>, data: &str) {
        let names = self.names();
        let (key, args) = match self.base().matches(ctx, data) {
            Some(line) => (names.template(), self.handle_args(line, ctx)),
            None => (FALLBACK_NODE, fallback_args(names, data)),
        };
        log::debug!("Arranged args for {}: {args:?}", names.name());

        if let Some(element) = ctx.render(key, TemplateKind::Node, &args) {
            ctx.attach(element);
        }
    }
}

/// Parser for multi-line blocks whose children nest inside them.
pub trait BlockParser: Send + Sync {
    fn base(&self) -> &ParserBase;

    fn names(&self) -> &NameCollection {
        self.base().names()
    }

    /// Shapes matched captures of the opening line into template arguments.
    fn handle_args(&self, line: ParsedLine, _ctx: &mut Context<'_>) -> Args {
        line
    }

    /// Hook to attach extra children before the block renders.
    fn finalize_nodes(&self, _ctx: &mut Context<'_>) {}

    /// Arguments the block template renders with.
    fn finalize_args(&self, ctx: &mut Context<'_>) -> Args {
        ctx.args().cloned().unwrap_or_default()
    }

    /// Opens the block: attaches a placeholder and pushes a frame for it.
    fn begin(&self, ctx: &mut Context<'_>, data: &str) {
        let names = self.names();
        let (matches, args) = match self.base().matches(ctx, data) {
            Some(line) => (Some(line.clone()), self.handle_args(line, ctx)),
            None => (None, fallback_args(names, data)),
        };
        log::debug!("Arranged args for {}: {args:?}", names.name());

        let placeholder = ctx.tree_mut().create("div");
        ctx.attach(placeholder);
        ctx.push(BlockContext::new(names.clone(), placeholder, matches, args));
    }

    /// Closes the block: renders it over its placeholder and pops the frame.
    fn finalize(&self, ctx: &mut Context<'_>) {
        self.finalize_nodes(ctx);

        let key = if ctx.matches().is_some() {
            self.names().template()
        } else {
            FALLBACK_BLOCK
        };
        let args = self.finalize_args(ctx);
        if let Some(element) = ctx.render(key, TemplateKind::Block, &args) {
            ctx.replace_root(element);
        }
        ctx.pop();
    }
}

/// Node parser with no argument shaping, also used for unregistered names.
#[derive(Debug)]
pub struct GenericNodeParser(ParserBase);

impl GenericNodeParser {
    pub fn new(names: NameCollection, pattern: Pattern) -> Self {
        Self(ParserBase::new(names, pattern))
    }

    /// Parser that renders every line with the fallback node template.
    pub fn unhandled(name: &str) -> Self {
        Self::new(NameCollection::new(name, name, name), Pattern::Reject)
    }
}

impl NodeParser for GenericNodeParser {
    fn base(&self) -> &ParserBase {
        &self.0
    }
}

/// Block parser with no argument shaping, also used for unregistered names.
#[derive(Debug)]
pub struct GenericBlockParser(ParserBase);

impl GenericBlockParser {
    pub fn new(names: NameCollection, pattern: Pattern) -> Self {
        Self(ParserBase::new(names, pattern))
    }

    /// Parser that renders with the fallback block template.
    pub fn unhandled(name: &str) -> Self {
        Self::new(NameCollection::new(name, name, name), Pattern::Reject)
    }
}

impl BlockParser for GenericBlockParser {
    fn base(&self) -> &ParserBase {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args;
    use crate::render::{OutputTree, TemplateRenderer};
    use insta::assert_snapshot;
    use pretty_assertions::assert_eq;

    fn test_node_parser() -> GenericNodeParser {
        GenericNodeParser::new(
            NameCollection::from_name("Test"),
            Pattern::line(r"^(?P<first>\w+)(?: (?P<second>\w+))?$"),
        )
    }

    fn test_block_parser() -> GenericBlockParser {
        GenericBlockParser::new(
            NameCollection::from_name("Test"),
            Pattern::line(r#"^"(?P<label>[^"]+)"$"#),
        )
    }

    fn renderer() -> TemplateRenderer {
        let mut renderer = TemplateRenderer::new();
        renderer.set_override("test", r#"<p class="test">{{ first }}</p>"#.to_string());
        renderer.set_override(
            "test_block",
            r#"<section class="test">{{ label }}</section>"#.to_string(),
        );
        renderer
    }

    #[test]
    fn line_pattern_maps_missing_groups_to_null() {
        let outcome = test_node_parser().base().pattern().matches("one");
        assert_eq!(
            outcome,
            MatchOutcome::Matched(args! { "first" => "one", "second" => Value::Null })
        );
    }

    #[test]
    fn params_pattern_splits_extra() {
        let pattern = Pattern::params(&["name"]);
        assert_eq!(
            pattern.matches(r#"name="x" other=1"#),
            MatchOutcome::Matched(args! {
                "name" => "x",
                "extra" => args! { "other" => 1 },
            })
        );
        assert!(matches!(pattern.matches("name=x"), MatchOutcome::Unmatched(_)));
    }

    #[test]
    fn node_parse_renders_at_parent() {
        let renderer = renderer();
        let mut tree = OutputTree::new();
        let root = tree.root();
        let mut ctx = Context::with_root(&mut tree, &renderer, root);

        test_node_parser().parse(&mut ctx, "hello there");

        assert!(ctx.diagnostics().is_empty());
        assert_snapshot!(ctx.tree().inner_html(root), @r#"<p class="test">hello</p>"#);
    }

    #[test]
    fn node_mismatch_uses_fallback() {
        let renderer = renderer();
        let mut tree = OutputTree::new();
        let root = tree.root();
        let mut ctx = Context::with_root(&mut tree, &renderer, root);

        test_node_parser().parse(&mut ctx, "not <valid> input");

        assert_eq!(ctx.diagnostics().len(), 1);
        assert_snapshot!(
            ctx.tree().inner_html(root),
            @r#"<div class="ivm-node">Test: not &lt;valid&gt; input</div>"#
        );
    }

    #[test]
    fn node_without_template_renders_nothing() {
        let mut renderer = renderer();
        renderer.set_override("test", String::new());
        let mut tree = OutputTree::new();
        let root = tree.root();
        let mut ctx = Context::with_root(&mut tree, &renderer, root);

        test_node_parser().parse(&mut ctx, "hello");

        assert!(ctx.tree().children(root).is_empty());
    }

    #[test]
    fn block_begin_pushes_matched_frame() {
        let renderer = renderer();
        let mut tree = OutputTree::new();
        let root = tree.root();
        let mut ctx = Context::with_root(&mut tree, &renderer, root);

        test_block_parser().begin(&mut ctx, r#""Label""#);

        assert_eq!(ctx.depth(), 1);
        assert_eq!(ctx.args(), Some(&args! { "label" => "Label" }));
        assert!(ctx.matches().is_some());
        assert_eq!(ctx.tree().children(root), vec![ctx.parent()]);
    }

    #[test]
    fn block_begin_mismatch_keeps_raw_content() {
        let renderer = renderer();
        let mut tree = OutputTree::new();
        let root = tree.root();
        let mut ctx = Context::with_root(&mut tree, &renderer, root);

        test_block_parser().begin(&mut ctx, "unquoted");

        assert!(ctx.matches().is_none());
        assert_eq!(
            ctx.args(),
            Some(&args! { "name" => "Test", "content" => "unquoted" })
        );
    }

    #[test]
    fn block_finalize_replaces_placeholder_and_keeps_children() {
        let renderer = renderer();
        let mut tree = OutputTree::new();
        let root = tree.root();
        let mut ctx = Context::with_root(&mut tree, &renderer, root);

        test_block_parser().begin(&mut ctx, r#""Label""#);
        test_node_parser().parse(&mut ctx, "inner");
        test_block_parser().finalize(&mut ctx);

        assert_eq!(ctx.depth(), 0);
        assert_snapshot!(
            ctx.tree().inner_html(root),
            @r#"<section class="test">Label<p class="test">inner</p></section>"#
        );
    }

    #[test]
    fn block_finalize_mismatch_uses_fallback() {
        let renderer = renderer();
        let mut tree = OutputTree::new();
        let root = tree.root();
        let mut ctx = Context::with_root(&mut tree, &renderer, root);

        test_block_parser().begin(&mut ctx, "unquoted");
        test_block_parser().finalize(&mut ctx);

        assert_snapshot!(
            ctx.tree().inner_html(root),
            @r#"<div class="ivm-block">Test: unquoted</div>"#
        );
    }

    #[test]
    fn block_without_template_keeps_placeholder() {
        let mut renderer = renderer();
        renderer.set_override("test_block", String::new());
        let mut tree = OutputTree::new();
        let root = tree.root();
        let mut ctx = Context::with_root(&mut tree, &renderer, root);

        test_block_parser().begin(&mut ctx, r#""Label""#);
        test_node_parser().parse(&mut ctx, "inner");
        test_block_parser().finalize(&mut ctx);

        assert_snapshot!(
            ctx.tree().inner_html(root),
            @r#"<div><p class="test">inner</p></div>"#
        );
    }

    #[test]
    fn unhandled_parsers_always_fall_back() {
        let renderer = renderer();
        let mut tree = OutputTree::new();
        let root = tree.root();
        let mut ctx = Context::with_root(&mut tree, &renderer, root);

        GenericNodeParser::unhandled("foobar").parse(&mut ctx, "1 2 3");

        assert_snapshot!(
            ctx.tree().inner_html(root),
            @r#"<div class="ivm-node">foobar: 1 2 3</div>"#
        );
    }
}
