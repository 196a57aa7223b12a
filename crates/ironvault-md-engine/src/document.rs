//! Whole-document conversion.
//!
//! [`Converter::convert`] normalizes the fences of a Markdown document, splits
//! it into blank-line separated units and parses every mechanics unit into a
//! shared [`OutputTree`]. Everything else is passed through as Markdown text
//! for the caller to render.

use crate::diagnostics::Diagnostic;
use crate::mechanics::{LineDispatcher, MechanicsError, normalize_fences};
use crate::parsers::{Context, ParserRegistry};
use crate::render::{ElementId, OutputTree, Renderer};

/// One piece of a converted document, in document order.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Host Markdown, with mechanics sections removed.
    Markdown(String),
    /// The container element of a parsed mechanics section.
    Mechanics(ElementId),
}

#[derive(Debug)]
pub struct Conversion {
    pub tree: OutputTree,
    pub segments: Vec<Segment>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Conversion {
    /// Concatenates the segments, rendering Markdown with `markdown`.
    pub fn to_html(&self, mut markdown: impl FnMut(&str) -> String) -> String {
        self.segments
            .iter()
            .map(|segment| match segment {
                Segment::Markdown(text) => markdown(text),
                Segment::Mechanics(id) => self.tree.to_html(*id),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn mechanics(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Mechanics(id) => Some(*id),
            Segment::Markdown(_) => None,
        })
    }
}

pub struct Converter<R: Renderer> {
    dispatcher: LineDispatcher,
    renderer: R,
}

impl<R: Renderer> Converter<R> {
    /// Converter with the built-in parsers.
    pub fn new(renderer: R) -> Self {
        Self::with_registry(ParserRegistry::with_defaults(), renderer)
    }

    pub fn with_registry(registry: ParserRegistry, renderer: R) -> Self {
        Self {
            dispatcher: LineDispatcher::new(registry),
            renderer,
        }
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn convert(&self, text: &str) -> Result<Conversion, MechanicsError> {
        let source: Vec<&str> = text.lines().collect();
        let lines = normalize_fences(&source)?;

        let mut tree = OutputTree::new();
        let mut segments = Vec::new();
        let mut diagnostics = Vec::new();
        let mut pending: Vec<&str> = Vec::new();
        let mut unit: Vec<&str> = Vec::new();

        let mut units = lines.iter().map(String::as_str).peekable();
        while let Some(line) = units.next() {
            let blank = line.trim().is_empty();
            if !blank {
                unit.push(line);
            }
            if !(blank || units.peek().is_none()) {
                continue;
            }

            if !unit.is_empty() {
                let joined = unit.join("\n");
                if self.dispatcher.test(&joined) {
                    flush_markdown(&mut pending, &mut segments);
                    let root = tree.root();
                    let mut ctx = Context::new(&mut tree, &self.renderer, root);
                    segments.push(Segment::Mechanics(ctx.root()));
                    self.dispatcher.run(&mut ctx, &joined)?;
                    diagnostics.extend(ctx.into_diagnostics());
                } else {
                    pending.append(&mut unit);
                }
                unit.clear();
            }
            if blank {
                pending.push(line);
            }
        }
        flush_markdown(&mut pending, &mut segments);

        Ok(Conversion {
            tree,
            segments,
            diagnostics,
        })
    }
}

fn flush_markdown(pending: &mut Vec<&str>, segments: &mut Vec<Segment>) {
    let text = pending.join("\n");
    pending.clear();
    let text = text.trim_matches('\n');
    if !text.trim().is_empty() {
        segments.push(Segment::Markdown(text.to_string()));
    }
}
