//! Nesting state for one mechanics section parse.
//!
//! A [`Context`] owns a stack of [`BlockContext`] frames. The top frame, or the
//! section root when the stack is empty, is where new output is attached and
//! whose [`RollState`] node parsers update.

use super::args::{Args, ParsedLine};
use super::names::NameCollection;
use super::roll::RollState;
use crate::diagnostics::Diagnostic;
use crate::render::{ElementId, MECHANICS, OutputTree, RenderError, Renderer, TemplateKind};

/// One open block.
#[derive(Debug, Clone)]
pub struct BlockContext {
    pub names: NameCollection,
    /// Element the block's children are attached to. Starts as a placeholder.
    pub root: ElementId,
    /// Captures of the opening line, `None` when it did not match.
    pub matches: Option<ParsedLine>,
    pub args: Args,
    pub roll: RollState,
}

impl BlockContext {
    pub fn new(
        names: NameCollection,
        root: ElementId,
        matches: Option<ParsedLine>,
        args: Args,
    ) -> Self {
        Self {
            names,
            root,
            matches,
            args,
            roll: RollState::new(),
        }
    }
}

pub struct Context<'a> {
    tree: &'a mut OutputTree,
    renderer: &'a dyn Renderer,
    root: ElementId,
    root_names: NameCollection,
    root_roll: RollState,
    blocks: Vec<BlockContext>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Context<'a> {
    /// Renders the mechanics container, appends it under `parent` and roots
    /// the context there. A bare `<div>` stands in when no container renders.
    pub fn new(tree: &'a mut OutputTree, renderer: &'a dyn Renderer, parent: ElementId) -> Self {
        let mut ctx = Self::with_root(tree, renderer, parent);
        let container = match ctx.render(MECHANICS, TemplateKind::Block, &Args::new()) {
            Some(element) => element,
            None => ctx.tree.create("div"),
        };
        ctx.tree.append(parent, container);
        ctx.root = container;
        ctx
    }

    /// Context rooted directly at `root`, without a container.
    pub fn with_root(tree: &'a mut OutputTree, renderer: &'a dyn Renderer, root: ElementId) -> Self {
        Self {
            tree,
            renderer,
            root,
            root_names: NameCollection::root(),
            root_roll: RollState::new(),
            blocks: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    /// The section container.
    pub fn root(&self) -> ElementId {
        self.root
    }

    /// Where new output is attached.
    pub fn parent(&self) -> ElementId {
        self.blocks.last().map_or(self.root, |b| b.root)
    }

    pub fn names(&self) -> &NameCollection {
        self.blocks.last().map_or(&self.root_names, |b| &b.names)
    }

    pub fn matches(&self) -> Option<&ParsedLine> {
        self.blocks.last().and_then(|b| b.matches.as_ref())
    }

    pub fn args(&self) -> Option<&Args> {
        self.blocks.last().map(|b| &b.args)
    }

    pub fn roll(&self) -> &RollState {
        self.blocks.last().map_or(&self.root_roll, |b| &b.roll)
    }

    pub fn roll_mut(&mut self) -> &mut RollState {
        match self.blocks.last_mut() {
            Some(block) => &mut block.roll,
            None => &mut self.root_roll,
        }
    }

    pub fn depth(&self) -> usize {
        self.blocks.len()
    }

    pub fn push(&mut self, block: BlockContext) {
        log::debug!("Entering {} block", block.names.name());
        self.blocks.push(block);
    }

    pub fn pop(&mut self) -> Option<BlockContext> {
        let block = self.blocks.pop();
        match &block {
            Some(b) => log::debug!("Leaving {} block", b.names.name()),
            None => self.warn("Cannot leave a block, no block is open"),
        }
        block
    }

    /// Swaps the current block's placeholder for `new_root`.
    ///
    /// The placeholder's children move to the end of `new_root`'s children and
    /// `new_root` takes the placeholder's position in its parent.
    pub fn replace_root(&mut self, new_root: ElementId) {
        let Some(block) = self.blocks.last_mut() else {
            self.warn("Cannot replace block root, no block is open");
            return;
        };
        let old = block.root;
        block.root = new_root;
        self.tree.move_children(old, new_root);
        if !self.tree.replace(old, new_root) {
            self.warn("Block placeholder was detached, rendered block dropped");
        }
    }

    pub fn tree(&self) -> &OutputTree {
        &*self.tree
    }

    pub fn tree_mut(&mut self) -> &mut OutputTree {
        &mut *self.tree
    }

    /// Appends `element` at the current output location.
    pub fn attach(&mut self, element: ElementId) {
        let parent = self.parent();
        self.tree.append(parent, element);
    }

    /// Renders `key` into a detached element.
    ///
    /// Returns `None` when the renderer has no template for the key, the
    /// output is blank, or the output is not a single element. The last two
    /// are recorded as diagnostics.
    pub fn render(&mut self, key: &str, kind: TemplateKind, args: &Args) -> Option<ElementId> {
        match self.try_render(key, kind, args) {
            Ok(element) => element,
            Err(err) => {
                self.warn(format!("Cannot render {key} {}: {err}", kind.dir()));
                None
            }
        }
    }

    fn try_render(
        &mut self,
        key: &str,
        kind: TemplateKind,
        args: &Args,
    ) -> Result<Option<ElementId>, RenderError> {
        let renderer = self.renderer;
        let Some(template) = renderer.lookup(key, kind) else {
            return Ok(None);
        };
        let markup = template.render(args)?;
        if markup.trim().is_empty() {
            log::debug!("Template {key} rendered nothing");
            return Ok(None);
        }
        Ok(Some(self.tree.parse_fragment(&markup)?))
    }

    /// Logs a warning and records it as a diagnostic.
    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::warn!("{message}");
        self.diagnostics.push(Diagnostic::warning(message));
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}
