//! # Rendering
//!
//! The parsers only produce a template key and an argument map. Turning those
//! into markup goes through the [`Renderer`] trait, and the markup is attached
//! to the [`OutputTree`].
//!
//! ## Modules
//!
//! - **tree**: element arena the mechanics output is built in
//! - **templater**: [`TemplateRenderer`], the `minijinja` backed renderer

pub mod templater;
pub mod tree;

use thiserror::Error;

use crate::parsers::Args;

pub use templater::{TemplateRenderer, TemplateSettings};
pub use tree::{Child, Element, ElementId, FragmentError, OutputTree};

/// Renderer key of the fallback template used for unmatched node lines.
pub const FALLBACK_NODE: &str = "node";
/// Renderer key of the fallback template used for unmatched block openings.
pub const FALLBACK_BLOCK: &str = "block";
/// Renderer key of the container wrapping one mechanics section.
pub const MECHANICS: &str = "mechanics";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateKind {
    Node,
    Block,
}

impl TemplateKind {
    /// Directory the packaged templates of this kind live in.
    pub fn dir(&self) -> &'static str {
        match self {
            TemplateKind::Node => "nodes",
            TemplateKind::Block => "blocks",
        }
    }
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("template failed to render: {0}")]
    Template(#[from] minijinja::Error),
    #[error(transparent)]
    Fragment(#[from] FragmentError),
}

/// A compiled template.
pub trait Template {
    fn render(&self, args: &Args) -> Result<String, RenderError>;
}

/// Maps a (key, kind) pair to a template.
///
/// `None` means "render nothing", whether the key is unknown or was disabled.
pub trait Renderer {
    fn lookup(&self, key: &str, kind: TemplateKind) -> Option<Box<dyn Template + '_>>;
}

impl<R: Renderer + ?Sized> Renderer for &R {
    fn lookup(&self, key: &str, kind: TemplateKind) -> Option<Box<dyn Template + '_>> {
        (**self).lookup(key, kind)
    }
}
