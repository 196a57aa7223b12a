//! # ironvault-md engine
//!
//! Parses the fenced `iron-vault-mechanics` notation embedded in Markdown
//! journals and turns it into an HTML element tree.
//!
//! ## Pipeline
//!
//! 1. **Fence normalization** (`mechanics::fence`): rewrites mechanics fences
//!    to `,,,` markers and isolates every section as its own blank-line
//!    separated unit
//! 2. **Section extraction** (`mechanics::section`): recognizes a unit as a
//!    mechanics section and isolates its inner text
//! 3. **Line dispatch** (`mechanics::dispatch`): classifies each inner line and
//!    drives the node and block parsers from the `parsers::ParserRegistry`
//! 4. **Rendering** (`render`): parsers hand (template key, argument map) pairs
//!    to a `render::Renderer`; rendered fragments are attached to the
//!    `render::OutputTree` at the position tracked by `parsers::Context`
//!
//! `document::Converter` wires all of these together for a whole document.

pub mod diagnostics;
pub mod document;
pub mod mechanics;
pub mod parsers;
pub mod render;

pub use diagnostics::{Diagnostic, record_unhandled, unhandled_names};
pub use document::{Conversion, Converter, Segment};
pub use mechanics::{LineDispatcher, MechanicsError};
pub use parsers::{Args, Context, ParserRegistry, RollResult, RollState, Value};
pub use render::{ElementId, OutputTree, Renderer, TemplateKind, TemplateRenderer, TemplateSettings};
