//! # Parser framework
//!
//! Node and block parsers, the registry that maps names to them, and the
//! context they share while one mechanics section is parsed.
//!
//! ## Modules
//!
//! - **args**: [`Args`] / [`Value`], the argument maps handed to templates
//! - **base**: [`NodeParser`] / [`BlockParser`] traits, [`Pattern`] matching
//!   and the fallback parsers
//! - **blocks** / **nodes**: the built-in parsers
//! - **context**: [`Context`] stack of open blocks
//! - **cursor** / **params**: the `key=value` parameter tokenizer
//! - **names**: [`NameCollection`]
//! - **registry**: [`ParserRegistry`]
//! - **roll**: [`RollState`] and [`RollResult`]
//! - **util**: link, tick and slug helpers

pub mod args;
pub mod base;
pub mod blocks;
pub mod context;
pub mod cursor;
pub mod names;
pub mod nodes;
pub mod params;
pub mod registry;
pub mod roll;
pub mod util;

pub use args::{Args, ParsedLine, Value};
pub use base::{
    BlockParser, GenericBlockParser, GenericNodeParser, MatchOutcome, NodeParser, ParserBase,
    Pattern, fallback_args,
};
pub use context::{BlockContext, Context};
pub use names::NameCollection;
pub use params::{ParamError, parse_params, split_known};
pub use registry::ParserRegistry;
pub use roll::{Die, Hitmiss, RollResult, RollState};
