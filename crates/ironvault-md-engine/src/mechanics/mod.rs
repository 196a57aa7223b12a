//! # Mechanics sections
//!
//! Finding `iron-vault-mechanics` sections in a document and turning their
//! lines into parser calls.
//!
//! ## Modules
//!
//! - **fence**: rewrites fenced sections into `,,,` marked units
//! - **section**: recognizes a unit and extracts its inner text
//! - **dispatch**: [`LineDispatcher`] classifies lines and drives the parsers
//! - **error**: [`MechanicsError`], the errors that abort a conversion

pub mod dispatch;
pub mod error;
pub mod fence;
pub mod section;

pub use dispatch::{LineDispatcher, LineKind, classify};
pub use error::{MalformedReason, MechanicsError};
pub use fence::{FenceNormalizer, normalize_fences};
