//! rsonnet-util - Shared foundation types for the rsonnet interpreter.
//!
//! This crate provides the pieces every pipeline stage needs: source
//! positions ([`Span`]), the diagnostic accumulator ([`Handler`]), and the
//! hash map types used for scope bindings.

pub mod diagnostic;
pub mod span;

pub use diagnostic::{Diagnostic, Handler, Level};
pub use span::Span;

// Re-export commonly used hash types so downstream crates agree on hashers.
pub use rustc_hash::FxHashMap;
pub use rustc_hash::FxHashSet;
