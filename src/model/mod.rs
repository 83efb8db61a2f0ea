//! Structured model implementations
//!
//! Any type implementing [`crate::core::StructuredModel`] works with the
//! trainer; this module ships a linear multiclass model as the reference
//! implementation.

pub mod multiclass;

pub use self::multiclass::*;
