//! QP backends for the cutting-plane trainer
//!
//! Any type implementing [`crate::core::QpSolver`] can serve as the
//! backend; this module ships a small in-process solver suitable for the
//! working-set sizes the cutting-plane loop produces.

pub mod coordinate;

pub use self::coordinate::*;
