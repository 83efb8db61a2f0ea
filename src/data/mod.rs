//! Data loading for multiclass training files

pub mod libsvm;

pub use self::libsvm::*;
