//! Afterglow decay models.
//!
//! The decay laws are small, pure functions (`decay`) so the model wrappers and
//! the likelihood can stay generic over them (`model`).

pub mod decay;
pub mod model;

pub use decay::*;
pub use model::*;
