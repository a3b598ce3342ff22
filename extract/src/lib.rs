//! Face embedding provider interface.
//!
//! Recognition consumes fixed-length float vectors; producing them from
//! image bytes is the job of an upstream detection + embedding model behind
//! the [`FaceEmbedder`] trait. This crate specifies the seam only; model
//! loading and inference live in the implementations.

mod error;
mod extract;

pub use error::ExtractError;
pub use extract::FaceEmbedder;
