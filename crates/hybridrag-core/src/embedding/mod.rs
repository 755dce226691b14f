//! Embedding model abstractions.
//!
//! - [`Embedder`] - embedding model interface consumed by the retriever
//! - [`HashingEmbedder`] - deterministic feature-hashing embedder that needs
//!   no model weights; used by the CLI and in tests

mod hashing;
mod traits;

pub use hashing::HashingEmbedder;
pub use traits::Embedder;
