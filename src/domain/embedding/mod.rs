//! Embedding domain - the similarity oracle seam

mod provider;
mod response;

pub use provider::EmbeddingProvider;
pub use response::{cosine_similarity, Embedding};

#[cfg(test)]
pub use provider::mock::MockEmbeddingProvider;
