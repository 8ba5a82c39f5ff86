mod api;
mod provider;

#[cfg(test)]
mod tests;

pub use provider::{cosine_similarity, EmbeddingProvider};
