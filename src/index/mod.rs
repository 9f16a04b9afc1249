//! Interfaces to the retrieval collaborators.
//!
//! The embedding model, the vector database and the similarity search live
//! outside this crate. This module defines the traits they implement and an
//! [`Indexer`] that feeds scene chunks through them.

use crate::chunking::{ChunkMetadata, SceneChunk};
use crate::error::{Result, ScriptRagError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Trait for embedding generation.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate an embedding for a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for multiple texts, in input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Get the embedding dimensions.
    fn dimensions(&self) -> usize;
}

/// A chunk together with its embedding, as handed to the vector store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedChunk {
    pub id: String,
    pub content: String,
    pub metadata: ChunkMetadata,
    pub embedding: Vec<f32>,
}

/// Trait for vector store implementations.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Bulk upsert chunks, keyed by chunk id.
    async fn upsert_batch(&self, chunks: &[IndexedChunk]) -> Result<usize>;

    /// Delete every chunk of an episode.
    async fn delete_by_episode(&self, episode: u32) -> Result<usize>;

    /// Get total chunk count.
    async fn count(&self) -> Result<usize>;
}

/// A retrieved chunk: its text and the metadata it was indexed with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub content: String,
    pub metadata: ChunkMetadata,
}

impl RetrievedChunk {
    /// Short citation, e.g. `第3集 第二幕 @ 翊坤宫`.
    pub fn citation(&self) -> String {
        let scene = &self.metadata.scene;
        if scene.location.is_empty() {
            format!("{} 第{}幕", scene.title, scene.scene_number)
        } else {
            format!("{} 第{}幕 @ {}", scene.title, scene.scene_number, scene.location)
        }
    }
}

/// Trait for the question-time search over indexed chunks.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Return up to `k` chunks relevant to `query`, best first.
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<RetrievedChunk>>;
}

/// Format retrieved chunks as numbered, cited context blocks.
pub fn format_context(chunks: &[RetrievedChunk]) -> String {
    chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| {
            let characters = &chunk.metadata.scene.characters;
            let cast = if characters.is_empty() {
                String::new()
            } else {
                format!(" ({})", characters)
            };
            format!("---\n[{}] {}{}\n{}\n---", i + 1, chunk.citation(), cast, chunk.content)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Embeds chunks and writes them to a vector store.
pub struct Indexer {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
}

impl Indexer {
    pub fn new(embedder: Arc<dyn Embedder>, store: Arc<dyn VectorStore>) -> Self {
        Self { embedder, store }
    }

    /// Replace the stored chunks of every episode present in `chunks`.
    #[instrument(skip(self, chunks), fields(count = chunks.len()))]
    pub async fn index(&self, chunks: Vec<SceneChunk>) -> Result<usize> {
        if chunks.is_empty() {
            return Ok(0);
        }

        let episodes: BTreeSet<u32> = chunks.iter().map(|c| c.metadata.scene.episode).collect();
        for episode in &episodes {
            let removed = self.store.delete_by_episode(*episode).await?;
            debug!("Removed {} stale chunks of episode {}", removed, episode);
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;

        if embeddings.len() != chunks.len() {
            return Err(ScriptRagError::Embedding(format!(
                "Expected {} embeddings, got {}",
                chunks.len(),
                embeddings.len()
            )));
        }

        let indexed: Vec<IndexedChunk> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| IndexedChunk {
                id: chunk.id,
                content: chunk.content,
                metadata: chunk.metadata,
                embedding,
            })
            .collect();

        let count = self.store.upsert_batch(&indexed).await?;
        info!("Indexed {} chunks across {} episodes", count, episodes.len());

        Ok(count)
    }
}
