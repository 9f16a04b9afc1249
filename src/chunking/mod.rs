//! Scene chunking for retrieval.
//!
//! Loads persisted episode documents, turns every scene into a
//! [`SceneDocument`] carrying citation metadata, and splits scene content
//! into overlapping [`SceneChunk`]s ready for embedding.

mod loader;
mod recursive;

pub use loader::{load_scene_documents, scene_documents};
pub use recursive::RecursiveCharacterSplitter;

use crate::config::ChunkingSettings;
use crate::error::{Result, ScriptRagError};
use serde::{Deserialize, Serialize};

/// Metadata identifying the scene a piece of text came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneMetadata {
    /// Episode number.
    pub episode: u32,
    /// Episode title (`第3集`).
    pub title: String,
    /// Scene numeral token from the header.
    pub scene_number: String,
    /// Scene location, possibly empty.
    pub location: String,
    /// Speaker names joined with `", "`.
    pub characters: String,
    /// Position of the scene within its episode.
    pub scene_index: usize,
    /// File the episode was loaded from.
    pub source: String,
}

/// One scene's content and metadata, before splitting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneDocument {
    pub content: String,
    pub metadata: SceneMetadata,
}

/// Metadata attached to each chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    #[serde(flatten)]
    pub scene: SceneMetadata,
    /// Character offset of the chunk inside the scene content.
    pub start_index: usize,
}

/// A piece of scene content sized for embedding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneChunk {
    /// Stable id, e.g. `ep03-s2-c0`.
    pub id: String,
    pub content: String,
    pub metadata: ChunkMetadata,
}

/// Configuration for chunking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkingConfig {
    /// Maximum chunk length in characters.
    pub chunk_size: usize,
    /// Characters carried over from the end of one chunk into the next.
    pub chunk_overlap: usize,
    /// Separators tried in order; `""` splits into characters.
    pub separators: Vec<String>,
}

impl ChunkingConfig {
    /// Build a validated config.
    pub fn new(chunk_size: usize, chunk_overlap: usize, separators: Vec<String>) -> Result<Self> {
        if chunk_size == 0 {
            return Err(ScriptRagError::Config(
                "chunk_size must be greater than 0".to_string(),
            ));
        }
        if chunk_overlap >= chunk_size {
            return Err(ScriptRagError::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                chunk_overlap, chunk_size
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
            separators,
        })
    }

    pub fn from_settings(settings: &ChunkingSettings) -> Result<Self> {
        Self::new(
            settings.chunk_size,
            settings.chunk_overlap,
            settings.separators.clone(),
        )
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        let settings = ChunkingSettings::default();
        Self {
            chunk_size: settings.chunk_size,
            chunk_overlap: settings.chunk_overlap,
            separators: settings.separators,
        }
    }
}

/// Trait for text splitting implementations.
pub trait TextSplitter: Send + Sync {
    /// Split text into chunk strings.
    fn split_text(&self, text: &str) -> Vec<String>;

    /// Overlap used to locate consecutive chunks in the source text.
    fn chunk_overlap(&self) -> usize;

    /// Split scene documents into chunks, attaching metadata and start offsets.
    fn split_documents(&self, documents: &[SceneDocument]) -> Vec<SceneChunk> {
        let mut chunks = Vec::new();

        for document in documents {
            let mut index = 0usize;
            let mut previous_len = 0usize;

            for (order, content) in self.split_text(&document.content).into_iter().enumerate() {
                let offset = (index + previous_len).saturating_sub(self.chunk_overlap());
                index = find_chars(&document.content, &content, offset).unwrap_or(offset);
                previous_len = content.chars().count();

                chunks.push(SceneChunk {
                    id: chunk_id(&document.metadata, order),
                    content,
                    metadata: ChunkMetadata {
                        scene: document.metadata.clone(),
                        start_index: index,
                    },
                });
            }
        }

        chunks
    }
}

fn chunk_id(metadata: &SceneMetadata, order: usize) -> String {
    format!("ep{:02}-s{}-c{}", metadata.episode, metadata.scene_index, order)
}

/// Character index of `needle` in `haystack`, searching from character `from`.
fn find_chars(haystack: &str, needle: &str, from: usize) -> Option<usize> {
    let start = haystack
        .char_indices()
        .nth(from)
        .map(|(byte, _)| byte)
        .unwrap_or(haystack.len());
    let byte = haystack[start..].find(needle)? + start;
    Some(haystack[..byte].chars().count())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(content: &str) -> SceneDocument {
        SceneDocument {
            content: content.to_string(),
            metadata: SceneMetadata {
                episode: 3,
                title: "第3集".to_string(),
                scene_number: "二".to_string(),
                location: "翊坤宫".to_string(),
                characters: "华妃, 颂芝".to_string(),
                scene_index: 1,
                source: "episode_03.json".to_string(),
            },
        }
    }

    #[test]
    fn test_config_validation() {
        assert!(ChunkingConfig::new(300, 50, vec![]).is_ok());
        assert!(matches!(
            ChunkingConfig::new(50, 50, vec![]),
            Err(ScriptRagError::Config(_))
        ));
        assert!(ChunkingConfig::new(0, 0, vec![]).is_err());
        assert_eq!(ChunkingConfig::default().chunk_size, 300);
    }

    #[test]
    fn test_split_documents_start_index_and_ids() {
        let config = ChunkingConfig::new(10, 3, vec!["\n".to_string(), String::new()]).unwrap();
        let splitter = RecursiveCharacterSplitter::new(config);

        let chunks = splitter.split_documents(&[document("甲：一二三\n乙：四五六七\n丙：八九")]);

        let contents: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(contents, vec!["甲：一二三", "乙：四五六七", "丙：八九"]);

        let starts: Vec<usize> = chunks.iter().map(|c| c.metadata.start_index).collect();
        assert_eq!(starts, vec![0, 6, 13]);

        assert_eq!(chunks[0].id, "ep03-s1-c0");
        assert_eq!(chunks[2].id, "ep03-s1-c2");
        assert_eq!(chunks[1].metadata.scene.location, "翊坤宫");
        assert_eq!(chunks[1].metadata.scene.characters, "华妃, 颂芝");
    }

    #[test]
    fn test_overlapping_start_index() {
        let config = ChunkingConfig::new(6, 2, vec![String::new()]).unwrap();
        let splitter = RecursiveCharacterSplitter::new(config);

        let chunks = splitter.split_documents(&[document("一二三四五六七八九十")]);

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].content, "五六七八九十");
        assert_eq!(chunks[1].metadata.start_index, 4);
    }

    #[test]
    fn test_chunk_metadata_is_flat_in_json() {
        let chunk = SceneChunk {
            id: "ep03-s1-c0".to_string(),
            content: "华妃：放肆".to_string(),
            metadata: ChunkMetadata {
                scene: document("").metadata,
                start_index: 0,
            },
        };

        let value = serde_json::to_value(&chunk).unwrap();
        assert_eq!(value["metadata"]["episode"], 3);
        assert_eq!(value["metadata"]["title"], "第3集");
        assert_eq!(value["metadata"]["start_index"], 0);
    }

    #[test]
    fn test_empty_content_yields_no_chunks() {
        let splitter = RecursiveCharacterSplitter::new(ChunkingConfig::default());
        assert!(splitter.split_documents(&[document("")]).is_empty());
    }

    #[test]
    fn test_find_chars() {
        assert_eq!(find_chars("甲乙丙甲乙", "甲", 1), Some(3));
        assert_eq!(find_chars("甲乙丙", "丁", 0), None);
        assert_eq!(find_chars("甲乙丙", "丙", 10), None);
    }
}
