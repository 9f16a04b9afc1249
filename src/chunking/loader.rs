//! Loading persisted episode documents as scene documents.

use super::{SceneDocument, SceneMetadata};
use crate::error::{Result, ScriptRagError};
use crate::script::EpisodeDocument;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Turn each scene of an episode into a [`SceneDocument`].
pub fn scene_documents(episode: &EpisodeDocument, source: &str) -> Vec<SceneDocument> {
    episode
        .scenes
        .iter()
        .enumerate()
        .map(|(scene_index, scene)| SceneDocument {
            content: scene.content_text(),
            metadata: SceneMetadata {
                episode: episode.episode_number,
                title: episode.episode_title.clone(),
                scene_number: scene.scene_number.clone(),
                location: scene.location.clone(),
                characters: scene.characters.join(", "),
                scene_index,
                source: source.to_string(),
            },
        })
        .collect()
}

/// Load every `*.json` episode file in `dir`, in file name order.
///
/// Files that cannot be read or do not hold a valid episode document are
/// logged and skipped.
pub fn load_scene_documents(dir: &Path) -> Result<Vec<SceneDocument>> {
    if !dir.is_dir() {
        return Err(ScriptRagError::InvalidInput(format!(
            "Processed directory not found: {}",
            dir.display()
        )));
    }

    let mut files: Vec<PathBuf> = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        if path.is_file() && is_json {
            files.push(path);
        }
    }
    files.sort();

    let mut documents = Vec::new();
    for path in files {
        match load_episode(&path) {
            Ok(episode) => {
                let source = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let scenes = scene_documents(&episode, &source);
                debug!("Loaded {} scenes from {}", scenes.len(), source);
                documents.extend(scenes);
            }
            Err(e) => {
                warn!("Skipping {}: {}", path.display(), e);
            }
        }
    }

    Ok(documents)
}

fn load_episode(path: &Path) -> Result<EpisodeDocument> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}
