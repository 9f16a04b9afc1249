//! Batch driver for script preparation.
//!
//! Reads every script file in the input directory, turns each into an
//! [`EpisodeDocument`] and writes it to `episode_NN.json` in the output
//! directory. Files are independent, so they are processed concurrently;
//! a failure in one file never stops the batch.

use crate::config::Settings;
use crate::error::{Result, ScriptRagError};
use crate::script::{EpisodeDocument, ScriptProcessor};
use futures::stream::{self, StreamExt};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;
use tracing::{debug, info, instrument, warn};

/// What happened to one input file.
#[derive(Debug)]
pub enum FileOutcome {
    /// The episode document was written.
    Written {
        source: PathBuf,
        episode_number: u32,
        scenes: usize,
        output: PathBuf,
    },
    /// The file was not processed (no episode marker in its name).
    Skipped { source: PathBuf, reason: String },
    /// Reading, parsing or writing failed.
    Failed {
        source: PathBuf,
        error: ScriptRagError,
    },
}

impl FileOutcome {
    /// The input file this outcome is about.
    pub fn source(&self) -> &Path {
        match self {
            FileOutcome::Written { source, .. }
            | FileOutcome::Skipped { source, .. }
            | FileOutcome::Failed { source, .. } => source,
        }
    }

    pub fn is_written(&self) -> bool {
        matches!(self, FileOutcome::Written { .. })
    }
}

/// Outcomes of one batch, ordered by input file path.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<FileOutcome>,
}

impl BatchReport {
    pub fn written(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_written()).count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, FileOutcome::Skipped { .. }))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, FileOutcome::Failed { .. }))
            .count()
    }

    /// Output files written by more than one input file.
    pub fn collisions(&self) -> Vec<(PathBuf, Vec<PathBuf>)> {
        let mut by_output: BTreeMap<&Path, Vec<PathBuf>> = BTreeMap::new();
        for outcome in &self.outcomes {
            if let FileOutcome::Written { source, output, .. } = outcome {
                by_output
                    .entry(output.as_path())
                    .or_default()
                    .push(source.clone());
            }
        }

        by_output
            .into_iter()
            .filter(|(_, sources)| sources.len() > 1)
            .map(|(output, sources)| (output.to_path_buf(), sources))
            .collect()
    }
}

/// Processes a directory of scripts into episode documents.
pub struct Pipeline {
    processor: Arc<ScriptProcessor>,
    input_dir: PathBuf,
    output_dir: PathBuf,
    file_extension: String,
    max_concurrent: usize,
}

impl Pipeline {
    /// Create a pipeline from settings.
    pub fn new(settings: &Settings) -> Self {
        Self {
            processor: Arc::new(ScriptProcessor::new()),
            input_dir: settings.input_dir(),
            output_dir: settings.output_dir(),
            file_extension: settings.pipeline.file_extension.clone(),
            max_concurrent: settings.pipeline.max_concurrent.max(1),
        }
    }

    /// Override the input directory.
    pub fn with_input_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.input_dir = dir.into();
        self
    }

    /// Override the output directory.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Set the number of files processed at once.
    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    pub fn input_dir(&self) -> &Path {
        &self.input_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// List script files in the input directory, sorted by path.
    pub fn discover(&self) -> Result<Vec<PathBuf>> {
        if !self.input_dir.is_dir() {
            return Err(ScriptRagError::InvalidInput(format!(
                "Input directory not found: {}",
                self.input_dir.display()
            )));
        }

        let mut files = Vec::new();
        for entry in std::fs::read_dir(&self.input_dir)? {
            let path = entry?.path();
            if path.is_file() && self.is_script_file(&path) {
                files.push(path);
            }
        }
        files.sort();

        Ok(files)
    }

    fn is_script_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case(&self.file_extension))
            .unwrap_or(false)
    }

    /// Process every script file.
    pub async fn run(&self) -> Result<BatchReport> {
        self.run_with_progress(|_| {}).await
    }

    /// Process every script file, calling `on_outcome` as each one finishes.
    ///
    /// Only a failure to list the input directory is returned as an error;
    /// per-file problems are recorded in the report.
    #[instrument(skip(self, on_outcome), fields(input = %self.input_dir.display()))]
    pub async fn run_with_progress<F>(&self, mut on_outcome: F) -> Result<BatchReport>
    where
        F: FnMut(&FileOutcome),
    {
        let files = self.discover()?;
        info!(
            "Processing {} script files with up to {} workers",
            files.len(),
            self.max_concurrent
        );

        let mut stream = stream::iter(files)
            .map(|path| {
                let processor = self.processor.clone();
                let output_dir = self.output_dir.clone();
                async move {
                    let source = path.clone();
                    tokio::task::spawn_blocking(move || {
                        process_file(&processor, &path, &output_dir)
                    })
                    .await
                    .unwrap_or_else(|e| FileOutcome::Failed {
                        source,
                        error: ScriptRagError::InvalidInput(format!("worker task failed: {}", e)),
                    })
                }
            })
            .buffer_unordered(self.max_concurrent);

        let mut outcomes = Vec::new();
        while let Some(outcome) = stream.next().await {
            on_outcome(&outcome);
            outcomes.push(outcome);
        }

        outcomes.sort_by(|a, b| a.source().cmp(b.source()));
        let report = BatchReport { outcomes };

        for (output, sources) in report.collisions() {
            warn!(
                "{} input files resolve to {}; only one survives: {:?}",
                sources.len(),
                output.display(),
                sources
            );
        }

        info!(
            "Batch complete: {} written, {} skipped, {} failed",
            report.written(),
            report.skipped(),
            report.failed()
        );

        Ok(report)
    }

    /// Process a single file synchronously.
    pub fn process_file(&self, path: &Path) -> FileOutcome {
        process_file(&self.processor, path, &self.output_dir)
    }
}

fn process_file(processor: &ScriptProcessor, path: &Path, output_dir: &Path) -> FileOutcome {
    let source = path.to_path_buf();
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) => {
            warn!("Failed to read {}: {}", path.display(), e);
            return FileOutcome::Failed {
                source,
                error: e.into(),
            };
        }
    };

    let document = match processor.process(&file_name, &raw) {
        Ok(document) => document,
        Err(ScriptRagError::UnresolvableEpisode(name)) => {
            warn!("Cannot resolve episode number from file name: {}", name);
            return FileOutcome::Skipped {
                source,
                reason: format!("no episode marker in '{}'", name),
            };
        }
        Err(e) => {
            warn!("Failed to process {}: {}", path.display(), e);
            return FileOutcome::Failed { source, error: e };
        }
    };

    match write_episode(&document, output_dir) {
        Ok(output) => {
            info!(
                "Processed {} -> {} ({} scenes)",
                file_name,
                output.display(),
                document.scenes.len()
            );
            FileOutcome::Written {
                source,
                episode_number: document.episode_number,
                scenes: document.scenes.len(),
                output,
            }
        }
        Err(e) => {
            warn!("Failed to write episode {}: {}", document.episode_number, e);
            FileOutcome::Failed { source, error: e }
        }
    }
}

/// Write an episode document into `dir`, replacing any previous file.
///
/// The JSON goes to a temporary file in the same directory first and is
/// renamed into place.
pub fn write_episode(document: &EpisodeDocument, dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;

    let json = document.to_json()?;
    let target = dir.join(document.file_name());

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(json.as_bytes())?;
    tmp.flush()?;
    tmp.persist(&target)?;

    debug!("Wrote {} bytes to {}", json.len(), target.display());
    Ok(target)
}
