//! Chunk command implementation.

use crate::chunking::{load_scene_documents, ChunkingConfig, RecursiveCharacterSplitter, TextSplitter};
use crate::cli::Output;
use crate::config::Settings;
use anyhow::Result;
use std::io::{BufWriter, Write};

/// Run the chunk command.
pub fn run_chunk(
    input: Option<String>,
    output: Option<String>,
    chunk_size: Option<usize>,
    chunk_overlap: Option<usize>,
    settings: &Settings,
) -> Result<()> {
    let input_dir = match input {
        Some(dir) => Settings::expand_path(&dir),
        None => settings.output_dir(),
    };

    let mut chunking = settings.chunking.clone();
    if let Some(size) = chunk_size {
        chunking.chunk_size = size;
    }
    if let Some(overlap) = chunk_overlap {
        chunking.chunk_overlap = overlap;
    }
    let config = ChunkingConfig::from_settings(&chunking)?;

    let documents = load_scene_documents(&input_dir)?;
    if documents.is_empty() {
        Output::warning(&format!("No scenes found in {}", input_dir.display()));
        return Ok(());
    }

    let splitter = RecursiveCharacterSplitter::new(config);
    let chunks = splitter.split_documents(&documents);

    let writer: Box<dyn Write> = match &output {
        Some(path) => Box::new(std::fs::File::create(Settings::expand_path(path))?),
        None => Box::new(std::io::stdout().lock()),
    };
    let mut writer = BufWriter::new(writer);

    for chunk in &chunks {
        serde_json::to_writer(&mut writer, chunk)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;

    Output::success(&format!(
        "Split {} scenes into {} chunks",
        documents.len(),
        chunks.len()
    ));
    if let Some(path) = output {
        Output::kv("Output", &path);
    }

    Ok(())
}
