//! Parse command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::script::ScriptProcessor;
use anyhow::Result;

/// Run the parse command.
pub fn run_parse(file: &str, episode: Option<u32>, _settings: &Settings) -> Result<()> {
    let path = Settings::expand_path(file);
    let raw = std::fs::read_to_string(&path)?;
    let processor = ScriptProcessor::new();

    let document = match episode {
        Some(n) => processor.assemble(&processor.normalize(&raw), n)?,
        None => {
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            match processor.process(&file_name, &raw) {
                Ok(document) => document,
                Err(e) => {
                    Output::error(&format!("{}", e));
                    Output::info("Pass --episode N to set the episode number explicitly.");
                    return Err(e.into());
                }
            }
        }
    };

    println!("{}", document.to_json()?);
    Output::success(&format!(
        "{}: {} scenes",
        document.episode_title,
        document.scenes.len()
    ));

    Ok(())
}
