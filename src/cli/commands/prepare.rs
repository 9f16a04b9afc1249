//! Prepare command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::pipeline::{FileOutcome, Pipeline};
use anyhow::Result;

/// Run the prepare command.
pub async fn run_prepare(
    input: Option<String>,
    output: Option<String>,
    jobs: Option<usize>,
    settings: Settings,
) -> Result<()> {
    let mut pipeline = Pipeline::new(&settings);
    if let Some(dir) = input {
        pipeline = pipeline.with_input_dir(Settings::expand_path(&dir));
    }
    if let Some(dir) = output {
        pipeline = pipeline.with_output_dir(Settings::expand_path(&dir));
    }
    if let Some(jobs) = jobs {
        pipeline = pipeline.with_max_concurrent(jobs);
    }

    let files = match pipeline.discover() {
        Ok(files) => files,
        Err(e) => {
            Output::error(&format!("Cannot list scripts: {}", e));
            return Err(e.into());
        }
    };

    if files.is_empty() {
        Output::warning(&format!(
            "No script files found in {}",
            pipeline.input_dir().display()
        ));
        return Ok(());
    }

    Output::info(&format!(
        "Processing {} scripts from {}",
        files.len(),
        pipeline.input_dir().display()
    ));

    let pb = Output::progress_bar(files.len() as u64, "Parsing...");
    let report = pipeline.run_with_progress(|_| pb.inc(1)).await?;
    pb.finish_and_clear();

    for outcome in &report.outcomes {
        let source = outcome
            .source()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        match outcome {
            FileOutcome::Written {
                episode_number,
                scenes,
                output,
                ..
            } => {
                let output = output
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                Output::episode_written(&source, &output, *episode_number, *scenes);
            }
            FileOutcome::Skipped { reason, .. } => {
                Output::file_problem(&source, &format!("skipped: {}", reason), false);
            }
            FileOutcome::Failed { error, .. } => {
                Output::file_problem(&source, &format!("failed: {}", error), true);
            }
        }
    }

    for (output, sources) in report.collisions() {
        Output::warning(&format!(
            "{} scripts map to {}; the last one written wins",
            sources.len(),
            output.display()
        ));
    }

    Output::header("Summary");
    Output::kv("Written", &report.written().to_string());
    Output::kv("Skipped", &report.skipped().to_string());
    Output::kv("Failed", &report.failed().to_string());
    Output::kv("Output", &pipeline.output_dir().display().to_string());

    Ok(())
}
