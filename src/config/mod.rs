//! Configuration module for scriptrag.
//!
//! Handles loading and saving application settings.

mod settings;

pub use settings::{ChunkingSettings, GeneralSettings, PipelineSettings, Settings};
