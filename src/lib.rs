//! scriptrag - script parsing and chunking for drama Q&A
//!
//! Turns loosely formatted TV drama scripts into scene-level records that a
//! retrieval-augmented question answering system can index and cite.
//!
//! # Overview
//!
//! The pipeline:
//! - Normalizes raw script text (blank lines, horizontal whitespace)
//! - Resolves the episode number from the file name (`第3集`, `第十一集`)
//! - Segments the transcript into scenes on `第N幕` headers
//! - Parses each scene into location, speakers and reconstructed lines
//! - Persists one JSON document per episode
//! - Splits scene content into overlapping chunks with citation metadata
//!
//! # Architecture
//!
//! - `config` - Configuration management
//! - `script` - Episode identification, normalization, segmentation and scene parsing
//! - `pipeline` - Batch driver over an input directory
//! - `chunking` - Loading persisted episodes and splitting scenes into chunks
//! - `index` - Interfaces to the embedding, vector store and retrieval collaborators
//!
//! # Example
//!
//! ```rust,no_run
//! use scriptrag::config::Settings;
//! use scriptrag::pipeline::Pipeline;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let pipeline = Pipeline::new(&settings);
//!
//!     let report = pipeline.run().await?;
//!     println!("Wrote {} episodes", report.written());
//!
//!     Ok(())
//! }
//! ```

pub mod chunking;
pub mod cli;
pub mod config;
pub mod error;
pub mod index;
pub mod pipeline;
pub mod script;

pub use error::{Result, ScriptRagError};
