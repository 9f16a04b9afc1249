//! CLI command implementations.

mod chunk;
mod config;
mod parse;
mod prepare;

pub use chunk::run_chunk;
pub use config::run_config;
pub use parse::run_parse;
pub use prepare::run_prepare;
