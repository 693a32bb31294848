//! # llm-docgen
//!
//! Generates project documentation from source files with a Gemini model.
//!
//! ## Features
//!
//! - Ordered file selection with removal by identity
//! - Concurrent text decoding with binary and encoding checks
//! - Deterministic prompt assembly through Tera templates
//! - Single-shot `generateContent` calls over HTTPS
//! - Markdown → HTML rendering for headings, bold, lists and code blocks
//! - Atomic file output with automatic backups
//!
//! ## Quick Start
//!
//! ```no_run
//! use llm_docgen::{Config, OutputFormat};
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let config = Config::builder()
//!     .output_dir("./docs")
//!     .format(OutputFormat::Html)
//!     .build()?;
//!
//! let generation = llm_docgen::run(&config, &["src/main.rs"], Some("Keep it short")).await?;
//! println!("{}", generation.markdown);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! The library follows a pipeline architecture:
//! 1. **Collector**: Holds the selected files in order
//! 2. **Reader**: Decodes every file as UTF-8 text
//! 3. **Prompt**: Renders the documentation prompt
//! 4. **Client**: Sends the prompt to the model
//! 5. **Markdown**: Renders the reply for display
//!
//! [`Session`] drives the same stages for interactive front ends.

#![warn(
    missing_docs,
    rust_2018_idioms,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery
)]
#![allow(clippy::module_name_repetitions)]

mod client;
mod clipboard;
mod collector;
mod config;
mod error;
mod file;
mod markdown;
mod pipeline;
mod prompt;
mod session;
mod template_validator;
mod token;
mod writer;

#[cfg(test)]
mod testing;

pub use client::{CredentialSource, GeminiClient, Generator};
pub use clipboard::{ArboardClipboard, Clipboard, Clock, SystemClock};
pub use collector::FileCollector;
pub use config::{Config, ConfigBuilder, OutputFormat};
pub use error::{Error, ErrorKind, Result};
pub use file::{read_sources, SourceFile, UploadedFile};
pub use markdown::{render, Block, Document, Inline, RenderedDocument};
pub use pipeline::{Assembled, Generation, Pipeline, PipelineStats};
pub use prompt::{build_prompt, PromptBuilder};
pub use session::{Phase, Session};
pub use token::TokenizerKind;
pub use writer::Writer;

/// Generates documentation for the files at `paths` in one call.
///
/// This is the main entry point for the library. The credential is read
/// from the environment variable named by `config.api_key_var`.
///
/// # Errors
///
/// Returns an error if:
/// - Configuration is invalid
/// - `paths` is empty, or a path is missing or not a regular file
/// - A file cannot be decoded as text
/// - The credential is missing or the remote call fails
pub async fn run<P: AsRef<std::path::Path>>(
    config: &Config,
    paths: &[P],
    guidance: Option<&str>,
) -> Result<Generation> {
    let mut collector = FileCollector::new();
    for path in paths {
        collector.add_files([UploadedFile::from_path(path)?]);
    }

    Pipeline::new(config, GeminiClient::new(config)?)?
        .run(collector.files(), guidance)
        .await
}
