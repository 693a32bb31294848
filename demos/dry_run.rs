//! Dry run example
//!
//! Selects files, removes one again, and prints the prompt that would be
//! sent. No API key is needed.

use llm_docgen::{Config, FileCollector, GeminiClient, Pipeline, TokenizerKind, UploadedFile};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let config = Config::builder()
        .tokenizer(TokenizerKind::Enhanced)
        .build()?;

    let mut collector = FileCollector::new();
    collector.add_files([
        UploadedFile::from_path("src/lib.rs")?,
        UploadedFile::from_path("src/config.rs")?,
        UploadedFile::from_path("Cargo.toml")?,
    ]);

    let manifest_id = collector.files()[2].id().to_string();
    collector.remove_file(&manifest_id);

    let pipeline = Pipeline::new(&config, GeminiClient::new(&config)?)?;
    let assembled = pipeline.assemble(collector.files(), Some("Be concise")).await?;

    println!("{}", assembled.prompt);
    println!();
    println!(
        "✓ {} files, {} bytes, ~{} tokens",
        assembled.stats.file_count, assembled.stats.prompt_bytes, assembled.stats.estimated_tokens
    );

    Ok(())
}
