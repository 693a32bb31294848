//! Basic example of using llm-docgen as a library
//!
//! Documents this crate's own entry points. Requires `API_KEY` in the environment.

use llm_docgen::{Config, OutputFormat, RenderedDocument, Writer};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let config = Config::builder()
        .output_dir("./output")
        .format(OutputFormat::Both)
        .build()?;

    let generation = llm_docgen::run(
        &config,
        &["src/lib.rs", "src/main.rs"],
        Some("Aim the usage section at library users"),
    )
    .await?;

    generation.stats.print_summary();

    let doc = RenderedDocument::new(generation.markdown);
    let written = Writer::new(&config)?.write(&doc, &generation.stats)?;

    for path in written {
        println!("✓ Output written to: {}", path.display());
    }

    Ok(())
}
