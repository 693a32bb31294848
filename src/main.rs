use anyhow::Context;
use clap::Parser;
use llm_docgen::{
    ArboardClipboard, Config, GeminiClient, OutputFormat, Phase, Pipeline, Session, SystemClock,
    TokenizerKind, UploadedFile, Writer,
};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    name = "llm-docgen",
    version,
    author,
    about = "Generate project documentation from source files with Gemini",
    long_about = "Generate project documentation from source files with Gemini.\n\n\
    The selected files are sent to the model in one prompt together with optional \
    guidance. The reply is written as Markdown and/or a standalone HTML page.\n\n\
    The API key is read from the API_KEY environment variable (see --api-key-env).\n\n\
    USAGE EXAMPLES:\n  \
      # Document two files into ./out\n  \
      llm-docgen src/main.rs src/lib.rs\n\n  \
      # Add guidance and print the Markdown instead of writing files\n  \
      llm-docgen src/*.rs -g \"Focus on the public API\" --print\n\n  \
      # Inspect the prompt without calling the API\n  \
      llm-docgen src/*.rs --dry-run"
)]
struct Cli {
    /// Files to document, in prompt order
    #[arg(value_name = "FILES")]
    files: Vec<PathBuf>,

    /// Extra guidance for the model
    #[arg(short, long, value_name = "TEXT", conflicts_with = "guidance_file")]
    guidance: Option<String>,

    /// Read guidance from a file
    #[arg(long, value_name = "FILE")]
    guidance_file: Option<PathBuf>,

    /// Drop selected files with this identity (see --list)
    #[arg(long, value_name = "ID")]
    remove: Vec<String>,

    /// List the selected files with their identities and exit
    #[arg(long)]
    list: bool,

    /// Model identifier
    #[arg(short, long)]
    model: Option<String>,

    /// Base URL of the Generative Language API
    #[arg(long, value_name = "URL")]
    endpoint: Option<String>,

    /// Environment variable holding the API key
    #[arg(long, value_name = "VAR")]
    api_key_env: Option<String>,

    /// Output directory
    #[arg(short, long, default_value = "out", value_name = "PATH")]
    out: PathBuf,

    /// Output file name without extension
    #[arg(long, default_value = "documentation")]
    name: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "both")]
    format: CliFormat,

    /// Print the result to stdout instead of writing files
    #[arg(long, value_enum, num_args = 0..=1, require_equals = true, default_missing_value = "markdown")]
    print: Option<CliPrint>,

    /// Copy the generated Markdown to the clipboard
    #[arg(long)]
    copy: bool,

    /// Print the assembled prompt without calling the API
    #[arg(long)]
    dry_run: bool,

    /// Fail if the prompt exceeds this many bytes
    #[arg(long, value_name = "BYTES")]
    max_prompt_bytes: Option<usize>,

    /// Request timeout in seconds (none by default)
    #[arg(long, value_name = "SECS")]
    timeout_secs: Option<u64>,

    /// Tokenizer used for the prompt estimate
    #[arg(long, value_enum, default_value = "simple")]
    tokenizer: CliTokenizer,

    /// Path to custom Tera prompt template
    ///
    /// The template receives `files` (each with `name` and `content`),
    /// `guidance` and `file_count`.
    #[arg(long, value_name = "FILE")]
    template: Option<PathBuf>,

    /// Overwrite existing output without keeping a backup
    #[arg(long)]
    no_backup: bool,

    /// Verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliFormat {
    Markdown,
    Html,
    Both,
}

impl From<CliFormat> for OutputFormat {
    fn from(f: CliFormat) -> Self {
        match f {
            CliFormat::Markdown => Self::Markdown,
            CliFormat::Html => Self::Html,
            CliFormat::Both => Self::Both,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum CliPrint {
    /// Raw Markdown
    Markdown,
    /// Rendered HTML fragment
    Html,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliTokenizer {
    Simple,
    Enhanced,
}

impl From<CliTokenizer> for TokenizerKind {
    fn from(t: CliTokenizer) -> Self {
        match t {
            CliTokenizer::Simple => Self::Simple,
            CliTokenizer::Enhanced => Self::Enhanced,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_tracing(cli.verbose);

    let config = build_config(&cli).context("Failed to build configuration")?;

    let files = cli
        .files
        .iter()
        .map(UploadedFile::from_path)
        .collect::<Result<Vec<_>, _>>()
        .context("Failed to select files")?;

    let guidance = match cli.guidance_file {
        Some(ref path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read guidance from {}", path.display()))?,
        None => cli.guidance.clone().unwrap_or_default(),
    };

    let client = GeminiClient::new(&config).context("Failed to create API client")?;
    let pipeline = Pipeline::new(&config, client).context("Failed to create pipeline")?;

    let mut session = Session::new(pipeline, ArboardClipboard::new(), SystemClock)
        .with_copy_confirmation(config.copy_confirmation);
    session.add_files(files);
    for id in &cli.remove {
        if session.remove_file(id) == 0 {
            warn!("No selected file has id {}", id);
        }
    }
    session.set_guidance(guidance);

    if cli.list {
        for file in session.files() {
            println!("{}\t{}", file.id(), file.path().display());
        }
        return Ok(());
    }

    if config.dry_run {
        return dry_run(&session).await;
    }

    let phase = session.submit().await.context("Submission rejected")?;
    let doc = match phase {
        Phase::Succeeded(doc) => doc.clone(),
        Phase::Failed(err) => {
            return Err(anyhow::Error::new(err.clone()).context("Documentation generation failed"))
        }
        other => anyhow::bail!("Submission ended in unexpected state: {other:?}"),
    };

    match cli.print {
        Some(CliPrint::Markdown) => println!("{}", doc.markdown()),
        Some(CliPrint::Html) => println!("{}", doc.html()),
        None => {
            let stats = session.last_stats().cloned().unwrap_or_default();
            let written = Writer::new(&config)
                .context("Failed to create writer")?
                .write(&doc, &stats)
                .context("Failed to write documentation")?;

            for path in &written {
                info!("Wrote {}", path.display());
            }
            stats.print_summary();
        }
    }

    if cli.copy {
        if session.copy_result().context("Failed to copy to clipboard")? {
            info!("Copied Markdown to clipboard");
        } else {
            warn!("Nothing to copy: the model returned no text");
        }
    }

    Ok(())
}

fn build_config(cli: &Cli) -> llm_docgen::Result<Config> {
    let mut builder = Config::builder()
        .output_dir(&cli.out)
        .output_name(&cli.name)
        .format(cli.format.into())
        .tokenizer(cli.tokenizer.into())
        .backup_existing(!cli.no_backup)
        .dry_run(cli.dry_run);

    if let Some(ref model) = cli.model {
        builder = builder.model(model);
    }

    if let Some(ref endpoint) = cli.endpoint {
        builder = builder.endpoint(endpoint);
    }

    if let Some(ref var) = cli.api_key_env {
        builder = builder.api_key_var(var);
    }

    if let Some(bytes) = cli.max_prompt_bytes {
        builder = builder.max_prompt_bytes(bytes);
    }

    if let Some(secs) = cli.timeout_secs {
        builder = builder.request_timeout(Duration::from_secs(secs));
    }

    if let Some(ref template_path) = cli.template {
        builder = builder.template_path(template_path);
    }

    builder.build()
}

async fn dry_run(session: &Session<GeminiClient, ArboardClipboard, SystemClock>) -> anyhow::Result<()> {
    warn!("Dry run mode enabled - the API will not be called");

    let assembled = session
        .pipeline()
        .assemble(session.files(), Some(session.guidance()))
        .await
        .context("Failed to assemble prompt")?;

    println!("{}", assembled.prompt);
    info!(
        "Prompt: {} file(s), {} bytes, ~{} tokens",
        assembled.stats.file_count, assembled.stats.prompt_bytes, assembled.stats.estimated_tokens
    );

    Ok(())
}

fn setup_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => EnvFilter::new("llm_docgen=info"),
        1 => EnvFilter::new("llm_docgen=debug"),
        _ => EnvFilter::new("llm_docgen=trace"),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}
