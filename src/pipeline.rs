use crate::{
    client::Generator,
    config::Config,
    error::{Error, Result},
    file::{read_sources, UploadedFile},
    prompt::PromptBuilder,
    token::TokenizerKind,
};
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

/// Share of the prompt budget above which a warning is logged.
const BUDGET_WARN_RATIO: f64 = 0.9;

/// Statistics collected during pipeline execution.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineStats {
    /// Number of files read
    pub file_count: usize,

    /// Total bytes of file text
    pub source_bytes: usize,

    /// Size of the assembled prompt in bytes
    pub prompt_bytes: usize,

    /// Estimated prompt tokens
    pub estimated_tokens: usize,

    /// Size of the generated Markdown in bytes
    pub output_bytes: usize,

    /// Time spent reading files
    pub read_duration: Duration,

    /// Time spent assembling the prompt
    pub assemble_duration: Duration,

    /// Time spent waiting on the model
    pub generate_duration: Duration,
}

impl PipelineStats {
    /// Total time across all stages.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.read_duration + self.assemble_duration + self.generate_duration
    }

    /// Prints a human-readable summary to stdout.
    pub fn print_summary(&self) {
        println!("\n╔═══════════════════════════════════════════════════════╗");
        println!("║            Documentation Run Summary                  ║");
        println!("╠═══════════════════════════════════════════════════════╣");
        println!(
            "║ Files Read:           {:>8}                        ║",
            self.file_count
        );
        println!(
            "║ Source Size:          {:>8} bytes                  ║",
            self.source_bytes
        );
        println!(
            "║ Prompt Size:          {:>8} bytes                  ║",
            self.prompt_bytes
        );
        println!(
            "║ Estimated Tokens:     {:>8}                        ║",
            self.estimated_tokens
        );
        println!(
            "║ Output Size:          {:>8} bytes                  ║",
            self.output_bytes
        );
        println!("║                                                       ║");
        println!("║ Timing Breakdown:                                     ║");
        println!(
            "║   - Reading:          {:>8.2}s                     ║",
            self.read_duration.as_secs_f64()
        );
        println!(
            "║   - Assembling:       {:>8.2}s                     ║",
            self.assemble_duration.as_secs_f64()
        );
        println!(
            "║   - Generating:       {:>8.2}s                     ║",
            self.generate_duration.as_secs_f64()
        );
        println!(
            "║   - Total:            {:>8.2}s                     ║",
            self.duration().as_secs_f64()
        );
        println!("╚═══════════════════════════════════════════════════════╝\n");
    }
}

/// An assembled prompt, ready to send.
#[derive(Debug, Clone)]
pub struct Assembled {
    /// Full prompt text
    pub prompt: String,

    /// Statistics for the read and assemble stages
    pub stats: PipelineStats,
}

/// Generated documentation.
#[derive(Debug, Clone)]
pub struct Generation {
    /// Model output, verbatim
    pub markdown: String,

    /// Statistics for all stages
    pub stats: PipelineStats,
}

/// Read → assemble → generate.
#[derive(Debug)]
pub struct Pipeline<G> {
    generator: G,
    prompts: PromptBuilder,
    max_prompt_bytes: Option<usize>,
    tokenizer: TokenizerKind,
}

impl<G: Generator> Pipeline<G> {
    /// Creates a new pipeline with the given configuration and generator.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration validation fails
    /// - The prompt template cannot be loaded
    pub fn new(config: &Config, generator: G) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            generator,
            prompts: PromptBuilder::from_config(config)?,
            max_prompt_bytes: config.max_prompt_bytes,
            tokenizer: config.tokenizer,
        })
    }

    /// The generator used for stage 3.
    pub const fn generator(&self) -> &G {
        &self.generator
    }

    /// Runs the read and assemble stages only.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoFiles`] for an empty selection, [`Error::FileRead`]
    /// if any file fails to decode, and [`Error::PromptTooLarge`] if the
    /// prompt exceeds the configured budget.
    #[instrument(skip_all, fields(files = files.len()))]
    pub async fn assemble(
        &self,
        files: &[UploadedFile],
        guidance: Option<&str>,
    ) -> Result<Assembled> {
        if files.is_empty() {
            return Err(Error::NoFiles);
        }

        info!("Stage 1/3: Reading {} file(s)...", files.len());
        let read_start = Instant::now();
        let sources = read_sources(files).await?;
        let read_duration = read_start.elapsed();

        let source_bytes: usize = sources.iter().map(|s| s.size_bytes()).sum();
        info!(
            "✓ Read {} bytes in {:.2}s",
            source_bytes,
            read_duration.as_secs_f64()
        );

        info!("Stage 2/3: Assembling prompt...");
        let assemble_start = Instant::now();
        let prompt = self.prompts.build(&sources, guidance)?;
        self.check_budget(prompt.len())?;
        let estimated_tokens = self.tokenizer.estimate(&prompt);
        let assemble_duration = assemble_start.elapsed();

        info!(
            "✓ Prompt is {} bytes (~{} tokens)",
            prompt.len(),
            estimated_tokens
        );

        let stats = PipelineStats {
            file_count: sources.len(),
            source_bytes,
            prompt_bytes: prompt.len(),
            estimated_tokens,
            read_duration,
            assemble_duration,
            ..PipelineStats::default()
        };

        Ok(Assembled { prompt, stats })
    }

    /// Runs stage 3 on an assembled prompt.
    ///
    /// # Errors
    ///
    /// Propagates the generator's error unchanged.
    pub async fn generate(&self, assembled: Assembled) -> Result<Generation> {
        let Assembled { prompt, mut stats } = assembled;

        info!("Stage 3/3: Generating documentation...");
        let generate_start = Instant::now();
        let markdown = self.generator.generate(&prompt).await?;
        stats.generate_duration = generate_start.elapsed();
        stats.output_bytes = markdown.len();

        info!(
            "✓ Received {} bytes in {:.2}s",
            markdown.len(),
            stats.generate_duration.as_secs_f64()
        );

        Ok(Generation { markdown, stats })
    }

    /// Executes the complete pipeline.
    ///
    /// # Process
    ///
    /// 1. **Read**: Decodes every file as text, concurrently
    /// 2. **Assemble**: Builds the prompt and checks its size
    /// 3. **Generate**: Sends the prompt to the model
    ///
    /// # Errors
    ///
    /// Returns the first error from any stage. No stage runs after a failure.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use llm_docgen::{Config, FileCollector, GeminiClient, Pipeline, UploadedFile};
    ///
    /// # async fn demo() -> anyhow::Result<()> {
    /// let config = Config::default();
    /// let pipeline = Pipeline::new(&config, GeminiClient::new(&config)?)?;
    ///
    /// let mut files = FileCollector::new();
    /// files.add_files([UploadedFile::from_path("src/main.rs")?]);
    ///
    /// let generation = pipeline.run(files.files(), Some("Keep it short")).await?;
    /// println!("{}", generation.markdown);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn run(&self, files: &[UploadedFile], guidance: Option<&str>) -> Result<Generation> {
        let assembled = self.assemble(files, guidance).await?;
        let generation = self.generate(assembled).await?;

        info!(
            "✓ Pipeline completed successfully in {:.2}s",
            generation.stats.duration().as_secs_f64()
        );

        Ok(generation)
    }

    fn check_budget(&self, size: usize) -> Result<()> {
        let Some(limit) = self.max_prompt_bytes else {
            return Ok(());
        };

        if size > limit {
            return Err(Error::PromptTooLarge { size, limit });
        }

        #[allow(clippy::cast_precision_loss)]
        let ratio = size as f64 / limit as f64;
        if ratio > BUDGET_WARN_RATIO {
            warn!(
                "Prompt uses {:.0}% of the {} byte budget",
                ratio * 100.0,
                limit
            );
        } else {
            debug!("Prompt within budget: {} / {} bytes", size, limit);
        }

        Ok(())
    }
}
