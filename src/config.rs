use crate::error::{Error, Result};
use crate::token::TokenizerKind;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

const DEFAULT_MODEL: &str = "gemini-2.5-pro";
const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_API_KEY_VAR: &str = "API_KEY";
const DEFAULT_OUTPUT_NAME: &str = "documentation";
pub(crate) const DEFAULT_COPY_CONFIRMATION: Duration = Duration::from_secs(2);

/// Output format for generated documentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Raw Markdown as returned by the model
    Markdown,
    /// Standalone HTML page with the rendered document
    Html,
    /// Both Markdown and HTML files
    Both,
}

impl OutputFormat {
    /// Returns true if this format writes a Markdown file.
    #[must_use]
    pub const fn writes_markdown(self) -> bool {
        matches!(self, Self::Markdown | Self::Both)
    }

    /// Returns true if this format writes an HTML page.
    #[must_use]
    pub const fn writes_html(self) -> bool {
        matches!(self, Self::Html | Self::Both)
    }
}

/// Configuration for the llm-docgen pipeline.
///
/// Use [`Config::builder()`] to construct a new configuration.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct Config {
    /// Model identifier sent to the generation endpoint
    pub model: String,

    /// Base URL of the Generative Language API, checked by [`Config::validate`]
    pub endpoint: String,

    /// Environment variable holding the API credential
    pub api_key_var: String,

    /// Per-request timeout; `None` waits for the remote to answer
    pub request_timeout: Option<Duration>,

    /// Reject prompts larger than this many bytes; `None` forwards anything
    pub max_prompt_bytes: Option<usize>,

    /// Tokenizer used to estimate prompt size
    pub tokenizer: TokenizerKind,

    /// Path to an external prompt template file
    pub template_path: Option<PathBuf>,

    /// Output directory for generated documents
    pub output_dir: PathBuf,

    /// Base file name (without extension) of generated documents
    pub output_name: String,

    /// Output format
    pub format: OutputFormat,

    /// Create backups of existing files
    pub backup_existing: bool,

    /// Dry run mode (no network call, no file writes)
    pub dry_run: bool,

    /// How long the "copied" confirmation stays visible
    pub copy_confirmation: Duration,
}

impl Config {
    /// Creates a new configuration builder.
    ///
    /// # Examples
    ///
    /// ```
    /// use llm_docgen::Config;
    ///
    /// let config = Config::builder()
    ///     .model("gemini-2.5-flash")
    ///     .build()
    ///     .expect("valid configuration");
    /// assert_eq!(config.model, "gemini-2.5-flash");
    /// ```
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Model or credential variable name is empty
    /// - Endpoint is not a valid http(s) URL
    /// - Output name is empty or contains path separators
    /// - Limits are zero
    /// - The external template is missing or invalid
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(Error::config("model must not be empty"));
        }

        let endpoint = Url::parse(&self.endpoint)
            .map_err(|e| Error::config(format!("Invalid endpoint '{}': {e}", self.endpoint)))?;

        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(Error::config(format!(
                "endpoint must use http or https: {}",
                self.endpoint
            )));
        }

        if self.api_key_var.trim().is_empty() {
            return Err(Error::config("api_key_var must not be empty"));
        }

        if self.output_name.trim().is_empty() {
            return Err(Error::config("output_name must not be empty"));
        }

        if self.output_name.contains(['/', '\\']) {
            return Err(Error::config(format!(
                "output_name must be a bare file name: {}",
                self.output_name
            )));
        }

        if self.max_prompt_bytes == Some(0) {
            return Err(Error::config("max_prompt_bytes must be greater than 0"));
        }

        if self.request_timeout == Some(Duration::ZERO) {
            return Err(Error::config("request_timeout must be greater than 0"));
        }

        if self.copy_confirmation.is_zero() {
            return Err(Error::config("copy_confirmation must be greater than 0"));
        }

        if let Some(ref template_path) = self.template_path {
            crate::template_validator::TemplateValidator::validate_template(template_path)?;
        }

        Ok(())
    }

    /// Returns the full `generateContent` URL for the configured model.
    #[must_use]
    pub fn generate_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.endpoint.trim_end_matches('/'),
            self.model
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key_var: DEFAULT_API_KEY_VAR.to_string(),
            request_timeout: None,
            max_prompt_bytes: None,
            tokenizer: TokenizerKind::Simple,
            template_path: None,
            output_dir: PathBuf::from("out"),
            output_name: DEFAULT_OUTPUT_NAME.to_string(),
            format: OutputFormat::Both,
            backup_existing: true,
            dry_run: false,
            copy_confirmation: DEFAULT_COPY_CONFIRMATION,
        }
    }
}

/// Builder for creating a [`Config`].
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    model: Option<String>,
    endpoint: Option<String>,
    api_key_var: Option<String>,
    request_timeout: Option<Duration>,
    max_prompt_bytes: Option<usize>,
    tokenizer: Option<TokenizerKind>,
    template_path: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    output_name: Option<String>,
    format: Option<OutputFormat>,
    backup_existing: Option<bool>,
    dry_run: bool,
    copy_confirmation: Option<Duration>,
}

impl ConfigBuilder {
    /// Sets the model identifier.
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets the API base URL (useful for proxies and tests).
    #[must_use]
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Sets the environment variable the credential is read from.
    #[must_use]
    pub fn api_key_var(mut self, var: impl Into<String>) -> Self {
        self.api_key_var = Some(var.into());
        self
    }

    /// Sets a per-request timeout.
    #[must_use]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Sets the maximum prompt size in bytes.
    #[must_use]
    pub fn max_prompt_bytes(mut self, bytes: usize) -> Self {
        self.max_prompt_bytes = Some(bytes);
        self
    }

    /// Sets the tokenizer implementation.
    #[must_use]
    pub fn tokenizer(mut self, kind: TokenizerKind) -> Self {
        self.tokenizer = Some(kind);
        self
    }

    /// Sets the path to an external prompt template file.
    ///
    /// When provided, this template replaces the built-in documentation
    /// prompt. The template file must exist and contain valid Tera syntax.
    #[must_use]
    pub fn template_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.template_path = Some(path.into());
        self
    }

    /// Sets the output directory for generated files.
    #[must_use]
    pub fn output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(path.into());
        self
    }

    /// Sets the base name of generated files.
    #[must_use]
    pub fn output_name(mut self, name: impl Into<String>) -> Self {
        self.output_name = Some(name.into());
        self
    }

    /// Sets the output format.
    #[must_use]
    pub fn format(mut self, format: OutputFormat) -> Self {
        self.format = Some(format);
        self
    }

    /// Enables or disables backup creation.
    #[must_use]
    pub fn backup_existing(mut self, enabled: bool) -> Self {
        self.backup_existing = Some(enabled);
        self
    }

    /// Enables dry run mode (no network call, no file writes).
    #[must_use]
    pub fn dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    /// Sets how long the copy confirmation stays visible.
    #[must_use]
    pub fn copy_confirmation(mut self, duration: Duration) -> Self {
        self.copy_confirmation = Some(duration);
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails.
    pub fn build(self) -> Result<Config> {
        let config = Config {
            model: self.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            endpoint: self
                .endpoint
                .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            api_key_var: self
                .api_key_var
                .unwrap_or_else(|| DEFAULT_API_KEY_VAR.to_string()),
            request_timeout: self.request_timeout,
            max_prompt_bytes: self.max_prompt_bytes,
            tokenizer: self.tokenizer.unwrap_or(TokenizerKind::Simple),
            template_path: self.template_path,
            output_dir: self.output_dir.unwrap_or_else(|| PathBuf::from("out")),
            output_name: self
                .output_name
                .unwrap_or_else(|| DEFAULT_OUTPUT_NAME.to_string()),
            format: self.format.unwrap_or(OutputFormat::Both),
            backup_existing: self.backup_existing.unwrap_or(true),
            dry_run: self.dry_run,
            copy_confirmation: self.copy_confirmation.unwrap_or(DEFAULT_COPY_CONFIRMATION),
        };

        config.validate()?;
        Ok(config)
    }
}
