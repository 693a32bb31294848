use crate::{
    config::Config,
    error::{Error, Result},
    file::SourceFile,
};
use serde::Serialize;
use std::fs;
use tera::{Context, Tera};

const BUILTIN_TEMPLATE: &str = "documentation";
const CUSTOM_TEMPLATE: &str = "custom";

#[derive(Serialize)]
struct PromptContext<'a> {
    files: &'a [SourceFile],
    guidance: Option<&'a str>,
    file_count: usize,
}

/// Assembles the documentation prompt from file texts and optional guidance.
///
/// The output depends only on the inputs: the same files, names, order and
/// guidance always produce byte-identical prompts.
#[derive(Debug)]
pub struct PromptBuilder {
    tera: Tera,
    template_name: &'static str,
}

impl PromptBuilder {
    /// Creates a builder with the built-in documentation template.
    ///
    /// # Errors
    ///
    /// Returns an error if the built-in template fails to compile.
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_template(
            BUILTIN_TEMPLATE,
            include_str!("../templates/documentation.tera"),
        )
        .map_err(|e| Error::template(BUILTIN_TEMPLATE, e))?;

        Ok(Self {
            tera,
            template_name: BUILTIN_TEMPLATE,
        })
    }

    /// Creates a builder honoring `config.template_path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the external template cannot be read or compiled.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut builder = Self::new()?;

        if let Some(ref path) = config.template_path {
            let source = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
            builder
                .tera
                .add_raw_template(CUSTOM_TEMPLATE, &source)
                .map_err(|e| Error::template(path.display().to_string(), e))?;
            builder.template_name = CUSTOM_TEMPLATE;
        }

        Ok(builder)
    }

    /// Builds the composite prompt.
    ///
    /// File blocks appear in the order given. Guidance is inserted as given;
    /// guidance that is blank is omitted together with its instruction line.
    ///
    /// # Errors
    ///
    /// Returns an error if template rendering fails.
    pub fn build(&self, files: &[SourceFile], guidance: Option<&str>) -> Result<String> {
        let guidance = guidance.filter(|g| !g.trim().is_empty());

        let context = PromptContext {
            files,
            guidance,
            file_count: files.len(),
        };

        let tera_context = Context::from_serialize(&context)
            .map_err(|e| Error::template(self.template_name, e))?;

        self.tera
            .render(self.template_name, &tera_context)
            .map_err(|e| Error::template(self.template_name, e))
    }
}

/// Builds a prompt with the built-in template.
///
/// # Errors
///
/// Returns an error if template rendering fails.
pub fn build_prompt(files: &[SourceFile], guidance: Option<&str>) -> Result<String> {
    PromptBuilder::new()?.build(files, guidance)
}
