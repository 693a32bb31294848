use crate::{
    config::{Config, OutputFormat},
    error::{Error, Result},
    markdown::RenderedDocument,
    pipeline::PipelineStats,
};
use serde::Serialize;
use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
    time::SystemTime,
};
use tera::{Context, Tera};
use tracing::{debug, info};

/// Registered with an `.html` suffix so Tera autoescapes everything but the body.
const PAGE_TEMPLATE: &str = "page.html";

#[derive(Serialize)]
struct PageContext<'a> {
    title: &'a str,
    body: &'a str,
    model: &'a str,
    generated_at: String,
    file_count: usize,
}

/// Writes generated documentation to the output directory with atomic operations.
#[derive(Debug)]
pub struct Writer {
    output_dir: PathBuf,
    output_name: String,
    format: OutputFormat,
    backup_existing: bool,
    model: String,
    tera: Tera,
}

impl Writer {
    /// Creates a new writer from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the page template fails to compile.
    pub fn new(config: &Config) -> Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_template(PAGE_TEMPLATE, include_str!("../templates/page.html.tera"))
            .map_err(|e| Error::template(PAGE_TEMPLATE, e))?;

        Ok(Self {
            output_dir: config.output_dir.clone(),
            output_name: config.output_name.clone(),
            format: config.format,
            backup_existing: config.backup_existing,
            model: config.model.clone(),
            tera,
        })
    }

    /// Writes the document in every configured format and returns the paths written.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Output directory cannot be created
    /// - Page rendering fails
    /// - File write operations fail
    pub fn write(&self, doc: &RenderedDocument, stats: &PipelineStats) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(&self.output_dir).map_err(|e| Error::io(&self.output_dir, e))?;

        let mut written = Vec::new();

        if self.format.writes_markdown() {
            written.push(self.write_output("md", doc.markdown())?);
        }

        if self.format.writes_html() {
            let page = self.render_page(doc, stats)?;
            written.push(self.write_output("html", &page)?);
        }

        info!(
            "Wrote {} file(s) to {}",
            written.len(),
            self.output_dir.display()
        );
        Ok(written)
    }

    fn write_output(&self, ext: &str, content: &str) -> Result<PathBuf> {
        let path = self.output_path(ext);
        self.write_file_atomic(&path, content)?;
        debug!("Wrote {} bytes to {}", content.len(), path.display());
        Ok(path)
    }

    /// Renders the standalone HTML page around the document fragment.
    ///
    /// # Errors
    ///
    /// Returns an error if template rendering fails.
    pub fn render_page(&self, doc: &RenderedDocument, stats: &PipelineStats) -> Result<String> {
        let title = document_title(doc.markdown()).unwrap_or(&self.output_name);

        let context = PageContext {
            title,
            body: doc.html(),
            model: &self.model,
            generated_at: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            file_count: stats.file_count,
        };

        let tera_context =
            Context::from_serialize(&context).map_err(|e| Error::template(PAGE_TEMPLATE, e))?;

        self.tera
            .render(PAGE_TEMPLATE, &tera_context)
            .map_err(|e| Error::template(PAGE_TEMPLATE, e))
    }

    fn output_path(&self, ext: &str) -> PathBuf {
        self.output_dir.join(format!("{}.{ext}", self.output_name))
    }

    /// Writes a file atomically with optional backup.
    ///
    /// # Process
    ///
    /// 1. Creates backup if file exists and backup is enabled
    /// 2. Writes content to a sibling `.tmp` file and syncs it
    /// 3. Renames the temporary file over the target path
    fn write_file_atomic(&self, path: &Path, content: &str) -> Result<()> {
        if path.exists() && self.backup_existing {
            backup_file(path)?;
        }

        let mut temp_name = path.as_os_str().to_os_string();
        temp_name.push(".tmp");
        let temp_path = PathBuf::from(temp_name);

        let mut temp_file = fs::File::create(&temp_path).map_err(|e| Error::io(&temp_path, e))?;
        temp_file
            .write_all(content.as_bytes())
            .map_err(|e| Error::io(&temp_path, e))?;
        temp_file.sync_all().map_err(|e| Error::io(&temp_path, e))?;
        drop(temp_file);

        fs::rename(&temp_path, path).map_err(|e| Error::io(path, e))
    }
}

/// Copies an existing file to `<name>.backup.<nanos>` next to it.
fn backup_file(path: &Path) -> Result<PathBuf> {
    let timestamp = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)?
        .as_nanos();

    let filename = path
        .file_name()
        .ok_or_else(|| Error::config("Invalid file path"))?
        .to_string_lossy();

    let backup_path = path.with_file_name(format!("{filename}.backup.{timestamp}"));

    fs::copy(path, &backup_path).map_err(|e| Error::io(&backup_path, e))?;

    debug!("Created backup: {}", backup_path.display());
    Ok(backup_path)
}

/// Text of the first `# ` heading, with bold markers dropped.
fn document_title(markdown: &str) -> Option<&str> {
    markdown
        .lines()
        .find_map(|line| line.strip_prefix("# "))
        .map(|title| title.trim().trim_start_matches("**").trim_end_matches("**"))
        .filter(|title| !title.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;
    use predicates::prelude::*;

    fn writer(output_dir: &Path, format: OutputFormat, backup: bool) -> Writer {
        let config = Config::builder()
            .output_dir(output_dir)
            .output_name("docs")
            .format(format)
            .backup_existing(backup)
            .model("gemini-test")
            .build()
            .unwrap();
        Writer::new(&config).unwrap()
    }

    fn stats() -> PipelineStats {
        PipelineStats {
            file_count: 3,
            ..PipelineStats::default()
        }
    }

    fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<_> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_writes_markdown_only() {
        let temp = assert_fs::TempDir::new().unwrap();
        let out = temp.child("out");
        let doc = RenderedDocument::new("# Project\nHello");

        let written = writer(out.path(), OutputFormat::Markdown, true)
            .write(&doc, &stats())
            .unwrap();

        assert_eq!(written, vec![out.path().join("docs.md")]);
        out.child("docs.md").assert("# Project\nHello");
        assert_eq!(entries(out.path()), ["docs.md"]);
    }

    #[test]
    fn test_writes_both_formats() {
        let temp = assert_fs::TempDir::new().unwrap();
        let doc = RenderedDocument::new("# Project\n* **fast**");

        let written = writer(temp.path(), OutputFormat::Both, true)
            .write(&doc, &stats())
            .unwrap();

        assert_eq!(written.len(), 2);
        temp.child("docs.md").assert("# Project\n* **fast**");
        temp.child("docs.html").assert(
            predicate::str::contains("<h1>Project</h1><ul><li><strong>fast</strong></li></ul>")
                .and(predicate::str::contains("<title>Project</title>"))
                .and(predicate::str::contains("gemini-test"))
                .and(predicate::str::contains("3 file(s)")),
        );
    }

    #[test]
    fn test_writes_html_only() {
        let temp = assert_fs::TempDir::new().unwrap();
        let out = temp.child("out");
        let doc = RenderedDocument::new("# Project\nHello");

        let written = writer(out.path(), OutputFormat::Html, true)
            .write(&doc, &stats())
            .unwrap();

        assert_eq!(written, vec![out.path().join("docs.html")]);
        assert_eq!(entries(out.path()), ["docs.html"]);
        out.child("docs.html")
            .assert(predicate::str::contains("<h1>Project</h1><br />Hello"));
    }

    #[test]
    fn test_page_title_is_escaped() {
        let temp = assert_fs::TempDir::new().unwrap();
        let doc = RenderedDocument::new("# <Widget> & co");

        let page = writer(temp.path(), OutputFormat::Html, true)
            .render_page(&doc, &stats())
            .unwrap();

        assert!(page.contains("<title>&lt;Widget&gt; &amp; co</title>"));
        assert!(page.contains("<h1>&lt;Widget&gt; & co</h1>"));
    }

    #[test]
    fn test_page_title_falls_back_to_output_name() {
        let temp = assert_fs::TempDir::new().unwrap();
        let doc = RenderedDocument::new("No heading here");

        let page = writer(temp.path(), OutputFormat::Html, true)
            .render_page(&doc, &stats())
            .unwrap();

        assert!(page.contains("<title>docs</title>"));
    }

    #[test]
    fn test_creates_backup() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("docs.md").write_str("old content").unwrap();

        writer(temp.path(), OutputFormat::Markdown, true)
            .write(&RenderedDocument::new("new content"), &stats())
            .unwrap();

        temp.child("docs.md").assert("new content");
        let names = entries(temp.path());
        assert_eq!(names.len(), 2);
        assert!(names.iter().any(|name| name.starts_with("docs.md.backup.")));
    }

    #[test]
    fn test_no_backup_when_disabled() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("docs.md").write_str("old content").unwrap();

        writer(temp.path(), OutputFormat::Markdown, false)
            .write(&RenderedDocument::new("new content"), &stats())
            .unwrap();

        assert_eq!(entries(temp.path()), ["docs.md"]);
    }

    #[test]
    fn test_document_title() {
        assert_eq!(document_title("intro\n# **Name**\n# Other"), Some("Name"));
        assert_eq!(document_title("## Sub only"), None);
        assert_eq!(document_title("#   "), None);
    }
}
