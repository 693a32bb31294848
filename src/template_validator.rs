use crate::error::{Error, Result};
use std::fs;
use std::path::Path;
use tera::Tera;

/// Maximum template file size (1MB)
const MAX_TEMPLATE_SIZE: u64 = 1024 * 1024;

/// Variables a prompt template must reference to be useful.
const REQUIRED_VARIABLES: &[&str] = &["files"];

/// Variables a prompt template may reference.
const OPTIONAL_VARIABLES: &[&str] = &["guidance", "file_count"];

/// Validates external prompt templates before they are used.
pub(crate) struct TemplateValidator;

impl TemplateValidator {
    /// Validates an external template file.
    ///
    /// Performs the following checks:
    /// 1. File exists and is a regular file
    /// 2. File size is within limits
    /// 3. Template is not blank
    /// 4. Template syntax is valid (can be compiled by Tera)
    /// 5. Template references the file list
    ///
    /// # Errors
    ///
    /// Returns an error describing the first failed check.
    pub(crate) fn validate_template(path: &Path) -> Result<()> {
        let metadata = fs::metadata(path).map_err(|e| Error::io(path, e))?;
        let display = path.to_string_lossy().to_string();

        if !metadata.is_file() {
            return Err(Error::template_validation(display, "Path is not a file"));
        }

        if metadata.len() > MAX_TEMPLATE_SIZE {
            return Err(Error::template_validation(
                display,
                format!(
                    "Template file too large: {} bytes (max: {} bytes)",
                    metadata.len(),
                    MAX_TEMPLATE_SIZE
                ),
            ));
        }

        let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;

        if content.trim().is_empty() {
            return Err(Error::template_validation(display, "Template file is empty"));
        }

        let mut scratch = Tera::default();
        scratch
            .add_raw_template("validation", &content)
            .map_err(|e| {
                Error::template_validation(display.clone(), format!("Template syntax error: {e}"))
            })?;

        Self::check_required_variables(&content, &display)?;
        Self::check_optional_variables(&content);

        Ok(())
    }

    /// Heuristic search for `{{ var`, `{{var` and `in var` occurrences.
    fn references(content: &str, var: &str) -> bool {
        [
            format!("{{{{ {var}"),
            format!("{{{{{var}"),
            format!("in {var}"),
        ]
        .iter()
        .any(|pattern| content.contains(pattern.as_str()))
    }

    fn check_required_variables(content: &str, display: &str) -> Result<()> {
        let missing: Vec<&str> = REQUIRED_VARIABLES
            .iter()
            .filter(|var| !Self::references(content, var))
            .copied()
            .collect();

        if !missing.is_empty() {
            return Err(Error::template_validation(
                display,
                format!(
                    "Template may be missing required variables: {}. \
                    Prompt templates should iterate over `files` (each with `name` and `content`).",
                    missing.join(", ")
                ),
            ));
        }

        Ok(())
    }

    fn check_optional_variables(content: &str) {
        for var in OPTIONAL_VARIABLES {
            if !Self::references(content, var) && !content.contains(&format!("if {var}")) {
                tracing::debug!("Template does not use optional variable: {}", var);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;

    #[test]
    fn test_validate_valid_template() {
        let temp = assert_fs::TempDir::new().unwrap();
        let template_file = temp.child("prompt.tera");
        template_file
            .write_str(
                "{% if guidance %}{{ guidance }}{% endif %}\n\
                {% for file in files %}{{ file.name }}{% endfor %}",
            )
            .unwrap();

        assert!(TemplateValidator::validate_template(template_file.path()).is_ok());
    }

    #[test]
    fn test_validate_nonexistent_file() {
        let result = TemplateValidator::validate_template(Path::new("/nonexistent/template.tera"));
        assert!(result.unwrap_err().is_io());
    }

    #[test]
    fn test_validate_directory() {
        let temp = assert_fs::TempDir::new().unwrap();
        let result = TemplateValidator::validate_template(temp.path());
        assert!(result.unwrap_err().to_string().contains("not a file"));
    }

    #[test]
    fn test_validate_empty_template() {
        let temp = assert_fs::TempDir::new().unwrap();
        let template_file = temp.child("empty.tera");
        template_file.write_str("   \n  \n  ").unwrap();

        let result = TemplateValidator::validate_template(template_file.path());
        assert!(result.unwrap_err().to_string().contains("empty"));
    }

    #[test]
    fn test_validate_syntax_error() {
        let temp = assert_fs::TempDir::new().unwrap();
        let template_file = temp.child("invalid.tera");
        template_file
            .write_str("{% for file in files %}\nUnclosed loop")
            .unwrap();

        let result = TemplateValidator::validate_template(template_file.path());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Template syntax error"));
    }

    #[test]
    fn test_validate_missing_files_variable() {
        let temp = assert_fs::TempDir::new().unwrap();
        let template_file = temp.child("incomplete.tera");
        template_file.write_str("Summarize: {{ guidance }}").unwrap();

        let result = TemplateValidator::validate_template(template_file.path());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("missing required variables"));
    }

    #[test]
    fn test_validate_file_too_large() {
        let temp = assert_fs::TempDir::new().unwrap();
        let template_file = temp.child("large.tera");
        template_file
            .write_str(&"x".repeat((MAX_TEMPLATE_SIZE + 1) as usize))
            .unwrap();

        let result = TemplateValidator::validate_template(template_file.path());
        assert!(result.unwrap_err().to_string().contains("too large"));
    }
}
