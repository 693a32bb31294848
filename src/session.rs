//! Interactive session state: file list, guidance, and the outcome of the
//! last submission.
//!
//! ```text
//!          submit (files > 0)            read ok
//!   Idle ─────────────────────▶ Reading ─────────▶ Generating
//!    ▲                            │                   │    │
//!    │                            │ read error        │ ok │ error
//!    │                            ▼                   ▼    ▼
//!    └──── resubmit ──── Failed(Error) ◀──────── Succeeded(doc)
//! ```
//!
//! `Succeeded` and `Failed` are resting states; submitting from either one
//! starts over. Submitting with no files leaves the phase where it is and
//! only sets the validation message. The file list and guidance are only
//! changed by their own operations, never by a submission.

use crate::{
    client::Generator,
    clipboard::{Clipboard, Clock},
    collector::FileCollector,
    config::DEFAULT_COPY_CONFIRMATION,
    error::{Error, Result},
    file::UploadedFile,
    markdown::RenderedDocument,
    pipeline::{Pipeline, PipelineStats},
};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Where the session is in its submission cycle.
#[derive(Debug, Clone, Default)]
pub enum Phase {
    /// Nothing submitted yet
    #[default]
    Idle,
    /// Decoding selected files
    Reading,
    /// Waiting on the model
    Generating,
    /// Documentation is available
    Succeeded(RenderedDocument),
    /// The last submission failed
    Failed(Error),
}

impl Phase {
    /// True while a submission is in flight.
    #[must_use]
    pub const fn is_busy(&self) -> bool {
        matches!(self, Self::Reading | Self::Generating)
    }

    /// The rendered result, if the last submission succeeded.
    #[must_use]
    pub const fn document(&self) -> Option<&RenderedDocument> {
        match self {
            Self::Succeeded(doc) => Some(doc),
            _ => None,
        }
    }

    /// The error, if the last submission failed.
    #[must_use]
    pub const fn error(&self) -> Option<&Error> {
        match self {
            Self::Failed(err) => Some(err),
            _ => None,
        }
    }
}

/// Event-driven controller tying the collector, pipeline and clipboard together.
#[derive(Debug)]
pub struct Session<G, C, K> {
    pipeline: Pipeline<G>,
    collector: FileCollector,
    guidance: String,
    phase: Phase,
    validation: Option<Error>,
    last_stats: Option<PipelineStats>,
    clipboard: C,
    clock: K,
    copied_at: Option<Instant>,
    copy_confirmation: Duration,
}

impl<G: Generator, C: Clipboard, K: Clock> Session<G, C, K> {
    /// Creates an idle session with no files and empty guidance.
    pub fn new(pipeline: Pipeline<G>, clipboard: C, clock: K) -> Self {
        Self {
            pipeline,
            collector: FileCollector::new(),
            guidance: String::new(),
            phase: Phase::Idle,
            validation: None,
            last_stats: None,
            clipboard,
            clock,
            copied_at: None,
            copy_confirmation: DEFAULT_COPY_CONFIRMATION,
        }
    }

    /// Sets how long [`Session::is_copied`] stays true after a copy.
    #[must_use]
    pub fn with_copy_confirmation(mut self, duration: Duration) -> Self {
        self.copy_confirmation = duration;
        self
    }

    /// Appends files to the selection.
    pub fn add_files(&mut self, files: impl IntoIterator<Item = UploadedFile>) {
        self.collector.add_files(files);
    }

    /// Removes every selected file with the given identity.
    pub fn remove_file(&mut self, id: &str) -> usize {
        self.collector.remove_file(id)
    }

    /// Selected files in insertion order.
    #[must_use]
    pub fn files(&self) -> &[UploadedFile] {
        self.collector.files()
    }

    /// Replaces the guidance text.
    pub fn set_guidance(&mut self, guidance: impl Into<String>) {
        self.guidance = guidance.into();
    }

    /// Current guidance text, as entered.
    #[must_use]
    pub fn guidance(&self) -> &str {
        &self.guidance
    }

    /// The pipeline submissions run through.
    #[must_use]
    pub const fn pipeline(&self) -> &Pipeline<G> {
        &self.pipeline
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> &Phase {
        &self.phase
    }

    /// Message from the last rejected submission, until one is accepted.
    #[must_use]
    pub const fn validation_error(&self) -> Option<&Error> {
        self.validation.as_ref()
    }

    /// Statistics of the last successful submission.
    #[must_use]
    pub const fn last_stats(&self) -> Option<&PipelineStats> {
        self.last_stats.as_ref()
    }

    /// True while a submission is in flight.
    #[must_use]
    pub const fn is_busy(&self) -> bool {
        self.phase.is_busy()
    }

    /// True when a submission would start a generation.
    #[must_use]
    pub fn can_submit(&self) -> bool {
        !self.is_busy() && !self.collector.is_empty()
    }

    /// Submits the current selection and guidance.
    ///
    /// With no files selected nothing is read or sent, and the phase, the
    /// prior result and the copy confirmation are kept; only
    /// [`Session::validation_error`] is set. Otherwise the prior outcome is
    /// cleared and the pipeline runs; the phase ends in `Succeeded` or
    /// `Failed`.
    ///
    /// A dropped submission future leaves the session busy.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Busy`] if a submission is already in flight and
    /// [`Error::NoFiles`] if nothing is selected. All other failures are
    /// recorded in the phase, not returned.
    pub async fn submit(&mut self) -> Result<&Phase> {
        if self.is_busy() {
            return Err(Error::Busy);
        }

        if self.collector.is_empty() {
            debug!("Submission rejected: no files selected");
            self.validation = Some(Error::NoFiles);
            return Err(Error::NoFiles);
        }

        self.validation = None;
        self.copied_at = None;
        self.last_stats = None;
        self.phase = Phase::Reading;
        let guidance = Some(self.guidance.as_str());

        let outcome = match self.pipeline.assemble(self.collector.files(), guidance).await {
            Ok(assembled) => {
                self.phase = Phase::Generating;
                self.pipeline.generate(assembled).await
            }
            Err(err) => Err(err),
        };

        self.phase = match outcome {
            Ok(generation) => {
                info!("Documentation generated ({} bytes)", generation.markdown.len());
                self.last_stats = Some(generation.stats);
                Phase::Succeeded(RenderedDocument::new(generation.markdown))
            }
            Err(err) => {
                info!("Submission failed: {}", err);
                Phase::Failed(err)
            }
        };

        Ok(&self.phase)
    }

    /// Copies the generated Markdown to the clipboard.
    ///
    /// Returns `false` without touching the clipboard unless the last
    /// submission succeeded with non-empty text.
    ///
    /// # Errors
    ///
    /// Returns an error if the clipboard write fails.
    pub fn copy_result(&mut self) -> Result<bool> {
        let Some(doc) = self.phase.document() else {
            return Ok(false);
        };

        if doc.markdown().is_empty() {
            return Ok(false);
        }

        self.clipboard.write_text(doc.markdown())?;
        self.copied_at = Some(self.clock.now());
        debug!("Copied {} bytes to clipboard", doc.markdown().len());
        Ok(true)
    }

    /// True for the confirmation window after a successful copy.
    #[must_use]
    pub fn is_copied(&self) -> bool {
        self.copied_at.is_some_and(|at| {
            self.clock.now().saturating_duration_since(at) < self.copy_confirmation
        })
    }
}
