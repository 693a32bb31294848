//! Test doubles for the generator, clipboard and clock seams.

use crate::clipboard::{Clipboard, Clock};
use crate::client::Generator;
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::cell::Cell;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Generator returning a scripted outcome and recording every prompt.
#[derive(Debug, Clone)]
pub(crate) struct FakeGenerator {
    response: Result<String>,
    calls: Arc<AtomicUsize>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl FakeGenerator {
    pub(crate) fn replying(text: &str) -> Self {
        Self::with_response(Ok(text.to_string()))
    }

    pub(crate) fn failing(error: Error) -> Self {
        Self::with_response(Err(error))
    }

    fn with_response(response: Result<String>) -> Self {
        Self {
            response,
            calls: Arc::new(AtomicUsize::new(0)),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Generator for FakeGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.response.clone()
    }
}

/// Generator whose call never completes.
#[derive(Debug, Default)]
pub(crate) struct PendingGenerator;

#[async_trait]
impl Generator for PendingGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        futures::future::pending::<()>().await;
        Ok(String::new())
    }
}

/// Records the last written text.
#[derive(Debug, Default)]
pub(crate) struct MemoryClipboard {
    pub(crate) written: Option<String>,
    pub(crate) writes: usize,
    pub(crate) should_fail: bool,
}

impl Clipboard for MemoryClipboard {
    fn write_text(&mut self, text: &str) -> Result<()> {
        if self.should_fail {
            return Err(Error::clipboard("clipboard unavailable"));
        }
        self.written = Some(text.to_string());
        self.writes += 1;
        Ok(())
    }
}

/// Clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub(crate) struct ManualClock {
    start: Instant,
    offset: Rc<Cell<Duration>>,
}

impl ManualClock {
    pub(crate) fn new() -> Self {
        Self {
            start: Instant::now(),
            offset: Rc::new(Cell::new(Duration::ZERO)),
        }
    }

    pub(crate) fn advance(&self, by: Duration) {
        self.offset.set(self.offset.get() + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.start + self.offset.get()
    }
}
