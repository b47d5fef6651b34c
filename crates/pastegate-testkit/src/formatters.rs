//! Formatter doubles.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use pastegate_render::{escape_html, Formatter, Language};

/// Escapes like the plain-text formatter and counts invocations.
///
/// Can be switched into a failing mode, and can be slowed down to widen race
/// windows in concurrency tests.
#[derive(Debug, Default)]
pub struct CountingFormatter {
    calls: AtomicUsize,
    failing: AtomicBool,
    delay: Option<Duration>,
}

impl CountingFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep for `delay` inside every call.
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    /// Number of `format` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Make subsequent calls fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl Formatter for CountingFormatter {
    async fn format(&self, body: &str, language: &Language) -> anyhow::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            anyhow::bail!("formatter failure injected for {}", language.id);
        }
        Ok(format!(
            "<pre data-lang=\"{}\">{}</pre>",
            language.id,
            escape_html(body)
        ))
    }
}

/// Always fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingFormatter;

#[async_trait]
impl Formatter for FailingFormatter {
    async fn format(&self, _body: &str, _language: &Language) -> anyhow::Result<String> {
        Err(anyhow::anyhow!("formatter unavailable"))
    }
}
