//! Fault isolation for render sections.
//!
//! Each section of the status line renders through its own [`Boundary`].
//! A panic inside a section is caught, reported to the [`FaultSink`], and
//! replaced by [`FALLBACK`]; the other sections render normally.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

/// Text shown in place of a failed section.
pub const FALLBACK: &str = "unavailable";

/// Where caught faults are reported.
pub trait FaultSink: Send + Sync {
    fn report(&self, section: &str, message: &str);
}

/// Reports faults through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl FaultSink for TracingSink {
    fn report(&self, section: &str, message: &str) {
        tracing::error!(section, message, "section render failed");
    }
}

pub struct Boundary {
    section: &'static str,
    sink: Arc<dyn FaultSink>,
}

impl Boundary {
    pub fn new(section: &'static str, sink: Arc<dyn FaultSink>) -> Self {
        Self { section, sink }
    }

    /// Run `render`, substituting [`FALLBACK`] if it panics.
    pub fn render<F>(&self, render: F) -> String
    where
        F: FnOnce() -> String,
    {
        match catch_unwind(AssertUnwindSafe(render)) {
            Ok(text) => text,
            Err(payload) => {
                self.sink.report(self.section, &panic_message(payload.as_ref()));
                FALLBACK.to_string()
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
