//! Local dump sender
//!
//! Performs no network I/O. When tracing is enabled each event is written to
//! the diagnostic stream; otherwise sending is a no-op.

use std::io::{self, Write};

use super::MessageSender;
use crate::error::Result;
use crate::event::{LogEvent, format_trace_time};
use crate::session::Session;
use crate::trace::Tracer;

pub struct DumpSender<W: Write = io::Stderr> {
    session: Session<()>,
    tracer: Tracer<W>,
}

impl DumpSender<io::Stderr> {
    pub fn new() -> Self {
        Self::with_writer(io::stderr())
    }
}

impl Default for DumpSender<io::Stderr> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> DumpSender<W> {
    /// Create a dump sender that traces to `out`
    pub fn with_writer(out: W) -> Self {
        Self {
            session: Session::new(),
            tracer: Tracer::new(out),
        }
    }
}

impl<W: Write> MessageSender for DumpSender<W> {
    fn name(&self) -> &'static str {
        "senddump"
    }

    fn open_svc(&mut self) -> Result<()> {
        self.session.open(())?;
        log::debug!("senddump session opened");
        Ok(())
    }

    fn close_svc(&mut self) -> Result<()> {
        self.session.close()?;
        log::debug!("senddump session closed");
        Ok(())
    }

    fn send_message(&mut self, event: &LogEvent) -> Result<()> {
        self.session.handle_mut()?;

        // The time is shown in its fixed form, so keep it out of the dump
        let time = format_trace_time(event.content.time.as_ref());
        let mut shown = event.clone();
        shown.content.time = None;

        self.tracer
            .pretty(&format!("TRACE_SENDER time = {} logEvent =", time), &shown)
    }

    fn set_trace(&mut self, enabled: bool) {
        self.tracer.set_enabled(enabled);
    }

    fn is_tracing(&self) -> bool {
        self.tracer.is_enabled()
    }
}
