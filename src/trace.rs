//! Diagnostic dump of outgoing messages
//!
//! Trace output only goes to the diagnostic writer (stderr unless a test
//! swaps it out) and never changes what is sent. Labels are written plain;
//! the writer is often redirected to a file.

use std::fmt::Debug;
use std::io::{self, Write};

use crate::error::Result;

#[derive(Debug)]
pub struct Tracer<W: Write = io::Stderr> {
    enabled: bool,
    out: W,
}

impl<W: Write> Tracer<W> {
    pub fn new(out: W) -> Self {
        Self { enabled: false, out }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Write `label` followed by the pretty-printed value as one record
    pub fn pretty(&mut self, label: &str, value: &impl Debug) -> Result<()> {
        if self.enabled {
            writeln!(self.out, "{} {:#?}", label, value)?;
            self.out.flush()?;
        }
        Ok(())
    }

    pub fn line(&mut self, label: &str, text: &str) -> Result<()> {
        if self.enabled {
            writeln!(self.out, "{} {}", label, text)?;
            self.out.flush()?;
        }
        Ok(())
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_writes_nothing() {
        let mut tracer = Tracer::new(Vec::new());
        tracer.pretty("TRACE", &vec![1, 2]).unwrap();
        tracer.line("TRACE", "text").unwrap();
        assert!(tracer.into_inner().is_empty());
    }

    #[test]
    fn test_enabled_writes_records() {
        let mut tracer = Tracer::new(Vec::new());
        tracer.set_enabled(true);
        assert!(tracer.is_enabled());
        tracer.line("TRACE_TEST", "first").unwrap();
        tracer.pretty("TRACE_TEST", &Some("second")).unwrap();

        let output = String::from_utf8(tracer.into_inner()).unwrap();
        assert!(output.contains("first"));
        assert!(output.contains("\"second\""));
        assert!(output.contains("TRACE_TEST"));
    }

    #[test]
    fn test_labels_are_plain_when_colors_are_forced() {
        colored::control::set_override(true);
        let mut tracer = Tracer::new(Vec::new());
        tracer.set_enabled(true);
        tracer.line("TRACE_TEST", "plain").unwrap();
        colored::control::unset_override();

        let output = String::from_utf8(tracer.into_inner()).unwrap();
        assert_eq!(output, "TRACE_TEST plain\n");
        assert!(!output.contains('\x1b'));
    }
}
