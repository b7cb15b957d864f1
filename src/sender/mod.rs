//! Message senders
//!
//! Each sender owns one connection to an external destination:
//! - `sendamqp` - RabbitMQ (AMQP) exchange
//! - `sendhec` - Splunk HTTP Event Collector
//! - `sendsns` - Amazon SNS topic
//! - `senddump` - no destination, traces the event locally

pub mod amqp;
pub mod dump;
pub mod hec;
pub mod sns;

pub use amqp::AmqpSender;
pub use dump::DumpSender;
pub use hec::HecSender;
pub use sns::SnsSender;

use crate::error::Result;
use crate::event::LogEvent;

/// Manages a connection to an external LogEvent destination.
///
/// A sender starts closed. `open_svc` must succeed before `send_message`, and
/// `close_svc` releases the connection. Calling them out of order fails with
/// `AlreadyOpen` or `NotOpen`.
pub trait MessageSender {
    /// Backend name as used in `SENDER_PACKAGE`
    fn name(&self) -> &'static str;

    fn open_svc(&mut self) -> Result<()>;

    fn close_svc(&mut self) -> Result<()>;

    fn send_message(&mut self, event: &LogEvent) -> Result<()>;

    /// Dump outgoing messages to the diagnostic stream
    fn set_trace(&mut self, enabled: bool);

    fn is_tracing(&self) -> bool;
}

/// Build a current-thread runtime for driving an async client to completion
pub(crate) fn blocking_runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| crate::error::SendError::Runtime(e.to_string()))
}
