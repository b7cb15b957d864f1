//! RabbitMQ (AMQP) exchange sender

use lapin::options::BasicPublishOptions;
use lapin::types::{AMQPValue, FieldTable, LongString, ShortString};
use lapin::{BasicProperties, Channel, Connection, ConnectionProperties};
use std::io::{self, Write};
use std::sync::mpsc::{self, Receiver};
use tokio::runtime::Runtime;

use super::{MessageSender, blocking_runtime};
use crate::error::{Result, SendError};
use crate::event::LogEvent;
use crate::session::Session;
use crate::trace::Tracer;

const CONTENT_TYPE_JSON: &str = "application/json";
const DELIVERY_MODE_PERSISTENT: u8 = 2;

/// A message ready to be published
#[derive(Debug, Clone)]
pub struct Publishing {
    pub properties: BasicProperties,
    pub body: Vec<u8>,
}

struct AmqpHandle {
    runtime: Runtime,
    connection: Connection,
    channel: Channel,
    /// Errors reported asynchronously by the connection
    closed: Receiver<String>,
}

pub struct AmqpSender<W: Write = io::Stderr> {
    url: String,
    exchange: String,
    routing_key: String,
    /// Message TTL in seconds
    ttl: Option<u64>,
    session: Session<AmqpHandle>,
    tracer: Tracer<W>,
}

impl AmqpSender<io::Stderr> {
    /// `url` may carry username, password, host, port and vhost.
    /// `ttl` is a message TTL in seconds; an invalid value is logged and ignored.
    pub fn new(url: &str, exchange: &str, routing_key: &str, ttl: &str) -> Self {
        Self::with_writer(url, exchange, routing_key, ttl, io::stderr())
    }
}

impl<W: Write> AmqpSender<W> {
    pub fn with_writer(url: &str, exchange: &str, routing_key: &str, ttl: &str, out: W) -> Self {
        Self {
            url: url.to_string(),
            exchange: exchange.to_string(),
            routing_key: routing_key.to_string(),
            ttl: parse_ttl(ttl),
            session: Session::new(),
            tracer: Tracer::new(out),
        }
    }

    pub fn ttl(&self) -> Option<u64> {
        self.ttl
    }

    pub fn build_publishing(&self, event: &LogEvent) -> Result<Publishing> {
        let mut headers = FieldTable::default();
        for (name, value) in event.attributes.entries() {
            headers.insert(ShortString::from(name), AMQPValue::LongString(LongString::from(value)));
        }

        let mut properties = BasicProperties::default()
            .with_content_type(ShortString::from(CONTENT_TYPE_JSON))
            .with_delivery_mode(DELIVERY_MODE_PERSISTENT)
            .with_priority(0)
            .with_headers(headers);

        if let Some(ttl) = self.ttl {
            properties = properties.with_expiration(ShortString::from((ttl * 1000).to_string()));
        }
        if !event.attributes.kind.is_empty() {
            properties = properties.with_kind(ShortString::from(event.attributes.kind.as_str()));
        }

        Ok(Publishing {
            properties,
            body: event.content.to_json()?.into_bytes(),
        })
    }

    fn connect(&self) -> Result<AmqpHandle> {
        let runtime = blocking_runtime()?;
        let connection = runtime.block_on(Connection::connect(&self.url, ConnectionProperties::default()))?;

        let (notify, closed) = mpsc::channel();
        connection.on_error(move |err| {
            // the receiver is gone once the session is closed
            let _ = notify.send(err.to_string());
        });

        let channel = match runtime.block_on(connection.create_channel()) {
            Ok(channel) => channel,
            Err(e) => {
                if let Err(close_err) = runtime.block_on(connection.close(200, "OK")) {
                    log::warn!("Failed to close AMQP connection after channel error: {}", close_err);
                }
                return Err(e.into());
            }
        };

        Ok(AmqpHandle {
            runtime,
            connection,
            channel,
            closed,
        })
    }
}

impl<W: Write> MessageSender for AmqpSender<W> {
    fn name(&self) -> &'static str {
        "sendamqp"
    }

    fn open_svc(&mut self) -> Result<()> {
        self.session.ensure_closed()?;
        let handle = self.connect()?;
        self.session.open(handle)?;
        log::info!("Connected to AMQP exchange '{}' (ttl {:?}s)", self.exchange, self.ttl());
        Ok(())
    }

    fn close_svc(&mut self) -> Result<()> {
        let handle = self.session.close()?;
        handle.runtime.block_on(handle.connection.close(200, "OK"))?;
        log::debug!("AMQP connection closed");
        Ok(())
    }

    fn send_message(&mut self, event: &LogEvent) -> Result<()> {
        let pending = pending_close_cause(&self.session.handle_mut()?.closed);
        if let Some(cause) = pending {
            let close_error = self.close_svc().err().map(|e| e.to_string());
            return Err(SendError::ConnectionClosed { cause, close_error });
        }

        let publishing = self.build_publishing(event)?;
        let handle = self.session.handle_mut()?;
        let confirm = handle.runtime.block_on(handle.channel.basic_publish(
            &self.exchange,
            &self.routing_key,
            BasicPublishOptions::default(),
            &publishing.body,
            publishing.properties.clone(),
        ))?;
        handle.runtime.block_on(confirm)?;

        self.tracer
            .pretty("TRACE_SENDAMQP amqpMessage:", &publishing.properties)?;
        self.tracer
            .line("TRACE_SENDAMQP Body:", &String::from_utf8_lossy(&publishing.body))
    }

    fn set_trace(&mut self, enabled: bool) {
        self.tracer.set_enabled(enabled);
    }

    fn is_tracing(&self) -> bool {
        self.tracer.is_enabled()
    }
}

/// Drain connection errors reported since the last send; several are joined with "; "
fn pending_close_cause(closed: &Receiver<String>) -> Option<String> {
    let causes: Vec<String> = closed.try_iter().collect();
    if causes.is_empty() { None } else { Some(causes.join("; ")) }
}

/// Parse a TTL in seconds. Anything that is not a non-negative integer that
/// fits as milliseconds is logged and ignored.
fn parse_ttl(raw: &str) -> Option<u64> {
    if raw.is_empty() {
        return None;
    }
    match raw.parse::<u64>() {
        Ok(ttl) if ttl.checked_mul(1000).is_some() => Some(ttl),
        _ => {
            log::warn!("Unable to convert AMQP_TTL [{}] to int; ignoring", raw);
            None
        }
    }
}
