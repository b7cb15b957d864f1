//! Amazon SNS topic sender
//!
//! Credentials and region are resolved by the AWS SDK from its usual
//! environment variables and shared config files.

use aws_config::BehaviorVersion;
use aws_sdk_sns::Client;
use aws_sdk_sns::error::DisplayErrorContext;
use aws_sdk_sns::types::MessageAttributeValue;
use std::collections::HashMap;
use std::io::{self, Write};
use tokio::runtime::Runtime;

use super::{MessageSender, blocking_runtime};
use crate::error::{Result, SendError};
use crate::event::LogEvent;
use crate::session::Session;
use crate::trace::Tracer;

const STRING_DATA_TYPE: &str = "String";

/// Message body and attributes for a single publish
#[derive(Debug, Clone)]
pub struct SnsMessage {
    pub message: String,
    pub attributes: HashMap<String, MessageAttributeValue>,
}

struct SnsHandle {
    runtime: Runtime,
    client: Client,
}

pub struct SnsSender<W: Write = io::Stderr> {
    topic_arn: String,
    session: Session<SnsHandle>,
    tracer: Tracer<W>,
}

impl SnsSender<io::Stderr> {
    pub fn new(topic_arn: &str) -> Self {
        Self::with_writer(topic_arn, io::stderr())
    }
}

impl<W: Write> SnsSender<W> {
    pub fn with_writer(topic_arn: &str, out: W) -> Self {
        Self {
            topic_arn: topic_arn.to_string(),
            session: Session::new(),
            tracer: Tracer::new(out),
        }
    }

    pub fn topic_arn(&self) -> &str {
        &self.topic_arn
    }

    pub fn build_sns_message(&self, event: &LogEvent) -> Result<SnsMessage> {
        let mut attributes = HashMap::new();
        for (name, value) in event.attributes.entries() {
            let attribute = MessageAttributeValue::builder()
                .data_type(STRING_DATA_TYPE)
                .string_value(value)
                .build()
                .map_err(|e| SendError::Sns(e.to_string()))?;
            attributes.insert(name.to_string(), attribute);
        }

        Ok(SnsMessage {
            message: event.content.to_json()?,
            attributes,
        })
    }
}

impl<W: Write> MessageSender for SnsSender<W> {
    fn name(&self) -> &'static str {
        "sendsns"
    }

    fn open_svc(&mut self) -> Result<()> {
        self.session.ensure_closed()?;
        let runtime = blocking_runtime()?;
        let config = runtime.block_on(aws_config::load_defaults(BehaviorVersion::latest()));
        let client = Client::new(&config);
        self.session.open(SnsHandle { runtime, client })?;
        log::debug!("SNS session opened for topic {}", self.topic_arn());
        Ok(())
    }

    fn close_svc(&mut self) -> Result<()> {
        self.session.close()?;
        log::debug!("SNS session closed");
        Ok(())
    }

    fn send_message(&mut self, event: &LogEvent) -> Result<()> {
        self.session.handle_mut()?;

        let sns_message = self.build_sns_message(event)?;
        self.tracer
            .pretty("TRACE_SNS MessageAttributes =", &sns_message.attributes)?;
        self.tracer.pretty("TRACE_SNS Message =", &sns_message.message)?;

        let handle = self.session.handle_mut()?;
        let output = handle
            .runtime
            .block_on(
                handle
                    .client
                    .publish()
                    .topic_arn(&self.topic_arn)
                    .message(sns_message.message)
                    .set_message_attributes(Some(sns_message.attributes))
                    .send(),
            )
            .map_err(|e| SendError::Sns(DisplayErrorContext(&e).to_string()))?;

        self.tracer
            .line("TRACE_SNS Success", output.message_id().unwrap_or_default())
    }

    fn set_trace(&mut self, enabled: bool) {
        self.tracer.set_enabled(enabled);
    }

    fn is_tracing(&self) -> bool {
        self.tracer.is_enabled()
    }
}
