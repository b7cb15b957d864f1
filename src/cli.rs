use chrono::{DateTime, FixedOffset};
use clap::Parser;
use eyre::{Result, eyre};
use lazy_regex::regex_captures;
use std::path::PathBuf;

use crate::event::{Attributes, LogEvent};

#[derive(Parser, Debug)]
#[command(
    name = "logevent",
    about = "Send a log event to an AMQP exchange, Splunk HEC, AWS SNS or a local dump",
    version = env!("GIT_DESCRIBE"),
    after_help = "The destination is chosen with SENDER_PACKAGE (sendamqp, sendhec, sendsns, senddump)\nand configured through environment variables or a logevent.yaml config file."
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, help = "Path to logevent.yaml config file")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    /// Suppress non-error output
    #[arg(short, long, help = "Suppress non-error output")]
    pub quiet: bool,

    /// Send N events
    #[arg(long, default_value = "1")]
    pub count: u32,

    /// Delay N seconds between events
    #[arg(long, default_value = "1")]
    pub delay: u64,

    /// Customer code attribute
    #[arg(long)]
    pub customer: Option<String>,

    /// Event time as epoch seconds; wins over --time when > 0
    #[arg(long, default_value = "0", allow_negative_numbers = true)]
    pub epoch: i64,

    /// Field value as name=value, may be repeated
    #[arg(long = "field", value_name = "NAME=VALUE")]
    pub fields: Vec<String>,

    /// Host attribute and content host
    #[arg(long)]
    pub host: Option<String>,

    /// Content index
    #[arg(long)]
    pub index: Option<String>,

    /// Source attribute and content source
    #[arg(long)]
    pub source: Option<String>,

    /// Source environment attribute
    #[arg(long = "sourceenvironment")]
    pub source_environment: Option<String>,

    /// Sourcetype attribute and content sourcetype
    #[arg(long)]
    pub sourcetype: Option<String>,

    /// Event time as ISO 8601/RFC 3339
    #[arg(long)]
    pub time: Option<String>,

    /// Type attribute
    #[arg(long = "type")]
    pub kind: Option<String>,

    /// Event payload
    pub message: Option<String>,
}

impl Cli {
    /// Build the event described by the command line
    pub fn build_event(&self) -> Result<LogEvent> {
        let non_empty = |value: &Option<String>| value.clone().filter(|v| !v.is_empty()).unwrap_or_default();

        let host = non_empty(&self.host);
        let source = non_empty(&self.source);
        let sourcetype = non_empty(&self.sourcetype);

        let mut event = LogEvent::new(self.message.clone().unwrap_or_default());
        event.attributes = Attributes {
            customer_code: non_empty(&self.customer),
            host: host.clone(),
            source: source.clone(),
            source_environment: non_empty(&self.source_environment),
            sourcetype: sourcetype.clone(),
            kind: non_empty(&self.kind),
        };
        event.content.host = host;
        event.content.index = non_empty(&self.index);
        event.content.source = source;
        event.content.sourcetype = sourcetype;

        if let Some(time) = self.event_time()? {
            event = event.with_time(time);
        }
        for pair in &self.fields {
            let (name, value) = parse_field(pair)?;
            event = event.with_field(name, value);
        }

        Ok(event)
    }

    fn event_time(&self) -> Result<Option<DateTime<FixedOffset>>> {
        if self.epoch > 0 {
            let time = DateTime::from_timestamp(self.epoch, 0)
                .ok_or_else(|| eyre!("Epoch {} is out of range", self.epoch))?;
            return Ok(Some(time.fixed_offset()));
        }
        match self.time.as_deref() {
            Some(text) if !text.is_empty() => {
                let time = DateTime::parse_from_rfc3339(text).map_err(|e| eyre!("Invalid --time {}: {}", text, e))?;
                Ok(Some(time))
            }
            _ => Ok(None),
        }
    }
}

/// Split `name=value`; the name is everything up to the first `=`
pub fn parse_field(pair: &str) -> Result<(String, String)> {
    let (_, name, value) =
        regex_captures!(r"(\S+?)=(.+)", pair).ok_or_else(|| eyre!("unable to parse field/value: {}", pair))?;
    Ok((name.to_string(), value.to_string()))
}
