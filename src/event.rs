//! Log event model
//!
//! A `LogEvent` is split into transport-level `Attributes` (headers, message
//! attributes) and the `MessageContent` that travels as the message body.

use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};
use indexmap::IndexMap;
use serde::{Serialize, Serializer};

/// Text used when a trace needs to show an unset timestamp
pub const ZERO_TIME: &str = "0001-01-01T00:00:00Z";

/// Properties that may be passed as headers to an intermediate system.
/// Empty strings are unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Attributes {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub customer_code: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub host: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub source: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub source_environment: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub sourcetype: String,
    /// The `type` attribute
    #[serde(rename = "type", skip_serializing_if = "String::is_empty")]
    pub kind: String,
}

impl Attributes {
    /// Header name/value pairs for every non-empty attribute, in a stable order
    pub fn entries(&self) -> Vec<(&'static str, &str)> {
        [
            ("customer_code", self.customer_code.as_str()),
            ("host", self.host.as_str()),
            ("source", self.source.as_str()),
            ("source_environment", self.source_environment.as_str()),
            ("sourcetype", self.sourcetype.as_str()),
            ("type", self.kind.as_str()),
        ]
        .into_iter()
        .filter(|(_, value)| !value.is_empty())
        .collect()
    }
}

/// The message body sent to the destination
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MessageContent {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub host: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub index: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub source: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub sourcetype: String,
    /// Event time; `None` is the zero timestamp and is never serialized
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "serialize_time")]
    pub time: Option<DateTime<FixedOffset>>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub fields: IndexMap<String, serde_json::Value>,
    /// Opaque payload, usually a string or pre-serialized JSON text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<serde_json::Value>,
}

impl MessageContent {
    /// Serialize the content as the JSON message body
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// A single log message: attributes/headers plus content
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LogEvent {
    pub attributes: Attributes,
    pub content: MessageContent,
}

impl LogEvent {
    /// Create an event carrying a string payload
    pub fn new(event: impl Into<String>) -> Self {
        Self {
            content: MessageContent {
                event: Some(serde_json::Value::String(event.into())),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    pub fn with_time(mut self, time: DateTime<FixedOffset>) -> Self {
        self.content.time = Some(time);
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.content.fields.insert(name.into(), value.into());
        self
    }
}

/// RFC 3339 in the event's own offset, `Z` for UTC
pub fn rfc3339(time: &DateTime<FixedOffset>) -> String {
    time.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Fixed UTC form used by trace output; the zero timestamp renders as `ZERO_TIME`
pub fn format_trace_time(time: Option<&DateTime<FixedOffset>>) -> String {
    match time {
        Some(t) => t.with_timezone(&Utc).to_rfc3339_opts(SecondsFormat::Secs, true),
        None => ZERO_TIME.to_string(),
    }
}

fn serialize_time<S>(time: &Option<DateTime<FixedOffset>>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match time {
        Some(t) => serializer.serialize_str(&rfc3339(t)),
        None => serializer.serialize_none(),
    }
}
