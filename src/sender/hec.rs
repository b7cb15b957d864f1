//! Splunk HTTP Event Collector sender

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::io::{self, Write};
use ureq::Agent;
use ureq::tls::TlsConfig;

use super::MessageSender;
use crate::error::{Result, SendError};
use crate::event::{LogEvent, format_trace_time};
use crate::session::Session;
use crate::trace::Tracer;

const COLLECTOR_PATH: &str = "/services/collector";
const EVENT_PATH: &str = "/services/collector/event";

/// One event in the collector's JSON format
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HecEvent {
    /// Epoch seconds with millisecond precision
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sourcetype: Option<String>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub fields: IndexMap<String, serde_json::Value>,
    pub event: serde_json::Value,
}

/// Collector reply body
#[derive(Debug, Deserialize)]
struct HecReply {
    #[serde(default)]
    text: String,
    #[serde(default)]
    code: i64,
}

pub struct HecSender<W: Write = io::Stderr> {
    url: String,
    token: String,
    insecure: bool,
    session: Session<Agent>,
    tracer: Tracer<W>,
}

impl HecSender<io::Stderr> {
    /// `url` is the collector base URL, `token` the HEC token (typically a GUID)
    pub fn new(url: &str, token: &str) -> Self {
        Self::with_writer(url, token, io::stderr())
    }
}

impl<W: Write> HecSender<W> {
    pub fn with_writer(url: &str, token: &str, out: W) -> Self {
        Self {
            url: url.to_string(),
            token: token.to_string(),
            insecure: false,
            session: Session::new(),
            tracer: Tracer::new(out),
        }
    }

    /// Disable TLS certificate validation.
    /// THIS IS INSECURE and only meant for dev/lab collectors.
    pub fn set_insecure(&mut self, insecure: bool) {
        self.insecure = insecure;
    }

    pub fn is_insecure(&self) -> bool {
        self.insecure
    }

    /// Full URL events are posted to
    pub fn endpoint(&self) -> String {
        let base = self.url.trim_end_matches('/');
        if base.contains(COLLECTOR_PATH) {
            base.to_string()
        } else {
            format!("{}{}", base, EVENT_PATH)
        }
    }

    pub fn format_event(&self, event: &LogEvent) -> HecEvent {
        let content = &event.content;
        let non_empty = |s: &String| if s.is_empty() { None } else { Some(s.clone()) };

        // Times before the epoch come out negative and are rejected by the collector
        let time = content
            .time
            .map(|t| format!("{:.3}", t.timestamp_millis() as f64 / 1000.0));

        HecEvent {
            time,
            host: non_empty(&content.host),
            index: non_empty(&content.index),
            source: non_empty(&content.source),
            sourcetype: non_empty(&content.sourcetype),
            fields: content.fields.clone(),
            event: content.event.clone().unwrap_or(serde_json::Value::Null),
        }
    }

    fn build_agent(&self) -> Agent {
        let mut config = Agent::config_builder().http_status_as_error(false);
        if self.is_insecure() {
            log::warn!("TLS certificate validation is disabled for {}", self.url);
            config = config.tls_config(TlsConfig::builder().disable_verification(true).build());
        }
        config.build().into()
    }
}

impl<W: Write> MessageSender for HecSender<W> {
    fn name(&self) -> &'static str {
        "sendhec"
    }

    fn open_svc(&mut self) -> Result<()> {
        self.session.ensure_closed()?;
        let agent = self.build_agent();
        self.session.open(agent)?;
        log::debug!("HEC session opened for {}", self.endpoint());
        Ok(())
    }

    fn close_svc(&mut self) -> Result<()> {
        self.session.close()?;
        log::debug!("HEC session closed");
        Ok(())
    }

    fn send_message(&mut self, event: &LogEvent) -> Result<()> {
        self.session.handle_mut()?;

        let hec_event = self.format_event(event);
        let time = format_trace_time(event.content.time.as_ref());
        self.tracer
            .pretty(&format!("TRACE_SENDHEC time = {} hecEvent =", time), &hec_event)?;

        let body = serde_json::to_string(&hec_event)?;
        let endpoint = self.endpoint();
        let authorization = format!("Splunk {}", self.token);

        let agent = self.session.handle_mut()?;
        let mut response = agent
            .post(endpoint.as_str())
            .header("Authorization", authorization.as_str())
            .header("Content-Type", "application/json")
            .send(body.as_bytes())?;

        let status = response.status();
        let text = response.body_mut().read_to_string()?;
        if !status.is_success() {
            let reply = serde_json::from_str::<HecReply>(&text).unwrap_or(HecReply { text, code: -1 });
            return Err(SendError::Collector {
                status: status.as_u16(),
                code: reply.code,
                text: reply.text,
            });
        }

        self.tracer.line("TRACE_SENDHEC Success", &text)
    }

    fn set_trace(&mut self, enabled: bool) {
        self.tracer.set_enabled(enabled);
    }

    fn is_tracing(&self) -> bool {
        self.tracer.is_enabled()
    }
}
