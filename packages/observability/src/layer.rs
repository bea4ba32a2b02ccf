//! Line-oriented logging layer.
//!
//! Every event becomes exactly one line carrying:
//! - timestamp (RFC 3339, UTC)
//! - level
//! - target (module path)
//! - message
//! - structured fields, with secret-looking keys redacted

use chrono::Utc;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::{self, Write as _};
use std::io::Write;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

use crate::LogFormat;

const REDACTED: &str = "[redacted]";

const DENYLIST_KEYS: [&str; 5] = ["password", "passwd", "secret", "credential", "token"];

/// A single structured log entry.
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub timestamp: String,
    pub level: String,
    pub service: String,
    pub pid: u32,
    pub target: String,
    pub message: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span: Option<String>,
}

impl LogEntry {
    /// Render as a single text line (no trailing newline).
    pub fn to_text_line(&self) -> String {
        let mut line = format!(
            "{} {:>5} {}: {}",
            self.timestamp, self.level, self.target, self.message
        );
        if let Some(span) = &self.span {
            let _ = write!(line, " span={span}");
        }
        for (key, value) in &self.fields {
            match value {
                serde_json::Value::String(s) => {
                    let _ = write!(line, " {key}={s:?}");
                }
                other => {
                    let _ = write!(line, " {key}={other}");
                }
            }
        }
        line
    }
}

fn is_secret_key(name: &str) -> bool {
    let lowered = name.to_ascii_lowercase();
    DENYLIST_KEYS.iter().any(|deny| lowered.contains(deny))
}

/// Visitor that extracts fields from tracing events.
struct FieldVisitor {
    fields: BTreeMap<String, serde_json::Value>,
    message: Option<String>,
}

impl FieldVisitor {
    fn new() -> Self {
        Self {
            fields: BTreeMap::new(),
            message: None,
        }
    }

    fn insert(&mut self, field: &Field, value: serde_json::Value) {
        let value = if is_secret_key(field.name()) {
            serde_json::Value::String(REDACTED.to_string())
        } else {
            value
        };
        self.fields.insert(field.name().to_string(), value);
    }
}

impl Visit for FieldVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        let value_str = format!("{:?}", value);
        if field.name() == "message" {
            self.message = Some(value_str);
        } else {
            self.insert(field, serde_json::Value::String(value_str));
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        } else {
            self.insert(field, serde_json::Value::String(value.to_string()));
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, serde_json::Value::Number(value.into()));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, serde_json::Value::Number(value.into()));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, serde_json::Value::Bool(value));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.insert(field, serde_json::Value::String(value.to_string()));
    }
}

/// Layer that writes one line per event in the configured [`LogFormat`].
pub struct LineLayer<W> {
    service_name: String,
    pid: u32,
    format: LogFormat,
    make_writer: W,
}

impl<W> LineLayer<W> {
    pub fn new(service_name: String, format: LogFormat, make_writer: W) -> Self {
        Self {
            service_name,
            pid: std::process::id(),
            format,
            make_writer,
        }
    }
}

impl<S, W> Layer<S> for LineLayer<W>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'writer> MakeWriter<'writer> + 'static,
{
    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let mut visitor = FieldVisitor::new();
        event.record(&mut visitor);

        let metadata = event.metadata();
        let entry = LogEntry {
            timestamp: Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true),
            level: level_to_string(*metadata.level()),
            service: self.service_name.clone(),
            pid: self.pid,
            target: metadata.target().to_string(),
            message: visitor.message.unwrap_or_default(),
            fields: visitor.fields,
            span: ctx.event_span(event).map(|s| s.name().to_string()),
        };

        let mut line = match self.format {
            LogFormat::Text => entry.to_text_line(),
            LogFormat::Json => match serde_json::to_string(&entry) {
                Ok(json) => json,
                Err(_) => return,
            },
        };

        line.push('\n');

        // One write per event so concurrent events cannot interleave.
        let mut writer = self.make_writer.make_writer();
        let _ = writer.write_all(line.as_bytes());
    }
}

fn level_to_string(level: Level) -> String {
    match level {
        Level::TRACE => "TRACE",
        Level::DEBUG => "DEBUG",
        Level::INFO => "INFO",
        Level::WARN => "WARN",
        Level::ERROR => "ERROR",
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AppendLogWriter, WriterFactory};
    use tracing_subscriber::layer::SubscriberExt;

    fn capture(format: LogFormat, emit: impl FnOnce()) -> String {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agent.log");
        let writer = AppendLogWriter::new(&path).unwrap();
        let layer = LineLayer::new("polkit-agent".into(), format, WriterFactory::new(writer));
        let subscriber = tracing_subscriber::registry().with(layer);
        tracing::subscriber::with_default(subscriber, emit);
        std::fs::read_to_string(&path).unwrap()
    }

    #[test]
    fn test_text_line_has_timestamp_level_and_fields() {
        let out = capture(LogFormat::Text, || {
            tracing::info!(cookie = "cookie-123", uid = 1000u64, "response sent");
        });
        let line = out.lines().next().unwrap();
        assert!(line.contains(" INFO "));
        assert!(line.contains("response sent"));
        assert!(line.contains("cookie=\"cookie-123\""));
        assert!(line.contains("uid=1000"));
        assert!(line.chars().next().unwrap().is_ascii_digit());
    }

    #[test]
    fn test_json_line_is_valid_json() {
        let out = capture(LogFormat::Json, || {
            tracing::warn!(action_id = "org.example.action", "invalid credential");
        });
        let value: serde_json::Value = serde_json::from_str(out.trim()).unwrap();
        assert_eq!(value["level"], "WARN");
        assert_eq!(value["service"], "polkit-agent");
        assert_eq!(value["message"], "invalid credential");
        assert_eq!(value["fields"]["action_id"], "org.example.action");
    }

    #[test]
    fn test_secret_fields_are_redacted() {
        let out = capture(LogFormat::Text, || {
            tracing::info!(password = "hunter2", credential = "hunter2", "oops");
        });
        assert!(!out.contains("hunter2"));
        assert!(out.contains(REDACTED));
    }

    #[test]
    fn test_one_line_per_event() {
        let out = capture(LogFormat::Text, || {
            tracing::info!("first");
            tracing::error!("second");
        });
        assert_eq!(out.lines().count(), 2);
    }

    #[test]
    fn test_concurrent_events_stay_on_their_own_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agent.log");
        let writer = AppendLogWriter::new(&path).unwrap();
        let layer = LineLayer::new("polkit-agent".into(), LogFormat::Json, WriterFactory::new(writer));
        let dispatch = tracing::Dispatch::new(tracing_subscriber::registry().with(layer));

        let handles: Vec<_> = (0..4)
            .map(|worker| {
                let dispatch = dispatch.clone();
                std::thread::spawn(move || {
                    tracing::dispatcher::with_default(&dispatch, || {
                        for n in 0..100u64 {
                            tracing::info!(worker = worker as u64, n, "event");
                        }
                    });
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 400);
        for line in content.lines() {
            let value: serde_json::Value = serde_json::from_str(line).unwrap();
            assert_eq!(value["message"], "event");
        }
    }

    #[test]
    fn test_log_entry_serialization() {
        let entry = LogEntry {
            timestamp: "2024-01-15T10:30:00.000000Z".to_string(),
            level: "INFO".to_string(),
            service: "polkit-agent".to_string(),
            pid: 12345,
            target: "auth_session_orchestrator".to_string(),
            message: "authentication requested".to_string(),
            fields: BTreeMap::new(),
            span: None,
        };

        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("\"service\":\"polkit-agent\""));
        assert!(json.contains("\"pid\":12345"));
        assert!(!json.contains("\"fields\""));
    }
}
