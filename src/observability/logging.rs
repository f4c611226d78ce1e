//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the `tracing` subscriber once per process
//! - Serialize events as JSON records to the rotating file sink
//! - Mirror events to a human-readable console stream
//!
//! # Record Shape
//! ```text
//! {"timestamp":"2030-05-01T10:00:00.000Z","level":"info","service":"obs-lab",
//!  "correlation_id":"…","method":"GET","path":"/api/hello",
//!  "message":"Hello endpoint called","target":"obs_lab::api::handlers"}
//! ```
//! Fields of every enclosing span are merged into the record, so events
//! emitted while serving a request carry that request's `correlation_id`.

use std::fmt;

use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::format::{JsonFields, Writer};
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormattedFields, MakeWriter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;
use crate::observability::rolling::RollingFileWriter;

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("failed to install tracing subscriber: {0}")]
    Init(#[from] TryInitError),
}

/// Keeps the non-blocking file worker alive; dropping it flushes pending records.
#[must_use = "dropping the guard stops the file log worker"]
pub struct LoggingGuard {
    _worker: Option<WorkerGuard>,
}

/// Install the global subscriber.
///
/// If the log directory cannot be prepared the file sink is skipped and the
/// console sink keeps working.
pub fn init_logging(config: &LoggingConfig) -> Result<LoggingGuard, LoggingError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let writer = RollingFileWriter::new(
        &config.directory,
        config.file_prefix.as_str(),
        config.max_file_size_bytes,
        config.retention_days,
    );
    let (file_layer, worker) = match writer {
        Ok(writer) => {
            let (non_blocking, worker) = tracing_appender::non_blocking(writer);
            (
                Some(record_layer(&config.service_name, non_blocking)),
                Some(worker),
            )
        }
        Err(e) => {
            eprintln!(
                "log directory {} unavailable, file logging disabled: {}",
                config.directory, e
            );
            (None, None)
        }
    };

    let console_layer = config
        .console
        .then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stdout));

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()?;

    Ok(LoggingGuard { _worker: worker })
}

/// A fmt layer that writes one JSON [`RecordFormat`] line per event.
pub fn record_layer<S, W>(
    service: &str,
    writer: W,
) -> tracing_subscriber::fmt::Layer<S, JsonFields, RecordFormat, W>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + 'static,
{
    tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .fmt_fields(JsonFields::new())
        .event_format(RecordFormat::new(service))
        .with_writer(writer)
}

/// Event formatter producing flat JSON log records.
#[derive(Debug, Clone)]
pub struct RecordFormat {
    service: String,
}

impl RecordFormat {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }
}

impl<S> FormatEvent<S, JsonFields> for RecordFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, JsonFields>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let metadata = event.metadata();
        let mut record = Map::new();
        record.insert(
            "timestamp".into(),
            Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
        record.insert(
            "level".into(),
            Value::String(metadata.level().as_str().to_ascii_lowercase()),
        );
        record.insert("service".into(), Value::String(self.service.clone()));

        // Outermost span first so inner spans win on key clashes.
        if let Some(scope) = ctx.event_scope() {
            for span in scope.from_root() {
                let extensions = span.extensions();
                let Some(fields) = extensions.get::<FormattedFields<JsonFields>>() else {
                    continue;
                };
                if let Ok(Value::Object(span_fields)) = serde_json::from_str(&fields.fields) {
                    record.extend(span_fields);
                }
            }
        }

        let mut visitor = RecordVisitor::default();
        event.record(&mut visitor);
        record.extend(visitor.fields);
        record.insert("target".into(), Value::String(metadata.target().to_string()));

        let line = serde_json::to_string(&record).map_err(|_| fmt::Error)?;
        writeln!(writer, "{}", line)
    }
}

#[derive(Default)]
struct RecordVisitor {
    fields: Map<String, Value>,
}

impl Visit for RecordVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.fields
            .insert(field.name().to_string(), Value::String(format!("{:?}", value)));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.fields
            .insert(field.name().to_string(), Value::String(value.to_string()));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.fields.insert(field.name().to_string(), value.into());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.fields.insert(field.name().to_string(), value.into());
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.fields.insert(field.name().to_string(), value.into());
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.fields.insert(field.name().to_string(), value.into());
    }
}
