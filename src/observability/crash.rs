//! Durable sinks for failures that escape normal error handling.
//!
//! - `exceptions.log`: every panic, written synchronously from the panic hook
//!   before the previously installed hook runs.
//! - `rejections.log`: background tasks started with [`spawn_supervised`]
//!   that returned an error or panicked.
//!
//! Records use the same JSON shape as the main log. Each write is flushed to
//! disk immediately because the process may be about to die.

use std::any::Any;
use std::backtrace::Backtrace;
use std::fmt::Display;
use std::fs::{self, OpenOptions};
use std::future::Future;
use std::io::Write;
use std::panic;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde_json::{json, Value};
use tokio::task::JoinHandle;

#[derive(Debug, Clone)]
pub struct CrashLog {
    exceptions: PathBuf,
    rejections: PathBuf,
    service: String,
}

impl CrashLog {
    pub fn new(dir: impl AsRef<Path>, service: impl Into<String>) -> Self {
        let dir = dir.as_ref();
        Self {
            exceptions: dir.join("exceptions.log"),
            rejections: dir.join("rejections.log"),
            service: service.into(),
        }
    }

    pub fn exceptions_path(&self) -> &Path {
        &self.exceptions
    }

    pub fn rejections_path(&self) -> &Path {
        &self.rejections
    }

    /// Chain a hook that records panics ahead of the existing one.
    pub fn install_panic_hook(&self) {
        let sink = self.clone();
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            let message = panic_message(info.payload());
            let location = info.location().map(ToString::to_string);
            let thread = std::thread::current().name().map(str::to_owned);
            sink.record_exception(&message, location.as_deref(), thread.as_deref());
            previous(info);
        }));
    }

    pub fn record_exception(&self, message: &str, location: Option<&str>, thread: Option<&str>) {
        let record = json!({
            "timestamp": now(),
            "level": "error",
            "service": self.service,
            "message": message,
            "location": location,
            "thread": thread,
            "stack": Backtrace::force_capture().to_string(),
        });
        append(&self.exceptions, &record);
    }

    pub fn record_rejection(&self, task: &str, reason: &str) {
        let record = json!({
            "timestamp": now(),
            "level": "error",
            "service": self.service,
            "message": reason,
            "task": task,
        });
        append(&self.rejections, &record);
    }
}

/// Spawn `future` and record its failure, if any, in the rejections log.
///
/// The returned handle resolves once the task has finished and any failure
/// has been recorded.
pub fn spawn_supervised<F, E>(crash_log: CrashLog, name: &'static str, future: F) -> JoinHandle<()>
where
    F: Future<Output = Result<(), E>> + Send + 'static,
    E: Display + Send + 'static,
{
    let task = tokio::spawn(future);
    tokio::spawn(async move {
        let reason = match task.await {
            Ok(Ok(())) => return,
            Ok(Err(e)) => e.to_string(),
            Err(join_error) if join_error.is_panic() => {
                format!("panicked: {}", panic_message(&*join_error.into_panic()))
            }
            Err(join_error) => join_error.to_string(),
        };
        tracing::error!(task = name, reason = %reason, "Background task failed");
        crash_log.record_rejection(name, &reason);
    })
}

/// Best-effort text of a panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn append(path: &Path, record: &Value) {
    let result = (|| -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{}", record)?;
        file.sync_all()
    })();

    if let Err(e) = result {
        eprintln!("failed to write {}: {} ({})", path.display(), e, record);
    }
}
