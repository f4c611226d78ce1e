//! Frontend log ingestion.
//!
//! Browser clients post their own log entries here; each one is re-emitted
//! into the service log tagged `source=frontend`, inside the request span so
//! it carries the correlation ID of the POST.

use serde::Deserialize;
use serde_json::Value;
use tracing::Level;

use crate::http::extract::LenientJson;

#[derive(Debug, Default, Deserialize)]
pub struct ClientLog {
    pub level: Option<String>,
    pub message: Option<String>,
    pub stack: Option<String>,
    pub meta: Option<Value>,
}

/// Map a client-side level name onto a `tracing` level. Unknown names log at info.
pub fn client_level(raw: Option<&str>) -> Level {
    match raw.map(str::to_ascii_lowercase).as_deref() {
        Some("error") => Level::ERROR,
        Some("warn") | Some("warning") => Level::WARN,
        Some("debug") | Some("verbose") => Level::DEBUG,
        Some("trace") | Some("silly") => Level::TRACE,
        _ => Level::INFO,
    }
}

pub async fn ingest_client_log(LenientJson(entry): LenientJson<ClientLog>) -> &'static str {
    let level = client_level(entry.level.as_deref());
    let message = entry.message.as_deref().unwrap_or("Client log");
    let stack = entry.stack.as_deref();
    let meta = entry.meta.as_ref().map(Value::to_string);
    let meta = meta.as_deref();

    macro_rules! emit {
        ($event:ident) => {
            tracing::$event!(source = "frontend", stack, meta, "{}", message)
        };
    }

    if level == Level::ERROR {
        emit!(error);
    } else if level == Level::WARN {
        emit!(warn);
    } else if level == Level::DEBUG {
        emit!(debug);
    } else if level == Level::TRACE {
        emit!(trace);
    } else {
        emit!(info);
    }

    "Log received"
}
