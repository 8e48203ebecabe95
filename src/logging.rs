//! JSON-line logging engine built on `tracing-subscriber`.
//!
//! Every logger tree owns one [`Engine`]: a [`Registry`] with a reloadable
//! [`LevelFilter`] in front of a [`JsonLayer`]. The reload handle is the
//! level configuration shared by all loggers derived from the same root.

use std::backtrace::Backtrace;
use std::fmt;
use std::io::{self, Write};
use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use serde_json::Value;
use tracing::field::{Field, Visit};
use tracing::level_filters::LevelFilter;
use tracing::{Dispatch, Event, Subscriber};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use tracing_subscriber::{reload, Registry};

use crate::level::Level;

/// Output keys
pub mod keys {
    pub const MESSAGE: &str = "msg";
    pub const LEVEL: &str = "level";
    pub const TIME: &str = "ts";
    pub const NAME: &str = "logger";
    pub const CALLER: &str = "caller";
    pub const STACKTRACE: &str = "stacktrace";
    pub const ENV: &str = "env";
}

// Event field names the loggers use to hand data to the layer. Anything
// else recorded on an event is written as a user field.
mod carriers {
    pub(super) const MESSAGE: &str = "message";
    pub(super) const NAME: &str = "_logger";
    pub(super) const CALLER: &str = "_caller";
    pub(super) const FIELDS: &str = "_fields";
}

/// Encode ordered key/value pairs for the `_fields` carrier.
pub(crate) fn encode_fields<'a, I>(fields: I) -> String
where
    I: IntoIterator<Item = &'a (String, Value)>,
{
    let pairs: Vec<&(String, Value)> = fields.into_iter().collect();
    serde_json::to_string(&pairs).unwrap_or_default()
}

#[derive(Default)]
struct RecordVisitor {
    message: Option<String>,
    name: Option<String>,
    caller: Option<String>,
    fields: Vec<(String, Value)>,
}

impl RecordVisitor {
    fn record_text(&mut self, field: &Field, text: String) {
        match field.name() {
            carriers::MESSAGE => self.message = Some(text),
            carriers::NAME => self.name = Some(text),
            carriers::CALLER => self.caller = Some(text),
            carriers::FIELDS => match serde_json::from_str::<Vec<(String, Value)>>(&text) {
                Ok(fields) => self.fields.extend(fields),
                Err(_) => self.fields.push((field.name().to_string(), Value::String(text))),
            },
            name => self.fields.push((name.to_string(), Value::String(text))),
        }
    }

    fn record_value(&mut self, field: &Field, value: Value) {
        self.fields.push((field.name().to_string(), value));
    }
}

impl Visit for RecordVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.record_text(field, value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.record_text(field, format!("{:?}", value));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.record_text(field, value.to_string());
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.record_value(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.record_value(field, Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.record_value(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.record_value(field, Value::from(value));
    }
}

/// One JSON object per line. Keys may repeat.
struct JsonLine {
    buf: Vec<u8>,
}

impl JsonLine {
    fn new() -> Self {
        Self {
            buf: Vec::with_capacity(256),
        }
    }

    fn field(&mut self, key: &str, value: &Value) {
        self.buf.push(if self.buf.is_empty() { b'{' } else { b',' });
        // Writing into a Vec cannot fail
        let _ = serde_json::to_writer(&mut self.buf, key);
        self.buf.push(b':');
        let _ = serde_json::to_writer(&mut self.buf, value);
    }

    fn finish(mut self) -> Vec<u8> {
        if self.buf.is_empty() {
            self.buf.push(b'{');
        }
        self.buf.extend_from_slice(b"}\n");
        self.buf
    }
}

/// Layer writing each event as a JSON line with fixed record keys
pub struct JsonLayer<W> {
    writer: Arc<W>,
    initial_fields: Vec<(String, Value)>,
}

impl<W> JsonLayer<W> {
    /// `initial_fields` are written on every record, after the message.
    pub fn new(writer: Arc<W>, initial_fields: Vec<(String, Value)>) -> Self {
        Self {
            writer,
            initial_fields,
        }
    }

    fn format(&self, event: &Event<'_>, visitor: RecordVisitor) -> Vec<u8> {
        let metadata = event.metadata();
        let level = Level::from_tracing(metadata.level());
        let caller = visitor
            .caller
            .or_else(|| match (metadata.file(), metadata.line()) {
                (Some(file), Some(line)) => Some(format!("{}:{}", file, line)),
                _ => None,
            });

        let mut line = JsonLine::new();
        line.field(keys::LEVEL, &Value::from(level.as_str()));
        line.field(
            keys::TIME,
            &Value::from(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)),
        );
        if let Some(name) = visitor.name.filter(|name| !name.is_empty()) {
            line.field(keys::NAME, &Value::from(name));
        }
        if let Some(caller) = caller {
            line.field(keys::CALLER, &Value::from(caller));
        }
        line.field(
            keys::MESSAGE,
            &Value::from(visitor.message.unwrap_or_default()),
        );
        for (key, value) in self.initial_fields.iter().chain(&visitor.fields) {
            line.field(key, value);
        }
        if level >= Level::Error {
            line.field(
                keys::STACKTRACE,
                &Value::from(Backtrace::force_capture().to_string()),
            );
        }
        line.finish()
    }
}

impl<S, W> Layer<S> for JsonLayer<W>
where
    S: Subscriber,
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = RecordVisitor::default();
        event.record(&mut visitor);
        let line = self.format(event, visitor);

        // A failed write has nowhere to be reported
        let _ = self
            .writer
            .make_writer_for(event.metadata())
            .write_all(&line);
    }
}

type FlushFn = Box<dyn Fn() -> io::Result<()> + Send + Sync>;

/// Dispatch, shared level handle and flush hook for one logger tree
pub(crate) struct Engine {
    dispatch: Dispatch,
    level: reload::Handle<LevelFilter, Registry>,
    flush: FlushFn,
}

impl Engine {
    pub(crate) fn new<W>(writer: W, initial_fields: Vec<(String, Value)>) -> Self
    where
        W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
    {
        let writer = Arc::new(writer);
        let (filter, level) = reload::Layer::new(LevelFilter::from(Level::default()));
        let subscriber = Registry::default()
            .with(filter)
            .with(JsonLayer::new(Arc::clone(&writer), initial_fields));

        Self {
            dispatch: Dispatch::new(subscriber),
            level,
            flush: Box::new(move || writer.make_writer().flush()),
        }
    }

    pub(crate) fn dispatch(&self) -> &Dispatch {
        &self.dispatch
    }

    pub(crate) fn level(&self) -> Level {
        self.level
            .clone_current()
            .map(Level::from_filter)
            .unwrap_or_default()
    }

    pub(crate) fn set_level(&self, level: Level) {
        // The interest rebuild triggered by `modify` consults the current
        // default dispatcher when only one is registered, so it must be ours.
        tracing::dispatcher::with_default(&self.dispatch, || {
            // Only fails once the subscriber is gone, and the engine owns it
            let _ = self.level.modify(|filter| *filter = level.into());
        });
    }

    pub(crate) fn flush(&self) -> io::Result<()> {
        (self.flush)()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::io::{self, Write};
    use std::sync::{Arc, Mutex};

    use serde_json::Value;

    /// In-memory writer capturing every record
    #[derive(Clone, Debug, Default)]
    pub(crate) struct CaptureWriter {
        buffer: Arc<Mutex<Vec<u8>>>,
    }

    impl CaptureWriter {
        pub(crate) fn output(&self) -> String {
            let buffer = self.buffer.lock().unwrap();
            String::from_utf8_lossy(&buffer).to_string()
        }

        pub(crate) fn records(&self) -> Vec<Value> {
            self.output()
                .lines()
                .map(|line| serde_json::from_str(line).unwrap())
                .collect()
        }
    }

    impl Write for CaptureWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.buffer
                .lock()
                .map_err(|_| io::Error::other("Mutex poisoned"))?
                .extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for CaptureWriter {
        type Writer = Self;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }
}
