use std::fmt::{self, Write as _};
use std::panic::Location;
use std::sync::Arc;

use serde_json::Value;
use tracing::Dispatch;
use tracing_subscriber::fmt::MakeWriter;

use super::sugar::{sweeten, Sweetened};
use super::{LeafLogger, Logger, SharedLogger};
use crate::config::LoggerConfig;
use crate::error::{LoggerError, Result};
use crate::level::Level;
use crate::logging::{encode_fields, keys, Engine};
use crate::observability::{tracing_properties, Context};

/// Field holding tracing identifiers bound by `with_tracing_params`
pub const TRACING_PROPERTIES_KEY: &str = "Properties";

/// JSON logger backed by a `tracing` dispatch.
///
/// Loggers derived with `named`/`with` share the root's engine, including
/// its level: `set_level` on any of them changes the level for the whole
/// tree.
#[derive(Clone)]
pub struct StructuredLogger {
    name: Arc<str>,
    fields: Arc<[(String, Value)]>,
    engine: Arc<Engine>,
}

impl StructuredLogger {
    /// Logger writing to stderr, with `env` read from `NDAU_ENV_NAME`.
    pub fn new(name: &str, level: &str) -> Result<Self> {
        Self::from_config(LoggerConfig::new(name, level))
    }

    pub fn from_config(config: LoggerConfig) -> Result<Self> {
        let writer = config.output.make_writer()?;
        Ok(Self::with_writer(config, writer))
    }

    /// Like [`from_config`](Self::from_config) but writing to `writer`
    /// instead of `config.output`.
    pub fn with_writer<W>(config: LoggerConfig, writer: W) -> Self
    where
        W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
    {
        let initial_fields = vec![(keys::ENV.to_string(), Value::from(config.env_name))];
        let root = Self {
            name: Arc::from(""),
            fields: Arc::from(Vec::new()),
            engine: Arc::new(Engine::new(writer, initial_fields)),
        };
        let logger = root.child_named(&config.name);
        logger.set_level(&config.level);
        logger
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current minimum level of this logger's tree
    pub fn level(&self) -> Level {
        self.engine.level()
    }

    pub fn enabled(&self, level: Level) -> bool {
        level >= self.level()
    }

    fn child_named(&self, name: &str) -> Self {
        let name = match (self.name.is_empty(), name.is_empty()) {
            (_, true) => return self.clone(),
            (true, false) => name.to_string(),
            (false, false) => format!("{}.{}", self.name, name),
        };
        Self {
            name: Arc::from(name),
            fields: Arc::clone(&self.fields),
            engine: Arc::clone(&self.engine),
        }
    }

    fn child_with(&self, fields: Vec<(String, Value)>) -> Self {
        let fields: Vec<(String, Value)> = self.fields.iter().cloned().chain(fields).collect();
        Self {
            name: Arc::clone(&self.name),
            fields: Arc::from(fields),
            engine: Arc::clone(&self.engine),
        }
    }

    fn report(&self, sweetened: &Sweetened, caller: &Location<'_>) {
        if !self.enabled(Level::Error) {
            return;
        }
        for (msg, field) in sweetened.diagnostics() {
            self.emit(Level::Error, caller, msg, std::slice::from_ref(&field));
        }
    }

    fn log(&self, level: Level, caller: &Location<'_>, args: &[&dyn fmt::Display]) {
        if !self.enabled(level) {
            return;
        }
        let mut msg = String::new();
        for arg in args {
            let _ = write!(msg, "{}", arg);
        }
        self.emit(level, caller, &msg, &[]);
    }

    fn logf(&self, level: Level, caller: &Location<'_>, args: fmt::Arguments<'_>) {
        if self.enabled(level) {
            self.emit(level, caller, &args.to_string(), &[]);
        }
    }

    fn logw(&self, level: Level, caller: &Location<'_>, msg: &str, keys_and_values: &[Value]) {
        if !self.enabled(level) {
            return;
        }
        let sweetened = sweeten(keys_and_values);
        self.report(&sweetened, caller);
        self.emit(level, caller, msg, &sweetened.fields);
    }

    fn emit(&self, level: Level, caller: &Location<'_>, msg: &str, call_fields: &[(String, Value)]) {
        let caller = format!("{}:{}", caller.file(), caller.line());
        let fields = encode_fields(self.fields.iter().chain(call_fields));
        let name: &str = &self.name;

        tracing::dispatcher::with_default(self.engine.dispatch(), || match level {
            Level::Debug => tracing::debug!(
                _logger = name,
                _caller = caller.as_str(),
                _fields = fields.as_str(),
                "{}",
                msg
            ),
            Level::Info => tracing::info!(
                _logger = name,
                _caller = caller.as_str(),
                _fields = fields.as_str(),
                "{}",
                msg
            ),
            Level::Warn => tracing::warn!(
                _logger = name,
                _caller = caller.as_str(),
                _fields = fields.as_str(),
                "{}",
                msg
            ),
            Level::Error => tracing::error!(
                _logger = name,
                _caller = caller.as_str(),
                _fields = fields.as_str(),
                "{}",
                msg
            ),
        });
    }
}

impl fmt::Debug for StructuredLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StructuredLogger")
            .field("name", &self.name)
            .field("level", &self.level())
            .field("fields", &self.fields.len())
            .finish()
    }
}

impl LeafLogger for StructuredLogger {
    #[track_caller]
    fn debug(&self, args: &[&dyn fmt::Display]) {
        self.log(Level::Debug, Location::caller(), args);
    }

    #[track_caller]
    fn debugf(&self, args: fmt::Arguments<'_>) {
        self.logf(Level::Debug, Location::caller(), args);
    }

    #[track_caller]
    fn debugw(&self, msg: &str, keys_and_values: &[Value]) {
        self.logw(Level::Debug, Location::caller(), msg, keys_and_values);
    }

    #[track_caller]
    fn info(&self, args: &[&dyn fmt::Display]) {
        self.log(Level::Info, Location::caller(), args);
    }

    #[track_caller]
    fn infof(&self, args: fmt::Arguments<'_>) {
        self.logf(Level::Info, Location::caller(), args);
    }

    #[track_caller]
    fn infow(&self, msg: &str, keys_and_values: &[Value]) {
        self.logw(Level::Info, Location::caller(), msg, keys_and_values);
    }

    #[track_caller]
    fn warn(&self, args: &[&dyn fmt::Display]) {
        self.log(Level::Warn, Location::caller(), args);
    }

    #[track_caller]
    fn warnf(&self, args: fmt::Arguments<'_>) {
        self.logf(Level::Warn, Location::caller(), args);
    }

    #[track_caller]
    fn warnw(&self, msg: &str, keys_and_values: &[Value]) {
        self.logw(Level::Warn, Location::caller(), msg, keys_and_values);
    }

    #[track_caller]
    fn error(&self, args: &[&dyn fmt::Display]) {
        self.log(Level::Error, Location::caller(), args);
    }

    #[track_caller]
    fn errorf(&self, args: fmt::Arguments<'_>) {
        self.logf(Level::Error, Location::caller(), args);
    }

    #[track_caller]
    fn errorw(&self, msg: &str, keys_and_values: &[Value]) {
        self.logw(Level::Error, Location::caller(), msg, keys_and_values);
    }

    fn set_level(&self, level: &str) {
        self.engine.set_level(Level::parse_or_default(level));
    }

    fn sync(&self) -> Result<()> {
        self.engine.flush().map_err(LoggerError::Sync)
    }
}

impl Logger for StructuredLogger {
    fn named(self: Arc<Self>, name: &str) -> SharedLogger {
        Arc::new(self.child_named(name))
    }

    #[track_caller]
    fn with(self: Arc<Self>, keys_and_values: &[Value]) -> SharedLogger {
        let sweetened = sweeten(keys_and_values);
        self.report(&sweetened, Location::caller());
        Arc::new(self.child_with(sweetened.fields))
    }

    fn with_tracing_params(self: Arc<Self>, ctx: &Context) -> SharedLogger {
        match tracing_properties(ctx) {
            Some(props) => {
                let value = serde_json::to_value(props).unwrap_or_default();
                Arc::new(self.child_with(vec![(TRACING_PROPERTIES_KEY.to_string(), value)]))
            }
            None => self,
        }
    }

    fn as_dispatch(&self) -> Option<&Dispatch> {
        Some(self.engine.dispatch())
    }

    fn into_leaf(self: Arc<Self>) -> Arc<dyn LeafLogger> {
        self
    }
}
