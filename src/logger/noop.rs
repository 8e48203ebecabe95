use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::Dispatch;

use super::{LeafLogger, Logger, SharedLogger};
use crate::error::Result;
use crate::observability::Context;

/// Logger that discards everything.
///
/// Derivation returns the receiver, since there is no state to diverge.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopLogger;

impl NoopLogger {
    pub fn shared() -> SharedLogger {
        Arc::new(NoopLogger)
    }
}

impl LeafLogger for NoopLogger {
    fn debug(&self, _args: &[&dyn fmt::Display]) {}
    fn debugf(&self, _args: fmt::Arguments<'_>) {}
    fn debugw(&self, _msg: &str, _keys_and_values: &[Value]) {}

    fn info(&self, _args: &[&dyn fmt::Display]) {}
    fn infof(&self, _args: fmt::Arguments<'_>) {}
    fn infow(&self, _msg: &str, _keys_and_values: &[Value]) {}

    fn warn(&self, _args: &[&dyn fmt::Display]) {}
    fn warnf(&self, _args: fmt::Arguments<'_>) {}
    fn warnw(&self, _msg: &str, _keys_and_values: &[Value]) {}

    fn error(&self, _args: &[&dyn fmt::Display]) {}
    fn errorf(&self, _args: fmt::Arguments<'_>) {}
    fn errorw(&self, _msg: &str, _keys_and_values: &[Value]) {}

    fn set_level(&self, _level: &str) {}

    fn sync(&self) -> Result<()> {
        Ok(())
    }
}

impl Logger for NoopLogger {
    fn named(self: Arc<Self>, _name: &str) -> SharedLogger {
        self
    }

    fn with(self: Arc<Self>, _keys_and_values: &[Value]) -> SharedLogger {
        self
    }

    fn with_tracing_params(self: Arc<Self>, _ctx: &Context) -> SharedLogger {
        self
    }

    fn as_dispatch(&self) -> Option<&Dispatch> {
        None
    }

    fn into_leaf(self: Arc<Self>) -> Arc<dyn LeafLogger> {
        self
    }
}
