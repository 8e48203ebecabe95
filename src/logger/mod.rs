//! Logger capability sets.
//!
//! [`Logger`] is the full interface. [`LeafLogger`] is the same minus every
//! operation that derives a new logger; hand it to code that must not use
//! its logger as a template, e.g. after tracing identifiers were bound, so
//! the identifiers cannot be attached twice down a call chain.

pub mod noop;
pub mod structured;
mod sugar;

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::Dispatch;

use crate::error::Result;
use crate::observability::Context;

pub use noop::NoopLogger;
pub use structured::StructuredLogger;

pub type SharedLogger = Arc<dyn Logger>;

/// Leveled logging without derivation.
///
/// Each level comes in three forms: plain (`info`) concatenates its
/// arguments with no separator, formatted (`infof`) takes `format_args!`
/// output, and structured (`infow`) takes a message plus a flat,
/// alternating sequence of keys and values.
///
/// `info(&[&1, &2])` logs `12`; put spaces in the arguments where they are
/// wanted.
pub trait LeafLogger: Send + Sync {
    #[track_caller]
    fn debug(&self, args: &[&dyn fmt::Display]);
    #[track_caller]
    fn debugf(&self, args: fmt::Arguments<'_>);
    #[track_caller]
    fn debugw(&self, msg: &str, keys_and_values: &[Value]);

    #[track_caller]
    fn info(&self, args: &[&dyn fmt::Display]);
    #[track_caller]
    fn infof(&self, args: fmt::Arguments<'_>);
    #[track_caller]
    fn infow(&self, msg: &str, keys_and_values: &[Value]);

    #[track_caller]
    fn warn(&self, args: &[&dyn fmt::Display]);
    #[track_caller]
    fn warnf(&self, args: fmt::Arguments<'_>);
    #[track_caller]
    fn warnw(&self, msg: &str, keys_and_values: &[Value]);

    #[track_caller]
    fn error(&self, args: &[&dyn fmt::Display]);
    #[track_caller]
    fn errorf(&self, args: fmt::Arguments<'_>);
    #[track_caller]
    fn errorw(&self, msg: &str, keys_and_values: &[Value]);

    /// Set the minimum level. Unrecognized names select `info`; this never fails.
    fn set_level(&self, level: &str);

    /// Flush buffered output. Call once at shutdown.
    fn sync(&self) -> Result<()>;
}

pub trait Logger: LeafLogger {
    /// Child logger whose name is this one's with `name` appended, dot-joined.
    fn named(self: Arc<Self>, name: &str) -> SharedLogger;

    /// Child logger carrying additional key/value fields.
    #[track_caller]
    fn with(self: Arc<Self>, keys_and_values: &[Value]) -> SharedLogger;

    /// Child logger carrying the tracing identifiers found on `ctx` under a
    /// single `Properties` field; the receiver itself when there are none.
    fn with_tracing_params(self: Arc<Self>, ctx: &Context) -> SharedLogger;

    /// The engine's native dispatch, for features this interface lacks.
    ///
    /// Event fields named `_logger`, `_caller` and `_fields` are reserved
    /// for the facade's own records.
    fn as_dispatch(&self) -> Option<&Dispatch>;

    /// Reduced view of this logger that cannot derive children.
    fn into_leaf(self: Arc<Self>) -> Arc<dyn LeafLogger>;
}

/// Build a JSON logger named `name` writing to stderr.
pub fn new(name: &str, level: &str) -> Result<SharedLogger> {
    Ok(Arc::new(StructuredLogger::new(name, level)?))
}
