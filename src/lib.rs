//! Structured logging facade.
//!
//! [`Logger`] and [`LeafLogger`] are the interfaces consumers depend on.
//! [`StructuredLogger`] writes JSON lines through a `tracing` dispatch and
//! [`NoopLogger`] discards everything. Tracing identifiers travel on a
//! request [`Context`] via [`attach_tracing`] and [`extract_tracing`].

pub mod config;
pub mod error;
pub mod level;
pub mod logger;
pub mod logging;
pub mod observability;

pub use config::{LogOutput, LoggerConfig};
pub use error::{LoggerError, ParseLevelError, Result};
pub use level::Level;
pub use logger::structured::TRACING_PROPERTIES_KEY;
pub use logger::{new, LeafLogger, Logger, NoopLogger, SharedLogger, StructuredLogger};
pub use observability::{
    attach_tracing, extract_tracing, tracing_properties, Context, Params, TracingProperties,
};
