//! Walks one request through the facade: root logger, tracing identifiers
//! from an upstream caller, a leaf logger for the handler, and the
//! identifiers handed on to the next hop.
//!
//! Run with `NDAU_ENV_NAME=dev cargo run --example request_flow`.

use std::sync::Arc;

use anyhow::Context as _;
use ndau_logger::{attach_tracing, extract_tracing, Context, LeafLogger, Params};
use serde_json::json;

fn handle(log: Arc<dyn LeafLogger>, order_id: u64) {
    log.infow("order accepted", &[json!("order_id"), json!(order_id)]);
    log.debugf(format_args!("order {} routed to shard {}", order_id, order_id % 4));
}

fn main() -> anyhow::Result<()> {
    let level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "debug".to_string());
    let logger = ndau_logger::new("demo", &level).context("building logger")?;

    let inbound = Params::from([("k_cloudeventid".to_string(), json!("upstream-event"))]);
    let ctx = attach_tracing(&Context::background(), Some(&inbound));

    let request_log = logger.clone().named("orders").with_tracing_params(&ctx);
    handle(request_log.into_leaf(), 1042);

    let outbound = extract_tracing(&ctx, None);
    logger.infow("forwarding", &[json!("params"), json!(outbound)]);

    if let Err(e) = logger.sync() {
        eprintln!("failed to flush logs: {}", e);
    }
    Ok(())
}
