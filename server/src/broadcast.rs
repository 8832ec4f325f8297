//! Fan-out of one line to every registered client

use crate::registry::ClientRegistry;
use log::warn;

/// Pushes `line` to every sink currently in the registry
///
/// Delivery is fire-and-forget. A sink whose connection is already gone is
/// skipped with a warning and the remaining sinks still get the line.
/// Returns how many sinks accepted it.
pub async fn broadcast(registry: &ClientRegistry, line: &str) -> usize {
    let sinks = registry.snapshot().await;
    let mut delivered = 0;

    for sink in &sinks {
        match sink.send_line(line) {
            Ok(()) => delivered += 1,
            Err(_) => warn!("Failed to deliver line to sink {}, skipping", sink.id()),
        }
    }

    delivered
}
