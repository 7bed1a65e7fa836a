use std::time::{SystemTime, UNIX_EPOCH};
use tracing::info;

/// Print a short banner so it is easy to see which test is running in CI logs.
pub fn announce(name: &str, description: &str) {
    let ts = SystemTime::now().duration_since(UNIX_EPOCH).ok();
    match ts {
        Some(d) => info!("[TEST] {name}: {description} (ts={})", d.as_secs()),
        None => info!("[TEST] {name}: {description}"),
    }
}
