//! Shared `reqwest::Client` instances, one per base URL and timeout.
//!
//! Reusing a client keeps connections alive across requests to the same
//! host instead of paying the connect cost on every tool call.

use lazy_static::lazy_static;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

lazy_static! {
    static ref HTTP_CLIENT_POOL: Mutex<HashMap<(String, u64), reqwest::Client>> =
        Mutex::new(HashMap::new());
}

/// Get or create the shared HTTP client for `base_url`.
///
/// `timeout` bounds each whole request; connecting is bounded by the same
/// value.
pub fn get_http_client(base_url: &str, timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
    let key = (base_url.to_string(), timeout.as_millis() as u64);
    let mut pool = match HTTP_CLIENT_POOL.lock() {
        Ok(pool) => pool,
        Err(poisoned) => poisoned.into_inner(),
    };

    if let Some(client) = pool.get(&key) {
        return Ok(client.clone());
    }

    let client = reqwest::ClientBuilder::new()
        .pool_idle_timeout(Some(Duration::from_secs(90)))
        .pool_max_idle_per_host(10)
        .tcp_keepalive(Some(Duration::from_secs(60)))
        .connect_timeout(timeout)
        .timeout(timeout)
        .build()?;

    log::debug!("Created pooled HTTP client for {}", base_url);
    pool.insert(key, client.clone());
    Ok(client)
}
