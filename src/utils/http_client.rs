use reqwest::Client;
use std::time::Duration;

use crate::utils::AppResult;

/// App user-agent string derived from Cargo.toml version at compile time.
pub const APP_USER_AGENT: &str = concat!("Venti/", env!("CARGO_PKG_VERSION"));

/// Client for reachability probes. Per-request timeouts come from the probe
/// deadline, this only bounds connection setup.
pub fn create_http_client() -> AppResult<Client> {
    let client = Client::builder()
        .user_agent(APP_USER_AGENT)
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .pool_max_idle_per_host(2)
        .tcp_nodelay(true)
        .build()?;
    Ok(client)
}
