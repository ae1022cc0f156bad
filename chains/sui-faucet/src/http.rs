//! Proxied HTTP clients, one per proxy endpoint, built lazily and reused.

use core_logic::{NetworkError, Proxy};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;

#[derive(Debug)]
pub struct ProxiedClients {
    timeout: Duration,
    cache: RwLock<HashMap<String, reqwest::Client>>,
}

impl ProxiedClients {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn client_for(&self, proxy: &Proxy) -> Result<reqwest::Client, NetworkError> {
        let endpoint = proxy.endpoint();

        {
            let read = self.cache.read().await;
            if let Some(client) = read.get(&endpoint) {
                return Ok(client.clone());
            }
        }

        let proxy_config =
            reqwest::Proxy::all(&endpoint).map_err(|e| NetworkError::ConnectionRefused {
                endpoint: proxy.display_host().to_string(),
                reason: format!("bad proxy config: {}", e),
            })?;

        let client = reqwest::Client::builder()
            .proxy(proxy_config)
            .timeout(self.timeout)
            .pool_idle_timeout(Duration::from_secs(30))
            .pool_max_idle_per_host(2)
            .build()
            .map_err(|e| NetworkError::ConnectionRefused {
                endpoint: proxy.display_host().to_string(),
                reason: format!("failed to build client: {}", e),
            })?;

        let mut write = self.cache.write().await;
        Ok(write.entry(endpoint).or_insert(client).clone())
    }
}

/// Maps a reqwest failure onto the network error taxonomy.
pub fn classify_reqwest_error(
    err: reqwest::Error,
    endpoint: &str,
    timeout: Duration,
) -> NetworkError {
    if err.is_timeout() {
        NetworkError::Timeout {
            timeout_ms: timeout.as_millis() as u64,
            endpoint: endpoint.to_string(),
        }
    } else if err.is_connect() {
        NetworkError::ConnectionRefused {
            endpoint: endpoint.to_string(),
            reason: err.to_string(),
        }
    } else if let Some(status) = err.status() {
        NetworkError::HttpError {
            status_code: status.as_u16(),
            endpoint: endpoint.to_string(),
        }
    } else {
        NetworkError::InvalidResponse {
            endpoint: endpoint.to_string(),
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_logic::ProxyPool;

    #[tokio::test]
    async fn test_client_is_cached_per_endpoint() {
        let pool = ProxyPool::load("127.0.0.1:9@u:p\n127.0.0.2:9@u:p", "inline").unwrap();
        let clients = ProxiedClients::new(Duration::from_secs(5));

        clients.client_for(pool.acquire(0)).await.unwrap();
        clients.client_for(pool.acquire(0)).await.unwrap();
        clients.client_for(pool.acquire(1)).await.unwrap();

        assert_eq!(clients.cache.read().await.len(), 2);
    }
}
