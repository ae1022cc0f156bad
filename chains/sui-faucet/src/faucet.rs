//! Faucet Client
//!
//! Requests gas from the public faucet through one proxy. A 429 puts the proxy
//! in the limited state, then the same request is re-sent through the same
//! proxy once the server's `retry-after` has elapsed.

use crate::http::{classify_reqwest_error, ProxiedClients};
use async_trait::async_trait;
use core_logic::{MetricsCollector, NetworkError, Proxy};
use reqwest::header::RETRY_AFTER;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Result of one funding request
#[derive(Debug, Clone)]
pub enum FaucetOutcome {
    /// Total MIST transferred
    Funded(u64),
    /// Gave up after the rate-limit ceiling; carries the last retry-after
    RateLimited(u64),
    TransientError(NetworkError),
}

impl FaucetOutcome {
    pub fn is_funded(&self) -> bool {
        matches!(self, FaucetOutcome::Funded(_))
    }

    /// Why the request did not fund, `None` when it did.
    pub fn failure(&self) -> Option<NetworkError> {
        match self {
            FaucetOutcome::Funded(_) => None,
            FaucetOutcome::RateLimited(retry_after) => Some(NetworkError::RateLimited {
                endpoint: "faucet".to_string(),
                retry_after: *retry_after,
            }),
            FaucetOutcome::TransientError(e) => Some(e.clone()),
        }
    }
}

/// Raw faucet reply as seen by the state machine
#[derive(Debug, Clone)]
pub struct FaucetReply {
    pub status: u16,
    /// Parsed `retry-after` seconds, if the header was present and numeric
    pub retry_after: Option<u64>,
    pub body: String,
}

/// One HTTP exchange with the faucet through a proxy.
#[async_trait]
pub trait FaucetTransport: Send + Sync {
    async fn post(&self, proxy: &Proxy, payload: &Value) -> Result<FaucetReply, NetworkError>;
}

pub struct HttpFaucetTransport {
    faucet_url: String,
    clients: ProxiedClients,
}

impl HttpFaucetTransport {
    pub fn new(faucet_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            faucet_url: faucet_url.into(),
            clients: ProxiedClients::new(timeout),
        }
    }
}

#[async_trait]
impl FaucetTransport for HttpFaucetTransport {
    async fn post(&self, proxy: &Proxy, payload: &Value) -> Result<FaucetReply, NetworkError> {
        let client = self.clients.client_for(proxy).await?;

        let response = client
            .post(&self.faucet_url)
            .json(payload)
            .send()
            .await
            .map_err(|e| classify_reqwest_error(e, &self.faucet_url, self.clients.timeout()))?;

        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());

        let body = response
            .text()
            .await
            .map_err(|e| classify_reqwest_error(e, &self.faucet_url, self.clients.timeout()))?;

        Ok(FaucetReply {
            status,
            retry_after,
            body,
        })
    }
}

#[derive(Debug, Clone)]
pub struct FaucetSettings {
    /// Sequential requests per `top_up`
    pub top_up_calls: u32,
    pub max_rate_limit_retries: u32,
    pub max_rate_limit_wait: Duration,
    pub default_retry_after: Duration,
}

impl Default for FaucetSettings {
    fn default() -> Self {
        Self {
            top_up_calls: 3,
            max_rate_limit_retries: 10,
            max_rate_limit_wait: Duration::from_secs(7200),
            default_retry_after: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FaucetResponse {
    #[serde(default)]
    transferred_gas_objects: Vec<GasCoin>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GasCoin {
    #[serde(default)]
    amount: u64,
}

pub struct FaucetClient {
    transport: Arc<dyn FaucetTransport>,
    settings: FaucetSettings,
    metrics: Arc<MetricsCollector>,
}

impl FaucetClient {
    pub fn new(
        transport: Arc<dyn FaucetTransport>,
        settings: FaucetSettings,
        metrics: Arc<MetricsCollector>,
    ) -> Self {
        Self {
            transport,
            settings,
            metrics,
        }
    }

    pub fn request_payload(address: &str) -> Value {
        json!({ "FixedAmountRequest": { "recipient": address } })
    }

    /// One funding request, including the 429 wait-and-resend loop.
    pub async fn request_funds(&self, proxy: &Proxy, address: &str) -> FaucetOutcome {
        let payload = Self::request_payload(address);
        let mut resends = 0u32;
        let mut waited = Duration::ZERO;

        info!("Requesting SUI from faucet with proxy {}", proxy.display_host());

        loop {
            self.metrics.record_faucet_request();

            let reply = match self.transport.post(proxy, &payload).await {
                Ok(reply) => reply,
                Err(e) => {
                    warn!("Faucet request via {} failed: {}", proxy.display_host(), e);
                    return FaucetOutcome::TransientError(e);
                }
            };

            match reply.status {
                429 => {
                    let retry_after = reply
                        .retry_after
                        .map(Duration::from_secs)
                        .unwrap_or(self.settings.default_retry_after);
                    proxy.mark_limited(retry_after);

                    if resends >= self.settings.max_rate_limit_retries
                        || waited.saturating_add(retry_after) > self.settings.max_rate_limit_wait
                    {
                        self.metrics.record_rate_limit(Duration::ZERO);
                        warn!(
                            "Proxy {} still rate limited after {} resends ({}s waited), giving up",
                            proxy.display_host(),
                            resends,
                            waited.as_secs()
                        );
                        return FaucetOutcome::RateLimited(retry_after.as_secs());
                    }

                    warn!(
                        "Proxy {} rate limited, need to wait {} seconds",
                        proxy.display_host(),
                        retry_after.as_secs()
                    );
                    self.metrics.record_rate_limit(retry_after);
                    tokio::time::sleep(retry_after).await;
                    waited = waited.saturating_add(retry_after);
                    resends += 1;
                }
                status if (200..300).contains(&status) => {
                    return self.interpret_success(status, &reply.body);
                }
                status => {
                    warn!("Faucet request status: {} FAILED", status);
                    return FaucetOutcome::TransientError(NetworkError::HttpError {
                        status_code: status,
                        endpoint: "faucet".to_string(),
                    });
                }
            }
        }
    }

    fn interpret_success(&self, status: u16, body: &str) -> FaucetOutcome {
        if body.trim().is_empty() {
            warn!("Faucet request status: {} with empty body", status);
            return FaucetOutcome::TransientError(NetworkError::InvalidResponse {
                endpoint: "faucet".to_string(),
                reason: "empty body".to_string(),
            });
        }

        // Bodies that are not the usual JSON shape still count as funded
        let parsed: FaucetResponse = serde_json::from_str(body).unwrap_or_default();
        if let Some(error) = parsed.error.filter(|e| !e.is_empty()) {
            warn!("Faucet request status: {} FAILED ({})", status, error);
            return FaucetOutcome::TransientError(NetworkError::InvalidResponse {
                endpoint: "faucet".to_string(),
                reason: error,
            });
        }

        let amount = parsed
            .transferred_gas_objects
            .iter()
            .map(|coin| coin.amount)
            .sum();
        info!("Faucet request status: {} Funded {}", status, amount);
        FaucetOutcome::Funded(amount)
    }

    /// `top_up_calls` sequential requests for one address. The last outcome
    /// decides; a funded result carries the total of every funded call.
    pub async fn top_up(&self, proxy: &Proxy, address: &str) -> FaucetOutcome {
        let mut total = 0u64;
        let mut last = None;

        for call in 1..=self.settings.top_up_calls {
            let outcome = self.request_funds(proxy, address).await;
            if let FaucetOutcome::Funded(amount) = outcome {
                total += amount;
            }
            debug!(
                "Top-up call {}/{}: {:?}",
                call, self.settings.top_up_calls, outcome
            );
            last = Some(outcome);
        }

        match last {
            Some(FaucetOutcome::Funded(_)) => FaucetOutcome::Funded(total),
            Some(other) => other,
            None => FaucetOutcome::TransientError(NetworkError::InvalidResponse {
                endpoint: "faucet".to_string(),
                reason: "no top-up calls configured".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> FaucetClient {
        struct Unused;
        #[async_trait]
        impl FaucetTransport for Unused {
            async fn post(&self, _: &Proxy, _: &Value) -> Result<FaucetReply, NetworkError> {
                unreachable!()
            }
        }
        FaucetClient::new(
            Arc::new(Unused),
            FaucetSettings::default(),
            Arc::new(MetricsCollector::default()),
        )
    }

    #[test]
    fn test_failure_maps_to_network_error() {
        assert!(FaucetOutcome::Funded(5).failure().is_none());
        assert!(matches!(
            FaucetOutcome::RateLimited(30).failure(),
            Some(NetworkError::RateLimited { retry_after: 30, .. })
        ));
    }

    #[test]
    fn test_payload_shape() {
        let payload = FaucetClient::request_payload("0xabc");
        assert_eq!(payload["FixedAmountRequest"]["recipient"], "0xabc");
    }

    #[test]
    fn test_amount_is_summed() {
        let body = r#"{"transferredGasObjects":[{"amount":1000,"id":"a"},{"amount":2500,"id":"b"}],"error":null}"#;
        assert!(matches!(
            client().interpret_success(201, body),
            FaucetOutcome::Funded(3500)
        ));
    }

    #[test]
    fn test_unknown_body_is_funded_with_zero() {
        assert!(matches!(
            client().interpret_success(200, r#"{"id":"abc"}"#),
            FaucetOutcome::Funded(0)
        ));
        assert!(matches!(
            client().interpret_success(200, "ok"),
            FaucetOutcome::Funded(0)
        ));
    }

    #[test]
    fn test_empty_body_and_error_field_are_transient() {
        assert!(matches!(
            client().interpret_success(200, "  "),
            FaucetOutcome::TransientError(NetworkError::InvalidResponse { .. })
        ));
        assert!(matches!(
            client().interpret_success(200, r#"{"error":"faucet dry"}"#),
            FaucetOutcome::TransientError(NetworkError::InvalidResponse { .. })
        ));
    }
}
