//! HTTP REST client for the KuCoin API.
//!
//! The feed only needs one REST call: the public bullet handshake that
//! hands out a WebSocket token and the endpoint to connect it to.
//!
//! # Example
//!
//! ```rust,no_run
//! use kucoin_l2::config::{Config, Market};
//! use kucoin_l2::client::RestClient;
//!
//! # async fn example() -> kucoin_l2::Result<()> {
//! let config = Config::new(Market::Spot);
//! let rest = RestClient::new(&config)?;
//! let bullet = rest.fetch_token().await?;
//! println!("connect to {} with token {}", bullet.endpoint, bullet.token);
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::Error;

/// API code signalling success in KuCoin response envelopes
const SUCCESS_CODE: &str = "200000";

/// Attempts made before giving up on the bullet handshake
const TOKEN_ATTEMPTS: u32 = 10;

/// Delay between bullet handshake attempts
const TOKEN_RETRY_DELAY: Duration = Duration::from_millis(500);

/// Connection details handed out by the bullet endpoint
#[derive(Debug, Clone)]
pub struct WsToken {
    /// WebSocket endpoint to connect to
    pub endpoint: String,
    /// Token to pass in the connection URL
    pub token: String,
    /// Interval at which the server expects application-level pings
    pub ping_interval: Duration,
}

#[derive(Debug, Deserialize)]
struct BulletResponse {
    code: String,
    #[serde(default)]
    msg: Option<String>,
    data: Option<BulletData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BulletData {
    token: String,
    instance_servers: Vec<InstanceServer>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InstanceServer {
    endpoint: String,
    #[serde(default = "default_ping_interval")]
    ping_interval: u64,
}

fn default_ping_interval() -> u64 {
    18_000
}

/// HTTP client for the KuCoin REST API
#[derive(Debug)]
pub struct RestClient {
    client: Client,
    base_url: String,
}

impl RestClient {
    /// Create a new REST client
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn new(config: &Config) -> Result<Self, Error> {
        let client = Client::builder().timeout(config.timeout()).build()?;

        Ok(Self {
            client,
            base_url: config.market().rest_base_url().to_string(),
        })
    }

    /// Request a WebSocket token from the public bullet endpoint.
    ///
    /// Transport failures are retried with a short delay; the token
    /// server is known to reject a fraction of requests under load.
    /// A well-formed response with a non-success code is not retried.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Api`] when the server answers with a failure
    /// code, and [`Error::Token`] when every attempt failed at the
    /// transport level or the response carried no instance servers.
    pub async fn fetch_token(&self) -> Result<WsToken, Error> {
        let url = format!("{}/api/v1/bullet-public", self.base_url);
        let mut last_error = String::new();

        for attempt in 0..TOKEN_ATTEMPTS {
            if attempt > 0 {
                tokio::time::sleep(TOKEN_RETRY_DELAY).await;
            }

            let response = match self.client.post(&url).send().await {
                Ok(response) => response,
                Err(e) => {
                    warn!(attempt, error = %e, "bullet request failed");
                    last_error = e.to_string();
                    continue;
                }
            };

            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    warn!(attempt, error = %e, "bullet response unreadable");
                    last_error = e.to_string();
                    continue;
                }
            };

            // Gateway errors come back as HTML; treat them like transport
            // failures rather than giving up.
            let bullet: BulletResponse = match serde_json::from_str(&body) {
                Ok(bullet) => bullet,
                Err(e) => {
                    warn!(attempt, error = %e, "bullet response not parseable");
                    last_error = e.to_string();
                    continue;
                }
            };
            if bullet.code != SUCCESS_CODE {
                return Err(Error::Api {
                    code: bullet.code,
                    message: bullet.msg.unwrap_or(body),
                });
            }

            let data = bullet
                .data
                .ok_or_else(|| Error::Token("bullet response carried no data".to_string()))?;
            let server = data
                .instance_servers
                .into_iter()
                .next()
                .ok_or_else(|| Error::Token("no instance servers offered".to_string()))?;

            debug!(endpoint = %server.endpoint, "acquired websocket token");
            return Ok(WsToken {
                endpoint: server.endpoint,
                token: data.token,
                ping_interval: Duration::from_millis(server.ping_interval),
            });
        }

        Err(Error::Token(format!(
            "no response after {TOKEN_ATTEMPTS} attempts: {last_error}"
        )))
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}
