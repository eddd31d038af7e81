use crate::config::GeneralConfig;
use anyhow::Result;
use reqwest::Client;
use std::time::Duration;

const CONNECTION_TIMEOUT: Duration = Duration::from_secs(10);

pub struct PlexClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl PlexClient {
    /// Build a client for `plex_server`, if one is configured.
    pub fn from_config(config: &GeneralConfig) -> Option<Self> {
        let server = config.plex_server.as_deref()?.trim();
        if server.is_empty() {
            return None;
        }
        Some(Self::new(server, config.plex_token.clone()))
    }

    /// `server` is `host:port`; a full `http(s)://` URL is accepted as well.
    pub fn new(server: &str, token: Option<String>) -> Self {
        let client = Client::builder()
            .timeout(CONNECTION_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to build HTTP client: {}", e);
                Client::new()
            });

        let server = server.trim_end_matches('/');
        let base_url = if server.starts_with("http://") || server.starts_with("https://") {
            server.to_string()
        } else {
            format!("http://{}", server)
        };

        Self {
            client,
            base_url,
            token,
        }
    }

    /// Ask Plex to rescan every library section.
    pub async fn refresh_library(&self) -> Result<()> {
        let url = format!("{}/library/sections/all/refresh", self.base_url);

        let mut request = self.client.get(&url);
        if let Some(token) = &self.token {
            request = request.header("X-Plex-Token", token);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Plex refresh failed ({}): {}", status, body);
        }

        Ok(())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}
