pub mod plex;

pub use plex::PlexClient;

use crate::config::Config;

/// Media servers told about finished runs.
pub struct NotificationManager {
    plex: Option<PlexClient>,
}

impl NotificationManager {
    pub fn new(config: &Config) -> Self {
        Self {
            plex: PlexClient::from_config(&config.config),
        }
    }

    /// Notify all configured targets that a run finished.
    /// Errors are logged, never propagated.
    pub async fn notify_run_completed(&self) {
        if let Some(plex) = &self.plex {
            match plex.refresh_library().await {
                Ok(()) => tracing::info!("Plex library refresh triggered at {}", plex.base_url()),
                Err(e) => tracing::warn!("Failed to notify Plex at {}: {}", plex.base_url(), e),
            }
        }
    }

    pub fn has_targets(&self) -> bool {
        self.plex.is_some()
    }
}
