use crate::http::{HttpClient, HttpError, endpoint_url};
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

/// Why the primary endpoint was passed over for this cycle.
#[derive(Debug, Error)]
pub enum EndpointUnreachable {
    #[error("invalid probe url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("probe of {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: HttpError,
    },
    #[error("probe of {url} returned HTTP {status}")]
    Status { url: String, status: u16 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedEndpoint {
    pub url: Url,
    /// `true` when the reserve endpoint was chosen because the primary failed its probe.
    pub degraded: bool,
}

#[derive(Debug, Clone)]
pub struct EndpointSelector {
    primary: Url,
    reserve: Url,
    probe_path: Option<String>,
}

impl EndpointSelector {
    pub fn new(primary: Url, reserve: Url, probe_path: Option<String>) -> Self {
        Self {
            primary,
            reserve,
            probe_path,
        }
    }

    pub fn primary(&self) -> &Url {
        &self.primary
    }

    pub fn reserve(&self) -> &Url {
        &self.reserve
    }

    pub fn probe_url(&self) -> Result<Url, url::ParseError> {
        match &self.probe_path {
            Some(path) => endpoint_url(&self.primary, path, &[]),
            None => Ok(self.primary.clone()),
        }
    }

    /// Probes the primary endpoint once and falls back to the reserve on any failure.
    ///
    /// The reserve itself is never probed: if it is down too, the fetches that follow fail
    /// and abort the cycle.
    pub async fn select(&self, client: &dyn HttpClient) -> SelectedEndpoint {
        match self.probe(client).await {
            Ok(()) => {
                debug!(endpoint = %self.primary, "primary endpoint is live");
                SelectedEndpoint {
                    url: self.primary.clone(),
                    degraded: false,
                }
            }
            Err(error) => {
                warn!(
                    primary = %self.primary,
                    reserve = %self.reserve,
                    error = %error,
                    "primary endpoint unreachable, running in degraded mode"
                );
                SelectedEndpoint {
                    url: self.reserve.clone(),
                    degraded: true,
                }
            }
        }
    }

    async fn probe(&self, client: &dyn HttpClient) -> Result<(), EndpointUnreachable> {
        let url = self.probe_url()?;
        let response = client
            .get(&url)
            .await
            .map_err(|source| EndpointUnreachable::Transport {
                url: url.to_string(),
                source,
            })?;

        if !response.is_ok() {
            return Err(EndpointUnreachable::Status {
                url: url.to_string(),
                status: response.status,
            });
        }
        Ok(())
    }
}
