use crate::fetcher::{DEFAULT_SIGNING_INFOS_PAGE_LIMIT, DEFAULT_VALIDATORS_PAGE_LIMIT};
use std::time::Duration;
use thiserror::Error;
use url::Url;
use valwatch_common::{AddressError, DEFAULT_VALCONS_PREFIX, validate_prefix};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(240);
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorConfig {
    pub primary_url: Url,
    pub reserve_url: Url,
    /// Path probed on the primary endpoint; the base URL itself when `None`.
    pub probe_path: Option<String>,
    pub poll_interval: Duration,
    pub http_timeout: Duration,
    pub validators_page_limit: u32,
    pub signing_infos_page_limit: u32,
    pub valcons_prefix: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be greater than zero")]
    Zero { name: &'static str },
    #[error("{name} must be an http(s) url, got {url}")]
    UnsupportedScheme { name: &'static str, url: String },
    #[error("invalid probe path {path:?}: {source}")]
    InvalidProbePath {
        path: String,
        #[source]
        source: url::ParseError,
    },
    #[error(transparent)]
    InvalidPrefix(#[from] AddressError),
}

impl MonitorConfig {
    pub fn new(primary_url: Url, reserve_url: Url) -> Self {
        Self {
            primary_url,
            reserve_url,
            probe_path: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
            http_timeout: DEFAULT_HTTP_TIMEOUT,
            validators_page_limit: DEFAULT_VALIDATORS_PAGE_LIMIT,
            signing_infos_page_limit: DEFAULT_SIGNING_INFOS_PAGE_LIMIT,
            valcons_prefix: DEFAULT_VALCONS_PREFIX.to_owned(),
        }
    }

    pub fn with_probe_path(mut self, probe_path: Option<String>) -> Self {
        self.probe_path = probe_path.filter(|path| !path.trim().is_empty());
        self
    }

    pub fn with_timings(mut self, poll_interval: Duration, http_timeout: Duration) -> Self {
        self.poll_interval = poll_interval;
        self.http_timeout = http_timeout;
        self
    }

    pub fn with_page_limits(mut self, validators_page_limit: u32, signing_infos_page_limit: u32) -> Self {
        self.validators_page_limit = validators_page_limit;
        self.signing_infos_page_limit = signing_infos_page_limit;
        self
    }

    pub fn with_valcons_prefix(mut self, valcons_prefix: String) -> Self {
        self.valcons_prefix = valcons_prefix;
        self
    }

    /// Primary and reserve may point at the same URL.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_scheme("primary url", &self.primary_url)?;
        check_scheme("reserve url", &self.reserve_url)?;

        if self.poll_interval.is_zero() {
            return Err(ConfigError::Zero {
                name: "poll interval",
            });
        }
        if self.http_timeout.is_zero() {
            return Err(ConfigError::Zero {
                name: "http timeout",
            });
        }
        if self.validators_page_limit == 0 {
            return Err(ConfigError::Zero {
                name: "validators page limit",
            });
        }
        if self.signing_infos_page_limit == 0 {
            return Err(ConfigError::Zero {
                name: "signing infos page limit",
            });
        }
        if let Some(path) = &self.probe_path {
            crate::http::endpoint_url(&self.primary_url, path, &[]).map_err(|source| {
                ConfigError::InvalidProbePath {
                    path: path.clone(),
                    source,
                }
            })?;
        }

        validate_prefix(&self.valcons_prefix)?;
        Ok(())
    }
}

fn check_scheme(name: &'static str, url: &Url) -> Result<(), ConfigError> {
    match url.scheme() {
        "http" | "https" => Ok(()),
        _ => Err(ConfigError::UnsupportedScheme {
            name,
            url: url.to_string(),
        }),
    }
}
