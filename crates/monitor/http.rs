use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Status and raw body of a completed GET request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("failed to build http client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("request to {url} timed out")]
    Timeout { url: String },
    #[error("request to {url} failed: {reason}")]
    Transport { url: String, reason: String },
}

/// Transport used by the endpoint probe and the fetcher.
///
/// Production code uses [`ReqwestClient`]; tests substitute scripted doubles to trace which
/// URLs were requested.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn get(&self, url: &Url) -> Result<HttpResponse, HttpError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    /// Every request made through this client fails once `timeout` elapses.
    pub fn new(timeout: Duration) -> Result<Self, HttpError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(HttpError::Client)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn get(&self, url: &Url) -> Result<HttpResponse, HttpError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|error| classify(url, error))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|error| classify(url, error))?;

        Ok(HttpResponse {
            status,
            body: body.to_vec(),
        })
    }
}

fn classify(url: &Url, error: reqwest::Error) -> HttpError {
    if error.is_timeout() {
        HttpError::Timeout {
            url: url.to_string(),
        }
    } else {
        HttpError::Transport {
            url: url.to_string(),
            reason: error.to_string(),
        }
    }
}

/// Joins `path` onto `base` and appends `query` pairs, keeping any path prefix of `base`
/// (e.g. a REST API mounted under `/api`).
pub fn endpoint_url(base: &Url, path: &str, query: &[(&str, &str)]) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(&format!(
        "{}/{}",
        base.as_str().trim_end_matches('/'),
        path.trim_start_matches('/')
    ))?;
    if !query.is_empty() {
        url.query_pairs_mut().extend_pairs(query);
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_paths_without_doubling_slashes() -> Result<(), url::ParseError> {
        let base = Url::parse("https://api.example.com/rest/")?;
        let url = endpoint_url(&base, "/cosmos/slashing/v1beta1/params", &[])?;
        assert_eq!(
            url.as_str(),
            "https://api.example.com/rest/cosmos/slashing/v1beta1/params"
        );
        Ok(())
    }

    #[test]
    fn encodes_pagination_keys() -> Result<(), url::ParseError> {
        let base = Url::parse("http://localhost:1317")?;
        let url = endpoint_url(
            &base,
            "cosmos/staking/v1beta1/validators",
            &[("pagination.limit", "2"), ("pagination.key", "FPz+/w==")],
        )?;
        assert_eq!(
            url.as_str(),
            "http://localhost:1317/cosmos/staking/v1beta1/validators?pagination.limit=2&pagination.key=FPz%2B%2Fw%3D%3D"
        );
        let key = url
            .query_pairs()
            .find(|(name, _)| name == "pagination.key")
            .map(|(_, value)| value.into_owned());
        assert_eq!(key.as_deref(), Some("FPz+/w=="));
        Ok(())
    }
}
