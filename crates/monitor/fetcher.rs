use crate::http::{HttpClient, HttpError, endpoint_url};
use serde::{Deserialize, de::DeserializeOwned};
use std::{collections::HashSet, sync::Arc};
use thiserror::Error;
use tracing::debug;
use url::Url;
use valwatch_common::{BondStatus, SigningInfo, ValidatorRecord};

pub const VALIDATORS_PATH: &str = "/cosmos/staking/v1beta1/validators";
pub const SIGNING_INFOS_PATH: &str = "/cosmos/slashing/v1beta1/signing_infos";
pub const SLASHING_PARAMS_PATH: &str = "/cosmos/slashing/v1beta1/params";

pub const DEFAULT_VALIDATORS_PAGE_LIMIT: u32 = 20_000;
pub const DEFAULT_SIGNING_INFOS_PAGE_LIMIT: u32 = 2_000;

const UNKNOWN_MONIKER: &str = "Unknown";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error(transparent)]
    Http(#[from] HttpError),
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("malformed response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid {field} {value:?} in response from {url}")]
    InvalidField {
        url: String,
        field: &'static str,
        value: String,
    },
    #[error("pagination of {url} returned an already visited next_key")]
    PaginationLoop { url: String },
    #[error("signed_blocks_window from {url} is zero")]
    EmptyWindow { url: String },
    #[error("invalid endpoint url: {0}")]
    Url(#[from] url::ParseError),
}

/// Everything one cycle needs from the chain, fetched from a single endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleInputs {
    pub validators: Vec<ValidatorRecord>,
    pub signing_infos: Vec<SigningInfo>,
    pub window_size: u64,
}

#[derive(Clone)]
pub struct ValidatorFetcher {
    client: Arc<dyn HttpClient>,
    validators_limit: u32,
    signing_infos_limit: u32,
}

impl ValidatorFetcher {
    pub fn new(client: Arc<dyn HttpClient>) -> Self {
        Self {
            client,
            validators_limit: DEFAULT_VALIDATORS_PAGE_LIMIT,
            signing_infos_limit: DEFAULT_SIGNING_INFOS_PAGE_LIMIT,
        }
    }

    pub fn with_page_limits(mut self, validators_limit: u32, signing_infos_limit: u32) -> Self {
        self.validators_limit = validators_limit;
        self.signing_infos_limit = signing_infos_limit;
        self
    }

    /// Fetches validators, signing infos and the window size concurrently. Fails as soon as
    /// any of the three fails; no partial inputs are ever returned.
    pub async fn fetch_cycle_inputs(&self, endpoint: &Url) -> Result<CycleInputs, FetchError> {
        let (validators, signing_infos, window_size) = tokio::try_join!(
            self.fetch_validators(endpoint),
            self.fetch_signing_infos(endpoint),
            self.fetch_window_size(endpoint),
        )?;

        Ok(CycleInputs {
            validators,
            signing_infos,
            window_size,
        })
    }

    pub async fn fetch_validators(&self, endpoint: &Url) -> Result<Vec<ValidatorRecord>, FetchError> {
        let wire = self
            .fetch_all_pages::<ValidatorsPage>(endpoint, VALIDATORS_PATH, self.validators_limit)
            .await?;
        wire.into_iter()
            .map(|validator| validator.into_record(endpoint))
            .collect()
    }

    pub async fn fetch_signing_infos(&self, endpoint: &Url) -> Result<Vec<SigningInfo>, FetchError> {
        let wire = self
            .fetch_all_pages::<SigningInfosPage>(
                endpoint,
                SIGNING_INFOS_PATH,
                self.signing_infos_limit,
            )
            .await?;
        wire.into_iter()
            .map(|info| info.into_signing_info(endpoint))
            .collect()
    }

    pub async fn fetch_window_size(&self, endpoint: &Url) -> Result<u64, FetchError> {
        let url = endpoint_url(endpoint, SLASHING_PARAMS_PATH, &[])?;
        let response: SlashingParamsResponse = self.get_json(&url).await?;
        let window = response
            .params
            .signed_blocks_window
            .parse_u64(&url, "signed_blocks_window")?;

        if window == 0 {
            return Err(FetchError::EmptyWindow {
                url: url.to_string(),
            });
        }
        Ok(window)
    }

    async fn fetch_all_pages<P: Page>(
        &self,
        endpoint: &Url,
        path: &str,
        limit: u32,
    ) -> Result<Vec<P::Item>, FetchError> {
        let limit = limit.to_string();
        let mut items = Vec::new();
        let mut next_key: Option<String> = None;
        let mut seen_keys: HashSet<String> = HashSet::new();
        let mut page_number = 0usize;

        loop {
            let mut query = vec![("pagination.limit", limit.as_str())];
            if let Some(key) = next_key.as_deref() {
                query.push(("pagination.key", key));
            }
            let url = endpoint_url(endpoint, path, &query)?;

            let page: P = self.get_json(&url).await?;
            let (page_items, page_next_key) = page.into_parts();
            page_number += 1;
            debug!(
                endpoint = %endpoint,
                path,
                page = page_number,
                items = page_items.len(),
                "fetched page"
            );
            items.extend(page_items);

            let Some(key) = page_next_key else {
                return Ok(items);
            };
            // Any key seen earlier in this fetch means the upstream is cycling.
            if !seen_keys.insert(key.clone()) {
                return Err(FetchError::PaginationLoop {
                    url: url.to_string(),
                });
            }
            next_key = Some(key);
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &Url) -> Result<T, FetchError> {
        let response = self.client.get(url).await?;
        if !response.is_ok() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: response.status,
            });
        }

        serde_json::from_slice(&response.body).map_err(|source| FetchError::Decode {
            url: url.to_string(),
            source,
        })
    }
}

trait Page: DeserializeOwned {
    type Item;

    /// Items of this page and the continuation key, `None` on the last page.
    fn into_parts(self) -> (Vec<Self::Item>, Option<String>);
}

#[derive(Debug, Default, Deserialize)]
struct Pagination {
    #[serde(default)]
    next_key: Option<String>,
}

impl Pagination {
    fn into_next_key(self) -> Option<String> {
        self.next_key.filter(|key| !key.is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct ValidatorsPage {
    validators: Vec<WireValidator>,
    #[serde(default)]
    pagination: Option<Pagination>,
}

impl Page for ValidatorsPage {
    type Item = WireValidator;

    fn into_parts(self) -> (Vec<WireValidator>, Option<String>) {
        let next_key = self.pagination.and_then(Pagination::into_next_key);
        (self.validators, next_key)
    }
}

#[derive(Debug, Deserialize)]
struct SigningInfosPage {
    info: Vec<WireSigningInfo>,
    #[serde(default)]
    pagination: Option<Pagination>,
}

impl Page for SigningInfosPage {
    type Item = WireSigningInfo;

    fn into_parts(self) -> (Vec<WireSigningInfo>, Option<String>) {
        let next_key = self.pagination.and_then(Pagination::into_next_key);
        (self.info, next_key)
    }
}

#[derive(Debug, Deserialize)]
struct WireValidator {
    operator_address: String,
    #[serde(default)]
    consensus_pubkey: Option<WirePubkey>,
    #[serde(default)]
    jailed: bool,
    status: BondStatus,
    #[serde(default)]
    description: Option<WireDescription>,
    #[serde(default)]
    commission: Option<WireCommission>,
}

#[derive(Debug, Deserialize)]
struct WirePubkey {
    #[serde(default)]
    key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireDescription {
    #[serde(default)]
    moniker: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireCommission {
    commission_rates: WireCommissionRates,
}

#[derive(Debug, Deserialize)]
struct WireCommissionRates {
    rate: String,
}

impl WireValidator {
    fn into_record(self, endpoint: &Url) -> Result<ValidatorRecord, FetchError> {
        let commission_rate = match self.commission {
            Some(commission) => parse_rate(&commission.commission_rates.rate, endpoint)?,
            None => 0.0,
        };
        let moniker = self
            .description
            .and_then(|description| description.moniker)
            .unwrap_or_else(|| UNKNOWN_MONIKER.to_owned());

        Ok(ValidatorRecord {
            operator_address: self.operator_address,
            moniker,
            status: self.status,
            jailed: self.jailed,
            commission_rate,
            consensus_pubkey: self.consensus_pubkey.and_then(|pubkey| pubkey.key),
        })
    }
}

fn parse_rate(raw: &str, endpoint: &Url) -> Result<f64, FetchError> {
    match raw.trim().parse::<f64>() {
        Ok(rate) if rate.is_finite() && rate >= 0.0 => Ok(rate),
        _ => Err(FetchError::InvalidField {
            url: endpoint.to_string(),
            field: "commission_rates.rate",
            value: raw.to_owned(),
        }),
    }
}

#[derive(Debug, Deserialize)]
struct WireSigningInfo {
    address: String,
    #[serde(default)]
    missed_blocks_counter: Option<WireInteger>,
}

impl WireSigningInfo {
    fn into_signing_info(self, endpoint: &Url) -> Result<SigningInfo, FetchError> {
        let missed_blocks_counter = match self.missed_blocks_counter {
            Some(counter) => counter.parse_u64(endpoint, "missed_blocks_counter")?,
            None => 0,
        };
        Ok(SigningInfo {
            consensus_address: self.address,
            missed_blocks_counter,
        })
    }
}

#[derive(Debug, Deserialize)]
struct SlashingParamsResponse {
    params: SlashingParams,
}

#[derive(Debug, Deserialize)]
struct SlashingParams {
    signed_blocks_window: WireInteger,
}

/// 64-bit integers arrive as decimal strings from the REST gateway; some proxies re-encode
/// them as JSON numbers.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireInteger {
    Number(u64),
    Text(String),
}

impl WireInteger {
    fn parse_u64(&self, url: &Url, field: &'static str) -> Result<u64, FetchError> {
        match self {
            WireInteger::Number(value) => Ok(*value),
            WireInteger::Text(raw) => raw.trim().parse().map_err(|_| FetchError::InvalidField {
                url: url.to_string(),
                field,
                value: raw.clone(),
            }),
        }
    }
}
