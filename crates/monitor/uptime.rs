use std::collections::HashMap;
use thiserror::Error;
use valwatch_common::{AddressError, SigningInfo, ValidatorRecord, consensus_address_from_base64};

/// Reason a validator's uptime could not be computed this cycle. The validator stays in the
/// snapshot with an uptime of `0.0`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UptimeSkip {
    #[error("cannot derive consensus address of {operator_address}: {source}")]
    AddressDerivationFailed {
        operator_address: String,
        #[source]
        source: AddressError,
    },
    #[error("no signing info for {operator_address} at {consensus_address}")]
    MissingSigningInfo {
        operator_address: String,
        consensus_address: String,
    },
}

impl UptimeSkip {
    pub fn operator_address(&self) -> &str {
        match self {
            UptimeSkip::AddressDerivationFailed {
                operator_address, ..
            }
            | UptimeSkip::MissingSigningInfo {
                operator_address, ..
            } => operator_address,
        }
    }
}

/// `round((1 - missed / window) * 100, 2)`, clamped to `0.0..=100.0`.
///
/// A counter larger than the window (possible right after a window size change) yields `0.0`.
pub fn compute_uptime(missed_blocks: u64, window_size: u64) -> f64 {
    if window_size == 0 {
        return 0.0;
    }
    // Block counts stay far below 2^53, so both conversions are exact.
    #[allow(clippy::as_conversions)]
    let signed_ratio = 1.0 - missed_blocks as f64 / window_size as f64;
    let percent = (signed_ratio * 100.0 * 100.0).round() / 100.0;
    percent.clamp(0.0, 100.0)
}

/// Missed-block counters keyed by consensus address.
#[derive(Debug, Default)]
pub struct SigningIndex<'a> {
    missed_by_address: HashMap<&'a str, u64>,
}

impl<'a> SigningIndex<'a> {
    pub fn new(signing_infos: &'a [SigningInfo]) -> Self {
        let missed_by_address = signing_infos
            .iter()
            .map(|info| (info.consensus_address.as_str(), info.missed_blocks_counter))
            .collect();
        Self { missed_by_address }
    }

    pub fn missed_blocks(&self, consensus_address: &str) -> Option<u64> {
        self.missed_by_address.get(consensus_address).copied()
    }
}

/// Uptime of one validator. Inactive (non-bonded or jailed) validators are `0.0` by
/// definition and never fail.
pub fn resolve_uptime(
    validator: &ValidatorRecord,
    index: &SigningIndex<'_>,
    window_size: u64,
    valcons_prefix: &str,
) -> Result<f64, UptimeSkip> {
    if !validator.is_active() {
        return Ok(0.0);
    }

    let consensus_address =
        consensus_address_from_base64(validator.consensus_pubkey.as_deref(), valcons_prefix)
            .map_err(|source| UptimeSkip::AddressDerivationFailed {
                operator_address: validator.operator_address.clone(),
                source,
            })?;

    let missed_blocks = index.missed_blocks(&consensus_address).ok_or_else(|| {
        UptimeSkip::MissingSigningInfo {
            operator_address: validator.operator_address.clone(),
            consensus_address,
        }
    })?;

    Ok(compute_uptime(missed_blocks, window_size))
}
