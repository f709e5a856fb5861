use serde::{Deserialize, Serialize};
use std::fmt;

/// Bonding status as reported by the staking module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BondStatus {
    #[serde(rename = "BOND_STATUS_BONDED")]
    Bonded,
    #[serde(rename = "BOND_STATUS_UNBONDING")]
    Unbonding,
    #[serde(rename = "BOND_STATUS_UNBONDED")]
    Unbonded,
}

impl BondStatus {
    pub fn is_bonded(&self) -> bool {
        matches!(self, BondStatus::Bonded)
    }
}

impl fmt::Display for BondStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BondStatus::Bonded => write!(f, "BOND_STATUS_BONDED"),
            BondStatus::Unbonding => write!(f, "BOND_STATUS_UNBONDING"),
            BondStatus::Unbonded => write!(f, "BOND_STATUS_UNBONDED"),
        }
    }
}

/// One validator as returned by a single poll of the staking module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatorRecord {
    pub operator_address: String,
    pub moniker: String,
    pub status: BondStatus,
    pub jailed: bool,
    /// Fraction in `0..=1`.
    pub commission_rate: f64,
    /// Base64 consensus public key, absent on some malformed records.
    pub consensus_pubkey: Option<String>,
}

impl ValidatorRecord {
    /// Bonded and not jailed, i.e. currently signing blocks.
    pub fn is_active(&self) -> bool {
        self.status.is_bonded() && !self.jailed
    }
}

/// Slashing module signing record, keyed by consensus address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningInfo {
    pub consensus_address: String,
    pub missed_blocks_counter: u64,
}
