//! Shared domain types for the validator monitor.
//!
//! - [`types`]: validator records, snapshots and alerts
//! - [`consensus_address`]: derivation of the bech32 consensus address used to join
//!   validator records with slashing signing infos

pub mod consensus_address;
pub mod types;

pub use consensus_address::{
    AddressError, DEFAULT_VALCONS_PREFIX, consensus_address_from_base64, derive_consensus_address,
    validate_prefix,
};
pub use types::*;
