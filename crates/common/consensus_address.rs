use base64::{Engine, engine::general_purpose::STANDARD};
use bech32::{Bech32, Hrp};
use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

/// Human readable part used by the network this monitor was first deployed against.
pub const DEFAULT_VALCONS_PREFIX: &str = "storyvalcons";

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum AddressError {
    #[error("validator has no consensus public key")]
    MissingKey,
    #[error("consensus public key is not valid base64: {0}")]
    InvalidBase64(String),
    #[error("invalid bech32 prefix {prefix:?}: {reason}")]
    InvalidPrefix { prefix: String, reason: String },
    #[error("bech32 encoding failed: {0}")]
    Encode(String),
}

/// Derives the consensus address of a validator from its raw consensus public key.
///
/// The address is `bech32(prefix, ripemd160(sha256(pubkey)))`. It is the key under which
/// the slashing module reports signing infos and is unrelated to the operator address.
pub fn derive_consensus_address(pubkey: &[u8], prefix: &str) -> Result<String, AddressError> {
    let hrp = parse_prefix(prefix)?;
    let sha256_digest = Sha256::digest(pubkey);
    let ripemd_digest = Ripemd160::digest(sha256_digest);

    bech32::encode::<Bech32>(hrp, ripemd_digest.as_slice())
        .map_err(|error| AddressError::Encode(error.to_string()))
}

/// Same as [`derive_consensus_address`] for a key in the base64 form returned by the REST API.
pub fn consensus_address_from_base64(
    encoded_pubkey: Option<&str>,
    prefix: &str,
) -> Result<String, AddressError> {
    let encoded_pubkey = encoded_pubkey
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .ok_or(AddressError::MissingKey)?;

    let pubkey = STANDARD
        .decode(encoded_pubkey)
        .map_err(|error| AddressError::InvalidBase64(error.to_string()))?;

    derive_consensus_address(&pubkey, prefix)
}

/// Checks that `prefix` can be used as a bech32 human readable part.
pub fn validate_prefix(prefix: &str) -> Result<(), AddressError> {
    parse_prefix(prefix).map(|_| ())
}

fn parse_prefix(prefix: &str) -> Result<Hrp, AddressError> {
    Hrp::parse(prefix).map_err(|error| AddressError::InvalidPrefix {
        prefix: prefix.to_owned(),
        reason: error.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    // 32 bytes 0x00..=0x1f
    const SEQUENTIAL_KEY_B64: &str = "AAECAwQFBgcICQoLDA0ODxAREhMUFRYXGBkaGxwdHh8=";
    // compressed secp256k1 layout: 0x02 followed by 0x01..=0x20
    const COMPRESSED_KEY_B64: &str = "AgECAwQFBgcICQoLDA0ODxAREhMUFRYXGBkaGxwdHh8g";

    #[test]
    fn hashes_with_sha256_then_ripemd160() {
        let pubkey: Vec<u8> = (0u8..32).collect();
        let digest = Ripemd160::digest(Sha256::digest(&pubkey));
        assert_eq!(
            hex::encode(digest),
            "ea4beb47def8492389a1e16634795441e1b87245"
        );
    }

    #[test]
    fn derives_address_with_configured_prefix() {
        let pubkey: Vec<u8> = (0u8..32).collect();

        assert_eq!(
            derive_consensus_address(&pubkey, "storyvalcons"),
            Ok("storyvalcons1af97k377lpyj8zdpu9nrg725g8smsuj9zc2a64".to_owned())
        );
        assert_eq!(
            derive_consensus_address(&pubkey, "cosmosvalcons"),
            Ok("cosmosvalcons1af97k377lpyj8zdpu9nrg725g8smsuj9tzszlh".to_owned())
        );
    }

    #[test]
    fn derives_address_from_base64_key() {
        assert_eq!(
            consensus_address_from_base64(Some(SEQUENTIAL_KEY_B64), DEFAULT_VALCONS_PREFIX),
            Ok("storyvalcons1af97k377lpyj8zdpu9nrg725g8smsuj9zc2a64".to_owned())
        );
        assert_eq!(
            consensus_address_from_base64(Some(COMPRESSED_KEY_B64), DEFAULT_VALCONS_PREFIX),
            Ok("storyvalcons19mhhfs3xmyt9lk9uah33kk9lgucqz9dq7vdd96".to_owned())
        );
    }

    #[test]
    fn rejects_missing_or_malformed_keys() {
        assert_eq!(
            consensus_address_from_base64(None, DEFAULT_VALCONS_PREFIX),
            Err(AddressError::MissingKey)
        );
        assert_eq!(
            consensus_address_from_base64(Some("  "), DEFAULT_VALCONS_PREFIX),
            Err(AddressError::MissingKey)
        );
        assert!(matches!(
            consensus_address_from_base64(Some("not base64!"), DEFAULT_VALCONS_PREFIX),
            Err(AddressError::InvalidBase64(_))
        ));
    }

    #[test]
    fn rejects_invalid_prefix() {
        assert!(validate_prefix("cosmosvalcons").is_ok());
        assert!(matches!(
            validate_prefix(""),
            Err(AddressError::InvalidPrefix { .. })
        ));
    }
}
