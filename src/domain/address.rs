//! Address and key generation

use alloy::signers::local::PrivateKeySigner;
use anyhow::{Context, Result};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

/// A freshly generated signing key and the address it controls
#[derive(Debug, Clone, Serialize)]
pub struct KeyPair {
    pub address: String,
    #[serde(rename = "privateKey")]
    pub private_key: String,
}

/// Random `0x` + 40 lowercase hex digit string with no checksum.
///
/// Uses a non-cryptographic RNG. Only for mock-mode wallets that never
/// hold real funds; never use the output as key material.
pub fn generate_placeholder_address() -> String {
    let mut rng = SmallRng::from_entropy();
    let mut address = String::with_capacity(42);
    address.push_str("0x");
    for _ in 0..40 {
        address.push(HEX_DIGITS[rng.gen_range(0..HEX_DIGITS.len())] as char);
    }
    address
}

/// Generate a real secp256k1 key pair. The private key is returned in
/// plaintext and storing it safely is the caller's problem.
pub fn generate_key_pair() -> KeyPair {
    let signer = PrivateKeySigner::random();
    KeyPair {
        address: signer.address().to_checksum(None),
        private_key: format!("0x{}", hex::encode(signer.to_bytes())),
    }
}

/// Build a signer from a hex private key, with or without `0x`
pub fn signer_from_private_key(private_key: &str) -> Result<PrivateKeySigner> {
    let trimmed = private_key.trim();
    let body = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    body.parse::<PrivateKeySigner>()
        .context("invalid private key")
}
