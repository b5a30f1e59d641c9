//! Key material handling.
//!
//! Secret and public keys are carried as 32-byte x-only secp256k1 keys.
//! Configuration may supply them either as 64-char lowercase hex or in
//! bech32 form (`nsec...` / `npub...`); both are normalized to hex here.

use rand::RngCore;
use secp256k1::{Secp256k1, SecretKey};
use thiserror::Error;

/// Errors raised while parsing or deriving keys.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("invalid secret key: {0}")]
    InvalidSecretKey(String),

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("invalid bech32 key: {0}")]
    InvalidBech32(String),
}

/// Generate a random 32-byte secret key.
pub fn generate_secret_key() -> [u8; 32] {
    let mut key = [0u8; 32];
    rand::rng().fill_bytes(&mut key);
    key
}

/// Get the public key (x-only, 32 bytes) from a secret key.
pub fn public_key(secret_key: &[u8; 32]) -> Result<[u8; 32], KeyError> {
    let secp = Secp256k1::new();
    let sk = SecretKey::from_slice(secret_key)
        .map_err(|e| KeyError::InvalidSecretKey(e.to_string()))?;
    let (xonly, _parity) = sk.x_only_public_key(&secp);
    Ok(xonly.serialize())
}

/// Get the public key as a hex string from a secret key.
pub fn public_key_hex(secret_key: &[u8; 32]) -> Result<String, KeyError> {
    Ok(hex::encode(public_key(secret_key)?))
}

/// Parse a secret key from its hex or `nsec` bech32 form.
pub fn parse_secret_key(input: &str) -> Result<[u8; 32], KeyError> {
    let input = input.trim();
    if input.starts_with("nsec") {
        let bytes = decode_bech32(input, "nsec")?;
        return to_key_bytes(&bytes).ok_or_else(|| {
            KeyError::InvalidSecretKey(format!("nsec payload is {} bytes, expected 32", bytes.len()))
        });
    }

    let bytes =
        hex::decode(input).map_err(|e| KeyError::InvalidSecretKey(format!("invalid hex: {}", e)))?;
    to_key_bytes(&bytes).ok_or_else(|| {
        KeyError::InvalidSecretKey(format!("key is {} bytes, expected 32", bytes.len()))
    })
}

/// Normalize a public key from its hex or `npub` bech32 form to lowercase hex.
pub fn normalize_public_key(input: &str) -> Result<String, KeyError> {
    let input = input.trim();
    if input.starts_with("npub") {
        let bytes = decode_bech32(input, "npub")?;
        if bytes.len() != 32 {
            return Err(KeyError::InvalidPublicKey(format!(
                "npub payload is {} bytes, expected 32",
                bytes.len()
            )));
        }
        return Ok(hex::encode(bytes));
    }

    if input.len() != 64 || !input.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(KeyError::InvalidPublicKey(
            "expected 64 hex characters or an npub key".to_string(),
        ));
    }
    Ok(input.to_lowercase())
}

fn decode_bech32(input: &str, expected_hrp: &str) -> Result<Vec<u8>, KeyError> {
    let (hrp, data) = bech32::decode(input).map_err(|e| KeyError::InvalidBech32(e.to_string()))?;
    if hrp.as_str() != expected_hrp {
        return Err(KeyError::InvalidBech32(format!(
            "expected hrp {}, got {}",
            expected_hrp,
            hrp.as_str()
        )));
    }
    Ok(data)
}

fn to_key_bytes(bytes: &[u8]) -> Option<[u8; 32]> {
    if bytes.len() != 32 {
        return None;
    }
    let mut key = [0u8; 32];
    key.copy_from_slice(bytes);
    Some(key)
}
