//! Ethereum personal-message signatures and account addresses

use crate::model::Hash;
use crate::{Error, Result};
use k256::ecdsa::{RecoveryId, Signature as EcdsaSignature, SigningKey, VerifyingKey};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

const PERSONAL_MESSAGE_PREFIX: &str = "\x19Ethereum Signed Message:\n";

/// A 20-byte account address
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address([u8; 20]);

impl Address {
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Address(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Last 20 bytes of Keccak-256 over the uncompressed public key
    pub fn from_verifying_key(key: &VerifyingKey) -> Self {
        let point = key.to_encoded_point(false);
        let hash = Hash::keccak(&point.as_bytes()[1..]);
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&hash.as_bytes()[12..]);
        Address(bytes)
    }

    pub fn from_signing_key(key: &SigningKey) -> Self {
        Self::from_verifying_key(key.verifying_key())
    }

    /// EIP-55 mixed-case checksum form
    pub fn to_checksum(&self) -> String {
        let lower = hex::encode(self.0);
        let hash = Hash::keccak(lower.as_bytes());
        let mut out = String::with_capacity(42);
        out.push_str("0x");
        for (i, c) in lower.chars().enumerate() {
            let nibble = (hash.as_bytes()[i / 2] >> (if i % 2 == 0 { 4 } else { 0 })) & 0x0f;
            if c.is_ascii_alphabetic() && nibble >= 8 {
                out.push(c.to_ascii_uppercase());
            } else {
                out.push(c);
            }
        }
        out
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_checksum())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_checksum())
    }
}

impl FromStr for Address {
    type Err = Error;

    /// Parses with or without `0x`; the checksum case is not enforced
    fn from_str(s: &str) -> Result<Self> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(digits)
            .map_err(|e| Error::InvalidSignature(format!("bad address {}: {}", s, e)))?;
        let bytes: [u8; 20] = bytes
            .try_into()
            .map_err(|_| Error::InvalidSignature(format!("address {} is not 20 bytes", s)))?;
        Ok(Address(bytes))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_checksum())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Parse a secp256k1 private key from hex (with or without `0x`)
pub fn parse_signing_key(s: &str) -> Result<SigningKey> {
    let digits = s.trim().strip_prefix("0x").unwrap_or(s.trim());
    let bytes = hex::decode(digits)
        .map_err(|e| Error::Configuration(format!("private key is not hex: {}", e)))?;
    SigningKey::from_slice(&bytes)
        .map_err(|_| Error::Configuration("private key is not a valid secp256k1 scalar".into()))
}

/// Keccak-256("\x19Ethereum Signed Message:\n" + len + message)
pub fn personal_message_digest(message: &[u8]) -> Hash {
    let prefix = format!("{}{}", PERSONAL_MESSAGE_PREFIX, message.len());
    Hash::keccak_many(&[prefix.as_bytes(), message])
}

/// Sign a message as a personal message, returning `0x`-hex `r || s || v`
pub fn sign_message(message: &[u8], key: &SigningKey) -> Result<String> {
    let digest = personal_message_digest(message);
    let (signature, recovery_id) = key
        .sign_prehash_recoverable(digest.as_bytes())
        .map_err(|e| Error::InvalidSignature(format!("signing failed: {}", e)))?;

    let mut bytes = Vec::with_capacity(65);
    bytes.extend_from_slice(&signature.to_bytes());
    bytes.push(27 + recovery_id.to_byte());
    Ok(format!("0x{}", hex::encode(bytes)))
}

/// Recover the address that produced `signature` over `message`
///
/// Accepts `v` as 0/1 or 27/28 and high-s signatures.
pub fn recover_message(message: &[u8], signature: &str) -> Result<Address> {
    let digits = signature.strip_prefix("0x").unwrap_or(signature);
    let bytes = hex::decode(digits)
        .map_err(|e| Error::InvalidSignature(format!("signature is not hex: {}", e)))?;
    if bytes.len() != 65 {
        return Err(Error::InvalidSignature(format!(
            "signature must be 65 bytes, got {}",
            bytes.len()
        )));
    }

    let v = match bytes[64] {
        v @ (0 | 1) => v,
        v @ (27 | 28) => v - 27,
        other => {
            return Err(Error::InvalidSignature(format!(
                "unsupported recovery byte {}",
                other
            )))
        }
    };
    let mut recovery_id = RecoveryId::from_byte(v)
        .ok_or_else(|| Error::InvalidSignature(format!("bad recovery id {}", v)))?;
    let mut signature = EcdsaSignature::from_slice(&bytes[..64])
        .map_err(|e| Error::InvalidSignature(e.to_string()))?;
    if let Some(normalized) = signature.normalize_s() {
        signature = normalized;
        recovery_id = RecoveryId::new(!recovery_id.is_y_odd(), recovery_id.is_x_reduced());
    }

    let digest = personal_message_digest(message);
    let key = VerifyingKey::recover_from_prehash(digest.as_bytes(), &signature, recovery_id)
        .map_err(|e| Error::InvalidSignature(format!("recovery failed: {}", e)))?;
    Ok(Address::from_verifying_key(&key))
}

#[cfg(test)]
mod tests {
    use super::*;

    // Well-known development key (hardhat account #0)
    const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const DEV_ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

    #[test]
    fn test_address_from_key() {
        let key = parse_signing_key(DEV_KEY).unwrap();
        assert_eq!(Address::from_signing_key(&key).to_checksum(), DEV_ADDRESS);
    }

    #[test]
    fn test_checksum_vectors() {
        for expected in [
            "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
            "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359",
            "0xdbF03B407c01E7cD3CBea99509d93f8DDDC8C6FB",
        ] {
            let address: Address = expected.to_lowercase().parse().unwrap();
            assert_eq!(address.to_checksum(), expected);
        }
    }

    #[test]
    fn test_personal_digest_of_hello_world() {
        assert_eq!(
            personal_message_digest(b"hello world").to_hex(),
            "d9eba16ed0ecae432b71fe008c98cc872bb4cc214d3220a36f365326cf807d68"
        );
    }

    #[test]
    fn test_sign_and_recover() {
        let key = parse_signing_key(DEV_KEY).unwrap();
        let signature = sign_message(b"dataset bytes", &key).unwrap();
        assert_eq!(signature.len(), 2 + 130);
        assert!(signature.ends_with("1b") || signature.ends_with("1c"));

        let signer = recover_message(b"dataset bytes", &signature).unwrap();
        assert_eq!(signer, Address::from_signing_key(&key));
    }

    #[test]
    fn test_recover_other_message_gives_other_address() {
        let key = parse_signing_key(DEV_KEY).unwrap();
        let signature = sign_message(b"original", &key).unwrap();
        match recover_message(b"tampered", &signature) {
            Ok(address) => assert_ne!(address, Address::from_signing_key(&key)),
            Err(e) => assert!(matches!(e, Error::InvalidSignature(_))),
        }
    }

    #[test]
    fn test_recover_accepts_raw_recovery_byte() {
        let key = parse_signing_key(DEV_KEY).unwrap();
        let signature = sign_message(b"msg", &key).unwrap();
        let mut bytes = hex::decode(&signature[2..]).unwrap();
        bytes[64] -= 27;
        let raw = format!("0x{}", hex::encode(bytes));
        assert_eq!(
            recover_message(b"msg", &raw).unwrap(),
            Address::from_signing_key(&key)
        );
    }

    #[test]
    fn test_malformed_signatures_rejected() {
        assert!(matches!(
            recover_message(b"m", "0x1234"),
            Err(Error::InvalidSignature(_))
        ));
        assert!(matches!(
            recover_message(b"m", "not hex"),
            Err(Error::InvalidSignature(_))
        ));
        let bad_v = format!("0x{}{}", "11".repeat(64), "05");
        assert!(matches!(
            recover_message(b"m", &bad_v),
            Err(Error::InvalidSignature(_))
        ));
    }

    #[test]
    fn test_bad_private_key() {
        assert!(matches!(
            parse_signing_key("0x00"),
            Err(Error::Configuration(_))
        ));
        assert!(matches!(
            parse_signing_key(&"00".repeat(32)),
            Err(Error::Configuration(_))
        ));
    }
}
