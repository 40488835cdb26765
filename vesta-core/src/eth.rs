use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha3::{Digest, Keccak256};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, thiserror::Error, Clone, Copy, PartialEq, Eq)]
pub enum AddressError {
    #[error("address is not a 0x-prefixed 20-byte hex string")]
    InvalidFormat,
    #[error("address mixed-case checksum does not match its canonical encoding")]
    InvalidChecksum,
}

/// An Ethereum account address, stored raw and rendered in EIP-55
/// checksum form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EthAddress([u8; 20]);

impl EthAddress {
    /// Parse an externally supplied address string.
    ///
    /// Only the canonical EIP-55 mixed-case rendering is accepted:
    /// all-lowercase or all-uppercase hex carries no checksum and fails
    /// the checksum check like any other casing mismatch.
    pub fn parse(s: &str) -> Result<Self, AddressError> {
        let hex_part = s.strip_prefix("0x").ok_or(AddressError::InvalidFormat)?;
        if hex_part.len() != 40 || !hex_part.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(AddressError::InvalidFormat);
        }

        let mut bytes = [0u8; 20];
        hex::decode_to_slice(hex_part, &mut bytes).map_err(|_| AddressError::InvalidFormat)?;
        let addr = Self(bytes);

        if addr.to_checksum() != s {
            return Err(AddressError::InvalidChecksum);
        }

        Ok(addr)
    }

    /// Canonical EIP-55 mixed-case rendering.
    pub fn to_checksum(&self) -> String {
        let lower = hex::encode(self.0);
        let digest = Keccak256::digest(lower.as_bytes());

        let mut out = String::with_capacity(42);
        out.push_str("0x");
        for (i, c) in lower.chars().enumerate() {
            let nibble = if i % 2 == 0 {
                digest[i / 2] >> 4
            } else {
                digest[i / 2] & 0x0f
            };
            if c.is_ascii_alphabetic() && nibble >= 8 {
                out.push(c.to_ascii_uppercase());
            } else {
                out.push(c);
            }
        }
        out
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn to_lower_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl fmt::Display for EthAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_checksum())
    }
}

impl FromStr for EthAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for EthAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_checksum())
    }
}

impl<'de> Deserialize<'de> for EthAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Checksummed vectors from the EIP-55 reference list.
    const CHECKSUMMED: &[&str] = &[
        "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
        "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359",
        "0xdbF03B407c01E7cD3CBea99509d93f8DDDC8C6FB",
        "0xD1220A0cf47c7B9Be7A2E6BA89F429762e7b9aDb",
    ];

    #[test]
    fn accepts_valid_checksums() {
        for s in CHECKSUMMED {
            let addr = EthAddress::parse(s).unwrap();
            assert_eq!(&addr.to_checksum(), s);
        }
    }

    #[test]
    fn rejects_uncased_forms_as_checksum_invalid() {
        for s in CHECKSUMMED {
            assert_eq!(
                EthAddress::parse(&s.to_lowercase()),
                Err(AddressError::InvalidChecksum)
            );
            assert_eq!(
                EthAddress::parse(&format!("0x{}", s[2..].to_uppercase())),
                Err(AddressError::InvalidChecksum)
            );
        }
    }

    #[test]
    fn rejects_bad_checksum() {
        // Flip the case of one alphabetic character.
        let bad = "0x5AAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";
        assert_eq!(EthAddress::parse(bad), Err(AddressError::InvalidChecksum));
    }

    #[test]
    fn accepts_an_all_digit_address_in_its_canonical_form() {
        // No alphabetic nibbles, so the canonical rendering is the
        // lowercase hex itself.
        let s = "0x0000000000000000000000000000000000000001";
        let addr = EthAddress::parse(s).unwrap();
        assert_eq!(addr.to_checksum(), s);
    }

    #[test]
    fn rejects_malformed_input() {
        for s in [
            "5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
            "0x5aAeb6",
            "0xzzzeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
            "",
        ] {
            assert_eq!(EthAddress::parse(s), Err(AddressError::InvalidFormat));
        }
    }
}
