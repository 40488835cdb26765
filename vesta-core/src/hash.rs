use crate::booking::{PaymentKind, PersonalInfo};
use crate::eth::EthAddress;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha3::{Digest, Keccak256};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, thiserror::Error, Clone, Copy, PartialEq, Eq)]
#[error("booking hash is not a 0x-prefixed 32-byte hex string")]
pub struct HashParseError;

/// Content-derived booking identifier: Keccak-256 over the normalized
/// reservation content and the guest signing key. Identical resubmissions
/// with the same key collide; a different key yields a different hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BookingHash([u8; 32]);

impl BookingHash {
    pub fn derive(content: &HashContent<'_>, signing_key: &str) -> Self {
        let mut hasher = Keccak256::new();
        // Length-prefixed fields so adjacent values can never alias.
        let mut feed = |field: &str| {
            hasher.update((field.len() as u64).to_be_bytes());
            hasher.update(field.as_bytes());
        };
        feed(&content.guest_eth_address.to_lower_hex());
        feed(&content.room_type.to_string());
        feed(&content.guest_count.to_string());
        feed(content.payment_kind.as_str());
        feed(content.personal_info.full_name.trim());
        feed(content.personal_info.email.trim());
        feed(&content.personal_info.birth_date.to_string());
        feed(content.personal_info.phone.trim());
        feed(signing_key);
        Self(hasher.finalize().into())
    }

    pub fn parse(s: &str) -> Result<Self, HashParseError> {
        let hex_part = s.strip_prefix("0x").ok_or(HashParseError)?;
        if hex_part.len() != 64 {
            return Err(HashParseError);
        }
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(hex_part, &mut bytes).map_err(|_| HashParseError)?;
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

/// Borrowed view of the request fields that feed the hash.
#[derive(Debug, Clone, Copy)]
pub struct HashContent<'a> {
    pub guest_eth_address: &'a EthAddress,
    pub room_type: i32,
    pub guest_count: u32,
    pub payment_kind: PaymentKind,
    pub personal_info: &'a PersonalInfo,
}

impl fmt::Display for BookingHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for BookingHash {
    type Err = HashParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for BookingHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for BookingHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_info() -> PersonalInfo {
        PersonalInfo {
            full_name: "Ada Lovelace".into(),
            email: "ada@example.com".into(),
            birth_date: NaiveDate::from_ymd_opt(1990, 12, 10).unwrap(),
            phone: "+44 20 7946 0000".into(),
        }
    }

    fn sample_content<'a>(addr: &'a EthAddress, info: &'a PersonalInfo) -> HashContent<'a> {
        HashContent {
            guest_eth_address: addr,
            room_type: 2,
            guest_count: 2,
            payment_kind: PaymentKind::Native,
            personal_info: info,
        }
    }

    #[test]
    fn derivation_is_deterministic() {
        let addr = EthAddress::parse("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed").unwrap();
        let info = sample_info();
        let a = BookingHash::derive(&sample_content(&addr, &info), "key-1");
        let b = BookingHash::derive(&sample_content(&addr, &info), "key-1");
        assert_eq!(a, b);
    }

    #[test]
    fn signing_key_changes_the_hash() {
        let addr = EthAddress::parse("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed").unwrap();
        let info = sample_info();
        let a = BookingHash::derive(&sample_content(&addr, &info), "key-1");
        let b = BookingHash::derive(&sample_content(&addr, &info), "key-2");
        assert_ne!(a, b);
    }

    #[test]
    fn content_changes_the_hash() {
        let addr = EthAddress::parse("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed").unwrap();
        let info = sample_info();
        let base = BookingHash::derive(&sample_content(&addr, &info), "key-1");

        let mut other = sample_content(&addr, &info);
        other.room_type = 3;
        assert_ne!(BookingHash::derive(&other, "key-1"), base);
    }

    #[test]
    fn display_round_trips() {
        let addr = EthAddress::parse("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed").unwrap();
        let info = sample_info();
        let hash = BookingHash::derive(&sample_content(&addr, &info), "key-1");
        assert_eq!(BookingHash::parse(&hash.to_string()).unwrap(), hash);
    }
}
