use crate::eth::EthAddress;
use crate::hash::BookingHash;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentKind {
    Native,
    Token,
}

impl PaymentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentKind::Native => "native",
            PaymentKind::Token => "token",
        }
    }

    /// Parse the wire-level `paymentType` field. Anything outside
    /// {native, token} is unsupported.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "native" => Some(PaymentKind::Native),
            "token" => Some(PaymentKind::Token),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Approved,
    Expired,
    Deleted,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Approved => "approved",
            BookingStatus::Expired => "expired",
            BookingStatus::Deleted => "deleted",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "approved" => BookingStatus::Approved,
            "expired" => BookingStatus::Expired,
            "deleted" => BookingStatus::Deleted,
            _ => BookingStatus::Pending,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PersonalInfo {
    pub full_name: String,
    pub email: String,
    pub birth_date: NaiveDate,
    pub phone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentTerms {
    /// Smallest on-chain unit (wei, or the token's base unit). Always
    /// strictly positive; computed once from the oracle snapshot at
    /// creation and never refreshed.
    #[serde(with = "crate::booking::wei_string")]
    pub amount_wei: u128,
    #[serde(rename = "type")]
    pub kind: PaymentKind,
    /// Hash of the confirmed on-chain payment. Populated only after the
    /// confirmation watcher observes the payment.
    pub transaction_ref: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub booking_hash: BookingHash,
    pub guest_eth_address: EthAddress,
    pub room_type: i32,
    pub guest_count: u32,
    pub personal_info: PersonalInfo,
    pub payment: PaymentTerms,
    /// Instant after which an unconfirmed booking becomes purgeable.
    pub signature_timestamp: DateTime<Utc>,
    pub status: BookingStatus,
    /// Sequence number from the index allocator. Returned to the caller
    /// but not part of the uniqueness key.
    pub booking_index: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.status == BookingStatus::Pending && self.signature_timestamp < now
    }
}

/// Wire form for on-chain amounts: decimal string, since u128 exceeds
/// what JSON numbers can carry losslessly.
pub mod wei_string {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &u128, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u128, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_kind_parses_wire_strings() {
        assert_eq!(PaymentKind::parse("native"), Some(PaymentKind::Native));
        assert_eq!(PaymentKind::parse("token"), Some(PaymentKind::Token));
        assert_eq!(PaymentKind::parse("card"), None);
        assert_eq!(PaymentKind::parse(""), None);
    }

    #[test]
    fn status_round_trips() {
        for status in [
            BookingStatus::Pending,
            BookingStatus::Approved,
            BookingStatus::Expired,
            BookingStatus::Deleted,
        ] {
            assert_eq!(BookingStatus::from_str(status.as_str()), status);
        }
    }

    #[test]
    fn payment_terms_serialize_amount_as_string() {
        let terms = PaymentTerms {
            amount_wei: 1_250_000_000_000_000_000u128,
            kind: PaymentKind::Token,
            transaction_ref: None,
        };
        let json = serde_json::to_value(&terms).unwrap();
        assert_eq!(json["amountWei"], "1250000000000000000");
        assert_eq!(json["type"], "token");
    }
}
