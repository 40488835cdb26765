use serde::{Deserialize, Serialize};
use vesta_core::EthAddress;

/// A chain-call descriptor the system constructs but never signs or
/// broadcasts. The caller signs with the guest key and broadcasts
/// off-system.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UnsignedTransaction {
    pub to: EthAddress,
    /// ABI-encoded call data, 0x-prefixed hex.
    pub data: String,
    pub gas: u64,
    /// Wei attached to the call, as a decimal string.
    #[serde(with = "vesta_core::booking::wei_string")]
    pub value: u128,
}
