//! Just enough ABI encoding for the three contract calls this system
//! emits. Static-argument calls only: a 4-byte selector followed by
//! 32-byte words.

use sha3::{Digest, Keccak256};
use vesta_core::{BookingHash, EthAddress};

/// First four bytes of the Keccak-256 of the canonical signature.
pub fn selector(signature: &str) -> [u8; 4] {
    let digest = Keccak256::digest(signature.as_bytes());
    [digest[0], digest[1], digest[2], digest[3]]
}

pub fn word_from_address(addr: &EthAddress) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(addr.as_bytes());
    word
}

pub fn word_from_uint(value: u128) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[16..].copy_from_slice(&value.to_be_bytes());
    word
}

pub fn word_from_hash(hash: &BookingHash) -> [u8; 32] {
    *hash.as_bytes()
}

/// Assemble selector + words into 0x-prefixed call data.
pub fn encode_call(selector: [u8; 4], words: &[[u8; 32]]) -> String {
    let mut data = String::with_capacity(2 + 8 + words.len() * 64);
    data.push_str("0x");
    data.push_str(&hex::encode(selector));
    for word in words {
        data.push_str(&hex::encode(word));
    }
    data
}
