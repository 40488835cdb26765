use crate::abi;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use sha3::Digest;
use std::time::Duration;
use tracing::warn;
use vesta_core::{BookingHash, EthAddress};

#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("chain scan timed out")]
    Timeout,
    #[error("chain rpc error: {0}")]
    Rpc(String),
}

/// What a pending booking expects to see on-chain.
#[derive(Debug, Clone)]
pub struct PaymentQuery {
    pub booking_hash: BookingHash,
    pub payer: EthAddress,
    pub amount_wei: u128,
}

/// A confirmed on-chain payment matching a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentConfirmation {
    pub transaction_hash: String,
    pub block_number: u64,
}

/// Looks up confirmed payments for pending bookings. Implementations
/// must bound their own latency; the watcher retries on its next tick.
#[async_trait]
pub trait ChainScanner: Send + Sync {
    async fn find_payment(
        &self,
        query: &PaymentQuery,
    ) -> Result<Option<PaymentConfirmation>, ScanError>;
}

/// JSON-RPC scanner: eth_getLogs against the booking contract's
/// `BookingPaid(bytes32 indexed, address indexed, uint256)` event,
/// filtered by the booking-hash topic.
pub struct EthRpcScanner {
    http: reqwest::Client,
    rpc_url: String,
    contract: EthAddress,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: Option<Vec<LogEntry>>,
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LogEntry {
    transaction_hash: String,
    block_number: String,
    data: String,
}

impl EthRpcScanner {
    pub fn new(rpc_url: String, contract: EthAddress, timeout: Duration) -> Self {
        Self {
            http: reqwest::Client::new(),
            rpc_url,
            contract,
            timeout,
        }
    }

    fn event_topic() -> String {
        let digest =
            sha3::Keccak256::digest("BookingPaid(bytes32,address,uint256)".as_bytes());
        format!("0x{}", hex::encode(digest))
    }

    /// Indexed address topic: the payer left-padded to a 32-byte word.
    fn payer_topic(payer: &EthAddress) -> String {
        format!("0x{}", hex::encode(abi::word_from_address(payer)))
    }
}

#[async_trait]
impl ChainScanner for EthRpcScanner {
    async fn find_payment(
        &self,
        query: &PaymentQuery,
    ) -> Result<Option<PaymentConfirmation>, ScanError> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "eth_getLogs",
            "params": [{
                "address": self.contract.to_lower_hex(),
                "fromBlock": "0x0",
                "toBlock": "latest",
                "topics": [
                    Self::event_topic(),
                    query.booking_hash.to_string(),
                    Self::payer_topic(&query.payer),
                ],
            }],
        });

        let response = self
            .http
            .post(&self.rpc_url)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ScanError::Timeout
                } else {
                    ScanError::Rpc(e.to_string())
                }
            })?;

        let parsed: RpcResponse = response
            .json()
            .await
            .map_err(|e| ScanError::Rpc(e.to_string()))?;

        if let Some(err) = parsed.error {
            return Err(ScanError::Rpc(err.message));
        }

        for log in parsed.result.unwrap_or_default() {
            match decode_amount(&log.data) {
                Some(amount) if amount == query.amount_wei => {
                    let block_number = parse_hex_u64(&log.block_number)
                        .ok_or_else(|| ScanError::Rpc("bad blockNumber".into()))?;
                    return Ok(Some(PaymentConfirmation {
                        transaction_hash: log.transaction_hash,
                        block_number,
                    }));
                }
                Some(amount) => {
                    warn!(
                        booking_hash = %query.booking_hash,
                        expected = query.amount_wei,
                        observed = amount,
                        "on-chain payment amount mismatch, skipping log"
                    );
                }
                None => {
                    warn!(booking_hash = %query.booking_hash, "unparseable log data, skipping");
                }
            }
        }

        Ok(None)
    }
}

/// The event data is a single 32-byte uint word. Amounts above u128 are
/// out of range for this system and rejected.
fn decode_amount(data: &str) -> Option<u128> {
    let hex_part = data.strip_prefix("0x")?;
    if hex_part.len() != 64 {
        return None;
    }
    let bytes = hex::decode(hex_part).ok()?;
    if bytes[..16].iter().any(|&b| b != 0) {
        return None;
    }
    let mut word = [0u8; 16];
    word.copy_from_slice(&bytes[16..]);
    Some(u128::from_be_bytes(word))
}

fn parse_hex_u64(s: &str) -> Option<u64> {
    u64::from_str_radix(s.strip_prefix("0x")?, 16).ok()
}
