use crate::abi;
use crate::tx::UnsignedTransaction;
use vesta_core::{BookingHash, EthAddress, PaymentKind, RateSnapshot};

/// Decimals of the native coin and of the payment token.
const UNIT_DECIMALS: u32 = 18;

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("unsupported payment type: {0}")]
    UnsupportedPaymentType(String),
    #[error("oracle rate is zero")]
    ZeroRate,
    #[error("computed payment amount rounds to zero")]
    ZeroAmount,
}

/// Contract addresses and gas limits, from `[chain]` config.
#[derive(Debug, Clone)]
pub struct ChainParams {
    pub booking_contract: EthAddress,
    pub token_contract: EthAddress,
    pub approve_gas: u64,
    pub book_gas: u64,
    pub cancel_gas: u64,
}

/// Builds the ordered unsigned-transaction sequence for a booking's
/// payment terms. Pure; broadcasting is the caller's problem.
#[derive(Debug, Clone)]
pub struct TransactionBuilder {
    params: ChainParams,
}

impl TransactionBuilder {
    pub fn new(params: ChainParams) -> Self {
        Self { params }
    }

    /// Convert a fiat price (cents) to the smallest on-chain unit using
    /// the oracle snapshot. Integer division rounds down, so the guest
    /// is never overcharged by a fraction of a unit.
    pub fn amount_in_units(
        &self,
        fiat_cents: u64,
        rate: &RateSnapshot,
    ) -> Result<u128, BuildError> {
        if rate.fiat_cents_per_unit == 0 {
            return Err(BuildError::ZeroRate);
        }
        let amount = fiat_cents as u128 * 10u128.pow(UNIT_DECIMALS)
            / rate.fiat_cents_per_unit as u128;
        if amount == 0 {
            return Err(BuildError::ZeroAmount);
        }
        Ok(amount)
    }

    /// Payment sequence for a new booking.
    ///
    /// Native: one booking-contract call carrying the amount as value.
    /// Token: approval first, then the booking call with value 0 and the
    /// amount in the call data. The approval must confirm before the
    /// booking call can succeed on-chain, so the order is fixed.
    pub fn payment_sequence(
        &self,
        kind: PaymentKind,
        booking_hash: &BookingHash,
        amount: u128,
    ) -> Vec<UnsignedTransaction> {
        match kind {
            PaymentKind::Native => vec![UnsignedTransaction {
                to: self.params.booking_contract,
                data: abi::encode_call(
                    abi::selector("book(bytes32)"),
                    &[abi::word_from_hash(booking_hash)],
                ),
                gas: self.params.book_gas,
                value: amount,
            }],
            PaymentKind::Token => vec![
                UnsignedTransaction {
                    to: self.params.token_contract,
                    data: abi::encode_call(
                        abi::selector("approve(address,uint256)"),
                        &[
                            abi::word_from_address(&self.params.booking_contract),
                            abi::word_from_uint(amount),
                        ],
                    ),
                    gas: self.params.approve_gas,
                    value: 0,
                },
                UnsignedTransaction {
                    to: self.params.booking_contract,
                    data: abi::encode_call(
                        abi::selector("bookWithToken(bytes32,uint256)"),
                        &[abi::word_from_hash(booking_hash), abi::word_from_uint(amount)],
                    ),
                    gas: self.params.book_gas,
                    value: 0,
                },
            ],
        }
    }

    /// Refund/cancellation call for an approved booking being deleted.
    pub fn refund_transaction(&self, booking_hash: &BookingHash) -> UnsignedTransaction {
        UnsignedTransaction {
            to: self.params.booking_contract,
            data: abi::encode_call(
                abi::selector("cancel(bytes32)"),
                &[abi::word_from_hash(booking_hash)],
            ),
            gas: self.params.cancel_gas,
            value: 0,
        }
    }

    pub fn booking_contract(&self) -> &EthAddress {
        &self.params.booking_contract
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use vesta_core::booking::{PaymentKind, PersonalInfo};
    use vesta_core::hash::HashContent;

    fn params() -> ChainParams {
        ChainParams {
            booking_contract: EthAddress::parse("0xdbF03B407c01E7cD3CBea99509d93f8DDDC8C6FB")
                .unwrap(),
            token_contract: EthAddress::parse("0xD1220A0cf47c7B9Be7A2E6BA89F429762e7b9aDb")
                .unwrap(),
            approve_gas: 60_000,
            book_gas: 220_000,
            cancel_gas: 90_000,
        }
    }

    fn sample_hash() -> BookingHash {
        let addr = EthAddress::parse("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed").unwrap();
        let info = PersonalInfo {
            full_name: "Ada Lovelace".into(),
            email: "ada@example.com".into(),
            birth_date: chrono::NaiveDate::from_ymd_opt(1990, 12, 10).unwrap(),
            phone: "+44 20 7946 0000".into(),
        };
        BookingHash::derive(
            &HashContent {
                guest_eth_address: &addr,
                room_type: 1,
                guest_count: 2,
                payment_kind: PaymentKind::Native,
                personal_info: &info,
            },
            "signing-key",
        )
    }

    fn rate(cents: u64) -> RateSnapshot {
        RateSnapshot {
            kind: PaymentKind::Native,
            fiat_cents_per_unit: cents,
            fetched_at: Utc::now(),
        }
    }

    #[test]
    fn native_payment_is_a_single_value_bearing_call() {
        let builder = TransactionBuilder::new(params());
        let txs = builder.payment_sequence(PaymentKind::Native, &sample_hash(), 42);
        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].to, *builder.booking_contract());
        assert_eq!(txs[0].value, 42);
    }

    #[test]
    fn token_payment_is_approve_then_book() {
        let builder = TransactionBuilder::new(params());
        let txs = builder.payment_sequence(PaymentKind::Token, &sample_hash(), 42);
        assert_eq!(txs.len(), 2);
        // Approval goes to the token contract and starts with the
        // approve(address,uint256) selector.
        assert_eq!(txs[0].to, params().token_contract);
        assert!(txs[0].data.starts_with("0x095ea7b3"));
        assert_eq!(txs[0].value, 0);
        // The booking call carries no value; the amount lives in data.
        assert_eq!(txs[1].to, params().booking_contract);
        assert_eq!(txs[1].value, 0);
        assert!(txs[1].data.ends_with("2a"));
    }

    #[test]
    fn amount_rounds_down_to_the_smallest_unit() {
        let builder = TransactionBuilder::new(params());
        // 100.00 fiat at 300.00 per unit = 0.333... units, floored.
        let amount = builder.amount_in_units(10_000, &rate(30_000)).unwrap();
        assert_eq!(amount, 333_333_333_333_333_333u128);
    }

    #[test]
    fn zero_rate_is_rejected() {
        let builder = TransactionBuilder::new(params());
        assert!(matches!(
            builder.amount_in_units(10_000, &rate(0)),
            Err(BuildError::ZeroRate)
        ));
    }

    #[test]
    fn refund_is_a_zero_value_cancel_call() {
        let builder = TransactionBuilder::new(params());
        let tx = builder.refund_transaction(&sample_hash());
        assert_eq!(tx.to, params().booking_contract);
        assert_eq!(tx.value, 0);
        assert!(tx.data.len() > 10);
    }
}
