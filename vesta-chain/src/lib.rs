pub mod abi;
pub mod builder;
pub mod scanner;
pub mod tx;

pub use builder::{BuildError, ChainParams, TransactionBuilder};
pub use scanner::{ChainScanner, EthRpcScanner, PaymentConfirmation, PaymentQuery, ScanError};
pub use tx::UnsignedTransaction;
