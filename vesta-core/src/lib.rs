pub mod booking;
pub mod eth;
pub mod hash;
pub mod oracle;
pub mod repository;

pub use booking::{Booking, BookingStatus, PaymentKind, PaymentTerms, PersonalInfo};
pub use eth::{AddressError, EthAddress};
pub use hash::BookingHash;
pub use oracle::{OracleError, PriceOracle, RateSnapshot};
pub use repository::{BookingStore, IndexAllocator, StoreError};
