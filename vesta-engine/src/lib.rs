pub mod engine;
pub mod mailer;
pub mod oracle_http;
pub mod reconcile;

pub use engine::{
    BookingLifecycleEngine, CreateBookingRequest, CreatedBooking, EngineError, EngineRules,
};
pub use mailer::{HttpMailer, LogMailer, MailError, Mailer};
pub use oracle_http::HttpPriceOracle;
pub use reconcile::{spawn_confirmation_watcher, spawn_expiry_sweeper};
