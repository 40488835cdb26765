use serde::Deserialize;
use std::collections::HashMap;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub chain: ChainSettings,
    pub oracle: OracleConfig,
    pub captcha: CaptchaConfig,
    pub mailer: MailerConfig,
    pub signer: SignerConfig,
    pub business_rules: BusinessRules,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RedisConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChainSettings {
    pub rpc_url: String,
    pub booking_contract: String,
    pub token_contract: String,
    pub approve_gas: u64,
    pub book_gas: u64,
    pub cancel_gas: u64,
    pub confirm_interval_seconds: u64,
    pub expiry_interval_seconds: u64,
    pub scan_timeout_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OracleConfig {
    pub url: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CaptchaConfig {
    pub verify_url: String,
    pub secret: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MailerConfig {
    pub endpoint: String,
    pub from_address: String,
    pub timeout_seconds: u64,
}

/// Server-side key folded into the booking-hash derivation.
#[derive(Debug, Deserialize, Clone)]
pub struct SignerConfig {
    pub key: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BusinessRules {
    /// How long an unconfirmed booking stays reservable.
    #[serde(default = "default_signature_ttl")]
    pub signature_ttl_minutes: i64,
    pub max_guests: u32,
    /// Nightly fiat price in cents per room category. TOML table keys
    /// are strings, hence the string-keyed map.
    pub room_prices: HashMap<String, u64>,
    pub email_info_limit: u32,
    pub email_info_window_seconds: u64,
}

fn default_signature_ttl() -> i64 {
    30
}

impl BusinessRules {
    pub fn room_price_cents(&self, room_type: i32) -> Option<u64> {
        if room_type <= 0 {
            return None;
        }
        self.room_prices.get(&room_type.to_string()).copied()
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local overrides, not checked in.
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("VESTA").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> BusinessRules {
        BusinessRules {
            signature_ttl_minutes: 30,
            max_guests: 4,
            room_prices: HashMap::from([("1".to_string(), 12_000), ("2".to_string(), 20_000)]),
            email_info_limit: 3,
            email_info_window_seconds: 3600,
        }
    }

    #[test]
    fn room_prices_resolve_by_category() {
        let r = rules();
        assert_eq!(r.room_price_cents(1), Some(12_000));
        assert_eq!(r.room_price_cents(2), Some(20_000));
        assert_eq!(r.room_price_cents(3), None);
    }

    #[test]
    fn non_positive_room_types_never_resolve() {
        let mut r = rules();
        r.room_prices.insert("-1".to_string(), 5_000);
        r.room_prices.insert("0".to_string(), 5_000);
        assert_eq!(r.room_price_cents(-1), None);
        assert_eq!(r.room_price_cents(0), None);
    }
}
