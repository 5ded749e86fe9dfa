use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub payment: PaymentConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// Payment-core configuration. The encryption passphrase is handed to the
/// crypto codec at construction; nothing reads it from the environment at
/// call time.
#[derive(Debug, Deserialize, Clone)]
pub struct PaymentConfig {
    pub encryption_passphrase: String,
    pub currency: String,
    /// Probability in [0, 1] that simulated settlement succeeds.
    pub settlement_success_rate: f64,
    /// Artificial gateway round-trip latency.
    pub settlement_delay_ms: u64,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let config = Config::builder()
            // Start with default values
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("database.url", "sqlite://tiffin-payments.db")?
            .set_default("database.max_connections", 10)?
            .set_default("payment.encryption_passphrase", "tiffin-secret-key")?
            .set_default("payment.currency", "INR")?
            .set_default("payment.settlement_success_rate", 0.95)?
            .set_default("payment.settlement_delay_ms", 2000)?
            // Add config file if it exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // Add environment variables (with TIFFIN__ prefix, double underscore separates levels)
            .add_source(Environment::with_prefix("TIFFIN").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                url: "sqlite://tiffin-payments.db".to_string(),
                max_connections: 10,
            },
            payment: PaymentConfig::default(),
        }
    }
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            encryption_passphrase: "tiffin-secret-key".to_string(),
            currency: "INR".to_string(),
            settlement_success_rate: 0.95,
            settlement_delay_ms: 2000,
        }
    }
}
