use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use crate::model::ForestParams;
use crate::pricing::{IntervalConfig, TrainingPlan, TrainingPolicy};

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub model: ModelConfig,
    pub pricing: PricingConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "5000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let defaults = ForestParams::default();
        let forest = ForestParams {
            n_estimators: number("N_ESTIMATORS", defaults.n_estimators)?,
            max_depth: number("MAX_DEPTH", defaults.max_depth)?,
            min_samples_split: number("MIN_SAMPLES_SPLIT", defaults.min_samples_split)?,
            test_size: number("TEST_SIZE", defaults.test_size)?,
            random_state: number("RANDOM_STATE", defaults.random_state)?,
        };

        let model = ModelConfig {
            model_path: path("MODEL_PATH", "storage/models/random_forest_model.json"),
            dataset_path: path("DATASET_PATH", "storage/datasets/synthetic_data.csv"),
            training_samples: number("TRAINING_SAMPLES", TrainingPlan::default().samples)?,
            forest,
        };

        let interval_defaults = IntervalConfig::default();
        let interval = IntervalConfig {
            sigma: number("PRICE_INTERVAL_SIGMA", interval_defaults.sigma)?,
            fallback_confidence: number(
                "FALLBACK_CONFIDENCE",
                interval_defaults.fallback_confidence,
            )?,
            price_floor: number("PRICE_FLOOR", interval_defaults.price_floor)?,
        };
        if !(interval.sigma.is_finite() && interval.sigma >= 0.0) {
            return Err(ConfigError::InvalidNumber {
                key: "PRICE_INTERVAL_SIGMA",
                value: interval.sigma.to_string(),
            });
        }
        if !(interval.price_floor.is_finite() && interval.price_floor > 0.0) {
            return Err(ConfigError::InvalidNumber {
                key: "PRICE_FLOOR",
                value: interval.price_floor.to_string(),
            });
        }

        let policy = match env::var("TRAINING_POLICY") {
            Ok(value) => {
                TrainingPolicy::parse(&value).ok_or(ConfigError::InvalidPolicy { value })?
            }
            Err(_) => TrainingPolicy::OnDemand,
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            model,
            pricing: PricingConfig { interval, policy },
        })
    }
}

fn number<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidNumber { key, value }),
        Err(_) => Ok(default),
    }
}

fn path(key: &str, default: &str) -> PathBuf {
    env::var(key)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(default))
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Where the model and its training data live, and how the forest is fit.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub model_path: PathBuf,
    pub dataset_path: PathBuf,
    pub training_samples: usize,
    pub forest: ForestParams,
}

impl ModelConfig {
    pub fn training_plan(&self) -> TrainingPlan {
        TrainingPlan {
            samples: self.training_samples,
            seed: self.forest.random_state,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PricingConfig {
    pub interval: IntervalConfig,
    pub policy: TrainingPolicy,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { key: &'static str, value: String },
    InvalidPolicy { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { key, value } => {
                write!(f, "{key} has an invalid value '{value}'")
            }
            ConfigError::InvalidPolicy { value } => write!(
                f,
                "TRAINING_POLICY '{value}' is not one of fail-fast, on-demand, background"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidNumber { .. }
            | ConfigError::InvalidPolicy { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    const KEYS: [&str; 16] = [
        "APP_ENV",
        "APP_HOST",
        "APP_PORT",
        "APP_LOG_LEVEL",
        "MODEL_PATH",
        "DATASET_PATH",
        "RANDOM_STATE",
        "N_ESTIMATORS",
        "MAX_DEPTH",
        "MIN_SAMPLES_SPLIT",
        "TEST_SIZE",
        "TRAINING_SAMPLES",
        "PRICE_INTERVAL_SIGMA",
        "FALLBACK_CONFIDENCE",
        "PRICE_FLOOR",
        "TRAINING_POLICY",
    ];

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for key in KEYS {
            env::remove_var(key);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.model.forest, ForestParams::default());
        assert_eq!(config.model.training_samples, 500);
        assert_eq!(
            config.model.model_path,
            PathBuf::from("storage/models/random_forest_model.json")
        );
        assert_eq!(config.pricing.interval, IntervalConfig::default());
        assert_eq!(config.pricing.policy, TrainingPolicy::OnDemand);
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 5000));
        reset_env();
    }

    #[test]
    fn reads_model_and_pricing_overrides() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("N_ESTIMATORS", "25");
        env::set_var("RANDOM_STATE", "7");
        env::set_var("PRICE_INTERVAL_SIGMA", "2.0");
        env::set_var("TRAINING_POLICY", "background");

        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.model.forest.n_estimators, 25);
        assert_eq!(config.model.training_plan().seed, 7);
        assert_eq!(config.pricing.interval.sigma, 2.0);
        assert_eq!(config.pricing.policy, TrainingPolicy::Background);
        reset_env();
    }

    #[test]
    fn rejects_malformed_values() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("MAX_DEPTH", "deep");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidNumber {
                key: "MAX_DEPTH",
                ..
            })
        ));

        reset_env();
        env::set_var("TRAINING_POLICY", "eventually");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidPolicy { .. })
        ));
        reset_env();
    }
}
