//! Service Configuration
//!
//! Layered: built-in defaults, then an optional TOML file, then `RUL__*`
//! environment variables (e.g. `RUL__SERVER__ADDR=0.0.0.0:9000`).

use crate::rate_limit::RateLimitConfig;
use config::{Config, ConfigError, Environment, File};
use feature_engine::{WindowShape, NUM_FEATURES, TIME_STEPS};
use health_scorer::ScoringConfig;
use inference_engine::{EngineConfig, MAX_RUL};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default config file looked up by the service binary
pub const DEFAULT_CONFIG_FILE: &str = "rul-service.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub model: ModelSettings,
    pub rate_limit: RateLimitConfig,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub addr: String,
    pub request_timeout_secs: u64,
    /// Allowed browser origins; empty allows any origin
    pub cors_origins: Vec<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:8000".to_string(),
            request_timeout_secs: 30,
            cors_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    pub model_path: Option<PathBuf>,
    pub scaler_path: Option<PathBuf>,
    pub time_steps: usize,
    pub num_features: usize,
    pub max_rul: f64,
    /// Serve the deterministic mock model instead of loading artifacts
    pub use_mock: bool,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            model_path: Some(PathBuf::from("models/rul_model.onnx")),
            scaler_path: Some(PathBuf::from("models/scaler.json")),
            time_steps: TIME_STEPS,
            num_features: NUM_FEATURES,
            max_rul: MAX_RUL,
            use_mock: false,
        }
    }
}

impl ModelSettings {
    pub fn shape(&self) -> WindowShape {
        WindowShape::new(self.time_steps, self.num_features)
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            model_path: self.model_path.clone(),
            scaler_path: self.scaler_path.clone(),
            shape: self.shape(),
            max_rul: self.max_rul,
        }
    }

    pub fn scoring_config(&self) -> ScoringConfig {
        ScoringConfig {
            max_rul: self.max_rul,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Filter directive used when `RUST_LOG` is unset
    pub level: String,
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl Settings {
    /// Load settings. An explicitly named file must exist; the default file is optional.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(p) => File::from(p).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        Config::builder()
            .add_source(Config::try_from(&Settings::default())?)
            .add_source(file)
            .add_source(
                Environment::with_prefix("RUL")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("server.cors_origins"),
            )
            .build()?
            .try_deserialize()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.model.time_steps == 0 || self.model.num_features == 0 {
            return Err(ConfigError::Message(
                "model.time_steps and model.num_features must be positive".to_string(),
            ));
        }
        if !(self.model.max_rul.is_finite() && self.model.max_rul > 0.0) {
            return Err(ConfigError::Message("model.max_rul must be positive".to_string()));
        }
        Ok(())
    }

    /// Load and reject settings the service cannot run with
    pub fn load_validated(path: Option<&Path>) -> Result<Self, ConfigError> {
        let settings = Self::load(path)?;
        settings.validate()?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.model.shape(), WindowShape::CANONICAL);
        assert_eq!(settings.model.max_rul, 125.0);
        assert!(settings.rate_limit.enabled);
        assert_eq!(settings.logging.level, "info");
    }

    #[test]
    fn test_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[server]\naddr = \"127.0.0.1:9100\"\n\n[model]\nuse_mock = true\nmax_rul = 150.0\n\n[rate_limit]\nenabled = false"
        )
        .unwrap();

        let settings = Settings::load(Some(file.path())).unwrap();
        assert_eq!(settings.server.addr, "127.0.0.1:9100");
        assert!(settings.model.use_mock);
        assert_eq!(settings.model.max_rul, 150.0);
        assert!(!settings.rate_limit.enabled);
        // untouched keys keep their defaults
        assert_eq!(settings.model.time_steps, 30);
        assert_eq!(settings.server.request_timeout_secs, 30);
    }

    #[test]
    fn test_missing_explicit_file_fails() {
        assert!(Settings::load(Some(Path::new("/nonexistent/rul-service.toml"))).is_err());
    }

    #[test]
    fn test_rejects_zero_time_steps() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[model]\ntime_steps = 0").unwrap();
        assert!(Settings::load_validated(Some(file.path())).is_err());
    }

    #[test]
    fn test_engine_config_mirrors_model_settings() {
        let settings = Settings::default();
        let engine = settings.model.engine_config();
        assert_eq!(engine.shape, WindowShape::CANONICAL);
        assert_eq!(engine.model_path, settings.model.model_path);
        assert_eq!(settings.model.scoring_config().max_rul, 125.0);
    }
}
