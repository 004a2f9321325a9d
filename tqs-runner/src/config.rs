//! Run configuration: every component config in one TOML document.
//!
//! ```toml
//! seed = 42
//!
//! [scanner]
//! use_sentiment = true
//! entry_threshold = 5.0
//!
//! [simulation]
//! win_probability = 0.53
//!
//! [walk_forward]
//! threshold_grid = [3.0, 3.5, 4.0, 4.5, 5.0, 5.5, 6.0, 6.5]
//! train = { months = 12 }
//! test = { months = 3 }
//! ```
//!
//! Missing tables and fields take their defaults. `validate()` rejects
//! values no component can run with.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use tqs_core::scanner::{ScannerConfig, SimulationConfig};
use tqs_core::stream::StreamConfig;

use crate::monte_carlo::MonteCarloConfig;
use crate::walk_forward::WalkForwardConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to render config as TOML: {0}")]
    Render(#[from] toml::ser::Error),
    #[error("failed to serialize config for hashing: {0}")]
    Hash(#[from] serde_json::Error),
    #[error("{field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TqsConfig {
    /// Master seed of the RNG hierarchy.
    pub seed: u64,
    pub scanner: ScannerConfig,
    pub simulation: SimulationConfig,
    pub stream: StreamConfig,
    pub monte_carlo: MonteCarloConfig,
    pub walk_forward: WalkForwardConfig,
}

impl Default for TqsConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            scanner: ScannerConfig::default(),
            simulation: SimulationConfig::default(),
            stream: StreamConfig::default(),
            monte_carlo: MonteCarloConfig::default(),
            walk_forward: WalkForwardConfig::default(),
        }
    }
}

impl TqsConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// BLAKE3 hash of the canonical JSON form. Identical configs hash
    /// identically; any parameter change changes the hash.
    pub fn config_hash(&self) -> Result<String, ConfigError> {
        let json = serde_json::to_string(self)?;
        Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_scanner()?;
        self.validate_simulation()?;
        self.validate_stream()?;
        if self.monte_carlo.trials == 0 {
            return Err(invalid("monte_carlo.trials", "must be at least 1"));
        }
        self.validate_walk_forward()
    }

    fn validate_scanner(&self) -> Result<(), ConfigError> {
        let s = &self.scanner;
        if !s.entry_threshold.is_finite() || !s.watchlist_threshold.is_finite() {
            return Err(invalid("scanner", "thresholds must be finite"));
        }
        if s.watchlist_threshold > s.entry_threshold {
            return Err(invalid(
                "scanner.watchlist_threshold",
                format!(
                    "{} exceeds the entry threshold {}",
                    s.watchlist_threshold, s.entry_threshold
                ),
            ));
        }
        if s.sentiment_tolerance_minutes < 0 {
            return Err(invalid("scanner.sentiment_tolerance_minutes", "must be >= 0"));
        }
        let ind = &s.indicators;
        let periods = [
            ("scanner.indicators.rvol_period", ind.rvol_period),
            ("scanner.indicators.macd_fast", ind.macd_fast),
            ("scanner.indicators.macd_slow", ind.macd_slow),
            ("scanner.indicators.macd_signal", ind.macd_signal),
            ("scanner.indicators.rsi_period", ind.rsi_period),
            ("scanner.indicators.sma_period", ind.sma_period),
        ];
        if let Some(&(field, _)) = periods.iter().find(|(_, p)| *p == 0) {
            return Err(invalid(field, "period must be >= 1"));
        }
        if ind.macd_fast >= ind.macd_slow {
            return Err(invalid(
                "scanner.indicators.macd_fast",
                format!("{} must be below macd_slow {}", ind.macd_fast, ind.macd_slow),
            ));
        }
        Ok(())
    }

    fn validate_simulation(&self) -> Result<(), ConfigError> {
        let s = &self.simulation;
        let positive = [
            ("simulation.start_balance", s.start_balance),
            ("simulation.risk_per_trade", s.risk_per_trade),
            ("simulation.r_win", s.r_win),
            ("simulation.r_loss", s.r_loss),
        ];
        if let Some(&(field, value)) = positive.iter().find(|(_, v)| !(v.is_finite() && *v > 0.0)) {
            return Err(invalid(field, format!("must be positive, got {value}")));
        }
        if !(0.0..=1.0).contains(&s.win_probability) {
            return Err(invalid(
                "simulation.win_probability",
                format!("must be in [0, 1], got {}", s.win_probability),
            ));
        }
        Ok(())
    }

    fn validate_stream(&self) -> Result<(), ConfigError> {
        let s = &self.stream;
        if s.capacity == 0 {
            return Err(invalid("stream.capacity", "must be at least 1"));
        }
        // Bar-only replay never holds more than `capacity` bars.
        if s.min_history > s.capacity {
            return Err(invalid(
                "stream.min_history",
                format!(
                    "{} exceeds capacity {}; bar replay would never evaluate",
                    s.min_history, s.capacity
                ),
            ));
        }
        if s.bar_interval_secs == 0 || 86_400 % s.bar_interval_secs != 0 {
            return Err(invalid(
                "stream.bar_interval_secs",
                format!("{} must divide one day", s.bar_interval_secs),
            ));
        }
        if s.watchlist_threshold > s.trade_threshold {
            return Err(invalid(
                "stream.watchlist_threshold",
                "exceeds the trade threshold",
            ));
        }
        if !(s.tick_size.is_finite() && s.tick_size > 0.0) {
            return Err(invalid("stream.tick_size", "must be positive"));
        }
        if s.donchian_period == 0 {
            return Err(invalid("stream.donchian_period", "must be at least 1"));
        }
        Ok(())
    }

    fn validate_walk_forward(&self) -> Result<(), ConfigError> {
        let wf = &self.walk_forward;
        if wf.threshold_grid.is_empty() {
            return Err(invalid("walk_forward.threshold_grid", "must not be empty"));
        }
        if wf.threshold_grid.iter().any(|t| !t.is_finite()) {
            return Err(invalid("walk_forward.threshold_grid", "values must be finite"));
        }
        if wf.threshold_grid.windows(2).any(|w| w[1] <= w[0]) {
            return Err(invalid(
                "walk_forward.threshold_grid",
                "must be strictly ascending",
            ));
        }
        if wf.train.is_empty() {
            return Err(invalid("walk_forward.train", "span must be non-zero"));
        }
        if wf.test.is_empty() {
            return Err(invalid("walk_forward.test", "span must be non-zero"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::walk_forward::WindowSpan;
    use tqs_core::zones::ZoneName;

    #[test]
    fn defaults_are_valid() {
        TqsConfig::default().validate().unwrap();
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config = TqsConfig::from_toml(
            r#"
            seed = 7

            [scanner]
            use_sentiment = false
            entry_threshold = 4.5

            [stream]
            sweep_zone = "nyHigh"

            [walk_forward]
            train = { days = 90 }
            "#,
        )
        .unwrap();
        assert_eq!(config.seed, 7);
        assert!(!config.scanner.use_sentiment);
        assert_eq!(config.scanner.entry_threshold, 4.5);
        assert_eq!(config.scanner.watchlist_threshold, 3.5);
        assert_eq!(config.stream.sweep_zone, ZoneName::NyHigh);
        assert_eq!(config.walk_forward.train, WindowSpan::Days(90));
        assert_eq!(config.walk_forward.test, WindowSpan::Months(3));
        assert_eq!(config.simulation, SimulationConfig::default());
    }

    #[test]
    fn unknown_zone_rejected() {
        let err = TqsConfig::from_toml("[stream]\nsweep_zone = \"tokyoLow\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn toml_roundtrip() {
        let config = TqsConfig::default();
        let text = config.to_toml().unwrap();
        assert_eq!(TqsConfig::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn hash_is_stable_and_sensitive() {
        let a = TqsConfig::default();
        let b = TqsConfig::default();
        assert_eq!(a.config_hash().unwrap(), b.config_hash().unwrap());

        let mut c = TqsConfig::default();
        c.scanner.entry_threshold = 5.5;
        assert_ne!(a.config_hash().unwrap(), c.config_hash().unwrap());

        let mut d = TqsConfig::default();
        d.seed = 43;
        assert_ne!(a.config_hash().unwrap(), d.config_hash().unwrap());
    }

    #[test]
    fn validation_catches_bad_values() {
        let cases: Vec<(fn(&mut TqsConfig), &str)> = vec![
            (|c| c.simulation.win_probability = 1.2, "simulation.win_probability"),
            (|c| c.simulation.risk_per_trade = 0.0, "simulation.risk_per_trade"),
            (|c| c.scanner.watchlist_threshold = 6.0, "scanner.watchlist_threshold"),
            (|c| c.scanner.indicators.macd_fast = 30, "scanner.indicators.macd_fast"),
            (|c| c.scanner.indicators.rsi_period = 0, "scanner.indicators.rsi_period"),
            (|c| c.stream.bar_interval_secs = 7, "stream.bar_interval_secs"),
            (|c| c.stream.min_history = 1_000, "stream.min_history"),
            (|c| c.monte_carlo.trials = 0, "monte_carlo.trials"),
            (|c| c.walk_forward.threshold_grid = vec![], "walk_forward.threshold_grid"),
            (
                |c| c.walk_forward.threshold_grid = vec![4.0, 3.0],
                "walk_forward.threshold_grid",
            ),
            (|c| c.walk_forward.test = WindowSpan::Days(0), "walk_forward.test"),
        ];
        for (mutate, expected) in cases {
            let mut config = TqsConfig::default();
            mutate(&mut config);
            match config.validate() {
                Err(ConfigError::Invalid { field, .. }) => assert_eq!(field, expected),
                other => panic!("expected {expected} to be rejected, got {other:?}"),
            }
        }
    }

    #[test]
    fn min_history_bounded_by_capacity() {
        let mut config = TqsConfig::default();
        config.stream.capacity = 50;
        config.stream.min_history = 50;
        assert!(config.validate().is_ok());

        config.stream.min_history = 51;
        match config.validate() {
            Err(ConfigError::Invalid { field, .. }) => assert_eq!(field, "stream.min_history"),
            other => panic!("expected min_history to be rejected, got {other:?}"),
        }
    }

    #[test]
    fn missing_file_reports_path() {
        let err = TqsConfig::from_file("/definitely/not/here.toml").unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.toml"));
    }
}
