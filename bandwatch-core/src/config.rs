//! Serializable detector configuration.
//!
//! A single `BandwatchConfig` captures everything needed to reproduce a scan:
//! band parameters, marker offset mode, ingestion mode and the warm-up trim.
//! Every section has defaults, so a TOML file only needs the keys it changes.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::buffer::IngestMode;
use crate::detector::{BandCrossingDetector, OffsetMode};
use crate::indicators::Bollinger;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("serialize config TOML: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error("unknown preset '{0}'. Valid: classic, legacy")]
    UnknownPreset(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BandwatchConfig {
    pub bands: BandConfig,
    pub offset: OffsetMode,
    pub ingest: IngestConfig,
    pub analysis: AnalysisConfig,
}

/// Rolling-statistics parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BandConfig {
    /// Moving-average window, in bars.
    pub window: usize,
    /// Standard deviation multiplier.
    pub deviation: f64,
}

impl Default for BandConfig {
    fn default() -> Self {
        Self {
            window: 20,
            deviation: 2.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    pub mode: IngestMode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Bars earlier than `earliest + trim_minutes` are cut from the output.
    pub trim_minutes: u32,
    /// Run even when fewer than `window` bars are buffered.
    pub allow_partial: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            trim_minutes: 60,
            allow_partial: false,
        }
    }
}

impl Default for BandwatchConfig {
    fn default() -> Self {
        Self::classic()
    }
}

impl BandwatchConfig {
    /// 20-bar window, 2.0 deviations, volatility-adaptive markers.
    pub fn classic() -> Self {
        Self {
            bands: BandConfig::default(),
            offset: OffsetMode::default(),
            ingest: IngestConfig::default(),
            analysis: AnalysisConfig::default(),
        }
    }

    /// 15-bar window, 2.4 deviations, fixed 0.2% markers.
    pub fn legacy() -> Self {
        Self {
            bands: BandConfig {
                window: 15,
                deviation: 2.4,
            },
            offset: OffsetMode::Fixed {
                upper: 0.002,
                lower: 0.002,
            },
            ingest: IngestConfig::default(),
            analysis: AnalysisConfig::default(),
        }
    }

    pub fn preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "classic" => Ok(Self::classic()),
            "legacy" => Ok(Self::legacy()),
            other => Err(ConfigError::UnknownPreset(other.to_string())),
        }
    }

    /// Load and validate a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bands.window == 0 {
            return Err(ConfigError::Invalid("bands.window must be >= 1".into()));
        }
        if !(self.bands.deviation > 0.0 && self.bands.deviation.is_finite()) {
            return Err(ConfigError::Invalid(
                "bands.deviation must be positive and finite".into(),
            ));
        }
        let (up, lo) = match self.offset {
            OffsetMode::Fixed { upper, lower } => (upper, lower),
            OffsetMode::Adaptive { upper_k, lower_k } => (upper_k, lower_k),
        };
        if !(up >= 0.0 && up.is_finite() && lo >= 0.0 && lo.is_finite()) {
            return Err(ConfigError::Invalid(
                "offset values must be non-negative and finite".into(),
            ));
        }
        Ok(())
    }

    /// Band indicator for these parameters. Fails instead of building an
    /// indicator from invalid ones.
    pub fn indicator(&self) -> Result<Bollinger, ConfigError> {
        self.validate()?;
        Ok(Bollinger::new(self.bands.window, self.bands.deviation))
    }

    pub fn detector(&self) -> BandCrossingDetector {
        BandCrossingDetector::new(self.offset)
    }

    /// Deterministic content hash: identical configs share a fingerprint.
    pub fn fingerprint(&self) -> String {
        let json = serde_json::to_string(self).unwrap_or_default();
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::BandIndicator;
    use std::io::Write;

    #[test]
    fn empty_toml_is_classic() {
        let config = BandwatchConfig::from_toml("").unwrap();
        assert_eq!(config, BandwatchConfig::classic());
    }

    #[test]
    fn partial_sections_keep_defaults() {
        let config = BandwatchConfig::from_toml(
            r#"
[bands]
window = 15

[ingest]
mode = "tolerant"
"#,
        )
        .unwrap();
        assert_eq!(config.bands.window, 15);
        assert_eq!(config.bands.deviation, 2.0);
        assert_eq!(config.ingest.mode, IngestMode::Tolerant);
        assert_eq!(config.analysis.trim_minutes, 60);
    }

    #[test]
    fn fixed_offset_section() {
        let config = BandwatchConfig::from_toml(
            r#"
[offset]
mode = "fixed"
upper = 0.002
lower = 0.004
"#,
        )
        .unwrap();
        assert_eq!(
            config.offset,
            OffsetMode::Fixed {
                upper: 0.002,
                lower: 0.004
            }
        );
    }

    #[test]
    fn rejects_zero_window() {
        let err = BandwatchConfig::from_toml("[bands]\nwindow = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn indicator_rejects_unvalidated_parameters() {
        let mut config = BandwatchConfig::classic();
        config.bands.window = 0;
        assert!(matches!(config.indicator(), Err(ConfigError::Invalid(_))));
        config.bands.window = 20;
        config.bands.deviation = -1.0;
        assert!(matches!(config.indicator(), Err(ConfigError::Invalid(_))));
        config.bands.deviation = 2.0;
        assert_eq!(config.indicator().unwrap().lookback(), 19);
    }

    #[test]
    fn rejects_negative_offset() {
        let err = BandwatchConfig::from_toml(
            "[offset]\nmode = \"adaptive\"\nupper_k = -0.1\nlower_k = 0.08",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_unknown_ingest_mode() {
        let err = BandwatchConfig::from_toml("[ingest]\nmode = \"sorted\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn presets() {
        let legacy = BandwatchConfig::preset("legacy").unwrap();
        assert_eq!(legacy.bands.window, 15);
        assert_eq!(legacy.bands.deviation, 2.4);
        assert!(matches!(
            BandwatchConfig::preset("turbo"),
            Err(ConfigError::UnknownPreset(_))
        ));
    }

    #[test]
    fn toml_roundtrip_preserves_preset() {
        let legacy = BandwatchConfig::legacy();
        let text = legacy.to_toml().unwrap();
        assert_eq!(BandwatchConfig::from_toml(&text).unwrap(), legacy);
    }

    #[test]
    fn fingerprint_is_deterministic_and_sensitive() {
        let a = BandwatchConfig::classic();
        assert_eq!(a.fingerprint(), BandwatchConfig::classic().fingerprint());
        assert_ne!(a.fingerprint(), BandwatchConfig::legacy().fingerprint());
        assert_eq!(a.fingerprint().len(), 64);
    }

    #[test]
    fn from_file_reads_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[analysis]\ntrim_minutes = 0\nallow_partial = true").unwrap();
        let config = BandwatchConfig::from_file(file.path()).unwrap();
        assert_eq!(config.analysis.trim_minutes, 0);
        assert!(config.analysis.allow_partial);
    }

    #[test]
    fn from_file_missing_names_path() {
        let err = BandwatchConfig::from_file(Path::new("/nonexistent/bandwatch.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/bandwatch.toml"));
    }
}
