//! Configuration file support for vitalboard
//!
//! Loads dashboard configuration from JSON files.
//!
//! Search order:
//! 1. Explicit path (--config CLI flag)
//! 2. `.vitalboardrc.json` in the working directory
//! 3. `vitalboard.config.json` in the working directory
//!
//! All fields are optional. CLI flags take precedence over config file values.

use crate::dataset::{Dataset, DatasetFiles};
use crate::transform::{ComparisonOrder, VitalMetric};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_PLOTLY_JS: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";
const DEFAULT_CHART_HEIGHT: u32 = 350;
const CHART_HEIGHT_RANGE: std::ops::RangeInclusive<u32> = 100..=2000;

/// vitalboard configuration loaded from a JSON config file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DashboardConfig {
    /// Directory holding the CSV exports (default: `data`)
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    /// URL of the plotly.js bundle referenced by rendered pages
    #[serde(default)]
    pub plotly_js: Option<String>,

    /// Height in pixels of full-size charts (default: 350)
    #[serde(default)]
    pub chart_height: Option<u32>,

    /// Metric shown by the weekly distribution chart (default: heart_rate)
    #[serde(default)]
    pub weekly_metric: Option<VitalMetric>,

    /// Order of yesterday/today pairs on comparison charts
    #[serde(default)]
    pub comparison_order: Option<ComparisonOrder>,

    /// Upper end of the sleep calendar color scale, in hours (default: 10)
    #[serde(default)]
    pub sleep_zmax: Option<f64>,

    /// Upper end of the fall calendar color scale, in events (default: 10)
    #[serde(default)]
    pub fall_zmax: Option<f64>,

    /// Fixed y-axis maximum of the distance chart, in metres (default: 3000)
    #[serde(default)]
    pub distance_axis_max: Option<f64>,

    /// Heart-rate gauge range and normal band
    #[serde(default)]
    pub gauge: Option<GaugeConfig>,

    /// Per-dataset file name overrides
    #[serde(default)]
    pub files: BTreeMap<Dataset, String>,
}

/// Heart-rate gauge settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GaugeConfig {
    /// Upper end of the dial (default: 150)
    pub max: Option<f64>,
    /// Lower bound of the normal band (default: 60)
    pub normal_low: Option<f64>,
    /// Upper bound of the normal band (default: 100)
    pub normal_high: Option<f64>,
}

/// Resolved gauge settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GaugeSettings {
    pub max: f64,
    pub normal_low: f64,
    pub normal_high: f64,
}

impl Default for GaugeSettings {
    fn default() -> Self {
        GaugeSettings {
            max: 150.0,
            normal_low: 60.0,
            normal_high: 100.0,
        }
    }
}

/// Resolved chart settings shared by every figure builder
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSettings {
    pub height: u32,
    pub weekly_metric: VitalMetric,
    pub comparison_order: ComparisonOrder,
    pub sleep_zmax: f64,
    pub fall_zmax: f64,
    pub distance_axis_max: f64,
    pub gauge: GaugeSettings,
}

impl Default for ChartSettings {
    fn default() -> Self {
        ChartSettings {
            height: DEFAULT_CHART_HEIGHT,
            weekly_metric: VitalMetric::default(),
            comparison_order: ComparisonOrder::default(),
            sleep_zmax: 10.0,
            fall_zmax: 10.0,
            distance_axis_max: 3000.0,
            gauge: GaugeSettings::default(),
        }
    }
}

/// Resolved configuration with defaults applied
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub data_dir: PathBuf,
    pub files: DatasetFiles,
    pub plotly_js: String,
    pub chart: ChartSettings,
    /// Path the config was loaded from (None if defaults)
    pub config_path: Option<PathBuf>,
}

impl DashboardConfig {
    /// Validate the configuration for logical errors
    pub fn validate(&self) -> Result<()> {
        if let Some(height) = self.chart_height {
            if !CHART_HEIGHT_RANGE.contains(&height) {
                anyhow::bail!(
                    "chart_height must be between {} and {} (got {})",
                    CHART_HEIGHT_RANGE.start(),
                    CHART_HEIGHT_RANGE.end(),
                    height
                );
            }
        }

        for (name, val) in [
            ("sleep_zmax", self.sleep_zmax),
            ("fall_zmax", self.fall_zmax),
            ("distance_axis_max", self.distance_axis_max),
        ] {
            if let Some(v) = val {
                if !v.is_finite() || v <= 0.0 {
                    anyhow::bail!("{} must be positive (got {})", name, v);
                }
            }
        }

        if let Some(ref url) = self.plotly_js {
            if url.trim().is_empty() {
                anyhow::bail!("plotly_js must not be empty");
            }
        }

        if let Some(ref g) = self.gauge {
            let defaults = GaugeSettings::default();
            let max = g.max.unwrap_or(defaults.max);
            let low = g.normal_low.unwrap_or(defaults.normal_low);
            let high = g.normal_high.unwrap_or(defaults.normal_high);

            if max <= 0.0 {
                anyhow::bail!("gauge.max must be positive (got {})", max);
            }
            if low < 0.0 {
                anyhow::bail!("gauge.normal_low must be non-negative (got {})", low);
            }
            if low >= high {
                anyhow::bail!(
                    "gauge.normal_low ({}) must be less than gauge.normal_high ({})",
                    low,
                    high
                );
            }
            if high > max {
                anyhow::bail!(
                    "gauge.normal_high ({}) must not exceed gauge.max ({})",
                    high,
                    max
                );
            }
        }

        for (dataset, file) in &self.files {
            if file.trim().is_empty() {
                anyhow::bail!("files.{} must not be empty", dataset);
            }
        }

        Ok(())
    }

    /// Resolve config into the form used for rendering
    pub fn resolve(&self) -> Result<ResolvedConfig> {
        self.validate()?;

        let defaults = ChartSettings::default();
        let gauge = match &self.gauge {
            Some(g) => GaugeSettings {
                max: g.max.unwrap_or(defaults.gauge.max),
                normal_low: g.normal_low.unwrap_or(defaults.gauge.normal_low),
                normal_high: g.normal_high.unwrap_or(defaults.gauge.normal_high),
            },
            None => defaults.gauge,
        };

        Ok(ResolvedConfig {
            data_dir: self
                .data_dir
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            files: DatasetFiles::with_overrides(self.files.clone()),
            plotly_js: self
                .plotly_js
                .clone()
                .unwrap_or_else(|| DEFAULT_PLOTLY_JS.to_string()),
            chart: ChartSettings {
                height: self.chart_height.unwrap_or(defaults.height),
                weekly_metric: self.weekly_metric.unwrap_or(defaults.weekly_metric),
                comparison_order: self.comparison_order.unwrap_or(defaults.comparison_order),
                sleep_zmax: self.sleep_zmax.unwrap_or(defaults.sleep_zmax),
                fall_zmax: self.fall_zmax.unwrap_or(defaults.fall_zmax),
                distance_axis_max: self.distance_axis_max.unwrap_or(defaults.distance_axis_max),
                gauge,
            },
            config_path: None,
        })
    }
}

impl ResolvedConfig {
    /// Build a ResolvedConfig with all defaults (no config file)
    pub fn defaults() -> Result<Self> {
        DashboardConfig::default().resolve()
    }
}

/// Discover and load a config file from the working directory
///
/// Search order:
/// 1. `.vitalboardrc.json`
/// 2. `vitalboard.config.json`
///
/// Returns `None` if no config file is found (use defaults).
pub fn discover_config(root: &Path) -> Result<Option<(DashboardConfig, PathBuf)>> {
    for name in [".vitalboardrc.json", "vitalboard.config.json"] {
        let path = root.join(name);
        if path.exists() {
            let config = load_config_file(&path)?;
            return Ok(Some((config, path)));
        }
    }
    Ok(None)
}

/// Load config from an explicit file path
pub fn load_config_file(path: &Path) -> Result<DashboardConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;

    let config: DashboardConfig = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse config file: {}", path.display()))?;

    config
        .validate()
        .with_context(|| format!("invalid config in: {}", path.display()))?;

    Ok(config)
}

/// Load and resolve config
///
/// If `config_path` is provided, loads from that file.
/// Otherwise, discovers config from `root`.
/// Returns default config if nothing is found. A relative `data_dir` is
/// taken relative to `root`.
pub fn load_and_resolve(root: &Path, config_path: Option<&Path>) -> Result<ResolvedConfig> {
    let (config, source_path) = if let Some(path) = config_path {
        let config = load_config_file(path)?;
        (config, Some(path.to_path_buf()))
    } else {
        match discover_config(root)? {
            Some((config, path)) => (config, Some(path)),
            None => (DashboardConfig::default(), None),
        }
    };

    let mut resolved = config.resolve()?;
    if resolved.data_dir.is_relative() {
        resolved.data_dir = root.join(&resolved.data_dir);
    }
    resolved.config_path = source_path;
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_default_config_is_valid() {
        let config = DashboardConfig::default();
        config.validate().expect("default config should be valid");
        let resolved = config.resolve().expect("default config should resolve");
        assert_eq!(resolved.data_dir, PathBuf::from("data"));
        assert_eq!(resolved.chart.height, 350);
        assert_eq!(resolved.chart.weekly_metric, VitalMetric::HeartRate);
        assert_eq!(resolved.chart.comparison_order, ComparisonOrder::PreviousFirst);
        assert_eq!(resolved.chart.sleep_zmax, 10.0);
        assert_eq!(resolved.chart.fall_zmax, 10.0);
        assert_eq!(resolved.chart.distance_axis_max, 3000.0);
        assert_eq!(resolved.chart.gauge, GaugeSettings::default());
        assert!(resolved.plotly_js.starts_with("https://"));
    }

    #[test]
    fn test_parse_minimal_config() {
        let config: DashboardConfig = serde_json::from_str("{}").unwrap();
        config.validate().unwrap();
    }

    #[test]
    fn test_parse_full_config() {
        let json = r#"{
            "data_dir": "exports",
            "plotly_js": "assets/plotly.min.js",
            "chart_height": 420,
            "weekly_metric": "respiration",
            "comparison_order": "current_first",
            "sleep_zmax": 12,
            "fall_zmax": 5,
            "distance_axis_max": 2500,
            "gauge": {"max": 180, "normal_low": 55, "normal_high": 110},
            "files": {"anomalies": "alerts.csv"}
        }"#;
        let config: DashboardConfig = serde_json::from_str(json).unwrap();
        let resolved = config.resolve().unwrap();
        assert_eq!(resolved.data_dir, PathBuf::from("exports"));
        assert_eq!(resolved.plotly_js, "assets/plotly.min.js");
        assert_eq!(resolved.chart.height, 420);
        assert_eq!(resolved.chart.weekly_metric, VitalMetric::Respiration);
        assert_eq!(resolved.chart.comparison_order, ComparisonOrder::CurrentFirst);
        assert_eq!(resolved.chart.sleep_zmax, 12.0);
        assert_eq!(resolved.chart.fall_zmax, 5.0);
        assert_eq!(resolved.chart.distance_axis_max, 2500.0);
        assert_eq!(resolved.chart.gauge.normal_high, 110.0);
        assert_eq!(resolved.files.file_name(Dataset::Anomalies), "alerts.csv");
        assert_eq!(resolved.files.file_name(Dataset::Falls), "fall.csv");
    }

    #[test]
    fn test_reject_unknown_fields() {
        let result: Result<DashboardConfig, _> = serde_json::from_str(r#"{"unknown_field": true}"#);
        assert!(result.is_err(), "unknown fields should be rejected");
        let result: Result<DashboardConfig, _> =
            serde_json::from_str(r#"{"gauge": {"min": 0}}"#);
        assert!(result.is_err(), "unknown gauge fields should be rejected");
    }

    #[test]
    fn test_reject_unknown_dataset_in_files() {
        let result: Result<DashboardConfig, _> =
            serde_json::from_str(r#"{"files": {"vitals": "v.csv"}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_reject_empty_file_override() {
        let config: DashboardConfig =
            serde_json::from_str(r#"{"files": {"falls": " "}}"#).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_reject_chart_height_out_of_range() {
        for height in [0, 99, 2001] {
            let config = DashboardConfig {
                chart_height: Some(height),
                ..Default::default()
            };
            let err = config.validate().unwrap_err();
            assert!(err.to_string().contains("chart_height"));
        }
    }

    #[test]
    fn test_reject_non_positive_scale_max() {
        let config: DashboardConfig = serde_json::from_str(r#"{"fall_zmax": 0}"#).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("fall_zmax"));
    }

    #[test]
    fn test_reject_unordered_gauge_band() {
        let config: DashboardConfig =
            serde_json::from_str(r#"{"gauge": {"normal_low": 100, "normal_high": 60}}"#).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_reject_gauge_band_above_max() {
        let config: DashboardConfig =
            serde_json::from_str(r#"{"gauge": {"max": 90}}"#).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("gauge.max"));
    }

    #[test]
    fn test_partial_gauge_uses_defaults_for_rest() {
        let config: DashboardConfig =
            serde_json::from_str(r#"{"gauge": {"max": 200}}"#).unwrap();
        let resolved = config.resolve().unwrap();
        assert_eq!(resolved.chart.gauge.max, 200.0);
        assert_eq!(resolved.chart.gauge.normal_low, 60.0); // default
        assert_eq!(resolved.chart.gauge.normal_high, 100.0); // default
    }

    #[test]
    fn test_discover_vitalboardrc() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join(".vitalboardrc.json");
        fs::write(&config_path, r#"{"chart_height": 500}"#).unwrap();

        let (config, path) = discover_config(dir.path()).unwrap().unwrap();
        assert_eq!(config.chart_height, Some(500));
        assert_eq!(path, config_path);
    }

    #[test]
    fn test_discover_vitalboard_config_json() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("vitalboard.config.json"),
            r#"{"weekly_metric": "respiration"}"#,
        )
        .unwrap();

        let (config, _) = discover_config(dir.path()).unwrap().unwrap();
        assert_eq!(config.weekly_metric, Some(VitalMetric::Respiration));
    }

    #[test]
    fn test_discover_priority_order() {
        let dir = tempfile::tempdir().unwrap();

        // Create both config files - .vitalboardrc.json should win
        fs::write(dir.path().join(".vitalboardrc.json"), r#"{"chart_height": 300}"#).unwrap();
        fs::write(
            dir.path().join("vitalboard.config.json"),
            r#"{"chart_height": 400}"#,
        )
        .unwrap();

        let (config, _) = discover_config(dir.path()).unwrap().unwrap();
        assert_eq!(
            config.chart_height,
            Some(300),
            ".vitalboardrc.json should take priority"
        );
    }

    #[test]
    fn test_no_config_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(discover_config(dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_invalid_discovered_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(".vitalboardrc.json"), r#"{"chart_height": 5}"#).unwrap();
        let err = discover_config(dir.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("chart_height"));
    }

    #[test]
    fn test_load_and_resolve_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let resolved = load_and_resolve(dir.path(), None).unwrap();
        assert!(resolved.config_path.is_none());
        assert_eq!(resolved.data_dir, dir.path().join("data"));
    }

    #[test]
    fn test_load_and_resolve_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("custom.json");
        fs::write(&config_path, r#"{"data_dir": "/srv/exports"}"#).unwrap();

        let resolved = load_and_resolve(dir.path(), Some(&config_path)).unwrap();
        assert_eq!(resolved.data_dir, PathBuf::from("/srv/exports"));
        assert_eq!(resolved.config_path, Some(config_path));
    }
}
