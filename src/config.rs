//! Profiling configuration.
//!
//! Configuration arrives as a YAML document in which every key is optional
//! ([`RawConfig`]). It is resolved exactly once into a [`ProfileConfig`] with
//! all defaults merged, validated, and identifier patterns compiled. The
//! resolved struct is then passed by reference through every profiling stage;
//! no stage consults a default of its own.

use std::{fs, path::Path};

use anyhow::{Context, Result as AnyResult};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::{
    data::format_number,
    error::{ProfileError, Result},
};

pub const DEFAULT_MIN_FREQUENCY_PCT: f64 = 1.0;
pub const DEFAULT_MAX_UNIQUE_FOR_DETECTION: usize = 50;
pub const DEFAULT_DECIMAL_PLACES: u32 = 2;
pub const DEFAULT_TOP_N_CATEGORIES: usize = 15;
const MAX_DECIMAL_PLACES: u32 = 10;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawSentinelDetection {
    pub numeric_sentinels: Option<Vec<f64>>,
    pub string_sentinels: Option<Vec<String>>,
    pub min_frequency_pct: Option<f64>,
    pub max_unique_for_detection: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawMissingnessThresholds {
    pub critical: Option<f64>,
    pub high: Option<f64>,
    pub moderate: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawScoreBand {
    pub max_missing_pct: Option<f64>,
    pub max_critical_issues: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawScoreThresholds {
    pub excellent: Option<RawScoreBand>,
    pub good: Option<RawScoreBand>,
    pub fair: Option<RawScoreBand>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawDisplay {
    pub decimal_places: Option<i64>,
    pub top_n_categories: Option<i64>,
}

/// Configuration exactly as supplied; anything absent falls back to defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawConfig {
    pub sentinel_detection: Option<RawSentinelDetection>,
    pub missingness_thresholds: Option<RawMissingnessThresholds>,
    pub quality_score_thresholds: Option<RawScoreThresholds>,
    pub identifier_columns: Option<Vec<String>>,
    pub identifier_patterns: Option<Vec<String>>,
    pub display: Option<RawDisplay>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentinelConfig {
    pub numeric_sentinels: Vec<f64>,
    pub string_sentinels: Vec<String>,
    pub min_frequency_pct: f64,
    pub max_unique_for_detection: usize,
}

impl Default for SentinelConfig {
    fn default() -> Self {
        Self {
            numeric_sentinels: Vec::new(),
            string_sentinels: Vec::new(),
            min_frequency_pct: DEFAULT_MIN_FREQUENCY_PCT,
            max_unique_for_detection: DEFAULT_MAX_UNIQUE_FOR_DETECTION,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MissingnessThresholds {
    pub critical: f64,
    pub high: f64,
    pub moderate: f64,
}

impl Default for MissingnessThresholds {
    fn default() -> Self {
        Self {
            critical: 0.0,
            high: 20.0,
            moderate: 10.0,
        }
    }
}

/// Upper bounds a table must stay within to earn one quality label.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreBand {
    pub max_missing_pct: f64,
    pub max_critical_issues: usize,
}

impl ScoreBand {
    pub const fn new(max_missing_pct: f64, max_critical_issues: usize) -> Self {
        Self {
            max_missing_pct,
            max_critical_issues,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreThresholds {
    pub excellent: ScoreBand,
    pub good: ScoreBand,
    pub fair: ScoreBand,
}

impl Default for ScoreThresholds {
    fn default() -> Self {
        Self {
            excellent: ScoreBand::new(5.0, 0),
            good: ScoreBand::new(10.0, 2),
            fair: ScoreBand::new(20.0, 5),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DisplayConfig {
    pub decimal_places: u32,
    pub top_n_categories: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            decimal_places: DEFAULT_DECIMAL_PLACES,
            top_n_categories: DEFAULT_TOP_N_CATEGORIES,
        }
    }
}

/// Fully resolved configuration handed to every profiling stage.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileConfig {
    pub sentinel_detection: SentinelConfig,
    pub missingness_thresholds: MissingnessThresholds,
    pub quality_score_thresholds: ScoreThresholds,
    pub identifier_columns: Vec<String>,
    pub identifier_patterns: Vec<String>,
    #[serde(skip)]
    identifier_regexes: Vec<Regex>,
    pub display: DisplayConfig,
}

impl ProfileConfig {
    /// Merges `raw` over the defaults, compiles patterns and validates.
    pub fn resolve(raw: RawConfig) -> Result<Self> {
        let defaults = Self::default();

        let sentinel_detection = match raw.sentinel_detection {
            Some(section) => SentinelConfig {
                numeric_sentinels: section
                    .numeric_sentinels
                    .unwrap_or(defaults.sentinel_detection.numeric_sentinels),
                string_sentinels: section
                    .string_sentinels
                    .unwrap_or(defaults.sentinel_detection.string_sentinels),
                min_frequency_pct: section
                    .min_frequency_pct
                    .unwrap_or(defaults.sentinel_detection.min_frequency_pct),
                max_unique_for_detection: non_negative(
                    "sentinel_detection.max_unique_for_detection",
                    section.max_unique_for_detection,
                )?
                .unwrap_or(defaults.sentinel_detection.max_unique_for_detection),
            },
            None => defaults.sentinel_detection,
        };

        let missingness_thresholds = match raw.missingness_thresholds {
            Some(section) => MissingnessThresholds {
                critical: section
                    .critical
                    .unwrap_or(defaults.missingness_thresholds.critical),
                high: section.high.unwrap_or(defaults.missingness_thresholds.high),
                moderate: section
                    .moderate
                    .unwrap_or(defaults.missingness_thresholds.moderate),
            },
            None => defaults.missingness_thresholds,
        };

        let quality_score_thresholds = match raw.quality_score_thresholds {
            Some(section) => {
                let fallback = defaults.quality_score_thresholds;
                ScoreThresholds {
                    excellent: resolve_band("excellent", section.excellent, fallback.excellent)?,
                    good: resolve_band("good", section.good, fallback.good)?,
                    fair: resolve_band("fair", section.fair, fallback.fair)?,
                }
            }
            None => defaults.quality_score_thresholds,
        };

        let display = match raw.display {
            Some(section) => DisplayConfig {
                decimal_places: non_negative("display.decimal_places", section.decimal_places)?
                    .map(|places| places.min(u32::MAX as usize) as u32)
                    .unwrap_or(defaults.display.decimal_places),
                top_n_categories: non_negative(
                    "display.top_n_categories",
                    section.top_n_categories,
                )?
                .unwrap_or(defaults.display.top_n_categories),
            },
            None => defaults.display,
        };

        let config = Self {
            sentinel_detection,
            missingness_thresholds,
            quality_score_thresholds,
            identifier_columns: raw.identifier_columns.unwrap_or_default(),
            identifier_patterns: Vec::new(),
            identifier_regexes: Vec::new(),
            display,
        }
        .with_identifier_patterns(raw.identifier_patterns.unwrap_or_default())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_str(input: &str) -> Result<Self> {
        if input.trim().is_empty() {
            return Ok(Self::default());
        }
        let raw: Option<RawConfig> = serde_yaml::from_str(input)
            .map_err(|err| ProfileError::configuration("config", err.to_string()))?;
        Self::resolve(raw.unwrap_or_default())
    }

    pub fn load(path: &Path) -> AnyResult<Self> {
        let contents =
            fs::read_to_string(path).with_context(|| format!("Opening config file {path:?}"))?;
        let config = Self::from_yaml_str(&contents)
            .with_context(|| format!("Resolving config file {path:?}"))?;
        Ok(config)
    }

    pub fn to_yaml_string(&self) -> AnyResult<String> {
        serde_yaml::to_string(self).context("Serializing configuration")
    }

    pub fn with_numeric_sentinels(mut self, sentinels: Vec<f64>) -> Self {
        self.sentinel_detection.numeric_sentinels = sentinels;
        self
    }

    pub fn with_string_sentinels<I, S>(mut self, sentinels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sentinel_detection.string_sentinels = sentinels.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_identifier_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.identifier_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Replaces the identifier patterns; patterns match case-insensitively.
    pub fn with_identifier_patterns<I, S>(mut self, patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let patterns: Vec<String> = patterns.into_iter().map(Into::into).collect();
        let regexes = patterns
            .iter()
            .map(|pattern| {
                RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .map_err(|err| {
                        ProfileError::configuration(
                            "identifier_patterns",
                            format!("pattern '{pattern}' does not compile: {err}"),
                        )
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        self.identifier_patterns = patterns;
        self.identifier_regexes = regexes;
        Ok(self)
    }

    pub fn with_missingness_thresholds(mut self, thresholds: MissingnessThresholds) -> Self {
        self.missingness_thresholds = thresholds;
        self
    }

    pub fn with_score_thresholds(mut self, thresholds: ScoreThresholds) -> Self {
        self.quality_score_thresholds = thresholds;
        self
    }

    pub fn with_decimal_places(mut self, places: u32) -> Self {
        self.display.decimal_places = places;
        self
    }

    pub fn with_top_n_categories(mut self, top: usize) -> Self {
        self.display.top_n_categories = top;
        self
    }

    pub fn with_min_frequency_pct(mut self, pct: f64) -> Self {
        self.sentinel_detection.min_frequency_pct = pct;
        self
    }

    pub fn with_max_unique_for_detection(mut self, max_unique: usize) -> Self {
        self.sentinel_detection.max_unique_for_detection = max_unique;
        self
    }

    pub fn decimal_places(&self) -> u32 {
        self.display.decimal_places
    }

    /// Whether `column_name` names an identifier, by exact name
    /// (case-insensitive) or by any configured pattern.
    pub fn is_identifier(&self, column_name: &str) -> bool {
        self.identifier_columns
            .iter()
            .any(|name| name.eq_ignore_ascii_case(column_name))
            || self
                .identifier_regexes
                .iter()
                .any(|regex| regex.is_match(column_name))
    }

    /// Configured numeric sentinels in the text form they are matched by.
    pub fn numeric_sentinel_tokens(&self) -> Vec<String> {
        self.sentinel_detection
            .numeric_sentinels
            .iter()
            .map(|value| format_number(*value))
            .collect()
    }

    pub fn validate(&self) -> Result<()> {
        let thresholds = &self.missingness_thresholds;
        for (key, value) in [
            ("missingness_thresholds.critical", thresholds.critical),
            ("missingness_thresholds.high", thresholds.high),
            ("missingness_thresholds.moderate", thresholds.moderate),
        ] {
            ensure_percentage(key, value)?;
        }
        if thresholds.moderate > thresholds.high {
            return Err(ProfileError::configuration(
                "missingness_thresholds.moderate",
                format!(
                    "moderate threshold ({}) cannot exceed high threshold ({})",
                    thresholds.moderate, thresholds.high
                ),
            ));
        }

        let bands = &self.quality_score_thresholds;
        for (name, band) in [
            ("excellent", bands.excellent),
            ("good", bands.good),
            ("fair", bands.fair),
        ] {
            ensure_percentage(
                &format!("quality_score_thresholds.{name}.max_missing_pct"),
                band.max_missing_pct,
            )?;
        }

        ensure_percentage(
            "sentinel_detection.min_frequency_pct",
            self.sentinel_detection.min_frequency_pct,
        )?;
        if let Some(bad) = self
            .sentinel_detection
            .numeric_sentinels
            .iter()
            .find(|value| !value.is_finite())
        {
            return Err(ProfileError::configuration(
                "sentinel_detection.numeric_sentinels",
                format!("sentinel {bad} is not a finite number"),
            ));
        }

        if self.display.decimal_places > MAX_DECIMAL_PLACES {
            return Err(ProfileError::configuration(
                "display.decimal_places",
                format!(
                    "{} exceeds the maximum of {MAX_DECIMAL_PLACES}",
                    self.display.decimal_places
                ),
            ));
        }
        if self.display.top_n_categories == 0 {
            return Err(ProfileError::configuration(
                "display.top_n_categories",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

fn resolve_band(name: &str, raw: Option<RawScoreBand>, fallback: ScoreBand) -> Result<ScoreBand> {
    let Some(raw) = raw else {
        return Ok(fallback);
    };
    Ok(ScoreBand {
        max_missing_pct: raw.max_missing_pct.unwrap_or(fallback.max_missing_pct),
        max_critical_issues: non_negative(
            &format!("quality_score_thresholds.{name}.max_critical_issues"),
            raw.max_critical_issues,
        )?
        .unwrap_or(fallback.max_critical_issues),
    })
}

fn non_negative(key: &str, value: Option<i64>) -> Result<Option<usize>> {
    match value {
        Some(v) if v < 0 => Err(ProfileError::configuration(
            key,
            format!("expected a non-negative integer, got {v}"),
        )),
        Some(v) => Ok(Some(v as usize)),
        None => Ok(None),
    }
}

fn ensure_percentage(key: &str, value: f64) -> Result<()> {
    if !value.is_finite() || !(0.0..=100.0).contains(&value) {
        return Err(ProfileError::configuration(
            key,
            format!("expected a percentage between 0 and 100, got {value}"),
        ));
    }
    Ok(())
}
