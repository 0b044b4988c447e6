use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::{ScoreBand, ScoreThresholds};

/// Worst-case stand-ins used when a metric is unavailable.
const UNKNOWN_MISSING_PCT: f64 = 100.0;
const UNKNOWN_CRITICAL_COUNT: usize = 999;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum QualityScore {
    Excellent,
    Good,
    Fair,
    #[serde(rename = "Needs Review")]
    NeedsReview,
}

impl QualityScore {
    pub fn label(&self) -> &'static str {
        match self {
            QualityScore::Excellent => "Excellent",
            QualityScore::Good => "Good",
            QualityScore::Fair => "Fair",
            QualityScore::NeedsReview => "Needs Review",
        }
    }
}

impl fmt::Display for QualityScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Maps worst-case missingness and the critical issue count to a label.
///
/// Bands are tried best first; a band applies only when both of its bounds
/// hold.
pub fn score(
    max_missing_pct: Option<f64>,
    critical_count: Option<usize>,
    thresholds: &ScoreThresholds,
) -> QualityScore {
    let missing = max_missing_pct
        .filter(|pct| !pct.is_nan())
        .unwrap_or(UNKNOWN_MISSING_PCT);
    let critical = critical_count.unwrap_or(UNKNOWN_CRITICAL_COUNT);
    let within = |band: &ScoreBand| {
        missing <= band.max_missing_pct && critical <= band.max_critical_issues
    };

    [
        (QualityScore::Excellent, &thresholds.excellent),
        (QualityScore::Good, &thresholds.good),
        (QualityScore::Fair, &thresholds.fair),
    ]
    .into_iter()
    .find(|(_, band)| within(band))
    .map_or(QualityScore::NeedsReview, |(label, _)| label)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_bands() {
        let thresholds = ScoreThresholds::default();
        assert_eq!(score(Some(3.0), Some(0), &thresholds), QualityScore::Excellent);
        assert_eq!(score(Some(7.0), Some(1), &thresholds), QualityScore::Good);
        assert_eq!(score(Some(15.0), Some(3), &thresholds), QualityScore::Fair);
        assert_eq!(score(Some(25.0), Some(0), &thresholds), QualityScore::NeedsReview);
    }

    #[test]
    fn both_bounds_must_hold() {
        let thresholds = ScoreThresholds::default();
        assert_eq!(score(Some(0.0), Some(1), &thresholds), QualityScore::Good);
        assert_eq!(score(Some(0.0), Some(6), &thresholds), QualityScore::NeedsReview);
        assert_eq!(score(Some(5.0), Some(0), &thresholds), QualityScore::Excellent);
        assert_eq!(score(Some(20.0), Some(5), &thresholds), QualityScore::Fair);
    }

    #[test]
    fn unknown_metrics_force_worst_score() {
        let thresholds = ScoreThresholds::default();
        assert_eq!(score(None, Some(0), &thresholds), QualityScore::NeedsReview);
        assert_eq!(score(Some(0.0), None, &thresholds), QualityScore::NeedsReview);
        assert_eq!(score(Some(f64::NAN), Some(0), &thresholds), QualityScore::NeedsReview);
    }

    #[test]
    fn custom_bands_are_honoured() {
        let thresholds = ScoreThresholds {
            excellent: ScoreBand::new(0.0, 0),
            good: ScoreBand::new(50.0, 10),
            fair: ScoreBand::new(80.0, 20),
        };
        assert_eq!(score(Some(1.0), Some(0), &thresholds), QualityScore::Good);
    }

    #[test]
    fn label_serializes_with_space() {
        assert_eq!(QualityScore::NeedsReview.to_string(), "Needs Review");
        let json = serde_json::to_string(&QualityScore::NeedsReview).unwrap();
        assert_eq!(json, "\"Needs Review\"");
    }
}
