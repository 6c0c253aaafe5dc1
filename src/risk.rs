//! Qualitative risk banding from the P50/P90 spread.

use std::fmt;

use serde::Serialize;

/// Lower bound (GWh, inclusive) of the moderate band.
pub const MODERATE_SPREAD_GWH: f64 = 0.5;
/// Lower bound (GWh, inclusive) of the high band.
pub const HIGH_SPREAD_GWH: f64 = 1.5;

/// Risk band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RiskLevel {
    #[serde(rename = "Low Risk")]
    Low,
    #[serde(rename = "Moderate Risk")]
    Moderate,
    #[serde(rename = "High Risk")]
    High,
}

impl RiskLevel {
    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "Low Risk",
            Self::Moderate => "Moderate Risk",
            Self::High => "High Risk",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Low => "Stable production profile with low inter-annual variability.",
            Self::Moderate => "Moderate production variability. Some financial uncertainty.",
            Self::High => "Significant production uncertainty. Higher financial risk exposure.",
        }
    }

    pub fn color(self) -> RiskColor {
        match self {
            Self::Low => RiskColor::Green,
            Self::Moderate => RiskColor::Orange,
            Self::High => RiskColor::Red,
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Display color paired with each band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskColor {
    Green,
    Orange,
    Red,
}

/// Risk annotation attached to every AEP response. Never cached.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskAssessment {
    pub level: RiskLevel,
    /// `p50 - p90` rounded to 2 decimals, for display only.
    pub spread: f64,
    pub description: &'static str,
    pub color: RiskColor,
}

/// Classifies the uncertainty spread between P50 and P90.
///
/// Bands are half-open: `[0.5, 1.5)` is moderate. The unrounded spread
/// decides the band. A NaN spread is treated as high risk.
///
/// # Examples
///
/// ```
/// use windfarm_aep::risk::{classify, RiskLevel};
///
/// assert_eq!(classify(10.5, 10.0).level, RiskLevel::Moderate);
/// assert_eq!(classify(10.0, 9.8).level, RiskLevel::Low);
/// ```
pub fn classify(p50: f64, p90: f64) -> RiskAssessment {
    let spread = p50 - p90;
    let level = if spread < MODERATE_SPREAD_GWH {
        RiskLevel::Low
    } else if spread < HIGH_SPREAD_GWH {
        RiskLevel::Moderate
    } else {
        RiskLevel::High
    };

    RiskAssessment {
        level,
        spread: round2(spread),
        description: level.description(),
        color: level.color(),
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level_for_spread(spread: f64) -> RiskLevel {
        classify(spread, 0.0).level
    }

    #[test]
    fn boundaries_are_half_open() {
        assert_eq!(level_for_spread(0.4999), RiskLevel::Low);
        assert_eq!(level_for_spread(0.5), RiskLevel::Moderate);
        assert_eq!(level_for_spread(1.4999), RiskLevel::Moderate);
        assert_eq!(level_for_spread(1.5), RiskLevel::High);
    }

    #[test]
    fn negative_spread_is_low() {
        assert_eq!(classify(9.0, 10.0).level, RiskLevel::Low);
    }

    #[test]
    fn rounding_does_not_move_the_band() {
        // 0.4999 displays as 0.5 but is still low risk
        let r = classify(0.4999, 0.0);
        assert_eq!(r.spread, 0.5);
        assert_eq!(r.level, RiskLevel::Low);
        assert_eq!(r.color, RiskColor::Green);
    }

    #[test]
    fn same_inputs_same_assessment() {
        assert_eq!(classify(14.2, 13.1), classify(14.2, 13.1));
    }

    #[test]
    fn nan_is_high_risk() {
        assert_eq!(classify(f64::NAN, 1.0).level, RiskLevel::High);
    }

    #[test]
    fn serializes_labels_and_colors() {
        let json = serde_json::to_value(classify(12.0, 10.0)).unwrap();
        assert_eq!(json["level"], "High Risk");
        assert_eq!(json["color"], "red");
        assert_eq!(json["spread"], 2.0);
        assert_eq!(
            json["description"],
            "Significant production uncertainty. Higher financial risk exposure."
        );
    }
}
