// =============================================================================
// Category Classifier — continuous values to ordered labels
// =============================================================================
//
// Pi Cycle gap (percent):
//   gap > 20         => VeryFar
//   10 < gap <= 20   => Far
//   0  < gap <= 10   => Neutral
//   -5 < gap <= 0    => Close
//   gap <= -5        => VeryClose (also NaN)
//
// Composite score:
//   score > 85       => High
//   70 < score <= 85 => Elevated
//   score <= 70      => ModerateLow

use serde::{Deserialize, Serialize};

/// Position of the short-term average relative to the long-term average.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PiCycleCategory {
    VeryClose,
    Close,
    Neutral,
    Far,
    VeryFar,
}

impl PiCycleCategory {
    pub fn label(&self) -> &'static str {
        match self {
            Self::VeryFar => "very far",
            Self::Far => "far",
            Self::Neutral => "neutral",
            Self::Close => "close",
            Self::VeryClose => "very close / warning",
        }
    }
}

impl std::fmt::Display for PiCycleCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Alert level of the composite score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    ModerateLow,
    Elevated,
    High,
}

impl RiskLevel {
    pub fn label(&self) -> &'static str {
        match self {
            Self::High => "high risk",
            Self::Elevated => "elevated risk",
            Self::ModerateLow => "moderate/low risk",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Classify a Pi Cycle percentage gap.  Total over every `f64`.
pub fn classify_pi_gap(gap: f64) -> PiCycleCategory {
    if gap > 20.0 {
        PiCycleCategory::VeryFar
    } else if gap > 10.0 {
        PiCycleCategory::Far
    } else if gap > 0.0 {
        PiCycleCategory::Neutral
    } else if gap > -5.0 {
        PiCycleCategory::Close
    } else {
        PiCycleCategory::VeryClose
    }
}

/// Classify a composite score.
pub fn classify_score(score: u8) -> RiskLevel {
    if score > 85 {
        RiskLevel::High
    } else if score > 70 {
        RiskLevel::Elevated
    } else {
        RiskLevel::ModerateLow
    }
}
