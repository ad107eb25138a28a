use chrono::Duration;
use serde::{Deserialize, Serialize};

const DEFAULT_CACHE_TTL_SECONDS: i64 = 300;
const DEFAULT_TREND_DAYS: u32 = 30;

/// Engine-level configuration. Every field has a default so a partial JSON
/// document deserializes cleanly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalyticsSettings {
    pub cache_ttl_seconds: i64,
    pub trend_days: u32,
    pub procrastination: ProcrastinationSettings,
}

impl AnalyticsSettings {
    /// Negative values mean zero; values beyond what a `Duration` can hold
    /// saturate to `Duration::MAX`.
    pub fn cache_ttl(&self) -> Duration {
        Duration::try_seconds(self.cache_ttl_seconds.max(0)).unwrap_or(Duration::MAX)
    }
}

impl Default for AnalyticsSettings {
    fn default() -> Self {
        Self {
            cache_ttl_seconds: DEFAULT_CACHE_TTL_SECONDS,
            trend_days: DEFAULT_TREND_DAYS,
            procrastination: ProcrastinationSettings::default(),
        }
    }
}

/// Heuristic thresholds for procrastination scoring.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ProcrastinationSettings {
    pub delayed_days: i64,
    pub long_term_days: i64,
    pub very_long_term_days: i64,
    pub completion_baseline_days: f64,
    pub completion_penalty_per_day: f64,
    pub weights: ScoringWeights,
}

impl Default for ProcrastinationSettings {
    fn default() -> Self {
        Self {
            delayed_days: 1,
            long_term_days: 7,
            very_long_term_days: 30,
            completion_baseline_days: 7.0,
            completion_penalty_per_day: 2.0,
            weights: ScoringWeights::default(),
        }
    }
}

/// Caps for the four procrastination sub-scores; they sum to 100.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ScoringWeights {
    pub delayed: f64,
    pub long_term: f64,
    pub very_long_term: f64,
    pub completion_latency: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            delayed: 30.0,
            long_term: 25.0,
            very_long_term: 25.0,
            completion_latency: 20.0,
        }
    }
}
