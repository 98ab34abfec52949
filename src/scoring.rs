//! Unified score combiner
//!
//! Folds a candidate's usage history into its text relevance. Text
//! relevance dominates: usage can reorder candidates that already match,
//! never rescue one that does not.

use crate::config::RankingConfig;

/// Default minimum match score; matches at or below it are dropped
pub const DEFAULT_MATCH_THRESHOLD: f64 = 0.3;
/// Default share of the final score taken by text relevance
pub const DEFAULT_MATCH_WEIGHT: f64 = 0.8;
/// Usage score at which normalization saturates to 1.0
pub const DEFAULT_USAGE_SATURATION: f64 = 50.0;

/// Weights and cut-offs applied by [`ScoreWeights::combine`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreWeights {
    pub threshold: f64,
    pub match_weight: f64,
    pub usage_saturation: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        ScoreWeights {
            threshold: DEFAULT_MATCH_THRESHOLD,
            match_weight: DEFAULT_MATCH_WEIGHT,
            usage_saturation: DEFAULT_USAGE_SATURATION,
        }
    }
}

impl From<&RankingConfig> for ScoreWeights {
    fn from(config: &RankingConfig) -> Self {
        ScoreWeights {
            threshold: config.min_match_score,
            match_weight: config.match_weight,
            usage_saturation: config.usage_saturation,
        }
    }
}

impl ScoreWeights {
    /// Blend a match score with a raw usage score.
    ///
    /// Returns `None` when `match_score <= threshold`.
    pub fn combine(&self, match_score: f64, usage_score: f64) -> Option<f64> {
        if match_score <= self.threshold {
            return None;
        }
        let usage = normalize_usage_with(usage_score, self.usage_saturation);
        Some(match_score * self.match_weight + usage * (1.0 - self.match_weight))
    }
}

/// Combine with the default 0.3 threshold and 80/20 weighting
pub fn combine(match_score: f64, usage_score: f64) -> Option<f64> {
    ScoreWeights::default().combine(match_score, usage_score)
}

/// Compress a raw usage score into `[0.0, 1.0]` on a log scale
pub fn normalize_usage(usage_score: f64) -> f64 {
    normalize_usage_with(usage_score, DEFAULT_USAGE_SATURATION)
}

fn normalize_usage_with(usage_score: f64, saturation: f64) -> f64 {
    if !usage_score.is_finite() || usage_score <= 0.0 {
        return 0.0;
    }
    if usage_score >= saturation {
        return 1.0;
    }
    (usage_score + 1.0).log10() / (saturation + 1.0).log10()
}
