use std::sync::Arc;

use super::BaselineTracker;
use crate::config::ScoringConfig;
use crate::core::FrequencyChannel;

/// Intermediate terms of a composite score, kept for logging.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreBreakdown {
    pub power_delta_db: f64,
    pub margin_db: f64,
    pub power_score: f64,
    pub bandwidth_score: f64,
    pub score: f64,
}

/// Composite anomaly score in `[0, 1]` from power rise and bandwidth growth.
#[derive(Clone)]
pub struct JammingScorer {
    config: ScoringConfig,
    baselines: Arc<BaselineTracker>,
}

impl JammingScorer {
    pub fn new(config: ScoringConfig, baselines: Arc<BaselineTracker>) -> Self {
        Self { config, baselines }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Score against the channel's current baseline; 0.0 without history.
    pub fn score(&self, channel: FrequencyChannel, power_db: f64, bandwidth_hz: f64) -> f64 {
        self.score_against(self.baselines.get(channel), power_db, bandwidth_hz)
    }

    /// Score against an explicit baseline value.
    pub fn score_against(&self, baseline_db: Option<f64>, power_db: f64, bandwidth_hz: f64) -> f64 {
        baseline_db
            .map(|baseline| self.breakdown(baseline, power_db, bandwidth_hz).score)
            .unwrap_or(0.0)
    }

    pub fn breakdown(&self, baseline_db: f64, power_db: f64, bandwidth_hz: f64) -> ScoreBreakdown {
        let c = &self.config;

        let power_delta_db = power_db - baseline_db;
        let margin_db = c.min_margin_db.max(c.margin_fraction * baseline_db.abs());
        let power_score = (power_delta_db / margin_db).clamp(0.0, 1.0);

        let nominal = c.nominal_bandwidth_hz;
        let bandwidth_score = ((bandwidth_hz - nominal) / (nominal * c.bandwidth_factor)).clamp(0.0, 1.0);

        let composite = c.power_weight * power_score + c.bandwidth_weight * bandwidth_score;

        ScoreBreakdown {
            power_delta_db,
            margin_db,
            power_score,
            bandwidth_score,
            score: round_to_hundredths(composite),
        }
    }
}

/// Two-decimal rounding of the exact binary value; never scale by 100 first.
fn round_to_hundredths(value: f64) -> f64 {
    format!("{:.2}", value).parse().unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scorer() -> (JammingScorer, Arc<BaselineTracker>) {
        let baselines = Arc::new(BaselineTracker::default());
        (JammingScorer::new(ScoringConfig::default(), baselines.clone()), baselines)
    }

    #[test]
    fn test_no_baseline_scores_zero() {
        let (scorer, _) = scorer();
        assert_eq!(scorer.score(FrequencyChannel::from_mhz(30.0), 10.0, 1e6), 0.0);
    }

    #[test]
    fn test_no_deviation_scores_zero() {
        let (scorer, baselines) = scorer();
        let channel = FrequencyChannel::from_mhz(30.0);
        baselines.update(channel, -40.0);

        assert_eq!(scorer.score(channel, -40.0, 200e3), 0.0);
    }

    #[test]
    fn test_power_spike_saturates() {
        let (scorer, baselines) = scorer();
        let channel = FrequencyChannel::from_mhz(30.0);
        baselines.update(channel, -40.0);

        let breakdown = scorer.breakdown(-40.0, -20.0, 200e3);
        assert_eq!(breakdown.margin_db, 4.0);
        assert_eq!(breakdown.power_score, 1.0);
        assert_eq!(breakdown.bandwidth_score, 0.0);
        assert_eq!(scorer.score(channel, -20.0, 200e3), 0.70);
    }

    #[test]
    fn test_margin_floor_for_weak_baselines() {
        let (scorer, _) = scorer();
        let breakdown = scorer.breakdown(-10.0, -8.5, 200e3);

        assert_eq!(breakdown.margin_db, 3.0);
        assert_eq!(breakdown.power_score, 0.5);
        assert_eq!(breakdown.score, 0.35);
    }

    #[test]
    fn test_bandwidth_ramp() {
        let (scorer, _) = scorer();

        assert_eq!(scorer.score_against(Some(-40.0), -40.0, 225e3), 0.15);
        assert_eq!(scorer.score_against(Some(-40.0), -40.0, 250e3), 0.3);
        assert_eq!(scorer.score_against(Some(-40.0), -40.0, 900e3), 0.3);
        assert_eq!(scorer.score_against(Some(-40.0), -80.0, 150e3), 0.0);
    }

    #[test]
    fn test_rounding_uses_exact_value() {
        let (scorer, _) = scorer();

        // 0.7 * 0.25 and 0.3 * 0.05 sit just below the .xx5 boundary
        assert_eq!(scorer.score_against(Some(-40.0), -39.0, 200e3), 0.17);
        assert_eq!(scorer.score_against(Some(-40.0), -40.0, 202_500.0), 0.01);
        assert_eq!(round_to_hundredths(0.2), 0.2);
        assert_eq!(round_to_hundredths(0.0), 0.0);
    }

    #[test]
    fn test_full_saturation() {
        let (scorer, _) = scorer();
        assert_eq!(scorer.score_against(Some(-40.0), 0.0, 1e6), 1.0);
    }
}
