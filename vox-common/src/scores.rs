//! Coaching score scale
//!
//! One canonical scale is used everywhere: `clarity`, `structure` and
//! `impact` are scored 0–10, and the overall score is their sum (0–30).
//! An optional `confidence` sub-score on the same 0–10 scale is carried
//! along but does not contribute to the overall score.

use serde::{Deserialize, Serialize};

/// Scores for a single attempt
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreCard {
    pub clarity: f64,
    pub structure: f64,
    pub impact: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub overall_score: f64,
}

/// Score deltas between an attempt and the attempt before it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Improvement {
    pub clarity_change: f64,
    pub structure_change: f64,
    pub impact_change: f64,
    pub overall_change: f64,
    /// `overall_change` relative to the previous overall score, in percent
    pub percentage_improvement: f64,
}

impl ScoreCard {
    /// Upper bound of each sub-score
    pub const MAX_SUBSCORE: f64 = 10.0;

    /// Upper bound of the overall score (three tracked sub-scores)
    pub const MAX_OVERALL: f64 = 3.0 * Self::MAX_SUBSCORE;

    /// Build a score card, deriving the overall score from the sub-scores
    pub fn new(clarity: f64, structure: f64, impact: f64) -> Self {
        Self {
            clarity,
            structure,
            impact,
            confidence: None,
            overall_score: round2(clarity + structure + impact),
        }
    }

    /// Overall score as defined by the sub-scores of this card
    pub fn computed_overall(&self) -> f64 {
        round2(self.clarity + self.structure + self.impact)
    }

    /// Replace whatever overall score was supplied with the derived one
    pub fn with_recomputed_overall(mut self) -> Self {
        self.overall_score = self.computed_overall();
        self
    }

    /// Check every sub-score is finite and within 0–10
    pub fn validate(&self) -> Result<(), String> {
        let mut fields = vec![
            ("clarity", self.clarity),
            ("structure", self.structure),
            ("impact", self.impact),
        ];
        if let Some(confidence) = self.confidence {
            fields.push(("confidence", confidence));
        }

        for (name, value) in fields {
            if !value.is_finite() || !(0.0..=Self::MAX_SUBSCORE).contains(&value) {
                return Err(format!(
                    "score '{}' must be between 0 and {}, got {}",
                    name,
                    Self::MAX_SUBSCORE,
                    value
                ));
            }
        }
        Ok(())
    }

    /// Deltas of this card against a previous attempt's card
    ///
    /// The previous overall score is recomputed from its sub-scores so a
    /// caller-supplied total cannot skew the comparison.
    pub fn improvement_over(&self, previous: &ScoreCard) -> Improvement {
        let previous_overall = previous.computed_overall();
        let overall_change = round2(self.computed_overall() - previous_overall);

        let percentage_improvement = if previous_overall > 0.0 {
            round2(overall_change / previous_overall * 100.0)
        } else {
            0.0
        };

        Improvement {
            clarity_change: round2(self.clarity - previous.clarity),
            structure_change: round2(self.structure - previous.structure),
            impact_change: round2(self.impact - previous.impact),
            overall_change,
            percentage_improvement,
        }
    }
}

/// Round to two decimal places
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overall_is_sum_of_tracked_subscores() {
        let mut card = ScoreCard::new(7.5, 6.0, 7.0);
        card.confidence = Some(9.0);
        assert_eq!(card.overall_score, 20.5);
        assert_eq!(card.computed_overall(), 20.5);
    }

    #[test]
    fn test_recompute_discards_supplied_overall() {
        let card = ScoreCard {
            clarity: 5.0,
            structure: 5.0,
            impact: 5.0,
            confidence: None,
            overall_score: 99.0,
        };
        assert_eq!(card.with_recomputed_overall().overall_score, 15.0);
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        assert!(ScoreCard::new(10.0, 0.0, 4.5).validate().is_ok());
        assert!(ScoreCard::new(11.0, 5.0, 5.0).validate().is_err());
        assert!(ScoreCard::new(5.0, -0.5, 5.0).validate().is_err());
        assert!(ScoreCard::new(5.0, 5.0, f64::NAN).validate().is_err());

        let mut card = ScoreCard::new(5.0, 5.0, 5.0);
        card.confidence = Some(75.0);
        let err = card.validate().unwrap_err();
        assert!(err.contains("confidence"));
    }

    #[test]
    fn test_improvement_deltas() {
        let previous = ScoreCard::new(6.0, 5.0, 5.0);
        let current = ScoreCard::new(7.5, 6.0, 7.0);

        let improvement = current.improvement_over(&previous);
        assert_eq!(improvement.clarity_change, 1.5);
        assert_eq!(improvement.structure_change, 1.0);
        assert_eq!(improvement.impact_change, 2.0);
        assert_eq!(improvement.overall_change, 4.5);
        assert_eq!(improvement.percentage_improvement, 28.13);
    }

    #[test]
    fn test_improvement_can_be_negative() {
        let previous = ScoreCard::new(8.0, 8.0, 8.0);
        let current = ScoreCard::new(7.0, 8.0, 6.0);

        let improvement = current.improvement_over(&previous);
        assert_eq!(improvement.clarity_change, -1.0);
        assert_eq!(improvement.impact_change, -2.0);
        assert_eq!(improvement.overall_change, -3.0);
        assert_eq!(improvement.percentage_improvement, -12.5);
    }

    #[test]
    fn test_improvement_against_zero_baseline() {
        let previous = ScoreCard::new(0.0, 0.0, 0.0);
        let current = ScoreCard::new(3.0, 3.0, 3.0);

        let improvement = current.improvement_over(&previous);
        assert_eq!(improvement.overall_change, 9.0);
        assert_eq!(improvement.percentage_improvement, 0.0);
    }
}
