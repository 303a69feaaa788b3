//! Points awarded when a tree record is verified.

use serde::{Deserialize, Serialize};

use super::AuthenticityScore;

/// Default base award for a verified record.
pub const DEFAULT_BASE_POINTS: i32 = 100;
/// Default weight of the authenticity score.
pub const DEFAULT_AUTHENTICITY_MULTIPLIER: i32 = 1;

/// Base award plus an authenticity-score component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AwardPolicy {
    /// Points every verified record earns.
    pub base_points: i32,
    /// Points per authenticity-score point.
    pub authenticity_multiplier: i32,
}

impl Default for AwardPolicy {
    fn default() -> Self {
        Self {
            base_points: DEFAULT_BASE_POINTS,
            authenticity_multiplier: DEFAULT_AUTHENTICITY_MULTIPLIER,
        }
    }
}

impl AwardPolicy {
    /// Points for verifying a record with the given score.
    ///
    /// Saturates rather than overflowing for extreme configurations.
    ///
    /// # Examples
    /// ```
    /// use backend::domain::{AuthenticityScore, AwardPolicy};
    ///
    /// let score = AuthenticityScore::new(50).expect("valid score");
    /// assert_eq!(AwardPolicy::default().points_for(score), 150);
    /// ```
    pub fn points_for(&self, score: AuthenticityScore) -> i32 {
        let bonus = i32::from(score.value()).saturating_mul(self.authenticity_multiplier);
        self.base_points.saturating_add(bonus)
    }
}
