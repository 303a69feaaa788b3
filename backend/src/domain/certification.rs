//! Certification definitions and the threshold rules that award them.
//!
//! A definition carries three thresholds which are checked in a fixed order
//! with short-circuit: cumulative points, verified tree count, then the
//! verification rate. The rate is compared with integer arithmetic
//! (`verified * 100 >= required * total`) so no rounding is involved.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use super::{TreeCounts, UserId};

/// Upper bound of a verification-rate threshold, in percent.
pub const VERIFICATION_RATE_MAX: u32 = 100;

/// Display tier of a certification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CertificationTier {
    /// Entry level.
    Bronze,
    /// Intermediate.
    Silver,
    /// Advanced.
    Gold,
    /// Highest tier.
    Platinum,
}

impl CertificationTier {
    /// Returns the database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bronze => "bronze",
            Self::Silver => "silver",
            Self::Gold => "gold",
            Self::Platinum => "platinum",
        }
    }
}

impl fmt::Display for CertificationTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown tier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown certification tier: {input}")]
pub struct ParseCertificationTierError {
    /// The unrecognised input value.
    pub input: String,
}

impl FromStr for CertificationTier {
    type Err = ParseCertificationTierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bronze" => Ok(Self::Bronze),
            "silver" => Ok(Self::Silver),
            "gold" => Ok(Self::Gold),
            "platinum" => Ok(Self::Platinum),
            other => Err(ParseCertificationTierError {
                input: other.to_owned(),
            }),
        }
    }
}

/// Identifier of a certification definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CertificationId(Uuid);

impl CertificationId {
    /// Generate a new random identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap a UUID loaded from storage.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

/// A user's standing at the moment certifications are evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProgress {
    /// Freshly recomputed points total.
    pub points: i64,
    /// Tree record counts.
    pub trees: TreeCounts,
}

/// Why a user does not (yet) qualify for a certification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum QualificationFailure {
    /// Points below the required minimum.
    #[error("needs {required} points, has {actual}")]
    InsufficientPoints {
        /// Required points.
        required: i64,
        /// Current points.
        actual: i64,
    },
    /// Too few verified trees.
    #[error("needs {required} verified trees, has {actual}")]
    InsufficientTrees {
        /// Required verified trees.
        required: u64,
        /// Current verified trees.
        actual: u64,
    },
    /// Verification rate below the required percentage, or no records at all
    /// when a nonzero rate is required.
    #[error("needs {required}% verification rate, has {verified}/{total} records verified")]
    VerificationRateTooLow {
        /// Required rate in percent.
        required: u32,
        /// Verified records.
        verified: u64,
        /// All records.
        total: u64,
    },
}

/// Minimums a user must meet simultaneously.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificationThresholds {
    /// Minimum cumulative points.
    pub required_points: i64,
    /// Minimum verified tree records.
    pub required_trees: u64,
    /// Minimum share of verified records, in percent (0–100).
    pub required_verification_rate: u32,
}

impl CertificationThresholds {
    /// Check the thresholds against a user's progress.
    ///
    /// # Examples
    /// ```
    /// use backend::domain::{CertificationThresholds, TreeCounts, UserProgress};
    ///
    /// let thresholds = CertificationThresholds {
    ///     required_points: 200,
    ///     required_trees: 0,
    ///     required_verification_rate: 0,
    /// };
    /// let progress = UserProgress { points: 270, trees: TreeCounts::default() };
    /// assert!(thresholds.check(&progress).is_ok());
    /// ```
    pub fn check(&self, progress: &UserProgress) -> Result<(), QualificationFailure> {
        if progress.points < self.required_points {
            return Err(QualificationFailure::InsufficientPoints {
                required: self.required_points,
                actual: progress.points,
            });
        }

        let TreeCounts { total, verified } = progress.trees;
        if verified < self.required_trees {
            return Err(QualificationFailure::InsufficientTrees {
                required: self.required_trees,
                actual: verified,
            });
        }

        let rate_too_low = if total == 0 {
            self.required_verification_rate > 0
        } else {
            u128::from(verified) * 100
                < u128::from(self.required_verification_rate) * u128::from(total)
        };
        if rate_too_low {
            return Err(QualificationFailure::VerificationRateTooLow {
                required: self.required_verification_rate,
                verified,
                total,
            });
        }

        Ok(())
    }
}

/// Validation errors for certification definitions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CertificationValidationError {
    /// The name was blank.
    #[error("certification name must not be empty")]
    EmptyName,
    /// Required points were negative.
    #[error("required points must not be negative, got {value}")]
    NegativePoints {
        /// The rejected value.
        value: i64,
    },
    /// Verification rate exceeded 100 percent.
    #[error("verification rate must be at most {VERIFICATION_RATE_MAX}%, got {value}")]
    RateOutOfRange {
        /// The rejected value.
        value: u32,
    },
}

/// Static threshold rule a user can qualify for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificationDefinition {
    /// Definition identifier.
    pub id: CertificationId,
    /// Unique display name.
    pub name: String,
    /// What the user did to earn it.
    pub description: String,
    /// Front-end icon key.
    pub icon: String,
    /// Display tier.
    pub tier: CertificationTier,
    /// Qualification thresholds.
    pub thresholds: CertificationThresholds,
}

impl CertificationDefinition {
    /// Build a validated definition with a fresh identifier.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        icon: impl Into<String>,
        tier: CertificationTier,
        thresholds: CertificationThresholds,
    ) -> Result<Self, CertificationValidationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(CertificationValidationError::EmptyName);
        }
        if thresholds.required_points < 0 {
            return Err(CertificationValidationError::NegativePoints {
                value: thresholds.required_points,
            });
        }
        if thresholds.required_verification_rate > VERIFICATION_RATE_MAX {
            return Err(CertificationValidationError::RateOutOfRange {
                value: thresholds.required_verification_rate,
            });
        }

        Ok(Self {
            id: CertificationId::random(),
            name,
            description: description.into(),
            icon: icon.into(),
            tier,
            thresholds,
        })
    }

    /// Catalog ordering: tier, then required points, then name.
    pub fn catalog_order(&self, other: &Self) -> Ordering {
        self.tier
            .cmp(&other.tier)
            .then(
                self.thresholds
                    .required_points
                    .cmp(&other.thresholds.required_points),
            )
            .then_with(|| self.name.cmp(&other.name))
    }

    /// Title of the milestone notification sent when this is earned.
    pub fn milestone_title(&self) -> String {
        format!("Certification earned: {}", self.name)
    }

    /// Body of the milestone notification sent when this is earned.
    pub fn milestone_message(&self) -> String {
        format!(
            "Congratulations! You earned the {} {} certification. {}",
            self.tier, self.name, self.description
        )
        .trim_end()
        .to_owned()
    }
}

/// Permanent record that a user satisfied a definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EarnedCertification {
    /// Holder.
    pub user_id: UserId,
    /// Earned definition.
    pub certification_id: CertificationId,
    /// The holder's points total when it was earned.
    pub points_at_award: i64,
    /// When it was earned.
    pub earned_at: DateTime<Utc>,
}

/// An earned certification joined with its definition, for listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeldCertification {
    /// The earned definition.
    pub certification: CertificationDefinition,
    /// The holder's points total when it was earned.
    pub points_at_award: i64,
    /// When it was earned.
    pub earned_at: DateTime<Utc>,
}

/// Select the definitions a user qualifies for, in catalog order.
///
/// `unearned` must already exclude definitions the user holds; this function
/// does not consult storage and never awards anything itself.
pub fn qualifying_certifications(
    progress: &UserProgress,
    mut unearned: Vec<CertificationDefinition>,
) -> Vec<CertificationDefinition> {
    unearned.sort_by(CertificationDefinition::catalog_order);
    unearned
        .into_iter()
        .filter(|definition| match definition.thresholds.check(progress) {
            Ok(()) => true,
            Err(reason) => {
                debug!(certification = %definition.name, %reason, "certification not yet earned");
                false
            }
        })
        .collect()
}

#[cfg(test)]
mod tests;
