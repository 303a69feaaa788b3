//! Tree record types consumed by the award pipeline.
//!
//! Photos, EXIF timestamps and GPS capture belong to the submission
//! front end. The rewards subsystem only needs ownership, the record kind,
//! the verification flag and the authenticity score.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{PointsCategory, UserId};

/// Stable identifier of a tree record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TreeRecordId(Uuid);

impl TreeRecordId {
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

impl fmt::Display for TreeRecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Whether a record documents a new planting or progress on an existing tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreeRecordKind {
    /// First record for a newly planted tree.
    Plant,
    /// Follow-up record referencing an earlier plant record.
    Update,
}

impl TreeRecordKind {
    /// Returns the database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Plant => "plant",
            Self::Update => "update",
        }
    }

    /// Ledger category used when a record of this kind is verified.
    pub fn verification_category(&self) -> PointsCategory {
        match self {
            Self::Plant => PointsCategory::TreeVerified,
            Self::Update => PointsCategory::TreeUpdateVerified,
        }
    }
}

impl fmt::Display for TreeRecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown record kind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown tree record kind: {input}")]
pub struct ParseTreeRecordKindError {
    /// The unrecognised input value.
    pub input: String,
}

impl FromStr for TreeRecordKind {
    type Err = ParseTreeRecordKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "plant" => Ok(Self::Plant),
            "update" => Ok(Self::Update),
            other => Err(ParseTreeRecordKindError {
                input: other.to_owned(),
            }),
        }
    }
}

/// Photo authenticity score in the inclusive range 0–100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct AuthenticityScore(u8);

/// Upper bound of [`AuthenticityScore`].
pub const AUTHENTICITY_SCORE_MAX: u8 = 100;

/// Error returned when a score falls outside 0–100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("authenticity score must be between 0 and 100, got {value}")]
pub struct AuthenticityScoreError {
    /// The rejected value.
    pub value: i64,
}

impl AuthenticityScore {
    /// Score assigned when no assessment could be obtained.
    pub const UNASSESSED: Self = Self(0);

    /// Validate a score.
    pub fn new(value: i64) -> Result<Self, AuthenticityScoreError> {
        u8::try_from(value)
            .ok()
            .filter(|score| *score <= AUTHENTICITY_SCORE_MAX)
            .map(Self)
            .ok_or(AuthenticityScoreError { value })
    }

    /// Clamp an arbitrary value into range.
    ///
    /// # Examples
    /// ```
    /// use backend::domain::AuthenticityScore;
    ///
    /// assert_eq!(AuthenticityScore::clamped(250).value(), 100);
    /// assert_eq!(AuthenticityScore::clamped(-3).value(), 0);
    /// ```
    pub fn clamped(value: i64) -> Self {
        let bounded = value.clamp(0, i64::from(AUTHENTICITY_SCORE_MAX));
        Self(u8::try_from(bounded).unwrap_or(AUTHENTICITY_SCORE_MAX))
    }

    /// Raw score.
    pub fn value(&self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for AuthenticityScore {
    type Error = AuthenticityScoreError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<AuthenticityScore> for i64 {
    fn from(value: AuthenticityScore) -> Self {
        Self::from(value.0)
    }
}

/// A tree planting or update record owned by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeRecord {
    /// Record identifier.
    pub id: TreeRecordId,
    /// Owning user.
    pub owner: UserId,
    /// Plant or update.
    pub kind: TreeRecordKind,
    /// Plant record an update refers to.
    pub parent: Option<TreeRecordId>,
    /// Free-text species name.
    pub species: String,
    /// Whether a reviewer has verified the record.
    pub verified: bool,
    /// Authenticity score assigned at submission.
    pub authenticity_score: AuthenticityScore,
    /// Submission timestamp.
    pub created_at: DateTime<Utc>,
    /// Verification timestamp, set on the unverified → verified transition.
    pub verified_at: Option<DateTime<Utc>>,
}

/// Per-user record counts feeding the verification-rate threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeCounts {
    /// All records owned by the user, verified or not.
    pub total: u64,
    /// Records marked verified.
    pub verified: u64,
}

/// Summary of one user's submitted records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeStatistics {
    /// All records owned by the user.
    pub total_records: u64,
    /// Records of kind [`TreeRecordKind::Plant`].
    pub plant_records: u64,
    /// Records of kind [`TreeRecordKind::Update`].
    pub update_records: u64,
    /// Distinct species names across the user's records.
    pub species_count: u64,
}

/// Result of attempting the unverified → verified transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationTransition {
    /// The record moved to verified in this call.
    Verified(TreeRecord),
    /// The record was already verified; nothing changed.
    AlreadyVerified(TreeRecord),
    /// No record with the requested identifier exists.
    Missing,
}

#[cfg(test)]
mod tests {
    //! Regression coverage for tree record value types.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::plant(TreeRecordKind::Plant, PointsCategory::TreeVerified)]
    #[case::update(TreeRecordKind::Update, PointsCategory::TreeUpdateVerified)]
    fn kind_selects_ledger_category(#[case] kind: TreeRecordKind, #[case] expected: PointsCategory) {
        assert_eq!(kind.verification_category(), expected);
    }

    #[rstest]
    fn kind_parses_database_values() {
        assert_eq!("plant".parse::<TreeRecordKind>(), Ok(TreeRecordKind::Plant));
        assert_eq!("update".parse::<TreeRecordKind>(), Ok(TreeRecordKind::Update));
        assert!("sapling".parse::<TreeRecordKind>().is_err());
    }

    #[rstest]
    #[case(0)]
    #[case(57)]
    #[case(100)]
    fn score_accepts_in_range_values(#[case] raw: i64) {
        let score = AuthenticityScore::new(raw).expect("in range");
        assert_eq!(i64::from(score), raw);
    }

    #[rstest]
    #[case(-1)]
    #[case(101)]
    fn score_rejects_out_of_range_values(#[case] raw: i64) {
        assert_eq!(
            AuthenticityScore::new(raw),
            Err(AuthenticityScoreError { value: raw })
        );
    }
}
