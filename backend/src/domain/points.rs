//! Points ledger entries.
//!
//! The ledger is append-only: entries are created by the award pipeline and
//! never mutated. A user's cached total is always recomputed from the full
//! set of entries rather than adjusted incrementally.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{TreeRecordId, UserId};

/// Why a ledger entry was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointsCategory {
    /// A plant record was verified.
    TreeVerified,
    /// An update record was verified.
    TreeUpdateVerified,
    /// Discretionary bonus.
    Bonus,
    /// Achievement unlocked outside the certification engine.
    Achievement,
    /// Manual correction by an administrator.
    AdminAdjustment,
}

impl PointsCategory {
    /// Returns the database string representation.
    ///
    /// # Examples
    /// ```
    /// use backend::domain::PointsCategory;
    ///
    /// assert_eq!(PointsCategory::AdminAdjustment.as_str(), "admin_adjustment");
    /// ```
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TreeVerified => "tree_verified",
            Self::TreeUpdateVerified => "tree_update_verified",
            Self::Bonus => "bonus",
            Self::Achievement => "achievement",
            Self::AdminAdjustment => "admin_adjustment",
        }
    }
}

impl fmt::Display for PointsCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown points category.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown points category: {input}")]
pub struct ParsePointsCategoryError {
    /// The unrecognised input value.
    pub input: String,
}

impl FromStr for PointsCategory {
    type Err = ParsePointsCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tree_verified" => Ok(Self::TreeVerified),
            "tree_update_verified" => Ok(Self::TreeUpdateVerified),
            "bonus" => Ok(Self::Bonus),
            "achievement" => Ok(Self::Achievement),
            "admin_adjustment" => Ok(Self::AdminAdjustment),
            other => Err(ParsePointsCategoryError {
                input: other.to_owned(),
            }),
        }
    }
}

/// Identifier of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LedgerEntryId(Uuid);

impl LedgerEntryId {
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

/// Immutable point-delta record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    /// Entry identifier.
    pub id: LedgerEntryId,
    /// User whose balance the entry affects.
    pub user_id: UserId,
    /// Signed point change. Negative values are corrections.
    pub delta: i32,
    /// Why the points were written.
    pub category: PointsCategory,
    /// Optional free-text explanation.
    pub reason: Option<String>,
    /// Tree record that triggered the entry, if any.
    pub tree_record_id: Option<TreeRecordId>,
    /// When the entry was written.
    pub created_at: DateTime<Utc>,
}

/// Sum the deltas of a user's entries.
///
/// Adapters that cannot push the aggregate into SQL use this to recompute a
/// balance.
pub fn total_points<'a>(entries: impl IntoIterator<Item = &'a LedgerEntry>) -> i64 {
    entries
        .into_iter()
        .map(|entry| i64::from(entry.delta))
        .sum()
}
