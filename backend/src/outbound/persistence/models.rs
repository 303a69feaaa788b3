//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. Conversions back into domain types are
//! fallible because stored text columns may hold values the domain does not
//! recognise.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::{
    AuthenticityScore, CertificationDefinition, CertificationId, CertificationThresholds,
    DisplayName, EarnedCertification, LedgerEntry, Notification, NotificationId, Standing,
    TreeRecord, TreeRecordId, TreeRecordKind, TreeStatistics, UserId,
};

use super::schema::{
    certifications, ledger_entries, notifications, tree_records, user_certifications,
};

/// A stored value that no longer maps onto a domain type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid stored {column}: {message}")]
pub(crate) struct InvalidRow {
    column: &'static str,
    message: String,
}

impl InvalidRow {
    fn new(column: &'static str, error: impl std::fmt::Display) -> Self {
        Self {
            column,
            message: error.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// Projection used by the leaderboard queries.
#[derive(Debug, Clone, Queryable)]
pub(crate) struct StandingRow {
    pub id: Uuid,
    pub display_name: String,
    pub points: i64,
}

impl TryFrom<StandingRow> for Standing {
    type Error = InvalidRow;

    fn try_from(row: StandingRow) -> Result<Self, Self::Error> {
        Ok(Self {
            user_id: UserId::from_uuid(row.id),
            display_name: DisplayName::new(row.display_name)
                .map_err(|err| InvalidRow::new("users.display_name", err))?,
            points: row.points,
        })
    }
}

// ---------------------------------------------------------------------------
// Tree records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = tree_records)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct TreeRecordRow {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub kind: String,
    pub parent_id: Option<Uuid>,
    pub species: String,
    pub verified: bool,
    pub authenticity_score: i16,
    pub created_at: DateTime<Utc>,
    pub verified_at: Option<DateTime<Utc>>,
}

impl TryFrom<TreeRecordRow> for TreeRecord {
    type Error = InvalidRow;

    fn try_from(row: TreeRecordRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: TreeRecordId::from_uuid(row.id),
            owner: UserId::from_uuid(row.owner_id),
            kind: row
                .kind
                .parse()
                .map_err(|err| InvalidRow::new("tree_records.kind", err))?,
            parent: row.parent_id.map(TreeRecordId::from_uuid),
            species: row.species,
            verified: row.verified,
            authenticity_score: AuthenticityScore::new(i64::from(row.authenticity_score))
                .map_err(|err| InvalidRow::new("tree_records.authenticity_score", err))?,
            created_at: row.created_at,
            verified_at: row.verified_at,
        })
    }
}

/// Fold per-kind record counts and a distinct species count into statistics.
pub(crate) fn tree_statistics(
    kind_counts: Vec<(String, u64)>,
    species_count: u64,
) -> Result<TreeStatistics, InvalidRow> {
    kind_counts.into_iter().try_fold(
        TreeStatistics {
            species_count,
            ..TreeStatistics::default()
        },
        |mut stats, (kind, count)| {
            let kind: TreeRecordKind = kind
                .parse()
                .map_err(|err| InvalidRow::new("tree_records.kind", err))?;
            match kind {
                TreeRecordKind::Plant => stats.plant_records += count,
                TreeRecordKind::Update => stats.update_records += count,
            }
            stats.total_records += count;
            Ok(stats)
        },
    )
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = tree_records)]
pub(crate) struct NewTreeRecordRow<'a> {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub kind: &'a str,
    pub parent_id: Option<Uuid>,
    pub species: &'a str,
    pub verified: bool,
    pub authenticity_score: i16,
    pub created_at: DateTime<Utc>,
    pub verified_at: Option<DateTime<Utc>>,
}

impl<'a> From<&'a TreeRecord> for NewTreeRecordRow<'a> {
    fn from(record: &'a TreeRecord) -> Self {
        Self {
            id: *record.id.as_uuid(),
            owner_id: *record.owner.as_uuid(),
            kind: record.kind.as_str(),
            parent_id: record.parent.map(|parent| *parent.as_uuid()),
            species: &record.species,
            verified: record.verified,
            authenticity_score: i16::from(record.authenticity_score.value()),
            created_at: record.created_at,
            verified_at: record.verified_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = ledger_entries)]
pub(crate) struct NewLedgerEntryRow<'a> {
    pub id: Uuid,
    pub user_id: Uuid,
    pub delta: i32,
    pub category: &'a str,
    pub reason: Option<&'a str>,
    pub tree_record_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl<'a> From<&'a LedgerEntry> for NewLedgerEntryRow<'a> {
    fn from(entry: &'a LedgerEntry) -> Self {
        Self {
            id: *entry.id.as_uuid(),
            user_id: *entry.user_id.as_uuid(),
            delta: entry.delta,
            category: entry.category.as_str(),
            reason: entry.reason.as_deref(),
            tree_record_id: entry.tree_record_id.map(|id| *id.as_uuid()),
            created_at: entry.created_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Certifications
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = certifications)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct CertificationRow {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub tier: String,
    pub required_points: i64,
    pub required_trees: i64,
    pub required_verification_rate: i32,
}

impl TryFrom<CertificationRow> for CertificationDefinition {
    type Error = InvalidRow;

    fn try_from(row: CertificationRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: CertificationId::from_uuid(row.id),
            name: row.name,
            description: row.description,
            icon: row.icon,
            tier: row
                .tier
                .parse()
                .map_err(|err| InvalidRow::new("certifications.tier", err))?,
            thresholds: CertificationThresholds {
                required_points: row.required_points,
                required_trees: u64::try_from(row.required_trees)
                    .map_err(|err| InvalidRow::new("certifications.required_trees", err))?,
                required_verification_rate: u32::try_from(row.required_verification_rate)
                    .map_err(|err| {
                        InvalidRow::new("certifications.required_verification_rate", err)
                    })?,
            },
        })
    }
}

impl TryFrom<&CertificationDefinition> for CertificationRow {
    type Error = InvalidRow;

    fn try_from(definition: &CertificationDefinition) -> Result<Self, Self::Error> {
        let thresholds = &definition.thresholds;
        Ok(Self {
            id: *definition.id.as_uuid(),
            name: definition.name.clone(),
            description: definition.description.clone(),
            icon: definition.icon.clone(),
            tier: definition.tier.as_str().to_owned(),
            required_points: thresholds.required_points,
            required_trees: i64::try_from(thresholds.required_trees)
                .map_err(|err| InvalidRow::new("certifications.required_trees", err))?,
            required_verification_rate: i32::try_from(thresholds.required_verification_rate)
                .map_err(|err| InvalidRow::new("certifications.required_verification_rate", err))?,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = user_certifications)]
pub(crate) struct NewUserCertificationRow {
    pub user_id: Uuid,
    pub certification_id: Uuid,
    pub points_at_award: i64,
    pub earned_at: DateTime<Utc>,
}

impl From<&EarnedCertification> for NewUserCertificationRow {
    fn from(earned: &EarnedCertification) -> Self {
        Self {
            user_id: *earned.user_id.as_uuid(),
            certification_id: *earned.certification_id.as_uuid(),
            points_at_award: earned.points_at_award,
            earned_at: earned.earned_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = notifications)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct NotificationRow {
    pub id: Uuid,
    pub recipient_id: Uuid,
    pub sender_id: Option<Uuid>,
    pub kind: String,
    pub title: String,
    pub message: String,
    pub tree_record_id: Option<Uuid>,
    pub points: Option<i32>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

impl TryFrom<NotificationRow> for Notification {
    type Error = InvalidRow;

    fn try_from(row: NotificationRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: NotificationId::from_uuid(row.id),
            recipient: UserId::from_uuid(row.recipient_id),
            sender: row.sender_id.map(UserId::from_uuid),
            kind: row
                .kind
                .parse()
                .map_err(|err| InvalidRow::new("notifications.kind", err))?,
            title: row.title,
            message: row.message,
            tree_record_id: row.tree_record_id.map(TreeRecordId::from_uuid),
            points: row.points,
            is_read: row.is_read,
            created_at: row.created_at,
            read_at: row.read_at,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = notifications)]
pub(crate) struct NewNotificationRow<'a> {
    pub id: Uuid,
    pub recipient_id: Uuid,
    pub sender_id: Option<Uuid>,
    pub kind: &'a str,
    pub title: &'a str,
    pub message: &'a str,
    pub tree_record_id: Option<Uuid>,
    pub points: Option<i32>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

impl<'a> From<&'a Notification> for NewNotificationRow<'a> {
    fn from(notification: &'a Notification) -> Self {
        Self {
            id: *notification.id.as_uuid(),
            recipient_id: *notification.recipient.as_uuid(),
            sender_id: notification.sender.as_ref().map(|sender| *sender.as_uuid()),
            kind: notification.kind.as_str(),
            title: &notification.title,
            message: &notification.message,
            tree_record_id: notification.tree_record_id.map(|id| *id.as_uuid()),
            points: notification.points,
            is_read: notification.is_read,
            created_at: notification.created_at,
            read_at: notification.read_at,
        }
    }
}
