//! The points award pipeline.
//!
//! [`award_within`] sequences one award on an open transaction:
//!
//! 1. lock the user row so concurrent awards for the same user serialize;
//! 2. append the ledger entry;
//! 3. recompute the cached total from the full ledger;
//! 4. evaluate unearned certifications in catalog order;
//! 5. record each newly earned certification with a milestone notification.
//!
//! [`AwardPipeline`] wraps this in its own transaction for standalone awards
//! and anchors newly earned certifications after commit. Callers that already
//! hold a transaction (tree verification) call [`award_within`] directly.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockable::Clock;
use tracing::{info, warn};

use crate::domain::ports::{
    AnchorRequest, AwardOutcome, AwardRequest, CertificationAnchor, DisabledCertificationAnchor,
    PointsAwardCommand, RewardsStore, RewardsStoreError, RewardsTransaction,
};
use crate::domain::{
    BestEffort, CertificationDefinition, EarnedCertification, Error, LedgerEntry, LedgerEntryId,
    Notification, NotificationDraft, NotificationType, SideEffectOutcome, UserId, UserProgress,
    qualifying_certifications,
};

/// Map store failures onto the transport-agnostic error.
pub(crate) fn map_store_error(error: RewardsStoreError) -> Error {
    match error {
        RewardsStoreError::Connection { message } => {
            Error::service_unavailable(format!("rewards store unavailable: {message}"))
        }
        RewardsStoreError::Query { message } => {
            Error::internal(format!("rewards store error: {message}"))
        }
        RewardsStoreError::MissingUser { user_id } => {
            Error::not_found(format!("user {user_id} not found"))
        }
    }
}

impl From<RewardsStoreError> for Error {
    fn from(error: RewardsStoreError) -> Self {
        map_store_error(error)
    }
}

/// Commit on success, roll back on failure.
///
/// A failed rollback is logged; the original error is returned either way.
pub(crate) async fn finish<T, E>(
    tx: Box<dyn RewardsTransaction>,
    result: Result<T, E>,
) -> Result<T, E>
where
    E: From<RewardsStoreError>,
{
    match result {
        Ok(value) => {
            tx.commit().await.map_err(E::from)?;
            Ok(value)
        }
        Err(error) => {
            if let Err(rollback_error) = tx.rollback().await {
                warn!(error = %rollback_error, "rollback failed; connection discarded");
            }
            Err(error)
        }
    }
}

fn milestone_notification(
    recipient: &UserId,
    definition: &CertificationDefinition,
    now: DateTime<Utc>,
) -> Notification {
    NotificationDraft::new(
        recipient.clone(),
        NotificationType::Milestone,
        definition.milestone_title(),
        definition.milestone_message(),
    )
    .stamp(now)
}

/// Run one award on an open transaction.
///
/// Nothing is committed here; the caller owns the transaction.
pub(crate) async fn award_within(
    tx: &mut dyn RewardsTransaction,
    request: AwardRequest,
    now: DateTime<Utc>,
) -> Result<AwardOutcome, RewardsStoreError> {
    let AwardRequest {
        user_id,
        delta,
        category,
        reason,
        tree_record_id,
    } = request;

    tx.lock_user(&user_id).await?;

    let entry = LedgerEntry {
        id: LedgerEntryId::random(),
        user_id: user_id.clone(),
        delta,
        category,
        reason,
        tree_record_id,
        created_at: now,
    };
    tx.append_ledger_entry(&entry).await?;

    let points = tx.recompute_points(&user_id).await?;
    let trees = tx.tree_counts(&user_id).await?;
    let progress = UserProgress { points, trees };

    let unearned = tx.unearned_certifications(&user_id).await?;
    let mut newly_earned = Vec::new();
    let mut notifications = Vec::new();
    for definition in qualifying_certifications(&progress, unearned) {
        let earned = EarnedCertification {
            user_id: user_id.clone(),
            certification_id: definition.id,
            points_at_award: points,
            earned_at: now,
        };
        if !tx.insert_earned_certification(&earned).await? {
            continue;
        }
        let notification = milestone_notification(&user_id, &definition, now);
        tx.insert_notification(&notification).await?;
        notifications.push(notification);
        newly_earned.push(definition);
    }

    Ok(AwardOutcome {
        entry,
        progress,
        newly_earned,
        notifications,
    })
}

/// Standalone award service implementing [`PointsAwardCommand`].
#[derive(Clone)]
pub struct AwardPipeline<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    anchor: Arc<dyn CertificationAnchor>,
    best_effort: BestEffort,
}

impl<S> AwardPipeline<S> {
    /// Create a pipeline that does not anchor certifications.
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            anchor: Arc::new(DisabledCertificationAnchor),
            best_effort: BestEffort::default(),
        }
    }

    /// Anchor newly earned certifications through `anchor` after commit.
    pub fn with_anchor(mut self, anchor: Arc<dyn CertificationAnchor>, best_effort: BestEffort) -> Self {
        self.anchor = anchor;
        self.best_effort = best_effort;
        self
    }
}

impl<S> AwardPipeline<S>
where
    S: RewardsStore,
{
    /// Publish certifications earned by a committed award.
    ///
    /// Failures are logged by [`BestEffort`] and otherwise ignored.
    pub(crate) async fn anchor_certifications(&self, outcome: &AwardOutcome) {
        for definition in &outcome.newly_earned {
            let request = AnchorRequest {
                user_id: outcome.entry.user_id.clone(),
                certification_id: definition.id,
                certification_name: definition.name.clone(),
                points_earned: outcome.progress.points,
                tree_count: outcome.progress.trees.verified,
            };
            if let SideEffectOutcome::Completed(receipt) = self
                .best_effort
                .run("certification_anchor", self.anchor.anchor(&request))
                .await
            {
                info!(
                    user_id = %request.user_id,
                    certification = %request.certification_name,
                    reference = receipt.reference.as_deref().unwrap_or("none"),
                    "certification anchored"
                );
            }
        }
    }

    pub(crate) fn now(&self) -> DateTime<Utc> {
        self.clock.utc()
    }

    pub(crate) fn store(&self) -> &S {
        &self.store
    }
}

#[async_trait]
impl<S> PointsAwardCommand for AwardPipeline<S>
where
    S: RewardsStore,
{
    async fn award_points(&self, request: AwardRequest) -> Result<AwardOutcome, Error> {
        let now = self.now();
        let mut tx = self.store.begin().await.map_err(map_store_error)?;
        let result = award_within(tx.as_mut(), request, now).await;
        let outcome = finish(tx, result).await.map_err(map_store_error)?;

        info!(
            user_id = %outcome.entry.user_id,
            delta = outcome.entry.delta,
            category = %outcome.entry.category,
            points = outcome.progress.points,
            earned = outcome.newly_earned.len(),
            "points awarded"
        );

        self.anchor_certifications(&outcome).await;
        Ok(outcome)
    }
}

#[cfg(test)]
#[path = "award_pipeline_tests.rs"]
mod tests;
