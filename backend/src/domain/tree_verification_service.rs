//! Tree verification: the trigger of the award pipeline.
//!
//! The conditional `unverified → verified` flip and the award it earns share
//! one transaction, so a record is awarded exactly once no matter how many
//! reviewers press "verify" concurrently.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::domain::award_pipeline::{award_within, finish, map_store_error};
use crate::domain::ports::{
    AwardOutcome, AwardRequest, RewardsStore, RewardsStoreError, RewardsTransaction,
    TreeVerificationCommand, TreeVerificationOutcome,
};
use crate::domain::{
    AwardPipeline, AwardPolicy, Error, NotificationDraft, NotificationType, TreeRecord,
    TreeRecordId, TreeRecordKind, VerificationTransition,
};

enum Verification {
    Verified {
        record: TreeRecord,
        award: AwardOutcome,
    },
    AlreadyVerified(TreeRecord),
    Missing,
}

/// Service implementing [`TreeVerificationCommand`].
#[derive(Clone)]
pub struct TreeVerificationService<S> {
    pipeline: AwardPipeline<S>,
    policy: AwardPolicy,
}

impl<S> TreeVerificationService<S> {
    /// Create a verification service awarding points by `policy`.
    pub fn new(pipeline: AwardPipeline<S>, policy: AwardPolicy) -> Self {
        Self { pipeline, policy }
    }
}

fn verified_copy(record: &TreeRecord, points: i32) -> (String, String) {
    let title = match record.kind {
        TreeRecordKind::Plant => "Tree verified".to_owned(),
        TreeRecordKind::Update => "Tree update verified".to_owned(),
    };
    let message = format!(
        "Your {} record was verified. You earned {points} points.",
        record.species
    );
    (title, message)
}

async fn verify_within(
    tx: &mut dyn RewardsTransaction,
    id: &TreeRecordId,
    policy: AwardPolicy,
    now: DateTime<Utc>,
) -> Result<Verification, RewardsStoreError> {
    let record = match tx.mark_tree_verified(id, now).await? {
        VerificationTransition::Verified(record) => record,
        VerificationTransition::AlreadyVerified(record) => {
            return Ok(Verification::AlreadyVerified(record));
        }
        VerificationTransition::Missing => return Ok(Verification::Missing),
    };

    let points = policy.points_for(record.authenticity_score);
    let request = AwardRequest::new(
        record.owner.clone(),
        points,
        record.kind.verification_category(),
    )
    .with_reason(format!("{} record verified: {}", record.kind, record.species))
    .with_tree_record(record.id);
    let mut award = award_within(tx, request, now).await?;

    let (title, message) = verified_copy(&record, points);
    let notification = NotificationDraft::new(
        record.owner.clone(),
        NotificationType::TreeVerified,
        title,
        message,
    )
    .with_tree_record(record.id)
    .with_points(points)
    .stamp(now);
    tx.insert_notification(&notification).await?;
    award.notifications.push(notification);

    Ok(Verification::Verified { record, award })
}

#[async_trait]
impl<S> TreeVerificationCommand for TreeVerificationService<S>
where
    S: RewardsStore,
{
    async fn verify_tree_record(
        &self,
        id: &TreeRecordId,
    ) -> Result<TreeVerificationOutcome, Error> {
        let now = self.pipeline.now();
        let mut tx = self.pipeline.store().begin().await.map_err(map_store_error)?;
        let result = verify_within(tx.as_mut(), id, self.policy, now).await;
        let verification = finish(tx, result).await.map_err(map_store_error)?;

        match verification {
            Verification::Missing => Err(Error::not_found(format!("tree record {id} not found"))),
            Verification::AlreadyVerified(record) => {
                debug!(tree_record_id = %id, "tree record already verified; nothing awarded");
                Ok(TreeVerificationOutcome::AlreadyVerified { record })
            }
            Verification::Verified { record, award } => {
                info!(
                    tree_record_id = %id,
                    user_id = %record.owner,
                    points = award.entry.delta,
                    total = award.progress.points,
                    "tree record verified"
                );
                self.pipeline.anchor_certifications(&award).await;
                Ok(TreeVerificationOutcome::Verified { record, award })
            }
        }
    }
}
