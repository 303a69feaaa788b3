//! Tree record submission.
//!
//! A submission is scored by the authenticity side channel before any
//! transaction opens, then stored unverified together with a `new_record`
//! notification. A scorer that fails or times out leaves the record
//! [`AuthenticityScore::UNASSESSED`].

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde_json::json;
use tracing::info;

use crate::domain::award_pipeline::finish;
use crate::domain::ports::{
    AuthenticityRequest, AuthenticityScorer, FixedAuthenticityScorer, RewardsStore,
    RewardsTransaction, SubmitTreeRecordRequest, TreeSubmissionCommand,
};
use crate::domain::{
    AuthenticityScore, BestEffort, Error, NotificationDraft, NotificationType, TreeRecord,
    TreeRecordId, TreeRecordKind,
};

/// Service implementing [`TreeSubmissionCommand`].
#[derive(Clone)]
pub struct TreeSubmissionService<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    scorer: Arc<dyn AuthenticityScorer>,
    best_effort: BestEffort,
}

impl<S> TreeSubmissionService<S> {
    /// Create a service that leaves every record unassessed.
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            scorer: Arc::new(FixedAuthenticityScorer(AuthenticityScore::UNASSESSED)),
            best_effort: BestEffort::default(),
        }
    }

    /// Score submissions through `scorer`.
    pub fn with_scorer(mut self, scorer: Arc<dyn AuthenticityScorer>, best_effort: BestEffort) -> Self {
        self.scorer = scorer;
        self.best_effort = best_effort;
        self
    }
}

fn invalid_field(field: &str, message: &str) -> Error {
    Error::invalid_request(message).with_details(json!({ "field": field }))
}

fn validate(request: &SubmitTreeRecordRequest) -> Result<String, Error> {
    let species = request.species.trim();
    if species.is_empty() {
        return Err(invalid_field("species", "species must not be empty"));
    }
    match (request.kind, request.parent) {
        (TreeRecordKind::Plant, Some(_)) => Err(invalid_field(
            "parent",
            "plant records must not reference a parent record",
        )),
        (TreeRecordKind::Update, None) => Err(invalid_field(
            "parent",
            "update records must reference the planted tree",
        )),
        _ => Ok(species.to_owned()),
    }
}

async fn store_within(
    tx: &mut dyn RewardsTransaction,
    record: &TreeRecord,
    now: DateTime<Utc>,
) -> Result<(), Error> {
    tx.lock_user(&record.owner).await?;

    if let Some(parent_id) = record.parent {
        let parent = tx
            .find_tree_record(&parent_id)
            .await?
            .ok_or_else(|| Error::not_found(format!("tree record {parent_id} not found")))?;
        if parent.owner != record.owner || parent.kind != TreeRecordKind::Plant {
            return Err(Error::invalid_request(
                "updates must reference one of the submitter's plant records",
            ));
        }
    }

    tx.insert_tree_record(record).await?;
    let notification = NotificationDraft::new(
        record.owner.clone(),
        NotificationType::NewRecord,
        "Tree record submitted",
        format!("Your {} record is awaiting verification.", record.species),
    )
    .with_tree_record(record.id)
    .stamp(now);
    tx.insert_notification(&notification).await?;
    Ok(())
}

#[async_trait]
impl<S> TreeSubmissionCommand for TreeSubmissionService<S>
where
    S: RewardsStore,
{
    async fn submit(&self, request: SubmitTreeRecordRequest) -> Result<TreeRecord, Error> {
        let species = validate(&request)?;
        let id = TreeRecordId::random();

        let scoring = AuthenticityRequest {
            tree_record_id: id,
            kind: request.kind,
            species: species.clone(),
            photo_url: request.photo_url,
        };
        let authenticity_score = self
            .best_effort
            .run("authenticity_scorer", self.scorer.score(&scoring))
            .await
            .completed()
            .unwrap_or(AuthenticityScore::UNASSESSED);

        let now = self.clock.utc();
        let record = TreeRecord {
            id,
            owner: request.owner,
            kind: request.kind,
            parent: request.parent,
            species,
            verified: false,
            authenticity_score,
            created_at: now,
            verified_at: None,
        };

        let mut tx = self.store.begin().await?;
        let result = store_within(tx.as_mut(), &record, now).await;
        finish(tx, result).await?;

        info!(
            tree_record_id = %record.id,
            user_id = %record.owner,
            kind = %record.kind,
            score = record.authenticity_score.value(),
            "tree record submitted"
        );
        Ok(record)
    }
}
