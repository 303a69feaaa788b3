//! End-to-end reward flows over the in-memory store.
//!
//! Each test drives the public services the admin binary uses, so ledger
//! writes, certification rules, notifications and leaderboard reads are
//! exercised together.
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use backend::domain::ports::{
    AnchorReceipt, AnchorRequest, AuthenticityRequest, AuthenticityScorer,
    AuthenticityScorerError, AwardRequest, CertificationAnchor, CertificationAnchorError,
    CertificationRepository, LeaderboardQuery, NotificationCommand, NotificationQuery,
    NotificationRepository, PointsAwardCommand, RewardsStore, RewardsStoreError,
    RewardsTransaction, SubmitTreeRecordRequest, TreeStatisticsQuery, TreeSubmissionCommand,
    TreeVerificationCommand, TreeVerificationOutcome,
};
use backend::domain::{
    AuthenticityScore, AwardPipeline, AwardPolicy, BestEffort, CertificationDefinition,
    CertificationTier, DisplayName, EarnedCertification, ErrorCode, LeaderboardService,
    LedgerEntry, Notification, NotificationDraft, NotificationService, NotificationType,
    PointsCategory, TreeCounts, TreeRecord, TreeRecordId, TreeRecordKind, TreeStatistics,
    TreeStatisticsService, TreeSubmissionService, TreeVerificationService, User, UserId,
    VerificationTransition,
};
use backend::outbound::memory::InMemoryRewardsStore;
use backend::test_support::{MutableClock, certification, midweek};
use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;
use rstest::{fixture, rstest};

struct Harness {
    store: Arc<InMemoryRewardsStore>,
    clock: Arc<MutableClock>,
}

impl Harness {
    fn clock(&self) -> Arc<dyn Clock> {
        self.clock.clone()
    }

    fn pipeline(&self) -> AwardPipeline<InMemoryRewardsStore> {
        AwardPipeline::new(Arc::clone(&self.store), self.clock())
    }

    fn verifier(&self) -> TreeVerificationService<InMemoryRewardsStore> {
        TreeVerificationService::new(self.pipeline(), AwardPolicy::default())
    }

    async fn user(&self, name: &str) -> UserId {
        let id = UserId::random();
        let display_name = DisplayName::new(name).expect("valid display name");
        self.store.insert_user(User::new(id.clone(), display_name)).await;
        id
    }

    async fn define(&self, definition: CertificationDefinition) {
        self.store
            .insert_definition_if_absent(&definition)
            .await
            .expect("definition stored");
    }

    async fn bonus(&self, user: &UserId, delta: i32) {
        self.pipeline()
            .award_points(AwardRequest::new(user.clone(), delta, PointsCategory::Bonus))
            .await
            .expect("bonus awarded");
    }

    async fn plant(&self, owner: &UserId, score: i64) -> TreeRecordId {
        self.record(owner, None, score).await
    }

    async fn update(&self, owner: &UserId, plant: TreeRecordId, score: i64) -> TreeRecordId {
        self.record(owner, Some(plant), score).await
    }

    async fn record(
        &self,
        owner: &UserId,
        parent: Option<TreeRecordId>,
        score: i64,
    ) -> TreeRecordId {
        let kind = parent.map_or(TreeRecordKind::Plant, |_| TreeRecordKind::Update);
        let record = TreeRecord {
            id: TreeRecordId::random(),
            owner: owner.clone(),
            kind,
            parent,
            species: "Acacia tortilis".to_owned(),
            verified: false,
            authenticity_score: AuthenticityScore::new(score).expect("valid score"),
            created_at: self.clock.utc(),
            verified_at: None,
        };
        let id = record.id;
        self.store.insert_tree_record(record).await;
        id
    }
}

#[fixture]
fn harness() -> Harness {
    Harness {
        store: Arc::new(InMemoryRewardsStore::new()),
        clock: Arc::new(MutableClock::new(midweek())),
    }
}

#[rstest]
#[tokio::test]
async fn verification_crosses_a_points_threshold(harness: Harness) {
    harness
        .define(certification("Two Hundred Club", CertificationTier::Silver, 200, 0, 0))
        .await;
    let owner = harness.user("Wanjiru").await;
    let plant = harness.plant(&owner, 50).await;
    let update = harness.update(&owner, plant, 20).await;
    let verifier = harness.verifier();

    let first = verifier
        .verify_tree_record(&plant)
        .await
        .expect("plant verification succeeds");
    let TreeVerificationOutcome::Verified { award: planted, .. } = first else {
        panic!("expected a fresh verification");
    };
    assert_eq!(planted.entry.delta, 150);
    assert_eq!(planted.entry.category, PointsCategory::TreeVerified);
    assert!(planted.newly_earned.is_empty());

    harness.clock.advance(TimeDelta::days(1));
    let second = verifier
        .verify_tree_record(&update)
        .await
        .expect("update verification succeeds");
    let TreeVerificationOutcome::Verified { record: verified, award } = second else {
        panic!("expected a fresh verification");
    };
    assert!(verified.verified);
    assert_eq!(award.entry.delta, 120);
    assert_eq!(award.entry.category, PointsCategory::TreeUpdateVerified);
    assert_eq!(award.progress.points, 270);
    assert_eq!(award.progress.trees, TreeCounts { total: 2, verified: 2 });
    let earned: Vec<&str> = award.newly_earned.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(earned, ["Two Hundred Club"]);

    let stored = harness.store.user(&owner).await.expect("user exists");
    assert_eq!(stored.points(), 270);
    let held = harness
        .store
        .list_earned(&owner)
        .await
        .expect("earned listing");
    assert_eq!(held.len(), 1);
    assert_eq!(held.first().map(|h| h.points_at_award), Some(270));

    let kinds: Vec<NotificationType> = harness
        .store
        .list_for_user(&owner, false)
        .await
        .expect("inbox listing")
        .into_iter()
        .map(|n| n.kind)
        .collect();
    assert!(kinds.contains(&NotificationType::Milestone));
    assert!(kinds.contains(&NotificationType::TreeVerified));
}

#[rstest]
#[tokio::test]
async fn second_verification_awards_nothing(harness: Harness) {
    let owner = harness.user("Otieno").await;
    let record = harness.plant(&owner, 50).await;
    let verifier = harness.verifier();

    verifier
        .verify_tree_record(&record)
        .await
        .expect("first verification");
    harness.clock.advance(TimeDelta::minutes(5));
    let again = verifier
        .verify_tree_record(&record)
        .await
        .expect("second verification");

    assert!(matches!(again, TreeVerificationOutcome::AlreadyVerified { .. }));
    let ledger = harness.store.ledger_for(&owner).await;
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger.first().map(|entry| entry.delta), Some(150));
    let stored = harness.store.tree_record(&record).await.expect("record exists");
    assert_eq!(stored.verified_at, Some(midweek()));
}

#[rstest]
#[tokio::test]
async fn unknown_tree_record_is_not_found(harness: Harness) {
    let err = harness
        .verifier()
        .verify_tree_record(&TreeRecordId::random())
        .await
        .expect_err("missing record");

    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn certifications_are_earned_once(harness: Harness) {
    harness
        .define(certification("Seedling", CertificationTier::Bronze, 10, 0, 0))
        .await;
    let owner = harness.user("Njeri").await;

    let pipeline = harness.pipeline();
    let first = pipeline
        .award_points(AwardRequest::new(owner.clone(), 20, PointsCategory::Bonus))
        .await
        .expect("first award");
    let second = pipeline
        .award_points(AwardRequest::new(owner.clone(), 20, PointsCategory::Bonus))
        .await
        .expect("second award");

    assert_eq!(first.newly_earned.len(), 1);
    assert!(second.newly_earned.is_empty());
    assert_eq!(second.progress.points, 40);
}

#[rstest]
#[tokio::test]
async fn negative_adjustment_lowers_the_total(harness: Harness) {
    let owner = harness.user("Kamau").await;
    harness.bonus(&owner, 100).await;

    let outcome = harness
        .pipeline()
        .award_points(
            AwardRequest::new(owner.clone(), -30, PointsCategory::AdminAdjustment)
                .with_reason("duplicate photo"),
        )
        .await
        .expect("adjustment applied");

    assert_eq!(outcome.progress.points, 70);
    assert_eq!(outcome.entry.reason.as_deref(), Some("duplicate photo"));
}

#[rstest]
#[tokio::test]
async fn award_for_unknown_user_writes_nothing(harness: Harness) {
    let ghost = UserId::random();

    let err = harness
        .pipeline()
        .award_points(AwardRequest::new(ghost.clone(), 10, PointsCategory::Bonus))
        .await
        .expect_err("unknown user");

    assert_eq!(err.code(), ErrorCode::NotFound);
    assert!(harness.store.ledger_for(&ghost).await.is_empty());
}

#[rstest]
#[tokio::test]
async fn tied_totals_share_a_rank(harness: Harness) {
    let amina = harness.user("Amina").await;
    let baraka = harness.user("Baraka").await;
    let chausiku = harness.user("Chausiku").await;
    harness.bonus(&amina, 300).await;
    harness.bonus(&baraka, 300).await;
    harness.bonus(&chausiku, 100).await;
    let board = LeaderboardService::new(Arc::clone(&harness.store), harness.clock());

    let top = board.top_users(10).await.expect("top users");
    let rows: Vec<(&str, i64, u64)> = top
        .iter()
        .map(|e| (e.display_name.as_ref(), e.points, e.rank))
        .collect();
    assert_eq!(
        rows,
        [("Amina", 300, 1), ("Baraka", 300, 1), ("Chausiku", 100, 3)]
    );

    let rank = board.rank(&chausiku).await.expect("rank");
    assert_eq!(rank.rank, 3);
    assert_eq!(rank.points, 100);
}

#[rstest]
#[tokio::test]
async fn weekly_board_ignores_last_week(harness: Harness) {
    let amina = harness.user("Amina").await;
    let baraka = harness.user("Baraka").await;
    harness.clock.set(midweek() - TimeDelta::days(7));
    harness.bonus(&amina, 500).await;
    harness.clock.set(midweek());
    harness.bonus(&amina, 20).await;
    harness.bonus(&baraka, 40).await;
    let board = LeaderboardService::new(Arc::clone(&harness.store), harness.clock());

    let weekly = board.weekly(10).await.expect("weekly board");

    let rows: Vec<(&str, i64, u64)> = weekly
        .entries
        .iter()
        .map(|e| (e.display_name.as_ref(), e.points, e.rank))
        .collect();
    assert_eq!(rows, [("Baraka", 40, 1), ("Amina", 20, 2)]);
    assert!(weekly.week_start <= midweek());

    let all_time = board.top_users(1).await.expect("top users");
    assert_eq!(all_time.first().map(|e| e.points), Some(520));
}

#[rstest]
#[tokio::test]
async fn reading_twice_keeps_the_first_read_time(harness: Harness) {
    let owner = harness.user("Halima").await;
    let record = harness.plant(&owner, 10).await;
    harness
        .verifier()
        .verify_tree_record(&record)
        .await
        .expect("verified");
    let inbox = NotificationService::new(Arc::clone(&harness.store), harness.clock());
    let first = inbox
        .list(&owner, true)
        .await
        .expect("unread listing")
        .into_iter()
        .next()
        .expect("one notification");

    harness.clock.advance(TimeDelta::minutes(1));
    let read = inbox.mark_read(&first.id, &owner).await.expect("marked");
    harness.clock.advance(TimeDelta::minutes(1));
    let again = inbox.mark_read(&first.id, &owner).await.expect("re-marked");

    assert!(read.is_read);
    assert_eq!(read.read_at, again.read_at);
    assert_eq!(read.read_at, Some(midweek() + TimeDelta::minutes(1)));
    assert_eq!(inbox.unread_count(&owner).await.expect("count"), 0);
}

#[rstest]
#[tokio::test]
async fn other_users_cannot_read_a_notification(harness: Harness) {
    let owner = harness.user("Halima").await;
    let stranger = harness.user("Juma").await;
    harness.bonus(&owner, 10).await;
    let record = harness.plant(&owner, 0).await;
    harness
        .verifier()
        .verify_tree_record(&record)
        .await
        .expect("verified");
    let inbox = NotificationService::new(Arc::clone(&harness.store), harness.clock());
    let target = inbox
        .list(&owner, false)
        .await
        .expect("listing")
        .into_iter()
        .next()
        .expect("one notification");

    let err = inbox
        .mark_read(&target.id, &stranger)
        .await
        .expect_err("not the recipient");

    assert_eq!(err.code(), ErrorCode::NotFound);
    assert_eq!(inbox.mark_all_read(&owner).await.expect("bulk read"), 1);
}

/// Store whose transactions refuse to record earned certifications.
struct FailingEarnedStore {
    inner: InMemoryRewardsStore,
}

struct FailingEarnedTransaction {
    inner: Box<dyn RewardsTransaction>,
}

#[async_trait]
impl RewardsStore for FailingEarnedStore {
    async fn begin(&self) -> Result<Box<dyn RewardsTransaction>, RewardsStoreError> {
        let inner = self.inner.begin().await?;
        Ok(Box::new(FailingEarnedTransaction { inner }))
    }
}

#[async_trait]
impl RewardsTransaction for FailingEarnedTransaction {
    async fn lock_user(&mut self, user_id: &UserId) -> Result<(), RewardsStoreError> {
        self.inner.lock_user(user_id).await
    }

    async fn append_ledger_entry(&mut self, entry: &LedgerEntry) -> Result<(), RewardsStoreError> {
        self.inner.append_ledger_entry(entry).await
    }

    async fn recompute_points(&mut self, user_id: &UserId) -> Result<i64, RewardsStoreError> {
        self.inner.recompute_points(user_id).await
    }

    async fn tree_counts(&mut self, user_id: &UserId) -> Result<TreeCounts, RewardsStoreError> {
        self.inner.tree_counts(user_id).await
    }

    async fn unearned_certifications(
        &mut self,
        user_id: &UserId,
    ) -> Result<Vec<CertificationDefinition>, RewardsStoreError> {
        self.inner.unearned_certifications(user_id).await
    }

    async fn insert_earned_certification(
        &mut self,
        _earned: &EarnedCertification,
    ) -> Result<bool, RewardsStoreError> {
        Err(RewardsStoreError::query("user_certifications unavailable"))
    }

    async fn insert_notification(
        &mut self,
        notification: &Notification,
    ) -> Result<(), RewardsStoreError> {
        self.inner.insert_notification(notification).await
    }

    async fn find_tree_record(
        &mut self,
        id: &TreeRecordId,
    ) -> Result<Option<TreeRecord>, RewardsStoreError> {
        self.inner.find_tree_record(id).await
    }

    async fn insert_tree_record(&mut self, record: &TreeRecord) -> Result<(), RewardsStoreError> {
        self.inner.insert_tree_record(record).await
    }

    async fn mark_tree_verified(
        &mut self,
        id: &TreeRecordId,
        verified_at: DateTime<Utc>,
    ) -> Result<VerificationTransition, RewardsStoreError> {
        self.inner.mark_tree_verified(id, verified_at).await
    }

    async fn commit(self: Box<Self>) -> Result<(), RewardsStoreError> {
        self.inner.commit().await
    }

    async fn rollback(self: Box<Self>) -> Result<(), RewardsStoreError> {
        self.inner.rollback().await
    }
}

#[rstest]
#[tokio::test]
async fn failed_certification_write_rolls_back_the_verification(harness: Harness) {
    harness
        .define(certification("Seedling", CertificationTier::Bronze, 0, 0, 0))
        .await;
    let owner = harness.user("Wambui").await;
    let record = harness.plant(&owner, 30).await;
    let failing = Arc::new(FailingEarnedStore {
        inner: (*harness.store).clone(),
    });
    let verifier = TreeVerificationService::new(
        AwardPipeline::new(failing, harness.clock()),
        AwardPolicy::default(),
    );

    let err = verifier
        .verify_tree_record(&record)
        .await
        .expect_err("certification write fails");

    assert_ne!(err.code(), ErrorCode::NotFound);
    let stored = harness.store.tree_record(&record).await.expect("record exists");
    assert!(!stored.verified);
    assert!(harness.store.ledger_for(&owner).await.is_empty());
    let user = harness.store.user(&owner).await.expect("user exists");
    assert_eq!(user.points(), 0);
    assert_eq!(
        harness
            .store
            .unread_count(&owner)
            .await
            .expect("unread count"),
        0
    );
}

struct BrokenScorer;

#[async_trait]
impl AuthenticityScorer for BrokenScorer {
    async fn score(
        &self,
        _request: &AuthenticityRequest,
    ) -> Result<AuthenticityScore, AuthenticityScorerError> {
        Err(AuthenticityScorerError::status(503_u16))
    }
}

struct BrokenAnchor;

#[async_trait]
impl CertificationAnchor for BrokenAnchor {
    async fn anchor(
        &self,
        _request: &AnchorRequest,
    ) -> Result<AnchorReceipt, CertificationAnchorError> {
        Err(CertificationAnchorError::transport("bridge offline"))
    }
}

#[rstest]
#[tokio::test]
async fn side_channel_failures_do_not_change_outcomes(harness: Harness) {
    harness
        .define(certification("Seedling", CertificationTier::Bronze, 50, 1, 0))
        .await;
    let owner = harness.user("Akinyi").await;
    let best_effort = BestEffort::new(Duration::from_millis(100));
    let submitter = TreeSubmissionService::new(Arc::clone(&harness.store), harness.clock())
        .with_scorer(Arc::new(BrokenScorer), best_effort);
    let verifier = TreeVerificationService::new(
        harness
            .pipeline()
            .with_anchor(Arc::new(BrokenAnchor), best_effort),
        AwardPolicy::default(),
    );

    let record = submitter
        .submit(SubmitTreeRecordRequest {
            owner: owner.clone(),
            kind: TreeRecordKind::Plant,
            parent: None,
            species: "Croton megalocarpus".to_owned(),
            photo_url: None,
        })
        .await
        .expect("submission stored");
    assert_eq!(record.authenticity_score, AuthenticityScore::UNASSESSED);

    let outcome = verifier
        .verify_tree_record(&record.id)
        .await
        .expect("verification succeeds");

    let TreeVerificationOutcome::Verified { award, .. } = outcome else {
        panic!("expected a fresh verification");
    };
    assert_eq!(award.entry.delta, 100);
    assert_eq!(award.newly_earned.len(), 1);
    assert_eq!(
        harness.store.list_earned(&owner).await.expect("earned").len(),
        1
    );
}

#[rstest]
#[tokio::test]
async fn update_must_reference_the_submitters_plant(harness: Harness) {
    let owner = harness.user("Mosi").await;
    let neighbour = harness.user("Zawadi").await;
    let plant = harness.plant(&neighbour, 0).await;
    let submitter = TreeSubmissionService::new(Arc::clone(&harness.store), harness.clock());

    let err = submitter
        .submit(SubmitTreeRecordRequest {
            owner,
            kind: TreeRecordKind::Update,
            parent: Some(plant),
            species: "Acacia tortilis".to_owned(),
            photo_url: None,
        })
        .await
        .expect_err("foreign parent");

    assert_eq!(err.code(), ErrorCode::InvalidRequest);
}

#[rstest]
#[tokio::test]
async fn emitted_notifications_arrive_unread(harness: Harness) {
    let owner = harness.user("Imani").await;
    let inbox = NotificationService::new(Arc::clone(&harness.store), harness.clock());

    inbox
        .emit(NotificationDraft::new(
            owner.clone(),
            NotificationType::LeaderboardUpdate,
            "New rank",
            "You climbed to rank 3.",
        ))
        .await
        .expect("emitted");

    let listed = inbox.list(&owner, true).await.expect("listing");
    assert_eq!(listed.len(), 1);
    assert!(listed.iter().all(|n| !n.is_read && n.read_at.is_none()));
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_awards_serialise_per_user(harness: Harness) {
    const AWARDS: i32 = 32;
    const DELTA: i32 = 7;
    harness
        .define(certification("Zero", CertificationTier::Bronze, 0, 0, 0))
        .await;
    let owner = harness.user("Baraka").await;

    let handles: Vec<_> = (0..AWARDS)
        .map(|_| {
            let pipeline = harness.pipeline();
            let owner = owner.clone();
            tokio::spawn(async move {
                pipeline
                    .award_points(AwardRequest::new(owner, DELTA, PointsCategory::Bonus))
                    .await
            })
        })
        .collect();
    let mut earned_by_awards = 0;
    for handle in handles {
        let outcome = handle.await.expect("task joins").expect("award succeeds");
        earned_by_awards += outcome.newly_earned.len();
    }

    let user = harness.store.user(&owner).await.expect("user exists");
    assert_eq!(user.points(), i64::from(AWARDS * DELTA));
    assert_eq!(
        harness.store.ledger_for(&owner).await.len(),
        usize::try_from(AWARDS).expect("positive count")
    );
    let held = harness.store.list_earned(&owner).await.expect("earned list");
    let names: Vec<_> = held
        .iter()
        .map(|held| held.certification.name.as_str())
        .collect();
    assert_eq!(names, ["Zero"]);
    assert_eq!(earned_by_awards, 1);
}

#[rstest]
#[tokio::test]
async fn statistics_summarise_submitted_records(harness: Harness) {
    let owner = harness.user("Zawadi").await;
    let plant = harness.plant(&owner, 40).await;
    harness.update(&owner, plant, 10).await;
    harness.update(&owner, plant, 10).await;
    let other = harness.user("Otieno").await;
    harness.plant(&other, 40).await;

    let stats = TreeStatisticsService::new(Arc::clone(&harness.store))
        .statistics(&owner)
        .await
        .expect("statistics");

    assert_eq!(
        stats,
        TreeStatistics {
            total_records: 3,
            plant_records: 1,
            update_records: 2,
            species_count: 1,
        }
    );
}
