//! Shared-state rewards store.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::ports::{
    CertificationRepository, CertificationRepositoryError, LeaderboardRepository,
    LeaderboardRepositoryError, NotificationRepository, NotificationRepositoryError,
    RewardsStore, RewardsStoreError, RewardsTransaction, TreeStatisticsRepository,
    TreeStatisticsRepositoryError,
};
use crate::domain::{
    CertificationDefinition, EarnedCertification, HeldCertification, LedgerEntry, Notification,
    NotificationId, Standing, TreeCounts, TreeRecord, TreeRecordId, TreeRecordKind,
    TreeStatistics, User, UserId, VerificationTransition, sort_newest_first, total_points,
};

#[derive(Debug, Clone, Default)]
struct RewardsState {
    users: HashMap<UserId, User>,
    tree_records: HashMap<TreeRecordId, TreeRecord>,
    ledger: Vec<LedgerEntry>,
    certifications: Vec<CertificationDefinition>,
    earned: Vec<EarnedCertification>,
    notifications: Vec<Notification>,
}

impl RewardsState {
    fn tree_counts(&self, user_id: &UserId) -> TreeCounts {
        self.tree_records
            .values()
            .filter(|record| &record.owner == user_id)
            .fold(TreeCounts::default(), |mut counts, record| {
                counts.total += 1;
                if record.verified {
                    counts.verified += 1;
                }
                counts
            })
    }

    fn statistics(&self, owner: &UserId) -> TreeStatistics {
        let mut species = HashSet::new();
        let mut stats = TreeStatistics::default();
        for record in self.tree_records.values().filter(|r| &r.owner == owner) {
            stats.total_records += 1;
            match record.kind {
                TreeRecordKind::Plant => stats.plant_records += 1,
                TreeRecordKind::Update => stats.update_records += 1,
            }
            species.insert(record.species.as_str());
        }
        stats.species_count = u64::try_from(species.len()).unwrap_or(u64::MAX);
        stats
    }

    fn has_earned(&self, user_id: &UserId, definition: &CertificationDefinition) -> bool {
        self.earned
            .iter()
            .any(|earned| &earned.user_id == user_id && earned.certification_id == definition.id)
    }

    fn standing(&self, user_id: &UserId, points: i64) -> Option<Standing> {
        self.users.get(user_id).map(|user| Standing {
            user_id: user_id.clone(),
            display_name: user.display_name().clone(),
            points,
        })
    }
}

/// Rewards store backed by process memory.
///
/// Clones share state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRewardsStore {
    state: Arc<Mutex<RewardsState>>,
}

impl InMemoryRewardsStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a participant.
    pub async fn insert_user(&self, user: User) {
        let mut state = self.state.lock().await;
        state.users.insert(user.id().clone(), user);
    }

    /// Store a tree record outside the submission flow.
    pub async fn insert_tree_record(&self, record: TreeRecord) {
        let mut state = self.state.lock().await;
        state.tree_records.insert(record.id, record);
    }

    /// Current view of a user, including the cached points total.
    pub async fn user(&self, user_id: &UserId) -> Option<User> {
        self.state.lock().await.users.get(user_id).cloned()
    }

    /// Current view of a tree record.
    pub async fn tree_record(&self, id: &TreeRecordId) -> Option<TreeRecord> {
        self.state.lock().await.tree_records.get(id).cloned()
    }

    /// Ledger entries for a user in insertion order.
    pub async fn ledger_for(&self, user_id: &UserId) -> Vec<LedgerEntry> {
        self.state
            .lock()
            .await
            .ledger
            .iter()
            .filter(|entry| &entry.user_id == user_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl RewardsStore for InMemoryRewardsStore {
    async fn begin(&self) -> Result<Box<dyn RewardsTransaction>, RewardsStoreError> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let staged = guard.clone();
        Ok(Box::new(InMemoryTransaction { guard, staged }))
    }
}

/// Transaction over [`InMemoryRewardsStore`].
#[derive(Debug)]
pub struct InMemoryTransaction {
    guard: OwnedMutexGuard<RewardsState>,
    staged: RewardsState,
}

#[async_trait]
impl RewardsTransaction for InMemoryTransaction {
    async fn lock_user(&mut self, user_id: &UserId) -> Result<(), RewardsStoreError> {
        if self.staged.users.contains_key(user_id) {
            Ok(())
        } else {
            Err(RewardsStoreError::missing_user(user_id.as_ref()))
        }
    }

    async fn append_ledger_entry(&mut self, entry: &LedgerEntry) -> Result<(), RewardsStoreError> {
        self.staged.ledger.push(entry.clone());
        Ok(())
    }

    async fn recompute_points(&mut self, user_id: &UserId) -> Result<i64, RewardsStoreError> {
        let total = total_points(
            self.staged
                .ledger
                .iter()
                .filter(|entry| &entry.user_id == user_id),
        );
        let user = self
            .staged
            .users
            .get_mut(user_id)
            .ok_or_else(|| RewardsStoreError::missing_user(user_id.as_ref()))?;
        *user = User::with_points(user.id().clone(), user.display_name().clone(), total);
        Ok(total)
    }

    async fn tree_counts(&mut self, user_id: &UserId) -> Result<TreeCounts, RewardsStoreError> {
        Ok(self.staged.tree_counts(user_id))
    }

    async fn unearned_certifications(
        &mut self,
        user_id: &UserId,
    ) -> Result<Vec<CertificationDefinition>, RewardsStoreError> {
        Ok(self
            .staged
            .certifications
            .iter()
            .filter(|definition| !self.staged.has_earned(user_id, definition))
            .cloned()
            .collect())
    }

    async fn insert_earned_certification(
        &mut self,
        earned: &EarnedCertification,
    ) -> Result<bool, RewardsStoreError> {
        let duplicate = self.staged.earned.iter().any(|existing| {
            existing.user_id == earned.user_id
                && existing.certification_id == earned.certification_id
        });
        if duplicate {
            return Ok(false);
        }
        self.staged.earned.push(earned.clone());
        Ok(true)
    }

    async fn insert_notification(
        &mut self,
        notification: &Notification,
    ) -> Result<(), RewardsStoreError> {
        self.staged.notifications.push(notification.clone());
        Ok(())
    }

    async fn find_tree_record(
        &mut self,
        id: &TreeRecordId,
    ) -> Result<Option<TreeRecord>, RewardsStoreError> {
        Ok(self.staged.tree_records.get(id).cloned())
    }

    async fn insert_tree_record(&mut self, record: &TreeRecord) -> Result<(), RewardsStoreError> {
        if self.staged.tree_records.contains_key(&record.id) {
            return Err(RewardsStoreError::query(format!(
                "tree record {} already exists",
                record.id
            )));
        }
        self.staged.tree_records.insert(record.id, record.clone());
        Ok(())
    }

    async fn mark_tree_verified(
        &mut self,
        id: &TreeRecordId,
        verified_at: DateTime<Utc>,
    ) -> Result<VerificationTransition, RewardsStoreError> {
        let Some(record) = self.staged.tree_records.get_mut(id) else {
            return Ok(VerificationTransition::Missing);
        };
        if record.verified {
            return Ok(VerificationTransition::AlreadyVerified(record.clone()));
        }
        record.verified = true;
        record.verified_at = Some(verified_at);
        Ok(VerificationTransition::Verified(record.clone()))
    }

    async fn commit(self: Box<Self>) -> Result<(), RewardsStoreError> {
        let Self { mut guard, staged } = *self;
        *guard = staged;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), RewardsStoreError> {
        Ok(())
    }
}

#[async_trait]
impl NotificationRepository for InMemoryRewardsStore {
    async fn insert(
        &self,
        notification: &Notification,
    ) -> Result<(), NotificationRepositoryError> {
        self.state
            .lock()
            .await
            .notifications
            .push(notification.clone());
        Ok(())
    }

    async fn find(
        &self,
        id: &NotificationId,
    ) -> Result<Option<Notification>, NotificationRepositoryError> {
        Ok(self
            .state
            .lock()
            .await
            .notifications
            .iter()
            .find(|notification| &notification.id == id)
            .cloned())
    }

    async fn list_for_user(
        &self,
        user_id: &UserId,
        unread_only: bool,
    ) -> Result<Vec<Notification>, NotificationRepositoryError> {
        let mut listed: Vec<Notification> = self
            .state
            .lock()
            .await
            .notifications
            .iter()
            .filter(|notification| &notification.recipient == user_id)
            .filter(|notification| !unread_only || !notification.is_read)
            .cloned()
            .collect();
        sort_newest_first(&mut listed);
        Ok(listed)
    }

    async fn unread_count(&self, user_id: &UserId) -> Result<u64, NotificationRepositoryError> {
        let state = self.state.lock().await;
        let unread = state
            .notifications
            .iter()
            .filter(|notification| &notification.recipient == user_id && !notification.is_read)
            .count();
        Ok(u64::try_from(unread).unwrap_or(u64::MAX))
    }

    async fn mark_read(
        &self,
        id: &NotificationId,
        read_at: DateTime<Utc>,
    ) -> Result<Option<Notification>, NotificationRepositoryError> {
        let mut state = self.state.lock().await;
        Ok(state
            .notifications
            .iter_mut()
            .find(|notification| &notification.id == id)
            .map(|notification| {
                notification.mark_read(read_at);
                notification.clone()
            }))
    }

    async fn mark_all_read(
        &self,
        user_id: &UserId,
        read_at: DateTime<Utc>,
    ) -> Result<u64, NotificationRepositoryError> {
        let mut state = self.state.lock().await;
        let changed = state
            .notifications
            .iter_mut()
            .filter(|notification| &notification.recipient == user_id)
            .map(|notification| notification.mark_read(read_at))
            .filter(|changed| *changed)
            .count();
        Ok(u64::try_from(changed).unwrap_or(u64::MAX))
    }
}

#[async_trait]
impl LeaderboardRepository for InMemoryRewardsStore {
    async fn user_points(
        &self,
        user_id: &UserId,
    ) -> Result<Option<i64>, LeaderboardRepositoryError> {
        Ok(self.state.lock().await.users.get(user_id).map(User::points))
    }

    async fn count_users_above(&self, points: i64) -> Result<u64, LeaderboardRepositoryError> {
        let state = self.state.lock().await;
        let above = state
            .users
            .values()
            .filter(|user| user.points() > points)
            .count();
        Ok(u64::try_from(above).unwrap_or(u64::MAX))
    }

    async fn top_standings(&self, _limit: usize) -> Result<Vec<Standing>, LeaderboardRepositoryError> {
        // Ordering and truncation happen in `rank_standings`.
        let state = self.state.lock().await;
        Ok(state
            .users
            .values()
            .filter_map(|user| state.standing(user.id(), user.points()))
            .collect())
    }

    async fn weekly_standings(
        &self,
        since: DateTime<Utc>,
        _limit: usize,
    ) -> Result<Vec<Standing>, LeaderboardRepositoryError> {
        let state = self.state.lock().await;
        let mut sums: HashMap<&UserId, i64> = HashMap::new();
        for entry in state.ledger.iter().filter(|entry| entry.created_at >= since) {
            *sums.entry(&entry.user_id).or_default() += i64::from(entry.delta);
        }
        Ok(sums
            .into_iter()
            .filter_map(|(user_id, points)| state.standing(user_id, points))
            .collect())
    }
}

#[async_trait]
impl TreeStatisticsRepository for InMemoryRewardsStore {
    async fn statistics_for(
        &self,
        owner: &UserId,
    ) -> Result<TreeStatistics, TreeStatisticsRepositoryError> {
        Ok(self.state.lock().await.statistics(owner))
    }
}

#[async_trait]
impl CertificationRepository for InMemoryRewardsStore {
    async fn list_definitions(
        &self,
    ) -> Result<Vec<CertificationDefinition>, CertificationRepositoryError> {
        let mut definitions = self.state.lock().await.certifications.clone();
        definitions.sort_by(CertificationDefinition::catalog_order);
        Ok(definitions)
    }

    async fn list_earned(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<HeldCertification>, CertificationRepositoryError> {
        let state = self.state.lock().await;
        Ok(state
            .earned
            .iter()
            .filter(|earned| &earned.user_id == user_id)
            .filter_map(|earned| {
                state
                    .certifications
                    .iter()
                    .find(|definition| definition.id == earned.certification_id)
                    .map(|definition| HeldCertification {
                        certification: definition.clone(),
                        points_at_award: earned.points_at_award,
                        earned_at: earned.earned_at,
                    })
            })
            .collect())
    }

    async fn insert_definition_if_absent(
        &self,
        definition: &CertificationDefinition,
    ) -> Result<bool, CertificationRepositoryError> {
        let mut state = self.state.lock().await;
        if state
            .certifications
            .iter()
            .any(|existing| existing.name == definition.name)
        {
            return Ok(false);
        }
        state.certifications.push(definition.clone());
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    //! Transaction visibility and inbox behaviour of the in-memory store.
    use super::*;
    use crate::domain::{DisplayName, NotificationDraft, NotificationType};
    use crate::test_support::midweek;
    use chrono::TimeDelta;
    use rstest::{fixture, rstest};

    #[fixture]
    fn user() -> User {
        User::new(
            UserId::random(),
            DisplayName::new("Wanjiru").expect("valid name"),
        )
    }

    fn notification(recipient: &UserId) -> Notification {
        NotificationDraft::new(
            recipient.clone(),
            NotificationType::PointsAwarded,
            "Points awarded",
            "You earned 10 points",
        )
        .into_notification(midweek())
        .expect("valid draft")
    }

    #[rstest]
    #[tokio::test]
    async fn rollback_discards_staged_writes(user: User) {
        let store = InMemoryRewardsStore::new();
        store.insert_user(user.clone()).await;

        let mut tx = store.begin().await.expect("begin");
        tx.insert_notification(&notification(user.id()))
            .await
            .expect("insert");
        tx.rollback().await.expect("rollback");

        let listed = store
            .list_for_user(user.id(), false)
            .await
            .expect("list");
        assert!(listed.is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn dropped_transaction_discards_staged_writes(user: User) {
        let store = InMemoryRewardsStore::new();
        store.insert_user(user.clone()).await;

        {
            let mut tx = store.begin().await.expect("begin");
            tx.insert_notification(&notification(user.id()))
                .await
                .expect("insert");
        }

        assert_eq!(store.unread_count(user.id()).await.expect("count"), 0);
    }

    #[rstest]
    #[tokio::test]
    async fn commit_publishes_staged_writes(user: User) {
        let store = InMemoryRewardsStore::new();
        store.insert_user(user.clone()).await;

        let mut tx = store.begin().await.expect("begin");
        tx.lock_user(user.id()).await.expect("lock");
        tx.insert_notification(&notification(user.id()))
            .await
            .expect("insert");
        tx.commit().await.expect("commit");

        assert_eq!(store.unread_count(user.id()).await.expect("count"), 1);
    }

    #[tokio::test]
    async fn locking_unknown_user_fails() {
        let store = InMemoryRewardsStore::new();
        let mut tx = store.begin().await.expect("begin");

        let error = tx
            .lock_user(&UserId::random())
            .await
            .expect_err("unknown user");

        assert!(matches!(error, RewardsStoreError::MissingUser { .. }));
    }

    #[rstest]
    #[tokio::test]
    async fn mark_read_keeps_first_read_time(user: User) {
        let store = InMemoryRewardsStore::new();
        let stored = notification(user.id());
        store.insert(&stored).await.expect("insert");
        let first = midweek() + TimeDelta::minutes(5);

        store.mark_read(&stored.id, first).await.expect("first read");
        let again = store
            .mark_read(&stored.id, first + TimeDelta::hours(1))
            .await
            .expect("second read")
            .expect("notification exists");

        assert_eq!(again.read_at, Some(first));
    }

    #[rstest]
    #[tokio::test]
    async fn duplicate_names_are_not_reinserted() {
        let store = InMemoryRewardsStore::new();
        let seedling = crate::test_support::certification(
            "Seedling",
            crate::domain::CertificationTier::Bronze,
            0,
            1,
            0,
        );
        let mut twin = seedling.clone();
        twin.id = crate::domain::CertificationId::random();

        assert!(store.insert_definition_if_absent(&seedling).await.expect("insert"));
        assert!(!store.insert_definition_if_absent(&twin).await.expect("insert"));
        assert_eq!(store.list_definitions().await.expect("list").len(), 1);
    }

    fn record(owner: &UserId, kind: TreeRecordKind, species: &str) -> TreeRecord {
        TreeRecord {
            id: TreeRecordId::random(),
            owner: owner.clone(),
            kind,
            parent: None,
            species: species.to_owned(),
            verified: false,
            authenticity_score: crate::domain::AuthenticityScore::UNASSESSED,
            created_at: midweek(),
            verified_at: None,
        }
    }

    #[rstest]
    #[tokio::test]
    async fn statistics_count_kinds_and_distinct_species(user: User) {
        let store = InMemoryRewardsStore::new();
        store.insert_user(user.clone()).await;
        for (kind, species) in [
            (TreeRecordKind::Plant, "Mango"),
            (TreeRecordKind::Plant, "Acacia"),
            (TreeRecordKind::Update, "Mango"),
        ] {
            store.insert_tree_record(record(user.id(), kind, species)).await;
        }
        store
            .insert_tree_record(record(&UserId::random(), TreeRecordKind::Plant, "Baobab"))
            .await;

        let stats = store.statistics_for(user.id()).await.expect("statistics");

        assert_eq!(
            stats,
            TreeStatistics {
                total_records: 3,
                plant_records: 2,
                update_records: 1,
                species_count: 2,
            }
        );
        assert_eq!(
            store
                .statistics_for(&UserId::random())
                .await
                .expect("statistics"),
            TreeStatistics::default()
        );
    }
}
