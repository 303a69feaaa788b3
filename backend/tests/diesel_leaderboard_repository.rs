//! Integration tests for `DieselLeaderboardRepository` against embedded PostgreSQL.

use std::sync::Arc;

use backend::domain::ports::{AwardRequest, LeaderboardQuery, PointsAwardCommand};
use backend::domain::{AwardPipeline, LeaderboardService, PointsCategory, UserId};
use backend::outbound::persistence::{DieselLeaderboardRepository, DieselRewardsStore};
use backend::test_support::{MutableClock, midweek};
use chrono::TimeDelta;
use pg_embedded_setup_unpriv::TestCluster;
use rstest::{fixture, rstest};
use tokio::runtime::Runtime;

mod support;

use support::{connect, handle_cluster_setup_failure, migrated_database, seed_user};

const TEST_DB: &str = "diesel_leaderboard_repo_test";

struct TestContext {
    runtime: Runtime,
    _cluster: TestCluster,
    database_url: String,
    store: Arc<DieselRewardsStore>,
    repository: Arc<DieselLeaderboardRepository>,
    clock: Arc<MutableClock>,
}

impl TestContext {
    fn user(&self, name: &str) -> UserId {
        seed_user(&self.database_url, name).expect("seed user")
    }

    fn award(&self, user: &UserId, delta: i32) {
        let pipeline = AwardPipeline::new(Arc::clone(&self.store), self.clock.clone());
        self.runtime
            .block_on(pipeline.award_points(AwardRequest::new(
                user.clone(),
                delta,
                PointsCategory::Bonus,
            )))
            .expect("award succeeds");
    }

    fn service(&self) -> LeaderboardService<DieselLeaderboardRepository> {
        LeaderboardService::new(Arc::clone(&self.repository), self.clock.clone())
    }
}

fn setup_context() -> Result<TestContext, String> {
    let runtime = Runtime::new().map_err(|err| err.to_string())?;
    let database = migrated_database(&runtime, TEST_DB)?;
    let pool = connect(&runtime, &database.url, 2)?;

    Ok(TestContext {
        runtime,
        _cluster: database.cluster,
        database_url: database.url,
        store: Arc::new(DieselRewardsStore::new(pool.clone())),
        repository: Arc::new(DieselLeaderboardRepository::new(pool)),
        clock: Arc::new(MutableClock::new(midweek())),
    })
}

#[fixture]
fn repo_context() -> Option<TestContext> {
    match setup_context() {
        Ok(ctx) => Some(ctx),
        Err(reason) => handle_cluster_setup_failure(reason),
    }
}

#[rstest]
fn tied_totals_share_a_rank(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: tied_totals_share_a_rank skipped");
        return;
    };
    let leader = context.user("Amani");
    let tied_a = context.user("Baraka");
    let tied_b = context.user("Chiku");
    context.award(&leader, 300);
    context.award(&tied_a, 120);
    context.award(&tied_b, 120);
    let service = context.service();

    let (board, rank) = context.runtime.block_on(async {
        let board = service.top_users(10).await.expect("board");
        let rank = service.rank(&tied_b).await.expect("rank");
        (board, rank)
    });

    let ranks: Vec<_> = board
        .iter()
        .map(|entry| (entry.display_name.as_ref().to_owned(), entry.rank))
        .collect();
    assert_eq!(
        ranks,
        [
            ("Amani".to_owned(), 1),
            ("Baraka".to_owned(), 2),
            ("Chiku".to_owned(), 2),
        ]
    );
    assert_eq!(rank.rank, 2);
    assert_eq!(rank.points, 120);
}

#[rstest]
fn weekly_board_ignores_entries_before_monday(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: weekly_board_ignores_entries_before_monday skipped");
        return;
    };
    let veteran = context.user("Daudi");
    let newcomer = context.user("Eshe");

    context.clock.set(midweek() - TimeDelta::days(3));
    context.award(&veteran, 500);
    context.clock.set(midweek() - TimeDelta::hours(58));
    context.award(&veteran, 10);
    context.clock.set(midweek());
    context.award(&newcomer, 40);

    let board = context
        .runtime
        .block_on(context.service().weekly(10))
        .expect("weekly board");

    assert_eq!(board.week_start, midweek() - TimeDelta::hours(58));
    let rows: Vec<_> = board
        .entries
        .iter()
        .map(|entry| (entry.display_name.as_ref().to_owned(), entry.points))
        .collect();
    assert_eq!(rows, [("Eshe".to_owned(), 40), ("Daudi".to_owned(), 10)]);
}

#[rstest]
fn unknown_user_has_no_rank(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: unknown_user_has_no_rank skipped");
        return;
    };

    let error = context
        .runtime
        .block_on(context.service().rank(&UserId::random()))
        .expect_err("unknown user");

    assert_eq!(error.code(), backend::domain::ErrorCode::NotFound);
}
