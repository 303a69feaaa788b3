//! Operator tooling for the rewards backend.
//!
//! Settings come from `REWARDS_*` environment variables or a configuration
//! file; the subcommands below only carry per-invocation arguments.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::ffi::OsString;
use std::io::{self, Write};
use std::sync::Arc;

use backend::RewardsSettings;
use backend::domain::ports::{
    AwardRequest, CertificationCatalogCommand, LeaderboardQuery, PointsAwardCommand,
    SubmitTreeRecordRequest, TreeStatisticsQuery, TreeSubmissionCommand,
    TreeVerificationCommand, TreeVerificationOutcome,
};
use backend::domain::{
    AwardPipeline, CertificationCatalogService, LeaderboardEntry, LeaderboardService,
    PointsCategory, TreeRecordId, TreeRecordKind, TreeStatisticsService,
    TreeVerificationService, UserId,
};
use backend::outbound::persistence::{
    DbPool, DieselCertificationRepository, DieselLeaderboardRepository, DieselRewardsStore,
    DieselTreeStatisticsRepository, PoolConfig, run_pending_migrations,
};
use backend::service_builders;
use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr, eyre};
use mockable::{Clock, DefaultClock};
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};
use url::Url;
use uuid::Uuid;

const DEFAULT_LEADERBOARD_LIMIT: usize = 10;

/// `rewards-admin` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "rewards-admin",
    about = "Migrate, seed and inspect the tree-planting rewards database",
    version
)]
struct CliArgs {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Apply pending schema migrations.
    Migrate,
    /// Create any missing default certifications.
    SeedCertifications,
    /// Append a manual ledger entry and run the award pipeline.
    AdjustPoints {
        /// User identifier (UUID).
        #[arg(long = "user", value_name = "uuid")]
        user: Uuid,
        /// Signed points delta.
        #[arg(long = "delta", allow_hyphen_values = true)]
        delta: i32,
        /// Reason recorded on the ledger entry.
        #[arg(long = "reason")]
        reason: String,
        /// Ledger category, e.g. `bonus` or `achievement`.
        #[arg(long = "category", default_value = "admin_adjustment")]
        category: PointsCategory,
    },
    /// Submit a tree record for review, scoring it when a scorer is configured.
    SubmitTree {
        /// Submitting user (UUID).
        #[arg(long = "user", value_name = "uuid")]
        user: Uuid,
        /// `plant` or `update`.
        #[arg(long = "kind", default_value = "plant")]
        kind: TreeRecordKind,
        /// Plant record an update refers to (UUID).
        #[arg(long = "parent", value_name = "uuid")]
        parent: Option<Uuid>,
        /// Species name.
        #[arg(long = "species")]
        species: String,
        /// Uploaded photo location passed to the scorer.
        #[arg(long = "photo-url", value_name = "url")]
        photo_url: Option<Url>,
    },
    /// Mark a tree record verified and award its owner.
    VerifyTree {
        /// Tree record identifier (UUID).
        #[arg(long = "record", value_name = "uuid")]
        record: Uuid,
    },
    /// Print record totals and distinct species for one user.
    TreeStats {
        /// User identifier (UUID).
        #[arg(long = "user", value_name = "uuid")]
        user: Uuid,
    },
    /// Print the all-time or weekly leaderboard.
    Leaderboard {
        /// Rank by points earned since Monday 00:00 UTC.
        #[arg(long = "weekly")]
        weekly: bool,
        /// Number of rows to print.
        #[arg(long = "limit", default_value_t = DEFAULT_LEADERBOARD_LIMIT)]
        limit: usize,
    },
}

fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let args = CliArgs::parse();
    let settings = RewardsSettings::load_from_iter([OsString::from("rewards-admin")])
        .map_err(|err| eyre!("failed to load rewards settings: {err}"))?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .wrap_err("create Tokio runtime")?;
    runtime.block_on(run(args.command, &settings))
}

async fn run(command: Command, settings: &RewardsSettings) -> Result<()> {
    let pool_config = settings.pool_config()?;
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);

    match command {
        Command::Migrate => migrate(pool_config.database_url()).await,
        Command::SeedCertifications => seed(connect(pool_config).await?).await,
        Command::AdjustPoints {
            user,
            delta,
            reason,
            category,
        } => {
            let user = UserId::from_uuid(user);
            let pipeline = award_pipeline(connect(pool_config).await?, clock, settings)?;
            let outcome = pipeline
                .award_points(AwardRequest::new(user.clone(), delta, category).with_reason(reason))
                .await?;
            info!(
                user_id = %user,
                delta,
                %category,
                points = outcome.progress.points,
                "points adjusted"
            );
            let mut out = io::stdout().lock();
            writeln!(out, "points={}", outcome.progress.points)?;
            for certification in outcome.newly_earned {
                writeln!(out, "earned={}", certification.name)?;
            }
            Ok(())
        }
        Command::VerifyTree { record } => {
            let pipeline = award_pipeline(connect(pool_config).await?, clock, settings)?;
            let service = TreeVerificationService::new(pipeline, settings.award_policy());
            let outcome = service
                .verify_tree_record(&TreeRecordId::from_uuid(record))
                .await?;
            let mut out = io::stdout().lock();
            match outcome {
                TreeVerificationOutcome::Verified { award, .. } => {
                    writeln!(out, "status=verified")?;
                    writeln!(out, "awarded={}", award.entry.delta)?;
                    writeln!(out, "points={}", award.progress.points)?;
                }
                TreeVerificationOutcome::AlreadyVerified { .. } => {
                    writeln!(out, "status=already_verified")?;
                }
            }
            Ok(())
        }
        Command::SubmitTree {
            user,
            kind,
            parent,
            species,
            photo_url,
        } => {
            let store = Arc::new(DieselRewardsStore::new(connect(pool_config).await?));
            let service = service_builders::tree_submission_service(store, clock, settings)?;
            let record = service
                .submit(SubmitTreeRecordRequest {
                    owner: UserId::from_uuid(user),
                    kind,
                    parent: parent.map(TreeRecordId::from_uuid),
                    species,
                    photo_url,
                })
                .await?;
            let mut out = io::stdout().lock();
            writeln!(out, "record={}", record.id)?;
            writeln!(out, "authenticity_score={}", record.authenticity_score.value())?;
            Ok(())
        }
        Command::TreeStats { user } => {
            let repo = DieselTreeStatisticsRepository::new(connect(pool_config).await?);
            let stats = TreeStatisticsService::new(Arc::new(repo))
                .statistics(&UserId::from_uuid(user))
                .await?;
            let mut out = io::stdout().lock();
            writeln!(out, "total_records={}", stats.total_records)?;
            writeln!(out, "plant_records={}", stats.plant_records)?;
            writeln!(out, "update_records={}", stats.update_records)?;
            writeln!(out, "species_count={}", stats.species_count)?;
            Ok(())
        }
        Command::Leaderboard { weekly, limit } => {
            let repo = DieselLeaderboardRepository::new(connect(pool_config).await?);
            let service = LeaderboardService::new(Arc::new(repo), clock);
            let entries = if weekly {
                let board = service.weekly(limit).await?;
                writeln!(
                    io::stdout().lock(),
                    "week_start={}",
                    board.week_start.to_rfc3339()
                )?;
                board.entries
            } else {
                service.top_users(limit).await?
            };
            print_leaderboard(&entries)
        }
    }
}

async fn connect(config: PoolConfig) -> Result<DbPool> {
    DbPool::new(config).await.wrap_err("create database pool")
}

async fn migrate(database_url: &str) -> Result<()> {
    let applied = run_pending_migrations(database_url).await?;
    let mut out = io::stdout().lock();
    writeln!(out, "applied {} migration(s)", applied.len())?;
    for version in applied {
        writeln!(out, "  {version}")?;
    }
    Ok(())
}

async fn seed(pool: DbPool) -> Result<()> {
    let service =
        CertificationCatalogService::new(Arc::new(DieselCertificationRepository::new(pool)));
    let report = service.seed_default_catalog().await?;
    let mut out = io::stdout().lock();
    for name in &report.created {
        writeln!(out, "created={name}")?;
    }
    for name in &report.existing {
        writeln!(out, "existing={name}")?;
    }
    Ok(())
}

fn award_pipeline(
    pool: DbPool,
    clock: Arc<dyn Clock>,
    settings: &RewardsSettings,
) -> Result<AwardPipeline<DieselRewardsStore>> {
    service_builders::award_pipeline(Arc::new(DieselRewardsStore::new(pool)), clock, settings)
        .wrap_err("build award pipeline")
}

fn print_leaderboard(entries: &[LeaderboardEntry]) -> Result<()> {
    let mut out = io::stdout().lock();
    for entry in entries {
        writeln!(
            out,
            "{rank:>4}  {points:>8}  {name}",
            rank = entry.rank,
            points = entry.points,
            name = entry.display_name,
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    //! Unit tests for CLI argument parsing.

    use rstest::rstest;

    use super::{CliArgs, Command, PointsCategory, TreeRecordKind};
    use clap::Parser;

    fn parse(args: &[&str]) -> Result<Command, clap::Error> {
        CliArgs::try_parse_from(std::iter::once("rewards-admin").chain(args.iter().copied()))
            .map(|cli| cli.command)
    }

    const USER: &str = "5f0c1a9e-6a0b-4c2e-9d55-0a4e7b3c2f11";

    #[rstest]
    fn adjustment_defaults_to_admin_category() {
        let command = parse(&["adjust-points", "--user", USER, "--delta", "-5", "--reason", "typo"])
            .expect("arguments parse");
        assert!(matches!(
            command,
            Command::AdjustPoints {
                delta: -5,
                category: PointsCategory::AdminAdjustment,
                ..
            }
        ));
    }

    #[rstest]
    #[case::bonus("bonus", PointsCategory::Bonus)]
    #[case::achievement("achievement", PointsCategory::Achievement)]
    fn adjustment_accepts_a_category(#[case] raw: &str, #[case] expected: PointsCategory) {
        let command = parse(&[
            "adjust-points",
            "--user",
            USER,
            "--delta",
            "25",
            "--reason",
            "event",
            "--category",
            raw,
        ])
        .expect("arguments parse");
        assert!(matches!(
            command,
            Command::AdjustPoints { category, .. } if category == expected
        ));
    }

    #[rstest]
    fn unknown_category_is_rejected() {
        let error = parse(&[
            "adjust-points",
            "--user",
            USER,
            "--delta",
            "1",
            "--reason",
            "x",
            "--category",
            "gift",
        ])
        .expect_err("unknown category");
        assert!(error.to_string().contains("unknown points category"));
    }

    #[rstest]
    fn submission_defaults_to_a_plant() {
        let command = parse(&["submit-tree", "--user", USER, "--species", "Mango"])
            .expect("arguments parse");
        assert!(matches!(
            command,
            Command::SubmitTree {
                kind: TreeRecordKind::Plant,
                parent: None,
                ..
            }
        ));
    }
}
