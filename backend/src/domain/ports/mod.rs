//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports (`*Repository`, [`RewardsStore`], side channels) are
//! implemented by outbound adapters. Driving ports (`*Command`, `*Query`) are
//! implemented by domain services and consumed by callers such as the admin
//! binary.

mod macros;
pub(crate) use macros::define_port_error;

mod authenticity_scorer;
mod certification_anchor;
mod certification_catalog;
mod certification_repository;
mod leaderboard_query;
mod leaderboard_repository;
mod notification_command;
mod notification_query;
mod notification_repository;
mod points_award_command;
mod rewards_store;
mod tree_statistics_query;
mod tree_statistics_repository;
mod tree_submission_command;
mod tree_verification_command;

#[cfg(test)]
pub use authenticity_scorer::MockAuthenticityScorer;
pub use authenticity_scorer::{
    AuthenticityRequest, AuthenticityScorer, AuthenticityScorerError, FixedAuthenticityScorer,
};
#[cfg(test)]
pub use certification_anchor::MockCertificationAnchor;
pub use certification_anchor::{
    AnchorReceipt, AnchorRequest, CertificationAnchor, CertificationAnchorError,
    DisabledCertificationAnchor,
};
#[cfg(test)]
pub use certification_catalog::{MockCertificationCatalogCommand, MockCertificationCatalogQuery};
pub use certification_catalog::{CertificationCatalogCommand, CertificationCatalogQuery, SeedReport};
#[cfg(test)]
pub use certification_repository::MockCertificationRepository;
pub use certification_repository::{
    CertificationRepository, CertificationRepositoryError, FixtureCertificationRepository,
};
#[cfg(test)]
pub use leaderboard_query::MockLeaderboardQuery;
pub use leaderboard_query::{LeaderboardQuery, UserRank, WeeklyLeaderboard};
#[cfg(test)]
pub use leaderboard_repository::MockLeaderboardRepository;
pub use leaderboard_repository::{
    FixtureLeaderboardRepository, LeaderboardRepository, LeaderboardRepositoryError,
};
#[cfg(test)]
pub use notification_command::MockNotificationCommand;
pub use notification_command::NotificationCommand;
#[cfg(test)]
pub use notification_query::MockNotificationQuery;
pub use notification_query::NotificationQuery;
#[cfg(test)]
pub use notification_repository::MockNotificationRepository;
pub use notification_repository::{
    FixtureNotificationRepository, NotificationRepository, NotificationRepositoryError,
};
#[cfg(test)]
pub use points_award_command::MockPointsAwardCommand;
pub use points_award_command::{AwardOutcome, AwardRequest, PointsAwardCommand};
#[cfg(test)]
pub use rewards_store::{MockRewardsStore, MockRewardsTransaction};
pub use rewards_store::{RewardsStore, RewardsStoreError, RewardsTransaction};
#[cfg(test)]
pub use tree_statistics_query::MockTreeStatisticsQuery;
pub use tree_statistics_query::TreeStatisticsQuery;
#[cfg(test)]
pub use tree_statistics_repository::MockTreeStatisticsRepository;
pub use tree_statistics_repository::{
    FixtureTreeStatisticsRepository, TreeStatisticsRepository, TreeStatisticsRepositoryError,
};
#[cfg(test)]
pub use tree_submission_command::MockTreeSubmissionCommand;
pub use tree_submission_command::{SubmitTreeRecordRequest, TreeSubmissionCommand};
#[cfg(test)]
pub use tree_verification_command::MockTreeVerificationCommand;
pub use tree_verification_command::{TreeVerificationCommand, TreeVerificationOutcome};
