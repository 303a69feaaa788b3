//! Domain primitives, ports and services of the rewards backend.
//!
//! Purpose: define strongly typed entities for the points ledger,
//! certification rules and notifications, the ports adapters implement, and
//! the services that drive the award pipeline. Keep types immutable and
//! document invariants in each type's Rustdoc.
//!
//! Public surface:
//! - Error / ErrorCode: transport-agnostic error payload.
//! - User, LedgerEntry, TreeRecord, CertificationDefinition, Notification:
//!   the rewards data model.
//! - AwardPipeline and the verification, submission, notification,
//!   leaderboard, statistics and catalog services implementing the driving
//!   ports.

pub mod award_pipeline;
pub mod award_policy;
pub mod certification;
pub mod certification_catalog_service;
pub mod error;
pub mod leaderboard;
pub mod leaderboard_service;
pub mod notification;
pub mod notification_service;
pub mod points;
pub mod ports;
pub mod side_effects;
pub mod tree_record;
pub mod tree_statistics_service;
pub mod tree_submission_service;
pub mod tree_verification_service;
pub mod user;

pub use self::award_pipeline::AwardPipeline;
pub use self::award_policy::{AwardPolicy, DEFAULT_AUTHENTICITY_MULTIPLIER, DEFAULT_BASE_POINTS};
pub use self::certification::{
    CertificationDefinition, CertificationId, CertificationThresholds, CertificationTier,
    CertificationValidationError, EarnedCertification, HeldCertification,
    ParseCertificationTierError, QualificationFailure, UserProgress, VERIFICATION_RATE_MAX,
    qualifying_certifications,
};
pub use self::certification_catalog_service::{CertificationCatalogService, default_catalog};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::leaderboard::{LeaderboardEntry, Standing, rank_for, rank_standings, week_start};
pub use self::leaderboard_service::LeaderboardService;
pub use self::notification::{
    Notification, NotificationDraft, NotificationId, NotificationType,
    NotificationValidationError, ParseNotificationTypeError, sort_newest_first,
};
pub use self::notification_service::NotificationService;
pub use self::points::{
    LedgerEntry, LedgerEntryId, ParsePointsCategoryError, PointsCategory, total_points,
};
pub use self::side_effects::{BestEffort, DEFAULT_SIDE_EFFECT_TIMEOUT, SideEffectOutcome};
pub use self::tree_record::{
    AUTHENTICITY_SCORE_MAX, AuthenticityScore, AuthenticityScoreError, ParseTreeRecordKindError,
    TreeCounts, TreeRecord, TreeRecordId, TreeRecordKind, TreeStatistics,
    VerificationTransition,
};
pub use self::tree_statistics_service::TreeStatisticsService;
pub use self::tree_submission_service::TreeSubmissionService;
pub use self::tree_verification_service::TreeVerificationService;
pub use self::user::{
    DISPLAY_NAME_MAX, DISPLAY_NAME_MIN, DisplayName, User, UserId, UserValidationError,
};

/// Convenient result alias for driving-port operations.
///
/// # Examples
/// ```
/// use backend::domain::{DomainResult, Error};
///
/// fn lookup() -> DomainResult<u64> {
///     Err(Error::not_found("user not found"))
/// }
/// assert!(lookup().is_err());
/// ```
pub type DomainResult<T> = Result<T, Error>;
