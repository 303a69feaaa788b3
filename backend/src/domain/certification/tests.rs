//! Threshold evaluation and catalog ordering.

use super::*;
use rstest::{fixture, rstest};

fn thresholds(points: i64, trees: u64, rate: u32) -> CertificationThresholds {
    CertificationThresholds {
        required_points: points,
        required_trees: trees,
        required_verification_rate: rate,
    }
}

fn progress(points: i64, total: u64, verified: u64) -> UserProgress {
    UserProgress {
        points,
        trees: TreeCounts { total, verified },
    }
}

fn definition(name: &str, tier: CertificationTier, points: i64) -> CertificationDefinition {
    CertificationDefinition::new(name, "", "award", tier, thresholds(points, 0, 0))
        .expect("valid definition")
}

#[fixture]
fn champion() -> CertificationThresholds {
    thresholds(1500, 10, 80)
}

#[rstest]
fn zero_thresholds_qualify_everyone() {
    assert_eq!(thresholds(0, 0, 0).check(&progress(0, 0, 0)), Ok(()));
}

#[rstest]
fn points_are_checked_first(champion: CertificationThresholds) {
    assert_eq!(
        champion.check(&progress(100, 0, 0)),
        Err(QualificationFailure::InsufficientPoints {
            required: 1500,
            actual: 100,
        })
    );
}

#[rstest]
fn trees_are_checked_after_points(champion: CertificationThresholds) {
    assert_eq!(
        champion.check(&progress(1500, 20, 9)),
        Err(QualificationFailure::InsufficientTrees {
            required: 10,
            actual: 9,
        })
    );
}

#[rstest]
#[case::exactly_at_rate(12, 10, true)]
#[case::just_below_rate(13, 10, false)]
#[case::all_verified(10, 10, true)]
fn rate_uses_exact_integer_comparison(
    champion: CertificationThresholds,
    #[case] total: u64,
    #[case] verified: u64,
    #[case] qualifies: bool,
) {
    // 10/12 = 83.3% passes; 10/13 = 76.9% fails an 80% threshold.
    assert_eq!(champion.check(&progress(2000, total, verified)).is_ok(), qualifies);
}

#[rstest]
fn empty_history_fails_any_nonzero_rate() {
    assert_eq!(
        thresholds(0, 0, 1).check(&progress(0, 0, 0)),
        Err(QualificationFailure::VerificationRateTooLow {
            required: 1,
            verified: 0,
            total: 0,
        })
    );
}

#[rstest]
fn empty_history_passes_zero_rate() {
    assert!(thresholds(0, 0, 0).check(&progress(0, 0, 0)).is_ok());
}

#[rstest]
#[case::blank_name("  ", thresholds(0, 0, 0), CertificationValidationError::EmptyName)]
#[case::negative_points(
    "Debt",
    thresholds(-1, 0, 0),
    CertificationValidationError::NegativePoints { value: -1 }
)]
#[case::rate_over_100(
    "Perfect",
    thresholds(0, 0, 101),
    CertificationValidationError::RateOutOfRange { value: 101 }
)]
fn definitions_reject_invalid_thresholds(
    #[case] name: &str,
    #[case] limits: CertificationThresholds,
    #[case] expected: CertificationValidationError,
) {
    let result = CertificationDefinition::new(
        name,
        "",
        "award",
        CertificationTier::Bronze,
        limits,
    );
    assert_eq!(result, Err(expected));
}

#[rstest]
fn tiers_order_from_bronze_to_platinum() {
    assert!(CertificationTier::Bronze < CertificationTier::Silver);
    assert!(CertificationTier::Silver < CertificationTier::Gold);
    assert!(CertificationTier::Gold < CertificationTier::Platinum);
}

#[rstest]
fn qualifying_returns_catalog_order() {
    let unearned = vec![
        definition("Gold Star", CertificationTier::Gold, 0),
        definition("Silver B", CertificationTier::Silver, 100),
        definition("Silver A", CertificationTier::Silver, 100),
        definition("Bronze", CertificationTier::Bronze, 50),
        definition("Too Far", CertificationTier::Bronze, 10_000),
    ];

    let names: Vec<String> = qualifying_certifications(&progress(270, 0, 0), unearned)
        .into_iter()
        .map(|definition| definition.name)
        .collect();

    assert_eq!(names, ["Bronze", "Silver A", "Silver B", "Gold Star"]);
}

#[rstest]
fn milestone_copy_names_the_certification() {
    let definition = CertificationDefinition::new(
        "Seedling",
        "Plant your first tree record",
        "sprout",
        CertificationTier::Bronze,
        thresholds(0, 1, 0),
    )
    .expect("valid definition");

    assert_eq!(definition.milestone_title(), "Certification earned: Seedling");
    assert!(definition.milestone_message().contains("Plant your first tree record"));
}
