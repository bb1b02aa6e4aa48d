//! Integration tests for dimension validation against fixture files.

use std::path::PathBuf;
use std::sync::Arc;

use rstest::rstest;

use skillmix::application::services::DimensionLoader;
use skillmix::domain::{validate, ValidationIssue};
use skillmix::infrastructure::traits::DirectorySource;

fn loader() -> DimensionLoader {
    let root = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/resources");
    DimensionLoader::new(
        Arc::new(DirectorySource::new(root)),
        "clinical-skill-mix",
        16,
    )
}

#[rstest]
#[case("task")]
#[case("conditions")]
#[case("care_provider_role")]
#[case("agent_facing")]
fn given_consistent_fixture_when_validating_then_no_issues(#[case] name: &str) {
    let loaded = loader().load(name).unwrap();

    let report = validate(&loaded.document);

    assert!(report.is_valid(), "{name}: {:?}", report.issues);
    assert_eq!(report.items_checked, loaded.statistics.total_items);
}

#[test]
fn given_inconsistent_fixture_when_validating_then_every_problem_reported() {
    // Arrange
    let loaded = loader().load("inconsistent").unwrap();

    // Act
    let report = validate(&loaded.document);

    // Assert
    assert_eq!(
        report.issues,
        vec![
            ValidationIssue::DanglingChild {
                id: "a".into(),
                child_id: "ghost".into()
            },
            ValidationIssue::DepthMismatch {
                id: "a/b".into(),
                depth: 2,
                parent_depth: 0
            },
            ValidationIssue::PathLength {
                id: "a/b".into(),
                components: 2,
                depth: 2
            },
            ValidationIssue::DanglingParent {
                id: "orphan".into(),
                parent_id: "missing".into()
            },
            ValidationIssue::PathLength {
                id: "orphan".into(),
                components: 1,
                depth: 1
            },
        ]
    );
}

#[test]
fn given_inconsistent_fixture_when_loading_then_still_loads_and_renders() {
    let loaded = loader().load("inconsistent").unwrap();

    assert_eq!(loaded.statistics.total_items, 3);
    assert_eq!(loaded.children("a").len(), 1);
}
