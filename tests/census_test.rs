//! Integration tests for the all-dimension census.

use std::path::PathBuf;
use std::sync::Arc;

use skillmix::application::services::{Census, CubeVocabulary, DimensionLoader, Framework};
use skillmix::infrastructure::traits::DirectorySource;

fn loader() -> DimensionLoader {
    let root = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/resources");
    DimensionLoader::new(
        Arc::new(DirectorySource::new(root)),
        "clinical-skill-mix",
        16,
    )
}

#[test]
fn given_fixture_cube_when_counting_then_framework_totals() {
    // Arrange
    let vocabulary = CubeVocabulary::bundled().unwrap();

    // Act
    let census = Census::take(&loader(), &vocabulary);

    // Assert
    assert_eq!(census.dimensions.len(), 8);
    assert_eq!(census.failures(), 0);
    assert_eq!(census.framework_total(Framework::ClinicalCompetency), 15);
    assert_eq!(census.framework_total(Framework::CognitiveEngagement), 9);
    assert_eq!(census.grand_total(), 24);
}

#[test]
fn given_levels_in_document_when_counting_then_depths_labelled() {
    let vocabulary = CubeVocabulary::bundled().unwrap();

    let census = Census::take(&loader(), &vocabulary);

    let conditions = census
        .dimensions
        .iter()
        .find(|d| d.key == "condition")
        .unwrap();
    let levels: Vec<(u32, Option<&str>, usize)> = conditions
        .by_depth
        .iter()
        .map(|l| (l.depth, l.label.as_deref(), l.count))
        .collect();
    assert_eq!(
        levels,
        vec![(0, Some("chapter"), 1), (1, Some("condition"), 2)]
    );
    assert!(census.to_text().contains("Level 1 (condition): 2"));
}

#[test]
fn given_missing_dimension_when_counting_then_reported_not_fatal() {
    let mut vocabulary = CubeVocabulary::bundled().unwrap();
    vocabulary.dimensions[1].file = "gone".to_string();

    let census = Census::take(&loader(), &vocabulary);

    assert_eq!(census.failures(), 1);
    assert_eq!(census.framework_total(Framework::ClinicalCompetency), 12);
    assert!(census.to_text().contains("not loaded"));
}
