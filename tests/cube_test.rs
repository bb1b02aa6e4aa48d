//! Integration tests for the cube explorer over the fixture dimensions.

use std::path::PathBuf;
use std::sync::Arc;

use rstest::rstest;

use skillmix::application::services::{CubeExplorer, CubeVocabulary, DimensionLoader, Scenario};
use skillmix::infrastructure::traits::{DirectorySource, SelectionItem, Selector};

const DEFAULT_SENTENCE: &str = "AI Competency to augment cardiologists' input layer for \
patient counseling in chronic ischaemic heart disease during treatment planning within the \
emergency room.";

/// Selector that picks the item whose value matches, per prompt.
struct ScriptedSelector {
    picks: Vec<(&'static str, &'static str)>,
}

impl Selector for ScriptedSelector {
    fn select_one(
        &self,
        items: &[SelectionItem],
        prompt: &str,
    ) -> Result<Option<SelectionItem>, String> {
        let wanted = self
            .picks
            .iter()
            .find(|(p, _)| prompt.starts_with(p))
            .map(|(_, value)| *value);
        Ok(wanted.and_then(|value| items.iter().find(|i| i.value == value).cloned()))
    }
}

struct FailingSelector;

impl Selector for FailingSelector {
    fn select_one(&self, _: &[SelectionItem], _: &str) -> Result<Option<SelectionItem>, String> {
        Err("terminal not available".to_string())
    }
}

fn loader(category: &str) -> DimensionLoader {
    let root = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/resources");
    DimensionLoader::new(Arc::new(DirectorySource::new(root)), category, 16)
}

fn populated(apply_defaults: bool) -> CubeExplorer {
    let mut cube = CubeExplorer::new(CubeVocabulary::bundled().unwrap()).unwrap();
    let loaded = cube.populate(&loader("clinical-skill-mix"), apply_defaults);
    assert_eq!(loaded, 8);
    cube
}

#[test]
fn given_defaults_when_populating_then_full_sentence() {
    let cube = populated(true);

    let scenario = cube.scenario();

    assert!(scenario.is_complete());
    assert_eq!(scenario.to_text(), DEFAULT_SENTENCE);
}

#[test]
fn given_two_of_eight_selected_when_building_then_prompt_text() {
    // Arrange
    let mut cube = populated(false);

    // Act
    cube.select("condition", "chapter-i/i25").unwrap();
    cube.select("care_phase", "diagnosis").unwrap();
    let scenario = cube.scenario();

    // Assert
    match &scenario {
        Scenario::Incomplete { prompt, missing } => {
            assert_eq!(prompt, &cube.vocabulary().prompt);
            assert_eq!(missing.len(), 6);
            assert!(missing.contains(&"agent facing".to_string()));
        }
        Scenario::Complete { .. } => panic!("partial sentence rendered"),
    }
    let html = scenario.to_html().render();
    assert!(html.contains(r#"id="combined-scenario""#));
    assert!(html.contains("Select dimensions from both cubes"));
    assert!(!html.contains("populated"));
}

#[rstest]
#[case("encounter_facing", "to augment cardiologist-patient encounter's input layer")]
#[case("patient_facing", "to augment patient's in cardiologist-patient care input layer")]
fn given_agent_facing_choice_when_building_then_agent_phrase_changes(
    #[case] facing: &str,
    #[case] expected: &str,
) {
    let mut cube = populated(true);

    cube.select("agent_facing", facing).unwrap();

    assert!(cube.scenario().to_text().contains(expected));
}

#[test]
fn given_unmapped_role_when_building_then_lowercased_name() {
    let mut cube = populated(true);

    cube.select("care_provider_role", "generalist-medical-practitioners")
        .unwrap();
    cube.select("assigned_authority", "monitoring").unwrap();

    let text = cube.scenario().to_text();
    assert!(
        text.starts_with("AI Competency to monitor generalist medical practitioners' input layer")
    );
}

#[test]
fn given_populated_cube_when_rendering_dropdowns_then_sorted_options_and_select_ids() {
    let cube = populated(true);

    let phases = cube.slot("care_phase").unwrap();
    let names: Vec<&str> = phases.options.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, vec!["Diagnosis", "Follow-Up", "Treatment Planning"]);

    let html = cube.dropdowns_html().render();
    assert!(html.contains(r#"id="care-phase-select""#));
    assert!(html.contains(r#"<option value="">Select a care phase...</option>"#));
    assert!(html.contains(r#"<option value="treatment-planning" selected="selected">"#));
}

#[test]
fn given_missing_dimension_file_when_populating_then_others_still_load() {
    // Arrange: the condition dimension points at a missing file
    let mut vocabulary = CubeVocabulary::bundled().unwrap();
    vocabulary.dimensions[0].file = "does_not_exist".to_string();
    let mut cube = CubeExplorer::new(vocabulary).unwrap();

    // Act
    let loaded = cube.populate(&loader("clinical-skill-mix"), true);

    // Assert
    assert_eq!(loaded, 7);
    let failed = cube.slot("condition").unwrap();
    assert!(failed.options.is_empty());
    assert!(failed.load_error.is_some());
    assert!(!cube.scenario().is_complete());
}

#[test]
fn given_scripted_selector_when_choosing_interactively_then_selections_applied() {
    let mut cube = populated(true);
    let selector = ScriptedSelector {
        picks: vec![("care phase", "follow-up"), ("care setting", "outpatient-clinic")],
    };

    let chosen = cube.choose_interactively(&selector).unwrap();

    assert_eq!(chosen, 2);
    let text = cube.scenario().to_text();
    assert!(text.ends_with("during follow-up within the outpatient clinic."));
}

#[test]
fn given_failing_selector_when_choosing_then_operation_failed() {
    let mut cube = populated(false);

    let result = cube.choose_interactively(&FailingSelector);

    assert!(result.is_err());
}
