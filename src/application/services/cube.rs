//! Cube explorer: one selection per cube dimension, one competency sentence.
//!
//! The vocabulary (dimension list, sentence template, role and verb tables)
//! ships as `assets/cube.toml` and can be extended from the `[cube]` config
//! section.

use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::str::FromStr;
use std::sync::Arc;

use itertools::Itertools;
use rayon::prelude::*;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::application::services::{DimensionLoader, LoadedDimension};
use crate::application::{ApplicationError, ApplicationResult};
use crate::config::CubeConfig;
use crate::domain::{DimensionItem, DomainError};
use crate::infrastructure::traits::{SelectionItem, Selector};
use crate::render::html::Element;

const BUNDLED_VOCABULARY: &str = include_str!("../../../assets/cube.toml");

/// The two halves of the cube.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Framework {
    #[serde(rename = "5C")]
    ClinicalCompetency,
    #[serde(rename = "3A")]
    CognitiveEngagement,
}

impl Framework {
    pub const ALL: [Framework; 2] = [Framework::ClinicalCompetency, Framework::CognitiveEngagement];

    pub fn code(self) -> &'static str {
        match self {
            Framework::ClinicalCompetency => "5C",
            Framework::CognitiveEngagement => "3A",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Framework::ClinicalCompetency => "Clinical Competency Space (5C)",
            Framework::CognitiveEngagement => "AI Cognitive Engagement (3A)",
        }
    }
}

impl fmt::Display for Framework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// One dropdown of the cube.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CubeDimension {
    /// Selection key, e.g. `care_phase`
    pub key: String,
    /// Dimension file name without extension
    pub file: String,
    /// Lowercase label used in prompts
    pub label: String,
    pub framework: Framework,
    /// Item id pre-selected after populating
    #[serde(default)]
    pub default: Option<String>,
}

impl CubeDimension {
    /// DOM id of the dropdown: `care_phase` → `care-phase-select`.
    pub fn select_id(&self) -> String {
        format!("{}-select", self.key.replace('_', "-"))
    }
}

/// Domain content behind the sentence builder.
#[derive(Debug, Clone, Deserialize)]
pub struct CubeVocabulary {
    /// Shown until every dimension has a selection
    pub prompt: String,
    pub template: String,
    /// Agent phrase for unknown agent-facing ids
    pub agent_context_default: String,
    pub dimensions: Vec<CubeDimension>,
    /// Agent-facing id → phrase with `{role}` / `{singular}` placeholders
    #[serde(default)]
    pub agent_contexts: BTreeMap<String, String>,
    /// Lowercased authority name → verb
    #[serde(default)]
    pub authority_verbs: BTreeMap<String, String>,
    /// Role name → plural person form
    #[serde(default)]
    pub person_forms: BTreeMap<String, String>,
}

impl CubeVocabulary {
    pub fn bundled() -> ApplicationResult<Self> {
        Self::from_toml(BUNDLED_VOCABULARY)
    }

    pub fn from_toml(text: &str) -> ApplicationResult<Self> {
        toml::from_str(text).map_err(|e| ApplicationError::Config {
            message: format!("cube vocabulary: {e}"),
        })
    }

    /// Merge the `[cube]` config section over this vocabulary.
    pub fn with_overrides(mut self, overrides: &CubeConfig) -> Self {
        self.person_forms = CubeConfig::merge_map(&self.person_forms, &overrides.person_forms);
        for dimension in &mut self.dimensions {
            if let Some(id) = overrides.defaults.get(&dimension.key) {
                dimension.default = Some(id.clone());
            }
        }
        self
    }

    pub fn dimension(&self, key: &str) -> Option<&CubeDimension> {
        self.dimensions.iter().find(|d| d.key == key)
    }

    /// "Cardiology" → "cardiologists"; unknown names are lowercased.
    pub fn person_form(&self, role_name: &str) -> String {
        self.person_forms
            .get(role_name)
            .cloned()
            .unwrap_or_else(|| role_name.to_lowercase())
    }

    /// "Augmentation" → "augment"; unknown names are lowercased.
    pub fn authority_verb(&self, authority_name: &str) -> String {
        let lower = authority_name.to_lowercase();
        self.authority_verbs.get(&lower).cloned().unwrap_or(lower)
    }

    /// Possessive agent phrase for `facing_id` around the plural role.
    pub fn agent_phrase(&self, facing_id: &str, role_plural: &str) -> String {
        let singular = role_plural.strip_suffix('s').unwrap_or(role_plural);
        self.agent_contexts
            .get(facing_id)
            .unwrap_or(&self.agent_context_default)
            .replace("{role}", role_plural)
            .replace("{singular}", singular)
    }
}

/// Placeholders the sentence template may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Authority,
    Agent,
    Layer,
    Task,
    Condition,
    Phase,
    Setting,
}

impl Slot {
    pub fn css_class(self) -> &'static str {
        match self {
            Slot::Authority => "dim-authority",
            Slot::Agent => "dim-agent",
            Slot::Layer => "dim-layer",
            Slot::Task => "dim-task",
            Slot::Condition => "dim-condition",
            Slot::Phase => "dim-phase",
            Slot::Setting => "dim-setting",
        }
    }

    /// Page color variable of the dimension the value comes from.
    fn color_var(self) -> &'static str {
        match self {
            Slot::Authority => "--color-assigned-authority",
            Slot::Agent => "--color-care-provider-role",
            Slot::Layer => "--color-anchoring-layer",
            Slot::Task => "--color-care-task",
            Slot::Condition => "--color-condition",
            Slot::Phase => "--color-care-phase",
            Slot::Setting => "--color-care-setting",
        }
    }
}

impl FromStr for Slot {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "authority" => Ok(Slot::Authority),
            "agent" => Ok(Slot::Agent),
            "layer" => Ok(Slot::Layer),
            "task" => Ok(Slot::Task),
            "condition" => Ok(Slot::Condition),
            "phase" => Ok(Slot::Phase),
            "setting" => Ok(Slot::Setting),
            other => Err(DomainError::UnknownPlaceholder(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum TemplatePart {
    Text(String),
    Slot(Slot),
}

/// Parsed sentence template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentenceTemplate {
    parts: Vec<TemplatePart>,
}

impl SentenceTemplate {
    pub fn parse(text: &str) -> ApplicationResult<Self> {
        let re = Regex::new(r"\{(\w+)\}").map_err(|e| ApplicationError::OperationFailed {
            context: "compile template regex".to_string(),
            source: Box::new(e),
        })?;

        let mut parts = Vec::new();
        let mut last = 0;
        for m in re.find_iter(text) {
            if m.start() > last {
                parts.push(TemplatePart::Text(text[last..m.start()].to_string()));
            }
            let name = &text[m.start() + 1..m.end() - 1];
            parts.push(TemplatePart::Slot(name.parse()?));
            last = m.end();
        }
        if last < text.len() {
            parts.push(TemplatePart::Text(text[last..].to_string()));
        }
        Ok(Self { parts })
    }

    pub fn slots(&self) -> impl Iterator<Item = Slot> + '_ {
        self.parts.iter().filter_map(|p| match p {
            TemplatePart::Slot(slot) => Some(*slot),
            TemplatePart::Text(_) => None,
        })
    }

    fn fill(&self, value: impl Fn(Slot) -> String) -> Vec<SentencePart> {
        self.parts
            .iter()
            .map(|p| match p {
                TemplatePart::Text(text) => SentencePart::Text(text.clone()),
                TemplatePart::Slot(slot) => SentencePart::Value {
                    slot: *slot,
                    text: value(*slot),
                },
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SentencePart {
    Text(String),
    Value { slot: Slot, text: String },
}

/// What the scenario box shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scenario {
    /// Some dimension has no selection; never a partial sentence
    Incomplete { prompt: String, missing: Vec<String> },
    Complete { parts: Vec<SentencePart> },
}

impl Scenario {
    pub fn is_complete(&self) -> bool {
        matches!(self, Scenario::Complete { .. })
    }

    pub fn to_text(&self) -> String {
        match self {
            Scenario::Incomplete { prompt, .. } => prompt.clone(),
            Scenario::Complete { parts } => parts
                .iter()
                .map(|p| match p {
                    SentencePart::Text(text) => text.as_str(),
                    SentencePart::Value { text, .. } => text.as_str(),
                })
                .collect(),
        }
    }

    /// The `#combined-scenario` box.
    pub fn to_html(&self) -> Element {
        let container = Element::new("div")
            .attr("id", "combined-scenario")
            .class("scenario-text");
        match self {
            Scenario::Incomplete { prompt, .. } => container.text(prompt),
            Scenario::Complete { parts } => {
                let mut statement = Element::new("p").class("ai-competency-statement");
                for part in parts {
                    statement = match part {
                        SentencePart::Text(text) => statement.text(text),
                        SentencePart::Value { slot, text } => statement.child(
                            Element::text_el("span", slot.css_class(), text).attr(
                                "style",
                                format!("color: var({}); font-weight: 700;", slot.color_var()),
                            ),
                        ),
                    };
                }
                container
                    .class("populated")
                    .child(Element::div("unified-specification").child(statement))
            }
        }
    }
}

/// One dropdown: its options and current selection.
#[derive(Debug, Clone)]
pub struct CubeSlot {
    pub dimension: CubeDimension,
    /// Sorted by name
    pub options: Vec<DimensionItem>,
    pub selected: Option<DimensionItem>,
    /// Why the options are empty, when the load failed
    pub load_error: Option<String>,
}

impl CubeSlot {
    fn new(dimension: CubeDimension) -> Self {
        Self {
            dimension,
            options: Vec::new(),
            selected: None,
            load_error: None,
        }
    }

    pub fn option(&self, id: &str) -> Option<&DimensionItem> {
        self.options.iter().find(|item| item.id == id)
    }

    fn fill_options(&mut self, loaded: &LoadedDimension) {
        self.options = loaded
            .items()
            .iter()
            .cloned()
            .sorted_by(DimensionItem::cmp_by_name)
            .collect();
        self.load_error = None;
        if let Some(selected) = &self.selected {
            if self.option(&selected.id).is_none() {
                self.selected = None;
            }
        }
    }

    /// `<select>` with a placeholder option and one option per item.
    pub fn to_html(&self) -> Element {
        let selected_id = self.selected.as_ref().map(|s| s.id.as_str());
        let placeholder = Element::new("option")
            .attr("value", "")
            .text(format!("Select a {}...", self.dimension.label));
        Element::new("select")
            .attr("id", self.dimension.select_id())
            .class("cube-select")
            .child(placeholder)
            .children(self.options.iter().map(|item| {
                let option = Element::new("option").attr("value", item.id.as_str());
                let option = if selected_id == Some(item.id.as_str()) {
                    option.attr("selected", "selected")
                } else {
                    option
                };
                option.text(&item.name)
            }))
    }
}

/// Dropdown state plus the sentence it produces.
#[derive(Debug, Clone)]
pub struct CubeExplorer {
    vocabulary: CubeVocabulary,
    template: SentenceTemplate,
    slots: Vec<CubeSlot>,
}

impl CubeExplorer {
    pub fn new(vocabulary: CubeVocabulary) -> ApplicationResult<Self> {
        let template = SentenceTemplate::parse(&vocabulary.template)?;
        let slots = vocabulary
            .dimensions
            .iter()
            .cloned()
            .map(CubeSlot::new)
            .collect();
        Ok(Self {
            vocabulary,
            template,
            slots,
        })
    }

    pub fn vocabulary(&self) -> &CubeVocabulary {
        &self.vocabulary
    }

    pub fn slots(&self) -> &[CubeSlot] {
        &self.slots
    }

    pub fn slot(&self, key: &str) -> Option<&CubeSlot> {
        self.slots.iter().find(|s| s.dimension.key == key)
    }

    fn slot_mut(&mut self, key: &str) -> Result<&mut CubeSlot, DomainError> {
        self.slots
            .iter_mut()
            .find(|s| s.dimension.key == key)
            .ok_or_else(|| DomainError::UnknownCubeDimension(key.to_string()))
    }

    /// Load every dimension file in parallel and fill the dropdowns.
    ///
    /// A dimension that fails to load keeps an empty dropdown; the others
    /// are unaffected. Returns the number of dimensions loaded.
    #[instrument(level = "debug", skip(self, loader))]
    pub fn populate(&mut self, loader: &DimensionLoader, apply_defaults: bool) -> usize {
        let files: Vec<String> = self
            .slots
            .iter()
            .map(|s| s.dimension.file.clone())
            .collect();

        let results: Vec<ApplicationResult<Arc<LoadedDimension>>> =
            files.par_iter().map(|file| loader.load(file)).collect();

        let mut loaded_count = 0;
        for (slot, result) in self.slots.iter_mut().zip(results) {
            match result {
                Ok(loaded) => {
                    slot.fill_options(&loaded);
                    loaded_count += 1;
                }
                Err(e) => {
                    warn!(dimension = %slot.dimension.key, error = %e, "cube dimension not loaded");
                    slot.options.clear();
                    slot.selected = None;
                    slot.load_error = Some(e.to_string());
                }
            }
        }
        info!("Cube explorer populated {}/{} dimensions", loaded_count, self.slots.len());

        if apply_defaults {
            self.apply_defaults();
        }
        loaded_count
    }

    /// Select each dimension's default item when it is among the options.
    pub fn apply_defaults(&mut self) {
        for slot in &mut self.slots {
            let Some(default) = slot.dimension.default.clone() else {
                continue;
            };
            match slot.option(&default).cloned() {
                Some(item) => {
                    debug!("apply_defaults: {}={}", slot.dimension.key, default);
                    slot.selected = Some(item);
                }
                None if slot.load_error.is_none() => {
                    warn!(
                        dimension = %slot.dimension.key,
                        default = %default,
                        "default item not among options"
                    );
                }
                None => {}
            }
        }
    }

    pub fn select(&mut self, key: &str, id: &str) -> Result<(), DomainError> {
        let slot = self.slot_mut(key)?;
        let item = slot
            .option(id)
            .cloned()
            .ok_or_else(|| DomainError::UnknownItem {
                dimension: key.to_string(),
                id: id.to_string(),
            })?;
        debug!("select: {}={}", key, id);
        slot.selected = Some(item);
        Ok(())
    }

    pub fn clear(&mut self, key: &str) -> Result<(), DomainError> {
        self.slot_mut(key)?.selected = None;
        Ok(())
    }

    pub fn selected(&self, key: &str) -> Option<&DimensionItem> {
        self.slot(key).and_then(|s| s.selected.as_ref())
    }

    /// Walk the dropdowns with `selector`; a cancelled pick keeps the current selection.
    ///
    /// Returns the number of selections made.
    pub fn choose_interactively(&mut self, selector: &dyn Selector) -> ApplicationResult<usize> {
        let mut chosen = 0;
        for slot in &mut self.slots {
            if slot.options.is_empty() {
                continue;
            }
            let items: Vec<SelectionItem> = slot
                .options
                .iter()
                .map(|item| SelectionItem {
                    display: format!("{}  [{}]", item.name, item.id),
                    value: item.id.clone(),
                })
                .collect();
            let prompt = format!("{}> ", slot.dimension.label);

            let picked = selector.select_one(&items, &prompt).map_err(|e| {
                ApplicationError::OperationFailed {
                    context: format!("select {}", slot.dimension.label),
                    source: Box::new(io::Error::new(io::ErrorKind::Other, e)),
                }
            })?;

            if let Some(picked) = picked {
                slot.selected = slot.option(&picked.value).cloned();
                chosen += 1;
            }
        }
        Ok(chosen)
    }

    /// The sentence, or the prompt while any dimension lacks a selection.
    pub fn scenario(&self) -> Scenario {
        let missing: Vec<String> = self
            .slots
            .iter()
            .filter(|s| s.selected.is_none())
            .map(|s| s.dimension.label.clone())
            .collect();
        if !missing.is_empty() {
            return Scenario::Incomplete {
                prompt: self.vocabulary.prompt.clone(),
                missing,
            };
        }

        let name = |key: &str| {
            self.selected(key)
                .map(|item| item.name.clone())
                .unwrap_or_default()
        };
        let parts = self.template.fill(|slot| match slot {
            Slot::Authority => self.vocabulary.authority_verb(&name("assigned_authority")),
            Slot::Agent => {
                let role = self.vocabulary.person_form(&name("care_provider_role"));
                let facing = self
                    .selected("agent_facing")
                    .map(|item| item.id.as_str())
                    .unwrap_or_default();
                self.vocabulary.agent_phrase(facing, &role)
            }
            Slot::Layer => format!("{} layer", name("anchoring_layer").to_lowercase()),
            Slot::Task => name("care_task").to_lowercase(),
            Slot::Condition => name("condition").to_lowercase(),
            Slot::Phase => name("care_phase").to_lowercase(),
            Slot::Setting => name("care_setting").to_lowercase(),
        });
        Scenario::Complete { parts }
    }

    /// All dropdowns grouped by framework.
    pub fn dropdowns_html(&self) -> Element {
        Element::div("cube-explorer").children(Framework::ALL.iter().map(|framework| {
            Element::div("cube-framework")
                .attr("data-framework", framework.code())
                .child(Element::text_el("h3", "", framework.title()))
                .children(
                    self.slots
                        .iter()
                        .filter(|s| s.dimension.framework == *framework)
                        .map(|slot| {
                            Element::div("cube-dimension")
                                .child(
                                    Element::text_el("label", "", &slot.dimension.label)
                                        .attr("for", slot.dimension.select_id()),
                                )
                                .child(slot.to_html())
                        }),
                )
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::testing::named;
    use rstest::rstest;

    fn explorer_with_options() -> CubeExplorer {
        let mut explorer = CubeExplorer::new(CubeVocabulary::bundled().unwrap()).unwrap();
        let options: &[(&str, &str, &str)] = &[
            ("condition", "chapter-i/i25", "Chronic Ischaemic Heart Disease"),
            ("care_phase", "treatment-planning", "Treatment Planning"),
            ("care_setting", "emergency-room", "Emergency Room"),
            ("care_task", "patient-care/patient-counseling", "Patient Counseling"),
            ("care_provider_role", "specialist-medical-practitioners/cardiology", "Cardiology"),
            ("agent_facing", "provider_facing", "Provider Facing"),
            ("agent_facing", "encounter_facing", "Encounter Facing"),
            ("agent_facing", "patient_facing", "Patient Facing"),
            ("anchoring_layer", "input", "Input"),
            ("assigned_authority", "augmentation", "Augmentation"),
        ];
        for (key, id, name) in options {
            let slot = explorer.slot_mut(key).unwrap();
            slot.options.push(named(id, name, 0, None));
        }
        explorer
    }

    #[test]
    fn given_bundled_vocabulary_when_parsing_then_eight_dimensions() {
        let vocabulary = CubeVocabulary::bundled().unwrap();
        assert_eq!(vocabulary.dimensions.len(), 8);
        let count_5c = vocabulary
            .dimensions
            .iter()
            .filter(|d| d.framework == Framework::ClinicalCompetency)
            .count();
        assert_eq!(count_5c, 5);
        assert_eq!(
            vocabulary.dimension("care_phase").unwrap().select_id(),
            "care-phase-select"
        );
    }

    #[test]
    fn given_unknown_placeholder_when_parsing_template_then_error() {
        let err = SentenceTemplate::parse("to {authority} the {mood}").unwrap_err();
        assert!(matches!(
            err,
            ApplicationError::Domain(DomainError::UnknownPlaceholder(ref p)) if p == "mood"
        ));
    }

    #[test]
    fn given_template_when_parsing_then_slots_in_order() {
        let template = SentenceTemplate::parse("{task} in {condition}.").unwrap();
        assert_eq!(
            template.slots().collect::<Vec<_>>(),
            vec![Slot::Task, Slot::Condition]
        );
    }

    #[rstest]
    #[case("Cardiology", "cardiologists")]
    #[case("Paediatrician", "pediatricians")]
    #[case("Hospital Pharmacists", "hospital pharmacists")]
    fn given_role_name_when_converting_then_person_form(
        #[case] name: &str,
        #[case] expected: &str,
    ) {
        let vocabulary = CubeVocabulary::bundled().unwrap();
        assert_eq!(vocabulary.person_form(name), expected);
    }

    #[rstest]
    #[case("provider_facing", "cardiologists'")]
    #[case("encounter_facing", "cardiologist-patient encounter's")]
    #[case("patient_facing", "patient's in cardiologist-patient care")]
    #[case("robot_facing", "cardiologists'")]
    fn given_agent_facing_when_phrasing_then_context_matches(
        #[case] facing: &str,
        #[case] expected: &str,
    ) {
        let vocabulary = CubeVocabulary::bundled().unwrap();
        assert_eq!(vocabulary.agent_phrase(facing, "cardiologists"), expected);
    }

    #[test]
    fn given_two_selections_when_building_scenario_then_prompt_not_partial() {
        let mut explorer = explorer_with_options();
        explorer.select("condition", "chapter-i/i25").unwrap();
        explorer.select("care_phase", "treatment-planning").unwrap();

        let scenario = explorer.scenario();

        match &scenario {
            Scenario::Incomplete { prompt, missing } => {
                assert!(prompt.starts_with("Select dimensions"));
                assert_eq!(missing.len(), 6);
            }
            Scenario::Complete { .. } => panic!("expected prompt"),
        }
        assert!(!scenario.to_html().has_class("populated"));
    }

    #[test]
    fn given_defaults_when_building_scenario_then_full_sentence() {
        let mut explorer = explorer_with_options();

        explorer.apply_defaults();
        let scenario = explorer.scenario();

        assert_eq!(
            scenario.to_text(),
            "AI Competency to augment cardiologists' input layer for patient counseling in \
             chronic ischaemic heart disease during treatment planning within the emergency room."
        );
        let html = scenario.to_html().render();
        assert!(html.contains(r#"class="scenario-text populated""#));
        assert!(html.contains(r#"<span class="dim-authority""#));
    }

    #[test]
    fn given_unknown_key_or_item_when_selecting_then_domain_error() {
        let mut explorer = explorer_with_options();

        assert_eq!(
            explorer.select("mood", "x"),
            Err(DomainError::UnknownCubeDimension("mood".into()))
        );
        assert!(matches!(
            explorer.select("care_phase", "nope"),
            Err(DomainError::UnknownItem { .. })
        ));
    }

    #[test]
    fn given_config_overrides_when_merging_then_defaults_and_forms_applied() {
        let overrides = CubeConfig {
            person_forms: BTreeMap::from([("Geriatrics".to_string(), "geriatricians".to_string())]),
            defaults: BTreeMap::from([("care_phase".to_string(), "diagnosis".to_string())]),
        };

        let vocabulary = CubeVocabulary::bundled().unwrap().with_overrides(&overrides);

        assert_eq!(vocabulary.person_form("Geriatrics"), "geriatricians");
        assert_eq!(vocabulary.person_form("Cardiology"), "cardiologists");
        assert_eq!(
            vocabulary.dimension("care_phase").unwrap().default.as_deref(),
            Some("diagnosis")
        );
    }
}
