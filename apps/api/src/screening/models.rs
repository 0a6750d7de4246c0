//! Data contracts shared by the structurer, chunker, matcher and consolidator.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

// ────────────────────────────────────────────────────────────────────────────
// Requirement side
// ────────────────────────────────────────────────────────────────────────────

/// The fixed dimensions a job description is decomposed into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementCategory {
    Experience,
    HardSkills,
    SoftSkills,
    Tools,
    Education,
    Certifications,
    ProjectTypes,
    Industry,
}

impl RequirementCategory {
    pub const ALL: [RequirementCategory; 8] = [
        RequirementCategory::Experience,
        RequirementCategory::HardSkills,
        RequirementCategory::SoftSkills,
        RequirementCategory::Tools,
        RequirementCategory::Education,
        RequirementCategory::Certifications,
        RequirementCategory::ProjectTypes,
        RequirementCategory::Industry,
    ];

    /// Wire name, as used in generated JSON and API payloads.
    pub fn as_str(self) -> &'static str {
        match self {
            RequirementCategory::Experience => "experience",
            RequirementCategory::HardSkills => "hard_skills",
            RequirementCategory::SoftSkills => "soft_skills",
            RequirementCategory::Tools => "tools",
            RequirementCategory::Education => "education",
            RequirementCategory::Certifications => "certifications",
            RequirementCategory::ProjectTypes => "project_types",
            RequirementCategory::Industry => "industry",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == key)
    }

    /// Human wording used when synthesizing match queries ("hard skills").
    pub fn words(self) -> String {
        self.as_str().replace('_', " ")
    }

    /// List categories hold a sequence of strings; the rest hold free text.
    pub fn is_list(self) -> bool {
        !matches!(
            self,
            RequirementCategory::Experience
                | RequirementCategory::Education
                | RequirementCategory::Industry
        )
    }

    pub fn empty_value(self) -> RequirementValue {
        if self.is_list() {
            RequirementValue::List(Vec::new())
        } else {
            RequirementValue::Text(String::new())
        }
    }
}

impl fmt::Display for RequirementCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single requirement: free text or an ordered list of strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequirementValue {
    Text(String),
    List(Vec<String>),
}

impl RequirementValue {
    pub fn is_empty(&self) -> bool {
        match self {
            RequirementValue::Text(text) => text.trim().is_empty(),
            RequirementValue::List(items) => items.iter().all(|i| i.trim().is_empty()),
        }
    }

    /// Text form used in match queries and prompts: lists are comma-joined.
    pub fn render(&self) -> String {
        match self {
            RequirementValue::Text(text) => text.trim().to_string(),
            RequirementValue::List(items) => items
                .iter()
                .map(|i| i.trim())
                .filter(|i| !i.is_empty())
                .collect::<Vec<_>>()
                .join(", "),
        }
    }

    /// Coerces loosely-shaped generated JSON into the value kind `category` expects.
    /// Returns `None` when the JSON cannot be read as that kind.
    fn coerce(category: RequirementCategory, raw: &Value) -> Option<Self> {
        if category.is_list() {
            match raw {
                Value::Array(items) => Some(RequirementValue::List(
                    items.iter().filter_map(scalar_to_string).collect(),
                )),
                Value::Null => None,
                other => scalar_to_string(other).map(|s| RequirementValue::List(vec![s])),
            }
        } else {
            match raw {
                Value::Array(items) => Some(RequirementValue::Text(
                    items
                        .iter()
                        .filter_map(scalar_to_string)
                        .collect::<Vec<_>>()
                        .join(", "),
                )),
                other => scalar_to_string(other).map(RequirementValue::Text),
            }
        }
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Structured requirements for one job description.
///
/// Every `RequirementCategory` is always present; missing or malformed input
/// is replaced by the category's empty value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<RequirementCategory, Option<RequirementValue>>")]
pub struct RequirementSet {
    #[serde(flatten)]
    values: BTreeMap<RequirementCategory, RequirementValue>,
}

impl RequirementSet {
    pub fn empty() -> Self {
        Self::from(BTreeMap::<RequirementCategory, RequirementValue>::new())
    }

    /// Builds a set from generated JSON. Non-object input yields the empty set;
    /// unknown keys are dropped.
    pub fn from_generated(raw: &Value) -> Self {
        let Some(object) = raw.as_object() else {
            debug!("Generated requirements are not a JSON object; using empty set");
            return Self::empty();
        };

        let mut values = BTreeMap::new();
        for (key, raw_value) in object {
            let Some(category) = RequirementCategory::from_key(key) else {
                debug!("Dropping unknown requirement category '{key}'");
                continue;
            };
            match RequirementValue::coerce(category, raw_value) {
                Some(value) => {
                    values.insert(category, value);
                }
                None => debug!("Malformed value for requirement category '{category}'"),
            }
        }
        Self::from(values)
    }

    pub fn get(&self, category: RequirementCategory) -> &RequirementValue {
        // The constructor fills every category, so the lookup always succeeds.
        &self.values[&category]
    }

    pub fn iter(&self) -> impl Iterator<Item = (RequirementCategory, &RequirementValue)> {
        self.values.iter().map(|(c, v)| (*c, v))
    }

    /// Categories whose value is non-empty, i.e. the ones the job actually asks for.
    pub fn specified(&self) -> impl Iterator<Item = RequirementCategory> + '_ {
        self.iter().filter(|(_, v)| !v.is_empty()).map(|(c, _)| c)
    }

    pub fn is_blank(&self) -> bool {
        self.specified().next().is_none()
    }
}

impl Default for RequirementSet {
    fn default() -> Self {
        Self::empty()
    }
}

/// Caller-supplied sets may carry `null` for a category; it reads as the empty value.
impl From<BTreeMap<RequirementCategory, Option<RequirementValue>>> for RequirementSet {
    fn from(values: BTreeMap<RequirementCategory, Option<RequirementValue>>) -> Self {
        values
            .into_iter()
            .filter_map(|(category, value)| value.map(|v| (category, v)))
            .collect::<BTreeMap<_, _>>()
            .into()
    }
}

impl From<BTreeMap<RequirementCategory, RequirementValue>> for RequirementSet {
    fn from(mut values: BTreeMap<RequirementCategory, RequirementValue>) -> Self {
        for category in RequirementCategory::ALL {
            let kind_matches = match values.get(&category) {
                Some(RequirementValue::List(_)) => category.is_list(),
                Some(RequirementValue::Text(_)) => !category.is_list(),
                None => false,
            };
            if !kind_matches {
                let fixed = match values.remove(&category) {
                    Some(RequirementValue::Text(text)) if !text.trim().is_empty() => {
                        RequirementValue::List(vec![text])
                    }
                    Some(RequirementValue::List(items)) => RequirementValue::Text(items.join(", ")),
                    _ => category.empty_value(),
                };
                values.insert(category, fixed);
            }
        }
        Self { values }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Resume side
// ────────────────────────────────────────────────────────────────────────────

/// Resume sections the chunker segments text into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResumeSection {
    Summary,
    WorkExperience,
    Projects,
    Skills,
    Education,
    Certifications,
}

impl ResumeSection {
    pub const ALL: [ResumeSection; 6] = [
        ResumeSection::Summary,
        ResumeSection::WorkExperience,
        ResumeSection::Projects,
        ResumeSection::Skills,
        ResumeSection::Education,
        ResumeSection::Certifications,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ResumeSection::Summary => "summary",
            ResumeSection::WorkExperience => "work_experience",
            ResumeSection::Projects => "projects",
            ResumeSection::Skills => "skills",
            ResumeSection::Education => "education",
            ResumeSection::Certifications => "certifications",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == key)
    }
}

impl fmt::Display for ResumeSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One categorized, embedded fragment of a resume.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumeChunk {
    /// `<resume_id>_<section>_<n>`, unique within the resume.
    pub id: String,
    pub category: ResumeSection,
    pub text: String,
    #[serde(skip_serializing, default)]
    pub embedding: Vec<f32>,
}

// ────────────────────────────────────────────────────────────────────────────
// Scores
// ────────────────────────────────────────────────────────────────────────────

/// A resume chunk supporting a category score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkMatch {
    pub chunk_id: String,
    pub category: ResumeSection,
    pub similarity: f64,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub category: RequirementCategory,
    /// Mean similarity of the top matches, in [0, 1], rounded to 4 places.
    pub score: f64,
    /// Ordered by similarity, descending.
    pub matches: Vec<ChunkMatch>,
}

impl CategoryScore {
    pub fn zero(category: RequirementCategory) -> Self {
        Self {
            category,
            score: 0.0,
            matches: Vec::new(),
        }
    }
}

pub type CategoryScores = BTreeMap<RequirementCategory, CategoryScore>;

/// Terminal artifact of one scoring run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsolidatedResult {
    pub resume_id: String,
    pub candidate_name: String,
    pub consolidated_score: f64,
    pub category_scores: CategoryScores,
    pub scored_at: DateTime<Utc>,
}

/// A consolidated result plus its one-sentence justification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreeningReport {
    #[serde(flatten)]
    pub result: ConsolidatedResult,
    pub summary: String,
}

/// Rounds to 4 decimal places, the precision every published score uses.
pub fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_set_has_every_category() {
        let set = RequirementSet::empty();
        for category in RequirementCategory::ALL {
            assert!(set.get(category).is_empty());
            assert_eq!(
                matches!(set.get(category), RequirementValue::List(_)),
                category.is_list()
            );
        }
        assert!(set.is_blank());
    }

    #[test]
    fn test_from_generated_fills_missing_and_drops_unknown() {
        let raw = json!({
            "hard_skills": ["Python", " AWS "],
            "experience": "5+ years backend",
            "hard_skilz": ["typo"],
        });
        let set = RequirementSet::from_generated(&raw);
        assert_eq!(
            set.get(RequirementCategory::HardSkills),
            &RequirementValue::List(vec!["Python".to_string(), "AWS".to_string()])
        );
        assert_eq!(
            set.get(RequirementCategory::Experience).render(),
            "5+ years backend"
        );
        assert!(set.get(RequirementCategory::Tools).is_empty());
        assert_eq!(set.iter().count(), RequirementCategory::ALL.len());
    }

    #[test]
    fn test_from_generated_coerces_shapes() {
        let raw = json!({
            "tools": "Docker",
            "education": ["BSc Computer Science", "MSc preferred"],
            "certifications": {"nested": true},
            "industry": null,
        });
        let set = RequirementSet::from_generated(&raw);
        assert_eq!(
            set.get(RequirementCategory::Tools),
            &RequirementValue::List(vec!["Docker".to_string()])
        );
        assert_eq!(
            set.get(RequirementCategory::Education),
            &RequirementValue::Text("BSc Computer Science, MSc preferred".to_string())
        );
        assert!(set.get(RequirementCategory::Certifications).is_empty());
        assert!(set.get(RequirementCategory::Industry).is_empty());
    }

    #[test]
    fn test_from_generated_non_object_is_empty() {
        assert_eq!(
            RequirementSet::from_generated(&json!(["python"])),
            RequirementSet::empty()
        );
    }

    #[test]
    fn test_caller_supplied_set_deserializes_with_defaults() {
        let set: RequirementSet =
            serde_json::from_value(json!({"hard_skills": ["rust"], "industry": "fintech"}))
                .unwrap();
        assert_eq!(set.get(RequirementCategory::HardSkills).render(), "rust");
        assert_eq!(set.get(RequirementCategory::Industry).render(), "fintech");
        assert_eq!(
            set.specified().collect::<Vec<_>>(),
            vec![RequirementCategory::HardSkills, RequirementCategory::Industry]
        );
    }

    #[test]
    fn test_caller_supplied_null_reads_as_empty() {
        let set: RequirementSet = serde_json::from_value(json!({
            "hard_skills": ["rust"],
            "industry": null,
            "tools": null
        }))
        .unwrap();
        assert_eq!(
            set.get(RequirementCategory::Industry),
            &RequirementValue::Text(String::new())
        );
        assert_eq!(
            set.get(RequirementCategory::Tools),
            &RequirementValue::List(vec![])
        );
        assert_eq!(
            set.specified().collect::<Vec<_>>(),
            vec![RequirementCategory::HardSkills]
        );
    }

    #[test]
    fn test_unknown_caller_category_is_rejected() {
        let result: Result<RequirementSet, _> =
            serde_json::from_value(json!({"languages": ["en"]}));
        assert!(result.is_err());
    }

    #[test]
    fn test_requirement_set_serializes_as_flat_map() {
        let value = serde_json::to_value(RequirementSet::empty()).unwrap();
        assert_eq!(value["hard_skills"], json!([]));
        assert_eq!(value["experience"], json!(""));
    }

    #[test]
    fn test_list_with_only_blanks_is_empty() {
        let value = RequirementValue::List(vec![" ".to_string(), String::new()]);
        assert!(value.is_empty());
        assert_eq!(value.render(), "");
    }

    #[test]
    fn test_category_words() {
        assert_eq!(RequirementCategory::HardSkills.words(), "hard skills");
        assert_eq!(
            RequirementCategory::from_key("project_types"),
            Some(RequirementCategory::ProjectTypes)
        );
        assert_eq!(ResumeSection::from_key("skills"), Some(ResumeSection::Skills));
        assert_eq!(ResumeSection::from_key("hobbies"), None);
    }

    #[test]
    fn test_round4() {
        assert_eq!(round4(0.123456), 0.1235);
        assert_eq!(round4(0.62), 0.62);
    }
}
