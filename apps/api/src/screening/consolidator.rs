//! Score Consolidator: folds per-category scores into one weighted scalar.

use serde::{Deserialize, Serialize};

use crate::screening::models::{round4, CategoryScore, CategoryScores, RequirementCategory};

/// Weight of each requirement category in the consolidated score.
/// Categories not listed here (soft skills, tools, industry) carry zero weight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryWeights {
    pub experience: f64,
    pub hard_skills: f64,
    pub project_types: f64,
    pub education: f64,
    pub certifications: f64,
}

impl Default for CategoryWeights {
    fn default() -> Self {
        Self {
            experience: 0.4,
            hard_skills: 0.3,
            project_types: 0.2,
            education: 0.05,
            certifications: 0.05,
        }
    }
}

impl CategoryWeights {
    pub fn weight(&self, category: RequirementCategory) -> f64 {
        match category {
            RequirementCategory::Experience => self.experience,
            RequirementCategory::HardSkills => self.hard_skills,
            RequirementCategory::ProjectTypes => self.project_types,
            RequirementCategory::Education => self.education,
            RequirementCategory::Certifications => self.certifications,
            RequirementCategory::SoftSkills
            | RequirementCategory::Tools
            | RequirementCategory::Industry => 0.0,
        }
    }
}

/// Consolidates with the default weight table.
pub fn consolidate(scores: &CategoryScores) -> f64 {
    consolidate_with(scores.values(), &CategoryWeights::default())
}

/// Σ(score × weight) / Σ(weight) over the weighted categories present in `scores`.
///
/// Dividing by the weight actually present means an absent category leaves the result
/// untouched, while a present category scoring zero pulls it down.
/// Each score is weighted by its own `category`, so any iteration order gives the same result.
pub fn consolidate_with<'a>(
    scores: impl IntoIterator<Item = &'a CategoryScore>,
    weights: &CategoryWeights,
) -> f64 {
    let mut weighted_sum = 0.0_f64;
    let mut total_weight = 0.0_f64;

    for category_score in scores {
        let weight = weights.weight(category_score.category);
        if weight <= 0.0 {
            continue;
        }
        weighted_sum += category_score.score * weight;
        total_weight += weight;
    }

    if total_weight > 0.0 {
        round4((weighted_sum / total_weight).clamp(0.0, 1.0))
    } else {
        0.0
    }
}
