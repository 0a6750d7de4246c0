//! Screening pipeline: orchestrates one scoring run per resume.
//!
//! Flow: structure JD (unless supplied) → chunk resume → upsert chunks →
//!       match categories → consolidate → candidate name → narrative summary.
//!
//! A batch structures the job description once and scores every resume concurrently;
//! each run owns its chunk set and writes only to its own index namespace.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::embedding_client::Embedder;
use crate::errors::AppError;
use crate::llm_client::TextGenerator;
use crate::screening::consolidator::consolidate;
use crate::screening::models::{CategoryScores, ConsolidatedResult, RequirementSet, ScreeningReport};
use crate::screening::{chunker, matcher, requirements, summarizer};
use crate::vector_index::{VectorIndex, VectorRecord};

/// One resume to score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumeInput {
    pub resume_id: String,
    pub resume_text: String,
}

/// Everything needed to score one resume against one job description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreeningRequest {
    pub resume_id: String,
    pub resume_text: String,
    pub jd_text: String,
    /// Pre-structured requirements; when present the job description is not re-structured.
    #[serde(default)]
    pub requirements: Option<RequirementSet>,
}

/// The three injected capabilities. Cheap to clone and share across tasks.
#[derive(Clone)]
pub struct ScreeningPipeline {
    generator: Arc<dyn TextGenerator>,
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
}

impl ScreeningPipeline {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
    ) -> Self {
        Self {
            generator,
            embedder,
            index,
        }
    }

    pub async fn structure_requirements(&self, jd_text: &str) -> Result<RequirementSet, AppError> {
        if jd_text.trim().is_empty() {
            return Err(AppError::Validation("jd_text cannot be empty".to_string()));
        }
        Ok(requirements::structure(jd_text, self.generator.as_ref()).await)
    }

    /// Scores one resume.
    ///
    /// Fails with `Precondition` when the resume yields no chunks, and with `Embedding`
    /// when the embedding capability fails at any point.
    pub async fn score_resume(&self, request: ScreeningRequest) -> Result<ScreeningReport, AppError> {
        let requirements = match request.requirements {
            Some(requirements) => requirements,
            None => self.structure_requirements(&request.jd_text).await?,
        };
        let resume = ResumeInput {
            resume_id: request.resume_id,
            resume_text: request.resume_text,
        };
        self.score_against(&requirements, resume).await
    }

    /// Scores every resume against one job description, best match first.
    pub async fn score_batch(
        &self,
        jd_text: &str,
        requirements: Option<RequirementSet>,
        resumes: Vec<ResumeInput>,
    ) -> Result<Vec<ScreeningReport>, AppError> {
        if resumes.is_empty() {
            return Err(AppError::Validation("at least one resume is required".to_string()));
        }
        reject_duplicate_ids(&resumes)?;

        let requirements = match requirements {
            Some(requirements) => requirements,
            None => self.structure_requirements(jd_text).await?,
        };

        info!("Scoring batch of {} resumes", resumes.len());
        let requirements = &requirements;
        let mut reports = try_join_all(
            resumes
                .into_iter()
                .map(|resume| self.score_against(requirements, resume)),
        )
        .await?;

        rank(&mut reports);
        Ok(reports)
    }

    async fn score_against(
        &self,
        requirements: &RequirementSet,
        resume: ResumeInput,
    ) -> Result<ScreeningReport, AppError> {
        let ResumeInput {
            resume_id,
            resume_text,
        } = resume;

        if resume_id.trim().is_empty() {
            return Err(AppError::Validation("resume_id cannot be empty".to_string()));
        }
        if resume_text.trim().is_empty() {
            return Err(AppError::Validation(format!(
                "resume {resume_id} has no text"
            )));
        }

        let chunks = chunker::chunk(
            &resume_id,
            &resume_text,
            self.generator.as_ref(),
            self.embedder.as_ref(),
        )
        .await?;

        if chunks.is_empty() {
            return Err(AppError::Precondition(format!(
                "resume {resume_id} produced no chunks; it cannot be scored"
            )));
        }

        let records = chunks
            .iter()
            .map(|chunk| VectorRecord::from_chunk(&resume_id, chunk))
            .collect();
        self.index.upsert(&resume_id, records).await?;

        let category_scores =
            matcher::match_categories(requirements, &chunks, self.embedder.as_ref()).await?;
        let consolidated_score = consolidate(&specified_scores(requirements, &category_scores));

        let candidate_name =
            summarizer::extract_candidate_name(&resume_text, self.generator.as_ref()).await;

        let result = ConsolidatedResult {
            resume_id,
            candidate_name,
            consolidated_score,
            category_scores,
            scored_at: Utc::now(),
        };
        let summary = summarizer::summarize(&result, requirements, self.generator.as_ref()).await;

        info!(
            "Scored resume {} ({}): {}",
            result.resume_id, result.candidate_name, result.consolidated_score
        );

        Ok(ScreeningReport { result, summary })
    }
}

/// Each resume owns one index namespace, so a batch may not name the same id twice.
fn reject_duplicate_ids(resumes: &[ResumeInput]) -> Result<(), AppError> {
    let mut seen = HashSet::new();
    for resume in resumes {
        if !seen.insert(resume.resume_id.as_str()) {
            return Err(AppError::Validation(format!(
                "resume id '{}' appears more than once in the batch",
                resume.resume_id
            )));
        }
    }
    Ok(())
}

/// Best consolidated score first; ties keep submission order.
fn rank(reports: &mut [ScreeningReport]) {
    reports.sort_by(|a, b| {
        b.result
            .consolidated_score
            .total_cmp(&a.result.consolidated_score)
    });
}

/// Restricts `scores` to the categories the job description asks for. Categories the
/// job leaves empty are absent from consolidation rather than counted as zero.
fn specified_scores(requirements: &RequirementSet, scores: &CategoryScores) -> CategoryScores {
    requirements
        .specified()
        .filter_map(|category| scores.get(&category).map(|s| (category, s.clone())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::screening::models::RequirementCategory;
    use crate::screening::test_support::{Reply, StubEmbedder, StubGenerator};
    use crate::vector_index::InMemoryVectorIndex;
    use serde_json::json;

    const HARD_SKILLS_QUERY: &str = "Required hard skills: python, aws";

    fn sections_reply() -> Reply {
        Reply::text(
            json!({
                "skills": ["python, docker"],
                "work_experience": ["led AWS migration"],
            })
            .to_string(),
        )
    }

    fn scenario_embedder() -> StubEmbedder {
        StubEmbedder::new()
            .with(HARD_SKILLS_QUERY, vec![1.0, 0.0])
            .with("python, docker", vec![0.8, 0.6])
            .with("led AWS migration", vec![0.6, 0.8])
    }

    fn pipeline_with(
        generator: StubGenerator,
        embedder: StubEmbedder,
    ) -> (ScreeningPipeline, Arc<StubEmbedder>, Arc<InMemoryVectorIndex>) {
        let embedder = Arc::new(embedder);
        let index = Arc::new(InMemoryVectorIndex::new());
        let pipeline = ScreeningPipeline::new(Arc::new(generator), embedder.clone(), index.clone());
        (pipeline, embedder, index)
    }

    fn request(resume_id: &str) -> ScreeningRequest {
        ScreeningRequest {
            resume_id: resume_id.to_string(),
            resume_text: "Ada Lovelace\nSkills: python, docker".to_string(),
            jd_text: "Backend engineer: python and aws".to_string(),
            requirements: None,
        }
    }

    #[tokio::test]
    async fn test_end_to_end_hard_skills_scenario() {
        let generator = StubGenerator::new()
            .with_requirements(Reply::text(r#"{"hard_skills": ["python", "aws"]}"#))
            .with_sections(sections_reply());
        let (pipeline, embedder, index) = pipeline_with(generator, scenario_embedder());

        let report = pipeline.score_resume(request("ada")).await.unwrap();

        let hard = &report.result.category_scores[&RequirementCategory::HardSkills];
        assert_eq!(hard.score, 0.7);
        assert_eq!(hard.matches.len(), 2);
        assert_eq!(report.result.consolidated_score, 0.7);
        assert_eq!(report.result.candidate_name, "Ada Lovelace");
        assert_eq!(report.summary, "Good Fit: strong hard skills.");
        assert_eq!(
            report.result.category_scores.len(),
            RequirementCategory::ALL.len()
        );
        // two chunks + one query
        assert_eq!(embedder.calls(), 3);
        assert_eq!(index.record_count("ada"), 2);
    }

    #[tokio::test]
    async fn test_supplied_requirements_skip_structuring() {
        let generator = StubGenerator::new()
            .with_requirements(Reply::Fail)
            .with_sections(sections_reply());
        let (pipeline, _, _) = pipeline_with(generator, scenario_embedder());

        let requirements: RequirementSet =
            serde_json::from_value(json!({"hard_skills": ["python", "aws"]})).unwrap();
        let mut req = request("ada");
        req.requirements = Some(requirements);

        let report = pipeline.score_resume(req).await.unwrap();
        assert_eq!(report.result.consolidated_score, 0.7);
    }

    #[tokio::test]
    async fn test_structuring_failure_scores_zero_without_aborting() {
        let generator = StubGenerator::new()
            .with_requirements(Reply::text("garbage"))
            .with_sections(sections_reply());
        let (pipeline, embedder, _) = pipeline_with(generator, scenario_embedder());

        let report = pipeline.score_resume(request("ada")).await.unwrap();
        assert_eq!(report.result.consolidated_score, 0.0);
        assert!(report
            .result
            .category_scores
            .values()
            .all(|s| s.score == 0.0));
        // chunk embeddings only; no query embeddings for empty categories
        assert_eq!(embedder.calls(), 2);
    }

    #[tokio::test]
    async fn test_no_chunks_is_a_precondition_failure() {
        let generator = StubGenerator::new()
            .with_requirements(Reply::text(r#"{"hard_skills": ["python"]}"#))
            .with_sections(Reply::text("not json"));
        let (pipeline, _, index) = pipeline_with(generator, scenario_embedder());

        let result = pipeline.score_resume(request("ada")).await;
        assert!(matches!(result, Err(AppError::Precondition(_))));
        assert_eq!(index.record_count("ada"), 0);
    }

    #[tokio::test]
    async fn test_embedding_failure_propagates() {
        let generator = StubGenerator::new()
            .with_requirements(Reply::text(r#"{"hard_skills": ["python"]}"#))
            .with_sections(sections_reply());
        let (pipeline, _, _) = pipeline_with(generator, StubEmbedder::failing());

        let result = pipeline.score_resume(request("ada")).await;
        assert!(matches!(result, Err(AppError::Embedding(_))));
    }

    #[tokio::test]
    async fn test_blank_inputs_are_rejected() {
        let (pipeline, _, _) = pipeline_with(StubGenerator::new(), StubEmbedder::new());

        let mut blank_resume = request("ada");
        blank_resume.resume_text = "   ".to_string();
        blank_resume.requirements = Some(RequirementSet::empty());
        assert!(matches!(
            pipeline.score_resume(blank_resume).await,
            Err(AppError::Validation(_))
        ));

        let mut blank_jd = request("ada");
        blank_jd.jd_text = String::new();
        assert!(matches!(
            pipeline.score_resume(blank_jd).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_batch_structures_once_and_sorts_descending() {
        let generator = StubGenerator::new()
            .with_requirements(Reply::text(r#"{"hard_skills": ["python", "aws"]}"#))
            .with_sections(sections_reply());
        let generator = Arc::new(generator);
        let embedder = Arc::new(scenario_embedder());
        let index = Arc::new(InMemoryVectorIndex::new());
        let pipeline = ScreeningPipeline::new(generator.clone(), embedder, index.clone());

        let resumes = vec![
            ResumeInput {
                resume_id: "first".to_string(),
                resume_text: "First Candidate".to_string(),
            },
            ResumeInput {
                resume_id: "second".to_string(),
                resume_text: "Second Candidate".to_string(),
            },
        ];

        let reports = pipeline
            .score_batch("Backend engineer: python and aws", None, resumes)
            .await
            .unwrap();

        assert_eq!(reports.len(), 2);
        assert!(reports[0].result.consolidated_score >= reports[1].result.consolidated_score);
        assert_eq!(index.record_count("first"), 2);
        assert_eq!(index.record_count("second"), 2);

        let structuring_calls = generator
            .prompts()
            .iter()
            .filter(|p| p.contains("JOB DESCRIPTION:"))
            .count();
        assert_eq!(structuring_calls, 1);
    }

    #[tokio::test]
    async fn test_rank_orders_by_score_descending() {
        let generator = StubGenerator::new()
            .with_requirements(Reply::text(r#"{"hard_skills": ["python", "aws"]}"#))
            .with_sections(sections_reply());
        let (pipeline, _, _) = pipeline_with(generator, scenario_embedder());

        let mut weak = pipeline.score_resume(request("weak")).await.unwrap();
        weak.result.consolidated_score = 0.1;
        let strong = pipeline.score_resume(request("strong")).await.unwrap();

        let mut reports = vec![weak, strong];
        rank(&mut reports);
        assert_eq!(reports[0].result.resume_id, "strong");
        assert_eq!(reports[1].result.resume_id, "weak");
    }

    #[tokio::test]
    async fn test_empty_batch_is_rejected() {
        let (pipeline, _, _) = pipeline_with(StubGenerator::new(), StubEmbedder::new());
        let result = pipeline.score_batch("jd", None, vec![]).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_batch_rejects_duplicate_resume_ids() {
        let generator = Arc::new(
            StubGenerator::new()
                .with_requirements(Reply::text(r#"{"hard_skills": ["python", "aws"]}"#))
                .with_sections(sections_reply()),
        );
        let index = Arc::new(InMemoryVectorIndex::new());
        let pipeline = ScreeningPipeline::new(
            generator.clone(),
            Arc::new(scenario_embedder()),
            index.clone(),
        );

        let resumes = vec![
            ResumeInput {
                resume_id: "cv".to_string(),
                resume_text: "Alice".to_string(),
            },
            ResumeInput {
                resume_id: "cv".to_string(),
                resume_text: "Bob".to_string(),
            },
        ];

        let result = pipeline.score_batch("Backend engineer", None, resumes).await;
        assert!(matches!(result, Err(AppError::Validation(msg)) if msg.contains("'cv'")));
        assert_eq!(index.record_count("cv"), 0);
        assert!(generator.prompts().is_empty());
    }

    #[test]
    fn test_specified_scores_drops_unrequested_categories() {
        let requirements: RequirementSet =
            serde_json::from_value(json!({"education": "BSc"})).unwrap();
        let scores: CategoryScores = RequirementCategory::ALL
            .into_iter()
            .map(|c| (c, crate::screening::models::CategoryScore::zero(c)))
            .collect();
        let filtered = specified_scores(&requirements, &scores);
        assert_eq!(
            filtered.keys().copied().collect::<Vec<_>>(),
            vec![RequirementCategory::Education]
        );
    }
}
