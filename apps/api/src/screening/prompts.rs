// All LLM prompt templates for the screening module.
// System prompts live in llm_client::prompts and are chosen by the TextGenerator operation.

/// Requirement structuring prompt. Replace `{jd_text}` before sending.
pub const REQUIREMENTS_PROMPT_TEMPLATE: &str = r#"You are an expert technical recruiter. Decompose the following job description into structured requirement categories.

Return a JSON object with EXACTLY these keys (no extra keys):
{
  "experience": "Years and kind of professional experience required, as one sentence",
  "hard_skills": ["python", "distributed systems"],
  "soft_skills": ["communication", "mentoring"],
  "tools": ["docker", "kubernetes", "git"],
  "education": "Required degree or field of study, as one sentence",
  "certifications": ["AWS Solutions Architect"],
  "project_types": ["data pipelines", "customer-facing web applications"],
  "industry": "Industry or domain of the role"
}

Rules:
- Use an empty string "" for text keys and an empty array [] for list keys when the job description says nothing about them.
- Do NOT invent requirements that are not stated or clearly implied.
- Use lowercase for skills and tools. Avoid duplicates.

JOB DESCRIPTION:
{jd_text}"#;

/// Resume segmentation prompt. Replace `{resume_text}` before sending.
pub const SEGMENT_PROMPT_TEMPLATE: &str = r#"You are an expert resume parser. Split the following resume into its sections.

Return a JSON object with EXACTLY these keys (no extra keys), each mapping to an array of strings:
{
  "summary": ["Professional summary paragraph"],
  "work_experience": ["One entry per role: title, company, dates and achievements"],
  "projects": ["One entry per project: name and description"],
  "skills": ["One entry containing the full skills list, e.g. python, aws, docker"],
  "education": ["One entry per degree"],
  "certifications": ["One entry per certification"]
}

Rules:
- Copy the resume's wording; do NOT summarize away details or invent content.
- Each array element must be a complete, self-contained piece of text, never a single character.
- Use an empty array [] for sections the resume does not have.

RESUME:
{resume_text}"#;

/// Candidate name extraction prompt. Replace `{resume_text}` before sending.
pub const CANDIDATE_NAME_PROMPT_TEMPLATE: &str = r#"Identify the candidate's full name in the following resume text.
Look at the header, contact information, and any clear name indicators.

Return ONLY the full name in the format "FirstName LastName".
If you cannot find a clear name, return "Unknown Candidate".

RESUME:
{resume_text}"#;

/// Narrative summary prompt. Replace `{consolidated_score}` and `{breakdown}` before sending.
pub const SUMMARY_PROMPT_TEMPLATE: &str = r#"Summarize a candidate's suitability for a role based on a quantitative, category-by-category match against the job description.

Consolidated score: {consolidated_score} (out of 1.0)

Category breakdown (requirement category: score, followed by the best supporting resume evidence):
{breakdown}

Write exactly ONE sentence. Start with a recommendation label: "Strongly Recommended", "Good Fit", "Potential Fit", or "Not a Good Fit". Then justify it by naming the strongest and weakest categories."#;
