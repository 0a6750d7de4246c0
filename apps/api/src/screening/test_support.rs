//! Deterministic capability stubs for screening tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::embedding_client::{Embedder, EmbeddingError};
use crate::llm_client::{LlmError, TextGenerator};

/// Canned reply for one kind of generation call.
#[derive(Debug, Clone)]
pub enum Reply {
    Text(String),
    Fail,
}

impl Reply {
    pub fn text(s: impl Into<String>) -> Self {
        Reply::Text(s.into())
    }

    fn resolve(&self) -> Result<String, LlmError> {
        match self {
            Reply::Text(text) => Ok(text.clone()),
            Reply::Fail => Err(LlmError::Api {
                status: 500,
                message: "stubbed failure".to_string(),
            }),
        }
    }
}

/// Routes each prompt to a canned reply by recognizing its template.
pub struct StubGenerator {
    pub requirements: Reply,
    pub sections: Reply,
    pub candidate_name: Reply,
    pub narrative: Reply,
    pub prompts: Mutex<Vec<String>>,
}

impl StubGenerator {
    pub fn new() -> Self {
        Self {
            requirements: Reply::text("{}"),
            sections: Reply::text("{}"),
            candidate_name: Reply::text("Ada Lovelace"),
            narrative: Reply::text("Good Fit: strong hard skills."),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn with_requirements(mut self, reply: Reply) -> Self {
        self.requirements = reply;
        self
    }

    pub fn with_sections(mut self, reply: Reply) -> Self {
        self.sections = reply;
        self
    }

    pub fn with_candidate_name(mut self, reply: Reply) -> Self {
        self.candidate_name = reply;
        self
    }

    pub fn with_narrative(mut self, reply: Reply) -> Self {
        self.narrative = reply;
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    fn record(&self, prompt: &str) {
        self.prompts.lock().unwrap().push(prompt.to_string());
    }
}

#[async_trait]
impl TextGenerator for StubGenerator {
    async fn structure(&self, prompt: &str) -> Result<String, LlmError> {
        self.record(prompt);
        if prompt.contains("JOB DESCRIPTION:") {
            self.requirements.resolve()
        } else {
            self.sections.resolve()
        }
    }

    async fn narrate(&self, prompt: &str) -> Result<String, LlmError> {
        self.record(prompt);
        if prompt.contains("candidate's full name") {
            self.candidate_name.resolve()
        } else {
            self.narrative.resolve()
        }
    }
}

/// Looks embeddings up by exact text, falling back to `default` when set.
pub struct StubEmbedder {
    vectors: HashMap<String, Vec<f32>>,
    default: Option<Vec<f32>>,
    fail: bool,
    calls: AtomicUsize,
}

impl StubEmbedder {
    pub fn new() -> Self {
        Self {
            vectors: HashMap::new(),
            default: None,
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with(mut self, text: &str, vector: Vec<f32>) -> Self {
        self.vectors.insert(text.to_string(), vector);
        self
    }

    pub fn with_default(mut self, vector: Vec<f32>) -> Self {
        self.default = Some(vector);
        self
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Embedder for StubEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(EmbeddingError::Api {
                status: 503,
                message: "stubbed outage".to_string(),
            });
        }
        self.vectors
            .get(text)
            .or(self.default.as_ref())
            .cloned()
            .ok_or_else(|| EmbeddingError::Api {
                status: 404,
                message: format!("no stub vector for '{text}'"),
            })
    }
}
