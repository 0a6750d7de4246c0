use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::errors::AppError;
use crate::screening::matcher::cosine_similarity;
use crate::vector_index::{VectorIndex, VectorMatch, VectorRecord};

/// Process-local vector index. Each namespace is swapped atomically on upsert.
#[derive(Default)]
pub struct InMemoryVectorIndex {
    namespaces: RwLock<HashMap<String, Vec<VectorRecord>>>,
}

impl InMemoryVectorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_count(&self, namespace: &str) -> usize {
        self.namespaces
            .read()
            .map(|guard| guard.get(namespace).map_or(0, Vec::len))
            .unwrap_or(0)
    }
}

#[async_trait]
impl VectorIndex for InMemoryVectorIndex {
    async fn upsert(&self, namespace: &str, records: Vec<VectorRecord>) -> Result<(), AppError> {
        let mut guard = self
            .namespaces
            .write()
            .map_err(|_| AppError::VectorIndex("in-memory index lock poisoned".to_string()))?;
        guard.insert(namespace.to_string(), records);
        Ok(())
    }

    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        namespace: Option<&str>,
    ) -> Result<Vec<VectorMatch>, AppError> {
        let guard = self
            .namespaces
            .read()
            .map_err(|_| AppError::VectorIndex("in-memory index lock poisoned".to_string()))?;

        let mut matches: Vec<VectorMatch> = guard
            .iter()
            .filter(|(ns, _)| namespace.map_or(true, |wanted| wanted == ns.as_str()))
            .flat_map(|(_, records)| records.iter())
            .map(|record| VectorMatch {
                id: record.id.clone(),
                score: cosine_similarity(vector, &record.vector),
            })
            .collect();

        matches.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.id.cmp(&b.id)));
        matches.truncate(top_k);
        Ok(matches)
    }
}
