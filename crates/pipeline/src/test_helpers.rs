//! Shared test helpers for pipeline tests.

use async_trait::async_trait;
use shepherd_core::error::{ProviderError, StoreError};
use shepherd_core::knowledge::{AuxiliaryItem, KnowledgeBase, KnowledgeEntry, SimilarityHit};
use shepherd_core::provider::{
    EmbeddingRequest, EmbeddingResponse, Provider, ProviderRequest, ProviderResponse, Usage,
};
use shepherd_core::template::{InstructionTemplate, PromptStore, TemplateRevision};
use std::sync::Mutex;

/// A scripted provider with fixed outcomes for `complete` and `embed`.
///
/// Records completion requests so tests can assert on the exact message
/// sequence that was submitted.
pub struct MockProvider {
    completion: Result<String, ProviderError>,
    embedding: Result<Vec<f32>, ProviderError>,
    completion_requests: Mutex<Vec<ProviderRequest>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            completion: Ok("mock reply".into()),
            embedding: Ok(vec![1.0, 0.0]),
            completion_requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_completion(mut self, text: &str) -> Self {
        self.completion = Ok(text.into());
        self
    }

    pub fn failing_completion(mut self, error: ProviderError) -> Self {
        self.completion = Err(error);
        self
    }

    pub fn with_embedding(mut self, vector: Vec<f32>) -> Self {
        self.embedding = Ok(vector);
        self
    }

    pub fn failing_embedding(mut self, error: ProviderError) -> Self {
        self.embedding = Err(error);
        self
    }

    /// The completion requests seen so far.
    pub fn completion_requests(&self) -> Vec<ProviderRequest> {
        self.completion_requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        self.completion_requests.lock().unwrap().push(request);
        self.completion.clone().map(|content| ProviderResponse {
            content,
            model: "mock-model".into(),
            usage: Some(Usage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            }),
        })
    }

    async fn embed(&self, _request: EmbeddingRequest) -> Result<EmbeddingResponse, ProviderError> {
        self.embedding.clone().map(|vector| EmbeddingResponse {
            vector,
            model: "mock-embedding".into(),
            usage: None,
        })
    }
}

/// A knowledge base whose every method fails — for exercising fallbacks.
pub struct FailingKnowledgeBase;

#[async_trait]
impl KnowledgeBase for FailingKnowledgeBase {
    async fn search_by_similarity(
        &self,
        _vector: &[f32],
        _threshold: f32,
        _limit: usize,
    ) -> Result<Vec<SimilarityHit>, StoreError> {
        Err(StoreError::QueryFailed("knowledge base offline".into()))
    }

    async fn get_entries(&self, _ids: &[String]) -> Result<Vec<KnowledgeEntry>, StoreError> {
        Err(StoreError::QueryFailed("knowledge base offline".into()))
    }

    async fn list_by_category(
        &self,
        _category: &str,
        _limit: usize,
    ) -> Result<Vec<KnowledgeEntry>, StoreError> {
        Err(StoreError::QueryFailed("knowledge base offline".into()))
    }

    async fn list_curated_lessons(&self, _limit: usize) -> Result<Vec<AuxiliaryItem>, StoreError> {
        Err(StoreError::QueryFailed("knowledge base offline".into()))
    }
}

/// A prompt store whose every method fails — for exercising the template
/// degradation path.
pub struct FailingPromptStore;

#[async_trait]
impl PromptStore for FailingPromptStore {
    async fn get_current(&self, _key: &str) -> Result<InstructionTemplate, StoreError> {
        Err(StoreError::Storage("prompt store offline".into()))
    }

    async fn set_current(
        &self,
        _key: &str,
        _new_text: &str,
        _editor_id: &str,
    ) -> Result<(), StoreError> {
        Err(StoreError::Storage("prompt store offline".into()))
    }

    async fn list_revisions(
        &self,
        _key: &str,
        _limit: usize,
    ) -> Result<Vec<TemplateRevision>, StoreError> {
        Err(StoreError::Storage("prompt store offline".into()))
    }
}
