//! The chat pipeline — one inbound conversation in, one reply out.
//!
//! Orchestrates the whole flow: template fetch, concurrent resource match +
//! auxiliary fetch, deterministic assembly, then a single completion call.
//! Every step before the completion degrades silently; only the completion's
//! failure reaches the caller.

use shepherd_config::AppConfig;
use shepherd_core::error::Result;
use shepherd_core::knowledge::KnowledgeBase;
use shepherd_core::provider::Provider;
use shepherd_core::template::{DEFAULT_MENTOR_TEMPLATE, MENTOR_TEMPLATE_KEY, PromptStore};
use shepherd_core::turn::{Role, Turn};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::assembler::PromptAssembler;
use crate::auxiliary::AuxiliaryFetcher;
use crate::embedding::EmbeddingClient;
use crate::invoker::CompletionInvoker;
use crate::matcher::{MatchPolicy, ResourceMatcher};

/// The request-scoped mentor-chat pipeline. Stateless between requests —
/// each invocation is independent apart from read access to the stores.
pub struct ChatPipeline {
    store: Arc<dyn PromptStore>,
    matcher: ResourceMatcher,
    auxiliary: AuxiliaryFetcher,
    assembler: PromptAssembler,
    invoker: CompletionInvoker,
    template_key: String,
}

impl ChatPipeline {
    /// Wire the pipeline from its collaborators and the configured policy.
    pub fn new(
        store: Arc<dyn PromptStore>,
        kb: Arc<dyn KnowledgeBase>,
        provider: Arc<dyn Provider>,
        config: &AppConfig,
    ) -> Self {
        let embedder = EmbeddingClient::new(provider.clone(), &config.embedding_model);
        let matcher = ResourceMatcher::new(
            embedder,
            kb.clone(),
            MatchPolicy {
                min_similarity: config.retrieval.min_similarity,
                match_limit: config.retrieval.match_limit,
                fallback_limit: config.retrieval.fallback_limit,
                fallback_category: config.retrieval.fallback_category.clone(),
            },
        );
        let auxiliary = AuxiliaryFetcher::new(kb, config.retrieval.aux_limit);
        let assembler =
            PromptAssembler::new(config.retrieval.snippet_chars, config.retrieval.aux_limit);
        let invoker = CompletionInvoker::new(
            provider,
            &config.chat_model,
            config.temperature,
            config.max_tokens,
        );

        Self {
            store,
            matcher,
            auxiliary,
            assembler,
            invoker,
            template_key: MENTOR_TEMPLATE_KEY.into(),
        }
    }

    /// Handle one conversation and return the mentor's reply.
    pub async fn handle_chat(&self, turns: &[Turn]) -> Result<String> {
        let question = latest_user_utterance(turns);

        // Template read failures degrade to the compiled-in default rather
        // than failing the request.
        let template = match self.store.get_current(&self.template_key).await {
            Ok(template) => template.text,
            Err(e) => {
                warn!(error = %e, "Prompt store unavailable, using default template");
                DEFAULT_MENTOR_TEMPLATE.to_string()
            }
        };

        // The two remote fetches are independent — run them concurrently so
        // total latency is bounded by the slower of the two.
        let (matches, auxiliary) =
            tokio::join!(self.matcher.matches(question), self.auxiliary.fetch());

        let instruction = self.assembler.assemble(&template, &matches, &auxiliary);
        debug!(
            instruction_len = instruction.len(),
            "Mentor instruction assembled"
        );

        info!(
            ranked = matches.ranked,
            resources = matches.entries.len(),
            lessons = auxiliary.len(),
            "Handling mentor chat"
        );

        let reply = self.invoker.complete(&instruction, turns).await?;
        Ok(reply)
    }
}

/// The latest user utterance, or empty when the conversation has none
/// (the matcher then degrades straight to its fallback rung).
fn latest_user_utterance(turns: &[Turn]) -> &str {
    turns
        .iter()
        .rev()
        .find(|t| t.role == Role::User)
        .map(|t| t.content.as_str())
        .unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::{FALLBACK_HEADING, PREFERENCE_NOTE, RANKED_HEADING};
    use crate::test_helpers::{FailingPromptStore, MockProvider};
    use shepherd_core::error::{Error, ProviderError};
    use shepherd_core::knowledge::{AuxiliaryItem, KnowledgeEntry};
    use shepherd_store::InMemoryStore;

    fn entry(id: &str, title: &str, category: &str, embedding: Option<Vec<f32>>) -> KnowledgeEntry {
        KnowledgeEntry {
            id: id.into(),
            title: title.into(),
            description: format!("Description for {title}"),
            tags: vec![],
            category: category.into(),
            embedding,
        }
    }

    fn pipeline_with(store: Arc<InMemoryStore>, provider: Arc<MockProvider>) -> ChatPipeline {
        ChatPipeline::new(store.clone(), store, provider, &AppConfig::default())
    }

    /// The system instruction submitted on the provider's only call.
    fn submitted_instruction(provider: &MockProvider) -> String {
        let requests = provider.completion_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].messages[0].role, Role::System);
        requests[0].messages[0].content.clone()
    }

    #[tokio::test]
    async fn scenario_a_no_semantic_match_uses_fallback_shape() {
        let store = Arc::new(InMemoryStore::new());
        store
            .set_current(MENTOR_TEMPLATE_KEY, "Be concise.", "admin")
            .await
            .unwrap();
        for i in 0..25 {
            store
                .insert_entry(entry(&format!("care_{i}"), "Care resource", "care", None))
                .await;
        }
        // Embedding succeeds but nothing clears the threshold.
        store
            .insert_entry(entry("far", "Unrelated", "faith", Some(vec![0.0, 1.0])))
            .await;

        let provider = Arc::new(MockProvider::new().with_embedding(vec![1.0, 0.0]));
        let pipeline = pipeline_with(store, provider.clone());

        let reply = pipeline
            .handle_chat(&[Turn::user("something unmatched")])
            .await
            .unwrap();
        assert_eq!(reply, "mock reply");

        let instruction = submitted_instruction(&provider);
        assert!(instruction.starts_with("Be concise."));
        assert!(instruction.contains(FALLBACK_HEADING));
        assert!(!instruction.contains("relevance:"));
        // At most 20 fallback entries.
        assert!(instruction.matches("- Care resource").count() <= 20);
    }

    #[tokio::test]
    async fn scenario_b_embedding_timeout_matches_fallback_shape() {
        let store = Arc::new(InMemoryStore::new());
        store
            .set_current(MENTOR_TEMPLATE_KEY, "Be concise.", "admin")
            .await
            .unwrap();
        for i in 0..5 {
            store
                .insert_entry(entry(&format!("care_{i}"), "Care resource", "care", None))
                .await;
        }

        let provider = Arc::new(
            MockProvider::new().failing_embedding(ProviderError::Timeout("deadline".into())),
        );
        let pipeline = pipeline_with(store, provider.clone());

        pipeline.handle_chat(&[Turn::user("help")]).await.unwrap();

        let instruction = submitted_instruction(&provider);
        assert!(instruction.starts_with("Be concise."));
        assert!(instruction.contains(FALLBACK_HEADING));
        assert!(!instruction.contains(RANKED_HEADING));
        assert!(!instruction.contains("relevance:"));
    }

    #[tokio::test]
    async fn scenario_c_two_ranked_matches_with_percentages() {
        let store = Arc::new(InMemoryStore::new());
        // Unit vectors: cosine against [1, 0] equals the first component.
        store
            .insert_entry(entry(
                "prayer",
                "Prayer basics",
                "faith",
                Some(vec![0.91, 0.414608]),
            ))
            .await;
        store
            .insert_entry(entry(
                "fasting",
                "Fasting guide",
                "faith",
                Some(vec![0.62, 0.784602]),
            ))
            .await;

        let provider = Arc::new(MockProvider::new().with_embedding(vec![1.0, 0.0]));
        let pipeline = pipeline_with(store, provider.clone());

        pipeline
            .handle_chat(&[Turn::user("how do I pray?")])
            .await
            .unwrap();

        let instruction = submitted_instruction(&provider);
        assert!(instruction.contains(RANKED_HEADING));
        assert!(instruction.contains("Prayer basics"));
        assert!(instruction.contains("Fasting guide"));
        assert!(instruction.contains("(relevance: 91%)"));
        assert!(instruction.contains("(relevance: 62%)"));
        assert_eq!(instruction.matches(PREFERENCE_NOTE).count(), 1);
    }

    #[tokio::test]
    async fn generation_failure_returns_error_object() {
        let store = Arc::new(InMemoryStore::new());
        let provider = Arc::new(MockProvider::new().failing_completion(ProviderError::ApiError {
            status_code: 500,
            message: "Internal server error".into(),
        }));
        let pipeline = pipeline_with(store, provider);

        let result = pipeline.handle_chat(&[Turn::user("hello")]).await;
        assert!(matches!(
            result,
            Err(Error::Provider(ProviderError::ApiError {
                status_code: 500,
                ..
            }))
        ));
    }

    #[tokio::test]
    async fn conversation_without_user_turn_still_succeeds() {
        let store = Arc::new(InMemoryStore::new());
        store
            .insert_entry(entry("c", "Care resource", "care", None))
            .await;
        let provider = Arc::new(MockProvider::new());
        let pipeline = pipeline_with(store, provider.clone());

        let reply = pipeline
            .handle_chat(&[Turn::assistant("Welcome!")])
            .await
            .unwrap();
        assert_eq!(reply, "mock reply");

        // Empty query never embeds, so the fallback shape is used.
        let instruction = submitted_instruction(&provider);
        assert!(instruction.contains(FALLBACK_HEADING));
    }

    #[tokio::test]
    async fn prompt_store_failure_degrades_to_default_template() {
        let store = Arc::new(InMemoryStore::new());
        let provider = Arc::new(MockProvider::new());
        let pipeline = ChatPipeline::new(
            Arc::new(FailingPromptStore),
            store,
            provider.clone(),
            &AppConfig::default(),
        );

        pipeline.handle_chat(&[Turn::user("hello")]).await.unwrap();

        let instruction = submitted_instruction(&provider);
        assert!(instruction.starts_with(DEFAULT_MENTOR_TEMPLATE));
    }

    #[tokio::test]
    async fn auxiliary_lessons_always_included() {
        let store = Arc::new(InMemoryStore::new());
        store
            .insert_lesson(AuxiliaryItem {
                title: "Hearing God".into(),
                group_name: "Foundations".into(),
            })
            .await;
        let provider = Arc::new(
            MockProvider::new().failing_embedding(ProviderError::Network("down".into())),
        );
        let pipeline = pipeline_with(store, provider.clone());

        pipeline.handle_chat(&[Turn::user("hello")]).await.unwrap();

        let instruction = submitted_instruction(&provider);
        assert!(instruction.contains("- Hearing God (Foundations)"));
    }

    #[tokio::test]
    async fn caller_turns_are_forwarded_unmodified() {
        let store = Arc::new(InMemoryStore::new());
        let provider = Arc::new(MockProvider::new());
        let pipeline = pipeline_with(store, provider.clone());

        let turns = vec![
            Turn::user("How do I pray?"),
            Turn::assistant("Start simply."),
            Turn::user("For how long?"),
        ];
        pipeline.handle_chat(&turns).await.unwrap();

        let requests = provider.completion_requests();
        assert_eq!(&requests[0].messages[1..], &turns[..]);
    }
}
