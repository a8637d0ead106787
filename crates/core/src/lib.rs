//! # Shepherd Core
//!
//! Domain types, traits, and error definitions for the Shepherd mentor-chat
//! service. This crate has **zero framework dependencies** — it defines the
//! domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every collaborator (prompt store, knowledge base, LLM provider) is defined
//! as a trait here. Implementations live in their respective crates. This
//! enables:
//! - Swapping implementations via configuration
//! - Easy testing with mock/stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod error;
pub mod knowledge;
pub mod provider;
pub mod template;
pub mod turn;

// Re-export key types at crate root for ergonomics
pub use error::{Error, ProviderError, Result, StoreError};
pub use knowledge::{
    AuxiliaryItem, KnowledgeBase, KnowledgeEntry, ResourceMatches, ScoredEntry, SimilarityHit,
};
pub use provider::{
    EmbeddingRequest, EmbeddingResponse, Provider, ProviderRequest, ProviderResponse, Usage,
};
pub use template::{
    DEFAULT_MENTOR_TEMPLATE, InstructionTemplate, MENTOR_TEMPLATE_KEY, PromptStore,
    TemplateRevision,
};
pub use turn::{Role, Turn};
