//! The mentor-chat context-assembly pipeline — the heart of Shepherd.
//!
//! One inbound conversation flows through a linear sequence of steps:
//!
//! 1. **Template fetch** — the operator-editable instruction template
//! 2. **Resource match** — similarity-ranked knowledge entries, with a
//!    category-filtered fallback when embeddings are unavailable or yield
//!    nothing
//! 3. **Auxiliary fetch** — a capped, query-independent list of curated
//!    lessons (best-effort)
//! 4. **Assembly** — deterministic composition of all three into one
//!    instruction block
//! 5. **Completion** — a single call to the text-generation service
//!
//! Steps 2 and 3 are independent and run concurrently. Every step before 5
//! degrades silently into reduced-quality input; only step 5's failure is
//! visible to the caller.

pub mod assembler;
pub mod auxiliary;
pub mod chat;
pub mod embedding;
pub mod invoker;
pub mod matcher;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use assembler::{FALLBACK_HEADING, LESSONS_HEADING, PREFERENCE_NOTE, PromptAssembler, RANKED_HEADING};
pub use auxiliary::AuxiliaryFetcher;
pub use chat::ChatPipeline;
pub use embedding::{EmbeddingClient, EmbeddingUnavailable};
pub use invoker::CompletionInvoker;
pub use matcher::{MatchPolicy, ResourceMatcher};
