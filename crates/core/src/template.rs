//! Instruction template types and the PromptStore trait.
//!
//! The instruction template is the operator-editable base text that frames
//! the generation service's behavior. There is one current template per key;
//! superseded versions are never deleted, only recorded as revisions.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// The key of the mentor-chat instruction template.
pub const MENTOR_TEMPLATE_KEY: &str = "mentor_chat";

/// The compiled-in default template, used to seed a fresh store and as the
/// degradation target when the prompt store is unreachable.
pub const DEFAULT_MENTOR_TEMPLATE: &str = "You are a caring discipleship mentor. \
Answer questions about faith, spiritual growth, and church life with warmth, \
humility, and grounding in Scripture. When you do not know something, say so \
plainly rather than speculating.";

/// The current operator-editable instruction template for one key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstructionTemplate {
    /// Template key (e.g., "mentor_chat")
    pub key: String,

    /// The instruction text sent to the generation service
    pub text: String,

    /// Operator-facing description of what this template controls
    #[serde(default)]
    pub description: String,
}

/// One entry in a template's append-only revision history.
///
/// Created exactly once per save. For the most recent revision of a key,
/// `new_text` equals the current template text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateRevision {
    /// Unique revision ID
    pub id: String,

    /// Which template this revision belongs to
    pub key: String,

    /// The text before this save (`None` for the very first save)
    pub old_text: Option<String>,

    /// The text after this save
    pub new_text: String,

    /// The editor who made the change
    pub changed_by: String,

    /// When the change was made
    pub changed_at: DateTime<Utc>,
}

/// The prompt store — holds the current template plus its revision history.
///
/// The snapshot-before-write invariant: `set_current` first snapshots the old
/// value into a revision, then updates the template. Every write produces
/// exactly one revision row with the pre-write value as `old_text`, even
/// under concurrent edits (last-writer-wins is acceptable, a lost revision
/// is not).
#[async_trait]
pub trait PromptStore: Send + Sync {
    /// Fetch the current template for a key.
    async fn get_current(&self, key: &str) -> std::result::Result<InstructionTemplate, StoreError>;

    /// Overwrite the current template, appending exactly one revision.
    async fn set_current(
        &self,
        key: &str,
        new_text: &str,
        editor_id: &str,
    ) -> std::result::Result<(), StoreError>;

    /// List revisions for a key, most recent first.
    async fn list_revisions(
        &self,
        key: &str,
        limit: usize,
    ) -> std::result::Result<Vec<TemplateRevision>, StoreError>;
}
