//! Prompt assembler — deterministic composition of the instruction block.
//!
//! Composition order (downstream generation quality depends on structure,
//! not just content):
//!
//! 1. The instruction template, verbatim
//! 2. Matched resources, under a heading that names how they were chosen
//! 3. On the ranked path, one fixed preference sentence
//! 4. Curated lessons
//!
//! No step reorders material from a previous step, and identical inputs
//! always produce byte-identical output — no randomness, no timestamps.

use shepherd_core::knowledge::{AuxiliaryItem, ResourceMatches};

/// Heading for resources chosen by similarity to the question.
pub const RANKED_HEADING: &str = "Resources selected for relevance to this question:";

/// Heading for the unranked category-filtered fallback set.
pub const FALLBACK_HEADING: &str = "General resources available:";

/// The fixed sentence appended on the ranked path.
pub const PREFERENCE_NOTE: &str =
    "Prefer the resources listed above when they are relevant to the user's question.";

/// Heading for the auxiliary lesson section.
pub const LESSONS_HEADING: &str = "Curated lessons available to recommend:";

const ELLIPSIS: &str = "...";

/// Stateless assembler — create one and reuse it.
pub struct PromptAssembler {
    snippet_chars: usize,
    aux_limit: usize,
}

impl PromptAssembler {
    /// Create a new assembler with the given per-entry description budget
    /// and auxiliary cap.
    pub fn new(snippet_chars: usize, aux_limit: usize) -> Self {
        Self {
            snippet_chars,
            aux_limit,
        }
    }

    /// Compose the instruction block.
    pub fn assemble(
        &self,
        template: &str,
        matches: &ResourceMatches,
        auxiliary: &[AuxiliaryItem],
    ) -> String {
        let mut prompt = String::from(template);

        if !matches.entries.is_empty() {
            prompt.push_str("\n\n");
            prompt.push_str(if matches.ranked {
                RANKED_HEADING
            } else {
                FALLBACK_HEADING
            });

            for scored in &matches.entries {
                prompt.push_str("\n- ");
                prompt.push_str(&scored.entry.title);

                if !scored.entry.tags.is_empty() {
                    prompt.push_str(" [tags: ");
                    prompt.push_str(&scored.entry.tags.join(", "));
                    prompt.push(']');
                }

                // Similarity annotations belong to the ranked path only.
                if matches.ranked {
                    if let Some(similarity) = scored.similarity {
                        prompt.push_str(&format!(" (relevance: {:.0}%)", similarity * 100.0));
                    }
                }

                prompt.push_str("\n  ");
                prompt.push_str(&self.snippet(&scored.entry.description));
            }

            if matches.ranked {
                prompt.push_str("\n\n");
                prompt.push_str(PREFERENCE_NOTE);
            }
        }

        if !auxiliary.is_empty() {
            prompt.push_str("\n\n");
            prompt.push_str(LESSONS_HEADING);
            for item in auxiliary.iter().take(self.aux_limit) {
                prompt.push_str("\n- ");
                prompt.push_str(&item.title);
                prompt.push_str(" (");
                prompt.push_str(&item.group_name);
                prompt.push(')');
            }
        }

        prompt
    }

    /// Truncate a description to the character budget, independently of any
    /// other entry. Counts chars, not bytes, so multibyte text never splits
    /// mid-character.
    fn snippet(&self, description: &str) -> String {
        if description.chars().count() <= self.snippet_chars {
            return description.to_string();
        }
        let mut truncated: String = description.chars().take(self.snippet_chars).collect();
        truncated.push_str(ELLIPSIS);
        truncated
    }
}
