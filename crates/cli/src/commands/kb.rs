//! `shepherd kb` — Manage knowledge entries and curated lessons.

use clap::Subcommand;
use shepherd_config::AppConfig;
use shepherd_core::knowledge::{AuxiliaryItem, KnowledgeEntry};
use shepherd_core::provider::{EmbeddingRequest, Provider};
use shepherd_store::SqliteStore;
use uuid::Uuid;

#[derive(Subcommand)]
pub enum KbAction {
    /// Add or update a knowledge entry (embedding computed by `kb index`)
    Add {
        /// Entry title
        title: String,

        /// Entry description
        description: String,

        /// Category flag (e.g., "care" for support resources)
        #[arg(long, default_value = "general")]
        category: String,

        /// Tags, comma separated
        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,

        /// Stable ID (generated when omitted)
        #[arg(long)]
        id: Option<String>,
    },

    /// Compute embeddings for entries that do not have one yet
    Index,

    /// Add a curated lesson to the auxiliary list
    AddLesson {
        /// Lesson title
        title: String,

        /// Group (track/course) name
        group: String,

        /// Ordering position
        #[arg(long, default_value_t = 0)]
        position: i64,
    },
}

pub async fn run(action: KbAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let store = SqliteStore::new(&config.store.path).await?;

    match action {
        KbAction::Add {
            title,
            description,
            category,
            tags,
            id,
        } => {
            let entry = KnowledgeEntry {
                id: id.unwrap_or_else(|| Uuid::new_v4().to_string()),
                title,
                description,
                tags,
                category,
                embedding: None,
            };
            store.upsert_entry(&entry).await?;
            println!("Stored entry {}", entry.id);
        }
        KbAction::Index => {
            let provider = shepherd_providers::build_from_config(&config);
            let pending = store.entries_without_embeddings().await?;
            if pending.is_empty() {
                println!("All entries are indexed.");
                return Ok(());
            }

            let mut indexed = 0;
            for entry in &pending {
                // Index title plus description — the same text the matcher
                // scores against at query time.
                let input = format!("{}\n{}", entry.title, entry.description);
                let response = provider
                    .embed(EmbeddingRequest {
                        model: config.embedding_model.clone(),
                        input,
                    })
                    .await?;
                store.set_embedding(&entry.id, &response.vector).await?;
                indexed += 1;
                println!("Indexed {} ({}/{})", entry.title, indexed, pending.len());
            }
        }
        KbAction::AddLesson {
            title,
            group,
            position,
        } => {
            store
                .insert_lesson(
                    &AuxiliaryItem {
                        title,
                        group_name: group,
                    },
                    position,
                )
                .await?;
            println!("Lesson added.");
        }
    }

    Ok(())
}
