//! `shepherd template` — Inspect and edit the instruction template.

use clap::Subcommand;
use shepherd_config::AppConfig;
use shepherd_core::template::{MENTOR_TEMPLATE_KEY, PromptStore};
use shepherd_store::SqliteStore;

#[derive(Subcommand)]
pub enum TemplateAction {
    /// Print the current template text
    Show,

    /// Overwrite the template text
    Set {
        /// The new template text (or a path to a file containing it)
        text: String,

        /// Editor identifier recorded in the revision history
        #[arg(long, default_value = "cli")]
        editor: String,
    },

    /// List the revision history, most recent first
    History {
        /// Maximum revisions to show
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },
}

pub async fn run(action: TemplateAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let store = SqliteStore::new(&config.store.path).await?;

    match action {
        TemplateAction::Show => {
            let template = store.get_current(MENTOR_TEMPLATE_KEY).await?;
            println!("{}", template.text);
        }
        TemplateAction::Set { text, editor } => {
            // Accept a file path for longer templates.
            let new_text = match std::fs::read_to_string(&text) {
                Ok(contents) => contents,
                Err(_) => text,
            };
            store
                .set_current(MENTOR_TEMPLATE_KEY, &new_text, &editor)
                .await?;
            println!("Template updated ({} chars)", new_text.len());
        }
        TemplateAction::History { limit } => {
            let revisions = store.list_revisions(MENTOR_TEMPLATE_KEY, limit).await?;
            if revisions.is_empty() {
                println!("No revisions yet.");
            }
            for revision in revisions {
                println!(
                    "{}  by {}  ({} -> {} chars)",
                    revision.changed_at.format("%Y-%m-%d %H:%M:%S"),
                    revision.changed_by,
                    revision.old_text.as_deref().map_or(0, str::len),
                    revision.new_text.len(),
                );
            }
        }
    }

    Ok(())
}
