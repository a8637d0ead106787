//! SQLite backend for the prompt store and knowledge base.
//!
//! Uses a single SQLite database file with four tables:
//! - `templates` — the current instruction template per key
//! - `template_revisions` — append-only history, one row per save
//! - `knowledge_entries` — retrievable reference content with optional
//!   embedding BLOBs
//! - `curated_lessons` — query-independent auxiliary content
//!
//! Template saves run snapshot-then-update inside one transaction, so each
//! revision records the text it actually replaced.

use async_trait::async_trait;
use chrono::Utc;
use shepherd_core::error::StoreError;
use shepherd_core::knowledge::{AuxiliaryItem, KnowledgeBase, KnowledgeEntry, SimilarityHit};
use shepherd_core::template::{
    DEFAULT_MENTOR_TEMPLATE, InstructionTemplate, MENTOR_TEMPLATE_KEY, PromptStore,
    TemplateRevision,
};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::{debug, info};
use uuid::Uuid;

use crate::vector;

/// A production SQLite store.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Create a new SQLite store from a file path.
    ///
    /// The database and all tables are created automatically, and the
    /// default mentor template is seeded if absent. Pass `":memory:"` for an
    /// in-process ephemeral database (useful for tests).
    pub async fn new(path: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(path)
            .map_err(|e| StoreError::Storage(format!("Invalid SQLite path: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .pragma("foreign_keys", "ON");

        // One connection: keeps `:memory:` databases coherent and serializes
        // template saves, so each revision snapshots the text it replaces.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Storage(format!("Failed to open SQLite: {e}")))?;

        let store = Self { pool };
        store.run_migrations().await?;
        store.seed_default_template().await?;
        info!("SQLite store initialized at {path}");
        Ok(store)
    }

    /// Run schema migrations.
    async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS templates (
                key         TEXT PRIMARY KEY,
                text        TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT ''
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("templates table: {e}")))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS template_revisions (
                id         TEXT PRIMARY KEY,
                key        TEXT NOT NULL,
                old_text   TEXT,
                new_text   TEXT NOT NULL,
                changed_by TEXT NOT NULL,
                changed_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("template_revisions table: {e}")))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_revisions_key_changed
             ON template_revisions(key, changed_at DESC)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("revisions index: {e}")))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS knowledge_entries (
                id          TEXT PRIMARY KEY,
                title       TEXT NOT NULL,
                description TEXT NOT NULL,
                tags        TEXT NOT NULL DEFAULT '[]',
                category    TEXT NOT NULL,
                embedding   BLOB
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("knowledge_entries table: {e}")))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_knowledge_category
             ON knowledge_entries(category)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("category index: {e}")))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS curated_lessons (
                id         TEXT PRIMARY KEY,
                title      TEXT NOT NULL,
                group_name TEXT NOT NULL,
                position   INTEGER NOT NULL DEFAULT 0
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("curated_lessons table: {e}")))?;

        debug!("SQLite migrations complete");
        Ok(())
    }

    /// Seed the mentor template if this is a fresh database.
    async fn seed_default_template(&self) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT OR IGNORE INTO templates (key, text, description) VALUES (?1, ?2, ?3)",
        )
        .bind(MENTOR_TEMPLATE_KEY)
        .bind(DEFAULT_MENTOR_TEMPLATE)
        .bind("Base instructions for the mentor chat")
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(format!("Template seed: {e}")))?;
        Ok(())
    }

    /// Insert or update a knowledge entry.
    pub async fn upsert_entry(&self, entry: &KnowledgeEntry) -> Result<(), StoreError> {
        let tags_json = serde_json::to_string(&entry.tags)
            .map_err(|e| StoreError::Storage(format!("Tags serialization: {e}")))?;
        let embedding_blob: Option<Vec<u8>> = entry.embedding.as_deref().map(embedding_to_blob);

        sqlx::query(
            r#"
            INSERT INTO knowledge_entries (id, title, description, tags, category, embedding)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                description = excluded.description,
                tags = excluded.tags,
                category = excluded.category,
                embedding = excluded.embedding
            "#,
        )
        .bind(&entry.id)
        .bind(&entry.title)
        .bind(&entry.description)
        .bind(&tags_json)
        .bind(&entry.category)
        .bind(embedding_blob)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(format!("Entry upsert: {e}")))?;

        Ok(())
    }

    /// Store a freshly computed embedding for an entry.
    pub async fn set_embedding(&self, id: &str, embedding: &[f32]) -> Result<(), StoreError> {
        sqlx::query("UPDATE knowledge_entries SET embedding = ?1 WHERE id = ?2")
            .bind(embedding_to_blob(embedding))
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Storage(format!("Embedding update: {e}")))?;
        Ok(())
    }

    /// Insert a curated lesson at the given position.
    pub async fn insert_lesson(&self, lesson: &AuxiliaryItem, position: i64) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO curated_lessons (id, title, group_name, position) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&lesson.title)
        .bind(&lesson.group_name)
        .bind(position)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(format!("Lesson insert: {e}")))?;
        Ok(())
    }

    /// Entries whose embedding has not been computed yet (for the offline
    /// indexing command).
    pub async fn entries_without_embeddings(&self) -> Result<Vec<KnowledgeEntry>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, title, description, tags, category, embedding
             FROM knowledge_entries WHERE embedding IS NULL",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(format!("Unindexed scan: {e}")))?;

        rows.iter().map(Self::row_to_entry).collect()
    }

    /// Parse a `KnowledgeEntry` from a SQLite row.
    ///
    /// Tags are stored as loosely-typed JSON text and coerced here, once, at
    /// the read boundary; malformed tag JSON degrades to an empty list.
    fn row_to_entry(row: &sqlx::sqlite::SqliteRow) -> Result<KnowledgeEntry, StoreError> {
        let id: String = row
            .try_get("id")
            .map_err(|e| StoreError::QueryFailed(format!("id column: {e}")))?;
        let title: String = row
            .try_get("title")
            .map_err(|e| StoreError::QueryFailed(format!("title column: {e}")))?;
        let description: String = row
            .try_get("description")
            .map_err(|e| StoreError::QueryFailed(format!("description column: {e}")))?;
        let tags_json: String = row
            .try_get("tags")
            .map_err(|e| StoreError::QueryFailed(format!("tags column: {e}")))?;
        let category: String = row
            .try_get("category")
            .map_err(|e| StoreError::QueryFailed(format!("category column: {e}")))?;

        let tags: Vec<String> = serde_json::from_str(&tags_json).unwrap_or_default();

        let embedding: Option<Vec<u8>> = row.try_get("embedding").ok();
        let embedding_vec = embedding.map(|blob| blob_to_embedding(&blob));

        Ok(KnowledgeEntry {
            id,
            title,
            description,
            tags,
            category,
            embedding: embedding_vec,
        })
    }
}

/// Serialize an embedding vector to little-endian bytes.
fn embedding_to_blob(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Deserialize an embedding BLOB back into a vector.
fn blob_to_embedding(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

#[async_trait]
impl PromptStore for SqliteStore {
    async fn get_current(&self, key: &str) -> Result<InstructionTemplate, StoreError> {
        let row = sqlx::query("SELECT key, text, description FROM templates WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(format!("Template fetch: {e}")))?;

        let row = row.ok_or_else(|| StoreError::NotFound(format!("template '{key}'")))?;

        Ok(InstructionTemplate {
            key: row
                .try_get("key")
                .map_err(|e| StoreError::QueryFailed(format!("key column: {e}")))?,
            text: row
                .try_get("text")
                .map_err(|e| StoreError::QueryFailed(format!("text column: {e}")))?,
            description: row
                .try_get("description")
                .map_err(|e| StoreError::QueryFailed(format!("description column: {e}")))?,
        })
    }

    async fn set_current(
        &self,
        key: &str,
        new_text: &str,
        editor_id: &str,
    ) -> Result<(), StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Storage(format!("Transaction begin: {e}")))?;

        // Snapshot first: the revision must record the text being replaced.
        let old_text: Option<String> = sqlx::query_scalar("SELECT text FROM templates WHERE key = ?1")
            .bind(key)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| StoreError::QueryFailed(format!("Template snapshot: {e}")))?;

        sqlx::query(
            r#"
            INSERT INTO template_revisions (id, key, old_text, new_text, changed_by, changed_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(key)
        .bind(&old_text)
        .bind(new_text)
        .bind(editor_id)
        .bind(Utc::now().to_rfc3339())
        .execute(&mut *tx)
        .await
        .map_err(|e| StoreError::Storage(format!("Revision insert: {e}")))?;

        sqlx::query(
            r#"
            INSERT INTO templates (key, text, description)
            VALUES (?1, ?2, '')
            ON CONFLICT(key) DO UPDATE SET text = excluded.text
            "#,
        )
        .bind(key)
        .bind(new_text)
        .execute(&mut *tx)
        .await
        .map_err(|e| StoreError::Storage(format!("Template update: {e}")))?;

        tx.commit()
            .await
            .map_err(|e| StoreError::Storage(format!("Transaction commit: {e}")))?;

        debug!(key, editor = editor_id, "Template saved");
        Ok(())
    }

    async fn list_revisions(
        &self,
        key: &str,
        limit: usize,
    ) -> Result<Vec<TemplateRevision>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, key, old_text, new_text, changed_by, changed_at
            FROM template_revisions
            WHERE key = ?1
            ORDER BY changed_at DESC, rowid DESC
            LIMIT ?2
            "#,
        )
        .bind(key)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(format!("Revision list: {e}")))?;

        rows.iter()
            .map(|row| {
                let changed_at_str: String = row
                    .try_get("changed_at")
                    .map_err(|e| StoreError::QueryFailed(format!("changed_at column: {e}")))?;
                let changed_at = chrono::DateTime::parse_from_rfc3339(&changed_at_str)
                    .map(|dt| dt.with_timezone(&Utc))
                    .unwrap_or_else(|_| Utc::now());

                Ok(TemplateRevision {
                    id: row
                        .try_get("id")
                        .map_err(|e| StoreError::QueryFailed(format!("id column: {e}")))?,
                    key: row
                        .try_get("key")
                        .map_err(|e| StoreError::QueryFailed(format!("key column: {e}")))?,
                    old_text: row
                        .try_get("old_text")
                        .map_err(|e| StoreError::QueryFailed(format!("old_text column: {e}")))?,
                    new_text: row
                        .try_get("new_text")
                        .map_err(|e| StoreError::QueryFailed(format!("new_text column: {e}")))?,
                    changed_by: row
                        .try_get("changed_by")
                        .map_err(|e| StoreError::QueryFailed(format!("changed_by column: {e}")))?,
                    changed_at,
                })
            })
            .collect()
    }
}

#[async_trait]
impl KnowledgeBase for SqliteStore {
    async fn search_by_similarity(
        &self,
        query_vector: &[f32],
        threshold: f32,
        limit: usize,
    ) -> Result<Vec<SimilarityHit>, StoreError> {
        // Entries without a computed embedding never reach the ranking.
        let rows = sqlx::query(
            "SELECT id, embedding FROM knowledge_entries WHERE embedding IS NOT NULL",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(format!("Embedding scan: {e}")))?;

        let candidates: Vec<(String, Vec<f32>)> = rows
            .iter()
            .filter_map(|row| {
                let id: String = row.try_get("id").ok()?;
                let blob: Vec<u8> = row.try_get("embedding").ok()?;
                Some((id, blob_to_embedding(&blob)))
            })
            .collect();

        Ok(vector::rank_hits(&candidates, query_vector, threshold, limit))
    }

    async fn get_entries(&self, ids: &[String]) -> Result<Vec<KnowledgeEntry>, StoreError> {
        // One query per ID keeps the result in input order; the ranked path
        // fetches at most a handful of records.
        let mut entries = Vec::with_capacity(ids.len());
        for id in ids {
            let row = sqlx::query(
                "SELECT id, title, description, tags, category, embedding
                 FROM knowledge_entries WHERE id = ?1",
            )
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(format!("Entry fetch: {e}")))?;

            if let Some(row) = row {
                entries.push(Self::row_to_entry(&row)?);
            }
        }
        Ok(entries)
    }

    async fn list_by_category(
        &self,
        category: &str,
        limit: usize,
    ) -> Result<Vec<KnowledgeEntry>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, title, description, tags, category, embedding
             FROM knowledge_entries WHERE category = ?1 LIMIT ?2",
        )
        .bind(category)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(format!("Category list: {e}")))?;

        rows.iter().map(Self::row_to_entry).collect()
    }

    async fn list_curated_lessons(&self, limit: usize) -> Result<Vec<AuxiliaryItem>, StoreError> {
        let rows = sqlx::query(
            "SELECT title, group_name FROM curated_lessons ORDER BY position LIMIT ?1",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(format!("Lesson list: {e}")))?;

        rows.iter()
            .map(|row| {
                Ok(AuxiliaryItem {
                    title: row
                        .try_get("title")
                        .map_err(|e| StoreError::QueryFailed(format!("title column: {e}")))?,
                    group_name: row
                        .try_get("group_name")
                        .map_err(|e| StoreError::QueryFailed(format!("group_name column: {e}")))?,
                })
            })
            .collect()
    }
}
