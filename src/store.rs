//! The `articles` table of enhanced articles.
//!
//! One row per link. Enhancing an article again updates its row in place
//! and bumps `updated_at`; `created_at` never changes. The review columns
//! (`validation_status`, `validation_comment`, `relevance`) are only
//! written by the validator and by people, never by an upsert.

use crate::error::StoreError;
use crate::models::{EnhancedArticle, StoredArticle};
use chrono::Utc;
use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use std::path::Path;
use tracing::{debug, info, instrument};

const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS articles (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        date TEXT,
        link TEXT UNIQUE NOT NULL,
        description TEXT,
        source TEXT,
        main_ideas TEXT,
        tags TEXT,
        original_text TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_link ON articles(link)",
    "CREATE INDEX IF NOT EXISTS idx_source ON articles(source)",
];

/// Review columns added to databases created before validation existed.
const REVIEW_COLUMNS: &[(&str, &str)] = &[
    ("validation_status", "INTEGER DEFAULT NULL"),
    ("validation_comment", "TEXT DEFAULT NULL"),
    ("relevance", "INTEGER DEFAULT NULL"),
];

const COLUMNS: &str = "id, title, date, link, description, source, main_ideas, tags, original_text, \
    created_at, updated_at, validation_status, validation_comment, relevance";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

#[derive(Debug, Clone)]
pub struct ArticleStore {
    pool: SqlitePool,
}

fn now() -> String {
    Utc::now().format("%Y-%m-%d %H:%M:%S%.3f").to_string()
}

fn string_list(raw: Option<String>) -> Result<Vec<String>, StoreError> {
    match raw.filter(|s| !s.trim().is_empty()) {
        Some(s) => Ok(serde_json::from_str(&s)?),
        None => Ok(Vec::new()),
    }
}

fn from_row(row: &SqliteRow) -> Result<StoredArticle, StoreError> {
    Ok(StoredArticle {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        date: row.try_get("date")?,
        link: row.try_get("link")?,
        description: row.try_get("description")?,
        source: row.try_get("source")?,
        main_ideas: string_list(row.try_get("main_ideas")?)?,
        tags: string_list(row.try_get("tags")?)?,
        original_text: row.try_get("original_text")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        validation_status: row.try_get("validation_status")?,
        validation_comment: row.try_get("validation_comment")?,
        relevance: row.try_get("relevance")?,
    })
}

impl ArticleStore {
    /// Open the database at `path`, creating the file and schema if needed.
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|source| StoreError::Path {
                path: dir.display().to_string(),
                source,
            })?;
        }
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;
        let store = Self { pool };
        store.init().await?;
        info!("Opened article database");
        Ok(store)
    }

    async fn init(&self) -> Result<(), StoreError> {
        for migration in MIGRATIONS {
            sqlx::query(migration).execute(&self.pool).await?;
        }
        let existing: Vec<String> = sqlx::query_scalar("SELECT name FROM pragma_table_info('articles')")
            .fetch_all(&self.pool)
            .await?;
        for (name, definition) in REVIEW_COLUMNS {
            if !existing.iter().any(|c| c == name) {
                sqlx::query(&format!("ALTER TABLE articles ADD COLUMN {name} {definition}"))
                    .execute(&self.pool)
                    .await?;
                info!(column = name, "Added review column");
            }
        }
        Ok(())
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<StoredArticle>, StoreError> {
        let row = sqlx::query(&format!("SELECT {COLUMNS} FROM articles WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(from_row).transpose()
    }

    /// Rows still lacking a validation verdict, by id.
    pub async fn unvalidated(&self) -> Result<Vec<StoredArticle>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {COLUMNS} FROM articles WHERE validation_status IS NULL ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(from_row).collect()
    }

    /// Record a validation verdict. `relevance` is left alone.
    pub async fn set_validation(&self, id: i64, valid: bool, comment: &str) -> Result<(), StoreError> {
        sqlx::query("UPDATE articles SET validation_status = ?1, validation_comment = ?2 WHERE id = ?3")
            .bind(i64::from(valid))
            .bind(comment)
            .bind(id)
            .execute(&self.pool)
            .await?;
        debug!(id, valid, "Saved validation");
        Ok(())
    }

    pub async fn find_by_link(&self, link: &str) -> Result<Option<StoredArticle>, StoreError> {
        let row = sqlx::query(&format!("SELECT {COLUMNS} FROM articles WHERE link = ?"))
            .bind(link)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(from_row).transpose()
    }

    /// Insert the article, or overwrite the row that already has its link.
    pub async fn upsert(&self, article: &EnhancedArticle) -> Result<UpsertOutcome, StoreError> {
        let unified = &article.article;
        // IBM listings carry teaser text that is not a description.
        let description = if unified.source.eq_ignore_ascii_case("ibm") {
            Some(String::new())
        } else {
            unified.description.clone()
        };
        let main_ideas = serde_json::to_string(&article.main_ideas)?;
        let tags = serde_json::to_string(&article.tags)?;
        let stamp = now();

        let mut tx = self.pool.begin().await?;
        let existing: Option<i64> = sqlx::query_scalar("SELECT id FROM articles WHERE link = ?")
            .bind(&unified.link)
            .fetch_optional(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO articles
                (title, date, link, description, source, main_ideas, tags, original_text, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)
            ON CONFLICT(link) DO UPDATE SET
                title = excluded.title,
                date = excluded.date,
                description = excluded.description,
                source = excluded.source,
                main_ideas = excluded.main_ideas,
                tags = excluded.tags,
                original_text = excluded.original_text,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&unified.title)
        .bind(&unified.date)
        .bind(&unified.link)
        .bind(description)
        .bind(&unified.source)
        .bind(main_ideas)
        .bind(tags)
        .bind(&article.original_text)
        .bind(stamp)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        let outcome = match existing {
            Some(_) => UpsertOutcome::Updated,
            None => UpsertOutcome::Inserted,
        };
        debug!(link = %unified.link, ?outcome, "Saved article");
        Ok(outcome)
    }

    pub async fn count(&self) -> Result<i64, StoreError> {
        Ok(sqlx::query_scalar("SELECT COUNT(*) FROM articles")
            .fetch_one(&self.pool)
            .await?)
    }

    pub async fn all(&self) -> Result<Vec<StoredArticle>, StoreError> {
        let rows = sqlx::query(&format!("SELECT {COLUMNS} FROM articles ORDER BY id"))
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(from_row).collect()
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Article, ArticleType, UnifiedArticle};

    fn enhanced(source: &str, link: &str, ideas: &[&str]) -> EnhancedArticle {
        let article = Article::new("Title", "2025-11-03", link)
            .with_description(Some("Teaser".to_string()));
        let mut e = EnhancedArticle::bare(UnifiedArticle::from_article(article, source, ArticleType::News));
        e.main_ideas = ideas.iter().map(|s| s.to_string()).collect();
        e.tags = vec!["5g".to_string()];
        e.original_text = "Body".to_string();
        e
    }

    #[tokio::test]
    async fn creates_file_and_schema() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("articles.db");
        let store = ArticleStore::open(&path).await.unwrap();
        assert!(path.exists());
        assert_eq!(store.count().await.unwrap(), 0);
        assert_eq!(store.find_by_link("https://x.test").await.unwrap(), None);
    }

    #[tokio::test]
    async fn second_upsert_updates_the_same_row() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArticleStore::open(&dir.path().join("a.db")).await.unwrap();

        let first = enhanced("Nokia", "https://nokia.com/n/1", &["first"]);
        assert_eq!(store.upsert(&first).await.unwrap(), UpsertOutcome::Inserted);
        let before = store.find_by_link("https://nokia.com/n/1").await.unwrap().unwrap();

        let second = enhanced("Nokia", "https://nokia.com/n/1", &["second", "third"]);
        assert_eq!(store.upsert(&second).await.unwrap(), UpsertOutcome::Updated);

        assert_eq!(store.count().await.unwrap(), 1);
        let row = store.find_by_link("https://nokia.com/n/1").await.unwrap().unwrap();
        assert_eq!(row.id, before.id);
        assert_eq!(row.main_ideas, ["second", "third"]);
        assert_eq!(row.tags, ["5g"]);
        assert_eq!(row.description.as_deref(), Some("Teaser"));
        assert_eq!(row.created_at, before.created_at);
        assert!(row.updated_at >= before.updated_at);
        assert!(row.is_complete());
    }

    #[tokio::test]
    async fn review_columns_are_added_to_older_databases() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("old.db");
        {
            let options = SqliteConnectOptions::new().filename(&path).create_if_missing(true);
            let pool = SqlitePoolOptions::new().connect_with(options).await.unwrap();
            sqlx::query(MIGRATIONS[0]).execute(&pool).await.unwrap();
            sqlx::query(
                "INSERT INTO articles (title, link, created_at, updated_at) VALUES ('Old', 'https://x.test/old', 'a', 'a')",
            )
            .execute(&pool)
            .await
            .unwrap();
            pool.close().await;
        }

        let store = ArticleStore::open(&path).await.unwrap();
        store.close().await;
        let store = ArticleStore::open(&path).await.unwrap();
        let row = store.find_by_link("https://x.test/old").await.unwrap().unwrap();
        assert_eq!(row.validation_status, None);
        assert_eq!(row.relevance, None);
        assert_eq!(store.unvalidated().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn validation_verdicts_survive_reenhancement() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArticleStore::open(&dir.path().join("a.db")).await.unwrap();
        store.upsert(&enhanced("Nokia", "https://nokia.com/n/1", &["idea"])).await.unwrap();
        store.upsert(&enhanced("Nokia", "https://nokia.com/n/2", &["idea"])).await.unwrap();
        let first = store.find_by_link("https://nokia.com/n/1").await.unwrap().unwrap();

        store.set_validation(first.id, false, "No tags").await.unwrap();
        store.upsert(&enhanced("Nokia", "https://nokia.com/n/1", &["newer"])).await.unwrap();

        let row = store.find_by_id(first.id).await.unwrap().unwrap();
        assert_eq!(row.validation_status, Some(0));
        assert_eq!(row.validation_comment.as_deref(), Some("No tags"));
        assert_eq!(row.main_ideas, ["newer"]);
        let pending: Vec<_> = store.unvalidated().await.unwrap().into_iter().map(|r| r.link).collect();
        assert_eq!(pending, ["https://nokia.com/n/2"]);
        assert_eq!(store.find_by_id(999).await.unwrap(), None);
    }

    #[tokio::test]
    async fn ibm_rows_have_empty_description() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArticleStore::open(&dir.path().join("a.db")).await.unwrap();
        store.upsert(&enhanced("Ibm", "https://ibm.com/n/1", &[])).await.unwrap();
        store.upsert(&enhanced("Hpe", "https://hpe.com/n/1", &[])).await.unwrap();

        let rows = store.all().await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].description.as_deref(), Some(""));
        assert_eq!(rows[1].source.as_deref(), Some("Hpe"));
        assert!(rows[1].has_text());
        assert!(!rows[1].is_complete());
    }
}
