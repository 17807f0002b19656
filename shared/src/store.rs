//! SQLite connection handling and schema bootstrap.

use std::{path::Path, str::FromStr};

use anyhow::{Context, Result};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};

/// Tables created by [`BlogStore::ensure_schema`], in dependency order.
pub const BLOG_TABLE_NAMES: &[&str] = &[
    "users",
    "articles",
    "genres",
    "article_genres",
    "comments",
    "visitors",
    "article_views",
];

const SCHEMA_STATEMENTS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        email TEXT UNIQUE,
        created_at INTEGER NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS articles (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        content TEXT NOT NULL,
        thumbnail TEXT,
        author_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        total_views INTEGER NOT NULL DEFAULT 0,
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL,
        search_text TEXT NOT NULL DEFAULT ''
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS genres (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS article_genres (
        article_id INTEGER NOT NULL REFERENCES articles(id) ON DELETE CASCADE,
        genre_id INTEGER NOT NULL REFERENCES genres(id) ON DELETE CASCADE,
        PRIMARY KEY (article_id, genre_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS comments (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        article_id INTEGER NOT NULL REFERENCES articles(id) ON DELETE CASCADE,
        user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        content TEXT NOT NULL,
        created_at INTEGER NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS visitors (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        ip_address TEXT NOT NULL UNIQUE,
        first_seen_at INTEGER NOT NULL,
        last_seen_at INTEGER NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS article_views (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        visitor_id INTEGER NOT NULL REFERENCES visitors(id) ON DELETE CASCADE,
        article_id INTEGER NOT NULL REFERENCES articles(id) ON DELETE CASCADE,
        viewed_at INTEGER NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_articles_created_at ON articles(created_at DESC)",
    "CREATE INDEX IF NOT EXISTS idx_articles_total_views ON articles(total_views DESC)",
    "CREATE INDEX IF NOT EXISTS idx_articles_author ON articles(author_id)",
    "CREATE INDEX IF NOT EXISTS idx_article_genres_genre ON article_genres(genre_id)",
    "CREATE INDEX IF NOT EXISTS idx_comments_article ON comments(article_id)",
    "CREATE INDEX IF NOT EXISTS idx_article_views_article ON article_views(article_id)",
];

/// Handle to the relational store. Cloning is cheap and shares the pool.
#[derive(Clone, Debug)]
pub struct BlogStore {
    pool: SqlitePool,
}

impl BlogStore {
    /// Open (or create) the database at `db_uri` and make sure every table exists.
    ///
    /// In-memory databases are pinned to a single long-lived connection,
    /// otherwise the data would vanish with the first recycled connection.
    pub async fn connect(db_uri: &str, max_connections: u32) -> Result<Self> {
        let in_memory = is_in_memory(db_uri);
        if !in_memory {
            ensure_parent_dir(db_uri)?;
        }

        let options = SqliteConnectOptions::from_str(db_uri)
            .with_context(|| format!("invalid database url {db_uri}"))?
            .create_if_missing(true)
            .foreign_keys(true);

        let mut pool_options = SqlitePoolOptions::new();
        if in_memory {
            pool_options = pool_options
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        } else {
            pool_options = pool_options.max_connections(max_connections.max(1));
        }

        let pool = pool_options
            .connect_with(options)
            .await
            .with_context(|| format!("failed to connect to {db_uri}"))?;

        let store = Self::from_pool(pool);
        store.ensure_schema().await?;
        tracing::info!("connected to blog store at {db_uri}");
        Ok(store)
    }

    /// Wrap an already configured pool. The schema is not touched.
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Idempotently create every table and index.
    pub async fn ensure_schema(&self) -> Result<()> {
        for statement in SCHEMA_STATEMENTS {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .with_context(|| format!("failed to apply schema statement: {}", statement.trim()))?;
        }
        self.ensure_search_text_column().await
    }

    /// Databases created before `articles.search_text` existed get the column
    /// added and filled from the stored title and content.
    async fn ensure_search_text_column(&self) -> Result<()> {
        let present: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM pragma_table_info('articles') WHERE name = 'search_text'",
        )
        .fetch_one(&self.pool)
        .await
        .context("failed to inspect articles columns")?;
        if present > 0 {
            return Ok(());
        }

        let mut tx = self.pool.begin().await.context("failed to begin transaction")?;
        sqlx::query("ALTER TABLE articles ADD COLUMN search_text TEXT NOT NULL DEFAULT ''")
            .execute(&mut *tx)
            .await
            .context("failed to add articles.search_text")?;

        let rows: Vec<(i64, String, String)> =
            sqlx::query_as("SELECT id, title, content FROM articles")
                .fetch_all(&mut *tx)
                .await
                .context("failed to load articles for search backfill")?;
        for (id, title, content) in &rows {
            sqlx::query("UPDATE articles SET search_text = ? WHERE id = ?")
                .bind(search_text(title, content))
                .bind(id)
                .execute(&mut *tx)
                .await
                .with_context(|| format!("failed to backfill search text of article {id}"))?;
        }
        tx.commit().await.context("failed to commit search backfill")?;

        tracing::info!(articles = rows.len(), "added articles.search_text");
        Ok(())
    }
}

/// Lowercased title and content, the haystack of free-text search.
///
/// Folded the same way as the search needle; SQLite `LOWER()` only folds ASCII.
pub(crate) fn search_text(title: &str, content: &str) -> String {
    let mut text = String::with_capacity(title.len() + content.len() + 1);
    text.push_str(title);
    text.push('\n');
    text.push_str(content);
    text.to_lowercase()
}

pub(crate) fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn is_in_memory(db_uri: &str) -> bool {
    db_uri.contains(":memory:") || db_uri.contains("mode=memory")
}

fn ensure_parent_dir(db_uri: &str) -> Result<()> {
    let path = db_uri
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:");
    let path = path.split('?').next().unwrap_or_default();
    if path.is_empty() {
        return Ok(());
    }
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use anyhow::Result;

    use sqlx::sqlite::SqlitePoolOptions;

    use super::{is_in_memory, search_text, BlogStore, BLOG_TABLE_NAMES};
    use crate::{ArticleFilter, PageRequest};

    #[test]
    fn detects_in_memory_urls() {
        assert!(is_in_memory("sqlite::memory:"));
        assert!(is_in_memory("sqlite://file:blog?mode=memory&cache=shared"));
        assert!(!is_in_memory("sqlite://data/pressroom.db"));
    }

    #[tokio::test]
    async fn ensure_schema_is_idempotent() -> Result<()> {
        let store = BlogStore::connect("sqlite::memory:", 1).await?;
        store.ensure_schema().await?;

        for table in BLOG_TABLE_NAMES {
            let found: Option<String> =
                sqlx::query_scalar("SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?")
                    .bind(*table)
                    .fetch_optional(store.pool())
                    .await?;
            assert_eq!(found.as_deref(), Some(*table));
        }
        Ok(())
    }

    #[test]
    fn search_text_folds_unicode() {
        assert_eq!(search_text("Über Café", "ÉTÉ"), "über café\nété");
    }

    #[tokio::test]
    async fn legacy_articles_table_gets_search_text() -> Result<()> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        sqlx::query("CREATE TABLE users (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT NOT NULL, email TEXT UNIQUE, created_at INTEGER NOT NULL)")
            .execute(&pool)
            .await?;
        sqlx::query(
            "CREATE TABLE articles (id INTEGER PRIMARY KEY AUTOINCREMENT, title TEXT NOT NULL, \
             content TEXT NOT NULL, thumbnail TEXT, author_id INTEGER NOT NULL, \
             total_views INTEGER NOT NULL DEFAULT 0, created_at INTEGER NOT NULL, updated_at INTEGER NOT NULL)",
        )
        .execute(&pool)
        .await?;
        sqlx::query("INSERT INTO users (name, created_at) VALUES ('Ada', 0)")
            .execute(&pool)
            .await?;
        sqlx::query(
            "INSERT INTO articles (title, content, author_id, created_at, updated_at) \
             VALUES ('Ärger im Büro', 'Text', 1, 0, 0)",
        )
        .execute(&pool)
        .await?;

        let store = BlogStore::from_pool(pool);
        store.ensure_schema().await?;
        store.ensure_schema().await?;

        let filter = ArticleFilter {
            query: Some("ÄRGER".to_string()),
            ..ArticleFilter::default()
        };
        let found = store.list_articles(&filter, PageRequest::default()).await?;
        assert_eq!(found.total, 1);
        Ok(())
    }

    #[tokio::test]
    async fn file_database_creates_parent_directory() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let db_path = dir.path().join("nested").join("blog.db");
        let db_uri = format!("sqlite://{}", db_path.display());

        let store = BlogStore::connect(&db_uri, 2).await?;
        store.ensure_schema().await?;
        assert!(db_path.exists());
        Ok(())
    }
}
