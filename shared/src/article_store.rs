//! Article CRUD and the filtered, paginated listing query.
//!
//! Every read goes through `ArticleConditions` so the listing, the
//! recommendation queries and the row count share one filter builder.

use std::collections::HashMap;

use anyhow::{Context, Result};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use crate::{
    pagination::PageRequest,
    store::{now_ms, search_text, BlogStore},
    Article, ArticlePage, AuthorSummary, Genre,
};

const ARTICLE_SELECT: &str = "SELECT a.id, a.title, a.content, a.thumbnail, a.author_id, \
     u.name AS author_name, a.total_views, a.created_at, a.updated_at \
     FROM articles a JOIN users u ON u.id = a.author_id";

/// Optional filters of the article listing. All set fields must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleFilter {
    /// Keep articles linked to at least one of these genres. Empty means no filter.
    pub genre_ids: Vec<i64>,
    /// Keep only articles written by this user.
    pub author_id: Option<i64>,
    /// Case-insensitive substring matched against title or content.
    pub query: Option<String>,
    /// Exclude this article and keep only articles sharing one of its genres.
    /// Ignored when the article does not exist.
    pub similar_to: Option<i64>,
}

/// Fields of an article created through the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewArticle {
    /// Headline.
    pub title: String,
    /// Body text.
    pub content: String,
    /// Public URL of the cover image.
    pub thumbnail: Option<String>,
    /// Writing user.
    pub author_id: i64,
}

/// Partial update: `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleChanges {
    /// New headline.
    pub title: Option<String>,
    /// New body text.
    pub content: Option<String>,
    /// New cover image URL.
    pub thumbnail: Option<String>,
}

/// A fully specified article row, used by bulk imports and seeding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedArticle {
    /// Headline.
    pub title: String,
    /// Body text.
    pub content: String,
    /// Cover image URL.
    pub thumbnail: Option<String>,
    /// Writing user; must exist.
    pub author_id: i64,
    /// Initial view counter. Negative values are stored as 0.
    pub total_views: i64,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds.
    pub updated_at: i64,
    /// Genres to link; unknown ids are skipped.
    pub genre_ids: Vec<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ArticleOrder {
    Newest,
    MostViewed,
}

impl ArticleOrder {
    fn sql(self) -> &'static str {
        match self {
            ArticleOrder::Newest => " ORDER BY a.created_at DESC, a.id DESC",
            ArticleOrder::MostViewed => {
                " ORDER BY a.total_views DESC, a.created_at DESC, a.id DESC"
            },
        }
    }
}

/// Conjunctive WHERE clause over the `articles a` alias.
#[derive(Debug, Clone, Default)]
pub(crate) struct ArticleConditions {
    pub(crate) pattern: Option<String>,
    pub(crate) author_id: Option<i64>,
    pub(crate) exclude_id: Option<i64>,
    /// Each set becomes its own `EXISTS` join constraint; an empty set matches nothing.
    pub(crate) genre_sets: Vec<Vec<i64>>,
}

impl ArticleConditions {
    fn push_where<'args>(&self, qb: &mut QueryBuilder<'args, Sqlite>) {
        qb.push(" WHERE 1 = 1");

        if let Some(pattern) = &self.pattern {
            qb.push(" AND a.search_text LIKE ");
            qb.push_bind(pattern.clone());
            qb.push(" ESCAPE '\\'");
        }

        if let Some(author_id) = self.author_id {
            qb.push(" AND a.author_id = ");
            qb.push_bind(author_id);
        }

        if let Some(exclude_id) = self.exclude_id {
            qb.push(" AND a.id != ");
            qb.push_bind(exclude_id);
        }

        for genre_ids in &self.genre_sets {
            if genre_ids.is_empty() {
                qb.push(" AND 1 = 0");
                continue;
            }
            qb.push(
                " AND EXISTS (SELECT 1 FROM article_genres ag \
                 WHERE ag.article_id = a.id AND ag.genre_id IN (",
            );
            let mut ids = qb.separated(", ");
            for genre_id in genre_ids {
                ids.push_bind(*genre_id);
            }
            ids.push_unseparated("))");
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ArticleRow {
    id: i64,
    title: String,
    content: String,
    thumbnail: Option<String>,
    author_id: i64,
    author_name: String,
    total_views: i64,
    created_at: i64,
    updated_at: i64,
}

impl ArticleRow {
    fn into_article(self, genres: Vec<Genre>) -> Article {
        Article {
            id: self.id,
            title: self.title,
            content: self.content,
            thumbnail: self.thumbnail,
            author_id: self.author_id,
            author: AuthorSummary {
                id: self.author_id,
                name: self.author_name,
            },
            genres,
            total_views: self.total_views,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl BlogStore {
    /// Newest-first page of articles matching `filter`.
    pub async fn list_articles(&self, filter: &ArticleFilter, page: PageRequest) -> Result<ArticlePage> {
        let mut conditions = ArticleConditions {
            pattern: filter.query.as_deref().and_then(like_pattern),
            author_id: filter.author_id,
            ..ArticleConditions::default()
        };
        if !filter.genre_ids.is_empty() {
            conditions.genre_sets.push(filter.genre_ids.clone());
        }
        if let Some(reference_id) = filter.similar_to {
            match self.article_genre_ids(reference_id).await? {
                Some(genre_ids) => {
                    conditions.exclude_id = Some(reference_id);
                    conditions.genre_sets.push(genre_ids);
                },
                None => {
                    tracing::debug!(reference_id, "similar-to article not found, filter ignored");
                },
            }
        }

        let total = self.count_articles(&conditions).await?;
        let articles = self
            .select_articles(&conditions, ArticleOrder::Newest, page.limit(), page.offset())
            .await?;

        Ok(ArticlePage {
            articles,
            total,
            page,
        })
    }

    /// One article with its author and genres.
    pub async fn get_article(&self, id: i64) -> Result<Option<Article>> {
        let sql = format!("{ARTICLE_SELECT} WHERE a.id = ?");
        let row = sqlx::query_as::<_, ArticleRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .with_context(|| format!("failed to load article {id}"))?;

        match row {
            Some(row) => Ok(self.attach_genres(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    /// Genre ids of an article, or `None` when the article does not exist.
    pub async fn article_genre_ids(&self, id: i64) -> Result<Option<Vec<i64>>> {
        let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM articles WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .with_context(|| format!("failed to look up article {id}"))?;
        if exists.is_none() {
            return Ok(None);
        }

        let genre_ids: Vec<i64> = sqlx::query_scalar(
            "SELECT genre_id FROM article_genres WHERE article_id = ? ORDER BY genre_id",
        )
        .bind(id)
        .fetch_all(self.pool())
        .await
        .with_context(|| format!("failed to load genres of article {id}"))?;
        Ok(Some(genre_ids))
    }

    /// Insert an article. When `genre_ids` is given, every existing genre in it is linked;
    /// unknown ids are skipped.
    pub async fn create_article(&self, input: NewArticle, genre_ids: Option<&[i64]>) -> Result<Article> {
        let now = now_ms();
        let mut tx = self.pool().begin().await.context("failed to begin transaction")?;

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO articles (title, content, thumbnail, author_id, total_views, created_at, updated_at, search_text) \
             VALUES (?, ?, ?, ?, 0, ?, ?, ?) RETURNING id",
        )
        .bind(&input.title)
        .bind(&input.content)
        .bind(&input.thumbnail)
        .bind(input.author_id)
        .bind(now)
        .bind(now)
        .bind(search_text(&input.title, &input.content))
        .fetch_one(&mut *tx)
        .await
        .context("failed to insert article")?;

        if let Some(genre_ids) = genre_ids {
            link_genres(&mut tx, id, genre_ids).await?;
        }
        tx.commit().await.context("failed to commit new article")?;

        tracing::debug!(article_id = id, author_id = input.author_id, "inserted article");
        self.get_article(id)
            .await?
            .with_context(|| format!("article {id} missing right after insert"))
    }

    /// Apply `changes`; `Some(genre_ids)` replaces the whole genre set.
    /// Returns `None` when the article does not exist.
    pub async fn update_article(
        &self,
        id: i64,
        changes: ArticleChanges,
        genre_ids: Option<&[i64]>,
    ) -> Result<Option<Article>> {
        let mut tx = self.pool().begin().await.context("failed to begin transaction")?;

        let updated = sqlx::query(
            "UPDATE articles SET title = COALESCE(?, title), content = COALESCE(?, content), \
             thumbnail = COALESCE(?, thumbnail), updated_at = ? WHERE id = ?",
        )
        .bind(&changes.title)
        .bind(&changes.content)
        .bind(&changes.thumbnail)
        .bind(now_ms())
        .bind(id)
        .execute(&mut *tx)
        .await
        .with_context(|| format!("failed to update article {id}"))?;

        if updated.rows_affected() == 0 {
            return Ok(None);
        }

        if changes.title.is_some() || changes.content.is_some() {
            let (title, content): (String, String) =
                sqlx::query_as("SELECT title, content FROM articles WHERE id = ?")
                    .bind(id)
                    .fetch_one(&mut *tx)
                    .await
                    .with_context(|| format!("failed to reload article {id}"))?;
            sqlx::query("UPDATE articles SET search_text = ? WHERE id = ?")
                .bind(search_text(&title, &content))
                .bind(id)
                .execute(&mut *tx)
                .await
                .with_context(|| format!("failed to refresh search text of article {id}"))?;
        }

        if let Some(genre_ids) = genre_ids {
            sqlx::query("DELETE FROM article_genres WHERE article_id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await
                .with_context(|| format!("failed to clear genres of article {id}"))?;
            link_genres(&mut tx, id, genre_ids).await?;
        }
        tx.commit().await.context("failed to commit article update")?;

        self.get_article(id).await
    }

    /// Hard delete. Comments, genre links and view events go with it.
    pub async fn delete_article(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM articles WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await
            .with_context(|| format!("failed to delete article {id}"))?;
        Ok(result.rows_affected() > 0)
    }

    /// Insert a batch of fully specified articles in one transaction.
    pub async fn import_articles(&self, batch: &[ImportedArticle]) -> Result<Vec<i64>> {
        let mut tx = self.pool().begin().await.context("failed to begin transaction")?;
        let mut ids = Vec::with_capacity(batch.len());

        for article in batch {
            let id: i64 = sqlx::query_scalar(
                "INSERT INTO articles (title, content, thumbnail, author_id, total_views, created_at, updated_at, search_text) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?) RETURNING id",
            )
            .bind(&article.title)
            .bind(&article.content)
            .bind(&article.thumbnail)
            .bind(article.author_id)
            .bind(article.total_views.max(0))
            .bind(article.created_at)
            .bind(article.updated_at)
            .bind(search_text(&article.title, &article.content))
            .fetch_one(&mut *tx)
            .await
            .context("failed to import article")?;
            link_genres(&mut tx, id, &article.genre_ids).await?;
            ids.push(id);
        }

        tx.commit().await.context("failed to commit article import")?;
        Ok(ids)
    }

    pub(crate) async fn count_articles(&self, conditions: &ArticleConditions) -> Result<i64> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM articles a");
        conditions.push_where(&mut qb);
        qb.build_query_scalar::<i64>()
            .fetch_one(self.pool())
            .await
            .context("failed to count articles")
    }

    pub(crate) async fn select_articles(
        &self,
        conditions: &ArticleConditions,
        order: ArticleOrder,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Article>> {
        let mut qb = QueryBuilder::<Sqlite>::new(ARTICLE_SELECT);
        conditions.push_where(&mut qb);
        qb.push(order.sql());
        qb.push(" LIMIT ");
        qb.push_bind(limit);
        qb.push(" OFFSET ");
        qb.push_bind(offset);

        let rows = qb
            .build_query_as::<ArticleRow>()
            .fetch_all(self.pool())
            .await
            .context("failed to select articles")?;
        self.attach_genres(rows).await
    }

    /// Load the genres of all `rows` in one query and assemble full articles.
    async fn attach_genres(&self, rows: Vec<ArticleRow>) -> Result<Vec<Article>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb = QueryBuilder::<Sqlite>::new(
            "SELECT ag.article_id, g.id, g.name FROM article_genres ag \
             JOIN genres g ON g.id = ag.genre_id WHERE ag.article_id IN (",
        );
        let mut ids = qb.separated(", ");
        for row in &rows {
            ids.push_bind(row.id);
        }
        ids.push_unseparated(") ORDER BY g.name, g.id");

        let links = qb
            .build_query_as::<(i64, i64, String)>()
            .fetch_all(self.pool())
            .await
            .context("failed to load article genres")?;

        let mut by_article: HashMap<i64, Vec<Genre>> = HashMap::new();
        for (article_id, id, name) in links {
            by_article.entry(article_id).or_default().push(Genre { id, name });
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let genres = by_article.remove(&row.id).unwrap_or_default();
                row.into_article(genres)
            })
            .collect())
    }
}

/// Link `article_id` to every genre in `genre_ids` that exists.
async fn link_genres(conn: &mut SqliteConnection, article_id: i64, genre_ids: &[i64]) -> Result<u64> {
    if genre_ids.is_empty() {
        return Ok(0);
    }

    let mut qb = QueryBuilder::<Sqlite>::new(
        "INSERT OR IGNORE INTO article_genres (article_id, genre_id) SELECT ",
    );
    qb.push_bind(article_id);
    qb.push(", g.id FROM genres g WHERE g.id IN (");
    let mut ids = qb.separated(", ");
    for genre_id in genre_ids {
        ids.push_bind(*genre_id);
    }
    ids.push_unseparated(")");

    let result = qb
        .build()
        .execute(conn)
        .await
        .with_context(|| format!("failed to link genres to article {article_id}"))?;
    Ok(result.rows_affected())
}

/// Lowercased `%needle%` with LIKE wildcards escaped; blank needles yield `None`.
pub(crate) fn like_pattern(query: &str) -> Option<String> {
    let needle = query.trim();
    if needle.is_empty() {
        return None;
    }
    let mut escaped = String::with_capacity(needle.len() + 2);
    escaped.push('%');
    for ch in needle.to_lowercase().chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    Some(escaped)
}

#[cfg(test)]
mod tests {
    use super::like_pattern;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("Rust"), Some("%rust%".to_string()));
        assert_eq!(like_pattern("100%_done"), Some("%100\\%\\_done%".to_string()));
        assert_eq!(like_pattern("   "), None);
    }
}
