//! Popularity and genre-overlap rankings.
//!
//! Both rankings order by `total_views DESC, created_at DESC, id DESC` and run
//! uncached against the store on every call.

use anyhow::Result;

use crate::{
    article_store::{ArticleConditions, ArticleOrder},
    pagination::{clamp_limit, PageRequest},
    store::BlogStore,
    Article, ArticlePage,
};

/// Cap of the related-articles list when the caller does not pass one.
pub const DEFAULT_RELATED_LIMIT: i64 = 5;

impl BlogStore {
    /// Global popularity ranking, optionally skipping one article.
    pub async fn recommended_articles(
        &self,
        page: PageRequest,
        exclude_id: Option<i64>,
    ) -> Result<ArticlePage> {
        let conditions = ArticleConditions {
            exclude_id,
            ..ArticleConditions::default()
        };

        let total = self.count_articles(&conditions).await?;
        let articles = self
            .select_articles(&conditions, ArticleOrder::MostViewed, page.limit(), page.offset())
            .await?;

        Ok(ArticlePage {
            articles,
            total,
            page,
        })
    }

    /// Articles sharing at least one genre with `article_id`, most viewed first.
    ///
    /// An unknown reference article yields an empty list, not an error.
    pub async fn related_articles(&self, article_id: i64, limit: Option<i64>) -> Result<Vec<Article>> {
        let Some(genre_ids) = self.article_genre_ids(article_id).await? else {
            tracing::debug!(article_id, "related lookup for unknown article");
            return Ok(Vec::new());
        };
        if genre_ids.is_empty() {
            return Ok(Vec::new());
        }

        let conditions = ArticleConditions {
            exclude_id: Some(article_id),
            genre_sets: vec![genre_ids],
            ..ArticleConditions::default()
        };
        let limit = clamp_limit(limit, DEFAULT_RELATED_LIMIT);
        self.select_articles(&conditions, ArticleOrder::MostViewed, limit, 0)
            .await
    }
}
