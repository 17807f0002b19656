//! Domain types and the relational store shared by the Pressroom backend and CLI.

pub mod article_store;
pub mod comment_store;
pub mod genre_store;
pub mod pagination;
pub mod recommendations;
pub mod store;
pub mod user_store;
pub mod view_tracker;

use serde::{Deserialize, Serialize};

pub use article_store::{ArticleChanges, ArticleFilter, ImportedArticle, NewArticle};
pub use genre_store::{parse_genre_ids, GenreIdsError};
pub use pagination::PageRequest;
pub use store::BlogStore;

/// Author fields embedded in article and comment payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorSummary {
    /// User id.
    pub id: i64,
    /// Display name.
    pub name: String,
}

/// A tag/category attachable to many articles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Genre {
    /// Genre id.
    pub id: i64,
    /// Unique name.
    pub name: String,
}

/// A genre with the number of articles linked to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct GenreWithCount {
    /// Genre id.
    pub id: i64,
    /// Unique name.
    pub name: String,
    /// Linked articles.
    pub article_count: i64,
}

// 完整文章数据模型（含作者与分类）
/// An article with its author and genres, as served by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    /// Article id.
    pub id: i64,
    /// Headline.
    pub title: String,
    /// Body text.
    pub content: String,
    /// Public URL of the cover image.
    pub thumbnail: Option<String>,
    /// Writing user.
    pub author_id: i64,
    /// Writing user's public fields.
    pub author: AuthorSummary,
    /// Full genre set, sorted by name.
    pub genres: Vec<Genre>,
    /// Detail fetches so far.
    pub total_views: i64,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds.
    pub updated_at: i64,
}

impl Article {
    /// Ids of [`Article::genres`], in the same order.
    pub fn genre_ids(&self) -> Vec<i64> {
        self.genres.iter().map(|genre| genre.id).collect()
    }
}

/// One page of articles plus the unpaginated match count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticlePage {
    /// Rows of this page.
    pub articles: Vec<Article>,
    /// Matches across all pages.
    pub total: i64,
    /// The request that produced this page.
    pub page: PageRequest,
}

impl ArticlePage {
    /// Pages needed for [`ArticlePage::total`] rows.
    pub fn total_pages(&self) -> i64 {
        self.page.total_pages(self.total)
    }
}

/// A reader comment on an article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    /// Comment id.
    pub id: i64,
    /// Commented article.
    pub article_id: i64,
    /// Commenting user.
    pub author: AuthorSummary,
    /// Trimmed text.
    pub content: String,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

/// A registered user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// User id.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Optional unique email.
    pub email: Option<String>,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}
