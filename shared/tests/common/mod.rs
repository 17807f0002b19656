#![allow(dead_code, reason = "each test binary uses a subset of the helpers")]

use anyhow::Result;
use pressroom_shared::{Article, BlogStore, Genre, NewArticle, User};

pub async fn memory_store() -> Result<BlogStore> {
    BlogStore::connect("sqlite::memory:", 1).await
}

pub async fn author(store: &BlogStore, name: &str) -> Result<User> {
    store.create_user(name, None).await
}

pub async fn genre(store: &BlogStore, name: &str) -> Result<Genre> {
    store.find_or_create_genre(name).await
}

pub async fn article(
    store: &BlogStore,
    author_id: i64,
    title: &str,
    genres: &[&Genre],
) -> Result<Article> {
    let genre_ids: Vec<i64> = genres.iter().map(|genre| genre.id).collect();
    store
        .create_article(
            NewArticle {
                title: title.to_string(),
                content: format!("Body of {title}"),
                thumbnail: None,
                author_id,
            },
            Some(&genre_ids),
        )
        .await
}

pub fn ids(articles: &[Article]) -> Vec<i64> {
    articles.iter().map(|article| article.id).collect()
}
