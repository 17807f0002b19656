//! Integration tests for recommendations.

mod common;

use anyhow::Result;
use common::{article, author, genre, ids, memory_store};
use pressroom_shared::PageRequest;

#[tokio::test]
async fn related_follows_genre_overlap_and_views() -> Result<()> {
    let store = memory_store().await?;
    let ada = author(&store, "Ada").await?;
    let tech = genre(&store, "Tech").await?;
    let science = genre(&store, "Science").await?;
    let sports = genre(&store, "Sports").await?;

    let a = article(&store, ada.id, "A", &[&tech, &science]).await?;
    let b = article(&store, ada.id, "B", &[&science]).await?;
    let c = article(&store, ada.id, "C", &[&sports]).await?;
    let e = article(&store, ada.id, "E", &[&tech]).await?;
    store.increment_views(b.id, 3).await?;
    store.increment_views(c.id, 100).await?;
    store.increment_views(e.id, 10).await?;

    let related = store.related_articles(a.id, Some(5)).await?;
    assert_eq!(ids(&related), vec![e.id, b.id]);
    assert!(related.iter().all(|article| article.id != a.id && article.id != c.id));
    Ok(())
}

#[tokio::test]
async fn related_for_unknown_article_is_empty() -> Result<()> {
    let store = memory_store().await?;
    let ada = author(&store, "Ada").await?;
    let tech = genre(&store, "Tech").await?;
    article(&store, ada.id, "Lonely", &[&tech]).await?;

    assert!(store.related_articles(9_999, None).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn related_respects_limit_and_defaults_to_five() -> Result<()> {
    let store = memory_store().await?;
    let ada = author(&store, "Ada").await?;
    let tech = genre(&store, "Tech").await?;
    let reference = article(&store, ada.id, "Reference", &[&tech]).await?;
    store.increment_views(reference.id, 1_000).await?;
    for index in 0..8 {
        let sibling = article(&store, ada.id, &format!("Sibling {index}"), &[&tech]).await?;
        store.increment_views(sibling.id, index).await?;
    }

    let capped = store.related_articles(reference.id, Some(2)).await?;
    assert_eq!(capped.len(), 2);
    assert_eq!(capped[0].total_views, 7);

    let defaulted = store.related_articles(reference.id, None).await?;
    assert_eq!(defaulted.len(), 5);
    assert!(defaulted.iter().all(|article| article.id != reference.id));
    Ok(())
}

#[tokio::test]
async fn recommended_is_ordered_by_views_then_recency() -> Result<()> {
    let store = memory_store().await?;
    let ada = author(&store, "Ada").await?;
    let views = [5, 50, 0, 50, 20, 1];
    let mut created = Vec::new();
    for (index, count) in views.iter().enumerate() {
        let post = article(&store, ada.id, &format!("Post {index}"), &[]).await?;
        store.increment_views(post.id, *count).await?;
        created.push(post.id);
    }

    let page = store
        .recommended_articles(PageRequest::new(Some(1), Some(10)), None)
        .await?;
    assert_eq!(page.total, 6);
    assert!(page
        .articles
        .windows(2)
        .all(|pair| pair[0].total_views >= pair[1].total_views));
    // Equal view counts fall back to the newer article first.
    assert_eq!(page.articles[0].id, created[3]);
    assert_eq!(page.articles[1].id, created[1]);

    let excluded = store
        .recommended_articles(PageRequest::new(Some(1), Some(2)), Some(created[3]))
        .await?;
    assert_eq!(excluded.total, 5);
    assert_eq!(excluded.total_pages(), 3);
    assert_eq!(ids(&excluded.articles), vec![created[1], created[4]]);
    Ok(())
}

#[tokio::test]
async fn recommended_pages_past_the_end_are_empty() -> Result<()> {
    let store = memory_store().await?;
    let ada = author(&store, "Ada").await?;
    article(&store, ada.id, "Only", &[]).await?;

    let page = store
        .recommended_articles(PageRequest::new(Some(3), Some(10)), None)
        .await?;
    assert!(page.articles.is_empty());
    assert_eq!(page.total, 1);
    assert_eq!(page.total_pages(), 1);
    Ok(())
}
