use anyhow::{bail, Result};
use chrono::{Duration, Utc};
use fake::{
    faker::lorem::en::{Paragraphs, Sentence},
    Fake,
};
use pressroom_shared::{BlogStore, ImportedArticle};
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};

pub const GENRE_NAMES: &[&str] = &[
    "Top",
    "Today",
    "Bangladesh",
    "International",
    "Technology",
    "Science",
    "Politics",
    "Sports",
    "Entertainment",
    "Health",
    "Business",
    "Recommended",
    "Lifestyle",
    "Education",
    "Environment",
    "Fashion",
    "Food",
    "Travel",
];

const MAX_SEEDED_VIEWS: i64 = 10_000;
const PARAGRAPHS_PER_ARTICLE: usize = 10;
const TITLE_WORDS: std::ops::Range<usize> = 4..11;

pub async fn run(store: &BlogStore, count: usize, batch_size: usize, seed: Option<u64>) -> Result<()> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let created = seed_articles(store, &mut rng, count, batch_size).await?;
    tracing::info!("{created} fake articles created");
    Ok(())
}

/// Insert `count` random articles, `batch_size` per transaction.
pub async fn seed_articles<R: Rng>(
    store: &BlogStore,
    rng: &mut R,
    count: usize,
    batch_size: usize,
) -> Result<usize> {
    let author_ids: Vec<i64> = store.list_users().await?.iter().map(|user| user.id).collect();
    if author_ids.is_empty() {
        bail!("no users found; add one with `pressroom add-user` first");
    }

    let mut genre_ids = Vec::with_capacity(GENRE_NAMES.len());
    for name in GENRE_NAMES {
        genre_ids.push(store.find_or_create_genre(name).await?.id);
    }

    let batch_size = batch_size.max(1);
    let total_batches = count.div_ceil(batch_size);
    let mut created = 0;
    for batch in 0..total_batches {
        tracing::info!("Processing batch {} of {}...", batch + 1, total_batches);
        let size = batch_size.min(count - created);
        let now_ms = Utc::now().timestamp_millis();
        let articles: Vec<ImportedArticle> = (0..size)
            .map(|_| fake_article(rng, &author_ids, &genre_ids, now_ms))
            .collect();
        created += store.import_articles(&articles).await?.len();
    }
    Ok(created)
}

/// One random article dated within the past year, with 1 to 3 genres.
pub fn fake_article<R: Rng>(
    rng: &mut R,
    author_ids: &[i64],
    genre_ids: &[i64],
    now_ms: i64,
) -> ImportedArticle {
    let created_at = now_ms - rng.gen_range(0..Duration::days(365).num_milliseconds());
    let updated_at = (now_ms - rng.gen_range(0..Duration::days(1).num_milliseconds())).max(created_at);
    let genre_count = rng.gen_range(1..=3).min(genre_ids.len());
    let mut genres: Vec<i64> = genre_ids.choose_multiple(rng, genre_count).copied().collect();
    genres.sort_unstable();

    let title: String = Sentence(TITLE_WORDS).fake_with_rng(rng);
    let paragraphs: Vec<String> =
        Paragraphs(PARAGRAPHS_PER_ARTICLE..PARAGRAPHS_PER_ARTICLE + 1).fake_with_rng(rng);
    ImportedArticle {
        content: paragraphs.join("\n\n"),
        thumbnail: Some(format!(
            "https://picsum.photos/seed/{}/640/480",
            rng.gen_range(1..=100_000)
        )),
        author_id: author_ids.choose(rng).copied().unwrap_or_default(),
        total_views: rng.gen_range(0..=MAX_SEEDED_VIEWS),
        created_at,
        updated_at,
        genre_ids: genres,
        title,
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use pressroom_shared::{ArticleFilter, BlogStore, PageRequest};
    use rand::{rngs::StdRng, SeedableRng};

    use super::{fake_article, seed_articles, GENRE_NAMES, MAX_SEEDED_VIEWS, PARAGRAPHS_PER_ARTICLE};

    #[test]
    fn fake_articles_respect_ranges() {
        let mut rng = StdRng::seed_from_u64(42);
        let now = 1_700_000_000_000;
        for _ in 0..50 {
            let article = fake_article(&mut rng, &[7, 8], &[1, 2, 3, 4], now);
            assert!((1..=3).contains(&article.genre_ids.len()));
            assert!(article.genre_ids.windows(2).all(|pair| pair[0] < pair[1]));
            assert!([7, 8].contains(&article.author_id));
            assert!((0..=MAX_SEEDED_VIEWS).contains(&article.total_views));
            assert!(article.created_at <= article.updated_at);
            assert!(article.updated_at <= now);
            assert!(!article.title.trim().is_empty());
            assert_eq!(article.content.split("\n\n").count(), PARAGRAPHS_PER_ARTICLE);
        }
    }

    #[test]
    fn same_seed_gives_same_articles() {
        let now = 1_700_000_000_000;
        let mut first = StdRng::seed_from_u64(9);
        let mut second = StdRng::seed_from_u64(9);
        for _ in 0..5 {
            assert_eq!(
                fake_article(&mut first, &[1], &[1, 2, 3], now),
                fake_article(&mut second, &[1], &[1, 2, 3], now)
            );
        }
    }

    #[tokio::test]
    async fn seeding_requires_users() -> Result<()> {
        let store = BlogStore::connect("sqlite::memory:", 1).await?;
        let mut rng = StdRng::seed_from_u64(1);
        assert!(seed_articles(&store, &mut rng, 5, 2).await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn seeding_fills_batches_and_genres() -> Result<()> {
        let store = BlogStore::connect("sqlite::memory:", 1).await?;
        store.create_user("Ada", None).await?;
        let mut rng = StdRng::seed_from_u64(1);

        assert_eq!(seed_articles(&store, &mut rng, 7, 3).await?, 7);

        let genres = store.list_genres().await?;
        assert_eq!(genres.len(), GENRE_NAMES.len());
        let page = store
            .list_articles(&ArticleFilter::default(), PageRequest::new(Some(1), Some(20)))
            .await?;
        assert_eq!(page.total, 7);
        assert!(page.articles.iter().all(|article| !article.genres.is_empty()));
        Ok(())
    }
}
