use anyhow::{bail, Result};
use pressroom_shared::BlogStore;

pub async fn run(store: &BlogStore, name: &str) -> Result<()> {
    if name.trim().is_empty() {
        bail!("genre name must not be empty");
    }
    match store.create_genre(name).await? {
        Some(genre) => {
            tracing::info!(genre_id = genre.id, "Created genre {}", genre.name);
            println!("{}", genre.id);
        },
        None => {
            let genre = store.find_or_create_genre(name).await?;
            tracing::warn!(genre_id = genre.id, "Genre {} already exists", genre.name);
            println!("{}", genre.id);
        },
    }
    Ok(())
}
