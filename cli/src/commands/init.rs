use anyhow::Result;
use pressroom_shared::{store::BLOG_TABLE_NAMES, BlogStore};

pub async fn run(store: &BlogStore, database_url: &str) -> Result<()> {
    // `connect` already applied the schema; re-running it is a cheap no-op.
    store.ensure_schema().await?;
    tracing::info!("Database initialized at {database_url} ({} tables)", BLOG_TABLE_NAMES.len());
    Ok(())
}
