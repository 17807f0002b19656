use anyhow::{bail, Result};
use pressroom_shared::BlogStore;

pub async fn run(store: &BlogStore, name: &str, email: Option<&str>) -> Result<()> {
    if name.trim().is_empty() {
        bail!("user name must not be empty");
    }
    let user = store.create_user(name, email).await?;
    tracing::info!(user_id = user.id, "Created user {}", user.name);
    println!("{}", user.id);
    Ok(())
}
