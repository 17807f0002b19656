pub mod add_genre;
pub mod add_user;
pub mod init;
pub mod seed;

use anyhow::Result;
use pressroom_shared::BlogStore;

use crate::cli::{Cli, Commands};

const MAX_CONNECTIONS: u32 = 1;

pub async fn run(cli: Cli) -> Result<()> {
    let store = BlogStore::connect(&cli.db.database_url, MAX_CONNECTIONS).await?;

    let outcome = match cli.command {
        Commands::Init => init::run(&store, &cli.db.database_url).await,
        Commands::AddUser {
            name,
            email,
        } => add_user::run(&store, &name, email.as_deref()).await,
        Commands::AddGenre {
            name,
        } => add_genre::run(&store, &name).await,
        Commands::Seed {
            count,
            batch_size,
            seed,
        } => seed::run(&store, count, batch_size, seed).await,
    };

    store.pool().close().await;
    outcome
}
