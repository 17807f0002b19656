use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "pressroom", version, about = "Pressroom database maintenance CLI")]
pub struct Cli {
    #[command(flatten)]
    pub db: DbArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args)]
pub struct DbArgs {
    /// SQLite database URL.
    #[arg(
        long,
        global = true,
        env = "DATABASE_URL",
        default_value = "sqlite://data/pressroom.db"
    )]
    pub database_url: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create every table and index (idempotent).
    Init,
    /// Add an author account.
    AddUser {
        /// Display name.
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: Option<String>,
    },
    /// Add a genre, or report the existing one.
    AddGenre {
        /// Genre name (unique).
        #[arg(long)]
        name: String,
    },
    /// Generate fake articles for existing users.
    Seed {
        /// Number of articles to create.
        #[arg(long, default_value_t = 200)]
        count: usize,
        /// Articles written per transaction.
        #[arg(long, default_value_t = 50)]
        batch_size: usize,
        /// RNG seed for reproducible data.
        #[arg(long)]
        seed: Option<u64>,
    },
}
