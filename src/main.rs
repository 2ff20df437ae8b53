use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use clap::{Parser, Subcommand};
mod auth;
use sealnote::{FileStore, KdfParams, SealNote, default_store};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, clap::Args)]
struct KdfArgs {
    /// PBKDF2-HMAC-SHA256 iterations (default: 600000)
    #[arg(long, env = "SEALNOTE_PBKDF2_ITERATIONS")]
    iterations: Option<u32>,
}

impl KdfArgs {
    fn to_kdf_params(&self) -> Result<KdfParams> {
        let default = KdfParams::default();
        Ok(KdfParams::new(
            self.iterations.unwrap_or(default.iterations()),
        )?)
    }
}

fn resolve_store(path: Option<PathBuf>) -> Result<FileStore> {
    match path {
        Some(p) => Ok(FileStore::new(p)),
        None => Ok(default_store()?),
    }
}

#[derive(Debug, Parser)]
#[command(name = "sealnote")]
#[command(
    version,
    about = "Keep one secret message encrypted under a password."
)]
struct Cli {
    /// Path to the sealed message file
    #[arg(long, global = true, value_name = "PATH", env = "SEALNOTE_PATH")]
    store: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn", env = "SEALNOTE_LOG")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Encrypts a message and replaces the stored one
    #[command(arg_required_else_help = true)]
    Save {
        message: String,

        #[command(flatten)]
        kdf: KdfArgs,
    },

    /// Decrypts and prints the stored message
    Read,

    /// Shows public information about the stored envelope
    Info,
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let args = Cli::parse();
    init_tracing(&args.log_level);

    let store = resolve_store(args.store.clone())?;
    tracing::debug!(path = %store.path().display(), "using store");

    match args.command {
        Commands::Save { message, kdf } => {
            let kdf = kdf.to_kdf_params()?;
            let password = auth::read_new_password_with_confirmation()?;
            let message = zeroize::Zeroizing::new(message);

            SealNote::new(&store)
                .with_kdf(kdf)
                .seal(&message, &password)
                .context("failed to save secret message")?;
            println!("secret message saved to {}", store.path().display());
        }
        Commands::Read => {
            let password = auth::read_password()?;
            let message = SealNote::new(&store).open(&password)?;
            println!("{}", message.as_str());
        }
        Commands::Info => {
            let info = SealNote::new(&store).info()?;
            println!("store:          {}", store.path().display());
            if let Ok(modified) = std::fs::metadata(store.path()).and_then(|m| m.modified()) {
                let modified: DateTime<Local> = modified.into();
                println!("last saved:     {}", modified.format("%Y-%m-%d %H:%M:%S"));
            }
            println!("{info}");
        }
    }

    Ok(())
}
