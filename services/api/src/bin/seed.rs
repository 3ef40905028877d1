//! services/api/src/bin/seed.rs
//!
//! Imports word-bank CSV files and creates the preset courses.
//!
//! Usage: `seed [CSV_FILE ...]`. Without arguments it looks for
//! `business_words_clean.csv` and `hsk_words_clean.csv` in the current directory.

use api_lib::{
    adapters::DbAdapter,
    config::Config,
    error::ApiError,
    seed::{parse_word_csv, seed_preset_courses},
};
use bizchinese_core::ports::DatabaseService;
use sqlx::postgres::PgPoolOptions;
use std::fs::File;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_FILES: [&str; 2] = ["business_words_clean.csv", "hsk_words_clean.csv"];

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let files: Vec<PathBuf> = {
        let args: Vec<PathBuf> = std::env::args().skip(1).map(PathBuf::from).collect();
        if args.is_empty() {
            DEFAULT_FILES.iter().map(PathBuf::from).collect()
        } else {
            args
        }
    };

    let db_pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&config.database_url)
        .await?;
    let db = DbAdapter::new(db_pool);
    db.run_migrations().await?;

    let mut total = 0;
    for path in &files {
        if !path.exists() {
            warn!("File not found: {}", path.display());
            continue;
        }
        let words = parse_word_csv(File::open(path)?)
            .map_err(|e| ApiError::Internal(format!("{}: {}", path.display(), e)))?;
        let inserted = db.insert_words(&words).await?;
        info!(
            "{}: {} rows, {} inserted, {} already present",
            path.display(),
            words.len(),
            inserted,
            (words.len() as u64).saturating_sub(inserted)
        );
        total += inserted;
    }
    info!("Word import complete: {} new words", total);

    let created = seed_preset_courses(&db).await?;
    info!("Preset courses complete: {} created", created);

    db.close().await;
    Ok(())
}
