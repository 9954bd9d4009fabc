//! Print the files recorded in the metadata database.
//!
//! redb allows a single process per database file, so run this while the
//! service is stopped or against a copy of its data directory.

use anyhow::Context;

use file_pipeline::config::Config;
use file_pipeline::storage::Database;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load()?;
    let db = Database::open_with_retry(&config.node.data_dir, config.database.connect_attempts)
        .await
        .with_context(|| format!("Could not open database in {}", config.node.data_dir))?;

    let files = db.list_files()?;
    println!("Number of files in database: {}", files.len());

    if files.is_empty() {
        return Ok(());
    }

    println!();
    println!("ID\tName\tStorage Key\tCreated At");
    for file in files {
        println!(
            "{}\t{}\t{}\t{}",
            file.id,
            file.name,
            file.storage_key,
            file.created_at.to_rfc3339()
        );
    }

    Ok(())
}
