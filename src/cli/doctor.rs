//! CLI `doctor` command — run database and index diagnostics.

use anyhow::{Context, Result};

use mnemo::config::MnemoConfig;
use mnemo::db;
use mnemo::index::FlatIndex;

/// Print a health report for the database and the index snapshot. Does not
/// load the embedding model, so it works on a machine without model files.
pub fn doctor(config: &MnemoConfig) -> Result<()> {
    let db_path = config.resolved_db_path();

    if !db_path.exists() {
        println!("Database: not found at {}", db_path.display());
        println!("Run `mnemo ingest` or a capture session to initialize.");
        return Ok(());
    }

    let file_size = std::fs::metadata(&db_path).map(|m| m.len()).unwrap_or(0);

    let conn = db::open_database(&db_path)
        .context("failed to open database (may be corrupt)")?;

    let report = db::check_database_health(&conn)
        .context("failed to run health check")?;

    println!("Mnemo Health Report");
    println!("===================");
    println!();
    println!("Database:          {}", db_path.display());
    println!("File size:         {}", format_bytes(file_size));
    println!("Schema version:    {}", report.schema_version);
    println!();
    println!("Embedding model:");
    println!("  Stored:          {}", report.embedding_model.as_deref().unwrap_or("(not set)"));
    println!("  Configured:      {}", config.embedding.model);
    if let Some(ref stored) = report.embedding_model {
        if stored != &config.embedding.model {
            println!("  WARNING: model mismatch! Run `mnemo sweep --force` to re-embed.");
        } else {
            println!("  Status:          OK (match)");
        }
    }
    println!();
    println!("Row counts:");
    println!("  Events:          {}", report.event_count);
    println!("  Vectors:         {}", report.vector_count);
    println!("  Backlog:         {}", report.unvectorized_count);
    println!();

    let index_path = config.resolved_index_path();
    if !index_path.exists() {
        println!("Index snapshot:    missing (rebuilt from the store on next start)");
    } else {
        match FlatIndex::load(&index_path) {
            Ok(index) if index.len() as u64 == report.vector_count => {
                println!(
                    "Index snapshot:    OK ({} vectors, dimension {})",
                    index.len(),
                    index.dimension()
                );
            }
            Ok(index) => {
                println!(
                    "Index snapshot:    STALE ({} vectors vs {} stored; rebuilt on next start)",
                    index.len(),
                    report.vector_count
                );
            }
            Err(err) => {
                println!("Index snapshot:    UNREADABLE ({err}; rebuilt on next start)");
            }
        }
    }

    println!();
    if report.integrity_ok {
        println!("Integrity check:   PASSED");
    } else {
        println!("Integrity check:   FAILED ({})", report.integrity_details);
        println!();
        println!("Recovery steps:");
        println!("  1. Restore the database from a backup.");
        println!("  2. Delete {} to force an index rebuild.", index_path.display());
    }

    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
