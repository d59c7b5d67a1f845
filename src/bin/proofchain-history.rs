#![forbid(unsafe_code)]
//! Print the persisted block audit log

use chrono::{TimeZone, Utc};
use clap::Parser;
use colored::*;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, ContentArrangement, Table};
use proofchain::config::load_config;
use proofchain::persistence::Database;

#[derive(Parser, Debug)]
#[command(name = "proofchain-history", version, about = "Show the blocks recorded in the audit log")]
struct Args {
    /// SQLite audit log path (defaults to database.path from config.toml)
    #[arg(long)]
    db: Option<String>,
}

fn format_timestamp(seconds: f64) -> String {
    let micros = (seconds * 1_000_000.0) as i64;
    Utc.timestamp_micros(micros)
        .single()
        .map(|t| t.format("%Y-%m-%d %H:%M:%S%.3f").to_string())
        .unwrap_or_else(|| format!("{}", seconds))
}

/// Keep the first 10 and last 6 characters of long hashes.
fn shorten(hash: &str) -> String {
    let chars: Vec<char> = hash.chars().collect();
    if chars.len() > 20 {
        let head: String = chars[..10].iter().collect();
        let tail: String = chars[chars.len() - 6..].iter().collect();
        format!("{}...{}", head, tail)
    } else {
        hash.to_string()
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let db_path = match args.db {
        Some(path) => path,
        None => load_config()?.database.path,
    };

    let db = Database::open(&db_path)?;
    let records = db.load_records()?;

    println!("{}", format!("📜 Block audit log: {}", db_path).bright_cyan().bold());
    println!();

    if records.is_empty() {
        println!("{}", "No blocks recorded yet.".yellow());
        return Ok(());
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Index").add_attribute(Attribute::Bold),
            Cell::new("Timestamp (UTC)").add_attribute(Attribute::Bold),
            Cell::new("Proof").add_attribute(Attribute::Bold),
            Cell::new("Previous Hash").add_attribute(Attribute::Bold),
        ]);

    for record in &records {
        table.add_row(vec![
            Cell::new(record.block_index),
            Cell::new(format_timestamp(record.timestamp)),
            Cell::new(record.proof),
            Cell::new(shorten(&record.previous_hash)),
        ]);
    }

    println!("{table}");
    println!();
    println!("{}", format!("Total blocks: {}", records.len()).green());

    Ok(())
}
