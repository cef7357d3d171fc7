use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use keel_formats::ContainerArchive;
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(about = "List the entries of KRSR resource containers", version)]
struct Args {
    /// Container files to list (may be passed multiple times)
    #[arg(value_name = "PATH", required = true)]
    containers: Vec<PathBuf>,

    /// Emit one JSON document instead of the plain table
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct EntryRow<'a> {
    archive: String,
    type_code: &'a str,
    id: i64,
    name: Option<&'a str>,
    namespace: Option<&'a str>,
    size: u32,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut archives = Vec::new();
    for path in &args.containers {
        let archive = ContainerArchive::open(path)
            .with_context(|| format!("opening container {}", path.display()))?;
        archives.push(archive);
    }

    if args.json {
        let rows: Vec<EntryRow> = archives
            .iter()
            .flat_map(|archive| {
                let label = archive.path().display().to_string();
                archive.entries().iter().map(move |entry| EntryRow {
                    archive: label.clone(),
                    type_code: &entry.type_code,
                    id: entry.id,
                    name: entry.name.as_deref(),
                    namespace: entry.namespace.as_deref(),
                    size: entry.size,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    for archive in &archives {
        println!("{}", archive.path().display());
        for entry in archive.entries() {
            println!(
                "  {:<4} #{:<8} {:<24} ns<{}> {} bytes",
                entry.type_code,
                entry.id,
                entry.name.as_deref().unwrap_or("-"),
                entry.namespace.as_deref().unwrap_or(""),
                entry.size
            );
        }
    }
    Ok(())
}
