use std::env;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use rkyv::{rancor::Error as RkyvError, to_bytes};
use zstd::bulk::compress as zstd_compress;

#[path = "src/data.rs"]
mod data_model;
use data_model::{parse_extras, parse_partition};

// Partitions are decompressed on first use, so favour decode speed over size.
const ARCHIVE_COMPRESSION_LEVEL: i32 = 4;

const CATEGORIES: &[&str] = &[
    "author", "topic", "movie", "tv", "book", "game", "lyrics", "anime", "poetry", "proverb",
];

fn main() -> Result<(), Box<dyn Error>> {
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?);
    let out_dir = PathBuf::from(env::var("OUT_DIR")?);

    for category in CATEGORIES {
        build_partition(&manifest_dir, &out_dir, category)?;
    }
    build_extras(&manifest_dir, &out_dir)?;
    Ok(())
}

fn read_source(path: &Path) -> Result<String, Box<dyn Error>> {
    println!("cargo:rerun-if-changed={}", path.display());
    if !path.exists() {
        panic!("Missing {}. Every category needs a data file.", path.display());
    }
    Ok(fs::read_to_string(path)?)
}

fn build_partition(
    manifest_dir: &Path,
    out_dir: &Path,
    category: &str,
) -> Result<(), Box<dyn Error>> {
    let source_path = manifest_dir.join(format!("data/quotes/{category}.json"));
    let json = read_source(&source_path)?;
    let record = parse_partition(category, &json)
        .map_err(|err| format!("Failed to parse {}: {err}", source_path.display()))?;

    for source in &record.sources {
        if source.quotes.is_empty() {
            return Err(format!("{category}/{:?} has no quotes", source.key).into());
        }
        if let Some(blank) = source.quotes.iter().find(|q| q.text.trim().is_empty()) {
            return Err(format!(
                "{category}/{:?} has a quote with empty text (author {:?})",
                source.key, blank.author
            )
            .into());
        }
    }

    let bytes = to_bytes::<RkyvError>(&record)
        .map_err(|err| format!("Failed to serialize {category} partition: {err}"))?
        .into_vec();
    let compressed = zstd_compress(&bytes, ARCHIVE_COMPRESSION_LEVEL)
        .expect("compress archived partition with zstd");

    let archive_path = out_dir.join(format!("quotes_{category}.rkyv"));
    fs::write(&archive_path, compressed)?;
    println!(
        "cargo:rustc-env=MAXIMUS_{}={}",
        category.to_uppercase(),
        archive_path.display()
    );
    Ok(())
}

fn build_extras(manifest_dir: &Path, out_dir: &Path) -> Result<(), Box<dyn Error>> {
    let source_path = manifest_dir.join("data/extras.json");
    let json = read_source(&source_path)?;
    let record = parse_extras(&json)
        .map_err(|err| format!("Failed to parse {}: {err}", source_path.display()))?;
    if record.daily.is_empty() {
        return Err("data/extras.json needs at least one daily quote".into());
    }

    let bytes = to_bytes::<RkyvError>(&record)
        .map_err(|err| format!("Failed to serialize extras: {err}"))?
        .into_vec();
    let compressed = zstd_compress(&bytes, ARCHIVE_COMPRESSION_LEVEL)
        .expect("compress archived extras with zstd");

    let archive_path = out_dir.join("quotes_extras.rkyv");
    fs::write(&archive_path, compressed)?;
    println!("cargo:rustc-env=MAXIMUS_EXTRAS={}", archive_path.display());
    Ok(())
}
