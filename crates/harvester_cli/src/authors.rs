use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use harvest_logging::{harvest_info, harvest_warn};
use harvester_core::{AuthorId, AuthorQueue};
use harvester_engine::{write_row, AtomicFileWriter, PersistOutcome, Table, SHARD_EXTENSION};

pub const AUTHOR_COLUMN: &str = "author_id";
const LEGACY_AUTHOR_COLUMN: &str = "Unique Author ID";

/// Author ids from a CSV with an `author_id` (or legacy `Unique Author ID`)
/// column, or from a plain one-id-per-line file. Order is kept.
pub fn parse_author_list(text: &str) -> Result<Vec<AuthorId>> {
    let table = Table::parse(text).context("author list is not a readable table")?;
    let column = table
        .column_index(AUTHOR_COLUMN)
        .or_else(|| table.column_index(LEGACY_AUTHOR_COLUMN));

    let ids: Vec<AuthorId> = match column {
        Some(index) => table.column(index).map(AuthorId::new).collect(),
        // Plain list: the first line is an id too, unless it reads like a column name.
        None if table.header.len() == 1 => {
            let first = table.header[0].as_str();
            let first = first.chars().all(|c| c.is_ascii_digit()).then_some(first);
            first.into_iter().chain(table.column(0)).map(AuthorId::new).collect()
        }
        None => bail!(
            "author list has no {AUTHOR_COLUMN} column (found {})",
            table.header.join(", ")
        ),
    };
    Ok(ids.into_iter().filter(|id| !id.as_str().is_empty()).collect())
}

pub fn load_author_list(path: &Path) -> Result<Vec<AuthorId>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("cannot read author list {}", path.display()))?;
    let ids = parse_author_list(&text)
        .with_context(|| format!("cannot parse author list {}", path.display()))?;
    if ids.is_empty() {
        bail!("author list {} is empty", path.display());
    }
    harvest_info!("loaded {} author ids from {}", ids.len(), path.display());
    Ok(ids)
}

/// Unique author ids across every shard in `dir`, in file-name order then row order.
/// Files that cannot be read or parsed are logged and skipped.
pub fn collect_author_ids(dir: &Path) -> Result<Vec<AuthorId>> {
    let mut shards: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("cannot read shard directory {}", dir.display()))?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|path| path.is_file())
        .filter(|path| path.extension().and_then(|s| s.to_str()) == Some(SHARD_EXTENSION))
        .collect();
    shards.sort();

    let mut ids = Vec::new();
    for path in &shards {
        let table = match fs::read_to_string(path)
            .map_err(anyhow::Error::from)
            .and_then(|text| Table::parse(&text).map_err(anyhow::Error::from))
        {
            Ok(table) => table,
            Err(err) => {
                harvest_warn!("skipping {}: {err}", path.display());
                continue;
            }
        };
        let Some(index) = table.column_index(AUTHOR_COLUMN) else {
            harvest_warn!("skipping {}: no {AUTHOR_COLUMN} column", path.display());
            continue;
        };
        ids.extend(table.column(index).map(AuthorId::new));
    }

    let unique = AuthorQueue::new(ids);
    harvest_info!(
        "collected {} unique authors from {} shards",
        unique.len(),
        shards.len()
    );
    Ok(unique.remaining().to_vec())
}

/// Write a single-column author list. An existing file is left alone and reported.
pub fn write_author_list(path: &Path, ids: &[AuthorId]) -> Result<PathBuf> {
    let mut content = String::new();
    write_row(&mut content, &[AUTHOR_COLUMN]);
    for id in ids {
        write_row(&mut content, &[id.as_str()]);
    }

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .with_context(|| format!("invalid output file name {}", path.display()))?;

    match AtomicFileWriter::new(dir).write_new(filename, content.as_bytes())? {
        PersistOutcome::Written(written) => Ok(written),
        PersistOutcome::AlreadyPresent(existing) => {
            bail!("{} already exists; choose another output file", existing.display())
        }
    }
}
