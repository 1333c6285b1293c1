use std::path::{Path, PathBuf};

use chrono::SecondsFormat;
use harvest_logging::{harvest_debug, harvest_info};
use harvester_core::{Shard, TweetRecord, TWEET_FIELDS};

use crate::filename::shard_filename;
use crate::persist::{AtomicFileWriter, PersistOutcome, WriteError};
use crate::table::write_row;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShardWrite {
    Written(PathBuf),
    /// Same batch and window were persisted by an earlier run.
    AlreadyPresent(PathBuf),
    /// Nothing to persist; no file was created.
    SkippedEmpty,
}

impl ShardWrite {
    pub fn path(&self) -> Option<&Path> {
        match self {
            ShardWrite::Written(path) | ShardWrite::AlreadyPresent(path) => Some(path),
            ShardWrite::SkippedEmpty => None,
        }
    }
}

/// Persists shards as CSV files, one immutable file per shard.
#[derive(Debug, Clone)]
pub struct ShardWriter {
    files: AtomicFileWriter,
}

impl ShardWriter {
    pub fn new(output_dir: PathBuf) -> Self {
        Self {
            files: AtomicFileWriter::new(output_dir),
        }
    }

    pub fn output_dir(&self) -> &Path {
        self.files.dir()
    }

    pub fn write(&self, shard: &Shard) -> Result<ShardWrite, WriteError> {
        if shard.records.is_empty() {
            return Ok(ShardWrite::SkippedEmpty);
        }
        let filename = shard_filename(shard.batch_index, &shard.window);
        let content = encode_shard(&shard.records)?;
        match self.files.write_new(&filename, content.as_bytes())? {
            PersistOutcome::Written(path) => {
                harvest_debug!("wrote {} records to {}", shard.records.len(), path.display());
                Ok(ShardWrite::Written(path))
            }
            PersistOutcome::AlreadyPresent(path) => {
                harvest_info!("shard {} already present, leaving it untouched", path.display());
                Ok(ShardWrite::AlreadyPresent(path))
            }
        }
    }
}

/// Header plus one row per record, columns in requested-field order.
pub fn encode_shard(records: &[TweetRecord]) -> Result<String, WriteError> {
    let mut out = String::new();
    write_row(&mut out, &TWEET_FIELDS);
    for record in records {
        write_row(&mut out, &record_cells(record)?);
    }
    Ok(out)
}

fn record_cells(record: &TweetRecord) -> Result<Vec<String>, WriteError> {
    let encode = |value: serde_json::Result<String>| {
        value.map_err(|err| WriteError::Encode(format!("post {}: {err}", record.id)))
    };
    let public_metrics = match &record.public_metrics {
        Some(metrics) => encode(serde_json::to_string(metrics))?,
        None => String::new(),
    };
    let referenced_tweets = if record.referenced_tweets.is_empty() {
        String::new()
    } else {
        encode(serde_json::to_string(&record.referenced_tweets))?
    };

    Ok(TWEET_FIELDS
        .iter()
        .map(|field| match *field {
            "id" => record.id.clone(),
            "text" => record.text.clone(),
            "author_id" => record.author_id.to_string(),
            "created_at" => record
                .created_at
                .to_rfc3339_opts(SecondsFormat::AutoSi, true),
            "public_metrics" => public_metrics.clone(),
            "source" => record.source.clone().unwrap_or_default(),
            "lang" => record.lang.clone().unwrap_or_default(),
            "possibly_sensitive" => record
                .possibly_sensitive
                .map(|flag| flag.to_string())
                .unwrap_or_default(),
            "referenced_tweets" => referenced_tweets.clone(),
            "reply_settings" => record.reply_settings.clone().unwrap_or_default(),
            _ => String::new(),
        })
        .collect())
}
