use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use harvest_logging::harvest_debug;
use harvester_engine::Credentials;
use thiserror::Error;

pub const BEARER_TOKEN_ENV: &str = "HARVESTER_BEARER_TOKEN";

#[derive(Debug, Error)]
pub enum CredentialsError {
    #[error("cannot read credentials directory {}: {source}", .path.display())]
    Directory { path: PathBuf, source: io::Error },
    #[error("cannot read credential file {}: {source}", .path.display())]
    File { path: PathBuf, source: io::Error },
    #[error("no bearer_token in {} and HARVESTER_BEARER_TOKEN is not set", .0.display())]
    MissingBearerToken(PathBuf),
}

/// Load credentials from `dir`, one file per key: the file stem is the key
/// name and the trimmed content its value. `bearer_token` may instead come
/// from the environment, which wins over the file.
pub fn load_credentials(dir: &Path) -> Result<Credentials, CredentialsError> {
    load_credentials_with(dir, std::env::var(BEARER_TOKEN_ENV).ok())
}

pub fn load_credentials_with(
    dir: &Path,
    bearer_override: Option<String>,
) -> Result<Credentials, CredentialsError> {
    let mut values = match read_key_files(dir) {
        Ok(values) => values,
        // The directory is optional when the token comes from the environment.
        Err(CredentialsError::Directory { source, .. })
            if source.kind() == io::ErrorKind::NotFound && bearer_override.is_some() =>
        {
            HashMap::new()
        }
        Err(err) => return Err(err),
    };

    let bearer_token = bearer_override
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
        .or_else(|| values.remove("bearer_token"))
        .ok_or_else(|| CredentialsError::MissingBearerToken(dir.to_path_buf()))?;

    Ok(Credentials {
        bearer_token,
        api_key: values.remove("APIkey"),
        api_key_secret: values.remove("APIkey_secret"),
        access_token: values.remove("access_token"),
        access_token_secret: values.remove("access_token_secret"),
    })
}

fn read_key_files(dir: &Path) -> Result<HashMap<String, String>, CredentialsError> {
    let entries = fs::read_dir(dir).map_err(|source| CredentialsError::Directory {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut values = HashMap::new();
    for entry in entries.filter_map(|e| e.ok()) {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(key) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let key = key.to_string();
        let value = fs::read_to_string(&path)
            .map_err(|source| CredentialsError::File {
                path: path.clone(),
                source,
            })?
            .trim()
            .to_string();
        if value.is_empty() {
            continue;
        }
        // Names only; values are secrets.
        harvest_debug!("loaded credential {key}");
        values.insert(key, value);
    }
    Ok(values)
}
