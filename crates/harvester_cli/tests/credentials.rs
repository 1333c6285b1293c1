use std::fs;

use harvester_cli::credentials::{load_credentials_with, CredentialsError};
use tempfile::TempDir;

#[test]
fn reads_one_key_per_file() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("bearer_token.txt"), "  token-from-file\n").unwrap();
    fs::write(temp.path().join("APIkey"), "key").unwrap();
    fs::write(temp.path().join("APIkey_secret.txt"), "key-secret").unwrap();
    fs::write(temp.path().join("access_token.txt"), "").unwrap();

    let credentials = load_credentials_with(temp.path(), None).unwrap();
    assert_eq!(credentials.bearer_token, "token-from-file");
    assert_eq!(credentials.api_key.as_deref(), Some("key"));
    assert_eq!(credentials.api_key_secret.as_deref(), Some("key-secret"));
    assert_eq!(credentials.access_token, None);
    assert_eq!(credentials.access_token_secret, None);
}

#[test]
fn environment_token_wins() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("bearer_token.txt"), "from-file").unwrap();
    let credentials =
        load_credentials_with(temp.path(), Some("from-env".to_string())).unwrap();
    assert_eq!(credentials.bearer_token, "from-env");
}

#[test]
fn environment_token_needs_no_directory() {
    let temp = TempDir::new().unwrap();
    let credentials =
        load_credentials_with(&temp.path().join("absent"), Some("from-env".to_string())).unwrap();
    assert_eq!(credentials.bearer_token, "from-env");
}

#[test]
fn missing_bearer_token_is_an_error() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("APIkey.txt"), "key").unwrap();
    let err = load_credentials_with(temp.path(), None).unwrap_err();
    assert!(matches!(err, CredentialsError::MissingBearerToken(_)));

    let err = load_credentials_with(&temp.path().join("absent"), None).unwrap_err();
    assert!(matches!(err, CredentialsError::Directory { .. }));
}
