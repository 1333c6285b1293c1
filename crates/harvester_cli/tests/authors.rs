use std::fs;

use harvester_cli::authors::{
    collect_author_ids, load_author_list, parse_author_list, write_author_list,
};
use harvester_core::AuthorId;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn ids(values: &[&str]) -> Vec<AuthorId> {
    values.iter().map(|v| AuthorId::from(*v)).collect()
}

#[test]
fn reads_author_id_column() {
    let text = "name,author_id\nada,11\nbob,12\n";
    assert_eq!(parse_author_list(text).unwrap(), ids(&["11", "12"]));
}

#[test]
fn reads_legacy_column() {
    let text = "Unique Author ID\n21\n22\n";
    assert_eq!(parse_author_list(text).unwrap(), ids(&["21", "22"]));
}

#[test]
fn reads_plain_lines() {
    assert_eq!(parse_author_list("31\n32\n\n33\n").unwrap(), ids(&["31", "32", "33"]));
}

#[test]
fn rejects_tables_without_author_column() {
    assert!(parse_author_list("name,handle\nada,@ada\n").is_err());
}

#[test]
fn empty_file_is_an_error() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("authors.csv");
    fs::write(&path, "author_id\n").unwrap();
    assert!(load_author_list(&path).is_err());
}

#[test]
fn collects_unique_authors_across_shards() {
    let temp = TempDir::new().unwrap();
    let shards = temp.path().join("shards");
    fs::create_dir(&shards).unwrap();
    fs::write(
        shards.join("1_tweets_a_to_b.csv"),
        "id,text,author_id\r\n1,hello,11\r\n2,\"multi\nline\",12\r\n",
    )
    .unwrap();
    fs::write(
        shards.join("2_tweets_b_to_c.csv"),
        "id,text,author_id\r\n3,again,12\r\n4,new,13\r\n",
    )
    .unwrap();
    fs::write(shards.join("broken.csv"), "id,author_id\n\"unterminated\n").unwrap();
    fs::write(shards.join("notes.txt"), "author_id\n99\n").unwrap();

    let collected = collect_author_ids(&shards).unwrap();
    assert_eq!(collected, ids(&["11", "12", "13"]));

    let output = temp.path().join("authors.csv");
    let written = write_author_list(&output, &collected).unwrap();
    assert_eq!(written, output);
    assert_eq!(fs::read_to_string(&output).unwrap(), "author_id\r\n11\r\n12\r\n13\r\n");
    assert_eq!(load_author_list(&output).unwrap(), collected);

    // Never overwritten.
    assert!(write_author_list(&output, &ids(&["1"])).is_err());
    assert_eq!(load_author_list(&output).unwrap(), collected);
}
