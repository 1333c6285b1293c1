use std::fs;

use chrono::{TimeDelta, TimeZone, Utc};
use harvester_core::{AuthorId, PublicMetrics, Shard, TimeWindow, TweetRecord};
use harvester_engine::{
    ensure_output_dir, parse_rows, shard_filename, write_row, ShardWrite, ShardWriter, Table,
    TableError,
};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn window() -> TimeWindow {
    let start = Utc.with_ymd_and_hms(2024, 3, 1, 6, 0, 0).unwrap();
    TimeWindow::new(start, start + TimeDelta::hours(1)).unwrap()
}

fn record(id: &str, author: &str, text: &str) -> TweetRecord {
    TweetRecord {
        id: id.to_string(),
        author_id: AuthorId::from(author),
        text: text.to_string(),
        created_at: Utc.with_ymd_and_hms(2024, 3, 1, 6, 30, 0).unwrap(),
        source: Some("Web App".to_string()),
        lang: Some("en".to_string()),
        possibly_sensitive: Some(false),
        referenced_tweets: Vec::new(),
        reply_settings: Some("everyone".to_string()),
        public_metrics: Some(PublicMetrics {
            like_count: 7,
            ..PublicMetrics::default()
        }),
    }
}

#[test]
fn names_encode_batch_and_window() {
    assert_eq!(
        shard_filename(Some(3), &window()),
        "3_tweets_2024-03-01_060000Z_to_2024-03-01_070000Z.csv"
    );
    assert_eq!(
        shard_filename(None, &window()),
        "tweets_2024-03-01_060000Z_to_2024-03-01_070000Z.csv"
    );
}

#[test]
fn writes_header_and_one_row_per_record() {
    let temp = TempDir::new().unwrap();
    let writer = ShardWriter::new(temp.path().join("out"));
    let shard = Shard {
        batch_index: Some(1),
        window: window(),
        records: vec![
            record("1", "42", "plain"),
            record("2", "43", "has, comma and \"quotes\"\nand a newline"),
        ],
    };

    let path = match writer.write(&shard).unwrap() {
        ShardWrite::Written(path) => path,
        other => panic!("expected a new shard, got {other:?}"),
    };
    assert_eq!(
        path.file_name().unwrap(),
        "1_tweets_2024-03-01_060000Z_to_2024-03-01_070000Z.csv"
    );

    let table = Table::parse(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(
        table.header,
        vec![
            "id",
            "text",
            "author_id",
            "created_at",
            "public_metrics",
            "source",
            "lang",
            "possibly_sensitive",
            "referenced_tweets",
            "reply_settings",
        ]
    );
    assert_eq!(table.rows.len(), 2);
    let text = table.column_index("text").unwrap();
    assert_eq!(table.rows[1][text], "has, comma and \"quotes\"\nand a newline");
    let authors: Vec<&str> = table.column(table.column_index("author_id").unwrap()).collect();
    assert_eq!(authors, vec!["42", "43"]);
    let metrics = table.column_index("public_metrics").unwrap();
    assert!(table.rows[0][metrics].contains("\"like_count\":7"));
}

#[test]
fn empty_shard_creates_no_file() {
    let temp = TempDir::new().unwrap();
    let writer = ShardWriter::new(temp.path().to_path_buf());
    let shard = Shard {
        batch_index: Some(1),
        window: window(),
        records: Vec::new(),
    };
    assert_eq!(writer.write(&shard).unwrap(), ShardWrite::SkippedEmpty);
    assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 0);
}

#[test]
fn existing_shard_is_never_overwritten() {
    let temp = TempDir::new().unwrap();
    let writer = ShardWriter::new(temp.path().to_path_buf());
    let first = Shard {
        batch_index: Some(2),
        window: window(),
        records: vec![record("1", "42", "original")],
    };
    let path = match writer.write(&first).unwrap() {
        ShardWrite::Written(path) => path,
        other => panic!("expected a new shard, got {other:?}"),
    };
    let before = fs::read_to_string(&path).unwrap();

    let rerun = Shard {
        records: vec![record("9", "99", "different")],
        ..first
    };
    assert_eq!(writer.write(&rerun).unwrap(), ShardWrite::AlreadyPresent(path.clone()));
    assert_eq!(fs::read_to_string(&path).unwrap(), before);
}

#[test]
fn output_dir_that_is_a_file_is_rejected() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("not_a_dir");
    fs::write(&file_path, "x").unwrap();
    assert!(ensure_output_dir(&file_path).is_err());

    let writer = ShardWriter::new(file_path);
    let shard = Shard {
        batch_index: None,
        window: window(),
        records: vec![record("1", "42", "x")],
    };
    assert!(writer.write(&shard).is_err());
}

#[test]
fn table_rows_survive_quoting() {
    let mut out = String::new();
    write_row(&mut out, &["a", "b,c", "say \"hi\""]);
    write_row(&mut out, &["", "line\nbreak", "z"]);
    assert_eq!(
        parse_rows(&out).unwrap(),
        vec![
            vec!["a".to_string(), "b,c".to_string(), "say \"hi\"".to_string()],
            vec![String::new(), "line\nbreak".to_string(), "z".to_string()],
        ]
    );
}

#[test]
fn table_parse_skips_bom_and_blank_lines() {
    let table = Table::parse("\u{feff}author_id\n\n1\n2\n").unwrap();
    assert_eq!(table.header, vec!["author_id"]);
    assert_eq!(table.column(0).collect::<Vec<_>>(), vec!["1", "2"]);
}

#[test]
fn table_parse_errors() {
    assert_eq!(
        parse_rows("a,\"open\n"),
        Err(TableError::UnterminatedQuote { line: 1 })
    );
    assert_eq!(parse_rows("\"a\"b\n"), Err(TableError::StrayQuote { line: 1 }));
    assert_eq!(Table::parse(""), Err(TableError::MissingHeader));
}
