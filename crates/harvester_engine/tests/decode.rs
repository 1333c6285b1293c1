use chrono::{TimeZone, Utc};
use harvester_core::{AuthorId, FetchError, PublicMetrics, ReferencedTweet};
use harvester_engine::decode_search_response;
use pretty_assertions::assert_eq;

#[test]
fn decodes_posts_in_provider_order() {
    let body = br#"{
        "data": [
            {
                "id": "1001",
                "text": "first",
                "author_id": "42",
                "created_at": "2024-03-01T00:15:00.000Z",
                "source": "Web App",
                "lang": "en",
                "possibly_sensitive": false,
                "reply_settings": "everyone",
                "referenced_tweets": [{"type": "replied_to", "id": "900"}],
                "public_metrics": {"retweet_count": 1, "reply_count": 2, "like_count": 3, "quote_count": 0, "impression_count": 50}
            },
            {
                "id": "1002",
                "text": "second",
                "author_id": "43",
                "created_at": "2024-03-01T00:20:00.000Z"
            }
        ],
        "meta": {"result_count": 2}
    }"#;

    let records = decode_search_response(body).expect("decodes");
    assert_eq!(records.len(), 2);

    let first = &records[0];
    assert_eq!(first.id, "1001");
    assert_eq!(first.author_id, AuthorId::from("42"));
    assert_eq!(first.created_at, Utc.with_ymd_and_hms(2024, 3, 1, 0, 15, 0).unwrap());
    assert_eq!(first.source.as_deref(), Some("Web App"));
    assert_eq!(first.possibly_sensitive, Some(false));
    assert_eq!(
        first.referenced_tweets,
        vec![ReferencedTweet {
            kind: "replied_to".to_string(),
            id: "900".to_string(),
        }]
    );
    assert_eq!(
        first.public_metrics,
        Some(PublicMetrics {
            retweet_count: 1,
            reply_count: 2,
            like_count: 3,
            quote_count: 0,
            bookmark_count: None,
            impression_count: Some(50),
        })
    );

    let second = &records[1];
    assert_eq!(second.id, "1002");
    assert!(second.referenced_tweets.is_empty());
    assert_eq!(second.public_metrics, None);
}

#[test]
fn missing_data_is_an_empty_page() {
    let records = decode_search_response(br#"{"meta":{"result_count":0}}"#).unwrap();
    assert!(records.is_empty());

    let with_problems = br#"{"errors":[{"title":"Not Found Error","detail":"no such user"}]}"#;
    assert!(decode_search_response(with_problems).unwrap().is_empty());
}

#[test]
fn malformed_json_is_transient() {
    let err = decode_search_response(b"<html>gateway</html>").unwrap_err();
    assert!(matches!(err, FetchError::Transient(_)));
}

#[test]
fn post_without_author_is_transient() {
    let body = br#"{"data":[{"id":"1","text":"x","created_at":"2024-03-01T00:00:00Z"}]}"#;
    let err = decode_search_response(body).unwrap_err();
    assert!(matches!(err, FetchError::Transient(ref message) if message.contains("author_id")));
}
