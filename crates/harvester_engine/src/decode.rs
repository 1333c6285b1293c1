use chrono::{DateTime, Utc};
use harvester_core::{AuthorId, FetchError, PublicMetrics, ReferencedTweet, TweetRecord};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct SearchBody {
    data: Option<Vec<RawTweet>>,
    #[serde(default)]
    errors: Vec<ApiProblem>,
}

#[derive(Debug, Deserialize)]
struct ApiProblem {
    title: Option<String>,
    detail: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawTweet {
    id: String,
    text: String,
    author_id: Option<String>,
    created_at: Option<DateTime<Utc>>,
    source: Option<String>,
    lang: Option<String>,
    possibly_sensitive: Option<bool>,
    referenced_tweets: Option<Vec<ReferencedTweet>>,
    reply_settings: Option<String>,
    public_metrics: Option<PublicMetrics>,
}

/// Decode a recent-search body into records, keeping provider order.
///
/// A body without `data` is an empty page. Unparseable JSON, or a post missing one
/// of the requested identity fields, is a transient failure.
pub fn decode_search_response(body: &[u8]) -> Result<Vec<TweetRecord>, FetchError> {
    let parsed: SearchBody = serde_json::from_slice(body)
        .map_err(|err| FetchError::Transient(format!("malformed search response: {err}")))?;

    let Some(data) = parsed.data else {
        if let Some(problem) = parsed.errors.first() {
            harvest_logging::harvest_debug!(
                "search returned no data with {} problem(s), first: {} {}",
                parsed.errors.len(),
                problem.title.as_deref().unwrap_or("untitled"),
                problem.detail.as_deref().unwrap_or("")
            );
        }
        return Ok(Vec::new());
    };

    data.into_iter().map(into_record).collect()
}

fn into_record(raw: RawTweet) -> Result<TweetRecord, FetchError> {
    let author_id = raw.author_id.ok_or_else(|| {
        FetchError::Transient(format!("post {} is missing author_id", raw.id))
    })?;
    let created_at = raw.created_at.ok_or_else(|| {
        FetchError::Transient(format!("post {} is missing created_at", raw.id))
    })?;
    Ok(TweetRecord {
        id: raw.id,
        author_id: AuthorId::new(author_id),
        text: raw.text,
        created_at,
        source: raw.source,
        lang: raw.lang,
        possibly_sensitive: raw.possibly_sensitive,
        referenced_tweets: raw.referenced_tweets.unwrap_or_default(),
        reply_settings: raw.reply_settings,
        public_metrics: raw.public_metrics,
    })
}
