use serde::{Deserialize, Serialize};

use crate::{AuthorId, ConfigError, TimeWindow};

/// Most `from:` terms a single query may OR together.
pub const MAX_AUTHORS_PER_QUERY: usize = 10;
/// Smallest per-call result cap the recent-search endpoint accepts.
pub const MIN_RESULTS_PER_CALL: u32 = 10;
/// Largest per-call result cap the recent-search endpoint accepts.
pub const MAX_RESULTS_PER_CALL: u32 = 100;

/// Attributes requested for every post. Shards use the same names as columns.
pub const TWEET_FIELDS: [&str; 10] = [
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
];

/// Between one and [`MAX_AUTHORS_PER_QUERY`] distinct authors queried together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorBatch {
    authors: Vec<AuthorId>,
}

impl AuthorBatch {
    pub fn new(authors: Vec<AuthorId>) -> Result<Self, ConfigError> {
        if authors.is_empty() {
            return Err(ConfigError::EmptyAuthorBatch);
        }
        if authors.len() > MAX_AUTHORS_PER_QUERY {
            return Err(ConfigError::BatchSize {
                size: authors.len(),
                max: MAX_AUTHORS_PER_QUERY,
            });
        }
        Ok(Self { authors })
    }

    pub fn authors(&self) -> &[AuthorId] {
        &self.authors
    }

    pub fn len(&self) -> usize {
        self.authors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.authors.is_empty()
    }
}

/// Operators appended to every query, after the target clause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentFilter {
    pub language: Option<String>,
    pub exclude_retweets: bool,
    pub exclude_quotes: bool,
    pub exclude_links: bool,
    pub exclude_media: bool,
}

impl Default for ContentFilter {
    fn default() -> Self {
        Self {
            language: Some("en".to_string()),
            exclude_retweets: true,
            exclude_quotes: true,
            exclude_links: true,
            exclude_media: true,
        }
    }
}

impl ContentFilter {
    /// No operators at all.
    pub fn none() -> Self {
        Self {
            language: None,
            exclude_retweets: false,
            exclude_quotes: false,
            exclude_links: false,
            exclude_media: false,
        }
    }

    fn operators(&self) -> Vec<String> {
        let mut ops = Vec::new();
        if let Some(lang) = self.language.as_deref().map(str::trim).filter(|l| !l.is_empty()) {
            ops.push(format!("lang:{lang}"));
        }
        if self.exclude_retweets {
            ops.push("-is:retweet".to_string());
        }
        if self.exclude_quotes {
            ops.push("-is:quote".to_string());
        }
        if self.exclude_links {
            ops.push("-has:links".to_string());
        }
        if self.exclude_media {
            ops.extend(
                ["-has:media", "-has:images", "-has:video_link"]
                    .iter()
                    .map(|op| op.to_string()),
            );
        }
        ops
    }
}

/// What a query selects: keyword terms or a batch of authors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryTarget {
    Keywords(Vec<String>),
    Authors(AuthorBatch),
}

/// Everything one provider call needs. Built fresh per attempt, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchQuery {
    pub window: TimeWindow,
    pub target: QueryTarget,
    pub filter: ContentFilter,
    pub max_results: u32,
}

impl FetchQuery {
    /// Provider query string, e.g. `(from:1 OR from:2) lang:en -is:retweet`.
    pub fn query_string(&self) -> String {
        let terms: Vec<String> = match &self.target {
            QueryTarget::Keywords(keywords) => keywords
                .iter()
                .map(|kw| kw.trim())
                .filter(|kw| !kw.is_empty())
                .map(quote_keyword)
                .collect(),
            QueryTarget::Authors(batch) => batch
                .authors()
                .iter()
                .map(|id| format!("from:{id}"))
                .collect(),
        };
        let mut parts = vec![format!("({})", terms.join(" OR "))];
        parts.extend(self.filter.operators());
        parts.join(" ")
    }

    pub fn authors(&self) -> &[AuthorId] {
        match &self.target {
            QueryTarget::Authors(batch) => batch.authors(),
            QueryTarget::Keywords(_) => &[],
        }
    }
}

fn quote_keyword(keyword: &str) -> String {
    if keyword.contains(char::is_whitespace) && !keyword.starts_with('"') {
        format!("\"{keyword}\"")
    } else {
        keyword.to_string()
    }
}
