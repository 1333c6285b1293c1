use harvester_core::{FetchError, FetchQuery, TweetRecord, TWEET_FIELDS};

use crate::client::{SearchClient, SearchRequest};
use crate::decode::decode_search_response;

/// Turns a `FetchQuery` into one provider call and typed records.
#[derive(Debug, Clone)]
pub struct FetchExecutor<C> {
    client: C,
}

impl<C: SearchClient> FetchExecutor<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn request_for(query: &FetchQuery) -> SearchRequest {
        SearchRequest {
            query: query.query_string(),
            start_time: query.window.start(),
            end_time: query.window.end(),
            max_results: query.max_results,
            fields: TWEET_FIELDS.iter().map(|field| field.to_string()).collect(),
        }
    }

    pub async fn fetch(&self, query: &FetchQuery) -> Result<Vec<TweetRecord>, FetchError> {
        let request = Self::request_for(query);
        let response = self.client.search(&request).await?;
        decode_search_response(&response.body)
    }
}
