//! Harvester engine: provider IO, shard persistence and effect execution.
mod client;
mod decode;
mod events;
mod executor;
mod filename;
mod persist;
mod plan;
mod runner;
mod shard;
mod sleep;
mod table;

pub use client::{
    format_timestamp, rate_limit_hint, ClientSettings, Credentials, HttpSearchClient,
    ProviderResponse, SearchClient, SearchRequest, SerializedClient,
};
pub use decode::decode_search_response;
pub use events::{ChannelEventSink, EventSink, HarvestEvent, NullEventSink};
pub use executor::FetchExecutor;
pub use filename::{shard_filename, SHARD_EXTENSION};
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistOutcome, WriteError};
pub use plan::{partition_authors, run_author_plan, run_keywords, PlanReport};
pub use runner::SessionRunner;
pub use shard::{encode_shard, ShardWrite, ShardWriter};
pub use sleep::{system_clock, Clock, Sleeper, TokioSleeper};
pub use table::{parse_rows, write_row, Table, TableError};
