//! Cardline Core - row pipeline for card artwork
//!
//! Reads card lists, resolves and downloads artwork, re-hosts it, and
//! records per-row outcomes in CSV tables. Remote services plug in through
//! the [`Resolver`], [`Fetcher`] and [`Publisher`] traits.

pub mod card;
pub mod error;
pub mod fixup;
pub mod http;
pub mod logging;
pub mod pacing;
pub mod pipeline;
pub mod progress;
pub mod summary;
pub mod table;
#[cfg(feature = "test-server")]
pub mod testing;

// Re-exports for convenience
pub use card::{CardKey, ImageLocation, sanitize_name};
pub use error::RowError;
pub use fixup::{DownloadRetry, PublishRetry, RetryPolicy, run_download_fixup, run_publish_fixup};
pub use http::{HttpConfig, HttpError, SHARED_RUNTIME, block_on, http_client, set_http_config};
pub use logging::{IndicatifLogger, init_logging};
pub use pacing::{Pacer, PacingPolicy, Sleeper, ThreadSleeper};
pub use pipeline::{
    DownloadStage, Fetcher, Pass, PassPaths, PublishStage, Publisher, Resolver, RowStage,
    run_download, run_publish,
};
pub use progress::ProgressContext;
pub use summary::{PassStats, PassSummary};
pub use table::{CardRow, InputLayout, Row, TableSink};
