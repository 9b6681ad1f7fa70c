//! Invitation link harvesting and validation
//!
//! Raw strings and scraped pages become canonical links, which are validated
//! concurrently against the invitation host and accumulated per session.
//!
//! Key components:
//! - `LinkNormalizer`: arbitrary string to canonical link or rejection
//! - `PageScraper`: page URL to candidate links (anchors plus text scan)
//! - `FetchEngine`: HTTP GET with pluggable headers and transport
//! - `InviteClassifier`: page markup to status, group name, and logo
//! - `ValidationCache`: TTL memo of classifier output per link
//! - `ValidationCoordinator`: bounded worker pool over a batch
//! - `ResultStore`: last-write-wins record accumulation

pub mod cache;
pub mod classifier;
pub mod coordinator;
pub mod fetcher;
pub mod headers;
pub mod normalize;
pub mod page_scraper;
pub mod store;
pub mod validator;

pub use cache::ValidationCache;
pub use classifier::InviteClassifier;
pub use coordinator::{BatchOutcome, BatchProgress, BatchReport, ValidationCoordinator};
pub use fetcher::{FetchEngine, FetchError, FetchResult, HttpTransport, PageTransport};
pub use headers::{FixedHeaders, HeaderProvider, HeaderSet, RandomHeaders};
pub use normalize::{LinkNormalizer, NormalizedBatch};
pub use page_scraper::{PageScraper, ScrapeProgress, ScrapeReport};
pub use store::{MergeStats, RecordFilter, ResultStore, StoreSummary};
pub use validator::{LinkValidator, ValidationOutcome};
