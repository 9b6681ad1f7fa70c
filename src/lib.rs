//! invite-harvester: discover, normalize, and validate group invitation links
//!
//! - Normalization of arbitrary strings into canonical invitation links
//! - Link discovery on web pages (anchors plus text scan)
//! - Concurrent validation with a bounded worker pool and a TTL cache
//! - Heuristic page classification (active, expired or full, redirected, ...)
//! - Session-scoped, deduplicated result accumulation

pub mod config;
pub mod scraping;
pub mod session;
pub mod types;
pub mod util;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use config::Config;
pub use session::Session;
pub use types::*;
