// Allow panic/unwrap/expect in tests (denied globally via Cargo.toml lints)
#![cfg_attr(
    test,
    allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic_in_result_fn,
        clippy::unwrap_in_result,
        clippy::arithmetic_side_effects,
        clippy::indexing_slicing
    )
)]

pub mod config;
pub mod kv;
pub mod logging;
pub mod store;
pub mod utils;

// Re-export commonly used types
pub use config::{load_settings, ConfigError, LogSection, Settings, StoreSection};
pub use kv::{FileKv, KvError, KvStore, MemoryKv};
pub use store::{
    ContentFilters, ContentItem, ContentPatch, ContentStats, ContentStatus, ContentStore,
    KeyLayout, NewContent, Platform, RebuildReport, SortField, SortOptions, StoreConfig,
    StoreError,
};
