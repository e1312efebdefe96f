pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliConfig;

pub use adapters::{build_source, CachedSource, FileSource, LlamaSource, LocalStorage};
pub use core::aggregate::{group_and_rank, rank_groups};
pub use core::normalize::{normalize_and_filter, DEFAULT_CHAINS};
pub use core::{dashboard::DashboardPipeline, engine::DashboardEngine};
pub use domain::model::{
    DashboardView, Diagnostics, GroupField, GroupKey, GroupSpec, ProtocolRecord, RankedEntry,
    Ranks, Record, Thresholds,
};
pub use utils::error::{LensError, Result};
