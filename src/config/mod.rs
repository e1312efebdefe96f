#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

pub use toml_config::{TomlConfig, ViewSettings};

/// Largest top-N a view may request, matching the dashboard slider.
pub const MAX_TOP_N: usize = 20;
