use crate::adapters::llama::DEFAULT_ENDPOINT;
use crate::adapters::{cache, SourceSettings};
use crate::config::MAX_TOP_N;
use crate::core::normalize::DEFAULT_CHAINS;
use crate::domain::model::{GroupSpec, Ranks, Thresholds, MIN_MCAP, MIN_TVL};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_non_empty_strings, validate_path, validate_range, validate_threshold, validate_url,
    Validate,
};
use clap::{Parser, ValueEnum};
use std::time::Duration;

/// The two hierarchies the dashboard offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GroupOrder {
    ChainCategory,
    CategoryChain,
}

impl From<GroupOrder> for GroupSpec {
    fn from(order: GroupOrder) -> Self {
        match order {
            GroupOrder::ChainCategory => GroupSpec::chain_category(),
            GroupOrder::CategoryChain => GroupSpec::category_chain(),
        }
    }
}

#[derive(Debug, Clone, Parser)]
#[command(name = "defi-lens")]
#[command(about = "TVL vs market cap analysis of DeFi protocols")]
pub struct CliConfig {
    #[arg(long, default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// Read a saved protocols JSON array instead of calling the endpoint
    #[arg(long)]
    pub input_file: Option<String>,

    #[arg(long, default_value = "./output")]
    pub output_path: String,

    #[arg(long, default_value_t = MIN_TVL)]
    pub min_tvl: f64,

    #[arg(long, default_value_t = MIN_MCAP)]
    pub min_mcap: f64,

    #[arg(long, value_enum, default_value_t = GroupOrder::ChainCategory)]
    pub group_by: GroupOrder,

    /// Top protocols kept per group
    #[arg(long, default_value_t = 1)]
    pub top_n: usize,

    /// Explicit zero-based rank positions; overrides --top-n
    #[arg(long, value_delimiter = ',')]
    pub ranks: Vec<usize>,

    #[arg(long, value_delimiter = ',', default_values_t = DEFAULT_CHAINS.map(String::from))]
    pub chains: Vec<String>,

    /// Keep every chain, ignoring --chains
    #[arg(long)]
    pub all_chains: bool,

    #[arg(long)]
    pub timeout_seconds: Option<u64>,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl CliConfig {
    pub fn source_settings(&self) -> SourceSettings {
        SourceSettings {
            endpoint: self.endpoint.clone(),
            input_file: self.input_file.clone(),
            timeout: self.timeout_seconds.map(Duration::from_secs),
            cache_ttl: cache::DEFAULT_TTL,
        }
    }
}

impl ConfigProvider for CliConfig {
    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn thresholds(&self) -> Thresholds {
        Thresholds {
            min_tvl: self.min_tvl,
            min_mcap: self.min_mcap,
        }
    }

    fn group_spec(&self) -> GroupSpec {
        self.group_by.into()
    }

    fn ranks(&self) -> Ranks {
        if self.ranks.is_empty() {
            Ranks::top(self.top_n)
        } else {
            self.ranks.iter().copied().collect()
        }
    }

    fn chains(&self) -> Option<&[String]> {
        if self.all_chains {
            None
        } else {
            Some(&self.chains)
        }
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        if self.input_file.is_none() {
            validate_url("endpoint", &self.endpoint)?;
        }
        if let Some(path) = &self.input_file {
            validate_path("input_file", path)?;
        }
        validate_path("output_path", &self.output_path)?;
        validate_threshold("min_tvl", self.min_tvl)?;
        validate_threshold("min_mcap", self.min_mcap)?;
        if self.ranks.is_empty() {
            validate_range("top_n", self.top_n, 1, MAX_TOP_N)?;
        }
        if !self.all_chains {
            validate_non_empty_strings("chains", &self.chains)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_dashboard() {
        let config = CliConfig::parse_from(["defi-lens"]);

        assert_eq!(config.thresholds(), Thresholds::default());
        assert_eq!(config.group_spec(), GroupSpec::chain_category());
        assert_eq!(config.ranks(), Ranks::top(1));
        assert_eq!(config.chains().map(|c| c.len()), Some(6));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_flags_override_defaults() {
        let config = CliConfig::parse_from([
            "defi-lens",
            "--group-by",
            "category-chain",
            "--ranks",
            "0,2",
            "--all-chains",
            "--min-tvl",
            "0",
        ]);

        assert_eq!(config.group_spec(), GroupSpec::category_chain());
        assert_eq!(config.ranks(), [0, 2].into_iter().collect::<Ranks>());
        assert!(config.chains().is_none());
        assert_eq!(config.thresholds().min_tvl, 0.0);
    }

    #[test]
    fn test_top_n_out_of_range() {
        let config = CliConfig::parse_from(["defi-lens", "--top-n", "21"]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_input_file_skips_endpoint_check() {
        let config = CliConfig::parse_from([
            "defi-lens",
            "--endpoint",
            "not a url",
            "--input-file",
            "protocols.json",
        ]);
        assert!(config.validate().is_ok());
        assert_eq!(
            config.source_settings().input_file.as_deref(),
            Some("protocols.json")
        );
    }
}
