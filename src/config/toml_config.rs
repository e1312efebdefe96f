use crate::adapters::llama::DEFAULT_ENDPOINT;
use crate::adapters::{cache, SourceSettings};
use crate::config::MAX_TOP_N;
use crate::core::normalize::DEFAULT_CHAINS;
use crate::domain::model::{GroupSpec, Ranks, Thresholds};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{LensError, Result};
use crate::utils::validation::{
    validate_non_empty_strings, validate_path, validate_range, validate_threshold, validate_url,
    Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub dashboard: DashboardConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub filter: FilterConfig,
    pub views: Vec<ViewConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    pub name: String,
    pub description: Option<String>,
    pub output_path: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceConfig {
    pub endpoint: Option<String>,
    pub input_file: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub cache_ttl_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterConfig {
    pub min_tvl: Option<f64>,
    pub min_mcap: Option<f64>,
    /// Omitted means the default chain selection.
    pub chains: Option<Vec<String>>,
    pub all_chains: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewConfig {
    pub name: String,
    pub group_by: Vec<String>,
    pub top_n: Option<usize>,
    pub ranks: Option<Vec<usize>>,
}

/// One view's resolved settings.
#[derive(Debug, Clone)]
pub struct ViewSettings {
    pub name: String,
    pub output_path: String,
    pub thresholds: Thresholds,
    pub group_spec: GroupSpec,
    pub ranks: Ranks,
    pub chains: Option<Vec<String>>,
}

impl ConfigProvider for ViewSettings {
    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    fn group_spec(&self) -> GroupSpec {
        self.group_spec.clone()
    }

    fn ranks(&self) -> Ranks {
        self.ranks.clone()
    }

    fn chains(&self) -> Option<&[String]> {
        self.chains.as_deref()
    }
}

impl TomlConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(LensError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| LensError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the variable's value; unknown variables stay as written.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| LensError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn endpoint(&self) -> &str {
        self.source.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT)
    }

    pub fn source_settings(&self) -> SourceSettings {
        SourceSettings {
            endpoint: self.endpoint().to_string(),
            input_file: self.source.input_file.clone(),
            timeout: self.source.timeout_seconds.map(Duration::from_secs),
            cache_ttl: self
                .source
                .cache_ttl_seconds
                .map(Duration::from_secs)
                .unwrap_or(cache::DEFAULT_TTL),
        }
    }

    pub fn thresholds(&self) -> Thresholds {
        let defaults = Thresholds::default();
        Thresholds {
            min_tvl: self.filter.min_tvl.unwrap_or(defaults.min_tvl),
            min_mcap: self.filter.min_mcap.unwrap_or(defaults.min_mcap),
        }
    }

    pub fn chains(&self) -> Option<Vec<String>> {
        if self.filter.all_chains.unwrap_or(false) {
            return None;
        }
        Some(
            self.filter
                .chains
                .clone()
                .unwrap_or_else(|| DEFAULT_CHAINS.map(String::from).to_vec()),
        )
    }

    /// Resolves every `[[views]]` entry; each view writes below `<output_path>/<name>`.
    pub fn view_settings(&self) -> Result<Vec<ViewSettings>> {
        self.views
            .iter()
            .map(|view| {
                let ranks = match &view.ranks {
                    Some(positions) => positions.iter().copied().collect(),
                    None => Ranks::top(view.top_n.unwrap_or(1)),
                };
                Ok(ViewSettings {
                    name: view.name.clone(),
                    output_path: Path::new(&self.dashboard.output_path)
                        .join(&view.name)
                        .to_string_lossy()
                        .to_string(),
                    thresholds: self.thresholds(),
                    group_spec: GroupSpec::parse(view.group_by.as_slice())?,
                    ranks,
                    chains: self.chains(),
                })
            })
            .collect()
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        match &self.source.input_file {
            Some(path) => validate_path("source.input_file", path)?,
            None => validate_url("source.endpoint", self.endpoint())?,
        }
        validate_path("dashboard.output_path", &self.dashboard.output_path)?;

        let thresholds = self.thresholds();
        validate_threshold("filter.min_tvl", thresholds.min_tvl)?;
        validate_threshold("filter.min_mcap", thresholds.min_mcap)?;
        if let Some(chains) = &self.filter.chains {
            validate_non_empty_strings("filter.chains", chains)?;
        }

        if self.views.is_empty() {
            return Err(LensError::ConfigError {
                message: "at least one [[views]] entry is required".to_string(),
            });
        }

        let mut names = HashSet::new();
        for view in &self.views {
            validate_path("views.name", &view.name)?;
            if !names.insert(view.name.as_str()) {
                return Err(LensError::InvalidConfigValueError {
                    field: "views.name".to_string(),
                    value: view.name.clone(),
                    reason: "View names must be unique".to_string(),
                });
            }
            GroupSpec::parse(view.group_by.as_slice())?;
            if view.ranks.is_none() {
                validate_range("views.top_n", view.top_n.unwrap_or(1), 1, MAX_TOP_N)?;
            }
        }
        Ok(())
    }
}
