use crate::utils::error::{LensError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

pub const MIN_TVL: f64 = 500_000.0;
pub const MIN_MCAP: f64 = 500_000.0;

/// Label used when a protocol comes without a name, slug, chain or category.
pub const UNKNOWN_LABEL: &str = "Unknown";

/// One raw entry as delivered by a record source; any field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub data: HashMap<String, Value>,
}

impl Record {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.data.get(field)
    }
}

impl From<serde_json::Map<String, Value>> for Record {
    fn from(obj: serde_json::Map<String, Value>) -> Self {
        Self {
            data: obj.into_iter().collect(),
        }
    }
}

/// A protocol snapshot that passed normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtocolRecord {
    pub name: String,
    pub slug: String,
    pub tvl: f64,
    pub mcap: f64,
    pub chain: String,
    pub category: String,
}

impl From<&ProtocolRecord> for Record {
    fn from(record: &ProtocolRecord) -> Self {
        let number = |v: f64| {
            serde_json::Number::from_f64(v)
                .map(Value::Number)
                .unwrap_or(Value::Null)
        };

        let mut data = HashMap::new();
        data.insert("name".to_string(), Value::String(record.name.clone()));
        data.insert("slug".to_string(), Value::String(record.slug.clone()));
        data.insert("tvl".to_string(), number(record.tvl));
        data.insert("mcap".to_string(), number(record.mcap));
        data.insert("chain".to_string(), Value::String(record.chain.clone()));
        data.insert(
            "category".to_string(),
            Value::String(record.category.clone()),
        );
        Record { data }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub min_tvl: f64,
    pub min_mcap: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            min_tvl: MIN_TVL,
            min_mcap: MIN_MCAP,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupField {
    Chain,
    Category,
}

impl GroupField {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupField::Chain => "chain",
            GroupField::Category => "category",
        }
    }

    pub fn value_of<'a>(&self, record: &'a ProtocolRecord) -> &'a str {
        match self {
            GroupField::Chain => &record.chain,
            GroupField::Category => &record.category,
        }
    }
}

impl FromStr for GroupField {
    type Err = LensError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "chain" => Ok(GroupField::Chain),
            "category" => Ok(GroupField::Category),
            other => Err(LensError::InvalidGroupSpec {
                reason: format!("unknown field '{}', expected chain or category", other),
            }),
        }
    }
}

impl fmt::Display for GroupField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered grouping dimensions; the order fixes the shape of every `GroupKey`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSpec(Vec<GroupField>);

impl GroupSpec {
    pub fn chain_category() -> Self {
        Self(vec![GroupField::Chain, GroupField::Category])
    }

    pub fn category_chain() -> Self {
        Self(vec![GroupField::Category, GroupField::Chain])
    }

    /// Builds a spec from field names, rejecting wrong arity, unknown names and repeats.
    pub fn parse<S: AsRef<str>>(names: &[S]) -> Result<Self> {
        if names.is_empty() || names.len() > 2 {
            return Err(LensError::InvalidGroupSpec {
                reason: format!("expected 1 or 2 fields, got {}", names.len()),
            });
        }

        let mut fields = Vec::with_capacity(names.len());
        for name in names {
            let field: GroupField = name.as_ref().parse()?;
            if fields.contains(&field) {
                return Err(LensError::InvalidGroupSpec {
                    reason: format!("field '{}' listed twice", field),
                });
            }
            fields.push(field);
        }
        Ok(Self(fields))
    }

    pub fn fields(&self) -> &[GroupField] {
        &self.0
    }

    pub fn key_of(&self, record: &ProtocolRecord) -> GroupKey {
        GroupKey(
            self.0
                .iter()
                .map(|field| field.value_of(record).to_string())
                .collect(),
        )
    }
}

impl Default for GroupSpec {
    fn default() -> Self {
        Self::chain_category()
    }
}

/// Accepts the dashboard's two orderings, `chain-category` and `category-chain`,
/// as well as single fields and comma separated lists.
impl FromStr for GroupSpec {
    type Err = LensError;

    fn from_str(s: &str) -> Result<Self> {
        let names: Vec<&str> = s
            .split(|c: char| c == '-' || c == ',')
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .collect();
        Self::parse(names.as_slice())
    }
}

impl fmt::Display for GroupSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.0.iter().map(GroupField::as_str).collect();
        f.write_str(&names.join("-"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupKey(pub Vec<String>);

impl GroupKey {
    pub fn values(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(" / "))
    }
}

/// Zero-based rank positions to keep from every group.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Ranks(BTreeSet<usize>);

impl Ranks {
    /// Positions `0..n`, i.e. the top `n` of each group.
    pub fn top(n: usize) -> Self {
        Self((0..n).collect())
    }

    pub fn contains(&self, position: usize) -> bool {
        self.0.contains(&position)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<usize> for Ranks {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedEntry {
    pub key: GroupKey,
    pub rank: usize,
    pub record: ProtocolRecord,
}

impl RankedEntry {
    /// Hierarchy path for sunburst/treemap charts: group values, then the slug.
    pub fn path(&self) -> Vec<&str> {
        self.key
            .values()
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(self.record.slug.as_str()))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaIssue {
    pub slug: String,
    pub field: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub input: usize,
    pub malformed: usize,
    pub non_positive: usize,
    pub below_threshold: usize,
    pub retained: usize,
    pub issues: Vec<SchemaIssue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Normalized {
    pub records: Vec<ProtocolRecord>,
    pub diagnostics: Diagnostics,
}

/// Everything a dashboard view renders, produced by one pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub generated_at: DateTime<Utc>,
    pub group_spec: GroupSpec,
    /// Selected chains; empty when every chain is kept.
    pub chains: Vec<String>,
    /// Distinct chains of `table`, for the chain picker.
    pub chain_options: Vec<String>,
    /// Full filtered table, by descending market cap.
    pub table: Vec<ProtocolRecord>,
    /// `table` restricted to the selected chains (TVL vs MCAP scatter).
    pub selection: Vec<ProtocolRecord>,
    pub ranked: Vec<RankedEntry>,
    pub diagnostics: Diagnostics,
}
