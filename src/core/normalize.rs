//! Normalization boundary: raw provider records in, typed `ProtocolRecord`s out.

use crate::domain::model::{
    Diagnostics, Normalized, ProtocolRecord, Record, SchemaIssue, Thresholds, UNKNOWN_LABEL,
};
use crate::utils::error::{LensError, Result};
use serde_json::Value;
use std::collections::HashSet;

pub const DEFAULT_CHAINS: [&str; 6] = [
    "Ethereum",
    "Solana",
    "Binance",
    "Polygon",
    "Multi-Chain",
    "Avalanche",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// `tvl` or `mcap` missing, null, zero or negative.
    NonPositive,
    BelowThreshold,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Coerced {
    Valid(ProtocolRecord),
    Dropped(DropReason),
}

fn label(record: &Record, field: &str) -> String {
    match record.get(field) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => UNKNOWN_LABEL.to_string(),
        Some(other) => other.to_string(),
    }
}

/// `Ok(None)` when the field is absent or null.
fn numeric(record: &Record, field: &'static str) -> Result<Option<f64>> {
    let parsed = match record.get(field) {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(_) => None,
    };

    match parsed {
        Some(v) if v.is_finite() => Ok(Some(v)),
        _ => Err(LensError::SchemaError {
            slug: label(record, "slug"),
            field,
            value: record.get(field).map(Value::to_string).unwrap_or_default(),
        }),
    }
}

/// Converts one raw record, deciding whether it survives the filters.
///
/// Both valuation fields are checked for malformation before anything is
/// dropped, so a record with a non-numeric `mcap` is reported even when its
/// `tvl` is zero.
pub fn coerce(record: &Record, thresholds: &Thresholds) -> Result<Coerced> {
    let tvl = numeric(record, "tvl")?;
    let mcap = numeric(record, "mcap")?;

    let (tvl, mcap) = match (tvl, mcap) {
        (Some(tvl), Some(mcap)) if tvl > 0.0 && mcap > 0.0 => (tvl, mcap),
        _ => return Ok(Coerced::Dropped(DropReason::NonPositive)),
    };

    if tvl <= thresholds.min_tvl || mcap <= thresholds.min_mcap {
        return Ok(Coerced::Dropped(DropReason::BelowThreshold));
    }

    Ok(Coerced::Valid(ProtocolRecord {
        name: label(record, "name"),
        slug: label(record, "slug"),
        tvl,
        mcap,
        chain: label(record, "chain"),
        category: label(record, "category"),
    }))
}

/// Filters raw records down to valued protocols above both thresholds,
/// ordered by descending market cap.
pub fn normalize_and_filter(records: &[Record], thresholds: &Thresholds) -> Normalized {
    let mut diagnostics = Diagnostics {
        input: records.len(),
        ..Diagnostics::default()
    };
    let mut retained = Vec::new();

    for record in records {
        match coerce(record, thresholds) {
            Ok(Coerced::Valid(protocol)) => retained.push(protocol),
            Ok(Coerced::Dropped(DropReason::NonPositive)) => diagnostics.non_positive += 1,
            Ok(Coerced::Dropped(DropReason::BelowThreshold)) => diagnostics.below_threshold += 1,
            Err(LensError::SchemaError { slug, field, value }) => {
                tracing::debug!("Skipping malformed record '{}': {} = {}", slug, field, value);
                diagnostics.malformed += 1;
                diagnostics.issues.push(SchemaIssue {
                    slug,
                    field: field.to_string(),
                    value,
                });
            }
            Err(e) => {
                // coerce only produces schema errors; anything else is still per-record
                tracing::warn!("Skipping record: {}", e);
                diagnostics.malformed += 1;
            }
        }
    }

    // stable: equal market caps keep their input order
    retained.sort_by(|a, b| b.mcap.total_cmp(&a.mcap));
    diagnostics.retained = retained.len();

    if diagnostics.malformed > 0 {
        tracing::warn!(
            "Dropped {} malformed protocol record(s) out of {}",
            diagnostics.malformed,
            diagnostics.input
        );
    }

    Normalized {
        records: retained,
        diagnostics,
    }
}

/// Keeps records whose chain is selected; an empty selection keeps nothing.
pub fn filter_chains<S: AsRef<str>>(
    records: &[ProtocolRecord],
    chains: &[S],
) -> Vec<ProtocolRecord> {
    let selected: HashSet<&str> = chains.iter().map(|c| c.as_ref()).collect();
    records
        .iter()
        .filter(|r| selected.contains(r.chain.as_str()))
        .cloned()
        .collect()
}

/// Distinct chains in first-seen order, for chain pickers.
pub fn chain_options(records: &[ProtocolRecord]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut options = Vec::new();
    for record in records {
        if seen.insert(record.chain.as_str()) {
            options.push(record.chain.clone());
        }
    }
    options
}
