//! Tabular renderings of a `DashboardView` for downstream chart and table layers.

use crate::domain::model::{DashboardView, GroupSpec, ProtocolRecord, RankedEntry};
use crate::utils::error::{LensError, Result};
use std::io::Write;
use zip::write::{FileOptions, ZipWriter};

pub const TABLE_FILE: &str = "protocols.csv";
pub const RANKED_FILE: &str = "ranked.csv";
pub const VIEW_FILE: &str = "dashboard.json";
pub const BUNDLE_FILE: &str = "dashboard.zip";

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<String> {
    let bytes = writer
        .into_inner()
        .map_err(|e| LensError::IoError(e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| LensError::ProcessingError {
        message: format!("CSV output is not UTF-8: {}", e),
    })
}

pub fn table_csv(records: &[ProtocolRecord]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    if records.is_empty() {
        writer.write_record(["name", "slug", "tvl", "mcap", "chain", "category"])?;
    }
    for record in records {
        writer.serialize(record)?;
    }
    finish(writer)
}

/// One row per ranked entry; the leading `group_*` columns are the group key in `GroupSpec` order.
pub fn ranked_csv(spec: &GroupSpec, entries: &[RankedEntry]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    let mut header: Vec<String> = spec
        .fields()
        .iter()
        .map(|f| format!("group_{}", f))
        .collect();
    header.extend(
        ["rank", "name", "slug", "tvl", "mcap", "chain", "category"].map(String::from),
    );
    writer.write_record(&header)?;

    for entry in entries {
        let mut row: Vec<String> = entry.key.values().to_vec();
        row.push(entry.rank.to_string());
        row.push(entry.record.name.clone());
        row.push(entry.record.slug.clone());
        row.push(entry.record.tvl.to_string());
        row.push(entry.record.mcap.to_string());
        row.push(entry.record.chain.clone());
        row.push(entry.record.category.clone());
        writer.write_record(&row)?;
    }
    finish(writer)
}

pub fn view_json(view: &DashboardView) -> Result<String> {
    let ranked: Vec<serde_json::Value> = view
        .ranked
        .iter()
        .map(|entry| {
            serde_json::json!({
                "key": entry.key,
                "rank": entry.rank,
                "record": entry.record,
                "path": entry.path(),
            })
        })
        .collect();

    let doc = serde_json::json!({
        "generated_at": view.generated_at,
        "group_by": view.group_spec.to_string(),
        "chains": view.chains,
        "chain_options": view.chain_options,
        "table": view.table,
        "selection": view.selection,
        "ranked": ranked,
        "diagnostics": view.diagnostics,
    });
    Ok(serde_json::to_string_pretty(&doc)?)
}

/// Packs the table, the ranked rows and the JSON view into one zip archive.
pub fn bundle(view: &DashboardView) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));

    zip.start_file::<_, ()>(TABLE_FILE, FileOptions::default())?;
    zip.write_all(table_csv(&view.table)?.as_bytes())?;

    zip.start_file::<_, ()>(RANKED_FILE, FileOptions::default())?;
    zip.write_all(ranked_csv(&view.group_spec, &view.ranked)?.as_bytes())?;

    zip.start_file::<_, ()>(VIEW_FILE, FileOptions::default())?;
    zip.write_all(view_json(view)?.as_bytes())?;

    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}
