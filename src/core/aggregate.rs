use crate::domain::model::{GroupKey, GroupSpec, ProtocolRecord, RankedEntry, Ranks};
use crate::utils::error::Result;
use std::cmp::Ordering;
use std::collections::HashMap;

fn by_tvl_then_name(a: &ProtocolRecord, b: &ProtocolRecord) -> Ordering {
    b.tvl.total_cmp(&a.tvl).then_with(|| a.name.cmp(&b.name))
}

/// Groups records by `spec`, ranks each group by descending TVL and keeps the
/// requested positions.
///
/// Groups come out in the order their key first appears in `records`;
/// entries within a group come out by ascending rank.
pub fn rank_groups(
    records: &[ProtocolRecord],
    spec: &GroupSpec,
    ranks: &Ranks,
) -> Vec<RankedEntry> {
    let mut order: Vec<GroupKey> = Vec::new();
    let mut groups: HashMap<GroupKey, Vec<&ProtocolRecord>> = HashMap::new();

    for record in records {
        let key = spec.key_of(record);
        groups
            .entry(key.clone())
            .or_insert_with(|| {
                order.push(key);
                Vec::new()
            })
            .push(record);
    }

    let mut ranked = Vec::new();
    for key in order {
        let Some(mut members) = groups.remove(&key) else {
            continue;
        };
        members.sort_by(|a, b| by_tvl_then_name(a, b));

        for position in ranks.iter() {
            // positions past the end of a group are skipped, not padded
            let Some(record) = members.get(position) else {
                break;
            };
            ranked.push(RankedEntry {
                key: key.clone(),
                rank: position,
                record: (*record).clone(),
            });
        }
    }

    tracing::debug!(
        "Ranked {} record(s) into {} entries grouped by {}",
        records.len(),
        ranked.len(),
        spec
    );
    ranked
}

/// Name-based entry point: `group_by` must hold one or two of `chain`, `category`.
pub fn group_and_rank<S: AsRef<str>>(
    records: &[ProtocolRecord],
    group_by: &[S],
    ranks: &Ranks,
) -> Result<Vec<RankedEntry>> {
    let spec = GroupSpec::parse(group_by)?;
    Ok(rank_groups(records, &spec, ranks))
}
