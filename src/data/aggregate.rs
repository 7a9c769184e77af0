use std::collections::BTreeMap;

use itertools::Itertools;
use log::debug;

use super::IncidentRecord;

/// Number of incidents recorded for one (year, phase) pair.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PhaseCount {
    pub year: i32,
    pub phase: String,
    pub count: u64,
}

/// Groups records by (year, phase) and counts them.
///
/// Records without a flight date are skipped. The output is sorted by year,
/// then phase, so every consumer of one aggregation sees the phases in the
/// same order.
pub fn aggregate_by_year_and_phase<'a>(
    records: impl IntoIterator<Item = &'a IncidentRecord>,
) -> Vec<PhaseCount> {
    let mut counts: BTreeMap<(i32, &str), u64> = BTreeMap::new();
    for record in records {
        if let Some(year) = record.year() {
            *counts.entry((year, record.phase.as_str())).or_insert(0) += 1;
        }
    }

    let output = counts
        .into_iter()
        .map(|((year, phase), count)| PhaseCount {
            year,
            phase: phase.to_string(),
            count,
        })
        .collect_vec();
    debug!("Aggregated into {} (year, phase) groups", output.len());
    output
}

/// Removes the named phases from an aggregated table. Matching ignores case
/// and surrounding whitespace.
pub fn filter_phases(counts: &[PhaseCount], excluded: &[String]) -> Vec<PhaseCount> {
    let excluded = excluded
        .iter()
        .map(|p| p.trim().to_lowercase())
        .collect_vec();
    counts
        .iter()
        .filter(|c| !excluded.contains(&c.phase.trim().to_lowercase()))
        .cloned()
        .collect()
}

/// Distinct phases of an aggregated table, sorted.
pub fn phases(counts: &[PhaseCount]) -> Vec<String> {
    counts
        .iter()
        .map(|c| c.phase.clone())
        .sorted()
        .dedup()
        .collect()
}

/// Distinct years of an aggregated table, ascending.
pub fn years(counts: &[PhaseCount]) -> Vec<i32> {
    counts.iter().map(|c| c.year).sorted().dedup().collect()
}

pub fn total_count(counts: &[PhaseCount]) -> u64 {
    counts.iter().map(|c| c.count).sum()
}
