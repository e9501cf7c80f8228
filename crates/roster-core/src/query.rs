//! Read-only queries over an already-fetched record collection.

use crate::types::Record;

/// Default size of the top-earners list.
pub const DEFAULT_TOP_EARNERS: usize = 10;

/// Records whose name contains `fragment`, ignoring case. Order is preserved.
pub fn search_by_name<'a>(records: &'a [Record], fragment: &str) -> Vec<&'a Record> {
    let needle = fragment.to_lowercase();
    records
        .iter()
        .filter(|r| r.name.to_lowercase().contains(&needle))
        .collect()
}

/// Highest salary, or 0 for an empty collection.
pub fn highest_salary(records: &[Record]) -> u64 {
    records.iter().map(|r| r.salary).max().unwrap_or(0)
}

/// Names of the `limit` best-paid records, highest salary first.
///
/// Ties keep their collection order.
pub fn top_earner_names(records: &[Record], limit: usize) -> Vec<String> {
    let mut sorted: Vec<&Record> = records.iter().collect();
    sorted.sort_by(|a, b| b.salary.cmp(&a.salary));
    sorted
        .into_iter()
        .take(limit)
        .map(|r| r.name.clone())
        .collect()
}
