use tracing::debug;

use crate::diagnostics::{Diagnostics, Stage};
use crate::season::{SeasonTable, pct_column};

/// Percentile rank (0, 100] of each value among the present values.
///
/// Rank is the 1-based position in ascending order; tied values share the
/// mean of their ranks. The result is `rank / n * 100`, so the largest
/// unique value maps to 100. Missing values stay missing and do not count
/// towards `n`.
pub fn percentile_ranks(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut present: Vec<(usize, f64)> = values
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.filter(|x| !x.is_nan()).map(|x| (i, x)))
        .collect();
    present.sort_by(|a, b| a.1.total_cmp(&b.1));

    let n = present.len() as f64;
    let mut out = vec![None; values.len()];
    let mut start = 0;
    while start < present.len() {
        let mut end = start + 1;
        while end < present.len() && present[end].1 == present[start].1 {
            end += 1;
        }
        // Ranks start+1 ..= end share their mean.
        let rank = (start + 1 + end) as f64 / 2.0;
        let pct = rank / n * 100.0;
        for &(idx, _) in &present[start..end] {
            out[idx] = Some(pct);
        }
        start = end;
    }
    out
}

/// Add `<column>_pct` for each present column, ranked over the rows in
/// `table` right now. Returns the new column names in request order.
pub fn add_percentiles(table: &mut SeasonTable, columns: &[String], diag: &mut Diagnostics) -> Vec<String> {
    let mut added = Vec::new();
    for column in columns {
        if !table.has_column(column) {
            diag.missing_column(Stage::Percentile, column);
            continue;
        }
        let target = pct_column(column);
        let ranks = percentile_ranks(&table.column_values(column));
        for (record, pct) in table.records.iter_mut().zip(ranks) {
            match pct {
                Some(p) => {
                    record.stats.insert(target.clone(), p);
                }
                None => {
                    record.stats.remove(&target);
                }
            }
        }
        table.add_column(&target);
        if !added.contains(&target) {
            added.push(target);
        }
    }
    debug!(rows = table.len(), columns = ?added, "ranked percentiles");
    added
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranks(values: &[f64]) -> Vec<f64> {
        let input: Vec<Option<f64>> = values.iter().copied().map(Some).collect();
        percentile_ranks(&input).into_iter().map(|p| p.unwrap()).collect()
    }

    #[test]
    fn unique_values_rank_linearly() {
        assert_eq!(ranks(&[3.0, 1.0, 2.0, 4.0]), vec![75.0, 25.0, 50.0, 100.0]);
    }

    #[test]
    fn ties_share_average_rank() {
        // ranks 1, 2.5, 2.5, 4
        assert_eq!(ranks(&[1.0, 5.0, 5.0, 9.0]), vec![25.0, 62.5, 62.5, 100.0]);
        assert_eq!(ranks(&[2.0, 2.0]), vec![75.0, 75.0]);
    }

    #[test]
    fn single_row_is_top() {
        assert_eq!(ranks(&[0.0]), vec![100.0]);
    }

    #[test]
    fn missing_values_are_not_ranked() {
        let out = percentile_ranks(&[Some(1.0), None, Some(2.0), Some(f64::NAN)]);
        assert_eq!(out, vec![Some(50.0), None, Some(100.0), None]);
    }

    #[test]
    fn empty_input() {
        assert!(percentile_ranks(&[]).is_empty());
    }
}
