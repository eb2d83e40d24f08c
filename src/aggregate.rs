use std::collections::HashMap;

use tracing::debug;

use crate::normalize::{NormalizedRow, NormalizedTable};
use crate::season::{PlayerSeasonRecord, SeasonTable};

/// Collapse rows into one record per (player, team), in first-seen order.
///
/// Numeric columns are summed (empty cells add nothing), identifier and text
/// columns keep the value of the first row in the group.
pub fn aggregate_season(table: &NormalizedTable) -> SeasonTable {
    let mut index: HashMap<(&str, &str), usize> = HashMap::new();
    let mut records: Vec<PlayerSeasonRecord> = Vec::new();

    for row in &table.rows {
        let key = (row.player.as_str(), row.team.as_str());
        match index.get(&key) {
            Some(&slot) => add_numbers(&mut records[slot], &table.numeric_columns, row),
            None => {
                index.insert(key, records.len());
                records.push(first_record(table, row));
            }
        }
    }

    debug!(
        input_rows = table.rows.len(),
        records = records.len(),
        "aggregated season table"
    );

    SeasonTable {
        numeric_columns: table.numeric_columns.clone(),
        text_columns: table.text_columns.clone(),
        records,
    }
}

fn first_record(table: &NormalizedTable, row: &NormalizedRow) -> PlayerSeasonRecord {
    let stats = table
        .numeric_columns
        .iter()
        .zip(&row.numbers)
        .map(|(col, v)| (col.clone(), v.unwrap_or(0.0)))
        .collect();
    let extras = table
        .text_columns
        .iter()
        .zip(&row.texts)
        .map(|(col, v)| (col.clone(), v.clone()))
        .collect();
    PlayerSeasonRecord {
        player: row.player.clone(),
        team: row.team.clone(),
        position: row.position.clone(),
        position_list: row.position_list.clone(),
        nation: row.nation.clone(),
        age: row.age,
        age_years: row.age_years,
        stats,
        extras,
    }
}

fn add_numbers(record: &mut PlayerSeasonRecord, columns: &[String], row: &NormalizedRow) {
    for (col, value) in columns.iter().zip(&row.numbers) {
        let Some(v) = value else { continue };
        *record.stats.entry(col.clone()).or_insert(0.0) += v;
    }
}
