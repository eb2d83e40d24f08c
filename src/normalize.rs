use std::collections::HashSet;

use deunicode::deunicode;
use tracing::debug;

use crate::dataset::RawTable;
use crate::error::{Result, ScoutError};
use crate::season::{Age, is_identifier};

/// Row after header/value cleaning, before grouping.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRow {
    pub player: String,
    pub team: String,
    pub position: String,
    pub position_list: Vec<String>,
    pub nation: Option<String>,
    pub age: Option<Age>,
    pub age_years: Option<u32>,
    /// Aligned with `NormalizedTable::numeric_columns`; `None` for empty cells.
    pub numbers: Vec<Option<f64>>,
    /// Aligned with `NormalizedTable::text_columns`.
    pub texts: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedTable {
    pub numeric_columns: Vec<String>,
    pub text_columns: Vec<String>,
    pub rows: Vec<NormalizedRow>,
}

pub fn normalize(raw: &RawTable) -> Result<NormalizedTable> {
    let headers = normalize_headers(&raw.headers);
    let idx_of = |name: &str| headers.iter().position(|h| h == name);

    let player_idx = idx_of("player").ok_or_else(|| ScoutError::schema("player"))?;
    let position_idx = idx_of("position").ok_or_else(|| ScoutError::schema("position"))?;
    let team_idx = idx_of("team").ok_or_else(|| ScoutError::schema("team"))?;
    let nation_idx = idx_of("nation");
    let age_idx = idx_of("age");

    let mut numeric_idx = Vec::new();
    let mut text_idx = Vec::new();
    for (idx, name) in headers.iter().enumerate() {
        if is_identifier(name) {
            continue;
        }
        let numeric = raw
            .rows
            .iter()
            .all(|row| is_missing(cell(row, idx)) || parse_number(cell(row, idx)).is_some());
        if numeric {
            numeric_idx.push(idx);
        } else {
            text_idx.push(idx);
        }
    }

    let mut rows = Vec::with_capacity(raw.rows.len());
    for row in &raw.rows {
        let position = cell(row, position_idx).trim().to_string();
        let age = match age_idx {
            Some(idx) => parse_age(cell(row, idx))?,
            None => None,
        };
        rows.push(NormalizedRow {
            player: normalize_player_name(cell(row, player_idx)),
            team: cell(row, team_idx).trim().to_string(),
            position_list: split_positions(&position),
            position,
            nation: nation_idx
                .map(|idx| cell(row, idx).trim().to_string())
                .filter(|n| !n.is_empty()),
            age_years: age.map(Age::years),
            age,
            numbers: numeric_idx.iter().map(|&idx| parse_number(cell(row, idx))).collect(),
            texts: text_idx.iter().map(|&idx| cell(row, idx).to_string()).collect(),
        });
    }

    debug!(
        rows = rows.len(),
        numeric = numeric_idx.len(),
        text = text_idx.len(),
        "normalized table"
    );

    Ok(NormalizedTable {
        numeric_columns: numeric_idx.iter().map(|&i| headers[i].clone()).collect(),
        text_columns: text_idx.iter().map(|&i| headers[i].clone()).collect(),
        rows,
    })
}

/// Lower-case, `_` for spaces, `perc` for `%`, other symbols dropped.
pub fn normalize_column_name(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .replace(' ', "_")
        .replace('%', "perc")
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || c.is_whitespace())
        .collect()
}

/// Headers are normalized first; a name already taken gets the next free
/// numeric suffix (so "Gls", "Gls" becomes "gls", "gls1", and "Goals",
/// "goals " becomes "goals", "goals1").
fn normalize_headers(raw: &[String]) -> Vec<String> {
    let mut taken: HashSet<String> = HashSet::with_capacity(raw.len());
    let mut names = Vec::with_capacity(raw.len());
    for header in raw {
        let base = normalize_column_name(header);
        let mut name = base.clone();
        let mut suffix = 1;
        while taken.contains(&name) {
            name = format!("{base}{suffix}");
            suffix += 1;
        }
        taken.insert(name.clone());
        names.push(name);
    }
    names
}

pub fn normalize_player_name(raw: &str) -> String {
    deunicode(raw.trim())
}

pub fn split_positions(raw: &str) -> Vec<String> {
    if raw.trim().is_empty() {
        return Vec::new();
    }
    raw.split(',').map(|p| p.trim().to_string()).collect()
}

/// `"22-123"` gives `YearsDays`, plain numbers give `Years`, blank gives `None`.
pub fn parse_age(raw: &str) -> Result<Option<Age>> {
    let s = raw.trim();
    if is_missing(s) {
        return Ok(None);
    }
    if let Some((years, days)) = s.split_once('-') {
        let years = years.trim().parse::<u32>();
        let days = days.trim().parse::<u32>();
        return match (years, days) {
            (Ok(years), Ok(days)) => Ok(Some(Age::YearsDays { years, days })),
            _ => Err(ScoutError::parse("age", raw)),
        };
    }
    match parse_number(s) {
        Some(v) if v >= 0.0 && v < u32::MAX as f64 => Ok(Some(Age::Years(v.trunc() as u32))),
        _ => Err(ScoutError::parse("age", raw)),
    }
}

pub fn parse_number(raw: &str) -> Option<f64> {
    let s = raw.trim();
    if is_missing(s) {
        return None;
    }
    let cleaned = s.replace(',', "");
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn cell(row: &[String], idx: usize) -> &str {
    row.get(idx).map(String::as_str).unwrap_or("")
}

/// Spellings read as an empty cell, compared case-insensitively.
const MISSING_MARKERS: [&str; 15] = [
    "-", "na", "n/a", "nan", "-nan", "null", "none", "<na>", "#n/a", "#n/a n/a", "#na",
    "-1.#ind", "-1.#qnan", "1.#ind", "1.#qnan",
];

/// Blank, a missing marker, or a number that parses but is not finite.
fn is_missing(raw: &str) -> bool {
    let s = raw.trim();
    if s.is_empty() {
        return true;
    }
    let lower = s.to_ascii_lowercase();
    MISSING_MARKERS.contains(&lower.as_str())
        || s.replace(',', "").parse::<f64>().is_ok_and(|v| !v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(headers: &[&str], rows: &[&[&str]]) -> RawTable {
        RawTable::from_rows(
            headers.iter().map(|s| s.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn column_names_are_cleaned() {
        assert_eq!(normalize_column_name(" Player "), "player");
        assert_eq!(normalize_column_name("Pass Completion %"), "pass_completion_perc");
        assert_eq!(normalize_column_name("Expected Goals (xG)"), "expected_goals_xg");
        assert_eq!(normalize_column_name("Tkl+Int"), "tklint");
    }

    #[test]
    fn duplicate_headers_are_disambiguated() {
        let names = normalize_headers(&["Gls".to_string(), "Gls".to_string()]);
        assert_eq!(names, vec!["gls", "gls1"]);
    }

    #[test]
    fn headers_colliding_after_cleaning_stay_apart() {
        let headers: Vec<String> = ["Goals", "goals ", "Goals1", "GOALS"].iter().map(|s| s.to_string()).collect();
        assert_eq!(normalize_headers(&headers), vec!["goals", "goals1", "goals11", "goals2"]);

        let t = raw(
            &["Player", "Team", "Position", "Goals", "goals "],
            &[&["A", "X", "FW", "1", "100"], &["A", "X", "FW", "2", "200"]],
        );
        let n = normalize(&t).unwrap();
        assert_eq!(n.numeric_columns, vec!["goals", "goals1"]);
        assert_eq!(n.rows[1].numbers, vec![Some(2.0), Some(200.0)]);
    }

    #[test]
    fn missing_markers_and_non_finite_values_read_as_empty() {
        for cell in ["NaN", "nan", "inf", "-Infinity", "NA", "N/A", "null", "None", "#N/A", " - "] {
            assert_eq!(parse_number(cell), None, "{cell}");
        }
        assert_eq!(parse_age("NaN").unwrap(), None);

        let t = raw(
            &["Player", "Team", "Position", "Goals", "Note"],
            &[
                &["A", "X", "FW", "10", "NA"],
                &["B", "X", "FW", "NaN", "loan"],
                &["C", "X", "FW", "inf", ""],
                &["D", "X", "FW", "3", ""],
            ],
        );
        let n = normalize(&t).unwrap();
        assert_eq!(n.numeric_columns, vec!["goals"]);
        assert_eq!(n.text_columns, vec!["note"]);
        let goals: Vec<Option<f64>> = n.rows.iter().map(|r| r.numbers[0]).collect();
        assert_eq!(goals, vec![Some(10.0), None, None, Some(3.0)]);
    }

    #[test]
    fn accents_are_transliterated() {
        assert_eq!(normalize_player_name("José Gayà"), "Jose Gaya");
        assert_eq!(normalize_player_name("Martin Ødegaard"), "Martin Odegaard");
    }

    #[test]
    fn positions_keep_order_and_duplicates() {
        assert_eq!(split_positions("FW, MF,FW"), vec!["FW", "MF", "FW"]);
        assert!(split_positions("").is_empty());
    }

    #[test]
    fn ages_parse_both_shapes() {
        assert_eq!(
            parse_age("22-123").unwrap(),
            Some(Age::YearsDays { years: 22, days: 123 })
        );
        assert_eq!(parse_age("27").unwrap(), Some(Age::Years(27)));
        assert_eq!(parse_age("27.0").unwrap(), Some(Age::Years(27)));
        assert_eq!(parse_age("").unwrap(), None);
    }

    #[test]
    fn malformed_age_names_value() {
        let err = parse_age("twenty-two").unwrap_err();
        assert!(matches!(err, ScoutError::Parse { ref value, .. } if value == "twenty-two"));
        assert!(parse_age("abc").is_err());
    }

    #[test]
    fn missing_required_columns() {
        let t = raw(&["Name", "Squad", "Pos"], &[]);
        assert!(matches!(normalize(&t), Err(ScoutError::Schema { ref column }) if column == "player"));
        let t = raw(&["Player", "Team"], &[]);
        assert!(matches!(normalize(&t), Err(ScoutError::Schema { ref column }) if column == "position"));
    }

    #[test]
    fn mixed_columns_are_text() {
        let t = raw(
            &["Player", "Team", "Position", "Age", "Minutes", "Comp", "Goals"],
            &[
                &["A", "X", "FW", "23-100", "900", "Premier League", "10"],
                &["B", "X", "MF,FW", "20", "1,350", "2", ""],
            ],
        );
        let n = normalize(&t).unwrap();
        assert_eq!(n.numeric_columns, vec!["minutes", "goals"]);
        assert_eq!(n.text_columns, vec!["comp"]);
        assert_eq!(n.rows[1].numbers, vec![Some(1350.0), None]);
        assert_eq!(n.rows[1].position_list, vec!["MF", "FW"]);
        assert_eq!(n.rows[0].age_years, Some(23));
    }
}
