use std::path::Path;

use rust_xlsxwriter::{Workbook, Worksheet};
use tracing::info;

use crate::error::Result;
use crate::pipeline::{PipelineOptions, ProfileReport};
use crate::ranking::{RankingRequest, RankingResult};

#[derive(Debug, Clone, PartialEq)]
pub struct ExportReport {
    pub ranked_rows: usize,
    pub profiles: usize,
    pub warnings: usize,
}

#[derive(Debug, Clone, PartialEq)]
enum Cell {
    Text(String),
    Number(f64),
    Empty,
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

impl From<Option<f64>> for Cell {
    fn from(value: Option<f64>) -> Self {
        value.map(Cell::Number).unwrap_or(Cell::Empty)
    }
}

/// Write a ranking (and any profiles) to an `.xlsx` workbook with sheets
/// `Ranking`, `Profile` and `Run`. Minutes are read from the column named in
/// `options`, which is also recorded on the `Run` sheet.
pub fn export_ranking(
    path: &Path,
    fingerprint: &str,
    options: &PipelineOptions,
    request: &RankingRequest,
    result: &RankingResult,
    profiles: &[ProfileReport],
) -> Result<ExportReport> {
    let ranking_rows = ranking_rows(result, &options.minutes_column);
    let profile_rows = profile_rows(profiles);
    let run_rows = run_rows(fingerprint, options, request, result);

    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Ranking")?;
        write_rows(sheet, &ranking_rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Profile")?;
        write_rows(sheet, &profile_rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Run")?;
        write_rows(sheet, &run_rows)?;
    }
    workbook.save(path)?;

    let report = ExportReport {
        ranked_rows: result.len(),
        profiles: profiles.len(),
        warnings: result.warnings.len(),
    };
    info!(path = %path.display(), rows = report.ranked_rows, "exported ranking workbook");
    Ok(report)
}

fn ranking_rows(result: &RankingResult, minutes_column: &str) -> Vec<Vec<Cell>> {
    let mut header: Vec<Cell> = vec![
        "Rank".into(),
        "Player".into(),
        "Team".into(),
        "Position".into(),
        "Age".into(),
        "Minutes".into(),
        "Score".into(),
    ];
    header.extend(result.pct_columns.iter().map(|c| Cell::from(c.as_str())));

    let mut rows = vec![header];
    for (idx, entry) in result.entries.iter().enumerate() {
        let r = &entry.record;
        let mut row: Vec<Cell> = vec![
            ((idx + 1) as f64).into(),
            r.player.as_str().into(),
            r.team.as_str().into(),
            r.position.as_str().into(),
            r.age_years.map(f64::from).into(),
            f64::from(r.minutes_in(minutes_column)).into(),
            entry.ranking_score.into(),
        ];
        row.extend(result.pct_columns.iter().map(|c| Cell::from(r.stat(c))));
        rows.push(row);
    }
    rows
}

fn profile_rows(profiles: &[ProfileReport]) -> Vec<Vec<Cell>> {
    let mut rows = vec![vec![
        "Player".into(),
        "Team".into(),
        "Stat".into(),
        "Raw".into(),
        "Per 90".into(),
        "Percentile".into(),
    ]];
    for report in profiles {
        let p = &report.profile;
        for axis in &p.axes {
            rows.push(vec![
                p.player.as_str().into(),
                p.team.as_str().into(),
                axis.stat.as_str().into(),
                axis.raw.into(),
                axis.per90.into(),
                axis.percentile.into(),
            ]);
        }
    }
    rows
}

fn run_rows(
    fingerprint: &str,
    options: &PipelineOptions,
    request: &RankingRequest,
    result: &RankingResult,
) -> Vec<Vec<Cell>> {
    let join = |items: Vec<String>| items.join(", ");
    let mut rows: Vec<Vec<Cell>> = vec![
        vec!["Generated".into(), chrono::Utc::now().to_rfc3339().into()],
        vec!["Input SHA-256".into(), fingerprint.into()],
        vec!["Stats".into(), join(request.unique_stats()).into()],
        vec![
            "Positions".into(),
            join(request.positions.iter().cloned().collect()).into(),
        ],
        vec![
            "Max age".into(),
            request.age_ceiling.map(f64::from).into(),
        ],
        vec!["Population".into(), format!("{:?}", request.population).into()],
        vec!["Minutes column".into(), options.minutes_column.as_str().into()],
        vec!["Per-90 floor".into(), format!("{:?}", options.per90_floor).into()],
    ];
    for (stat, weight) in &result.weights {
        rows.push(vec![format!("Weight {stat}").into(), (*weight).into()]);
    }
    for warning in &result.warnings {
        rows.push(vec!["Warning".into(), warning.to_string().into()]);
    }
    rows
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<Cell>]) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            let (r, c) = (row_idx as u32, col_idx as u16);
            match value {
                Cell::Text(s) => {
                    worksheet.write_string(r, c, s)?;
                }
                Cell::Number(n) => {
                    worksheet.write_number(r, c, *n)?;
                }
                Cell::Empty => {}
            }
        }
    }
    Ok(())
}
