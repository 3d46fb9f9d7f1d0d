use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::model::{DeltaRow, RankingMeta, RankingOutput, RatingRow};

pub struct ExportReport {
    pub rankings: usize,
    pub sheets: usize,
}

enum Cell {
    Text(String),
    Number(f64),
    Empty,
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<f64> for Cell {
    fn from(v: f64) -> Self {
        Cell::Number(v)
    }
}

impl From<Option<f64>> for Cell {
    fn from(v: Option<f64>) -> Self {
        v.map(Cell::Number).unwrap_or(Cell::Empty)
    }
}

fn header(names: &[&str]) -> Vec<Cell> {
    names.iter().map(|n| Cell::from(*n)).collect()
}

fn count(v: impl Into<f64>) -> Cell {
    Cell::Number(v.into())
}

/// Workbook with Rankings, Breakdown and Meta sheets, plus Delta when given.
pub fn export_rankings(
    path: &Path,
    output: &RankingOutput,
    delta: Option<&[DeltaRow]>,
) -> Result<ExportReport> {
    let mut rankings_rows = vec![header(&[
        "Rank", "Team", "Conference", "Score", "Elo", "Play Quality", "Prior", "Wins", "Losses",
        "Win %", "Points For", "Points Against", "Point Diff", "Avg Margin", "SoS Avg Elo",
        "QW25", "QW50", "Bad Losses", "Top25 W", "Top25 L", "Top50 W", "Top50 L", "1-Score W",
        "1-Score L",
    ])];
    let mut breakdown_rows = vec![header(&[
        "Rank", "Team", "Pre-SoS", "SoS", "Elo", "Play", "Prior", "PPA", "Market", "Returning",
        "Ext", "MOV", "Off", "Def", "zElo", "zPlay", "zPrior", "zPPA", "zMarket", "zReturning",
        "zExt", "zMOV", "zOff", "zDef", "zSoS", "PPA adj", "Market raw", "Returning raw",
        "Ext raw", "MOV raw", "Off dom", "Def dom",
    ])];
    for row in &output.rankings {
        rankings_rows.push(ranking_row(row));
        breakdown_rows.push(breakdown_row(row));
    }

    let mut workbook = Workbook::new();
    let mut sheets = 0;
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Rankings")?;
        write_rows(sheet, &rankings_rows)?;
        sheets += 1;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Breakdown")?;
        write_rows(sheet, &breakdown_rows)?;
        sheets += 1;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Meta")?;
        write_rows(sheet, &meta_rows(&output.meta))?;
        sheets += 1;
    }
    if let Some(delta) = delta {
        let mut rows = vec![header(&["Rank", "Team", "Score", "Delta Rank", "Delta Score"])];
        rows.extend(delta.iter().map(|d| {
            vec![
                count(d.row.rank as u32),
                Cell::from(d.row.team.as_str()),
                Cell::from(d.row.score),
                count(d.delta_rank as i32),
                Cell::from(d.delta_score),
            ]
        }));
        let sheet = workbook.add_worksheet();
        sheet.set_name("Delta")?;
        write_rows(sheet, &rows)?;
        sheets += 1;
    }

    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;

    Ok(ExportReport {
        rankings: output.rankings.len(),
        sheets,
    })
}

fn ranking_row(r: &RatingRow) -> Vec<Cell> {
    let rec = &r.record;
    let res = &r.resume;
    vec![
        count(r.rank as u32),
        Cell::from(r.team.as_str()),
        r.conference.as_deref().map(Cell::from).unwrap_or(Cell::Empty),
        Cell::from(r.score),
        Cell::from(r.elo),
        Cell::from(r.play_quality),
        Cell::from(r.prior),
        Cell::from(rec.wins),
        Cell::from(rec.losses),
        Cell::from(rec.win_pct),
        Cell::from(rec.points_for as f64),
        Cell::from(rec.points_against as f64),
        Cell::from(rec.point_diff as f64),
        Cell::from(rec.avg_margin),
        Cell::from(r.sos_avg_elo),
        count(res.quality_wins_25),
        count(res.quality_wins_50),
        count(res.bad_losses),
        count(res.rec_top25_w),
        count(res.rec_top25_l),
        count(res.rec_top50_w),
        count(res.rec_top50_l),
        count(res.one_score_w),
        count(res.one_score_l),
    ]
}

fn breakdown_row(r: &RatingRow) -> Vec<Cell> {
    let c = &r.contr;
    let z = &r.z;
    let x = &r.extras;
    let numbers = [
        c.pre_sos, c.sos, c.elo, c.play, c.prior, c.ppa, c.market, c.returning, c.ext, c.mov,
        c.off, c.def, z.elo, z.play, z.prior, z.ppa, z.market, z.returning, z.ext, z.mov, z.off,
        z.def, z.sos, x.ppa,
    ];
    let mut row = vec![count(r.rank as u32), Cell::from(r.team.as_str())];
    row.extend(numbers.into_iter().map(Cell::from));
    row.extend(
        [x.market, x.returning, x.ext, x.mov, x.off_dom, x.def_dom]
            .into_iter()
            .map(Cell::from),
    );
    row
}

fn meta_rows(meta: &RankingMeta) -> Vec<Vec<Cell>> {
    let opt_num = |v: Option<f64>| Cell::from(v);
    let flag = |b: bool| Cell::from(if b { "yes" } else { "no" });
    vec![
        header(&["Key", "Value"]),
        vec![Cell::from("Year"), opt_num(meta.year.map(f64::from))],
        vec![
            Cell::from("Through Week"),
            opt_num(meta.through_week.map(f64::from)),
        ],
        vec![Cell::from("Max Week"), count(meta.max_week)],
        vec![Cell::from("Teams"), count(meta.teams_count as u32)],
        vec![Cell::from("Games To Date"), count(meta.games_to_date as u32)],
        vec![Cell::from("Advanced"), flag(meta.used.advanced)],
        vec![Cell::from("SP+"), flag(meta.used.sp)],
        vec![Cell::from("Talent"), flag(meta.used.talent)],
        vec![Cell::from("PPA"), flag(meta.used.ppa)],
        vec![Cell::from("Lines"), flag(meta.used.lines)],
        vec![Cell::from("Returning"), flag(meta.used.returning)],
        vec![Cell::from("Elo (ext)"), flag(meta.used.elo_ext)],
        vec![Cell::from("SRS (ext)"), flag(meta.used.srs_ext)],
    ]
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<Cell>]) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            let (r, c) = (row_idx as u32, col_idx as u16);
            match value {
                Cell::Text(s) => {
                    worksheet.write_string(r, c, s)?;
                }
                Cell::Number(n) if n.is_finite() => {
                    worksheet.write_number(r, c, *n)?;
                }
                Cell::Number(_) | Cell::Empty => {}
            }
        }
    }
    Ok(())
}
