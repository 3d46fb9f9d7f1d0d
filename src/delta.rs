use std::collections::HashMap;

use tracing::debug;

use crate::composite::compute_rankings;
use crate::config::RankingConfig;
use crate::error::EngineError;
use crate::model::{DeltaMeta, DeltaOutput, DeltaRow, SeasonInputs, Window};

/// Rank through `week` and through `week - 1` from scratch over the same inputs
/// and diff the two.
pub fn compute_delta(
    inputs: &SeasonInputs,
    cfg: &RankingConfig,
    week: u32,
) -> Result<DeltaOutput, EngineError> {
    compute_delta_between(inputs, inputs, cfg, week)
}

/// Like [`compute_delta`], with separate inputs for each window since
/// week-scoped datasets are cached per week.
pub fn compute_delta_between(
    current_inputs: &SeasonInputs,
    previous_inputs: &SeasonInputs,
    cfg: &RankingConfig,
    week: u32,
) -> Result<DeltaOutput, EngineError> {
    check_delta_week(week)?;
    let current = compute_rankings(current_inputs, cfg, Window::through(week))?;
    let previous = compute_rankings(previous_inputs, cfg, Window::through(week - 1))?;

    let prev_by_team: HashMap<&str, (usize, f64)> = previous
        .rankings
        .iter()
        .map(|r| (r.team.as_str(), (r.rank, r.score)))
        .collect();

    let rankings: Vec<DeltaRow> = current
        .rankings
        .iter()
        .map(|row| {
            let (delta_rank, delta_score) = match prev_by_team.get(row.team.as_str()) {
                Some(&(rank, score)) => (rank as i64 - row.rank as i64, Some(row.score - score)),
                None => (0, None),
            };
            DeltaRow {
                row: row.clone(),
                delta_rank,
                delta_score,
            }
        })
        .collect();
    debug!(week, teams = rankings.len(), "computed weekly delta");

    Ok(DeltaOutput {
        meta: DeltaMeta {
            ranking: current.meta,
            week,
            delta_from: week - 1,
        },
        rankings,
    })
}

pub fn check_delta_week(week: u32) -> Result<(), EngineError> {
    if week < 2 {
        return Err(EngineError::InvalidDeltaWeek {
            week: i64::from(week),
        });
    }
    Ok(())
}

/// Parses a user-supplied week for a delta run.
pub fn parse_delta_week(raw: &str) -> Result<u32, EngineError> {
    let week: i64 = raw
        .trim()
        .parse()
        .map_err(|_| EngineError::InvalidConfig(format!("week `{raw}` is not a number")))?;
    if week < 2 {
        return Err(EngineError::InvalidDeltaWeek { week });
    }
    u32::try_from(week).map_err(|_| EngineError::InvalidDeltaWeek { week })
}
