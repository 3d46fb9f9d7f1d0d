use std::collections::HashMap;

use crate::model::{BettingLine, ExternalElo, ExternalSrs, Game, ReturningProduction, Team};

/// Average implied margin per team from the betting line on each in-window game.
/// The last line listed for a game id wins; a line without a spread drops the game.
pub fn market_from_lines(teams: &[Team], games: &[&Game], lines: &[BettingLine]) -> Vec<Option<f64>> {
    let mut by_game: HashMap<u64, &BettingLine> = HashMap::new();
    for line in lines {
        match line.game_id {
            Some(id) if id != 0 => {
                by_game.insert(id, line);
            }
            _ => {}
        }
    }

    let mut implied: HashMap<&str, Vec<f64>> = HashMap::new();
    for g in games {
        let Some(spread) = by_game.get(&g.id).and_then(|l| l.spread) else {
            continue;
        };
        if !spread.is_finite() {
            continue;
        }
        implied.entry(g.home_team.as_str()).or_default().push(-spread);
        implied.entry(g.away_team.as_str()).or_default().push(spread);
    }

    teams
        .iter()
        .map(|t| {
            implied
                .get(t.school.as_str())
                .filter(|v| !v.is_empty())
                .map(|v| v.iter().sum::<f64>() / v.len() as f64)
        })
        .collect()
}

pub fn returning_production(teams: &[Team], rows: &[ReturningProduction]) -> Vec<Option<f64>> {
    let by_team: HashMap<&str, Option<f64>> =
        rows.iter().map(|r| (r.team.as_str(), r.percent_ppa)).collect();
    teams
        .iter()
        .map(|t| by_team.get(t.school.as_str()).copied().flatten())
        .collect()
}

/// Sum of whichever external Elo and SRS values exist for the team.
pub fn external_rating(teams: &[Team], elo: &[ExternalElo], srs: &[ExternalSrs]) -> Vec<Option<f64>> {
    let mut sums: HashMap<&str, f64> = HashMap::new();
    let values = elo
        .iter()
        .filter_map(|e| e.elo.map(|v| (e.team.as_str(), v)))
        .chain(srs.iter().filter_map(|s| s.srs.map(|v| (s.team.as_str(), v))));
    for (team, v) in values {
        *sums.entry(team).or_insert(0.0) += v;
    }
    teams
        .iter()
        .map(|t| sums.get(t.school.as_str()).copied())
        .collect()
}
