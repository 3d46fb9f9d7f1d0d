use std::collections::HashMap;

use crate::model::{AdvancedSeasonTeam, Game, PpaTeam, SpRating, TalentRow, Team};
use crate::zscore::population;

/// Success rate and PPA on both sides of the ball: z(off SR) + z(off PPA) - z(def SR) - z(def PPA).
pub fn play_quality(teams: &[Team], advanced: &[AdvancedSeasonTeam]) -> Vec<f64> {
    let by_team: HashMap<&str, &AdvancedSeasonTeam> =
        advanced.iter().map(|a| (a.team.as_str(), a)).collect();
    let column = |pick: fn(&AdvancedSeasonTeam) -> Option<f64>| -> Vec<Option<f64>> {
        teams
            .iter()
            .map(|t| by_team.get(t.school.as_str()).and_then(|a| pick(a)))
            .collect()
    };

    let off_sr = population(&column(|a| a.offense.as_ref().and_then(|s| s.success_rate)));
    let off_ppa = population(&column(|a| a.offense.as_ref().and_then(|s| s.ppa)));
    let def_sr = population(&column(|a| a.defense.as_ref().and_then(|s| s.success_rate)));
    let def_ppa = population(&column(|a| a.defense.as_ref().and_then(|s| s.ppa)));

    (0..teams.len())
        .map(|i| off_sr[i] + off_ppa[i] - def_sr[i] - def_ppa[i])
        .collect()
}

/// Preseason strength: mean of z(SP+ rating) and z(recruiting talent).
pub fn prior(teams: &[Team], sp: &[SpRating], talent: &[TalentRow]) -> Vec<f64> {
    let sp_by: HashMap<&str, Option<f64>> = sp.iter().map(|s| (s.team.as_str(), s.rating)).collect();
    let talent_by: HashMap<&str, Option<f64>> =
        talent.iter().map(|t| (t.school.as_str(), t.talent)).collect();

    let sp_vals: Vec<Option<f64>> = teams
        .iter()
        .map(|t| sp_by.get(t.school.as_str()).copied().flatten())
        .collect();
    let talent_vals: Vec<Option<f64>> = teams
        .iter()
        .map(|t| talent_by.get(t.school.as_str()).copied().flatten())
        .collect();

    let z_sp = population(&sp_vals);
    let z_talent = population(&talent_vals);
    z_sp.iter()
        .zip(&z_talent)
        .map(|(a, b)| (a + b) / 2.0)
        .collect()
}

/// Net PPA (offense minus defense allowed) adjusted for the opponents each team
/// faced, re-centred to zero mean over the roster.
///
/// Every pass reads the unadjusted offense/defense values, so any pass count
/// above zero yields the same single adjustment. Zero passes returns the raw net.
pub fn opponent_adjusted_ppa(
    teams: &[Team],
    ppa_teams: &[PpaTeam],
    games: &[&Game],
    passes: u32,
) -> Vec<f64> {
    let by_team: HashMap<&str, &PpaTeam> =
        ppa_teams.iter().map(|r| (r.team.as_str(), r)).collect();
    let off: HashMap<&str, f64> = teams
        .iter()
        .map(|t| {
            let v = by_team.get(t.school.as_str()).and_then(|r| r.off_overall);
            (t.school.as_str(), v.unwrap_or(0.0))
        })
        .collect();
    let def: HashMap<&str, f64> = teams
        .iter()
        .map(|t| {
            let v = by_team.get(t.school.as_str()).and_then(|r| r.def_overall);
            (t.school.as_str(), v.unwrap_or(0.0))
        })
        .collect();

    if passes == 0 {
        return teams
            .iter()
            .map(|t| off[t.school.as_str()] - def[t.school.as_str()])
            .collect();
    }

    let opponents = opponent_lists(games);
    let value = |map: &HashMap<&str, f64>, team: &str| map.get(team).copied().unwrap_or(0.0);

    let net: Vec<f64> = teams
        .iter()
        .map(|t| {
            let team = t.school.as_str();
            let own_off = value(&off, team);
            let own_def = value(&def, team);
            let opps = opponents.get(team).map(Vec::as_slice).unwrap_or(&[]);
            if opps.is_empty() {
                return own_off - own_def;
            }
            let n = opps.len() as f64;
            let avg_opp_def = opps.iter().map(|o| value(&def, o)).sum::<f64>() / n;
            let avg_opp_off = opps.iter().map(|o| value(&off, o)).sum::<f64>() / n;
            let adj_off = own_off - avg_opp_def;
            let adj_def = -(own_def - avg_opp_off);
            adj_off + adj_def
        })
        .collect();

    recenter(net)
}

fn opponent_lists<'a>(games: &[&'a Game]) -> HashMap<&'a str, Vec<&'a str>> {
    let mut out: HashMap<&str, Vec<&str>> = HashMap::new();
    for g in games {
        out.entry(g.home_team.as_str())
            .or_default()
            .push(g.away_team.as_str());
        out.entry(g.away_team.as_str())
            .or_default()
            .push(g.home_team.as_str());
    }
    out
}

fn recenter(values: Vec<f64>) -> Vec<f64> {
    if values.is_empty() {
        return values;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    values.into_iter().map(|v| v - mean).collect()
}
