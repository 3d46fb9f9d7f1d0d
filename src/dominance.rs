use std::collections::HashMap;

use crate::elo::{Ratings, rating_of};
use crate::model::{Game, PpaTeam, Team};
use crate::zscore::sample;

const MOV_CLAMP: f64 = 28.0;
const OPPONENT_EXPONENT: f64 = 0.25;

/// Per-team averages in roster order; `None` for teams without a game in the window.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dominance {
    pub mov: Vec<Option<f64>>,
    pub off: Vec<Option<f64>>,
    pub def: Vec<Option<f64>>,
    pub z_mov: Vec<f64>,
    pub z_off: Vec<f64>,
    pub z_def: Vec<f64>,
}

#[derive(Default)]
struct Tally {
    mov_sum: f64,
    mov_n: u32,
    off_sum: f64,
    def_sum: f64,
    n: u32,
}

/// sign(m) * ln(1 + |m|) with m clamped to +/-28 points.
pub fn mov_component(margin: i32) -> f64 {
    let m = f64::from(margin).clamp(-MOV_CLAMP, MOV_CLAMP);
    m.signum() * m.abs().ln_1p()
}

pub fn opponent_factor(opp_rating: f64, base: f64) -> f64 {
    (opp_rating / base).powf(OPPONENT_EXPONENT)
}

pub fn dominance(
    teams: &[Team],
    games: &[&Game],
    ppa_teams: &[PpaTeam],
    ratings: &Ratings,
    base: f64,
) -> Dominance {
    let eff: HashMap<&str, (f64, f64)> = ppa_teams
        .iter()
        .map(|r| {
            (
                r.team.as_str(),
                (r.off_overall.unwrap_or(0.0), r.def_overall.unwrap_or(0.0)),
            )
        })
        .collect();
    let eff_of = |team: &str| eff.get(team).copied().unwrap_or((0.0, 0.0));

    let mut tallies: HashMap<&str, Tally> = HashMap::new();
    for g in games {
        let margin = g.margin();
        let sides = [
            (g.home_team.as_str(), g.away_team.as_str(), margin),
            (g.away_team.as_str(), g.home_team.as_str(), margin.map(|m| -m)),
        ];
        for (team, opp, own_margin) in sides {
            let (own_off, own_def) = eff_of(team);
            let (opp_off, opp_def) = eff_of(opp);
            let t = tallies.entry(team).or_default();
            if let Some(m) = own_margin {
                t.mov_sum +=
                    mov_component(m) * opponent_factor(rating_of(ratings, opp, base), base);
                t.mov_n += 1;
            }
            t.off_sum += own_off - opp_def;
            t.def_sum += opp_off - own_def;
            t.n += 1;
        }
    }

    let mut out = Dominance::default();
    for team in teams {
        let (mov, off, def) = match tallies.get(team.school.as_str()) {
            Some(t) if t.n > 0 => {
                let n = f64::from(t.n);
                let mov = (t.mov_n > 0).then(|| t.mov_sum / f64::from(t.mov_n));
                (mov, Some(t.off_sum / n), Some(t.def_sum / n))
            }
            _ => (None, None, None),
        };
        out.mov.push(mov);
        out.off.push(off);
        out.def.push(def);
    }
    out.z_mov = sample(&out.mov);
    out.z_off = sample(&out.off);
    out.z_def = sample(&out.def);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game(home: &str, away: &str, hp: i32, ap: i32) -> Game {
        Game {
            week: Some(1),
            home_team: home.to_string(),
            away_team: away.to_string(),
            home_points: Some(hp),
            away_points: Some(ap),
            ..Game::default()
        }
    }

    fn even_ratings(names: &[&str]) -> Ratings {
        names.iter().map(|n| (n.to_string(), 1500.0)).collect()
    }

    #[test]
    fn mov_is_clamped_and_log_scaled() {
        assert_eq!(mov_component(0), 0.0);
        assert!((mov_component(7) - 8.0_f64.ln()).abs() < 1e-12);
        assert!((mov_component(-7) + 8.0_f64.ln()).abs() < 1e-12);
        assert_eq!(mov_component(45), mov_component(28));
        assert!((mov_component(-60) + 29.0_f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn stronger_opponents_scale_mov_up() {
        assert!((opponent_factor(1500.0, 1500.0) - 1.0).abs() < 1e-12);
        assert!(opponent_factor(1700.0, 1500.0) > 1.0);
        assert!(opponent_factor(1300.0, 1500.0) < 1.0);
    }

    #[test]
    fn winner_and_loser_mirror_each_other() {
        let teams = vec![Team::new("A"), Team::new("B")];
        let games = vec![game("A", "B", 24, 10)];
        let refs: Vec<&Game> = games.iter().collect();
        let d = dominance(&teams, &refs, &[], &even_ratings(&["A", "B"]), 1500.0);
        let a = d.mov[0].unwrap_or_default();
        let b = d.mov[1].unwrap_or_default();
        assert!((a - 15.0_f64.ln()).abs() < 1e-12);
        assert!((a + b).abs() < 1e-12);
        assert!(d.z_mov[0] > 0.0 && d.z_mov[1] < 0.0);
    }

    #[test]
    fn efficiency_dominance_uses_opponent_rows() {
        let teams = vec![Team::new("A"), Team::new("B")];
        let games = vec![game("A", "B", 17, 14)];
        let refs: Vec<&Game> = games.iter().collect();
        let ppa = vec![
            PpaTeam {
                team: "A".to_string(),
                off_overall: Some(0.3),
                def_overall: Some(0.1),
                ..PpaTeam::default()
            },
            PpaTeam {
                team: "B".to_string(),
                off_overall: Some(0.2),
                def_overall: Some(0.25),
                ..PpaTeam::default()
            },
        ];
        let d = dominance(&teams, &refs, &ppa, &even_ratings(&["A", "B"]), 1500.0);
        assert!((d.off[0].unwrap_or_default() - 0.05).abs() < 1e-12);
        assert!((d.def[0].unwrap_or_default() - 0.10).abs() < 1e-12);
        assert!((d.off[1].unwrap_or_default() - 0.10).abs() < 1e-12);
        assert!((d.def[1].unwrap_or_default() - 0.05).abs() < 1e-12);
    }

    #[test]
    fn idle_team_is_neutral() {
        let teams = vec![Team::new("A"), Team::new("B"), Team::new("Idle")];
        let games = vec![game("A", "B", 30, 0)];
        let refs: Vec<&Game> = games.iter().collect();
        let d = dominance(&teams, &refs, &[], &even_ratings(&["A", "B"]), 1500.0);
        assert_eq!(d.mov[2], None);
        assert_eq!(d.z_mov[2], 0.0);
        assert_eq!(d.z_off[2], 0.0);
    }

    #[test]
    fn uses_sample_spread() {
        let teams = vec![Team::new("A"), Team::new("B")];
        let games = vec![game("A", "B", 7, 0)];
        let refs: Vec<&Game> = games.iter().collect();
        let d = dominance(&teams, &refs, &[], &even_ratings(&["A", "B"]), 1500.0);
        // two mirrored values +-x: sample sd = x * sqrt(2), so z = 1 / sqrt(2)
        assert!((d.z_mov[0] - 1.0 / 2.0_f64.sqrt()).abs() < 1e-12);
    }
}
