use std::collections::{HashMap, HashSet};

use crate::model::{Game, Team, Window};

pub const DEFAULT_BASE_RATING: f64 = 1500.0;
const LOGISTIC_SCALE: f64 = 400.0;
const MAX_MARGIN_MULTIPLIER: f64 = 2.5;

pub type Ratings = HashMap<String, f64>;

#[derive(Debug, Clone, Copy)]
pub struct EloConfig {
    pub k: f64,
    pub home_adv_pts: f64,
    /// Applied when exactly one side is off the top-tier roster.
    pub fcs_weight: f64,
    pub base: f64,
}

impl Default for EloConfig {
    fn default() -> Self {
        Self {
            k: 20.0,
            home_adv_pts: 65.0,
            fcs_weight: 0.6,
            base: DEFAULT_BASE_RATING,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GameDeltas {
    pub home: f64,
    pub away: f64,
}

pub fn top_tier_names(teams: &[Team]) -> HashSet<&str> {
    teams
        .iter()
        .filter(|t| t.is_top_tier())
        .map(|t| t.school.as_str())
        .collect()
}

/// Final rating of every roster team (and every team seen in the window) after
/// replaying the in-window games in order. Each step consumes the previous map.
pub fn compute_elo_for_season(
    teams: &[Team],
    games: &[Game],
    window: Window,
    cfg: EloConfig,
) -> Ratings {
    let top_tier = top_tier_names(teams);
    let initial: Ratings = teams.iter().map(|t| (t.school.clone(), cfg.base)).collect();

    chronological(games, window)
        .into_iter()
        .fold(initial, |ratings, game| apply_game(ratings, game, &top_tier, &cfg))
}

/// In-window games sorted by week, then kickoff. Missing kickoffs sort first; the
/// sort is stable so input order decides remaining ties.
pub fn chronological(games: &[Game], window: Window) -> Vec<&Game> {
    let mut out = window.games(games);
    out.sort_by(|a, b| {
        a.week_or_zero()
            .cmp(&b.week_or_zero())
            .then(a.kickoff_millis().cmp(&b.kickoff_millis()))
    });
    out
}

fn apply_game(mut ratings: Ratings, game: &Game, top_tier: &HashSet<&str>, cfg: &EloConfig) -> Ratings {
    let Some(margin) = game.margin() else {
        return ratings;
    };
    let home = rating_of(&ratings, &game.home_team, cfg.base);
    let away = rating_of(&ratings, &game.away_team, cfg.base);
    let weight = game_weight(
        top_tier.contains(game.home_team.as_str()),
        top_tier.contains(game.away_team.as_str()),
        cfg.fcs_weight,
    );

    let deltas = rate_game(home, away, margin, game.is_neutral(), weight, cfg);
    ratings.insert(game.home_team.clone(), home + deltas.home);
    ratings.insert(game.away_team.clone(), away + deltas.away);
    ratings
}

pub fn rating_of(ratings: &Ratings, team: &str, base: f64) -> f64 {
    ratings.get(team).copied().unwrap_or(base)
}

/// Rating change for both sides of one game. `margin` is home minus away points.
pub fn rate_game(
    home: f64,
    away: f64,
    margin: i32,
    neutral: bool,
    weight: f64,
    cfg: &EloConfig,
) -> GameDeltas {
    let home_adj = if neutral { home } else { home + cfg.home_adv_pts };
    let expected_home = expected_score(home_adj, away);
    let actual_home = if margin > 0 {
        1.0
    } else if margin < 0 {
        0.0
    } else {
        0.5
    };

    let delta = cfg.k * margin_multiplier(margin) * (actual_home - expected_home) * weight;
    GameDeltas {
        home: delta,
        away: -delta,
    }
}

pub fn expected_score(r_a: f64, r_b: f64) -> f64 {
    1.0 / (1.0 + 10.0_f64.powf(-(r_a - r_b) / LOGISTIC_SCALE))
}

/// ln(|margin| + 1) capped at 2.5; a tie is scored as a one-point margin.
pub fn margin_multiplier(margin: i32) -> f64 {
    let points = if margin == 0 {
        1.0
    } else {
        f64::from(margin.unsigned_abs())
    };
    (points + 1.0).ln().min(MAX_MARGIN_MULTIPLIER)
}

pub fn game_weight(home_top_tier: bool, away_top_tier: bool, fcs_weight: f64) -> f64 {
    if home_top_tier != away_top_tier {
        fcs_weight
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game(week: u32, home: &str, away: &str, hp: i32, ap: i32) -> Game {
        Game {
            week: Some(week),
            home_team: home.to_string(),
            away_team: away.to_string(),
            home_points: Some(hp),
            away_points: Some(ap),
            neutral_site: Some(true),
            ..Game::default()
        }
    }

    #[test]
    fn margin_multiplier_caps_and_handles_ties() {
        assert!((margin_multiplier(0) - 2.0_f64.ln()).abs() < 1e-12);
        assert!((margin_multiplier(3) - 4.0_f64.ln()).abs() < 1e-12);
        assert!((margin_multiplier(-3) - 4.0_f64.ln()).abs() < 1e-12);
        assert_eq!(margin_multiplier(14), 2.5);
        assert_eq!(margin_multiplier(60), 2.5);
    }

    #[test]
    fn neutral_fourteen_point_win_between_equals() {
        let teams = vec![Team::new("A"), Team::new("B")];
        let cfg = EloConfig {
            fcs_weight: 1.0,
            ..EloConfig::default()
        };
        let ratings = compute_elo_for_season(&teams, &[game(1, "A", "B", 28, 14)], Window::all(), cfg);
        // ln(15) exceeds the 2.5 cap, so the swing is 20 * 2.5 * 0.5.
        assert!((ratings["A"] - 1525.0).abs() < 1e-9);
        assert!((ratings["B"] - 1475.0).abs() < 1e-9);
    }

    #[test]
    fn uncapped_margin_follows_log_formula() {
        let cfg = EloConfig::default();
        let d = rate_game(1500.0, 1500.0, 5, true, 1.0, &cfg);
        let expected = 20.0 * 6.0_f64.ln() * 0.5;
        assert!((d.home - expected).abs() < 1e-9);
    }

    #[test]
    fn deltas_are_exact_negatives() {
        let cfg = EloConfig::default();
        for (h, a, m) in [(1500.0, 1500.0, 1), (1612.3, 1433.9, -7), (1400.0, 1700.0, 0)] {
            let d = rate_game(h, a, m, true, 1.0, &cfg);
            assert_eq!(d.home, -d.away);
        }
    }

    #[test]
    fn neutral_flag_only_moves_expected_score() {
        let cfg = EloConfig::default();
        let neutral = rate_game(1500.0, 1500.0, 3, true, 1.0, &cfg);
        let home = rate_game(1500.0, 1500.0, 3, false, 1.0, &cfg);
        let expected_home = expected_score(1565.0, 1500.0);
        let by_hand = cfg.k * margin_multiplier(3) * (1.0 - expected_home);
        assert!((home.home - by_hand).abs() < 1e-12);
        assert!(home.home < neutral.home);
    }

    #[test]
    fn fcs_weight_applies_only_to_mixed_tier_games() {
        assert_eq!(game_weight(true, false, 0.6), 0.6);
        assert_eq!(game_weight(false, true, 0.6), 0.6);
        assert_eq!(game_weight(true, true, 0.6), 1.0);
        assert_eq!(game_weight(false, false, 0.6), 1.0);
    }

    #[test]
    fn off_roster_opponent_is_rated_from_base() {
        let teams = vec![Team::new("A")];
        let ratings = compute_elo_for_season(
            &teams,
            &[game(1, "A", "Tiny State", 3, 0)],
            Window::all(),
            EloConfig::default(),
        );
        assert!(ratings["A"] > 1500.0);
        assert!(ratings["Tiny State"] < 1500.0);
        assert!((ratings["A"] - 1500.0 + ratings["Tiny State"] - 1500.0).abs() < 1e-9);
    }

    #[test]
    fn window_excludes_later_weeks() {
        let teams = vec![Team::new("A"), Team::new("B")];
        let games = vec![game(1, "A", "B", 10, 7), game(2, "B", "A", 35, 0)];
        let through_one =
            compute_elo_for_season(&teams, &games, Window::through(1), EloConfig::default());
        let full = compute_elo_for_season(&teams, &games, Window::all(), EloConfig::default());
        assert!(through_one["A"] > 1500.0);
        assert!(full["A"] < through_one["A"]);
    }

    #[test]
    fn chronological_orders_by_week_then_kickoff() {
        let mut late = game(1, "C", "D", 1, 0);
        late.start_date = Some("2024-08-31T23:00:00Z".to_string());
        let mut early = game(1, "E", "F", 1, 0);
        early.start_date = Some("2024-08-31T16:00:00Z".to_string());
        let undated = game(1, "G", "H", 1, 0);
        let week_zero = Game {
            week: None,
            ..game(0, "I", "J", 1, 0)
        };
        let games = vec![late, game(2, "A", "B", 1, 0), early, undated, week_zero];

        let order: Vec<&str> = chronological(&games, Window::all())
            .iter()
            .map(|g| g.home_team.as_str())
            .collect();
        assert_eq!(order, vec!["I", "G", "E", "C", "A"]);
    }
}
