use std::collections::{HashMap, HashSet};

use crate::elo::{Ratings, rating_of};
use crate::model::{Game, Team};
use crate::zscore::population;

#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleStrength {
    /// Mean end-of-window opponent rating, in roster order.
    pub avg_opp_rating: Vec<f64>,
    pub z: Vec<f64>,
}

/// Opponent ratings are read from the final map, not as of the game date.
/// Only games with both sides on the top-tier roster count.
pub fn schedule_strength(
    teams: &[Team],
    games: &[&Game],
    ratings: &Ratings,
    top_tier: &HashSet<&str>,
    base: f64,
) -> ScheduleStrength {
    let mut opp_ratings: HashMap<&str, Vec<f64>> = HashMap::new();
    for g in games {
        let (home, away) = (g.home_team.as_str(), g.away_team.as_str());
        if !(top_tier.contains(home) && top_tier.contains(away)) {
            continue;
        }
        opp_ratings
            .entry(home)
            .or_default()
            .push(rating_of(ratings, away, base));
        opp_ratings
            .entry(away)
            .or_default()
            .push(rating_of(ratings, home, base));
    }

    let avg_opp_rating: Vec<f64> = teams
        .iter()
        .map(|t| match opp_ratings.get(t.school.as_str()) {
            Some(list) if !list.is_empty() => list.iter().sum::<f64>() / list.len() as f64,
            _ => base,
        })
        .collect();
    let known: Vec<Option<f64>> = avg_opp_rating.iter().copied().map(Some).collect();
    let z = population(&known);

    ScheduleStrength { avg_opp_rating, z }
}
