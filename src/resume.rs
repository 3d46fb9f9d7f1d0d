use std::collections::{HashMap, HashSet};

use crate::model::{Game, ResumeMetrics, SeasonRecord, Team};

const UNRANKED: usize = usize::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResumeThresholds {
    pub quality_rank: usize,
    pub second_tier_rank: usize,
    /// A loss to a team ranked worse than this is a bad loss.
    pub bad_loss_rank: usize,
    pub one_score_margin: i32,
}

impl Default for ResumeThresholds {
    fn default() -> Self {
        Self {
            quality_rank: 25,
            second_tier_rank: 50,
            bad_loss_rank: 80,
            one_score_margin: 8,
        }
    }
}

/// Rank-based bookkeeping over decided games. Ranks come from the composite
/// ordering; a team missing from `ranks` counts as unranked.
pub fn resume_metrics(
    teams: &[Team],
    games: &[&Game],
    ranks: &HashMap<&str, usize>,
    top_tier: &HashSet<&str>,
    th: ResumeThresholds,
) -> HashMap<String, ResumeMetrics> {
    let mut out: HashMap<String, ResumeMetrics> = teams
        .iter()
        .map(|t| (t.school.clone(), ResumeMetrics::default()))
        .collect();
    let rank_of = |team: &str| ranks.get(team).copied().unwrap_or(UNRANKED);

    for g in games {
        let home_top = top_tier.contains(g.home_team.as_str());
        let away_top = top_tier.contains(g.away_team.as_str());
        if !home_top && !away_top {
            continue;
        }
        let Some(margin) = g.margin() else {
            continue;
        };
        let Some((winner, loser)) = g.winner_loser() else {
            continue;
        };
        let one_score = margin.unsigned_abs() <= th.one_score_margin.unsigned_abs();
        let opp_of_winner = rank_of(loser);
        let opp_of_loser = rank_of(winner);

        if let Some(m) = out.get_mut(winner).filter(|_| top_tier.contains(winner)) {
            if one_score {
                m.one_score_w += 1;
            }
            if opp_of_winner <= th.quality_rank {
                m.quality_wins_25 += 1;
                m.rec_top25_w += 1;
            }
            if opp_of_winner <= th.second_tier_rank {
                m.quality_wins_50 += 1;
                m.rec_top50_w += 1;
            }
        }

        if let Some(m) = out.get_mut(loser).filter(|_| top_tier.contains(loser)) {
            if one_score {
                m.one_score_l += 1;
            }
            if opp_of_loser <= th.quality_rank {
                m.rec_top25_l += 1;
            }
            if opp_of_loser <= th.second_tier_rank {
                m.rec_top50_l += 1;
            }
            if opp_of_loser > th.bad_loss_rank {
                m.bad_losses += 1;
            }
        }
    }
    out
}

#[derive(Default)]
struct Acc {
    wins: f64,
    losses: f64,
    points_for: i64,
    points_against: i64,
    games: u32,
}

/// Win/loss record and scoring over scored in-window games. A tie counts half
/// a win and half a loss for both sides.
pub fn season_records(teams: &[Team], games: &[&Game]) -> Vec<SeasonRecord> {
    let mut acc: HashMap<&str, Acc> = HashMap::new();
    for g in games {
        let Some((hp, ap)) = g.scores() else {
            continue;
        };
        for (team, own, opp) in [
            (g.home_team.as_str(), hp, ap),
            (g.away_team.as_str(), ap, hp),
        ] {
            let a = acc.entry(team).or_default();
            a.points_for += i64::from(own);
            a.points_against += i64::from(opp);
            a.games += 1;
            match own.cmp(&opp) {
                std::cmp::Ordering::Greater => a.wins += 1.0,
                std::cmp::Ordering::Less => a.losses += 1.0,
                std::cmp::Ordering::Equal => {
                    a.wins += 0.5;
                    a.losses += 0.5;
                }
            }
        }
    }

    teams
        .iter()
        .map(|t| {
            let Some(a) = acc.get(t.school.as_str()) else {
                return SeasonRecord::default();
            };
            let decided = a.wins + a.losses;
            let point_diff = a.points_for - a.points_against;
            SeasonRecord {
                wins: a.wins,
                losses: a.losses,
                points_for: a.points_for,
                points_against: a.points_against,
                point_diff,
                win_pct: if decided > 0.0 { a.wins / decided } else { 0.0 },
                avg_margin: if a.games > 0 {
                    point_diff as f64 / f64::from(a.games)
                } else {
                    0.0
                },
            }
        })
        .collect()
}
