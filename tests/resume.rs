mod common;

use std::collections::{HashMap, HashSet};

use cfb_rankings::elo::top_tier_names;
use cfb_rankings::model::{Game, ResumeMetrics, SeasonInputs, Window};
use cfb_rankings::resume::{ResumeThresholds, resume_metrics};
use cfb_rankings::{RankingConfig, compute_rankings};

use common::{game, lower_tier, small_season, team};

fn ranks<'a>(order: &[&'a str]) -> HashMap<&'a str, usize> {
    order.iter().enumerate().map(|(i, t)| (*t, i + 1)).collect()
}

#[test]
fn quality_wins_fill_both_buckets() {
    let teams = vec![team("Top", "A"), team("Mid", "A"), team("Low", "A")];
    let games = vec![game(1, 1, "Low", "Top", 20, 17), game(2, 2, "Low", "Mid", 10, 0)];
    let refs: Vec<&Game> = games.iter().collect();
    let top = top_tier_names(&teams);
    let mut r = ranks(&["Top", "Low"]);
    r.insert("Mid", 40);

    let m = resume_metrics(&teams, &refs, &r, &top, ResumeThresholds::default());
    let low = m["Low"];
    assert_eq!(low.quality_wins_25, 1);
    assert_eq!(low.quality_wins_50, 2);
    assert_eq!(low.rec_top25_w, 1);
    assert_eq!(low.rec_top50_w, 2);
    assert_eq!(low.one_score_w, 1);
    assert_eq!(m["Top"].rec_top25_l, 1);
    assert_eq!(m["Top"].one_score_l, 1);
    assert_eq!(m["Mid"].rec_top50_l, 1);
    assert_eq!(m["Mid"].one_score_l, 0);
}

#[test]
fn loss_to_unranked_or_low_ranked_team_is_bad() {
    let teams = vec![team("A", "X"), team("B", "X"), team("C", "X")];
    let games = vec![game(1, 1, "B", "A", 30, 10), game(2, 2, "C", "A", 30, 10)];
    let refs: Vec<&Game> = games.iter().collect();
    let top = top_tier_names(&teams);
    let mut r: HashMap<&str, usize> = HashMap::new();
    r.insert("A", 1);
    r.insert("B", 81);

    let m = resume_metrics(&teams, &refs, &r, &top, ResumeThresholds::default());
    assert_eq!(m["A"].bad_losses, 2);
    assert_eq!(m["A"].one_score_l, 0);

    let strict = ResumeThresholds {
        bad_loss_rank: 100,
        ..ResumeThresholds::default()
    };
    let m = resume_metrics(&teams, &refs, &r, &top, strict);
    assert_eq!(m["A"].bad_losses, 1);
}

#[test]
fn ties_and_lower_tier_only_games_are_ignored() {
    let teams = vec![team("A", "X"), lower_tier("Small One"), lower_tier("Small Two")];
    let games = vec![
        game(1, 1, "A", "Small One", 14, 14),
        game(2, 1, "Small One", "Small Two", 21, 20),
    ];
    let refs: Vec<&Game> = games.iter().collect();
    let top = top_tier_names(&teams);
    let r = ranks(&["Small Two", "A", "Small One"]);
    let m = resume_metrics(&teams, &refs, &r, &top, ResumeThresholds::default());
    for v in m.values() {
        assert_eq!(*v, ResumeMetrics::default());
    }
}

#[test]
fn one_score_counts_follow_close_decided_games() {
    let (teams, games) = small_season();
    let out = compute_rankings(
        &SeasonInputs::new(teams.clone(), games.clone()),
        &RankingConfig::default(),
        Window::all(),
    )
    .expect("ranking should succeed");
    let top: HashSet<&str> = top_tier_names(&teams);
    let close: Vec<&Game> = games
        .iter()
        .filter(|g| g.margin().is_some_and(|m| m != 0 && m.abs() <= 8))
        .collect();
    let expected_w = close
        .iter()
        .filter_map(|g| g.winner_loser())
        .filter(|(w, _)| top.contains(w))
        .count() as u32;
    let expected_l = close
        .iter()
        .filter_map(|g| g.winner_loser())
        .filter(|(_, l)| top.contains(l))
        .count() as u32;

    let wins: u32 = out.rankings.iter().map(|r| r.resume.one_score_w).sum();
    let losses: u32 = out.rankings.iter().map(|r| r.resume.one_score_l).sum();
    assert_eq!(wins, expected_w);
    assert_eq!(losses, expected_l);
    // the lower-tier upset of Foxtrot only charges the loser
    assert_eq!(losses, wins + 1);
}
