use criterion::{Criterion, criterion_group, criterion_main};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::hint::black_box;

use cfb_rankings::delta::compute_delta;
use cfb_rankings::elo::{EloConfig, compute_elo_for_season};
use cfb_rankings::model::{BettingLine, Game, PpaTeam, SeasonInputs, Team, Window};
use cfb_rankings::{RankingConfig, compute_rankings};

const TEAMS: usize = 134;
const WEEKS: u32 = 13;

fn synthetic_season() -> SeasonInputs {
    let mut rng = StdRng::seed_from_u64(26);
    let teams: Vec<Team> = (0..TEAMS)
        .map(|i| Team {
            conference: Some(format!("Conf {}", i / 14)),
            ..Team::new(&format!("Team {i:03}"))
        })
        .collect();

    let mut games = Vec::new();
    let mut lines = Vec::new();
    let mut id = 1u64;
    for week in 1..=WEEKS {
        let mut order: Vec<usize> = (0..TEAMS).collect();
        order.shuffle(&mut rng);
        for pair in order.chunks(2) {
            let [home, away] = pair else { continue };
            games.push(Game {
                id,
                season: 2024,
                week: Some(week),
                home_team: teams[*home].school.clone(),
                away_team: teams[*away].school.clone(),
                home_points: Some(rng.gen_range(0..56)),
                away_points: Some(rng.gen_range(0..49)),
                ..Game::default()
            });
            lines.push(BettingLine {
                game_id: Some(id),
                spread: Some(rng.gen_range(-28.0..28.0)),
                ..BettingLine::default()
            });
            id += 1;
        }
    }

    let ppa_teams = teams
        .iter()
        .map(|t| PpaTeam {
            team: t.school.clone(),
            off_overall: Some(rng.gen_range(-0.2..0.5)),
            def_overall: Some(rng.gen_range(-0.2..0.5)),
            ..PpaTeam::default()
        })
        .collect();

    SeasonInputs {
        season: Some(2024),
        ppa_teams,
        lines,
        ..SeasonInputs::new(teams, games)
    }
}

fn bench_elo_replay(c: &mut Criterion) {
    let inputs = synthetic_season();
    c.bench_function("elo_replay", |b| {
        b.iter(|| {
            let ratings = compute_elo_for_season(
                black_box(&inputs.teams),
                black_box(&inputs.games),
                Window::all(),
                EloConfig::default(),
            );
            black_box(ratings.len());
        })
    });
}

fn bench_rankings_compute(c: &mut Criterion) {
    let inputs = synthetic_season();
    let cfg = RankingConfig::default();
    c.bench_function("rankings_compute", |b| {
        b.iter(|| {
            let out = compute_rankings(black_box(&inputs), &cfg, Window::all())
                .expect("synthetic season ranks");
            black_box(out.rankings.len());
        })
    });
}

fn bench_delta_compute(c: &mut Criterion) {
    let inputs = synthetic_season();
    let cfg = RankingConfig::default();
    c.bench_function("delta_compute", |b| {
        b.iter(|| {
            let out = compute_delta(black_box(&inputs), &cfg, 8).expect("synthetic delta");
            black_box(out.rankings.len());
        })
    });
}

criterion_group!(
    benches,
    bench_elo_replay,
    bench_rankings_compute,
    bench_delta_compute
);
criterion_main!(benches);
