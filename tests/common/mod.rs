#![allow(dead_code)]

use cfb_rankings::model::{Game, Team};

pub fn team(name: &str, conference: &str) -> Team {
    Team {
        conference: Some(conference.to_string()),
        ..Team::new(name)
    }
}

pub fn lower_tier(name: &str) -> Team {
    Team {
        classification: Some("fcs".to_string()),
        ..Team::new(name)
    }
}

pub fn game(id: u64, week: u32, home: &str, away: &str, hp: i32, ap: i32) -> Game {
    Game {
        id,
        season: 2024,
        week: Some(week),
        home_team: home.to_string(),
        away_team: away.to_string(),
        home_points: Some(hp),
        away_points: Some(ap),
        ..Game::default()
    }
}

/// Six top-tier teams and one lower-tier team over three weeks.
pub fn small_season() -> (Vec<Team>, Vec<Game>) {
    let teams = vec![
        team("Alpha", "East"),
        team("Bravo", "East"),
        team("Charlie", "East"),
        team("Delta", "West"),
        team("Echo", "West"),
        team("Foxtrot", "West"),
        lower_tier("Gulf State"),
    ];
    let games = vec![
        game(1, 1, "Alpha", "Bravo", 31, 10),
        game(2, 1, "Charlie", "Delta", 17, 20),
        game(3, 1, "Echo", "Gulf State", 45, 3),
        game(4, 2, "Bravo", "Charlie", 24, 24),
        game(5, 2, "Delta", "Alpha", 14, 35),
        game(6, 2, "Foxtrot", "Echo", 21, 28),
        game(7, 3, "Alpha", "Echo", 27, 26),
        game(8, 3, "Gulf State", "Foxtrot", 30, 27),
        game(9, 3, "Bravo", "Delta", 10, 3),
    ];
    (teams, games)
}
