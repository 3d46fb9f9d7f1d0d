use std::fs;
use std::path::PathBuf;

use serde_json::{Value, json};

use cfb_rankings::cfbd_fetch::{
    parse_advanced, parse_game, parse_lines, parse_ppa_team, parse_sp, parse_team, to_array,
};

fn read_fixture(name: &str) -> Value {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    let raw = fs::read_to_string(path).expect("fixture file should be readable");
    serde_json::from_str(&raw).expect("fixture should be json")
}

#[test]
fn parses_completed_games_with_either_key_style() {
    let rows = to_array(read_fixture("cfbd_games.json"));
    assert_eq!(rows.len(), 3);
    let games: Vec<_> = rows.iter().filter_map(parse_game).collect();
    assert_eq!(games.len(), 2);

    assert_eq!(games[0].id, 401520145);
    assert_eq!(games[0].home_team, "Ohio State");
    assert_eq!(games[0].scores(), Some((52, 6)));
    assert_eq!(games[0].conference_game, Some(true));
    assert_eq!(games[0].home_conference.as_deref(), Some("Big Ten"));

    assert_eq!(games[1].home_team, "Georgia");
    assert_eq!(games[1].scores(), Some((34, 3)));
    assert!(games[1].is_neutral());
    assert!(games[1].kickoff_millis().is_some());
}

#[test]
fn parses_team_listing() {
    let teams: Vec<_> = to_array(read_fixture("cfbd_teams.json"))
        .iter()
        .filter_map(parse_team)
        .collect();
    assert_eq!(teams.len(), 2);
    assert_eq!(teams[0].school, "Ohio State");
    assert_eq!(teams[0].id, Some(194));
    assert!(teams[0].logo().is_some_and(|l| l.ends_with("194.png")));
    assert_eq!(teams[1].classification.as_deref(), Some("fbs"));
    assert!(teams[1].is_top_tier());
    assert_eq!(teams[1].logo(), None);
}

#[test]
fn flattens_provider_lines() {
    let lines: Vec<_> = to_array(read_fixture("cfbd_lines.json"))
        .iter()
        .flat_map(|v| parse_lines(v, 2024))
        .collect();
    assert_eq!(lines.len(), 3);

    assert_eq!(lines[0].game_id, Some(401520145));
    assert_eq!(lines[0].provider.as_deref(), Some("Bovada"));
    assert_eq!(lines[0].spread, Some(-49.5));
    assert_eq!(lines[0].over_under, Some(58.5));
    assert_eq!(lines[1].spread, Some(-48.5));
    assert_eq!(lines[1].home_team.as_deref(), Some("Ohio State"));

    assert_eq!(lines[2].game_id, Some(401520146));
    assert_eq!(lines[2].season, Some(2024));
    assert_eq!(lines[2].spread, Some(-13.5));
}

#[test]
fn unwraps_envelopes_and_keyed_maps() {
    assert_eq!(to_array(json!({"teams": [{"school": "A"}]})).len(), 1);
    assert_eq!(
        to_array(json!({"A": {"school": "A"}, "B": {"school": "B"}})).len(),
        2
    );
    assert!(to_array(json!({"count": 3})).is_empty());
    assert!(to_array(json!("nope")).is_empty());
}

#[test]
fn parses_nested_and_flat_ratings() {
    let ppa = parse_ppa_team(
        &json!({"team": "Texas", "offense": {"overall": 0.31}, "defense": {"overall": 0.08}}),
        2024,
    )
    .expect("ppa row");
    assert_eq!(ppa.season, Some(2024));
    assert_eq!(ppa.off_overall, Some(0.31));
    assert_eq!(ppa.def_overall, Some(0.08));

    let flat = parse_ppa_team(&json!({"team": "Rice", "off_overall": "0.05"}), 2024)
        .expect("flat ppa row");
    assert_eq!(flat.off_overall, Some(0.05));
    assert_eq!(flat.def_overall, None);

    let sp = parse_sp(&json!({
        "team": "Oregon",
        "rating": 27.4,
        "offense": {"rating": 40.1},
        "defense": {"rating": 12.7}
    }))
    .expect("sp row");
    assert_eq!(sp.rating, Some(27.4));
    assert_eq!(sp.offense, Some(40.1));
    assert_eq!(sp.defense, Some(12.7));

    let adv = parse_advanced(&json!({
        "season": 2024,
        "team": "Navy",
        "offense": {"successRate": 0.47, "ppa": 0.21},
        "defense": {"success_rate": 0.39}
    }))
    .expect("advanced row");
    let off = adv.offense.expect("offense side");
    assert_eq!(off.success_rate, Some(0.47));
    assert_eq!(off.ppa, Some(0.21));
    assert_eq!(adv.defense.and_then(|d| d.success_rate), Some(0.39));
    assert!(parse_advanced(&json!({"season": 2024})).is_none());
}
