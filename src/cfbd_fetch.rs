use std::env;

use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::cache::{DataDir, dataset_file};
use crate::http_client::get_json;
use crate::model::{
    AdvancedSeasonTeam, AdvancedSide, BettingLine, ExternalElo, ExternalSrs, Game, PpaTeam,
    ReturningProduction, SpRating, TalentRow, Team,
};

pub const API_BASES: [&str; 2] = [
    "https://apinext.collegefootballdata.com",
    "https://api.collegefootballdata.com",
];

const WRAPPER_KEYS: [&str; 6] = ["data", "items", "results", "teams", "games", "lines"];

#[derive(Debug, Clone)]
pub struct CfbdClient {
    api_key: String,
    bases: Vec<String>,
}

impl CfbdClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            bases: API_BASES.iter().map(|b| b.to_string()).collect(),
        }
    }

    pub fn from_env() -> Result<Self> {
        let key = env::var("CFBD_API_KEY")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| anyhow!("CFBD_API_KEY is required for ingest"))?;
        Ok(Self::new(key))
    }

    /// First successful response across every base and path, in order.
    fn get_any(&self, paths: &[&str], params: &[(&str, String)]) -> Result<Value> {
        let mut last_err = None;
        for base in &self.bases {
            for path in paths {
                let url = format!("{base}{path}");
                match get_json(&url, &self.api_key, params) {
                    Ok(v) => {
                        debug!(%url, "cfbd request ok");
                        return Ok(v);
                    }
                    Err(err) => {
                        debug!(%url, "{err:#}");
                        last_err = Some(err);
                    }
                }
            }
        }
        match last_err {
            Some(err) => Err(err).with_context(|| format!("cfbd request {}", paths.join(", "))),
            None => Err(anyhow!("cfbd request failed: no api base configured")),
        }
    }

    fn get_rows(&self, paths: &[&str], params: &[(&str, String)]) -> Result<Vec<Value>> {
        self.get_any(paths, params).map(to_array)
    }

    /// Optional datasets degrade to empty on failure.
    fn get_optional(&self, label: &str, paths: &[&str], params: &[(&str, String)]) -> Vec<Value> {
        match self.get_rows(paths, params) {
            Ok(rows) => rows,
            Err(err) => {
                warn!(dataset = label, "{err:#}");
                Vec::new()
            }
        }
    }
}

/// Unwraps the handful of envelope shapes the API answers with into a plain list.
pub fn to_array(data: Value) -> Vec<Value> {
    match data {
        Value::Array(items) => items,
        Value::Object(mut map) => {
            for key in WRAPPER_KEYS {
                if map.get(key).is_some_and(Value::is_array) {
                    if let Some(Value::Array(items)) = map.remove(key) {
                        return items;
                    }
                }
            }
            let values: Vec<Value> = map.into_iter().map(|(_, v)| v).collect();
            if !values.is_empty() && values.iter().all(Value::is_object) {
                values
            } else {
                Vec::new()
            }
        }
        _ => Vec::new(),
    }
}

fn text(v: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| v.get(*k))
        .find_map(|x| x.as_str().map(str::to_string))
}

/// First key holding a number, or a string that parses as one.
fn num(v: &Value, keys: &[&str]) -> Option<f64> {
    keys.iter().filter_map(|k| v.get(*k)).find_map(|x| match x {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

fn int(v: &Value, keys: &[&str]) -> Option<i64> {
    keys.iter().filter_map(|k| v.get(*k)).find_map(|x| match x {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

fn flag(v: &Value, keys: &[&str]) -> Option<bool> {
    keys.iter().filter_map(|k| v.get(*k)).find_map(Value::as_bool)
}

pub fn parse_team(v: &Value) -> Option<Team> {
    let logos = v.get("logos").and_then(Value::as_array).map(|arr| {
        arr.iter()
            .filter_map(|l| l.as_str().map(str::to_string))
            .collect()
    });
    Some(Team {
        id: int(v, &["id"]).and_then(|i| u64::try_from(i).ok()),
        school: text(v, &["school"])?,
        mascot: text(v, &["mascot"]),
        conference: text(v, &["conference"]),
        classification: text(v, &["classification", "division"]),
        logos,
        abbreviation: text(v, &["abbreviation"]),
    })
}

/// Completed games only; a game without both scores is dropped.
pub fn parse_game(v: &Value) -> Option<Game> {
    let home_points = int(v, &["homePoints", "home_points"])?;
    let away_points = int(v, &["awayPoints", "away_points"])?;
    Some(Game {
        id: int(v, &["id"]).and_then(|i| u64::try_from(i).ok()).unwrap_or(0),
        season: int(v, &["season"]).and_then(|i| i32::try_from(i).ok()).unwrap_or(0),
        week: int(v, &["week"]).and_then(|i| u32::try_from(i).ok()),
        season_type: text(v, &["seasonType", "season_type"]),
        start_date: text(v, &["startDate", "start_date"]),
        neutral_site: flag(v, &["neutralSite", "neutral_site"]),
        conference_game: flag(v, &["conferenceGame", "conference_game"]),
        venue: text(v, &["venue"]),
        home_team: text(v, &["homeTeam", "home_team"])?,
        home_conference: text(v, &["homeConference", "home_conference"]),
        home_points: i32::try_from(home_points).ok(),
        away_team: text(v, &["awayTeam", "away_team"])?,
        away_conference: text(v, &["awayConference", "away_conference"]),
        away_points: i32::try_from(away_points).ok(),
    })
}

fn parse_side(v: Option<&Value>) -> Option<AdvancedSide> {
    let v = v?;
    Some(AdvancedSide {
        success_rate: num(v, &["successRate", "success_rate"]),
        ppa: num(v, &["ppa"]),
    })
}

pub fn parse_advanced(v: &Value) -> Option<AdvancedSeasonTeam> {
    Some(AdvancedSeasonTeam {
        season: int(v, &["season"]).and_then(|i| i32::try_from(i).ok()),
        team: text(v, &["team"])?,
        conference: text(v, &["conference"]),
        offense: parse_side(v.get("offense")),
        defense: parse_side(v.get("defense")),
    })
}

pub fn parse_ppa_team(v: &Value, year: i32) -> Option<PpaTeam> {
    let nested = |side: &str| v.get(side).and_then(|s| num(s, &["overall"]));
    Some(PpaTeam {
        season: int(v, &["season"]).and_then(|i| i32::try_from(i).ok()).or(Some(year)),
        team: text(v, &["team", "school"])?,
        conference: text(v, &["conference"]),
        off_overall: num(v, &["off_overall"]).or_else(|| nested("offense")),
        def_overall: num(v, &["def_overall"]).or_else(|| nested("defense")),
    })
}

pub fn parse_sp(v: &Value) -> Option<SpRating> {
    let side = |key: &str| {
        v.get(key).and_then(|x| match x {
            Value::Object(_) => num(x, &["rating"]),
            _ => num(v, &[key]),
        })
    };
    Some(SpRating {
        team: text(v, &["team", "school", "name"])?,
        rating: num(v, &["rating", "overall"]),
        offense: side("offense"),
        defense: side("defense"),
        special_teams: num(v, &["specialTeams", "st"]).or_else(|| {
            v.get("specialTeams")
                .and_then(|x| num(x, &["rating"]))
        }),
    })
}

pub fn parse_talent(v: &Value) -> Option<TalentRow> {
    Some(TalentRow {
        school: text(v, &["school", "team", "name"])?,
        talent: num(v, &["talent"]),
    })
}

pub fn parse_returning(v: &Value, year: i32) -> Option<ReturningProduction> {
    Some(ReturningProduction {
        season: int(v, &["season"]).and_then(|i| i32::try_from(i).ok()).or(Some(year)),
        team: text(v, &["team", "school"])?,
        conference: text(v, &["conference"]),
        percent_ppa: num(v, &["percent_ppa", "percentPPA", "overall"]),
        offense_percent_ppa: num(v, &["offense_percent_ppa", "offense"]),
        defense_percent_ppa: num(v, &["defense_percent_ppa", "defense"]),
    })
}

/// One row per provider line. Game-level rows carrying a `lines` array are flattened.
pub fn parse_lines(v: &Value, year: i32) -> Vec<BettingLine> {
    let base = BettingLine {
        season: int(v, &["season"]).and_then(|i| i32::try_from(i).ok()).or(Some(year)),
        week: int(v, &["week"]).and_then(|i| u32::try_from(i).ok()),
        game_id: int(v, &["gameId", "id"]).and_then(|i| u64::try_from(i).ok()),
        home_team: text(v, &["homeTeam", "home_team"]),
        away_team: text(v, &["awayTeam", "away_team"]),
        spread: num(v, &["spread", "formattedSpread", "homeSpread"]),
        provider: text(v, &["provider", "providerName"]),
        over_under: num(v, &["overUnder", "total"]),
    };
    match v.get("lines").and_then(Value::as_array) {
        Some(provider_lines) if base.spread.is_none() => provider_lines
            .iter()
            .map(|l| BettingLine {
                spread: num(l, &["spread", "homeSpread"]),
                provider: text(l, &["provider", "providerName"]),
                over_under: num(l, &["overUnder", "total"]),
                ..base.clone()
            })
            .collect(),
        _ => vec![base],
    }
}

pub fn parse_external_elo(v: &Value) -> Option<ExternalElo> {
    Some(ExternalElo {
        team: text(v, &["team", "school"])?,
        elo: num(v, &["rating", "elo"]),
    })
}

pub fn parse_external_srs(v: &Value) -> Option<ExternalSrs> {
    Some(ExternalSrs {
        team: text(v, &["team", "school"])?,
        srs: num(v, &["rating", "srs"]),
    })
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IngestCounts {
    pub teams: usize,
    pub games: usize,
    pub advanced: usize,
    pub ppa_teams: usize,
    pub sp: usize,
    pub talent: usize,
    pub returning: usize,
    pub lines: usize,
    pub elo_ext: usize,
    pub srs_ext: usize,
    pub calendar: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IngestMeta {
    pub year: i32,
    pub end_week: Option<u32>,
    pub ingested_at: String,
    pub datasets: IngestCounts,
}

fn year_params(year: i32) -> Vec<(&'static str, String)> {
    vec![("year", year.to_string())]
}

/// Pull every dataset for a season into the data directory. Roster and games are
/// required; every other dataset is written empty when the API refuses it.
pub fn ingest(client: &CfbdClient, dir: &DataDir, year: i32, end_week: Option<u32>) -> Result<IngestMeta> {
    dir.ensure()?;
    let mut counts = IngestCounts::default();

    let mut params = year_params(year);
    params.push(("classification", "fbs".to_string()));
    let teams: Vec<Team> = client
        .get_rows(&["/teams/fbs", "/teams"], &params)
        .context("fetch teams")?
        .iter()
        .filter_map(parse_team)
        .collect();
    counts.teams = teams.len();
    dir.write_json(&dataset_file("teams", year, None), &teams)?;
    info!(year, teams = teams.len(), "ingested teams");

    let mut params = year_params(year);
    params.push(("classification", "fbs".to_string()));
    params.push(("seasonType", "regular".to_string()));
    let games: Vec<Game> = client
        .get_rows(&["/games"], &params)
        .context("fetch games")?
        .iter()
        .filter_map(parse_game)
        .collect();
    counts.games = games.len();
    dir.write_json(&dataset_file("games", year, None), &games)?;
    info!(year, games = games.len(), "ingested completed games");

    let mut params = year_params(year);
    params.push(("excludeGarbageTime", "true".to_string()));
    if let Some(w) = end_week {
        params.push(("endWeek", w.to_string()));
    }
    let advanced_raw = match client.get_rows(&["/stats/season/advanced"], &params) {
        Ok(rows) => rows,
        Err(err) if end_week.is_some() => {
            debug!("{err:#}; retrying advanced stats without week bounds");
            params.retain(|(k, _)| *k != "endWeek");
            client.get_optional("advanced", &["/stats/season/advanced"], &params)
        }
        Err(err) => {
            warn!(dataset = "advanced", "{err:#}");
            Vec::new()
        }
    };
    let advanced: Vec<AdvancedSeasonTeam> = advanced_raw.iter().filter_map(parse_advanced).collect();
    counts.advanced = advanced.len();
    dir.write_json(&dataset_file("advanced", year, end_week), &advanced)?;

    let mut params = year_params(year);
    if let Some(w) = end_week {
        params.push(("week", w.to_string()));
    }
    let ppa_teams: Vec<PpaTeam> = client
        .get_optional("ppa-teams", &["/ppa/teams"], &params)
        .iter()
        .filter_map(|v| parse_ppa_team(v, year))
        .collect();
    counts.ppa_teams = ppa_teams.len();
    dir.write_json(&dataset_file("ppa-teams", year, end_week), &ppa_teams)?;

    let sp: Vec<SpRating> = client
        .get_optional("sp", &["/ratings/sp"], &year_params(year))
        .iter()
        .filter_map(parse_sp)
        .collect();
    counts.sp = sp.len();
    dir.write_json(&dataset_file("sp", year, None), &sp)?;

    let talent: Vec<TalentRow> = client
        .get_optional("talent", &["/talent"], &year_params(year))
        .iter()
        .filter_map(parse_talent)
        .collect();
    counts.talent = talent.len();
    dir.write_json(&dataset_file("talent", year, None), &talent)?;

    let returning: Vec<ReturningProduction> = client
        .get_optional(
            "returning",
            &[
                "/stats/season/returning",
                "/stats/season/returningProduction",
                "/returning/production",
            ],
            &year_params(year),
        )
        .iter()
        .filter_map(|v| parse_returning(v, year))
        .collect();
    counts.returning = returning.len();
    dir.write_json(&dataset_file("returning", year, None), &returning)?;

    let mut params = year_params(year);
    params.push(("seasonType", "regular".to_string()));
    if let Some(w) = end_week {
        params.push(("week", w.to_string()));
    }
    let lines: Vec<BettingLine> = client
        .get_optional("lines", &["/lines"], &params)
        .iter()
        .flat_map(|v| parse_lines(v, year))
        .collect();
    counts.lines = lines.len();
    dir.write_json(&dataset_file("lines", year, end_week), &lines)?;

    let elo_ext: Vec<ExternalElo> = client
        .get_optional("elo-ext", &["/ratings/elo"], &year_params(year))
        .iter()
        .filter_map(parse_external_elo)
        .collect();
    counts.elo_ext = elo_ext.len();
    dir.write_json(&dataset_file("elo-ext", year, None), &elo_ext)?;

    let srs_ext: Vec<ExternalSrs> = client
        .get_optional("srs-ext", &["/ratings/srs"], &year_params(year))
        .iter()
        .filter_map(parse_external_srs)
        .collect();
    counts.srs_ext = srs_ext.len();
    dir.write_json(&dataset_file("srs-ext", year, None), &srs_ext)?;

    let mut params = year_params(year);
    params.push(("seasonType", "regular".to_string()));
    let calendar = client.get_optional("calendar", &["/calendar"], &params);
    counts.calendar = calendar.len();
    dir.write_json(&dataset_file("calendar", year, None), &calendar)?;

    let meta = IngestMeta {
        year,
        end_week,
        ingested_at: Utc::now().to_rfc3339(),
        datasets: counts,
    };
    dir.write_json(&dataset_file("ingest-meta", year, end_week), &meta)?;
    info!(year, ?end_week, datasets = ?meta.datasets, "ingest complete");
    Ok(meta)
}
