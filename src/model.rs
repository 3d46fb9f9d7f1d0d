use chrono::DateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    #[serde(default)]
    pub id: Option<u64>,
    pub school: String,
    #[serde(default)]
    pub mascot: Option<String>,
    #[serde(default)]
    pub conference: Option<String>,
    #[serde(default)]
    pub classification: Option<String>,
    #[serde(default)]
    pub logos: Option<Vec<String>>,
    #[serde(default)]
    pub abbreviation: Option<String>,
}

impl Team {
    pub fn new(school: &str) -> Self {
        Self {
            school: school.to_string(),
            classification: Some("fbs".to_string()),
            ..Self::default()
        }
    }

    /// Rostered teams without a classification came from the FBS team listing.
    pub fn is_top_tier(&self) -> bool {
        self.classification
            .as_deref()
            .is_none_or(|c| c.trim().eq_ignore_ascii_case("fbs"))
    }

    pub fn logo(&self) -> Option<&str> {
        self.logos
            .as_ref()
            .and_then(|logos| logos.first())
            .map(String::as_str)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub season: i32,
    #[serde(default)]
    pub week: Option<u32>,
    #[serde(default)]
    pub season_type: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub neutral_site: Option<bool>,
    #[serde(default)]
    pub conference_game: Option<bool>,
    #[serde(default)]
    pub venue: Option<String>,
    pub home_team: String,
    #[serde(default)]
    pub home_conference: Option<String>,
    #[serde(default)]
    pub home_points: Option<i32>,
    pub away_team: String,
    #[serde(default)]
    pub away_conference: Option<String>,
    #[serde(default)]
    pub away_points: Option<i32>,
}

impl Game {
    pub fn week_or_zero(&self) -> u32 {
        self.week.unwrap_or(0)
    }

    pub fn is_neutral(&self) -> bool {
        self.neutral_site.unwrap_or(false)
    }

    pub fn scores(&self) -> Option<(i32, i32)> {
        match (self.home_points, self.away_points) {
            (Some(h), Some(a)) => Some((h, a)),
            _ => None,
        }
    }

    /// Home points minus away points. Scores whose difference overflows are
    /// treated as unscored.
    pub fn margin(&self) -> Option<i32> {
        self.scores().and_then(|(h, a)| h.checked_sub(a))
    }

    pub fn kickoff_millis(&self) -> Option<i64> {
        let raw = self.start_date.as_deref()?.trim();
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|dt| dt.timestamp_millis())
    }

    /// (winner, loser) for a decided game; ties and unscored games return None.
    pub fn winner_loser(&self) -> Option<(&str, &str)> {
        let margin = self.margin()?;
        if margin > 0 {
            Some((&self.home_team, &self.away_team))
        } else if margin < 0 {
            Some((&self.away_team, &self.home_team))
        } else {
            None
        }
    }
}

/// Inclusive "through week" bound applied to the game log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Window {
    pub through_week: Option<u32>,
}

impl Window {
    pub const fn all() -> Self {
        Self { through_week: None }
    }

    pub const fn through(week: u32) -> Self {
        Self {
            through_week: Some(week),
        }
    }

    pub fn contains(&self, game: &Game) -> bool {
        match self.through_week {
            None => true,
            Some(w) => game.week_or_zero() <= w,
        }
    }

    pub fn games<'a>(&self, games: &'a [Game]) -> Vec<&'a Game> {
        games.iter().filter(|g| self.contains(g)).collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct AdvancedSide {
    #[serde(default)]
    pub success_rate: Option<f64>,
    #[serde(default)]
    pub ppa: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct AdvancedSeasonTeam {
    #[serde(default)]
    pub season: Option<i32>,
    pub team: String,
    #[serde(default)]
    pub conference: Option<String>,
    #[serde(default)]
    pub offense: Option<AdvancedSide>,
    #[serde(default)]
    pub defense: Option<AdvancedSide>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SpRating {
    pub team: String,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub offense: Option<f64>,
    #[serde(default)]
    pub defense: Option<f64>,
    #[serde(default)]
    pub special_teams: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct TalentRow {
    pub school: String,
    #[serde(default)]
    pub talent: Option<f64>,
}

/// Season-level predicted-points-added ratings, adjusted against opponents downstream.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PpaTeam {
    #[serde(default)]
    pub season: Option<i32>,
    pub team: String,
    #[serde(default)]
    pub conference: Option<String>,
    #[serde(default)]
    pub off_overall: Option<f64>,
    #[serde(default)]
    pub def_overall: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ReturningProduction {
    #[serde(default)]
    pub season: Option<i32>,
    pub team: String,
    #[serde(default)]
    pub conference: Option<String>,
    #[serde(default)]
    pub percent_ppa: Option<f64>,
    #[serde(default)]
    pub offense_percent_ppa: Option<f64>,
    #[serde(default)]
    pub defense_percent_ppa: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct BettingLine {
    #[serde(default)]
    pub season: Option<i32>,
    #[serde(default)]
    pub week: Option<u32>,
    #[serde(default)]
    pub game_id: Option<u64>,
    #[serde(default)]
    pub home_team: Option<String>,
    #[serde(default)]
    pub away_team: Option<String>,
    /// Home-team spread: negative when the home side is favoured.
    #[serde(default)]
    pub spread: Option<f64>,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub over_under: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ExternalElo {
    pub team: String,
    #[serde(default)]
    pub elo: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ExternalSrs {
    pub team: String,
    #[serde(default)]
    pub srs: Option<f64>,
}

/// Everything one ranking computation reads. Only `teams` and `games` are required.
#[derive(Debug, Clone, Default)]
pub struct SeasonInputs {
    pub season: Option<i32>,
    pub teams: Vec<Team>,
    pub games: Vec<Game>,
    pub advanced: Vec<AdvancedSeasonTeam>,
    pub sp: Vec<SpRating>,
    pub talent: Vec<TalentRow>,
    pub ppa_teams: Vec<PpaTeam>,
    pub lines: Vec<BettingLine>,
    pub returning: Vec<ReturningProduction>,
    pub elo_ext: Vec<ExternalElo>,
    pub srs_ext: Vec<ExternalSrs>,
}

impl SeasonInputs {
    pub fn new(teams: Vec<Team>, games: Vec<Game>) -> Self {
        Self {
            teams,
            games,
            ..Self::default()
        }
    }

    pub fn datasets_used(&self) -> DatasetsUsed {
        DatasetsUsed {
            advanced: !self.advanced.is_empty(),
            sp: !self.sp.is_empty(),
            talent: !self.talent.is_empty(),
            ppa: !self.ppa_teams.is_empty(),
            lines: !self.lines.is_empty(),
            returning: !self.returning.is_empty(),
            elo_ext: !self.elo_ext.is_empty(),
            srs_ext: !self.srs_ext.is_empty(),
        }
    }

    pub fn max_week(&self) -> u32 {
        self.games.iter().map(Game::week_or_zero).max().unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct DatasetsUsed {
    pub advanced: bool,
    pub sp: bool,
    pub talent: bool,
    pub ppa: bool,
    pub lines: bool,
    pub returning: bool,
    pub elo_ext: bool,
    pub srs_ext: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SeasonRecord {
    pub wins: f64,
    pub losses: f64,
    pub points_for: i64,
    pub points_against: i64,
    pub point_diff: i64,
    pub win_pct: f64,
    pub avg_margin: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ResumeMetrics {
    pub quality_wins_25: u32,
    pub quality_wins_50: u32,
    pub bad_losses: u32,
    pub rec_top25_w: u32,
    pub rec_top25_l: u32,
    pub rec_top50_w: u32,
    pub rec_top50_l: u32,
    pub one_score_w: u32,
    pub one_score_l: u32,
}

/// Weighted share of the final score contributed by each signal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Contributions {
    pub elo: f64,
    pub play: f64,
    pub prior: f64,
    pub ppa: f64,
    pub market: f64,
    pub returning: f64,
    pub ext: f64,
    pub mov: f64,
    pub off: f64,
    pub def: f64,
    pub sos: f64,
    #[serde(rename = "preSoS")]
    pub pre_sos: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SignalZScores {
    pub elo: f64,
    pub play: f64,
    pub prior: f64,
    pub ppa: f64,
    pub market: f64,
    pub returning: f64,
    pub ext: f64,
    pub mov: f64,
    pub off: f64,
    pub def: f64,
    pub sos: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct RowExtras {
    pub ppa: f64,
    pub market: Option<f64>,
    pub returning: Option<f64>,
    pub ext: Option<f64>,
    pub mov: Option<f64>,
    pub off_dom: Option<f64>,
    pub def_dom: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RatingRow {
    pub rank: usize,
    pub team: String,
    pub conference: Option<String>,
    pub logo: Option<String>,
    pub elo: f64,
    pub play_quality: f64,
    pub prior: f64,
    pub score: f64,
    #[serde(flatten)]
    pub record: SeasonRecord,
    pub sos_avg_elo: f64,
    #[serde(flatten)]
    pub resume: ResumeMetrics,
    pub contr: Contributions,
    pub z: SignalZScores,
    pub extras: RowExtras,
}

impl RatingRow {
    /// Signed contributions ordered by magnitude, largest first.
    pub fn top_factors(&self, n: usize) -> Vec<(&'static str, f64)> {
        let c = &self.contr;
        let mut factors = vec![
            ("Elo", c.elo),
            ("Play", c.play),
            ("Prior", c.prior),
            ("PPA", c.ppa),
            ("Market", c.market),
            ("Returning", c.returning),
            ("Ext", c.ext),
            ("MOV", c.mov),
            ("Off", c.off),
            ("Def", c.def),
            ("SoS", c.sos),
        ];
        factors.sort_by(|a, b| {
            b.1.abs()
                .partial_cmp(&a.1.abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        factors.truncate(n);
        factors
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RankingMeta {
    pub year: Option<i32>,
    pub through_week: Option<u32>,
    pub max_week: u32,
    pub teams_count: usize,
    pub games_to_date: usize,
    pub used: DatasetsUsed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RankingOutput {
    pub meta: RankingMeta,
    pub rankings: Vec<RatingRow>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeltaRow {
    #[serde(flatten)]
    pub row: RatingRow,
    /// Previous rank minus current rank; positive means the team moved up.
    pub delta_rank: i64,
    /// None when the team has no row in the previous week's ranking.
    pub delta_score: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeltaMeta {
    #[serde(flatten)]
    pub ranking: RankingMeta,
    pub week: u32,
    pub delta_from: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeltaOutput {
    pub meta: DeltaMeta,
    pub rankings: Vec<DeltaRow>,
}
