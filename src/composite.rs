use std::cmp::Ordering;
use std::collections::HashMap;

use tracing::debug;

use crate::config::RankingConfig;
use crate::dominance::dominance;
use crate::efficiency::{opponent_adjusted_ppa, play_quality, prior};
use crate::elo::{compute_elo_for_season, rating_of, top_tier_names};
use crate::error::EngineError;
use crate::market::{external_rating, market_from_lines, returning_production};
use crate::model::{
    Contributions, RankingMeta, RankingOutput, RatingRow, RowExtras, SeasonInputs,
    SignalZScores, Window,
};
use crate::resume::{resume_metrics, season_records};
use crate::schedule::schedule_strength;
use crate::zscore::{population, zscores_dense, Estimator};

/// Normalized blend weights derived from a config.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlendWeights {
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
    /// Raw extras sum; every extras contribution is multiplied by it.
    pub intensity: f64,
    pub sos: f64,
}

impl BlendWeights {
    pub fn from_config(cfg: &RankingConfig) -> Self {
        let base_raw = cfg.w_elo + cfg.w_play + cfg.w_prior;
        let base_sum = if base_raw == 0.0 { 1.0 } else { base_raw };
        let extras_raw = cfg.extras_raw_sum();
        let extras_sum = if extras_raw == 0.0 { 1.0 } else { extras_raw };
        Self {
            elo: cfg.w_elo / base_sum,
            play: cfg.w_play / base_sum,
            prior: cfg.w_prior / base_sum,
            ppa: cfg.w_ppa / extras_sum,
            market: cfg.w_market / extras_sum,
            returning: cfg.w_return / extras_sum,
            ext: cfg.w_ext / extras_sum,
            mov: cfg.w_mov / extras_sum,
            off: cfg.w_off / extras_sum,
            def: cfg.w_def / extras_sum,
            intensity: extras_raw,
            sos: cfg.clamped_sos_weight(),
        }
    }

    pub fn contributions(&self, z: &SignalZScores) -> Contributions {
        let x = self.intensity;
        let mut c = Contributions {
            elo: self.elo * z.elo,
            play: self.play * z.play,
            prior: self.prior * z.prior,
            ppa: self.ppa * z.ppa * x,
            market: self.market * z.market * x,
            returning: self.returning * z.returning * x,
            ext: self.ext * z.ext * x,
            mov: self.mov * z.mov * x,
            off: self.off * z.off * x,
            def: self.def * z.def * x,
            ..Contributions::default()
        };
        c.pre_sos = c.elo
            + c.play
            + c.prior
            + c.ppa
            + c.market
            + c.returning
            + c.ext
            + c.mov
            + c.off
            + c.def;
        // Scales the existing score rather than adding an independent term.
        c.sos = c.pre_sos * self.sos * z.sos;
        c
    }
}

/// Rank every roster team for the window. Rows come back sorted by score with
/// 1-based contiguous ranks; exact ties keep roster order.
pub fn compute_rankings(
    inputs: &SeasonInputs,
    cfg: &RankingConfig,
    window: Window,
) -> Result<RankingOutput, EngineError> {
    cfg.validate()?;
    if inputs.teams.is_empty() {
        return Err(EngineError::MissingRoster);
    }
    if inputs.games.is_empty() {
        return Err(EngineError::MissingGames);
    }

    let teams = &inputs.teams;
    let base = cfg.base_rating;
    let top_tier = top_tier_names(teams);
    let games = window.games(&inputs.games);
    let used = inputs.datasets_used();
    debug!(
        through_week = ?window.through_week,
        teams = teams.len(),
        games = games.len(),
        ?used,
        "computing rankings"
    );

    let ratings = compute_elo_for_season(teams, &inputs.games, window, cfg.elo());
    let elo: Vec<f64> = teams
        .iter()
        .map(|t| rating_of(&ratings, &t.school, base))
        .collect();
    let z_elo = zscores_dense(&elo, Estimator::Population);

    let play = play_quality(teams, &inputs.advanced);
    let z_play = zscores_dense(&play, Estimator::Population);

    let prior_vals = prior(teams, &inputs.sp, &inputs.talent);
    let z_prior = zscores_dense(&prior_vals, Estimator::Population);

    let sos = schedule_strength(teams, &games, &ratings, &top_tier, base);

    let ppa_adj = opponent_adjusted_ppa(teams, &inputs.ppa_teams, &games, cfg.ppa_passes);
    let z_ppa = zscores_dense(&ppa_adj, Estimator::Population);

    let market = market_from_lines(teams, &games, &inputs.lines);
    let z_market = population(&market);
    let returning = returning_production(teams, &inputs.returning);
    let z_returning = population(&returning);
    let ext = external_rating(teams, &inputs.elo_ext, &inputs.srs_ext);
    let z_ext = population(&ext);

    let dom = dominance(teams, &games, &inputs.ppa_teams, &ratings, base);
    let records = season_records(teams, &games);

    let weights = BlendWeights::from_config(cfg);
    debug!(?weights, "blend weights");

    let mut rows: Vec<RatingRow> = teams
        .iter()
        .enumerate()
        .map(|(i, t)| {
            let z = SignalZScores {
                elo: z_elo[i],
                play: z_play[i],
                prior: z_prior[i],
                ppa: z_ppa[i],
                market: z_market[i],
                returning: z_returning[i],
                ext: z_ext[i],
                mov: dom.z_mov[i],
                off: dom.z_off[i],
                def: dom.z_def[i],
                sos: sos.z[i],
            };
            let contr = weights.contributions(&z);
            RatingRow {
                rank: 0,
                team: t.school.clone(),
                conference: t.conference.clone(),
                logo: t.logo().map(str::to_string),
                elo: elo[i],
                play_quality: play[i],
                prior: prior_vals[i],
                score: contr.pre_sos + contr.sos,
                record: records[i],
                sos_avg_elo: sos.avg_opp_rating[i],
                resume: Default::default(),
                contr,
                z,
                extras: RowExtras {
                    ppa: ppa_adj[i],
                    market: market[i],
                    returning: returning[i],
                    ext: ext[i],
                    mov: dom.mov[i],
                    off_dom: dom.off[i],
                    def_dom: dom.def[i],
                },
            }
        })
        .collect();

    rows.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    for (idx, row) in rows.iter_mut().enumerate() {
        row.rank = idx + 1;
    }

    let ranks: HashMap<&str, usize> = rows.iter().map(|r| (r.team.as_str(), r.rank)).collect();
    let resume = resume_metrics(teams, &games, &ranks, &top_tier, cfg.resume_thresholds());
    for row in &mut rows {
        if let Some(m) = resume.get(&row.team) {
            row.resume = *m;
        }
    }

    let meta = RankingMeta {
        year: inputs.season,
        through_week: window.through_week,
        max_week: inputs.max_week(),
        teams_count: teams.len(),
        games_to_date: games.len(),
        used,
    };
    Ok(RankingOutput {
        meta,
        rankings: rows,
    })
}
