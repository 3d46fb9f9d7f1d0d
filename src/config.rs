use std::fs;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::elo::EloConfig;
use crate::error::EngineError;
use crate::resume::ResumeThresholds;

pub const SOS_WEIGHT_LIMIT: f64 = 0.5;

/// One place for every tunable the ranking reads. Defaults are the "balanced" profile.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RankingConfig {
    // Base group, normalized to sum to 1.
    pub w_elo: f64,
    pub w_play: f64,
    pub w_prior: f64,

    // Extras group, normalized and then scaled by its raw sum.
    pub w_ppa: f64,
    pub w_market: f64,
    pub w_return: f64,
    pub w_ext: f64,
    pub w_mov: f64,
    pub w_off: f64,
    pub w_def: f64,

    /// Clamped to +/-0.5 when applied.
    pub sos_weight: f64,

    pub k: f64,
    pub hfa: f64,
    pub fcs_weight: f64,
    pub base_rating: f64,

    pub ppa_passes: u32,

    pub quality_rank: usize,
    pub second_tier_rank: usize,
    pub bad_loss_rank: usize,
    pub one_score_margin: i32,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self::from_preset(WeightPreset::Balanced)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightPreset {
    Balanced,
    Predictive,
    Resume,
}

impl FromStr for WeightPreset {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "balanced" => Ok(Self::Balanced),
            "predictive" => Ok(Self::Predictive),
            "resume" => Ok(Self::Resume),
            other => Err(anyhow::anyhow!(
                "unknown preset {other}, expected balanced, predictive or resume"
            )),
        }
    }
}

impl RankingConfig {
    pub fn from_preset(preset: WeightPreset) -> Self {
        let base = Self {
            w_elo: 0.50,
            w_play: 0.25,
            w_prior: 0.10,
            w_ppa: 0.10,
            w_market: 0.03,
            w_return: 0.02,
            w_ext: 0.00,
            w_mov: 0.08,
            w_off: 0.07,
            w_def: 0.07,
            sos_weight: 0.15,
            k: 20.0,
            hfa: 65.0,
            fcs_weight: 0.60,
            base_rating: 1500.0,
            ppa_passes: 2,
            quality_rank: 25,
            second_tier_rank: 50,
            bad_loss_rank: 80,
            one_score_margin: 8,
        };
        match preset {
            WeightPreset::Balanced => base,
            WeightPreset::Predictive => Self {
                w_elo: 0.35,
                w_play: 0.35,
                w_prior: 0.06,
                sos_weight: 0.10,
                w_ppa: 0.12,
                w_market: 0.10,
                w_return: 0.02,
                w_ext: 0.00,
                w_mov: 0.06,
                w_off: 0.10,
                w_def: 0.08,
                k: 24.0,
                ..base
            },
            WeightPreset::Resume => Self {
                w_elo: 0.62,
                w_play: 0.18,
                w_prior: 0.03,
                sos_weight: 0.20,
                w_ppa: 0.05,
                w_market: 0.00,
                w_return: 0.00,
                w_ext: 0.12,
                w_mov: 0.12,
                w_off: 0.04,
                w_def: 0.06,
                k: 18.0,
                ..base
            },
        }
    }

    pub fn elo(&self) -> EloConfig {
        EloConfig {
            k: self.k,
            home_adv_pts: self.hfa,
            fcs_weight: self.fcs_weight,
            base: self.base_rating,
        }
    }

    pub fn resume_thresholds(&self) -> ResumeThresholds {
        ResumeThresholds {
            quality_rank: self.quality_rank,
            second_tier_rank: self.second_tier_rank,
            bad_loss_rank: self.bad_loss_rank,
            one_score_margin: self.one_score_margin,
        }
    }

    pub fn clamped_sos_weight(&self) -> f64 {
        self.sos_weight.clamp(-SOS_WEIGHT_LIMIT, SOS_WEIGHT_LIMIT)
    }

    pub fn extras_raw_sum(&self) -> f64 {
        self.w_ppa + self.w_market + self.w_return + self.w_ext + self.w_mov + self.w_off + self.w_def
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        let numeric: [(&'static str, f64); 15] = [
            ("w_elo", self.w_elo),
            ("w_play", self.w_play),
            ("w_prior", self.w_prior),
            ("w_ppa", self.w_ppa),
            ("w_market", self.w_market),
            ("w_return", self.w_return),
            ("w_ext", self.w_ext),
            ("w_mov", self.w_mov),
            ("w_off", self.w_off),
            ("w_def", self.w_def),
            ("sos_weight", self.sos_weight),
            ("k", self.k),
            ("hfa", self.hfa),
            ("fcs_weight", self.fcs_weight),
            ("base_rating", self.base_rating),
        ];
        if let Some(&(field, _)) = numeric.iter().find(|(_, v)| !v.is_finite()) {
            return Err(EngineError::NonFiniteConfig { field });
        }

        let mut problems = Vec::new();
        if self.k < 0.0 {
            problems.push("k must be non-negative".to_string());
        }
        if self.base_rating <= 0.0 {
            problems.push("base_rating must be positive".to_string());
        }
        if self.quality_rank > self.second_tier_rank {
            problems.push(format!(
                "quality_rank ({}) must not exceed second_tier_rank ({})",
                self.quality_rank, self.second_tier_rank
            ));
        }
        if self.one_score_margin < 0 {
            problems.push("one_score_margin must be non-negative".to_string());
        }
        if problems.is_empty() {
            Ok(())
        } else {
            Err(EngineError::InvalidConfig(problems.join("; ")))
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        Self::load_over(path, &Self::default())
    }

    /// Fields present in the file replace those of `base`; the rest are kept.
    pub fn load_over(path: &Path, base: &Self) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("read ranking config {}", path.display()))?;
        let overlay: Value = serde_json::from_str(&raw)
            .with_context(|| format!("parse ranking config {}", path.display()))?;
        Self::overlay(base, overlay)
            .with_context(|| format!("apply ranking config {}", path.display()))
    }

    pub fn overlay(base: &Self, overlay: Value) -> Result<Self> {
        let Value::Object(fields) = overlay else {
            bail!("ranking config must be a JSON object");
        };
        let mut merged = serde_json::to_value(base).context("serialize ranking config")?;
        if let Value::Object(map) = &mut merged {
            map.extend(fields);
        }
        serde_json::from_value(merged).context("decode ranking config")
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).ok();
        }
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(self).context("serialize ranking config")?;
        fs::write(&tmp, json).context("write ranking config")?;
        fs::rename(&tmp, path).context("swap ranking config")?;
        Ok(())
    }
}
