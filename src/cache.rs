use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::RankingConfig;
use crate::delta::{check_delta_week, compute_delta_between};
use crate::model::{DeltaOutput, RankingOutput, RatingRow, SeasonInputs};

const DEFAULT_DATA_DIR: &str = "data";

/// Flat directory of whole-file JSON datasets, one file per dataset/year[/week].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataDir {
    root: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CacheFileInfo {
    pub name: String,
    pub bytes: u64,
    pub mtime: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CacheInfo {
    pub years: Vec<i32>,
    pub year: Option<i32>,
    pub weeks: Option<Vec<u32>>,
    pub files: Vec<CacheFileInfo>,
}

/// `{prefix}-{year}.json`, or `{prefix}-{year}-wk{week}.json` for week >= 1.
pub fn dataset_file(prefix: &str, year: i32, week: Option<u32>) -> String {
    match week.filter(|w| *w > 0) {
        Some(w) => format!("{prefix}-{year}-wk{w}.json"),
        None => format!("{prefix}-{year}.json"),
    }
}

/// Week number of a `{prefix}-{year}-wk{N}.json` file name.
pub fn week_of_file(name: &str, prefix: &str, year: i32) -> Option<u32> {
    name.strip_prefix(&format!("{prefix}-{year}-wk"))?
        .strip_suffix(".json")?
        .parse()
        .ok()
}

fn year_in_name(name: &str) -> Option<i32> {
    let bytes = name.as_bytes();
    bytes
        .windows(4)
        .position(|w| w.iter().all(u8::is_ascii_digit))
        .and_then(|i| name[i..i + 4].parse().ok())
}

fn any_week_of_file(name: &str, year: i32) -> Option<u32> {
    let marker = format!("-{year}-wk");
    let start = name.find(&marker)? + marker.len();
    name[start..].strip_suffix(".json")?.parse().ok()
}

impl DataDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn from_env() -> Self {
        let root = std::env::var("CFB_DATA_DIR")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_DATA_DIR.to_string());
        Self::new(root)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    pub fn exists(&self, name: &str) -> bool {
        self.path(name).is_file()
    }

    pub fn ensure(&self) -> Result<()> {
        fs::create_dir_all(&self.root)
            .with_context(|| format!("create data dir {}", self.root.display()))
    }

    /// Whole-file replace: write a sibling temp file and rename it over the target.
    pub fn write_json<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> Result<PathBuf> {
        self.ensure()?;
        let path = self.path(name);
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(value).with_context(|| format!("serialize {name}"))?;
        fs::write(&tmp, json).with_context(|| format!("write {}", tmp.display()))?;
        fs::rename(&tmp, &path).with_context(|| format!("swap {}", path.display()))?;
        debug!(file = name, "wrote cache file");
        Ok(path)
    }

    pub fn read_json<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        let path = self.path(name);
        let raw = fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("parse {}", path.display()))
    }

    fn read_optional<T: DeserializeOwned>(&self, name: &str) -> Result<Vec<T>> {
        if !self.exists(name) {
            debug!(file = name, "optional dataset not cached");
            return Ok(Vec::new());
        }
        self.read_json(name)
    }

    fn file_names(&self) -> Result<Vec<String>> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root)
            .with_context(|| format!("list {}", self.root.display()))?
        {
            let entry = entry?;
            if entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                if let Some(name) = entry.file_name().to_str() {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    /// Highest-week `{prefix}-{year}-wk{N}.json`, else the unsuffixed file name.
    pub fn latest_week_file(&self, prefix: &str, year: i32) -> Result<(String, Option<u32>)> {
        let latest = self
            .file_names()?
            .iter()
            .filter_map(|n| week_of_file(n, prefix, year))
            .max();
        Ok((dataset_file(prefix, year, latest), latest))
    }

    /// Exact week file when a week is requested and cached, else the latest week
    /// file, else the unsuffixed file. With `latest_first` unset, a full-season
    /// request takes the unsuffixed file ahead of any week file.
    fn resolve_weekly(
        &self,
        prefix: &str,
        year: i32,
        through_week: Option<u32>,
        latest_first: bool,
    ) -> Result<String> {
        let exact = dataset_file(prefix, year, through_week);
        if self.exists(&exact) && (through_week.is_some() || !latest_first) {
            return Ok(exact);
        }
        let (fallback, week) = self.latest_week_file(prefix, year)?;
        if self.exists(&fallback) {
            debug!(prefix, ?week, "using latest cached week file");
        }
        Ok(fallback)
    }

    /// Read everything a ranking run needs. Roster and games are required.
    pub fn load_season(&self, year: i32, through_week: Option<u32>) -> Result<SeasonInputs> {
        let teams_file = dataset_file("teams", year, None);
        let games_file = dataset_file("games", year, None);
        for required in [&teams_file, &games_file] {
            if !self.exists(required) {
                bail!(
                    "missing {} in {}; run `ingest --year {year}` first",
                    required,
                    self.root.display()
                );
            }
        }

        let advanced = self.resolve_weekly("advanced", year, through_week, false)?;
        let ppa = self.resolve_weekly("ppa-teams", year, through_week, true)?;
        let lines = self.resolve_weekly("lines", year, through_week, true)?;

        let inputs = SeasonInputs {
            season: Some(year),
            teams: self.read_json(&teams_file)?,
            games: self.read_json(&games_file)?,
            advanced: self.read_optional(&advanced)?,
            sp: self.read_optional(&dataset_file("sp", year, None))?,
            talent: self.read_optional(&dataset_file("talent", year, None))?,
            ppa_teams: self.read_optional(&ppa)?,
            lines: self.read_optional(&lines)?,
            returning: self.read_optional(&dataset_file("returning", year, None))?,
            elo_ext: self.read_optional(&dataset_file("elo-ext", year, None))?,
            srs_ext: self.read_optional(&dataset_file("srs-ext", year, None))?,
        };
        info!(
            year,
            teams = inputs.teams.len(),
            games = inputs.games.len(),
            "loaded season from cache"
        );
        Ok(inputs)
    }

    /// Delta of `week` against `week - 1`, each window loaded with its own
    /// week-scoped datasets.
    pub fn delta(&self, year: i32, week: u32, cfg: &RankingConfig) -> Result<DeltaOutput> {
        check_delta_week(week)?;
        let current = self.load_season(year, Some(week))?;
        let previous = self.load_season(year, Some(week - 1))?;
        Ok(compute_delta_between(&current, &previous, cfg, week)?)
    }

    pub fn save_rankings(&self, year: i32, output: &RankingOutput) -> Result<()> {
        let week = output.meta.through_week;
        self.write_json(&dataset_file("rankings", year, week), &output.rankings)?;
        self.write_json(&dataset_file("meta", year, week), &output.meta)?;
        Ok(())
    }

    pub fn load_rankings(&self, year: i32, through_week: Option<u32>) -> Result<Option<Vec<RatingRow>>> {
        let name = dataset_file("rankings", year, through_week);
        if !self.exists(&name) {
            return Ok(None);
        }
        self.read_json(&name).map(Some)
    }

    pub fn cache_info(&self, year: Option<i32>) -> Result<CacheInfo> {
        let names = self.file_names()?;
        let years: BTreeSet<i32> = names.iter().filter_map(|n| year_in_name(n)).collect();

        let weeks = year.map(|y| {
            names
                .iter()
                .filter_map(|n| any_week_of_file(n, y))
                .collect::<BTreeSet<u32>>()
                .into_iter()
                .collect()
        });

        let mut files = Vec::new();
        for name in names {
            if let Some(y) = year {
                if !name.contains(&y.to_string()) {
                    continue;
                }
            }
            let meta = fs::metadata(self.path(&name))
                .with_context(|| format!("stat {name}"))?;
            let mtime = meta
                .modified()
                .ok()
                .map(|t| DateTime::<Utc>::from(t).to_rfc3339());
            files.push(CacheFileInfo {
                name,
                bytes: meta.len(),
                mtime,
            });
        }

        Ok(CacheInfo {
            years: years.into_iter().collect(),
            year,
            weeks,
            files,
        })
    }

    /// Delete every cached file, or only those whose name carries `year`.
    pub fn clear(&self, year: Option<i32>) -> Result<usize> {
        let needle = year.map(|y| y.to_string());
        let mut count = 0;
        for name in self.file_names()? {
            if needle.as_deref().is_some_and(|y| !name.contains(y)) {
                continue;
            }
            match fs::remove_file(self.path(&name)) {
                Ok(()) => count += 1,
                Err(err) => warn!(file = %name, %err, "failed to delete cache file"),
            }
        }
        info!(deleted = count, ?year, "cleared cache");
        Ok(count)
    }
}
