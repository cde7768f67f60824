use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::elo::EloConfig;
use crate::error::{PlannerError, Result};
use crate::selection::{SolveOptions, TieBreak};
use crate::win_matrix::{DEFAULT_BYE_LOG_PROB, MatrixBuilder};

const ENV_PREFIX: &str = "PLANNER_";

/// Settings for one planning run. Built once, then only read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct PlannerConfig {
    pub teams: usize,
    #[serde(alias = "weeks")]
    pub rounds: usize,
    pub ratings_file: Option<PathBuf>,
    pub schedule_file: Option<PathBuf>,
    #[serde(alias = "picked")]
    pub committed_picks: Vec<String>,
    pub export_file: Option<PathBuf>,
    pub report_file: Option<PathBuf>,
    pub home_advantage: f64,
    pub bye_log_prob: f64,
    pub time_limit_secs: Option<f64>,
    pub tie_break: TieBreak,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            teams: 32,
            rounds: 17,
            ratings_file: None,
            schedule_file: None,
            committed_picks: Vec::new(),
            export_file: None,
            report_file: None,
            home_advantage: EloConfig::default().home_adv_pts,
            bye_log_prob: DEFAULT_BYE_LOG_PROB,
            time_limit_secs: None,
            tie_break: TieBreak::SolverDefault,
        }
    }
}

impl PlannerConfig {
    /// Defaults, then `--config <file>` (JSON), then `PLANNER_*` variables, then flags.
    pub fn from_sources<E>(args: &[String], env: E) -> Result<Self>
    where
        E: Fn(&str) -> Option<String>,
    {
        let mut cfg = match flag_value(args, "config") {
            Some(path) => Self::from_json_file(Path::new(&path))?,
            None => Self::default(),
        };
        cfg.apply_env(env)?;
        cfg.apply_args(args)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reads the process environment and command line.
    pub fn from_process() -> Result<Self> {
        let args = std::env::args().skip(1).collect::<Vec<_>>();
        Self::from_sources(&args, |key| std::env::var(key).ok())
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|e| PlannerError::io(path, e))?;
        serde_json::from_str(&raw).map_err(|e| {
            PlannerError::validation(format!("config {}: {e}", path.display()))
        })
    }

    fn apply_env<E>(&mut self, env: E) -> Result<()>
    where
        E: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            env(&format!("{ENV_PREFIX}{key}"))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        self.apply(&get)?;
        if let Some(raw) = get("WEEKS") {
            self.rounds = parse_setting("weeks", &raw)?;
        }
        Ok(())
    }

    fn apply_args(&mut self, args: &[String]) -> Result<()> {
        self.apply(|key| flag_value(args, &key.to_ascii_lowercase().replace('_', "-")))?;
        if let Some(raw) = flag_value(args, "weeks") {
            self.rounds = parse_setting("weeks", &raw)?;
        }
        if let Some(raw) = flag_value(args, "ratings") {
            self.ratings_file = Some(PathBuf::from(raw));
        }
        if let Some(raw) = flag_value(args, "schedule") {
            self.schedule_file = Some(PathBuf::from(raw));
        }
        if let Some(raw) = flag_value(args, "export") {
            self.export_file = Some(PathBuf::from(raw));
        }
        if let Some(raw) = flag_value(args, "report") {
            self.report_file = Some(PathBuf::from(raw));
        }
        if let Some(raw) = flag_value(args, "time-limit") {
            self.time_limit_secs = Some(parse_setting("time-limit", &raw)?);
        }
        Ok(())
    }

    /// Applies overrides named by their upper snake-case key.
    fn apply<G>(&mut self, get: G) -> Result<()>
    where
        G: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = get("TEAMS") {
            self.teams = parse_setting("teams", &raw)?;
        }
        if let Some(raw) = get("ROUNDS") {
            self.rounds = parse_setting("rounds", &raw)?;
        }
        if let Some(raw) = get("RATINGS_FILE") {
            self.ratings_file = Some(PathBuf::from(raw));
        }
        if let Some(raw) = get("SCHEDULE_FILE") {
            self.schedule_file = Some(PathBuf::from(raw));
        }
        if let Some(raw) = get("PICKED") {
            self.committed_picks = parse_codes(&raw);
        }
        if let Some(raw) = get("EXPORT_FILE") {
            self.export_file = Some(PathBuf::from(raw));
        }
        if let Some(raw) = get("REPORT_FILE") {
            self.report_file = Some(PathBuf::from(raw));
        }
        if let Some(raw) = get("HOME_ADVANTAGE") {
            self.home_advantage = parse_setting("home advantage", &raw)?;
        }
        if let Some(raw) = get("BYE_LOG_PROB") {
            self.bye_log_prob = parse_setting("bye log-probability", &raw)?;
        }
        if let Some(raw) = get("TIME_LIMIT_SECS") {
            self.time_limit_secs = Some(parse_setting("time limit", &raw)?);
        }
        if let Some(raw) = get("TIE_BREAK") {
            self.tie_break = parse_tie_break(&raw)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.teams == 0 || self.rounds == 0 {
            return Err(PlannerError::validation(
                "team and round counts must be positive",
            ));
        }
        if !(self.bye_log_prob.is_finite() && self.bye_log_prob < 0.0) {
            return Err(PlannerError::validation(format!(
                "bye log-probability must be finite and negative, got {}",
                self.bye_log_prob
            )));
        }
        if !(self.home_advantage.is_finite() && self.home_advantage >= 0.0) {
            return Err(PlannerError::validation(format!(
                "home advantage must be a non-negative number, got {}",
                self.home_advantage
            )));
        }
        if let Some(secs) = self.time_limit_secs
            && !(secs.is_finite() && secs > 0.0)
        {
            return Err(PlannerError::validation(format!(
                "time limit must be positive, got {secs}"
            )));
        }
        if self.committed_picks.len() > self.rounds {
            return Err(PlannerError::validation(format!(
                "{} committed picks for a {}-round season",
                self.committed_picks.len(),
                self.rounds
            )));
        }
        Ok(())
    }

    pub fn elo_config(&self) -> EloConfig {
        EloConfig {
            home_adv_pts: self.home_advantage,
            ..EloConfig::default()
        }
    }

    pub fn matrix_builder(&self) -> MatrixBuilder {
        MatrixBuilder::new(self.elo_config(), self.bye_log_prob)
    }

    pub fn solve_options(&self) -> SolveOptions {
        SolveOptions {
            time_limit: self.time_limit_secs.map(Duration::from_secs_f64),
            tie_break: self.tie_break,
        }
    }

    pub fn ratings_path(&self) -> Result<&Path> {
        self.ratings_file
            .as_deref()
            .ok_or_else(|| PlannerError::validation("no ratings file configured"))
    }

    pub fn schedule_path(&self) -> Result<&Path> {
        self.schedule_file
            .as_deref()
            .ok_or_else(|| PlannerError::validation("no schedule file configured"))
    }
}

/// Finds `--name=value` or `--name value`.
pub fn flag_value(args: &[String], name: &str) -> Option<String> {
    let long = format!("--{name}");
    let prefixed = format!("--{name}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(raw) = arg.strip_prefix(&prefixed) {
            let trimmed = raw.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if *arg == long
            && let Some(next) = args.get(idx + 1)
            && !next.trim().is_empty()
        {
            return Some(next.trim().to_string());
        }
    }
    None
}

fn parse_codes(raw: &str) -> Vec<String> {
    raw.split([',', ';', ' '])
        .map(|part| part.trim().to_ascii_uppercase())
        .filter(|part| !part.is_empty())
        .collect()
}

fn parse_tie_break(raw: &str) -> Result<TieBreak> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "solver-default" | "default" => Ok(TieBreak::SolverDefault),
        "team-order" => Ok(TieBreak::TeamOrder),
        other => Err(PlannerError::validation(format!(
            "unknown tie-break mode {other}"
        ))),
    }
}

fn parse_setting<T: FromStr>(name: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse::<T>()
        .map_err(|_| PlannerError::validation(format!("invalid {name}: {raw}")))
}
