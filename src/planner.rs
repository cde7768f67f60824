//! End-to-end planning run: load, build the matrix, solve, report.

use log::info;

use crate::config::PlannerConfig;
use crate::error::Result;
use crate::export;
use crate::ingest;
use crate::report::PlanReport;
use crate::schedule::Schedule;
use crate::selection::{CommittedPicks, SelectionSolver, Solution};
use crate::teams::TeamTable;
use crate::win_matrix::WinProbabilityMatrix;

/// Everything loaded or derived for one season, before any solve.
#[derive(Debug, Clone)]
pub struct Season {
    pub teams: TeamTable,
    pub schedule: Schedule,
    pub matrix: WinProbabilityMatrix,
}

impl Season {
    pub fn load(cfg: &PlannerConfig) -> Result<Self> {
        let teams = ingest::load_ratings(cfg.ratings_path()?, cfg.teams)?;
        let schedule = ingest::load_schedule(cfg.schedule_path()?, &teams, cfg.rounds)?;
        Self::from_parts(cfg, teams, schedule)
    }

    pub fn from_parts(cfg: &PlannerConfig, teams: TeamTable, schedule: Schedule) -> Result<Self> {
        let matrix = cfg.matrix_builder().build(&schedule, &teams)?;
        Ok(Self {
            teams,
            schedule,
            matrix,
        })
    }

    pub fn export_probabilities(&self, cfg: &PlannerConfig) -> Result<bool> {
        let Some(path) = cfg.export_file.as_deref() else {
            return Ok(false);
        };
        export::write_probability_table(path, &self.matrix, &self.teams)?;
        Ok(true)
    }
}

#[derive(Debug, Clone)]
pub struct PlanOutcome {
    pub solution: Solution,
    pub report: PlanReport,
}

/// Solves a loaded season against the configured committed picks.
pub fn plan_season(season: &Season, cfg: &PlannerConfig) -> Result<PlanOutcome> {
    let committed = CommittedPicks::resolve(&cfg.committed_picks, &season.teams)?;
    info!(
        "planning {} open rounds with {} teams already used",
        season.schedule.rounds().saturating_sub(committed.rounds_gone()),
        committed.rounds_gone()
    );

    let solution = SelectionSolver::new(cfg.solve_options()).solve(&season.matrix, &committed)?;
    let report = PlanReport::build(&solution, &committed, &season.teams, &season.schedule);

    if let Some(path) = cfg.report_file.as_deref() {
        export::write_report_json(path, &report)?;
    }
    Ok(PlanOutcome { solution, report })
}

/// Full run from configured files.
pub fn run(cfg: &PlannerConfig) -> Result<PlanOutcome> {
    let season = Season::load(cfg)?;
    season.export_probabilities(cfg)?;
    plan_season(&season, cfg)
}
