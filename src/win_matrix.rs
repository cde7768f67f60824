use log::debug;
use rayon::prelude::*;

use crate::elo::{self, EloConfig};
use crate::error::{PlannerError, Result};
use crate::schedule::Schedule;
use crate::teams::{TeamId, TeamTable};

/// Log-probability used for bye weeks (exp(-10) is about 4.5e-5).
pub const DEFAULT_BYE_LOG_PROB: f64 = -10.0;

/// Teams x rounds table of log win probabilities, row order = [`TeamTable`] order.
#[derive(Debug, Clone, PartialEq)]
pub struct WinProbabilityMatrix {
    teams: usize,
    rounds: usize,
    values: Vec<f64>,
}

impl WinProbabilityMatrix {
    /// Builds a matrix from explicit rows. Rows must be equally long and finite.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let teams = rows.len();
        let rounds = rows.first().map(Vec::len).unwrap_or(0);
        let mut values = Vec::with_capacity(teams * rounds);
        for (idx, row) in rows.into_iter().enumerate() {
            if row.len() != rounds {
                return Err(PlannerError::validation(format!(
                    "matrix row {idx} has {} columns, expected {rounds}",
                    row.len()
                )));
            }
            if let Some(bad) = row.iter().find(|v| !v.is_finite()) {
                return Err(PlannerError::validation(format!(
                    "matrix row {idx} holds non-finite value {bad}"
                )));
            }
            values.extend(row);
        }
        Ok(Self {
            teams,
            rounds,
            values,
        })
    }

    pub fn teams(&self) -> usize {
        self.teams
    }

    pub fn rounds(&self) -> usize {
        self.rounds
    }

    pub fn get(&self, team: TeamId, round: usize) -> f64 {
        self.values[team.index() * self.rounds + round]
    }

    pub fn probability(&self, team: TeamId, round: usize) -> f64 {
        self.get(team, round).exp()
    }

    pub fn row(&self, team: TeamId) -> &[f64] {
        let start = team.index() * self.rounds;
        &self.values[start..start + self.rounds]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> + '_ {
        // chunks_exact(0) panics; a zero-round matrix has no values anyway.
        self.values.chunks_exact(self.rounds.max(1))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MatrixBuilder {
    pub elo: EloConfig,
    pub bye_log_prob: f64,
}

impl Default for MatrixBuilder {
    fn default() -> Self {
        Self {
            elo: EloConfig::default(),
            bye_log_prob: DEFAULT_BYE_LOG_PROB,
        }
    }
}

impl MatrixBuilder {
    pub fn new(elo: EloConfig, bye_log_prob: f64) -> Self {
        Self { elo, bye_log_prob }
    }

    pub fn build(&self, schedule: &Schedule, ratings: &TeamTable) -> Result<WinProbabilityMatrix> {
        if !(self.bye_log_prob.is_finite() && self.bye_log_prob < 0.0) {
            return Err(PlannerError::validation(format!(
                "bye log-probability must be finite and negative, got {}",
                self.bye_log_prob
            )));
        }
        if schedule.teams() != ratings.len() {
            return Err(PlannerError::validation(format!(
                "schedule covers {} teams but {} ratings were loaded",
                schedule.teams(),
                ratings.len()
            )));
        }

        let rows: Vec<Vec<f64>> = (0..ratings.len())
            .into_par_iter()
            .map(|idx| {
                let team = TeamId(idx);
                schedule
                    .row(team)
                    .iter()
                    .map(|m| match elo::matchup_win_probability(team, *m, ratings, self.elo) {
                        Some(p) => p.ln(),
                        None => self.bye_log_prob,
                    })
                    .collect()
            })
            .collect();

        debug!(
            "built {}x{} win probability matrix",
            rows.len(),
            schedule.rounds()
        );

        Ok(WinProbabilityMatrix {
            teams: ratings.len(),
            rounds: schedule.rounds(),
            values: rows.into_iter().flatten().collect(),
        })
    }
}
