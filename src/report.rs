use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::schedule::Schedule;
use crate::selection::{CommittedPicks, Solution};
use crate::teams::TeamTable;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsedRow {
    pub week: usize,
    pub team: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PickRow {
    pub week: usize,
    pub team: String,
    pub matchup: String,
    pub description: String,
    pub win_probability: f64,
}

/// Printable plan. Weeks are 1-based, as people count them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanReport {
    pub generated_at: DateTime<Utc>,
    pub rounds: usize,
    pub used: Vec<UsedRow>,
    pub picks: Vec<PickRow>,
    pub log_probability: f64,
    pub season_win_probability: f64,
}

impl PlanReport {
    pub fn build(
        solution: &Solution,
        committed: &CommittedPicks,
        teams: &TeamTable,
        schedule: &Schedule,
    ) -> Self {
        let used = committed
            .teams()
            .iter()
            .enumerate()
            .map(|(round, team)| UsedRow {
                week: round + 1,
                team: teams.code(*team).to_string(),
            })
            .collect();

        let picks = solution
            .picks
            .iter()
            .map(|p| {
                let m = schedule.matchup(p.team, p.round);
                PickRow {
                    week: p.round + 1,
                    team: teams.code(p.team).to_string(),
                    matchup: m.token(teams),
                    description: m.describe(teams),
                    win_probability: p.log_prob.exp(),
                }
            })
            .collect();

        Self {
            generated_at: Utc::now(),
            rounds: schedule.rounds(),
            used,
            picks,
            log_probability: solution.objective,
            season_win_probability: solution.win_probability(),
        }
    }

    pub fn render_text(&self) -> String {
        let mut out = String::new();
        for row in &self.used {
            let _ = writeln!(out, "Week {} Used {}", row.week, row.team);
        }
        for row in &self.picks {
            let _ = writeln!(
                out,
                "Week {} Pick {} playing {} ({}, p={:.3})",
                row.week, row.team, row.matchup, row.description, row.win_probability
            );
        }
        let _ = writeln!(
            out,
            "probability of winning: {}",
            self.season_win_probability
        );
        out
    }
}
