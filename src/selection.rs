//! Season pick selection as a 0/1 program.
//!
//! `x[i, j] = 1` means team `i` is picked in round `j`. The objective is the sum of log win
//! probabilities of the chosen pairs, which orders plans the same way as the product of
//! probabilities does.

use std::collections::HashSet;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::{PlannerError, Result};
use crate::program::{
    Comparison, GoodLpProgram, IntegerProgram, ProgramSolution, ProgramStatus, Sense, VarId,
};
use crate::teams::{TeamId, TeamTable};
use crate::win_matrix::WinProbabilityMatrix;

// Small enough that it never outweighs a real difference in log-probability.
const TIE_BREAK_EPS: f64 = 1e-9;

/// How tied optima are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TieBreak {
    /// Whatever the backend returns.
    #[default]
    SolverDefault,
    /// Prefer teams that come earlier in the team table.
    TeamOrder,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SolveOptions {
    pub time_limit: Option<Duration>,
    pub tie_break: TieBreak,
}

/// Teams already used, one per elapsed round, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommittedPicks(Vec<TeamId>);

impl CommittedPicks {
    pub fn new(teams: Vec<TeamId>) -> Result<Self> {
        let mut seen = HashSet::new();
        for t in &teams {
            if !seen.insert(*t) {
                return Err(PlannerError::validation(format!(
                    "team #{} appears more than once in committed picks",
                    t.index()
                )));
            }
        }
        Ok(Self(teams))
    }

    /// Resolves codes against the team table. Unknown codes are lookup failures.
    pub fn resolve<S: AsRef<str>>(codes: &[S], teams: &TeamTable) -> Result<Self> {
        let mut ids = Vec::with_capacity(codes.len());
        let mut seen = HashSet::new();
        for code in codes {
            let id = teams.id(code.as_ref())?;
            if !seen.insert(id) {
                return Err(PlannerError::validation(format!(
                    "{} was already picked in an earlier round",
                    teams.code(id)
                )));
            }
            ids.push(id);
        }
        Ok(Self(ids))
    }

    pub fn rounds_gone(&self) -> usize {
        self.0.len()
    }

    pub fn teams(&self) -> &[TeamId] {
        &self.0
    }

    pub fn contains(&self, team: TeamId) -> bool {
        self.0.contains(&team)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pick {
    pub round: usize,
    pub team: TeamId,
    pub log_prob: f64,
}

/// Chosen team for every remaining round plus the summed log-probability.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    pub rounds_gone: usize,
    pub picks: Vec<Pick>,
    pub objective: f64,
}

impl Solution {
    /// Estimated probability of winning every remaining round.
    pub fn win_probability(&self) -> f64 {
        self.objective.exp()
    }

    pub fn team_for(&self, round: usize) -> Option<TeamId> {
        self.picks.iter().find(|p| p.round == round).map(|p| p.team)
    }
}

/// Builds and solves the selection program. Every call gets its own program instance from
/// the backend factory.
pub struct SelectionSolver<F> {
    options: SolveOptions,
    make_program: F,
}

impl SelectionSolver<fn() -> GoodLpProgram> {
    pub fn new(options: SolveOptions) -> Self {
        Self {
            options,
            make_program: GoodLpProgram::new,
        }
    }
}

impl<P, F> SelectionSolver<F>
where
    F: Fn() -> P,
    P: IntegerProgram + Send + 'static,
{
    pub fn with_backend(options: SolveOptions, make_program: F) -> Self {
        Self {
            options,
            make_program,
        }
    }

    pub fn options(&self) -> SolveOptions {
        self.options
    }

    pub fn solve(
        &self,
        matrix: &WinProbabilityMatrix,
        committed: &CommittedPicks,
    ) -> Result<Solution> {
        let teams = matrix.teams();
        let rounds = matrix.rounds();
        let rounds_gone = committed.rounds_gone();

        if rounds_gone > rounds {
            return Err(PlannerError::validation(format!(
                "{rounds_gone} committed picks for a {rounds}-round season"
            )));
        }
        if let Some(bad) = committed.teams().iter().find(|t| t.index() >= teams) {
            return Err(PlannerError::validation(format!(
                "committed team #{} is outside the {teams}-team matrix",
                bad.index()
            )));
        }

        let remaining = rounds - rounds_gone;
        let available = teams - committed.teams().len();
        if remaining > available {
            return Err(PlannerError::Infeasible {
                remaining_rounds: remaining,
                available_teams: available,
            });
        }
        if remaining == 0 {
            return Ok(Solution {
                rounds_gone,
                picks: Vec::new(),
                objective: 0.0,
            });
        }

        let (program, vars) = self.formulate(matrix, committed);
        let started = Instant::now();
        let outcome = run_with_limit(program, self.options.time_limit)?;
        debug!("selection program solved in {:?}", started.elapsed());

        match outcome.status {
            ProgramStatus::Optimal => {}
            ProgramStatus::Infeasible => {
                return Err(PlannerError::Infeasible {
                    remaining_rounds: remaining,
                    available_teams: available,
                });
            }
            ProgramStatus::Unbounded => {
                return Err(PlannerError::Solver(
                    "selection program reported unbounded".to_string(),
                ));
            }
        }

        let solution = extract_solution(matrix, committed, &vars, &outcome)?;
        info!(
            "planned {} rounds, season win probability {:.6}",
            solution.picks.len(),
            solution.win_probability()
        );
        Ok(solution)
    }

    fn formulate(&self, matrix: &WinProbabilityMatrix, committed: &CommittedPicks) -> (P, Grid) {
        let teams = matrix.teams();
        let rounds = matrix.rounds();
        let rounds_gone = committed.rounds_gone();
        let mut program = (self.make_program)();

        let mut vars = Grid {
            rounds,
            ids: Vec::with_capacity(teams * rounds),
        };
        for i in 0..teams {
            for j in 0..rounds {
                vars.ids
                    .push(program.declare_binary_variable(&format!("pick_{i}_{j}")));
            }
        }

        let mut objective = Vec::with_capacity(teams * rounds);
        for i in 0..teams {
            let bias = match self.options.tie_break {
                TieBreak::SolverDefault => 0.0,
                TieBreak::TeamOrder => -TIE_BREAK_EPS * i as f64,
            };
            for j in 0..rounds {
                objective.push((vars.at(i, j), matrix.get(TeamId(i), j) + bias));
            }
        }
        program.set_objective(Sense::Maximize, &objective);

        // One pick per open round.
        for j in rounds_gone..rounds {
            let terms: Vec<_> = (0..teams).map(|i| (vars.at(i, j), 1.0)).collect();
            program.add_linear_constraint(&terms, Comparison::Eq, 1.0);
        }
        // Each team at most once.
        for i in 0..teams {
            let terms: Vec<_> = (0..rounds).map(|j| (vars.at(i, j), 1.0)).collect();
            program.add_linear_constraint(&terms, Comparison::Leq, 1.0);
        }
        // Used teams are locked out.
        for team in committed.teams() {
            let terms: Vec<_> = (0..rounds)
                .map(|j| (vars.at(team.index(), j), 1.0))
                .collect();
            program.add_linear_constraint(&terms, Comparison::Eq, 0.0);
        }
        // Elapsed rounds are never re-decided.
        for j in 0..rounds_gone {
            let terms: Vec<_> = (0..teams).map(|i| (vars.at(i, j), 1.0)).collect();
            program.add_linear_constraint(&terms, Comparison::Eq, 0.0);
        }

        (program, vars)
    }
}

struct Grid {
    rounds: usize,
    ids: Vec<VarId>,
}

impl Grid {
    fn at(&self, team: usize, round: usize) -> VarId {
        self.ids[team * self.rounds + round]
    }
}

fn run_with_limit<P>(program: P, limit: Option<Duration>) -> Result<ProgramSolution>
where
    P: IntegerProgram + Send + 'static,
{
    let Some(limit) = limit else {
        return program.solve();
    };

    let (tx, rx) = mpsc::channel();
    // The worker is left running on timeout; its result is dropped with the channel.
    thread::spawn(move || {
        let _ = tx.send(program.solve());
    });
    match rx.recv_timeout(limit) {
        Ok(res) => res,
        Err(RecvTimeoutError::Timeout) => Err(PlannerError::Timeout(limit)),
        Err(RecvTimeoutError::Disconnected) => Err(PlannerError::Solver(
            "solver thread exited without a result".to_string(),
        )),
    }
}

fn extract_solution(
    matrix: &WinProbabilityMatrix,
    committed: &CommittedPicks,
    vars: &Grid,
    outcome: &ProgramSolution,
) -> Result<Solution> {
    let rounds_gone = committed.rounds_gone();
    let mut used: HashSet<TeamId> = HashSet::new();
    let mut picks = Vec::with_capacity(matrix.rounds() - rounds_gone);

    for j in 0..matrix.rounds() {
        let chosen: Vec<TeamId> = (0..matrix.teams())
            .filter(|i| outcome.value(vars.at(*i, j)) > 0.5)
            .map(TeamId)
            .collect();

        if j < rounds_gone {
            if !chosen.is_empty() {
                return Err(PlannerError::Solver(format!(
                    "solver picked a team for elapsed round {j}"
                )));
            }
            continue;
        }

        let &[team] = chosen.as_slice() else {
            return Err(PlannerError::Solver(format!(
                "solver picked {} teams for round {j}",
                chosen.len()
            )));
        };
        if committed.contains(team) || !used.insert(team) {
            return Err(PlannerError::Solver(format!(
                "solver reused team #{} in round {j}",
                team.index()
            )));
        }
        picks.push(Pick {
            round: j,
            team,
            log_prob: matrix.get(team, j),
        });
    }

    let objective = picks.iter().map(|p| p.log_prob).sum();
    Ok(Solution {
        rounds_gone,
        picks,
        objective,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::Terms;

    /// Records the formulation and answers with a canned assignment.
    #[derive(Default)]
    struct ScriptedProgram {
        vars: usize,
        constraints: Vec<(Comparison, f64, usize)>,
        answer: Vec<usize>,
        delay: Option<Duration>,
    }

    impl IntegerProgram for ScriptedProgram {
        fn declare_binary_variable(&mut self, _name: &str) -> VarId {
            self.vars += 1;
            VarId(self.vars - 1)
        }

        fn add_linear_constraint(&mut self, terms: &Terms, cmp: Comparison, rhs: f64) {
            self.constraints.push((cmp, rhs, terms.len()));
        }

        fn set_objective(&mut self, _sense: Sense, _terms: &Terms) {}

        fn solve(self) -> Result<ProgramSolution> {
            if let Some(d) = self.delay {
                thread::sleep(d);
            }
            let mut values = vec![0.0; self.vars];
            for idx in self.answer {
                values[idx] = 1.0;
            }
            Ok(ProgramSolution {
                status: ProgramStatus::Optimal,
                values,
            })
        }
    }

    fn matrix_2x2() -> WinProbabilityMatrix {
        WinProbabilityMatrix::from_rows(vec![vec![-0.3, -0.6], vec![-0.9, -0.8]]).unwrap()
    }

    #[test]
    fn formulation_has_one_constraint_family_per_rule() {
        let m = WinProbabilityMatrix::from_rows(vec![vec![-0.1; 3]; 4]).unwrap();
        let committed = CommittedPicks::new(vec![TeamId(2)]).unwrap();
        let solver = SelectionSolver::with_backend(SolveOptions::default(), ScriptedProgram::default);
        let (program, _) = solver.formulate(&m, &committed);

        assert_eq!(program.vars, 12);
        // 2 open rounds + 4 team caps + 1 locked team + 1 elapsed round.
        let seen = &program.constraints;
        assert_eq!(seen.len(), 8);
        assert_eq!(
            seen.iter()
                .filter(|(c, rhs, n)| *c == Comparison::Eq && *rhs == 1.0 && *n == 4)
                .count(),
            2
        );
        assert_eq!(
            seen.iter().filter(|(c, _, _)| *c == Comparison::Leq).count(),
            4
        );
    }

    #[test]
    fn scripted_answer_is_read_back_as_picks() {
        // var index = team * rounds + round: team 0 round 0, team 1 round 1.
        let solver = SelectionSolver::with_backend(SolveOptions::default(), || ScriptedProgram {
            answer: vec![0, 3],
            ..Default::default()
        });
        let sol = solver.solve(&matrix_2x2(), &CommittedPicks::default()).unwrap();
        assert_eq!(sol.team_for(0), Some(TeamId(0)));
        assert_eq!(sol.team_for(1), Some(TeamId(1)));
        assert!((sol.objective - (-0.3 - 0.8)).abs() < 1e-12);
    }

    #[test]
    fn reused_team_from_backend_is_rejected() {
        let solver = SelectionSolver::with_backend(SolveOptions::default(), || ScriptedProgram {
            answer: vec![0, 1],
            ..Default::default()
        });
        let err = solver.solve(&matrix_2x2(), &CommittedPicks::default()).unwrap_err();
        assert!(matches!(err, PlannerError::Solver(_)));
    }

    #[test]
    fn empty_round_from_backend_is_rejected() {
        let solver = SelectionSolver::with_backend(SolveOptions::default(), || ScriptedProgram {
            answer: vec![0],
            ..Default::default()
        });
        let err = solver.solve(&matrix_2x2(), &CommittedPicks::default()).unwrap_err();
        assert!(err.to_string().contains("picked 0 teams for round 1"));
    }

    #[test]
    fn slow_backend_hits_time_limit() {
        let options = SolveOptions {
            time_limit: Some(Duration::from_millis(20)),
            ..Default::default()
        };
        let solver = SelectionSolver::with_backend(options, || ScriptedProgram {
            answer: vec![0, 3],
            delay: Some(Duration::from_millis(500)),
            ..Default::default()
        });
        let err = solver.solve(&matrix_2x2(), &CommittedPicks::default()).unwrap_err();
        assert!(matches!(err, PlannerError::Timeout(_)));
    }

    #[test]
    fn fully_elapsed_season_needs_no_solve() {
        let committed = CommittedPicks::new(vec![TeamId(1), TeamId(0)]).unwrap();
        let sol = SelectionSolver::new(SolveOptions::default())
            .solve(&matrix_2x2(), &committed)
            .unwrap();
        assert!(sol.picks.is_empty());
        assert!((sol.win_probability() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn duplicate_committed_team_is_rejected() {
        assert!(CommittedPicks::new(vec![TeamId(0), TeamId(0)]).is_err());
    }
}
