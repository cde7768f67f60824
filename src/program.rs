//! Minimal 0/1 integer-program interface and its good_lp backend.

use good_lp::{
    Expression, ProblemVariables, ResolutionError, Solution, SolverModel, Variable, constraint,
    microlp, variable,
};
use log::debug;

use crate::error::{PlannerError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VarId(pub usize);

impl VarId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    Maximize,
    Minimize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Leq,
    Geq,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgramStatus {
    Optimal,
    Infeasible,
    Unbounded,
}

/// Outcome of a solve. `values` is indexed by [`VarId`] and empty unless optimal.
#[derive(Debug, Clone)]
pub struct ProgramSolution {
    pub status: ProgramStatus,
    pub values: Vec<f64>,
}

impl ProgramSolution {
    pub fn value(&self, var: VarId) -> f64 {
        self.values.get(var.0).copied().unwrap_or(0.0)
    }
}

pub type Terms = [(VarId, f64)];

/// Capabilities the selection model needs from an integer-program solver.
pub trait IntegerProgram {
    fn declare_binary_variable(&mut self, name: &str) -> VarId;
    fn add_linear_constraint(&mut self, terms: &Terms, cmp: Comparison, rhs: f64);
    fn set_objective(&mut self, sense: Sense, terms: &Terms);
    fn solve(self) -> Result<ProgramSolution>
    where
        Self: Sized;
}

#[derive(Debug, Clone)]
struct LinearConstraint {
    terms: Vec<(VarId, f64)>,
    cmp: Comparison,
    rhs: f64,
}

/// Program backed by good_lp's pure-Rust microlp solver. The model is only handed to
/// good_lp in [`IntegerProgram::solve`], so an instance can be moved across threads.
#[derive(Debug, Clone)]
pub struct GoodLpProgram {
    names: Vec<String>,
    constraints: Vec<LinearConstraint>,
    sense: Sense,
    objective: Vec<(VarId, f64)>,
}

impl Default for GoodLpProgram {
    fn default() -> Self {
        Self::new()
    }
}

impl GoodLpProgram {
    pub fn new() -> Self {
        Self {
            names: Vec::new(),
            constraints: Vec::new(),
            sense: Sense::Maximize,
            objective: Vec::new(),
        }
    }

    pub fn variable_count(&self) -> usize {
        self.names.len()
    }

    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }
}

impl IntegerProgram for GoodLpProgram {
    fn declare_binary_variable(&mut self, name: &str) -> VarId {
        self.names.push(name.to_string());
        VarId(self.names.len() - 1)
    }

    fn add_linear_constraint(&mut self, terms: &Terms, cmp: Comparison, rhs: f64) {
        self.constraints.push(LinearConstraint {
            terms: terms.to_vec(),
            cmp,
            rhs,
        });
    }

    fn set_objective(&mut self, sense: Sense, terms: &Terms) {
        self.sense = sense;
        self.objective = terms.to_vec();
    }

    fn solve(self) -> Result<ProgramSolution> {
        let mut vars = ProblemVariables::new();
        let handles: Vec<Variable> = self
            .names
            .iter()
            .map(|name| vars.add(variable().binary().name(name.as_str())))
            .collect();

        let objective = linear_expression(&self.objective, &handles);
        let unsolved = match self.sense {
            Sense::Maximize => vars.maximise(objective),
            Sense::Minimize => vars.minimise(objective),
        };
        let mut model = unsolved.using(microlp);
        for c in &self.constraints {
            let lhs = linear_expression(&c.terms, &handles);
            let rhs = c.rhs;
            let built = match c.cmp {
                Comparison::Eq => constraint!(lhs == rhs),
                Comparison::Leq => constraint!(lhs <= rhs),
                Comparison::Geq => constraint!(lhs >= rhs),
            };
            model.add_constraint(built);
        }

        debug!(
            "solving program with {} variables and {} constraints",
            handles.len(),
            self.constraints.len()
        );

        match model.solve() {
            Ok(solution) => Ok(ProgramSolution {
                status: ProgramStatus::Optimal,
                values: handles.iter().map(|v| solution.value(*v)).collect(),
            }),
            Err(ResolutionError::Infeasible) => Ok(ProgramSolution {
                status: ProgramStatus::Infeasible,
                values: Vec::new(),
            }),
            Err(ResolutionError::Unbounded) => Ok(ProgramSolution {
                status: ProgramStatus::Unbounded,
                values: Vec::new(),
            }),
            Err(err) => Err(PlannerError::Solver(err.to_string())),
        }
    }
}

fn linear_expression(terms: &Terms, handles: &[Variable]) -> Expression {
    terms
        .iter()
        .fold(Expression::from(0.0), |acc, (var, coef)| {
            acc + *coef * handles[var.0]
        })
}
