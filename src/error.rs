use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// What kind of table a failed lookup went to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupKind {
    Team,
    Rating,
    Schedule,
}

impl std::fmt::Display for LookupKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LookupKind::Team => write!(f, "team"),
            LookupKind::Rating => write!(f, "rating"),
            LookupKind::Schedule => write!(f, "schedule"),
        }
    }
}

/// Errors surfaced by a planning run. None of these are recoverable inside the library.
#[derive(Debug, Error)]
pub enum PlannerError {
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("unknown {kind} code: {code}")]
    Lookup { kind: LookupKind, code: String },

    #[error(
        "no feasible plan: {remaining_rounds} rounds left but only {available_teams} unused teams"
    )]
    Infeasible {
        remaining_rounds: usize,
        available_teams: usize,
    },

    #[error("io failure on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("solver gave up after {0:?}")]
    Timeout(Duration),

    #[error("solver failure: {0}")]
    Solver(String),
}

impl PlannerError {
    pub fn validation(msg: impl Into<String>) -> Self {
        PlannerError::Validation(msg.into())
    }

    pub fn lookup(kind: LookupKind, code: impl Into<String>) -> Self {
        PlannerError::Lookup {
            kind,
            code: code.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PlannerError::Io {
            path: path.into(),
            source,
        }
    }

    /// Stage of the planning run that failed, for user-facing messages.
    pub fn stage(&self) -> &'static str {
        match self {
            PlannerError::Validation(_) => "input validation",
            PlannerError::Lookup {
                kind: LookupKind::Rating,
                ..
            } => "rating lookup",
            PlannerError::Lookup { .. } => "schedule validation",
            PlannerError::Infeasible { .. }
            | PlannerError::Timeout(_)
            | PlannerError::Solver(_) => "optimization",
            PlannerError::Io { .. } => "io",
        }
    }
}

pub type Result<T> = std::result::Result<T, PlannerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_names_follow_error_kind() {
        assert_eq!(
            PlannerError::lookup(LookupKind::Rating, "NE").stage(),
            "rating lookup"
        );
        assert_eq!(
            PlannerError::lookup(LookupKind::Team, "XX").stage(),
            "schedule validation"
        );
        let err = PlannerError::Infeasible {
            remaining_rounds: 3,
            available_teams: 1,
        };
        assert_eq!(err.stage(), "optimization");
        assert!(err.to_string().contains("3 rounds left"));
    }
}
