//! Season survivor planning: pick one team per round, never reusing a team, so that the
//! chance of winning every round is as high as possible.

pub mod config;
pub mod elo;
pub mod error;
pub mod export;
pub mod ingest;
pub mod planner;
pub mod program;
pub mod report;
pub mod schedule;
pub mod selection;
pub mod teams;
pub mod win_matrix;

pub use error::{PlannerError, Result};
