use std::collections::HashMap;

use crate::error::{LookupKind, PlannerError, Result};

/// Dense index of a team inside a [`TeamTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TeamId(pub usize);

impl TeamId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Interned team codes with their ratings. Built once per run; the index order is the
/// row order of every matrix derived from it.
#[derive(Debug, Clone)]
pub struct TeamTable {
    codes: Vec<String>,
    ratings: Vec<f64>,
    by_code: HashMap<String, TeamId>,
}

impl TeamTable {
    /// Builds the table from `(code, rating)` pairs, keeping their order.
    pub fn new<I, S>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: AsRef<str>,
    {
        let mut codes = Vec::new();
        let mut ratings = Vec::new();
        let mut by_code = HashMap::new();

        for (raw, rating) in entries {
            let code = normalize_code(raw.as_ref());
            if code.is_empty() {
                return Err(PlannerError::validation("empty team code"));
            }
            if !rating.is_finite() {
                return Err(PlannerError::validation(format!(
                    "rating for {code} is not a finite number"
                )));
            }
            let id = TeamId(codes.len());
            if by_code.insert(code.clone(), id).is_some() {
                return Err(PlannerError::validation(format!(
                    "duplicate team code {code}"
                )));
            }
            codes.push(code);
            ratings.push(rating);
        }

        Ok(Self {
            codes,
            ratings,
            by_code,
        })
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = TeamId> + '_ {
        (0..self.codes.len()).map(TeamId)
    }

    pub fn id(&self, code: &str) -> Result<TeamId> {
        self.by_code
            .get(&normalize_code(code))
            .copied()
            .ok_or_else(|| PlannerError::lookup(LookupKind::Team, code.trim()))
    }

    pub fn code(&self, id: TeamId) -> &str {
        &self.codes[id.0]
    }

    pub fn rating(&self, id: TeamId) -> f64 {
        self.ratings[id.0]
    }

    /// Rating by code; an absent code is a rating lookup failure.
    pub fn rating_of(&self, code: &str) -> Result<f64> {
        self.by_code
            .get(&normalize_code(code))
            .map(|id| self.ratings[id.0])
            .ok_or_else(|| PlannerError::lookup(LookupKind::Rating, code.trim()))
    }
}

pub fn normalize_code(raw: &str) -> String {
    raw.trim().to_ascii_uppercase()
}
