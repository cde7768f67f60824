//! Per-team season schedules.
//!
//! Tokens follow the usual sheet convention: a bare code is a home game, `@CODE` is away,
//! `&CODE` is a neutral-site game and `BYE` is an off week.

use crate::error::{LookupKind, PlannerError, Result};
use crate::teams::{TeamId, TeamTable, normalize_code};

pub const BYE_TOKEN: &str = "BYE";
const AWAY_MARK: char = '@';
const NEUTRAL_MARK: char = '&';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Matchup {
    Home(TeamId),
    Away(TeamId),
    Neutral(TeamId),
    Bye,
}

impl Matchup {
    pub fn parse(token: &str, teams: &TeamTable) -> Result<Self> {
        let token = token.trim();
        if token.is_empty() {
            return Err(PlannerError::validation("empty schedule token"));
        }
        if token.eq_ignore_ascii_case(BYE_TOKEN) {
            return Ok(Matchup::Bye);
        }

        let opponent = |code: &str| {
            teams.id(code).map_err(|_| {
                PlannerError::validation(format!("schedule references unknown opponent {token}"))
            })
        };

        if let Some(rest) = token.strip_prefix(AWAY_MARK) {
            Ok(Matchup::Away(opponent(rest)?))
        } else if let Some(rest) = token.strip_prefix(NEUTRAL_MARK) {
            Ok(Matchup::Neutral(opponent(rest)?))
        } else {
            Ok(Matchup::Home(opponent(token)?))
        }
    }

    pub fn opponent(self) -> Option<TeamId> {
        match self {
            Matchup::Home(t) | Matchup::Away(t) | Matchup::Neutral(t) => Some(t),
            Matchup::Bye => None,
        }
    }

    pub fn is_bye(self) -> bool {
        matches!(self, Matchup::Bye)
    }

    /// Token form, as it would appear in a schedule sheet.
    pub fn token(self, teams: &TeamTable) -> String {
        match self {
            Matchup::Home(t) => teams.code(t).to_string(),
            Matchup::Away(t) => format!("{AWAY_MARK}{}", teams.code(t)),
            Matchup::Neutral(t) => format!("{NEUTRAL_MARK}{}", teams.code(t)),
            Matchup::Bye => BYE_TOKEN.to_string(),
        }
    }

    /// Human-readable form used in reports.
    pub fn describe(self, teams: &TeamTable) -> String {
        match self {
            Matchup::Home(t) => format!("vs {}", teams.code(t)),
            Matchup::Away(t) => format!("at {}", teams.code(t)),
            Matchup::Neutral(t) => format!("vs {} (neutral)", teams.code(t)),
            Matchup::Bye => "bye".to_string(),
        }
    }
}

/// One row of matchups per team, indexed by [`TeamId`].
#[derive(Debug, Clone)]
pub struct Schedule {
    rounds: usize,
    rows: Vec<Vec<Matchup>>,
}

impl Schedule {
    /// Validates raw rows of `(team code, tokens)`. Every team in `teams` needs exactly one
    /// row with exactly `rounds` tokens.
    pub fn from_tokens<I, S, T>(teams: &TeamTable, rounds: usize, rows: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Vec<T>)>,
        S: AsRef<str>,
        T: AsRef<str>,
    {
        let mut slots: Vec<Option<Vec<Matchup>>> = vec![None; teams.len()];

        for (code, tokens) in rows {
            let code = normalize_code(code.as_ref());
            let team = teams.id(&code).map_err(|_| {
                PlannerError::validation(format!("schedule lists team {code} with no rating"))
            })?;
            if tokens.len() != rounds {
                return Err(PlannerError::validation(format!(
                    "{code} has {} schedule entries, expected {rounds}",
                    tokens.len()
                )));
            }
            let row = tokens
                .iter()
                .map(|t| Matchup::parse(t.as_ref(), teams))
                .collect::<Result<Vec<_>>>()?;
            if row.iter().any(|m| m.opponent() == Some(team)) {
                return Err(PlannerError::validation(format!(
                    "{code} is scheduled against itself"
                )));
            }
            let slot = &mut slots[team.index()];
            if slot.is_some() {
                return Err(PlannerError::validation(format!(
                    "duplicate schedule row for {code}"
                )));
            }
            *slot = Some(row);
        }

        let mut out = Vec::with_capacity(slots.len());
        for (idx, slot) in slots.into_iter().enumerate() {
            match slot {
                Some(row) => out.push(row),
                None => {
                    return Err(PlannerError::validation(format!(
                        "no schedule row for {}",
                        teams.code(TeamId(idx))
                    )));
                }
            }
        }

        Ok(Self { rounds, rows: out })
    }

    pub fn rounds(&self) -> usize {
        self.rounds
    }

    pub fn teams(&self) -> usize {
        self.rows.len()
    }

    pub fn row(&self, team: TeamId) -> &[Matchup] {
        &self.rows[team.index()]
    }

    pub fn matchup(&self, team: TeamId, round: usize) -> Matchup {
        self.rows[team.index()][round]
    }

    /// Row lookup by code; an unknown code is a schedule lookup failure.
    pub fn row_of<'a>(&'a self, code: &str, teams: &TeamTable) -> Result<&'a [Matchup]> {
        let id = teams
            .id(code)
            .map_err(|_| PlannerError::lookup(LookupKind::Schedule, code.trim()))?;
        self.rows
            .get(id.index())
            .map(Vec::as_slice)
            .ok_or_else(|| PlannerError::lookup(LookupKind::Schedule, code.trim()))
    }
}
