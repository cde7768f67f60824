use crate::error::Result;
use crate::schedule::Matchup;
use crate::teams::{TeamId, TeamTable};

// Keeps log-probabilities finite and strictly negative for absurd rating gaps.
const PROB_EPS: f64 = 1e-12;

#[derive(Debug, Clone, Copy)]
pub struct EloConfig {
    pub home_adv_pts: f64,
    pub scale: f64,
}

impl Default for EloConfig {
    fn default() -> Self {
        Self {
            home_adv_pts: 65.0,
            scale: 400.0,
        }
    }
}

/// Probability that `team_a` beats `team_b`. `home` means `team_a` hosts at its own
/// ground; pass `false` for neutral sites.
pub fn win_probability(
    team_a: &str,
    team_b: &str,
    ratings: &TeamTable,
    home: bool,
    cfg: EloConfig,
) -> Result<f64> {
    let r_a = ratings.rating_of(team_a)?;
    let r_b = ratings.rating_of(team_b)?;
    Ok(expected_score(r_a, r_b, home, cfg))
}

/// Same as [`win_probability`] for already-interned teams.
pub fn win_probability_ids(
    team_a: TeamId,
    team_b: TeamId,
    ratings: &TeamTable,
    home: bool,
    cfg: EloConfig,
) -> f64 {
    expected_score(ratings.rating(team_a), ratings.rating(team_b), home, cfg)
}

/// Win probability of `team` for one schedule entry, or `None` on a bye.
pub fn matchup_win_probability(
    team: TeamId,
    matchup: Matchup,
    ratings: &TeamTable,
    cfg: EloConfig,
) -> Option<f64> {
    match matchup {
        Matchup::Home(opp) => Some(win_probability_ids(team, opp, ratings, true, cfg)),
        // The host's edge is computed from the host's side, then flipped.
        Matchup::Away(opp) => Some(1.0 - win_probability_ids(opp, team, ratings, true, cfg)),
        Matchup::Neutral(opp) => Some(win_probability_ids(team, opp, ratings, false, cfg)),
        Matchup::Bye => None,
    }
}

fn expected_score(r_a: f64, r_b: f64, home: bool, cfg: EloConfig) -> f64 {
    let bonus = if home { cfg.home_adv_pts } else { 0.0 };
    let p = 1.0 / (1.0 + 10.0_f64.powf(-(r_a - r_b + bonus) / cfg.scale));
    p.clamp(PROB_EPS, 1.0 - PROB_EPS)
}
