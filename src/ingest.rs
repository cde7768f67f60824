//! Readers for the ratings and schedule sheets.
//!
//! Both files are headerless CSV. Ratings are `CODE,rating` pairs, either one per line or
//! all on a single line. The schedule has one line per team: the team code followed by one
//! token per round.

use std::fs;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};
use log::debug;

use crate::error::{PlannerError, Result};
use crate::schedule::Schedule;
use crate::teams::TeamTable;

pub fn load_ratings(path: &Path, expected_teams: usize) -> Result<TeamTable> {
    let raw = fs::read_to_string(path).map_err(|e| PlannerError::io(path, e))?;
    let table = parse_ratings(&raw, expected_teams)
        .map_err(|e| annotate(e, path))?;
    debug!("loaded {} ratings from {}", table.len(), path.display());
    Ok(table)
}

pub fn parse_ratings(raw: &str, expected_teams: usize) -> Result<TeamTable> {
    let fields: Vec<String> = records(raw)?
        .iter()
        .flat_map(|r| r.iter().map(str::to_string).collect::<Vec<_>>())
        .filter(|f| !f.is_empty())
        .collect();

    if fields.len() % 2 != 0 {
        return Err(PlannerError::validation(
            "ratings must come in CODE,rating pairs",
        ));
    }

    let mut entries = Vec::with_capacity(fields.len() / 2);
    for pair in fields.chunks_exact(2) {
        let rating = pair[1].parse::<f64>().map_err(|_| {
            PlannerError::validation(format!("invalid rating {} for {}", pair[1], pair[0]))
        })?;
        entries.push((pair[0].as_str(), rating));
    }
    if entries.len() != expected_teams {
        return Err(PlannerError::validation(format!(
            "expected {expected_teams} ratings, found {}",
            entries.len()
        )));
    }
    TeamTable::new(entries)
}

pub fn load_schedule(path: &Path, teams: &TeamTable, rounds: usize) -> Result<Schedule> {
    let raw = fs::read_to_string(path).map_err(|e| PlannerError::io(path, e))?;
    let schedule = parse_schedule(&raw, teams, rounds).map_err(|e| annotate(e, path))?;
    debug!(
        "loaded schedule for {} teams over {} rounds from {}",
        schedule.teams(),
        schedule.rounds(),
        path.display()
    );
    Ok(schedule)
}

pub fn parse_schedule(raw: &str, teams: &TeamTable, rounds: usize) -> Result<Schedule> {
    let mut rows = Vec::new();
    for record in records(raw)? {
        let mut fields: Vec<String> = record.iter().map(str::to_string).collect();
        // Spreadsheet exports often leave trailing commas.
        while fields.last().is_some_and(|f| f.is_empty()) {
            fields.pop();
        }
        let Some((code, tokens)) = fields.split_first() else {
            continue;
        };
        rows.push((code.clone(), tokens.to_vec()));
    }
    if rows.len() != teams.len() {
        return Err(PlannerError::validation(format!(
            "schedule has {} team rows, expected {}",
            rows.len(),
            teams.len()
        )));
    }
    Schedule::from_tokens(teams, rounds, rows)
}

fn records(raw: &str) -> Result<Vec<StringRecord>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(raw.as_bytes());
    reader
        .records()
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| PlannerError::validation(format!("malformed csv: {e}")))
}

fn annotate(err: PlannerError, path: &Path) -> PlannerError {
    match err {
        PlannerError::Validation(msg) => {
            PlannerError::Validation(format!("{}: {msg}", path.display()))
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratings_accept_one_pair_per_line() {
        let t = parse_ratings("NE,1600\nMIA,1450.5\n", 2).unwrap();
        assert!((t.rating_of("MIA").unwrap() - 1450.5).abs() < 1e-12);
    }

    #[test]
    fn ratings_accept_flat_layout() {
        let t = parse_ratings("NE, 1600, MIA, 1450", 2).unwrap();
        assert_eq!(t.code(t.id("MIA").unwrap()), "MIA");
    }

    #[test]
    fn ratings_count_must_match() {
        let err = parse_ratings("NE,1600\n", 2).unwrap_err();
        assert!(err.to_string().contains("expected 2 ratings, found 1"));
    }

    #[test]
    fn ratings_reject_garbage_numbers() {
        assert!(parse_ratings("NE,strong\n", 1).is_err());
    }

    #[test]
    fn schedule_drops_trailing_empty_cells() {
        let t = parse_ratings("NE,1600\nMIA,1450\n", 2).unwrap();
        let s = parse_schedule("NE,MIA,BYE,,\nMIA,@NE,BYE\n", &t, 2).unwrap();
        assert_eq!(s.rounds(), 2);
        assert!(s.matchup(t.id("NE").unwrap(), 1).is_bye());
    }

    #[test]
    fn schedule_row_count_must_match() {
        let t = parse_ratings("NE,1600\nMIA,1450\n", 2).unwrap();
        let err = parse_schedule("NE,MIA\n", &t, 1).unwrap_err();
        assert!(err.to_string().contains("1 team rows"));
    }
}
