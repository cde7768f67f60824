use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use env_logger::Env;

use survivor_planner::config::PlannerConfig;
use survivor_planner::planner::Season;
use survivor_planner::teams::TeamId;

const DEFAULT_OUT: &str = "wp.csv";

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env");
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    let mut cfg = PlannerConfig::from_process().context("invalid planner configuration")?;
    if cfg.export_file.is_none() {
        cfg.export_file = Some(PathBuf::from(DEFAULT_OUT));
    }

    let season = Season::load(&cfg).context("unable to load season inputs")?;
    if !season
        .export_probabilities(&cfg)
        .context("probability export failed")?
    {
        return Err(anyhow!("no export path resolved"));
    }

    println!("Probability table written");
    if let Some(path) = cfg.export_file.as_deref() {
        println!("File: {}", path.display());
    }
    println!(
        "Teams: {}  Rounds: {}",
        season.matrix.teams(),
        season.matrix.rounds()
    );

    // Quick sanity view: each team's single best round.
    let mut best = season
        .teams
        .ids()
        .map(|team| {
            let (round, lp) = season
                .matrix
                .row(team)
                .iter()
                .copied()
                .enumerate()
                .fold((0, f64::NEG_INFINITY), |acc, (j, v)| {
                    if v > acc.1 { (j, v) } else { acc }
                });
            (team, round, lp)
        })
        .collect::<Vec<(TeamId, usize, f64)>>();
    best.sort_by(|a, b| b.2.total_cmp(&a.2));
    for (team, round, lp) in best.iter().take(8) {
        println!(
            " - {} week {} p={:.3}",
            season.teams.code(*team),
            round + 1,
            lp.exp()
        );
    }

    Ok(())
}
