use std::process::ExitCode;

use env_logger::Env;
use log::error;

use survivor_planner::config::PlannerConfig;
use survivor_planner::planner;

fn main() -> ExitCode {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let result = PlannerConfig::from_process().and_then(|cfg| planner::run(&cfg));
    match result {
        Ok(outcome) => {
            print!("{}", outcome.report.render_text());
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("planning run failed: {err}");
            eprintln!("error: {}: {err}", err.stage());
            ExitCode::FAILURE
        }
    }
}
