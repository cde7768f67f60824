use std::fs;
use std::path::{Path, PathBuf};

use csv::WriterBuilder;
use log::info;

use crate::error::{PlannerError, Result};
use crate::report::PlanReport;
use crate::teams::TeamTable;
use crate::win_matrix::WinProbabilityMatrix;

/// Writes one row per team: the code followed by its log-probabilities per round.
/// Any previous file at `path` is replaced; a missing one is fine.
pub fn write_probability_table(
    path: &Path,
    matrix: &WinProbabilityMatrix,
    teams: &TeamTable,
) -> Result<()> {
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .flexible(false)
        .from_writer(Vec::new());
    for (team, row) in teams.ids().zip(matrix.rows()) {
        let mut record = Vec::with_capacity(row.len() + 1);
        record.push(teams.code(team).to_string());
        record.extend(row.iter().map(|v| v.to_string()));
        writer
            .write_record(&record)
            .map_err(|e| PlannerError::validation(format!("probability table row: {e}")))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| PlannerError::io(path, std::io::Error::new(e.error().kind(), e.to_string())))?;

    replace_file(path, &bytes)?;
    info!("wrote probability table to {}", path.display());
    Ok(())
}

pub fn write_report_json(path: &Path, report: &PlanReport) -> Result<()> {
    let json = serde_json::to_string_pretty(report)
        .map_err(|e| PlannerError::validation(format!("serialize plan report: {e}")))?;
    replace_file(path, json.as_bytes())?;
    info!("wrote plan report to {}", path.display());
    Ok(())
}

/// Writes to a sibling temp file, then renames it over `path`.
fn replace_file(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| PlannerError::io(parent, e))?;
    }
    let tmp = tmp_path(path);
    fs::write(&tmp, bytes).map_err(|e| PlannerError::io(&tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| PlannerError::io(path, e))?;
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
