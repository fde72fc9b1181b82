//! Diagnostics for identities that could not be resolved.
//!
//! This module provides:
//! - The `DiagnosticSink` seam the game book reports through
//! - `DiagnosticCollector`, an append-only in-memory sink
//! - JSON persistence of collected reports per run

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// A playlist listing whose teams could not both be resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnmappedGame {
    pub league: String,
    pub raw_display_name: String,
    pub teams: Vec<String>,
    pub provider: String,
    pub reason: String,
}

impl UnmappedGame {
    pub fn new(league: &str, team1_raw: &str, team2_raw: &str, provider: Option<&str>, reason: &str) -> Self {
        Self {
            league: league.to_string(),
            raw_display_name: format!("{} vs {}", team1_raw, team2_raw),
            teams: vec![team1_raw.to_string(), team2_raw.to_string()],
            provider: provider.unwrap_or_default().to_string(),
            reason: reason.to_string(),
        }
    }
}

/// An API game whose team names could not be mapped to configured teams.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingTeam {
    pub league: String,
    pub teams: Vec<String>,
    pub reason: String,
}

impl MissingTeam {
    pub fn new(league: &str, teams: &[&str], reason: &str) -> Self {
        Self {
            league: league.to_string(),
            teams: teams.iter().map(|t| t.to_string()).collect(),
            reason: reason.to_string(),
        }
    }
}

/// Receiver for resolution failures.
///
/// Implementations are not required to be thread-safe; report from one
/// thread of control.
pub trait DiagnosticSink {
    fn unmapped_game(&mut self, report: UnmappedGame);

    fn missing_team(&mut self, report: MissingTeam);

    /// Count one occurrence of a category that had no mapping.
    fn unmapped_category(&mut self, category: &str);
}

/// Collects diagnostics for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiagnosticCollector {
    pub unmapped_games: Vec<UnmappedGame>,
    pub missing_teams: Vec<MissingTeam>,
    pub unmapped_categories: BTreeMap<String, u64>,
}

impl DiagnosticCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.unmapped_games.is_empty()
            && self.missing_teams.is_empty()
            && self.unmapped_categories.is_empty()
    }

    /// Write every report to `<base_dir>/<run_id>/diagnostics/`.
    ///
    /// Returns the diagnostics directory.
    pub fn dump_all(&self, base_dir: &Path, run_id: &str) -> Result<PathBuf, std::io::Error> {
        let dir = base_dir.join(run_id).join("diagnostics");
        fs::create_dir_all(&dir)?;

        fs::write(
            dir.join("unmapped_games.json"),
            serde_json::to_string_pretty(&self.unmapped_games)?,
        )?;
        fs::write(
            dir.join("missing_teams.json"),
            serde_json::to_string_pretty(&self.missing_teams)?,
        )?;
        fs::write(
            dir.join("unmapped_categories.json"),
            serde_json::to_string_pretty(&self.unmapped_categories)?,
        )?;

        info!(
            "Wrote diagnostics to {}: {} unmapped games, {} missing teams, {} unmapped categories",
            dir.display(),
            self.unmapped_games.len(),
            self.missing_teams.len(),
            self.unmapped_categories.len()
        );
        Ok(dir)
    }
}

impl DiagnosticSink for DiagnosticCollector {
    fn unmapped_game(&mut self, report: UnmappedGame) {
        self.unmapped_games.push(report);
    }

    fn missing_team(&mut self, report: MissingTeam) {
        self.missing_teams.push(report);
    }

    fn unmapped_category(&mut self, category: &str) {
        *self
            .unmapped_categories
            .entry(category.to_string())
            .or_insert(0) += 1;
    }
}
