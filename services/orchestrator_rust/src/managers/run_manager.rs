use crate::config::Config;
use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Local, NaiveDate};
use m3u_sports_core::{
    ApiBatch, DiagnosticCollector, GameBook, LineupManagers, RawEvent, SportsConfig,
    SportsLookups,
};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

/// Run folder name, e.g. "2026-02-05_19-27-30" (local time).
const RUN_ID_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";
/// Date folder grouping a day's runs, e.g. "2026-02-05".
const DATE_FOLDER_FORMAT: &str = "%Y-%m-%d";
const CURRENT_LINK: &str = "current";

/// Where one run writes its output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPaths {
    pub run_id: String,
    pub date_folder: String,
    /// <log_dir>/<date_folder>/<run_id>
    pub run_dir: PathBuf,
}

impl RunPaths {
    pub fn new(log_dir: &Path, started: DateTime<Local>) -> Self {
        let run_id = started.format(RUN_ID_FORMAT).to_string();
        let date_folder = started.format(DATE_FOLDER_FORMAT).to_string();
        let run_dir = log_dir.join(&date_folder).join(&run_id);
        Self {
            run_id,
            date_folder,
            run_dir,
        }
    }

    /// Run folder relative to the log dir, used as the `current` link target.
    fn relative_run_dir(&self) -> PathBuf {
        Path::new(&self.date_folder).join(&self.run_id)
    }
}

/// What one run produced.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: String,
    pub listings: usize,
    pub games: usize,
    pub lineups: usize,
    pub run_dir: PathBuf,
    pub diagnostics_dir: PathBuf,
}

/// Drives one matching-and-packing run from files on disk.
pub struct RunManager {
    config: Config,
}

impl RunManager {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub async fn run(&self) -> Result<RunReport> {
        self.run_at(Local::now()).await
    }

    pub async fn run_at(&self, started: DateTime<Local>) -> Result<RunReport> {
        let lookups = self.load_lookups().await?;

        let log_dir = &self.config.diagnostics_dir;
        let paths = RunPaths::new(log_dir, started);
        fs::create_dir_all(&paths.run_dir)
            .await
            .with_context(|| format!("Failed to create run folder {}", paths.run_dir.display()))?;
        info!("Run {} starting in {}", paths.run_id, paths.run_dir.display());

        if self.config.cleanup_on_startup {
            cleanup_old_runs(log_dir, started.date_naive(), self.config.log_retention_days).await;
        }
        update_current_link(log_dir, &paths.relative_run_dir()).await;

        let events: Vec<RawEvent> = read_json(&self.config.events_path)
            .await
            .context("Failed to load detected events")?;

        let mut book = GameBook::new();
        let mut diagnostics = DiagnosticCollector::new();
        for event in &events {
            book.detect(&lookups, event, &mut diagnostics);
        }
        info!(
            "Detected {} games from {} listings ({} unmapped)",
            book.len(),
            events.len(),
            diagnostics.unmapped_games.len()
        );

        for endpoint in book.endpoints().iter().filter(|e| !e.endpoint.is_empty()) {
            debug!("Endpoint {}: {} games to query", endpoint.endpoint, endpoint.len());
        }

        if let Some(path) = &self.config.api_games_path {
            let batches: Vec<ApiBatch> = read_json(path)
                .await
                .context("Failed to load API games")?;
            for batch in &batches {
                book.merge_api_batch(&lookups, batch, &mut diagnostics);
            }
        }

        let mut managers = LineupManagers::new();
        let assigned = book.assign_lineups(&mut managers);
        let mut lineups = 0;
        for manager in managers.iter() {
            for lineup in manager.summary() {
                info!(
                    "{} lineup {}: {} games [{}]",
                    manager.league(),
                    lineup.lineup_id,
                    lineup.game_count,
                    lineup.games.join(", ")
                );
                lineups += 1;
            }
        }
        info!("Assigned {} games to {} lineups", assigned, lineups);

        let base = log_dir.join(&paths.date_folder);
        let id = paths.run_id.clone();
        let diagnostics_dir =
            tokio::task::spawn_blocking(move || diagnostics.dump_all(&base, &id))
                .await
                .context("Diagnostics writer panicked")?
                .context("Failed to write diagnostics")?;

        Ok(RunReport {
            run_id: paths.run_id,
            listings: events.len(),
            games: book.len(),
            lineups,
            run_dir: paths.run_dir,
            diagnostics_dir,
        })
    }

    async fn load_lookups(&self) -> Result<SportsLookups> {
        let path = self.config.sports_config_path.clone();
        let config = tokio::task::spawn_blocking(move || SportsConfig::load(&path))
            .await
            .context("Sports config loader panicked")?
            .with_context(|| {
                format!(
                    "Failed to load sports config {}",
                    self.config.sports_config_path.display()
                )
            })?;
        Ok(config.build_lookups())
    }
}

/// Remove date folders older than `retention_days` before `today`.
///
/// Only folders named like a date are touched. Returns how many were removed.
async fn cleanup_old_runs(log_dir: &Path, today: NaiveDate, retention_days: u32) -> usize {
    let cutoff = today - Duration::days(i64::from(retention_days));
    let mut entries = match fs::read_dir(log_dir).await {
        Ok(entries) => entries,
        Err(e) => {
            debug!("Skipping log cleanup, cannot read {}: {}", log_dir.display(), e);
            return 0;
        }
    };

    let mut removed = 0;
    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                warn!("Log cleanup stopped early in {}: {}", log_dir.display(), e);
                break;
            }
        };
        let is_dir = entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false);
        if !is_dir {
            continue;
        }
        let folder_date = entry
            .file_name()
            .to_str()
            .and_then(|name| NaiveDate::parse_from_str(name, DATE_FOLDER_FORMAT).ok());
        let Some(folder_date) = folder_date else {
            continue;
        };
        if folder_date >= cutoff {
            continue;
        }

        let path = entry.path();
        match fs::remove_dir_all(&path).await {
            Ok(()) => {
                info!("Removed old log folder {}", path.display());
                removed += 1;
            }
            Err(e) => warn!("Failed to remove old log folder {}: {}", path.display(), e),
        }
    }
    removed
}

/// Point `<log_dir>/current` at `target` via a temporary link and a rename.
async fn update_current_link(log_dir: &Path, target: &Path) {
    let current = log_dir.join(CURRENT_LINK);
    let tmp = log_dir.join(format!("{}.tmp", CURRENT_LINK));

    let result: std::io::Result<()> = async {
        if fs::symlink_metadata(&tmp).await.is_ok() {
            fs::remove_file(&tmp).await?;
        }
        symlink(target, &tmp).await?;
        fs::rename(&tmp, &current).await
    }
    .await;

    match result {
        Ok(()) => info!("Updated {} -> {}", current.display(), target.display()),
        Err(e) => warn!("Failed to update {} -> {}: {}", current.display(), target.display(), e),
    }
}

#[cfg(unix)]
async fn symlink(target: &Path, link: &Path) -> std::io::Result<()> {
    fs::symlink(target, link).await
}

#[cfg(not(unix))]
async fn symlink(_target: &Path, _link: &Path) -> std::io::Result<()> {
    Err(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        "run folder links need a unix host",
    ))
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use m3u_sports_core::ConfigError;
    use serde_json::json;

    fn write(path: &Path, value: serde_json::Value) {
        std::fs::write(path, value.to_string()).unwrap();
    }

    fn config_in(dir: &Path) -> Config {
        Config {
            sports_config_path: dir.join("sports_config.json"),
            events_path: dir.join("events.json"),
            api_games_path: Some(dir.join("api_games.json")),
            diagnostics_dir: dir.join("logs"),
            log_level: "info".to_string(),
            log_retention_days: 14,
            cleanup_on_startup: true,
        }
    }

    fn at(day: u32, hour: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 10, day, hour, 0, 0).unwrap()
    }

    /// One NFL league, one listing, no API batches.
    fn minimal_inputs(config: &mut Config) {
        write(
            &config.sports_config_path,
            json!({
                "NFL": {
                    "service_prefix": "NFL",
                    "hints": ["NFL"],
                    "game_duration": {"hours": 4, "minutes": 0},
                    "teams": {"Pittsburgh Steelers": ["Steelers"], "Buffalo Bills": ["Bills"]}
                }
            }),
        );
        write(&config.events_path, json!([{"team1": "Steelers", "team2": "Bills"}]));
        config.api_games_path = None;
    }

    #[tokio::test]
    async fn test_run_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());

        write(
            &config.sports_config_path,
            json!({
                "NFL": {
                    "service_prefix": "NFL",
                    "hints": ["NFL"],
                    "api_sports": {"enabled": true, "endpoint": "american-football", "league_name": "NFL"},
                    "game_duration": {"hours": 4, "minutes": 0},
                    "teams": {
                        "Pittsburgh Steelers": ["Steelers"],
                        "Buffalo Bills": ["Bills"],
                        "Kansas City Chiefs": ["Chiefs"]
                    }
                }
            }),
        );
        write(
            &config.events_path,
            json!([
                {"team1": "Steelers", "team2": "Bills", "league_hint": "NFL", "provider": "alpha"},
                {"team1": "Chiefs", "team2": "Steelers"},
                {"team1": "Raiderz", "team2": "Chiefs", "league_hint": "NFL"}
            ]),
        );
        write(
            config.api_games_path.as_ref().unwrap(),
            json!([{
                "endpoint": "american-football",
                "league_name": "NFL",
                "games": [{"home_team": "Raiderz", "away_team": "Chiefs", "start_time": "2026-11-01T18:00:00Z"}]
            }]),
        );

        let report = RunManager::new(config).run_at(at(19, 8)).await.unwrap();

        assert_eq!(report.run_id, "2026-10-19_08-00-00");
        assert_eq!(report.listings, 3);
        assert_eq!(report.games, 2);
        assert_eq!(report.lineups, 2);
        assert!(report.diagnostics_dir.join("unmapped_games.json").exists());
        assert!(report.diagnostics_dir.join("missing_teams.json").exists());
        assert!(report
            .diagnostics_dir
            .ends_with("logs/2026-10-19/2026-10-19_08-00-00/diagnostics"));
        assert_eq!(report.diagnostics_dir.parent(), Some(report.run_dir.as_path()));
    }

    #[tokio::test]
    async fn test_malformed_config_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        write(
            &config.sports_config_path,
            json!({"NFL": {"service_prefix": "NFL", "hints": [], "game_duration": {"hours": 4, "minutes": 0}}}),
        );
        write(&config.events_path, json!([]));

        let err = RunManager::new(config).run().await.unwrap_err();
        assert!(err.downcast_ref::<ConfigError>().is_some());
        assert!(format!("{:#}", err).contains("'teams'"));
    }

    #[tokio::test]
    async fn test_missing_config_writes_template_and_stops() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let config_path = config.sports_config_path.clone();
        let log_dir = config.diagnostics_dir.clone();

        let err = RunManager::new(config).run().await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::TemplateWritten { .. })
        ));
        assert!(config_path.exists());
        // Nothing is processed, so no run folder either
        assert!(!log_dir.exists());
    }

    #[tokio::test]
    async fn test_old_date_folders_are_removed() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(dir.path());
        minimal_inputs(&mut config);

        let logs = config.diagnostics_dir.clone();
        for name in ["2026-09-01", "2026-10-10", "notes"] {
            std::fs::create_dir_all(logs.join(name).join("run")).unwrap();
        }
        std::fs::write(logs.join("2026-01-01"), "not a folder").unwrap();

        RunManager::new(config).run_at(at(19, 8)).await.unwrap();

        assert!(!logs.join("2026-09-01").exists());
        assert!(logs.join("2026-10-10").exists());
        assert!(logs.join("notes").exists());
        assert!(logs.join("2026-01-01").is_file());
        assert!(logs.join("2026-10-19").is_dir());
    }

    #[tokio::test]
    async fn test_cleanup_can_be_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(dir.path());
        minimal_inputs(&mut config);
        config.cleanup_on_startup = false;

        let logs = config.diagnostics_dir.clone();
        std::fs::create_dir_all(logs.join("2025-01-01")).unwrap();

        RunManager::new(config).run_at(at(19, 8)).await.unwrap();
        assert!(logs.join("2025-01-01").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_current_link_follows_latest_run() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(dir.path());
        minimal_inputs(&mut config);
        let logs = config.diagnostics_dir.clone();
        let manager = RunManager::new(config);

        manager.run_at(at(19, 8)).await.unwrap();
        assert_eq!(
            std::fs::read_link(logs.join("current")).unwrap(),
            PathBuf::from("2026-10-19/2026-10-19_08-00-00")
        );

        let report = manager.run_at(at(20, 9)).await.unwrap();
        assert_eq!(
            std::fs::read_link(logs.join("current")).unwrap(),
            PathBuf::from("2026-10-20/2026-10-20_09-00-00")
        );
        assert!(logs.join("current").join("diagnostics").is_dir());
        assert_eq!(report.run_dir, logs.join("2026-10-20").join("2026-10-20_09-00-00"));
        assert!(!logs.join("current.tmp").exists());
    }

    #[test]
    fn test_run_paths() {
        let paths = RunPaths::new(Path::new("logs"), at(5, 19));
        assert_eq!(paths.run_id, "2026-10-05_19-00-00");
        assert_eq!(paths.date_folder, "2026-10-05");
        assert_eq!(paths.run_dir, PathBuf::from("logs/2026-10-05/2026-10-05_19-00-00"));
    }
}
