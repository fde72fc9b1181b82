//! M3U Sports Core - team matching and lineup packing for IPTV sports listings.
//!
//! This module provides:
//! - Immutable league/team lookup tables built from `sports_config.json`
//! - Case-insensitive team and league resolution with synonym fallback
//! - Per-run game records grouped by sports API endpoint
//! - First-fit lineup packing so no lineup carries two games with a common team
//! - Diagnostics for listings that could not be resolved

pub mod diagnostics;
pub mod error;
pub mod games;
pub mod league_config;
pub mod lineup;
pub mod matching;
pub mod models;

pub use diagnostics::{DiagnosticCollector, DiagnosticSink, MissingTeam, UnmappedGame};
pub use error::ConfigError;
pub use games::{ApiMergeStats, GameBook};
pub use league_config::{build_sports_lookups, LeagueDefinition, SportsConfig, TeamDefinition};
pub use lineup::{Lineup, LineupAssignment, LineupManager, LineupManagers, LineupSummary};
pub use matching::{find_team, infer_league, resolve_league, resolve_team, TeamScope};
pub use models::{
    matchup_key, ApiBatch, ApiGame, ApiSportsConfig, EndpointRecord, GameDuration, GameRecord,
    LeagueConfig, RawEvent, SportsLookups, TeamDirectory, TeamInfo,
};
