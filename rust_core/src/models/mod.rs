// Shared identity and input models for the sports lineup core
use chrono::{DateTime, Duration, Utc};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub mod game;

pub use game::{matchup_key, EndpointRecord, GameRecord};

// ============================================================================
// Team & League Identity
// ============================================================================

/// A configured team. Built once by the lookup builder and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeamInfo {
    /// Authoritative display name (e.g., "Pittsburgh Steelers")
    pub canonical: String,
    /// Owning league key (e.g., "NFL")
    pub league: String,
    /// Alternate spellings as declared in configuration
    pub synonyms: Vec<String>,
}

impl TeamInfo {
    pub fn new(canonical: &str, league: &str, synonyms: Vec<String>) -> Self {
        Self {
            canonical: canonical.to_string(),
            league: league.to_string(),
            synonyms,
        }
    }

    /// True if `needle` (already lowercased) is one of this team's synonyms.
    pub fn has_synonym(&self, needle: &str) -> bool {
        self.synonyms.iter().any(|s| s.to_lowercase() == needle)
    }
}

/// Game length used to derive an end time from a start time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameDuration {
    pub hours: u32,
    pub minutes: u32,
}

impl GameDuration {
    pub fn new(hours: u32, minutes: u32) -> Self {
        Self { hours, minutes }
    }

    pub fn as_duration(&self) -> Duration {
        Duration::hours(i64::from(self.hours)) + Duration::minutes(i64::from(self.minutes))
    }
}

/// External sports API integration for one league.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiSportsConfig {
    pub enabled: bool,
    /// API endpoint the league is queried under (e.g., "american-football")
    pub endpoint: String,
    /// League name as the API spells it
    pub league_name: String,
}

/// Ordered team dictionary with a lowercased key index.
///
/// `teams` keeps every distinct team in declaration order and drives the
/// synonym fallback scan, so the earliest declared team wins a tie. `keys`
/// maps lowercased names to teams; re-inserting a key replaces its team.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TeamDirectory {
    teams: Vec<Arc<TeamInfo>>,
    keys: FxHashMap<String, Arc<TeamInfo>>,
}

impl TeamDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a team to the scan order.
    pub fn push_team(&mut self, team: Arc<TeamInfo>) {
        self.teams.push(team);
    }

    /// Map a key (lowercased here) to a team. Returns the team it displaced, if any.
    pub fn insert_key(&mut self, key: &str, team: Arc<TeamInfo>) -> Option<Arc<TeamInfo>> {
        self.keys.insert(key.to_lowercase(), team)
    }

    /// Exact lookup by an already lowercased key.
    pub fn get(&self, key: &str) -> Option<&Arc<TeamInfo>> {
        self.keys.get(key)
    }

    /// Teams in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<TeamInfo>> {
        self.teams.iter()
    }

    pub fn len(&self) -> usize {
        self.teams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }

    pub fn key_count(&self) -> usize {
        self.keys.len()
    }
}

/// Static configuration for a single league.
#[derive(Debug, Clone, PartialEq)]
pub struct LeagueConfig {
    /// Prefix for output channel identifiers
    pub service_prefix: String,
    /// League detection hints, in declaration order
    pub hints: Vec<String>,
    pub api_sports: Option<ApiSportsConfig>,
    pub game_duration: GameDuration,
    /// Teams keyed by lowercased canonical name
    pub teams: TeamDirectory,
}

impl LeagueConfig {
    /// Endpoint for API lookups, if the integration is enabled.
    pub fn api_endpoint(&self) -> Option<&str> {
        self.api_sports
            .as_ref()
            .filter(|api| api.enabled)
            .map(|api| api.endpoint.as_str())
    }

    /// Get a team by canonical name (case-insensitive).
    pub fn team(&self, canonical: &str) -> Option<&Arc<TeamInfo>> {
        self.teams.get(&canonical.to_lowercase())
    }
}

/// Immutable lookup tables consulted by the resolver.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SportsLookups {
    /// League key -> config
    pub(crate) leagues: FxHashMap<String, LeagueConfig>,
    /// League keys in declaration order
    pub(crate) league_order: Vec<String>,
    /// Lowercased hint -> league key
    pub(crate) all_hints: FxHashMap<String, String>,
    /// Lowercased canonical name or synonym -> team, across leagues
    pub(crate) team_index: TeamDirectory,
}

impl SportsLookups {
    /// Get league configuration by key.
    pub fn league(&self, league_key: &str) -> Option<&LeagueConfig> {
        self.leagues.get(league_key)
    }

    /// Leagues in declaration order.
    pub fn leagues(&self) -> impl Iterator<Item = (&str, &LeagueConfig)> {
        self.league_order
            .iter()
            .filter_map(|key| self.leagues.get(key).map(|cfg| (key.as_str(), cfg)))
    }

    /// League owning a lowercased hint.
    pub fn hint(&self, hint_lower: &str) -> Option<&str> {
        self.all_hints.get(hint_lower).map(|s| s.as_str())
    }

    pub fn hint_count(&self) -> usize {
        self.all_hints.len()
    }

    /// Cross-league team index.
    pub fn team_index(&self) -> &TeamDirectory {
        &self.team_index
    }

    /// Find the league whose enabled API integration matches an endpoint and
    /// API league name. The first declared league wins.
    pub fn league_for_api(&self, endpoint: &str, league_name: &str) -> Option<&str> {
        self.leagues()
            .find(|(_, cfg)| {
                cfg.api_sports.as_ref().is_some_and(|api| {
                    api.enabled
                        && api.endpoint == endpoint
                        && api.league_name.eq_ignore_ascii_case(league_name)
                })
            })
            .map(|(key, _)| key)
    }
}

// ============================================================================
// Raw Inputs
// ============================================================================

/// One sports listing detected in playlist metadata, already tokenized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEvent {
    pub team1: String,
    pub team2: String,
    #[serde(default)]
    pub league_hint: Option<String>,
    #[serde(default)]
    pub provider: Option<String>,
}

impl RawEvent {
    pub fn new(team1: &str, team2: &str) -> Self {
        Self {
            team1: team1.to_string(),
            team2: team2.to_string(),
            league_hint: None,
            provider: None,
        }
    }

    pub fn with_hint(mut self, hint: &str) -> Self {
        self.league_hint = Some(hint.to_string());
        self
    }

    pub fn with_provider(mut self, provider: &str) -> Self {
        self.provider = Some(provider.to_string());
        self
    }
}

/// A single game from a sports API response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiGame {
    pub home_team: String,
    pub away_team: String,
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub duration: Option<GameDuration>,
}

/// API games for one league, fetched under one endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiBatch {
    pub endpoint: String,
    pub league_name: String,
    #[serde(default)]
    pub games: Vec<ApiGame>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_game_duration() {
        let d = GameDuration::new(3, 30);
        assert_eq!(d.as_duration(), Duration::minutes(210));
    }

    #[test]
    fn test_team_directory_replaces_key_but_keeps_order() {
        let a = Arc::new(TeamInfo::new("Alpha", "X", vec!["shared".to_string()]));
        let b = Arc::new(TeamInfo::new("Beta", "Y", vec!["shared".to_string()]));

        let mut dir = TeamDirectory::new();
        dir.push_team(a.clone());
        dir.push_team(b.clone());
        assert!(dir.insert_key("Shared", a.clone()).is_none());
        let displaced = dir.insert_key("SHARED", b.clone());

        assert_eq!(displaced.as_deref(), Some(a.as_ref()));
        assert_eq!(dir.get("shared").map(|t| t.canonical.as_str()), Some("Beta"));
        assert_eq!(dir.key_count(), 1);
        let order: Vec<&str> = dir.iter().map(|t| t.canonical.as_str()).collect();
        assert_eq!(order, vec!["Alpha", "Beta"]);
    }

    #[test]
    fn test_has_synonym_is_case_insensitive() {
        let team = TeamInfo::new("Buffalo Bills", "NFL", vec!["Bills".to_string()]);
        assert!(team.has_synonym("bills"));
        assert!(!team.has_synonym("buffalo"));
    }

    #[test]
    fn test_raw_event_deserialize_defaults() {
        let json = r#"{"team1": "Steelers", "team2": "Bills"}"#;
        let event: RawEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event, RawEvent::new("Steelers", "Bills"));
    }
}
