//! League configuration and lookup construction.
//!
//! This module provides:
//! - The decoded `sports_config.json` schema (league key -> definition)
//! - The lookup builder that flattens it into `SportsLookups`
//!
//! League and team declaration order is kept end to end, because the
//! resolver's synonym tie-break depends on it.

use crate::error::ConfigError;
use crate::models::{
    ApiSportsConfig, GameDuration, LeagueConfig, SportsLookups, TeamDirectory, TeamInfo,
};
use rustc_hash::FxHashMap;
use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use serde_json::{json, Value};
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Fields a league entry must declare.
const REQUIRED_FIELDS: &[&str] = &["service_prefix", "hints", "game_duration", "teams"];

/// One team entry: canonical name plus its synonyms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamDefinition {
    pub canonical: String,
    pub synonyms: Vec<String>,
}

/// One league entry as declared in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LeagueDefinition {
    pub service_prefix: String,
    pub hints: Vec<String>,
    #[serde(default)]
    pub api_sports: Option<ApiSportsConfig>,
    pub game_duration: GameDuration,
    #[serde(deserialize_with = "teams_in_order")]
    pub teams: Vec<TeamDefinition>,
}

/// Synonyms given as a single string or a list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Synonyms {
    One(String),
    Many(Vec<String>),
}

impl From<Synonyms> for Vec<String> {
    fn from(synonyms: Synonyms) -> Self {
        match synonyms {
            Synonyms::One(s) => vec![s],
            Synonyms::Many(list) => list,
        }
    }
}

/// A team's value under `teams`. The object form may carry other keys
/// (`canonical`, `league`), which are ignored.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TeamEntry {
    Bare(Synonyms),
    Object {
        #[serde(default)]
        synonyms: Option<Synonyms>,
    },
}

impl TeamEntry {
    fn into_synonyms(self) -> Vec<String> {
        match self {
            TeamEntry::Bare(synonyms) => synonyms.into(),
            TeamEntry::Object { synonyms } => synonyms.map(Into::into).unwrap_or_default(),
        }
    }
}

/// Decode the `teams` object into a list, keeping declaration order.
fn teams_in_order<'de, D>(deserializer: D) -> Result<Vec<TeamDefinition>, D::Error>
where
    D: Deserializer<'de>,
{
    struct TeamsVisitor;

    impl<'de> Visitor<'de> for TeamsVisitor {
        type Value = Vec<TeamDefinition>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("an object of canonical team name to synonyms")
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut teams = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some(canonical) = map.next_key::<String>()? {
                let entry: Option<TeamEntry> = map.next_value().map_err(|e| {
                    <A::Error as de::Error>::custom(format!(
                        "team '{}': expected a synonym string, a list of synonyms, or an object with 'synonyms' ({})",
                        canonical, e
                    ))
                })?;
                teams.push(TeamDefinition {
                    canonical,
                    synonyms: entry.map(TeamEntry::into_synonyms).unwrap_or_default(),
                });
            }
            Ok(teams)
        }
    }

    deserializer.deserialize_map(TeamsVisitor)
}

impl LeagueDefinition {
    fn from_value(league: &str, data: &Value) -> Result<Self, ConfigError> {
        LeagueDefinition::deserialize(data).map_err(|e| league_error(league, e))
    }
}

/// Missing required fields get their own variant so the message names the field.
fn league_error(league: &str, err: serde_json::Error) -> ConfigError {
    let message = err.to_string();
    let missing = message
        .strip_prefix("missing field `")
        .and_then(|rest| rest.strip_suffix('`'))
        .and_then(|name| REQUIRED_FIELDS.iter().find(|field| **field == name));

    match missing {
        Some(field) => ConfigError::MissingField {
            league: league.to_string(),
            field,
        },
        None => ConfigError::InvalidLeague {
            league: league.to_string(),
            source: err,
        },
    }
}

/// Decoded sports configuration, leagues in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SportsConfig {
    pub leagues: Vec<(String, LeagueDefinition)>,
}

impl SportsConfig {
    /// Read and decode a sports config file.
    ///
    /// A missing file is replaced with a one-league template and the load
    /// still fails, so the run stops until the file has been edited.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            write_template(path)?;
            warn!("Sports config {} not found, wrote template", path.display());
            return Err(ConfigError::TemplateWritten {
                path: path.to_path_buf(),
            });
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let value: Value = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_value(&value)
    }

    /// Decode from an already parsed JSON document.
    pub fn from_value(value: &Value) -> Result<Self, ConfigError> {
        let obj = value.as_object().ok_or(ConfigError::NotAnObject)?;
        let leagues = obj
            .iter()
            .map(|(key, data)| Ok((key.clone(), LeagueDefinition::from_value(key, data)?)))
            .collect::<Result<Vec<_>, ConfigError>>()?;
        Ok(Self { leagues })
    }

    /// Flatten into immutable lookup tables.
    ///
    /// Two owners claiming the same lowercased team key or hint is resolved
    /// by last write wins; each collision is logged.
    pub fn build_lookups(&self) -> SportsLookups {
        let mut leagues = FxHashMap::default();
        let mut league_order = Vec::with_capacity(self.leagues.len());
        let mut all_hints: FxHashMap<String, String> = FxHashMap::default();
        let mut team_index = TeamDirectory::new();

        for (league_key, def) in &self.leagues {
            let mut teams = TeamDirectory::new();

            for team_def in &def.teams {
                let team = Arc::new(TeamInfo::new(
                    &team_def.canonical,
                    league_key,
                    team_def.synonyms.clone(),
                ));
                teams.push_team(team.clone());
                teams.insert_key(&team.canonical, team.clone());

                team_index.push_team(team.clone());
                for key in std::iter::once(&team.canonical).chain(team.synonyms.iter()) {
                    if let Some(prev) = team_index.insert_key(key, team.clone()) {
                        if !Arc::ptr_eq(&prev, &team) {
                            warn!(
                                "Team key '{}' reassigned from {} ({}) to {} ({})",
                                key.to_lowercase(),
                                prev.canonical,
                                prev.league,
                                team.canonical,
                                team.league
                            );
                        }
                    }
                }
            }

            for hint in &def.hints {
                if let Some(prev) = all_hints.insert(hint.to_lowercase(), league_key.clone()) {
                    if &prev != league_key {
                        warn!(
                            "Hint '{}' reassigned from {} to {}",
                            hint.to_lowercase(),
                            prev,
                            league_key
                        );
                    }
                }
            }

            if !leagues.contains_key(league_key) {
                league_order.push(league_key.clone());
            }
            leagues.insert(
                league_key.clone(),
                LeagueConfig {
                    service_prefix: def.service_prefix.clone(),
                    hints: def.hints.clone(),
                    api_sports: def.api_sports.clone(),
                    game_duration: def.game_duration,
                    teams,
                },
            );
        }

        info!(
            "Built sports lookups: {} leagues, {} teams, {} team keys, {} hints",
            leagues.len(),
            team_index.len(),
            team_index.key_count(),
            all_hints.len()
        );

        SportsLookups {
            leagues,
            league_order,
            all_hints,
            team_index,
        }
    }
}

/// Decode configuration and build lookups in one step.
pub fn build_sports_lookups(raw: &Value) -> Result<SportsLookups, ConfigError> {
    SportsConfig::from_value(raw).map(|config| config.build_lookups())
}

/// Write the starter config next to `path` and move it into place.
fn write_template(path: &Path) -> Result<(), ConfigError> {
    let io_err = |source: std::io::Error| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    };

    let template = json!({
        "NFL": {
            "service_prefix": "NFL",
            "hints": ["NFL", "FOOTBALL"],
            "api_sports": {"enabled": true, "endpoint": "american-football", "league_name": "NFL"},
            "game_duration": {"hours": 4, "minutes": 0},
            "teams": {
                "Pittsburgh Steelers": {
                    "canonical": "Pittsburgh Steelers",
                    "league": "NFL",
                    "synonyms": ["Steelers", "Pittsburgh"]
                }
            }
        }
    });
    let content = serde_json::to_string_pretty(&template).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, content).map_err(io_err)?;
    fs::rename(&tmp, path).map_err(io_err)
}

// ============================================================================
// Tests
// ============================================================================
