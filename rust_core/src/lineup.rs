//! Lineup assignment for detected games.
//!
//! A lineup is a group of games that share no team. Each league gets one
//! `LineupManager` per run. Games are placed first-fit: lineups are scanned
//! in creation order and the first one holding neither team takes the game,
//! otherwise a new lineup is opened. Nothing is ever moved afterwards, so
//! the call order of `assign` determines the layout.

use crate::models::GameRecord;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;
use tracing::debug;

/// A group of games with no team in common.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lineup {
    /// 1-based, never reused
    pub id: u32,
    pub teams: FxHashSet<String>,
    /// "Team1 vs Team2", in assignment order
    pub games: Vec<String>,
}

impl Lineup {
    fn new(id: u32, team1: &str, team2: &str, matchup: String) -> Self {
        let mut teams = FxHashSet::default();
        teams.insert(team1.to_string());
        teams.insert(team2.to_string());
        Self {
            id,
            teams,
            games: vec![matchup],
        }
    }

    fn has_either(&self, team1: &str, team2: &str) -> bool {
        self.teams.contains(team1) || self.teams.contains(team2)
    }
}

/// Where a game landed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineupAssignment {
    pub service_prefix: String,
    /// 1-based position within the lineup
    pub channel: u32,
    pub lineup_id: u32,
}

/// Debug view of one lineup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineupSummary {
    pub lineup_id: u32,
    pub team_count: usize,
    pub game_count: usize,
    pub teams: Vec<String>,
    pub games: Vec<String>,
}

/// Sequential lineup assignment for one league.
#[derive(Debug, Clone)]
pub struct LineupManager {
    league: String,
    service_prefix: String,
    lineups: Vec<Lineup>,
}

impl LineupManager {
    pub fn new(league: &str, service_prefix: &str) -> Self {
        Self {
            league: league.to_string(),
            service_prefix: service_prefix.to_string(),
            lineups: Vec::new(),
        }
    }

    pub fn league(&self) -> &str {
        &self.league
    }

    pub fn service_prefix(&self) -> &str {
        &self.service_prefix
    }

    pub fn lineups(&self) -> &[Lineup] {
        &self.lineups
    }

    /// Assign a game to the first lineup holding neither of its teams.
    pub fn assign(&mut self, game: &GameRecord) -> LineupAssignment {
        self.assign_teams(&game.team1_canonical, &game.team2_canonical)
    }

    /// Assign a matchup given by canonical team names, in either order.
    pub fn assign_teams(&mut self, team_a: &str, team_b: &str) -> LineupAssignment {
        let (team1, team2) = if team_a <= team_b {
            (team_a, team_b)
        } else {
            (team_b, team_a)
        };
        let matchup = format!("{} vs {}", team1, team2);

        if let Some(lineup) = self
            .lineups
            .iter_mut()
            .find(|lineup| !lineup.has_either(team1, team2))
        {
            lineup.games.push(matchup);
            lineup.teams.insert(team1.to_string());
            lineup.teams.insert(team2.to_string());
            return LineupAssignment {
                service_prefix: self.service_prefix.clone(),
                channel: lineup.games.len() as u32,
                lineup_id: lineup.id,
            };
        }

        let id = self.lineups.last().map_or(1, |last| last.id + 1);
        debug!("{}: opening lineup {} for {}", self.league, id, matchup);
        self.lineups.push(Lineup::new(id, team1, team2, matchup));

        LineupAssignment {
            service_prefix: self.service_prefix.clone(),
            channel: 1,
            lineup_id: id,
        }
    }

    /// Current state of every lineup, in creation order.
    pub fn summary(&self) -> Vec<LineupSummary> {
        self.lineups
            .iter()
            .map(|lineup| {
                let mut teams: Vec<String> = lineup.teams.iter().cloned().collect();
                teams.sort();
                LineupSummary {
                    lineup_id: lineup.id,
                    team_count: lineup.teams.len(),
                    game_count: lineup.games.len(),
                    teams,
                    games: lineup.games.clone(),
                }
            })
            .collect()
    }
}

/// One lineup manager per league, created on first use.
#[derive(Debug, Clone, Default)]
pub struct LineupManagers {
    managers: FxHashMap<String, LineupManager>,
    /// League keys in first-use order
    order: Vec<String>,
}

impl LineupManagers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign a game using its league's manager.
    pub fn assign(&mut self, game: &GameRecord) -> LineupAssignment {
        if !self.managers.contains_key(&game.league) {
            self.order.push(game.league.clone());
        }
        self.managers
            .entry(game.league.clone())
            .or_insert_with(|| LineupManager::new(&game.league, &game.service_prefix))
            .assign(game)
    }

    pub fn get(&self, league: &str) -> Option<&LineupManager> {
        self.managers.get(league)
    }

    /// Managers in first-use order.
    pub fn iter(&self) -> impl Iterator<Item = &LineupManager> {
        self.order.iter().filter_map(|league| self.managers.get(league))
    }

    pub fn len(&self) -> usize {
        self.managers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.managers.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================
