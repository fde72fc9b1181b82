//! Per-run game records.
//!
//! A `GameRecord` is created the first time both teams of a detected game
//! resolve, then updated by later passes within the same run. Records are
//! grouped by API endpoint so the sports API is queried once per endpoint.

use super::GameDuration;
use crate::lineup::LineupAssignment;
use chrono::{DateTime, Duration, Utc};
use rustc_hash::FxHashMap;
use serde::Serialize;

/// Symmetric identity of a game: both canonical names sorted, joined by " vs ".
pub fn matchup_key(team_a: &str, team_b: &str) -> String {
    let (first, second) = sorted_pair(team_a, team_b);
    format!("{} vs {}", first, second)
}

fn sorted_pair<'a>(team_a: &'a str, team_b: &'a str) -> (&'a str, &'a str) {
    if team_a <= team_b {
        (team_a, team_b)
    } else {
        (team_b, team_a)
    }
}

/// Mutable state for one detected game.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameRecord {
    pub league: String,
    pub service_prefix: String,
    pub matchup_key: String,
    /// Alphabetically first canonical team
    pub team1_canonical: String,
    /// Alphabetically second canonical team
    pub team2_canonical: String,
    /// Empty when the league has no enabled API integration
    pub api_endpoint: String,
    /// 0 = unassigned
    pub lineup_id: u32,
    /// 0 = unassigned
    pub channel_assignment: u32,
    pub api_time: Option<DateTime<Utc>>,
    /// Overrides the league default when set
    pub game_duration: Option<GameDuration>,
}

impl GameRecord {
    pub fn new(
        league: &str,
        service_prefix: &str,
        api_endpoint: &str,
        team_a: &str,
        team_b: &str,
    ) -> Self {
        let (first, second) = sorted_pair(team_a, team_b);
        Self {
            league: league.to_string(),
            service_prefix: service_prefix.to_string(),
            matchup_key: matchup_key(first, second),
            team1_canonical: first.to_string(),
            team2_canonical: second.to_string(),
            api_endpoint: api_endpoint.to_string(),
            lineup_id: 0,
            channel_assignment: 0,
            api_time: None,
            game_duration: None,
        }
    }

    pub fn is_assigned(&self) -> bool {
        self.lineup_id != 0
    }

    /// Record a lineup assignment. The first assignment sticks; later ones
    /// are ignored and `false` is returned.
    pub fn apply_assignment(&mut self, assignment: &LineupAssignment) -> bool {
        if self.is_assigned() {
            return false;
        }
        self.lineup_id = assignment.lineup_id;
        self.channel_assignment = assignment.channel;
        true
    }

    /// Fold a later pass's view of the same game into this record.
    ///
    /// Assignment fields are first-writer-wins. Start time and duration
    /// override take the newer value whenever the newer pass supplies one.
    pub fn merge_from(&mut self, newer: &GameRecord) {
        if !self.is_assigned() && newer.is_assigned() {
            self.lineup_id = newer.lineup_id;
            self.channel_assignment = newer.channel_assignment;
        }
        if newer.api_time.is_some() {
            self.api_time = newer.api_time;
        }
        if newer.game_duration.is_some() {
            self.game_duration = newer.game_duration;
        }
    }

    /// Duration override, falling back to the league default.
    pub fn effective_duration(&self, league_default: GameDuration) -> Duration {
        self.game_duration.unwrap_or(league_default).as_duration()
    }

    /// Start time plus effective duration, once a start time is known.
    pub fn end_time(&self, league_default: GameDuration) -> Option<DateTime<Utc>> {
        self.api_time
            .map(|start| start + self.effective_duration(league_default))
    }
}

/// Game records sharing one API endpoint, in arrival order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EndpointRecord {
    pub endpoint: String,
    games: Vec<GameRecord>,
    /// matchup_key -> position in `games`
    #[serde(skip)]
    index: FxHashMap<String, usize>,
}

impl EndpointRecord {
    pub fn new(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            games: Vec::new(),
            index: FxHashMap::default(),
        }
    }

    /// Insert a record, or merge it into the existing one with the same
    /// matchup key. Returns the record's position and whether it was new.
    pub fn upsert(&mut self, record: GameRecord) -> (usize, bool) {
        if let Some(&pos) = self.index.get(&record.matchup_key) {
            self.games[pos].merge_from(&record);
            return (pos, false);
        }
        let pos = self.games.len();
        self.index.insert(record.matchup_key.clone(), pos);
        self.games.push(record);
        (pos, true)
    }

    pub fn get(&self, matchup_key: &str) -> Option<&GameRecord> {
        self.index.get(matchup_key).map(|&pos| &self.games[pos])
    }

    pub fn get_mut(&mut self, matchup_key: &str) -> Option<&mut GameRecord> {
        match self.index.get(matchup_key) {
            Some(&pos) => self.games.get_mut(pos),
            None => None,
        }
    }

    pub(crate) fn game_at(&self, pos: usize) -> Option<&GameRecord> {
        self.games.get(pos)
    }

    pub(crate) fn game_at_mut(&mut self, pos: usize) -> Option<&mut GameRecord> {
        self.games.get_mut(pos)
    }

    pub fn games(&self) -> &[GameRecord] {
        &self.games
    }

    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }
}
