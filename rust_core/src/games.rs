//! Game book: per-run game records, grouped by API endpoint.
//!
//! Detection passes create or merge records, API passes fill in start
//! times, and a final pass hands records to the lineup managers in the
//! order they were first seen. Failures go to a `DiagnosticSink` and the
//! event is simply dropped for this pass.

use crate::diagnostics::{DiagnosticSink, MissingTeam, UnmappedGame};
use crate::lineup::LineupManagers;
use crate::matching::{infer_league, resolve_league, resolve_team, TeamScope};
use crate::models::{matchup_key, ApiBatch, EndpointRecord, GameRecord, RawEvent, SportsLookups};
use rustc_hash::FxHashMap;
use tracing::{debug, info};

/// Counts from merging one API batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApiMergeStats {
    /// Records whose start time was updated
    pub merged: usize,
    /// Resolved games with no detected record
    pub skipped: usize,
    /// Games reported as missing teams
    pub unresolved: usize,
}

/// All game records for one run.
#[derive(Debug, Clone, Default)]
pub struct GameBook {
    endpoints: Vec<EndpointRecord>,
    /// endpoint name -> position in `endpoints`
    endpoint_index: FxHashMap<String, usize>,
    /// (endpoint position, game position) in first-seen order
    arrival: Vec<(usize, usize)>,
}

impl GameBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Detect a game from a raw listing.
    ///
    /// The league comes from the hint when it resolves, otherwise from the
    /// first team token found in the cross-league index.
    pub fn detect(
        &mut self,
        lookups: &SportsLookups,
        event: &RawEvent,
        sink: &mut dyn DiagnosticSink,
    ) -> Option<&GameRecord> {
        let league = event
            .league_hint
            .as_deref()
            .and_then(|hint| resolve_league(lookups, hint))
            .or_else(|| infer_league(lookups, &event.team1, &event.team2));

        let Some(league) = league else {
            debug!("No league for {} vs {}", event.team1, event.team2);
            sink.unmapped_game(UnmappedGame::new(
                "",
                &event.team1,
                &event.team2,
                event.provider.as_deref(),
                "league not detected",
            ));
            return None;
        };

        self.record_game(
            lookups,
            TeamScope::League,
            league,
            &event.team1,
            &event.team2,
            event.provider.as_deref(),
            sink,
        )
    }

    /// Resolve both team tokens and create or merge the game record.
    ///
    /// Returns `None` and reports an unmapped game if the league is unknown,
    /// either token fails to resolve, a team belongs to another league, or
    /// both resolve to the same team.
    #[allow(clippy::too_many_arguments)]
    pub fn record_game(
        &mut self,
        lookups: &SportsLookups,
        scope: TeamScope,
        league_key: &str,
        raw1: &str,
        raw2: &str,
        provider: Option<&str>,
        sink: &mut dyn DiagnosticSink,
    ) -> Option<&GameRecord> {
        let Some(league) = lookups.league(league_key) else {
            sink.unmapped_game(UnmappedGame::new(league_key, raw1, raw2, provider, "unknown league"));
            return None;
        };

        let team1 = resolve_team(lookups, scope, league_key, raw1);
        let team2 = resolve_team(lookups, scope, league_key, raw2);
        let (team1, team2) = match (team1, team2) {
            (Some(t1), Some(t2)) => (t1, t2),
            (t1, t2) => {
                let missing: Vec<&str> = [(raw1, t1.is_none()), (raw2, t2.is_none())]
                    .into_iter()
                    .filter(|(_, missing)| *missing)
                    .map(|(raw, _)| raw)
                    .collect();
                let reason = format!("team not found: {}", missing.join(", "));
                debug!("{}: dropping {} vs {} ({})", league_key, raw1, raw2, reason);
                sink.unmapped_game(UnmappedGame::new(league_key, raw1, raw2, provider, &reason));
                return None;
            }
        };

        // Cross-league lookups can hand back another league's team
        if let Some(stray) = [&team1, &team2].into_iter().find(|t| t.league != league_key) {
            let reason = format!("{} belongs to {}", stray.canonical, stray.league);
            debug!("{}: dropping {} vs {} ({})", league_key, raw1, raw2, reason);
            sink.unmapped_game(UnmappedGame::new(league_key, raw1, raw2, provider, &reason));
            return None;
        }

        if team1.canonical == team2.canonical {
            sink.unmapped_game(UnmappedGame::new(
                league_key,
                raw1,
                raw2,
                provider,
                &format!("both teams resolve to {}", team1.canonical),
            ));
            return None;
        }

        let record = GameRecord::new(
            league_key,
            &league.service_prefix,
            league.api_endpoint().unwrap_or_default(),
            &team1.canonical,
            &team2.canonical,
        );

        let endpoint_pos = self.endpoint_position(&record.api_endpoint);
        let endpoint = &mut self.endpoints[endpoint_pos];
        let (game_pos, created) = endpoint.upsert(record);
        if created {
            self.arrival.push((endpoint_pos, game_pos));
        }

        let game = self.endpoints[endpoint_pos].game_at(game_pos)?;
        if created {
            debug!("{}: new game {}", league_key, game.matchup_key);
        }
        Some(game)
    }

    /// Merge start times from an API batch into existing records.
    ///
    /// API games are mapped to a league through the batch's endpoint and
    /// league name. Unresolvable team names are reported as missing teams.
    /// Records are never created here.
    pub fn merge_api_batch(
        &mut self,
        lookups: &SportsLookups,
        batch: &ApiBatch,
        sink: &mut dyn DiagnosticSink,
    ) -> ApiMergeStats {
        let mut stats = ApiMergeStats::default();

        let Some(league_key) = lookups.league_for_api(&batch.endpoint, &batch.league_name) else {
            for game in &batch.games {
                sink.missing_team(MissingTeam::new(
                    &batch.league_name,
                    &[game.home_team.as_str(), game.away_team.as_str()],
                    &format!("no league configured for {}/{}", batch.endpoint, batch.league_name),
                ));
                stats.unresolved += 1;
            }
            return stats;
        };

        for game in &batch.games {
            let home = resolve_team(lookups, TeamScope::League, league_key, &game.home_team);
            let away = resolve_team(lookups, TeamScope::League, league_key, &game.away_team);
            let (home, away) = match (home, away) {
                (Some(h), Some(a)) => (h, a),
                (h, a) => {
                    let missing: Vec<&str> = [(&game.home_team, h.is_none()), (&game.away_team, a.is_none())]
                        .into_iter()
                        .filter(|(_, missing)| *missing)
                        .map(|(raw, _)| raw.as_str())
                        .collect();
                    sink.missing_team(MissingTeam::new(
                        league_key,
                        &[game.home_team.as_str(), game.away_team.as_str()],
                        &format!("team not found: {}", missing.join(", ")),
                    ));
                    stats.unresolved += 1;
                    continue;
                }
            };

            let key = matchup_key(&home.canonical, &away.canonical);
            let record = self
                .endpoint_mut(&batch.endpoint)
                .and_then(|endpoint| endpoint.get_mut(&key));
            match record {
                Some(record) => {
                    record.api_time = Some(game.start_time);
                    if game.duration.is_some() {
                        record.game_duration = game.duration;
                    }
                    stats.merged += 1;
                }
                None => stats.skipped += 1,
            }
        }

        info!(
            "API batch {}/{}: {} merged, {} skipped, {} unresolved",
            batch.endpoint, batch.league_name, stats.merged, stats.skipped, stats.unresolved
        );
        stats
    }

    /// Assign every unassigned record to a lineup, in first-seen order.
    ///
    /// Returns the number of records newly assigned.
    pub fn assign_lineups(&mut self, managers: &mut LineupManagers) -> usize {
        let mut assigned = 0;
        for &(endpoint_pos, game_pos) in &self.arrival {
            let Some(game) = self.endpoints[endpoint_pos].game_at_mut(game_pos) else {
                continue;
            };
            if game.is_assigned() {
                continue;
            }
            let assignment = managers.assign(game);
            if game.apply_assignment(&assignment) {
                assigned += 1;
            }
        }
        assigned
    }

    /// Look up a record by endpoint and matchup key.
    pub fn get(&self, endpoint: &str, matchup_key: &str) -> Option<&GameRecord> {
        self.endpoint(endpoint)?.get(matchup_key)
    }

    pub fn endpoint(&self, endpoint: &str) -> Option<&EndpointRecord> {
        self.endpoint_index
            .get(endpoint)
            .map(|&pos| &self.endpoints[pos])
    }

    fn endpoint_mut(&mut self, endpoint: &str) -> Option<&mut EndpointRecord> {
        match self.endpoint_index.get(endpoint) {
            Some(&pos) => self.endpoints.get_mut(pos),
            None => None,
        }
    }

    /// Endpoint groups in first-seen order.
    pub fn endpoints(&self) -> &[EndpointRecord] {
        &self.endpoints
    }

    /// Records in first-seen order.
    pub fn games(&self) -> impl Iterator<Item = &GameRecord> {
        self.arrival
            .iter()
            .filter_map(|&(e, g)| self.endpoints[e].game_at(g))
    }

    pub fn len(&self) -> usize {
        self.arrival.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arrival.is_empty()
    }

    fn endpoint_position(&mut self, endpoint: &str) -> usize {
        if let Some(&pos) = self.endpoint_index.get(endpoint) {
            return pos;
        }
        let pos = self.endpoints.len();
        self.endpoints.push(EndpointRecord::new(endpoint));
        self.endpoint_index.insert(endpoint.to_string(), pos);
        pos
    }
}
