//! Team name resolution
//!
//! Resolves a free-text team token to a configured team: exact key match
//! first, then a scan over synonym lists in declaration order.

use crate::models::{SportsLookups, TeamDirectory, TeamInfo};
use std::sync::Arc;

/// Which team dictionary a lookup consults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TeamScope {
    /// Only the teams of the given league
    #[default]
    League,
    /// The flattened cross-league index
    Global,
}

/// Find a team in a dictionary.
///
/// The token is trimmed and lowercased. An exact key hit always beats a
/// synonym hit. Among synonym hits the earliest declared team wins.
pub fn find_team<'a>(raw_team: &str, teams: &'a TeamDirectory) -> Option<&'a Arc<TeamInfo>> {
    let needle = raw_team.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }

    if let Some(team) = teams.get(&needle) {
        return Some(team);
    }

    teams.iter().find(|team| team.has_synonym(&needle))
}

/// Resolve a team token within a league, or across all leagues.
///
/// An unknown league resolves nothing under `TeamScope::League`.
pub fn resolve_team<'a>(
    lookups: &'a SportsLookups,
    scope: TeamScope,
    league_key: &str,
    raw_team: &str,
) -> Option<&'a Arc<TeamInfo>> {
    match scope {
        TeamScope::League => lookups
            .league(league_key)
            .and_then(|league| find_team(raw_team, &league.teams)),
        TeamScope::Global => find_team(raw_team, lookups.team_index()),
    }
}
