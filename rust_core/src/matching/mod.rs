//! Identity resolution
//!
//! Maps raw tokens from playlist metadata to configured leagues and teams.
//! Every lookup is case-insensitive and trims the input. A miss is `None`,
//! never an error.

use crate::models::SportsLookups;

pub mod team;

pub use team::{find_team, resolve_team, TeamScope};

/// Resolve a league hint by exact lookup. There is no fallback scan.
pub fn resolve_league<'a>(lookups: &'a SportsLookups, raw_hint: &str) -> Option<&'a str> {
    lookups.hint(&raw_hint.trim().to_lowercase())
}

/// Infer a league from a pair of team tokens via the cross-league index.
/// The first token that resolves decides.
pub fn infer_league<'a>(lookups: &'a SportsLookups, raw1: &str, raw2: &str) -> Option<&'a str> {
    find_team(raw1, lookups.team_index())
        .or_else(|| find_team(raw2, lookups.team_index()))
        .map(|team| team.league.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::league_config::build_sports_lookups;
    use serde_json::json;

    fn lookups() -> SportsLookups {
        build_sports_lookups(&json!({
            "NFL": {
                "service_prefix": "NFL",
                "hints": ["NFL", "FOOTBALL"],
                "game_duration": {"hours": 4, "minutes": 0},
                "teams": {"Pittsburgh Steelers": ["Steelers"]}
            },
            "NHL": {
                "service_prefix": "NHL",
                "hints": ["NHL", "Hockey"],
                "game_duration": {"hours": 3, "minutes": 0},
                "teams": {"Pittsburgh Penguins": ["Penguins", "Pens"]}
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_resolve_league_hint() {
        let lookups = lookups();
        assert_eq!(resolve_league(&lookups, "football"), Some("NFL"));
        assert_eq!(resolve_league(&lookups, " HOCKEY "), Some("NHL"));
    }

    #[test]
    fn test_resolve_league_is_exact_only() {
        let lookups = lookups();
        assert_eq!(resolve_league(&lookups, "NFL Sunday"), None);
        assert_eq!(resolve_league(&lookups, "foot"), None);
        assert_eq!(resolve_league(&lookups, ""), None);
    }

    #[test]
    fn test_infer_league_from_teams() {
        let lookups = lookups();
        assert_eq!(infer_league(&lookups, "Pens", "Flyers"), Some("NHL"));
        assert_eq!(infer_league(&lookups, "Browns", "steelers"), Some("NFL"));
        assert_eq!(infer_league(&lookups, "Browns", "Flyers"), None);
    }
}
