//! Client-side narrowing of a fetched snapshot.
//!
//! Filtering never touches the cached snapshot: every call builds a new one,
//! so the presentation layer can re-run it on each keystroke against the same
//! coordinator state.

use crate::models::{Group, Match, Snapshot, Sport};

/// Search text plus the live-only toggle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOptions {
    pub query: String,
    pub live_only: bool,
}

impl FilterOptions {
    pub fn apply(&self, snapshot: &Snapshot) -> Snapshot {
        filter_snapshot(snapshot, &self.query, self.live_only)
    }

    pub fn empty_message(&self, sport: Sport) -> String {
        empty_result_message(sport, &self.query, self.live_only)
    }
}

/// Narrow `snapshot` to matches that satisfy the query and live filter.
///
/// Groups left with no matches are dropped. Group order and match order are
/// preserved.
pub fn filter_snapshot(snapshot: &Snapshot, query: &str, live_only: bool) -> Snapshot {
    let needle = query.trim().to_lowercase();

    let groups = snapshot
        .groups
        .iter()
        .filter_map(|group| {
            let matches: Vec<Match> = group
                .matches
                .iter()
                .filter(|m| needle.is_empty() || matches_query(group, m, &needle))
                .filter(|m| !live_only || m.is_live())
                .cloned()
                .collect();
            if matches.is_empty() {
                None
            } else {
                Some(Group {
                    matches,
                    ..group_header(group)
                })
            }
        })
        .collect();

    Snapshot {
        fetched_at: snapshot.fetched_at,
        groups,
    }
}

/// `needle` must already be lower-cased.
fn matches_query(group: &Group, m: &Match, needle: &str) -> bool {
    let hit = |field: &str| field.to_lowercase().contains(needle);
    hit(&m.home.name)
        || hit(&m.away.name)
        || hit(&group.short_name)
        || group.full_name.as_deref().is_some_and(hit)
}

fn group_header(group: &Group) -> Group {
    Group {
        id: group.id.clone(),
        short_name: group.short_name.clone(),
        full_name: group.full_name.clone(),
        country_name: group.country_name.clone(),
        badge_ref: group.badge_ref.clone(),
        matches: Vec::new(),
    }
}

/// Message shown when a filtered snapshot has no groups left.
pub fn empty_result_message(sport: Sport, query: &str, live_only: bool) -> String {
    let sport = sport.display_name().to_lowercase();
    let query = query.trim();
    match (live_only, query.is_empty()) {
        (true, false) => format!("No live {} matches found for \"{}\"", sport, query),
        (true, true) => format!("No live {} matches found for selected date", sport),
        (false, false) => format!("No {} matches found for \"{}\"", sport, query),
        (false, true) => format!("No {} matches found for selected date", sport),
    }
}
