//! Plain-text presentation of coordinator state.
//!
//! One presenter task per sport follows the coordinator's watch channels and
//! prints a fresh listing on every transition.

use tokio::sync::watch;
use tracing::{debug, info};

use crate::live_scores::coordinator::{DetailState, LoadState, MatchDetailState, SnapshotState};
use crate::live_scores::filter::FilterOptions;
use crate::live_scores::ScoreCoordinator;
use crate::models::{DateKey, MatchDetail, Snapshot, Sport};

/// Receivers a presenter needs, taken from a running coordinator.
pub struct Presenter {
    sport: Sport,
    filter: FilterOptions,
    load: watch::Receiver<SnapshotState>,
    date: watch::Receiver<DateKey>,
    refreshing: watch::Receiver<bool>,
    detail: watch::Receiver<MatchDetailState>,
}

impl Presenter {
    pub fn attach(coordinator: &ScoreCoordinator, filter: FilterOptions) -> Self {
        Presenter {
            sport: coordinator.sport(),
            filter,
            load: coordinator.load_state(),
            date: coordinator.selected_date(),
            refreshing: coordinator.is_refreshing(),
            detail: coordinator.detail_state(),
        }
    }

    /// Print until the coordinator goes away.
    pub async fn run(mut self) {
        self.print_listing();

        loop {
            tokio::select! {
                changed = self.load.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    self.print_listing();
                }
                changed = self.refreshing.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let refreshing = *self.refreshing.borrow_and_update();
                    let shown = self.load.borrow().data().map(|s| s.match_count());
                    debug!("[{}] refreshing={} shown={:?}", self.sport, refreshing, shown);
                }
                changed = self.detail.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let state = self.detail.borrow_and_update().clone();
                    for line in render_detail_state(&state) {
                        println!("{}", line);
                    }
                }
            }
        }

        info!("[{}] Presenter stopped", self.sport);
    }

    fn print_listing(&mut self) {
        let state = self.load.borrow_and_update().clone();
        let date = self.date.borrow().clone();
        for line in render_load_state(self.sport, &date, &state, &self.filter) {
            println!("{}", line);
        }
    }
}

fn date_heading(sport: Sport, date: &DateKey) -> String {
    let day = date
        .to_date()
        .map(|d| d.format("%A %-d %B %Y").to_string())
        .unwrap_or_else(|| date.to_string());
    format!("══ {} · {} ══", sport.display_name().to_uppercase(), day)
}

pub fn render_load_state(
    sport: Sport,
    date: &DateKey,
    state: &SnapshotState,
    filter: &FilterOptions,
) -> Vec<String> {
    let mut lines = vec![date_heading(sport, date)];
    match state {
        LoadState::Loading => lines.push("Loading…".to_string()),
        LoadState::Error(message) => lines.push(format!("Error: {}", message)),
        LoadState::Success(snapshot) => lines.extend(render_snapshot(sport, snapshot, filter)),
    }
    lines
}

/// Filtered listing grouped by competition.
pub fn render_snapshot(sport: Sport, snapshot: &Snapshot, filter: &FilterOptions) -> Vec<String> {
    let visible = filter.apply(snapshot);
    if visible.groups.is_empty() {
        return vec![filter.empty_message(sport)];
    }

    let mut lines = Vec::new();
    for group in &visible.groups {
        match &group.country_name {
            Some(country) if !country.is_empty() => {
                lines.push(format!("{}: {}", country, group.short_name))
            }
            _ => lines.push(group.short_name.clone()),
        }
        for m in &group.matches {
            let badge = m.status_badge();
            let marker = if badge.live { "●" } else { " " };
            lines.push(format!(
                "  {} {:>7}  {} {} {}",
                marker,
                badge.text,
                m.home.name,
                m.display_score(),
                m.away.name
            ));
        }
    }
    lines
}

pub fn render_detail_state(state: &MatchDetailState) -> Vec<String> {
    match state {
        DetailState::Hidden => Vec::new(),
        DetailState::Loading => vec!["Loading match details…".to_string()],
        DetailState::Error(message) => vec![format!("Match details unavailable: {}", message)],
        DetailState::Success(detail) => render_detail(detail),
    }
}

fn render_detail(detail: &MatchDetail) -> Vec<String> {
    let status = if detail.is_live() {
        format!("{} (live)", detail.status)
    } else {
        detail.status.clone()
    };
    let mut lines = vec![format!(
        "── {} vs {} · {} ──",
        detail.home.name, detail.away.name, status
    )];
    if let Some(venue) = &detail.venue {
        let neutral = if venue.neutral { " (neutral)" } else { "" };
        lines.push(format!("Venue: {}{}", venue.name, neutral));
    }
    for incident in &detail.incidents {
        lines.push(format!(
            "  {:>3}'  {:<14} {}",
            incident.minute,
            incident.kind.label(),
            incident.player
        ));
    }
    if !detail.media.is_empty() {
        lines.push(format!("{} media item(s) available", detail.media.len()));
    }
    lines
}
