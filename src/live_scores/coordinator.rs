//! Per-sport score coordinator.
//!
//! Each coordinator is a single tokio task that owns all of its state:
//!
//! ```text
//!  UI commands ──mpsc──▶ ┌──────────────────┐ ──watch──▶ load / date / refreshing / detail
//!  poll ticks ─────────▶ │ CoordinatorTask  │
//!  fetch outcomes ─mpsc▶ └──────────────────┘ ──spawn──▶ ScoreProvider (fetch tasks)
//! ```
//!
//! Fetches run as detached tasks and report back through the outcome channel.
//! Every outcome carries the generation it was issued under; outcomes from an
//! older generation are dropped instead of cancelling the request. Snapshot
//! requests are also numbered, and a result older than the last one applied
//! is dropped.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::clock::{self, Clock};
use super::provider::{FetchError, ScoreProvider};
use crate::models::{DateKey, MatchDetail, Snapshot, Sport};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Status of the primary snapshot channel.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadState<T> {
    Loading,
    Success(T),
    Error(String),
}

impl<T> LoadState<T> {
    pub fn data(&self) -> Option<&T> {
        match self {
            LoadState::Success(data) => Some(data),
            _ => None,
        }
    }
}

/// Status of the match-detail view.
#[derive(Debug, Clone, PartialEq)]
pub enum DetailState<T> {
    Hidden,
    Loading,
    Success(T),
    Error(String),
}

pub type SnapshotState = LoadState<Arc<Snapshot>>;
pub type MatchDetailState = DetailState<Arc<MatchDetail>>;

#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Time between background refreshes while today is selected
    pub poll_interval: Duration,
    /// Upper bound on a single provider call
    pub request_timeout: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

#[derive(Debug)]
enum Command {
    SelectDate(DateKey),
    Refresh,
    SelectMatch(String),
    DismissMatchDetail,
    Shutdown,
}

enum FetchOutcome {
    Snapshot {
        generation: u64,
        seq: u64,
        date: DateKey,
        refresh: bool,
        result: Result<Snapshot, FetchError>,
    },
    Detail {
        generation: u64,
        match_id: String,
        result: Result<MatchDetail, FetchError>,
    },
}

/// Handle to a running coordinator.
///
/// State is exposed read-only through `watch` receivers; the only way to
/// change it is through the command methods. Dropping the handle tears the
/// coordinator down, including its poll timer.
pub struct ScoreCoordinator {
    sport: Sport,
    clock: Arc<dyn Clock>,
    commands: mpsc::UnboundedSender<Command>,
    load_state: watch::Receiver<SnapshotState>,
    selected_date: watch::Receiver<DateKey>,
    refreshing: watch::Receiver<bool>,
    detail_state: watch::Receiver<MatchDetailState>,
    task: Option<JoinHandle<()>>,
}

impl ScoreCoordinator {
    /// Start a coordinator for `sport`: selects today, fetches it and starts
    /// the poll loop.
    pub fn spawn(
        sport: Sport,
        provider: Arc<dyn ScoreProvider>,
        clock: Arc<dyn Clock>,
        config: CoordinatorConfig,
    ) -> Self {
        let today = clock::today(clock.as_ref());

        let (load_tx, load_rx) = watch::channel(LoadState::Loading);
        let (date_tx, date_rx) = watch::channel(today.clone());
        let (refreshing_tx, refreshing_rx) = watch::channel(false);
        let (detail_tx, detail_rx) = watch::channel(DetailState::Hidden);
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();

        info!(
            "[{}] Coordinator started (provider={}, date={}, poll={:?})",
            sport,
            provider.name(),
            today,
            config.poll_interval
        );

        let task = CoordinatorTask {
            sport,
            provider,
            clock: Arc::clone(&clock),
            config,
            selected_date: today,
            load_generation: 0,
            detail_generation: 0,
            snapshot_seq: 0,
            applied_seq: 0,
            refreshes_in_flight: 0,
            load_tx,
            date_tx,
            refreshing_tx,
            detail_tx,
            outcome_tx,
        };
        let handle = tokio::spawn(task.run(command_rx, outcome_rx));

        ScoreCoordinator {
            sport,
            clock,
            commands: command_tx,
            load_state: load_rx,
            selected_date: date_rx,
            refreshing: refreshing_rx,
            detail_state: detail_rx,
            task: Some(handle),
        }
    }

    pub fn sport(&self) -> Sport {
        self.sport
    }

    // ── Observable state ─────────────────────────────────────────────────────

    pub fn load_state(&self) -> watch::Receiver<SnapshotState> {
        self.load_state.clone()
    }

    pub fn selected_date(&self) -> watch::Receiver<DateKey> {
        self.selected_date.clone()
    }

    pub fn is_refreshing(&self) -> watch::Receiver<bool> {
        self.refreshing.clone()
    }

    pub fn detail_state(&self) -> watch::Receiver<MatchDetailState> {
        self.detail_state.clone()
    }

    // ── Commands ─────────────────────────────────────────────────────────────

    pub fn select_date(&self, date: DateKey) {
        self.send(Command::SelectDate(date));
    }

    pub fn refresh(&self) {
        self.send(Command::Refresh);
    }

    pub fn select_match(&self, match_id: impl Into<String>) {
        self.send(Command::SelectMatch(match_id.into()));
    }

    pub fn dismiss_match_detail(&self) {
        self.send(Command::DismissMatchDetail);
    }

    // ── Date helpers ─────────────────────────────────────────────────────────

    pub fn today(&self) -> DateKey {
        clock::today(self.clock.as_ref())
    }

    pub fn yesterday(&self) -> DateKey {
        clock::yesterday(self.clock.as_ref())
    }

    pub fn tomorrow(&self) -> DateKey {
        clock::tomorrow(self.clock.as_ref())
    }

    /// Stop the coordinator and wait for its task to finish.
    pub async fn shutdown(mut self) {
        self.send(Command::Shutdown);
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!("[{}] Coordinator task ended abnormally: {}", self.sport, e);
            }
        }
    }

    fn send(&self, command: Command) {
        if let Err(e) = self.commands.send(command) {
            warn!("[{}] Coordinator is gone, command dropped: {:?}", self.sport, e.0);
        }
    }
}

impl Drop for ScoreCoordinator {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// The coordinator's owned state, driven by a single task.
struct CoordinatorTask {
    sport: Sport,
    provider: Arc<dyn ScoreProvider>,
    clock: Arc<dyn Clock>,
    config: CoordinatorConfig,
    selected_date: DateKey,
    /// Bumped on every date selection
    load_generation: u64,
    /// Bumped on every match selection and dismissal
    detail_generation: u64,
    /// Number of the latest snapshot request issued
    snapshot_seq: u64,
    /// Number of the request whose result the load state currently reflects
    applied_seq: u64,
    refreshes_in_flight: usize,
    load_tx: watch::Sender<SnapshotState>,
    date_tx: watch::Sender<DateKey>,
    refreshing_tx: watch::Sender<bool>,
    detail_tx: watch::Sender<MatchDetailState>,
    outcome_tx: mpsc::UnboundedSender<FetchOutcome>,
}

impl CoordinatorTask {
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut outcomes: mpsc::UnboundedReceiver<FetchOutcome>,
    ) {
        self.fetch_snapshot(false);

        let period = self.config.poll_interval;
        let mut poll = time::interval_at(Instant::now() + period, period);
        poll.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                cmd = commands.recv() => match cmd {
                    Some(Command::Shutdown) | None => break,
                    Some(cmd) => self.handle_command(cmd),
                },
                Some(outcome) = outcomes.recv() => self.apply_outcome(outcome),
                _ = poll.tick() => self.on_poll_tick(),
            }
        }

        info!("[{}] Coordinator stopped", self.sport);
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::SelectDate(date) => self.select_date(date),
            Command::Refresh => self.refresh(),
            Command::SelectMatch(match_id) => self.select_match(match_id),
            Command::DismissMatchDetail => {
                self.detail_generation += 1;
                self.detail_tx.send_replace(DetailState::Hidden);
            }
            Command::Shutdown => {}
        }
    }

    fn select_date(&mut self, date: DateKey) {
        debug!("[{}] Selecting date {}", self.sport, date);
        self.selected_date = date.clone();
        self.load_generation += 1;
        self.date_tx.send_replace(date);
        self.load_tx.send_replace(LoadState::Loading);
        self.fetch_snapshot(false);
    }

    fn refresh(&mut self) {
        self.refreshes_in_flight += 1;
        self.set_refreshing(true);
        self.fetch_snapshot(true);
    }

    fn select_match(&mut self, match_id: String) {
        self.detail_generation += 1;
        self.detail_tx.send_replace(DetailState::Loading);

        let provider = Arc::clone(&self.provider);
        let outcomes = self.outcome_tx.clone();
        let generation = self.detail_generation;
        let sport = self.sport;
        let timeout = self.config.request_timeout;

        tokio::spawn(async move {
            let result = with_timeout(timeout, provider.fetch_match_detail(sport, &match_id)).await;
            let _ = outcomes.send(FetchOutcome::Detail {
                generation,
                match_id,
                result,
            });
        });
    }

    fn on_poll_tick(&mut self) {
        let today = clock::today(self.clock.as_ref());
        if self.selected_date == today {
            debug!("[{}] Poll tick: refreshing {}", self.sport, today);
            self.refresh();
        } else {
            debug!(
                "[{}] Poll tick skipped: viewing {} (today is {})",
                self.sport, self.selected_date, today
            );
        }
    }

    fn fetch_snapshot(&mut self, refresh: bool) {
        self.snapshot_seq += 1;
        let seq = self.snapshot_seq;
        let provider = Arc::clone(&self.provider);
        let outcomes = self.outcome_tx.clone();
        let generation = self.load_generation;
        let date = self.selected_date.clone();
        let sport = self.sport;
        let timeout = self.config.request_timeout;

        tokio::spawn(async move {
            let result = with_timeout(timeout, provider.fetch_snapshot(sport, &date)).await;
            let _ = outcomes.send(FetchOutcome::Snapshot {
                generation,
                seq,
                date,
                refresh,
                result,
            });
        });
    }

    fn apply_outcome(&mut self, outcome: FetchOutcome) {
        match outcome {
            FetchOutcome::Snapshot {
                generation,
                seq,
                date,
                refresh,
                result,
            } => self.apply_snapshot(generation, seq, date, refresh, result),
            FetchOutcome::Detail {
                generation,
                match_id,
                result,
            } => self.apply_detail(generation, match_id, result),
        }
    }

    fn apply_snapshot(
        &mut self,
        generation: u64,
        seq: u64,
        date: DateKey,
        refresh: bool,
        result: Result<Snapshot, FetchError>,
    ) {
        if refresh {
            self.refreshes_in_flight = self.refreshes_in_flight.saturating_sub(1);
            if self.refreshes_in_flight == 0 {
                self.set_refreshing(false);
            }
        }

        if generation != self.load_generation || date != self.selected_date {
            debug!(
                "[{}] Dropping superseded snapshot for {} (now viewing {})",
                self.sport, date, self.selected_date
            );
            return;
        }
        if seq < self.applied_seq {
            debug!(
                "[{}] Dropping out-of-order snapshot for {} (request {} < {})",
                self.sport, date, seq, self.applied_seq
            );
            return;
        }

        match result {
            Ok(snapshot) => {
                info!(
                    "[{}] Loaded {} matches in {} groups for {}",
                    self.sport,
                    snapshot.match_count(),
                    snapshot.groups.len(),
                    date
                );
                self.applied_seq = seq;
                self.load_tx.send_replace(LoadState::Success(Arc::new(snapshot)));
            }
            Err(e) if refresh => {
                // Keep whatever is on screen; a pending load settles Loading.
                let keep = matches!(
                    *self.load_tx.borrow(),
                    LoadState::Success(_) | LoadState::Loading
                );
                if keep {
                    warn!("[{}] Refresh for {} failed, keeping current data: {}", self.sport, date, e);
                } else {
                    warn!("[{}] Refresh for {} failed: {}", self.sport, date, e);
                    self.applied_seq = seq;
                    self.load_tx.send_replace(LoadState::Error(e.to_string()));
                }
            }
            Err(e) => {
                warn!("[{}] Loading {} failed: {}", self.sport, date, e);
                self.applied_seq = seq;
                self.load_tx.send_replace(LoadState::Error(e.to_string()));
            }
        }
    }

    fn apply_detail(
        &mut self,
        generation: u64,
        match_id: String,
        result: Result<MatchDetail, FetchError>,
    ) {
        let still_waiting = matches!(*self.detail_tx.borrow(), DetailState::Loading);
        if generation != self.detail_generation || !still_waiting {
            debug!("[{}] Dropping stale detail for match {}", self.sport, match_id);
            return;
        }

        let next = match result {
            Ok(detail) => DetailState::Success(Arc::new(detail)),
            Err(e) => {
                warn!("[{}] Match {} detail failed: {}", self.sport, match_id, e);
                DetailState::Error(e.to_string())
            }
        };
        self.detail_tx.send_replace(next);
    }

    fn set_refreshing(&self, value: bool) {
        self.refreshing_tx.send_if_modified(|current| {
            let changed = *current != value;
            *current = value;
            changed
        });
    }
}

async fn with_timeout<T>(
    timeout: Duration,
    fetch: impl std::future::Future<Output = Result<T, FetchError>>,
) -> Result<T, FetchError> {
    match time::timeout(timeout, fetch).await {
        Ok(result) => result,
        Err(_) => Err(FetchError::Timeout(timeout)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::live_scores::clock::testing::FixedClock;
    use crate::models::fixtures::{game, group, snapshot, team};
    use crate::models::ScoreLine;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use tokio::sync::oneshot;

    struct PendingSnapshot {
        date: DateKey,
        respond: oneshot::Sender<Result<Snapshot, FetchError>>,
    }

    struct PendingDetail {
        match_id: String,
        respond: oneshot::Sender<Result<MatchDetail, FetchError>>,
    }

    /// Provider whose calls block until the test answers them.
    struct ScriptedProvider {
        snapshots: mpsc::UnboundedSender<PendingSnapshot>,
        details: mpsc::UnboundedSender<PendingDetail>,
    }

    #[async_trait]
    impl ScoreProvider for ScriptedProvider {
        async fn fetch_snapshot(&self, _sport: Sport, date: &DateKey) -> Result<Snapshot, FetchError> {
            let (respond, rx) = oneshot::channel();
            let _ = self.snapshots.send(PendingSnapshot {
                date: date.clone(),
                respond,
            });
            rx.await
                .unwrap_or_else(|_| Err(FetchError::Network("harness dropped request".into())))
        }

        async fn fetch_match_detail(
            &self,
            _sport: Sport,
            match_id: &str,
        ) -> Result<MatchDetail, FetchError> {
            let (respond, rx) = oneshot::channel();
            let _ = self.details.send(PendingDetail {
                match_id: match_id.to_string(),
                respond,
            });
            rx.await
                .unwrap_or_else(|_| Err(FetchError::Network("harness dropped request".into())))
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    struct Harness {
        coordinator: ScoreCoordinator,
        clock: Arc<FixedClock>,
        snapshots: mpsc::UnboundedReceiver<PendingSnapshot>,
        details: mpsc::UnboundedReceiver<PendingDetail>,
    }

    impl Harness {
        fn start() -> Self {
            let (snap_tx, snapshots) = mpsc::unbounded_channel();
            let (detail_tx, details) = mpsc::unbounded_channel();
            let provider = Arc::new(ScriptedProvider {
                snapshots: snap_tx,
                details: detail_tx,
            });
            let clock = Arc::new(FixedClock::new(2026, 10, 18));
            let coordinator = ScoreCoordinator::spawn(
                Sport::Soccer,
                provider,
                clock.clone(),
                CoordinatorConfig::default(),
            );
            Harness {
                coordinator,
                clock,
                snapshots,
                details,
            }
        }

        async fn next_snapshot(&mut self) -> PendingSnapshot {
            self.snapshots.recv().await.expect("provider dropped")
        }

        async fn next_detail(&mut self) -> PendingDetail {
            self.details.recv().await.expect("provider dropped")
        }

        fn load(&self) -> SnapshotState {
            self.coordinator.load_state().borrow().clone()
        }

        fn detail(&self) -> MatchDetailState {
            self.coordinator.detail_state().borrow().clone()
        }

        fn refreshing(&self) -> bool {
            *self.coordinator.is_refreshing().borrow()
        }

        /// Answer the initial fetch for today with a one-match snapshot.
        async fn load_today(&mut self, match_id: &str) -> Arc<Snapshot> {
            let req = self.next_snapshot().await;
            assert_eq!(req.date, key("20261018"));
            let _ = req.respond.send(Ok(day(match_id)));
            settle().await;
            self.load().data().cloned().expect("today should be loaded")
        }
    }

    /// Let every runnable task finish. With the paused clock, a sleep only
    /// completes once the runtime is otherwise idle.
    async fn settle() {
        time::sleep(Duration::from_millis(1)).await;
    }

    fn key(raw: &str) -> DateKey {
        DateKey::parse(raw).unwrap()
    }

    fn day(match_id: &str) -> Snapshot {
        snapshot(vec![group(
            "g1",
            "Premier League",
            None,
            vec![game(match_id, "Arsenal", "Chelsea", "NS")],
        )])
    }

    fn detail(match_id: &str) -> MatchDetail {
        MatchDetail {
            id: match_id.to_string(),
            home: team("Arsenal"),
            away: team("Chelsea"),
            status: "FT".into(),
            score: ScoreLine::Points {
                home: Some("2".into()),
                away: Some("2".into()),
            },
            start_time: 20261018193000,
            venue: None,
            incidents: vec![],
            media: vec![],
        }
    }

    fn loaded_match_ids(state: &SnapshotState) -> Option<Vec<String>> {
        state.data().map(|s| {
            s.groups
                .iter()
                .flat_map(|g| g.matches.iter().map(|m| m.id.clone()))
                .collect()
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_initialize_selects_today_and_loads() {
        let mut h = Harness::start();
        assert!(h.load() == LoadState::Loading);
        assert_eq!(*h.coordinator.selected_date().borrow(), key("20261018"));
        assert!(h.detail() == DetailState::Hidden);
        assert!(!h.refreshing());

        h.load_today("m1").await;
        assert_eq!(loaded_match_ids(&h.load()), Some(vec!["m1".to_string()]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_failure_surfaces_error() {
        let mut h = Harness::start();
        let req = h.next_snapshot().await;
        let _ = req.respond.send(Err(FetchError::Network("connection refused".into())));
        settle().await;
        assert_eq!(h.load(), LoadState::Error("network error: connection refused".into()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_select_date_shows_loading_then_result() {
        let mut h = Harness::start();
        h.load_today("m1").await;

        h.coordinator.select_date(key("20261017"));
        let req = h.next_snapshot().await;
        assert_eq!(req.date, key("20261017"));
        assert!(h.load() == LoadState::Loading);
        assert_eq!(*h.coordinator.selected_date().borrow(), key("20261017"));

        let _ = req.respond.send(Ok(day("y1")));
        settle().await;
        assert_eq!(loaded_match_ids(&h.load()), Some(vec!["y1".to_string()]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_date_result_is_discarded() {
        let mut h = Harness::start();
        let a = h.next_snapshot().await;

        h.coordinator.select_date(key("20261019"));
        let b = h.next_snapshot().await;

        // A resolves after B was requested: ignored.
        let _ = a.respond.send(Ok(day("from-a")));
        settle().await;
        assert!(h.load() == LoadState::Loading);

        let _ = b.respond.send(Ok(day("from-b")));
        settle().await;
        assert_eq!(loaded_match_ids(&h.load()), Some(vec!["from-b".to_string()]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_result_after_newer_result_is_discarded() {
        let mut h = Harness::start();
        let a = h.next_snapshot().await;
        h.coordinator.select_date(key("20261019"));
        let b = h.next_snapshot().await;

        let _ = b.respond.send(Ok(day("from-b")));
        settle().await;
        let _ = a.respond.send(Err(FetchError::Network("late failure".into())));
        settle().await;

        assert_eq!(loaded_match_ids(&h.load()), Some(vec!["from-b".to_string()]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reselecting_a_date_ignores_the_earlier_request() {
        let mut h = Harness::start();
        h.load_today("m1").await;

        h.coordinator.select_date(key("20261017"));
        let first = h.next_snapshot().await;
        h.coordinator.select_date(key("20261016"));
        let _other = h.next_snapshot().await;
        h.coordinator.select_date(key("20261017"));
        let second = h.next_snapshot().await;

        let _ = first.respond.send(Ok(day("old")));
        settle().await;
        assert!(h.load() == LoadState::Loading);

        let _ = second.respond.send(Ok(day("new")));
        settle().await;
        assert_eq!(loaded_match_ids(&h.load()), Some(vec!["new".to_string()]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_replaces_snapshot_without_blanking() {
        let mut h = Harness::start();
        h.load_today("m1").await;

        h.coordinator.refresh();
        let req = h.next_snapshot().await;
        assert_eq!(req.date, key("20261018"));
        assert!(h.refreshing());
        assert_eq!(loaded_match_ids(&h.load()), Some(vec!["m1".to_string()]));

        let _ = req.respond.send(Ok(day("m2")));
        settle().await;
        assert!(!h.refreshing());
        assert_eq!(loaded_match_ids(&h.load()), Some(vec!["m2".to_string()]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_failure_keeps_last_good_data() {
        let mut h = Harness::start();
        let good = h.load_today("m1").await;

        h.coordinator.refresh();
        let req = h.next_snapshot().await;
        let _ = req.respond.send(Err(FetchError::Status {
            status: 503,
            url: "http://scores.test".into(),
        }));
        settle().await;

        assert!(!h.refreshing());
        let state = h.load();
        let kept = state.data().expect("still success");
        assert!(Arc::ptr_eq(kept, &good));
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_failure_without_prior_data_is_error() {
        let mut h = Harness::start();
        let initial = h.next_snapshot().await;
        let _ = initial.respond.send(Err(FetchError::Decode("bad json".into())));
        settle().await;

        h.coordinator.refresh();
        let req = h.next_snapshot().await;
        let _ = req.respond.send(Err(FetchError::Network("offline".into())));
        settle().await;

        assert_eq!(h.load(), LoadState::Error("network error: offline".into()));
        assert!(!h.refreshing());
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_refresh_still_clears_flag() {
        let mut h = Harness::start();
        h.load_today("m1").await;

        h.coordinator.refresh();
        let refresh = h.next_snapshot().await;
        h.coordinator.select_date(key("20261017"));
        let load = h.next_snapshot().await;

        let _ = refresh.respond.send(Ok(day("stale")));
        settle().await;
        assert!(!h.refreshing());
        assert!(h.load() == LoadState::Loading);

        let _ = load.respond.send(Ok(day("y1")));
        settle().await;
        assert_eq!(loaded_match_ids(&h.load()), Some(vec!["y1".to_string()]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_older_refresh_cannot_roll_back_newer_one() {
        let mut h = Harness::start();
        h.load_today("m1").await;

        h.coordinator.refresh();
        let first = h.next_snapshot().await;
        h.coordinator.refresh();
        let second = h.next_snapshot().await;

        let _ = second.respond.send(Ok(day("newer")));
        settle().await;
        assert_eq!(loaded_match_ids(&h.load()), Some(vec!["newer".to_string()]));
        assert!(h.refreshing());

        let _ = first.respond.send(Ok(day("older")));
        settle().await;
        assert_eq!(loaded_match_ids(&h.load()), Some(vec!["newer".to_string()]));
        assert!(!h.refreshing());
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_result_outranks_slower_date_load() {
        let mut h = Harness::start();
        h.load_today("m1").await;

        h.coordinator.select_date(key("20261018"));
        let load = h.next_snapshot().await;
        h.coordinator.refresh();
        let refresh = h.next_snapshot().await;

        let _ = refresh.respond.send(Ok(day("fresh")));
        settle().await;
        assert_eq!(loaded_match_ids(&h.load()), Some(vec!["fresh".to_string()]));

        let _ = load.respond.send(Err(FetchError::Network("slow fail".into())));
        settle().await;
        assert_eq!(loaded_match_ids(&h.load()), Some(vec!["fresh".to_string()]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_failure_while_loading_stays_loading() {
        let mut h = Harness::start();
        let initial = h.next_snapshot().await;

        h.coordinator.refresh();
        let refresh = h.next_snapshot().await;
        let _ = refresh.respond.send(Err(FetchError::Network("offline".into())));
        settle().await;
        assert_eq!(h.load(), LoadState::Loading);
        assert!(!h.refreshing());

        let _ = initial.respond.send(Ok(day("m1")));
        settle().await;
        assert_eq!(loaded_match_ids(&h.load()), Some(vec!["m1".to_string()]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_refreshing_flag_waits_for_last_refresh() {
        let mut h = Harness::start();
        h.load_today("m1").await;

        h.coordinator.refresh();
        let first = h.next_snapshot().await;
        h.coordinator.refresh();
        let second = h.next_snapshot().await;
        assert!(h.refreshing());

        let _ = first.respond.send(Ok(day("m2")));
        settle().await;
        assert!(h.refreshing());

        let _ = second.respond.send(Err(FetchError::Network("offline".into())));
        settle().await;
        assert!(!h.refreshing());
        assert_eq!(loaded_match_ids(&h.load()), Some(vec!["m2".to_string()]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_a_fetch_failure() {
        let mut h = Harness::start();
        let _never_answered = h.next_snapshot().await;
        time::sleep(DEFAULT_REQUEST_TIMEOUT + Duration::from_secs(1)).await;
        assert_eq!(h.load(), LoadState::Error("request timed out after 10s".into()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_skipped_when_not_viewing_today() {
        let mut h = Harness::start();
        h.load_today("m1").await;
        h.coordinator.select_date(key("20261017"));
        let req = h.next_snapshot().await;
        let _ = req.respond.send(Ok(day("y1")));
        settle().await;

        time::sleep(DEFAULT_POLL_INTERVAL).await;
        settle().await;

        assert!(h.snapshots.try_recv().is_err());
        assert!(!h.refreshing());
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_refreshes_once_when_viewing_today() {
        let mut h = Harness::start();
        h.load_today("m1").await;

        time::sleep(DEFAULT_POLL_INTERVAL).await;
        settle().await;

        let req = h.snapshots.try_recv().expect("poll should refresh");
        assert_eq!(req.date, key("20261018"));
        assert!(h.snapshots.try_recv().is_err());
        assert!(h.refreshing());
        // still showing the old data while the refresh runs
        assert_eq!(loaded_match_ids(&h.load()), Some(vec!["m1".to_string()]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_stops_after_midnight_rollover() {
        let mut h = Harness::start();
        h.load_today("m1").await;
        h.clock.set(NaiveDate::from_ymd_opt(2026, 10, 19).unwrap());

        time::sleep(DEFAULT_POLL_INTERVAL).await;
        settle().await;

        assert!(h.snapshots.try_recv().is_err());
        assert_eq!(h.coordinator.today(), key("20261019"));
        assert_eq!(h.coordinator.yesterday(), key("20261018"));
        assert_eq!(h.coordinator.tomorrow(), key("20261020"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_select_match_success_and_error() {
        let mut h = Harness::start();
        h.load_today("m1").await;

        h.coordinator.select_match("m1");
        let req = h.next_detail().await;
        assert_eq!(req.match_id, "m1");
        assert_eq!(h.detail(), DetailState::Loading);
        let _ = req.respond.send(Ok(detail("m1")));
        settle().await;
        assert_eq!(h.detail(), DetailState::Success(Arc::new(detail("m1"))));

        h.coordinator.select_match("m2");
        let req = h.next_detail().await;
        let _ = req.respond.send(Err(FetchError::MissingData("no teams".into())));
        settle().await;
        assert_eq!(
            h.detail(),
            DetailState::Error("response is missing data: no teams".into())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_dismiss_discards_pending_detail() {
        let mut h = Harness::start();
        h.load_today("m1").await;

        h.coordinator.select_match("m1");
        let req = h.next_detail().await;
        h.coordinator.dismiss_match_detail();
        settle().await;
        assert!(h.detail() == DetailState::Hidden);

        let _ = req.respond.send(Ok(detail("m1")));
        settle().await;
        assert!(h.detail() == DetailState::Hidden);
    }

    #[tokio::test(start_paused = true)]
    async fn test_newer_match_selection_wins() {
        let mut h = Harness::start();
        h.load_today("m1").await;

        h.coordinator.select_match("m1");
        let first = h.next_detail().await;
        h.coordinator.select_match("m2");
        let second = h.next_detail().await;

        let _ = first.respond.send(Ok(detail("m1")));
        settle().await;
        assert_eq!(h.detail(), DetailState::Loading);

        let _ = second.respond.send(Ok(detail("m2")));
        settle().await;
        assert_eq!(h.detail(), DetailState::Success(Arc::new(detail("m2"))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_polling() {
        let mut h = Harness::start();
        h.load_today("m1").await;

        let Harness {
            coordinator,
            mut snapshots,
            ..
        } = h;
        coordinator.shutdown().await;

        time::sleep(DEFAULT_POLL_INTERVAL * 2).await;
        assert!(snapshots.try_recv().is_err());
    }
}
