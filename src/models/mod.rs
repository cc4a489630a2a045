use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::fmt;
use thiserror::Error;

pub mod detail;

pub use detail::{Incident, IncidentKind, MatchDetail, MediaRef, Venue};

/// Status token the provider uses for a match that has not kicked off.
pub const NOT_STARTED: &str = "NS";

/// Provider status id that always means the match is in play.
const LIVE_STATUS_ID: i32 = 33;

/// In-play tokens that carry no clock marker.
const IN_PLAY_TOKENS: [&str; 8] = ["LIVE", "HT", "1H", "2H", "ET", "BT", "P", "AP"];

// ── Dates ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateKeyError {
    #[error("date key must be 8 digits (YYYYMMDD), got {0:?}")]
    Format(String),
    #[error("date key {0:?} is not a calendar date")]
    InvalidDate(String),
}

/// Calendar date in the provider's `YYYYMMDD` form.
///
/// Equality is plain string equality, which is what the coordinator uses to
/// decide whether a fetched snapshot still belongs to the selected date.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DateKey(String);

impl DateKey {
    pub fn from_date(date: NaiveDate) -> Self {
        DateKey(date.format("%Y%m%d").to_string())
    }

    pub fn parse(raw: &str) -> Result<Self, DateKeyError> {
        let raw = raw.trim();
        if raw.len() != 8 || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return Err(DateKeyError::Format(raw.to_string()));
        }
        NaiveDate::parse_from_str(raw, "%Y%m%d")
            .map_err(|_| DateKeyError::InvalidDate(raw.to_string()))?;
        Ok(DateKey(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The calendar date this key names.
    pub fn to_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.0, "%Y%m%d").ok()
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for DateKey {
    type Err = DateKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DateKey::parse(s)
    }
}

// ── Sports ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Sport {
    Soccer,
    Basketball,
    Cricket,
    Hockey,
}

impl Sport {
    pub const ALL: [Sport; 4] = [
        Sport::Soccer,
        Sport::Basketball,
        Sport::Cricket,
        Sport::Hockey,
    ];

    /// Path segment the scores provider uses for this sport.
    pub fn slug(self) -> &'static str {
        match self {
            Sport::Soccer => "soccer",
            Sport::Basketball => "basketball",
            Sport::Cricket => "cricket",
            Sport::Hockey => "hockey",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Sport::Soccer => "Football",
            Sport::Basketball => "Basketball",
            Sport::Cricket => "Cricket",
            Sport::Hockey => "Hockey",
        }
    }
}

impl fmt::Display for Sport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

// ── Snapshot ─────────────────────────────────────────────────────────────────

/// All grouped matches for one date, as returned by a single fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub fetched_at: DateTime<Utc>,
    pub groups: Vec<Group>,
}

impl Snapshot {
    pub fn match_count(&self) -> usize {
        self.groups.iter().map(|g| g.matches.len()).sum()
    }
}

/// A competition or stage bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub id: String,
    pub short_name: String,
    pub full_name: Option<String>,
    pub country_name: Option<String>,
    /// Provider badge reference, not a URL
    pub badge_ref: Option<String>,
    pub matches: Vec<Match>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Team {
    pub id: String,
    pub name: String,
    pub abbreviation: String,
    pub primary_color: Option<String>,
    pub secondary_color: Option<String>,
    /// Provider crest reference, not a URL
    pub crest_ref: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Match {
    pub id: String,
    pub home: Team,
    pub away: Team,
    /// Provider status token ("NS", "FT", "HT", "45'", ...). Never absent:
    /// ingestion substitutes "NS".
    pub status: String,
    /// Numeric provider status id, when supplied
    pub status_id: Option<i32>,
    pub score: ScoreLine,
    /// Kickoff as `YYYYMMDDHHMMSS`
    pub start_time: i64,
    pub halftime: Option<(String, String)>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScoreLine {
    /// Goal/point based sports; the provider sends scores as strings
    Points {
        home: Option<String>,
        away: Option<String>,
    },
    Cricket { home: Innings, away: Innings },
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Innings {
    pub runs: u32,
    pub wickets: u32,
    pub overs: f64,
}

/// Text and colour class for a match's status indicator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusBadge {
    pub text: String,
    pub live: bool,
}

/// Substitute "NS" for a missing status. Applied once, at ingestion.
pub fn normalize_status(status: Option<String>) -> String {
    status.unwrap_or_else(|| NOT_STARTED.to_string())
}

/// Whether a provider status token means the match is in play.
pub fn is_live_status(status: Option<&str>) -> bool {
    let upper = match status.map(str::trim) {
        Some(s) if !s.is_empty() => s.to_uppercase(),
        _ => return false,
    };
    if IN_PLAY_TOKENS.contains(&upper.as_str()) {
        return true;
    }
    // Running clocks: "45'", "90+3'"
    upper.contains('\'')
}

impl Match {
    pub fn is_live(&self) -> bool {
        is_live_status(Some(&self.status))
    }

    pub fn is_not_started(&self) -> bool {
        self.status.eq_ignore_ascii_case(NOT_STARTED)
    }

    /// Score as shown on a match card.
    pub fn display_score(&self) -> String {
        match &self.score {
            ScoreLine::Cricket { home, away } => {
                match (format_innings(home), format_innings(away)) {
                    (Some(h), Some(a)) => format!("{} | {}", h, a),
                    (Some(h), None) => h,
                    (None, Some(a)) => a,
                    (None, None) => "vs".to_string(),
                }
            }
            ScoreLine::Points { home, away } => {
                let home = points_or_zero(home.as_deref());
                let away = points_or_zero(away.as_deref());
                if self.is_not_started() && home == "0" && away == "0" {
                    "vs".to_string()
                } else {
                    format!("{} - {}", home, away)
                }
            }
        }
    }

    /// Local kickoff time as `HH:MM`, or the raw timestamp if it does not parse.
    pub fn kickoff_time(&self) -> String {
        format_kickoff(self.start_time)
    }

    pub fn status_badge(&self) -> StatusBadge {
        let live = self.is_live();
        if self.status_id == Some(LIVE_STATUS_ID) {
            return StatusBadge {
                text: "LIVE".to_string(),
                live,
            };
        }
        let upper = self.status.to_uppercase();
        let text = match upper.as_str() {
            "NS" => self.kickoff_time(),
            "FT" | "AET" | "AP" | "HT" => upper,
            _ if self.status.contains('\'') => self.status.clone(),
            _ => format!("{}'", self.status),
        };
        StatusBadge { text, live }
    }
}

fn points_or_zero(raw: Option<&str>) -> &str {
    match raw.map(str::trim) {
        None | Some("") => "0",
        Some(s) if s.eq_ignore_ascii_case("null") => "0",
        Some(s) => s,
    }
}

fn format_innings(innings: &Innings) -> Option<String> {
    if innings.runs == 0 {
        return None;
    }
    Some(format!(
        "{}/{} ({})",
        innings.runs,
        innings.wickets,
        format_overs(innings.overs)
    ))
}

/// Overs are sent as `overs.balls` (12.3 = 12 overs and 3 balls).
pub fn format_overs(overs: f64) -> String {
    if overs <= 0.0 {
        return "0 ov".to_string();
    }
    let whole = overs.trunc();
    let balls = ((overs - whole) * 10.0).round() as u32;
    if balls > 0 {
        format!("{}.{} ov", whole as u32, balls)
    } else {
        format!("{} ov", whole as u32)
    }
}

pub fn format_kickoff(start_time: i64) -> String {
    let raw = start_time.to_string();
    match NaiveDateTime::parse_from_str(&raw, "%Y%m%d%H%M%S") {
        Ok(dt) => dt.format("%H:%M").to_string(),
        Err(_) => raw,
    }
}
