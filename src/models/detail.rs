use super::{is_live_status, ScoreLine, Team};

/// Richer per-match record, fetched lazily when a match is opened.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchDetail {
    pub id: String,
    pub home: Team,
    pub away: Team,
    pub status: String,
    pub score: ScoreLine,
    /// Kickoff as `YYYYMMDDHHMMSS`
    pub start_time: i64,
    pub venue: Option<Venue>,
    /// Incidents in timeline order
    pub incidents: Vec<Incident>,
    pub media: Vec<MediaRef>,
}

impl MatchDetail {
    pub fn is_live(&self) -> bool {
        is_live_status(Some(&self.status))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Venue {
    pub id: String,
    pub name: String,
    pub neutral: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Incident {
    pub minute: i32,
    pub kind: IncidentKind,
    pub player: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncidentKind {
    Goal,
    YellowCard,
    RedCard,
    Substitution,
    OwnGoal,
    Penalty,
    MissedPenalty,
    Var,
    Unknown,
}

impl IncidentKind {
    pub fn from_code(code: i32) -> Self {
        match code {
            1 | 2 => IncidentKind::Goal,
            3 => IncidentKind::YellowCard,
            4 => IncidentKind::RedCard,
            5 => IncidentKind::Substitution,
            6 => IncidentKind::OwnGoal,
            7 => IncidentKind::Penalty,
            8 => IncidentKind::MissedPenalty,
            9 => IncidentKind::Var,
            _ => IncidentKind::Unknown,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            IncidentKind::Goal => "Goal",
            IncidentKind::YellowCard => "Yellow Card",
            IncidentKind::RedCard => "Red Card",
            IncidentKind::Substitution => "Substitution",
            IncidentKind::OwnGoal => "Own Goal",
            IncidentKind::Penalty => "Penalty",
            IncidentKind::MissedPenalty => "Missed Penalty",
            IncidentKind::Var => "Var",
            IncidentKind::Unknown => "Unknown",
        }
    }
}

/// Pick the best available player name for an incident.
///
/// Preference: full display name, then "first last", then the short name.
pub fn player_display_name(
    full: Option<&str>,
    first: Option<&str>,
    last: Option<&str>,
    short: Option<&str>,
) -> String {
    fn present(s: Option<&str>) -> Option<&str> {
        s.filter(|v| !v.trim().is_empty())
    }
    if let Some(name) = present(full) {
        return name.to_string();
    }
    if let (Some(f), Some(l)) = (present(first), present(last)) {
        return format!("{} {}", f, l);
    }
    present(short)
        .map(str::to_string)
        .unwrap_or_else(|| "Unknown Player".to_string())
}

/// A watchable or viewable media item attached to a match.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaRef {
    /// Provider media type, e.g. "VIDEO" or "HIGHLIGHTS"
    pub kind: String,
    pub provider: Option<String>,
    pub url: Option<String>,
    pub thumbnail: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incident_kind_codes() {
        assert_eq!(IncidentKind::from_code(1), IncidentKind::Goal);
        assert_eq!(IncidentKind::from_code(2), IncidentKind::Goal);
        assert_eq!(IncidentKind::from_code(4), IncidentKind::RedCard);
        assert_eq!(IncidentKind::from_code(9).label(), "Var");
        assert_eq!(IncidentKind::from_code(42), IncidentKind::Unknown);
    }

    #[test]
    fn test_player_display_name_preference() {
        assert_eq!(
            player_display_name(Some("Bukayo Saka"), Some("B"), Some("Saka"), Some("Saka")),
            "Bukayo Saka"
        );
        assert_eq!(
            player_display_name(Some(""), Some("Cole"), Some("Palmer"), None),
            "Cole Palmer"
        );
        assert_eq!(player_display_name(None, Some("Cole"), None, Some("Palmer")), "Palmer");
        assert_eq!(player_display_name(None, None, None, None), "Unknown Player");
    }
}
