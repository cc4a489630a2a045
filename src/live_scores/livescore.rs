use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::provider::{FetchError, ScoreProvider};
use crate::models::detail::player_display_name;
use crate::models::{
    normalize_status, DateKey, Group, Incident, IncidentKind, Innings, Match, MatchDetail,
    MediaRef, ScoreLine, Snapshot, Sport, Team, Venue,
};

pub const DEFAULT_BASE_URL: &str = "https://prod-cdn-public-api.livescore.com";

/// Scores provider backed by the LiveScore public app API.
pub struct LiveScoreApi {
    http: Client,
    base_url: Url,
    timeout: Duration,
}

impl LiveScoreApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .with_context(|| format!("Invalid scores API URL: {}", base_url))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("Scores API URL cannot be used as a base: {}", base_url);
        }
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(LiveScoreApi {
            http,
            base_url,
            timeout,
        })
    }

    fn endpoint(&self, segments: &[&str], query: &[(&str, &str)]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        url
    }

    fn day_url(&self, sport: Sport, date: &DateKey) -> Url {
        self.endpoint(
            &["v1", "api", "app", "date", sport.slug(), date.as_str(), "0"],
            &[("MD", "1")],
        )
    }

    fn detail_url(&self, sport: Sport, match_id: &str) -> Url {
        self.endpoint(
            &["v1", "api", "app", "scoreboard", sport.slug(), match_id],
            &[("locale", "en")],
        )
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, FetchError> {
        debug!("Fetching {}", url);

        let resp = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        if !resp.status().is_success() {
            return Err(FetchError::Status {
                status: resp.status().as_u16(),
                url: url.to_string(),
            });
        }

        let body = resp.bytes().await.map_err(|e| self.transport_error(e))?;
        serde_json::from_slice(&body).map_err(|e| FetchError::Decode(e.to_string()))
    }

    fn transport_error(&self, e: reqwest::Error) -> FetchError {
        if e.is_timeout() {
            FetchError::Timeout(self.timeout)
        } else {
            FetchError::Network(e.to_string())
        }
    }
}

#[async_trait]
impl ScoreProvider for LiveScoreApi {
    fn name(&self) -> &str {
        "LiveScore"
    }

    async fn fetch_snapshot(&self, sport: Sport, date: &DateKey) -> Result<Snapshot, FetchError> {
        let raw: RawDay = self.get_json(self.day_url(sport, date)).await?;
        Ok(raw.into_snapshot())
    }

    async fn fetch_match_detail(
        &self,
        sport: Sport,
        match_id: &str,
    ) -> Result<MatchDetail, FetchError> {
        let raw: RawDetail = self.get_json(self.detail_url(sport, match_id)).await?;
        raw.into_detail()
    }
}

// ── Wire format ──────────────────────────────────────────────────────────────

/// Accepts `"2"`, `2` or `null`.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

#[derive(Debug, Deserialize)]
struct RawDay {
    #[serde(rename = "Stages", default)]
    stages: Vec<RawStage>,
}

#[derive(Debug, Deserialize)]
struct RawStage {
    #[serde(rename = "Sid", default, deserialize_with = "lenient_string")]
    id: Option<String>,
    #[serde(rename = "Snm", default)]
    short_name: Option<String>,
    #[serde(rename = "CompN", default)]
    full_name: Option<String>,
    #[serde(rename = "Cnm", default)]
    country_name: Option<String>,
    #[serde(rename = "badgeUrl", default)]
    badge: Option<String>,
    #[serde(rename = "Events", default)]
    events: Vec<RawEvent>,
}

#[derive(Debug, Deserialize)]
struct RawEvent {
    #[serde(rename = "Eid", default, deserialize_with = "lenient_string")]
    id: Option<String>,
    #[serde(rename = "T1", default)]
    home: Vec<RawTeam>,
    #[serde(rename = "T2", default)]
    away: Vec<RawTeam>,
    #[serde(rename = "Eps", default)]
    status: Option<String>,
    #[serde(rename = "Esid", default)]
    status_id: Option<i32>,
    #[serde(rename = "Esd", default)]
    start: i64,
    #[serde(flatten)]
    score: RawScore,
}

#[derive(Debug, Default, Deserialize)]
struct RawScore {
    #[serde(rename = "Tr1", default, deserialize_with = "lenient_string")]
    home: Option<String>,
    #[serde(rename = "Tr2", default, deserialize_with = "lenient_string")]
    away: Option<String>,
    #[serde(rename = "Trh1", default, deserialize_with = "lenient_string")]
    home_ht: Option<String>,
    #[serde(rename = "Trh2", default, deserialize_with = "lenient_string")]
    away_ht: Option<String>,
    #[serde(rename = "Tr1C1", default)]
    home_runs: Option<u32>,
    #[serde(rename = "Tr1CW1", default)]
    home_wickets: Option<u32>,
    #[serde(rename = "Tr1CO1", default)]
    home_overs: Option<f64>,
    #[serde(rename = "Tr2C1", default)]
    away_runs: Option<u32>,
    #[serde(rename = "Tr2CW1", default)]
    away_wickets: Option<u32>,
    #[serde(rename = "Tr2CO1", default)]
    away_overs: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawTeam {
    #[serde(rename = "ID", default, deserialize_with = "lenient_string")]
    id: Option<String>,
    #[serde(rename = "Nm", default)]
    name: Option<String>,
    #[serde(rename = "Abr", default)]
    abbreviation: Option<String>,
    #[serde(rename = "Img", default)]
    image: Option<String>,
    #[serde(rename = "Fc", alias = "firstColor", default)]
    primary_color: Option<String>,
    #[serde(rename = "Sc", alias = "secondColor", default)]
    secondary_color: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawDetail {
    #[serde(rename = "Eid", default, deserialize_with = "lenient_string")]
    id: Option<String>,
    #[serde(rename = "T1", default)]
    home: Vec<RawTeam>,
    #[serde(rename = "T2", default)]
    away: Vec<RawTeam>,
    #[serde(rename = "Eps", default)]
    status: Option<String>,
    #[serde(rename = "Esd", default)]
    start: i64,
    #[serde(flatten)]
    score: RawScore,
    #[serde(rename = "Venue", default)]
    venue: Option<RawVenue>,
    #[serde(rename = "Incs-s", default)]
    incidents: Option<BTreeMap<String, Vec<RawIncident>>>,
    #[serde(rename = "Media", default)]
    media: Option<BTreeMap<String, Option<Vec<RawMediaItem>>>>,
}

#[derive(Debug, Deserialize)]
struct RawVenue {
    #[serde(default, deserialize_with = "lenient_string")]
    id: Option<String>,
    #[serde(rename = "Vnm", default)]
    name: Option<String>,
    #[serde(rename = "Vneut", default)]
    neutral: i32,
}

#[derive(Debug, Deserialize)]
struct RawIncident {
    #[serde(rename = "Min", default)]
    minute: i32,
    #[serde(rename = "Nm", default)]
    code: i32,
    #[serde(rename = "Pn", default)]
    full_name: Option<String>,
    #[serde(rename = "Fn", default)]
    first_name: Option<String>,
    #[serde(rename = "Ln", default)]
    last_name: Option<String>,
    #[serde(rename = "Snm", default)]
    short_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawMediaItem {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    provider: Option<String>,
    #[serde(default)]
    streamhls: Option<String>,
    #[serde(default)]
    thumbnail: Option<String>,
}

// ── Ingestion ────────────────────────────────────────────────────────────────

impl RawDay {
    fn into_snapshot(self) -> Snapshot {
        let groups = self
            .stages
            .into_iter()
            .map(|stage| {
                let matches = stage
                    .events
                    .into_iter()
                    .filter_map(RawEvent::into_match)
                    .collect();
                Group {
                    id: stage.id.unwrap_or_default(),
                    short_name: stage.short_name.unwrap_or_default(),
                    full_name: stage.full_name,
                    country_name: stage.country_name,
                    badge_ref: stage.badge,
                    matches,
                }
            })
            .collect();

        Snapshot {
            fetched_at: Utc::now(),
            groups,
        }
    }
}

impl RawEvent {
    fn into_match(self) -> Option<Match> {
        let id = self.id?;
        let (Some(home), Some(away)) = (first_team(self.home), first_team(self.away)) else {
            debug!("Skipping event {} without both teams", id);
            return None;
        };
        if self.status.is_none() {
            debug!("Event {} has no status, treating as not started", id);
        }
        let halftime = match (&self.score.home_ht, &self.score.away_ht) {
            (Some(h), Some(a)) => Some((h.clone(), a.clone())),
            _ => None,
        };
        Some(Match {
            id,
            home,
            away,
            status: normalize_status(self.status),
            status_id: self.status_id,
            score: self.score.into_score_line(),
            start_time: self.start,
            halftime,
        })
    }
}

impl RawScore {
    fn into_score_line(self) -> ScoreLine {
        if self.home_runs.is_some() {
            ScoreLine::Cricket {
                home: Innings {
                    runs: self.home_runs.unwrap_or(0),
                    wickets: self.home_wickets.unwrap_or(0),
                    overs: self.home_overs.unwrap_or(0.0),
                },
                away: Innings {
                    runs: self.away_runs.unwrap_or(0),
                    wickets: self.away_wickets.unwrap_or(0),
                    overs: self.away_overs.unwrap_or(0.0),
                },
            }
        } else {
            ScoreLine::Points {
                home: self.home,
                away: self.away,
            }
        }
    }
}

impl RawTeam {
    fn into_team(self) -> Team {
        Team {
            id: self.id.unwrap_or_default(),
            name: self.name.unwrap_or_default(),
            abbreviation: self.abbreviation.unwrap_or_default(),
            primary_color: self.primary_color,
            secondary_color: self.secondary_color,
            crest_ref: self.image,
        }
    }
}

fn first_team(teams: Vec<RawTeam>) -> Option<Team> {
    teams.into_iter().next().map(RawTeam::into_team)
}

/// Flatten period-keyed maps ("1", "2", ..., "10") in numeric period order.
fn in_period_order<V>(periods: BTreeMap<String, V>) -> Vec<V> {
    let mut periods: Vec<(String, V)> = periods.into_iter().collect();
    periods.sort_by_key(|(key, _)| key.trim().parse::<u32>().unwrap_or(u32::MAX));
    periods.into_iter().map(|(_, value)| value).collect()
}

impl RawDetail {
    fn into_detail(self) -> Result<MatchDetail, FetchError> {
        let id = self
            .id
            .ok_or_else(|| FetchError::MissingData("match id".into()))?;
        let home = first_team(self.home)
            .ok_or_else(|| FetchError::MissingData(format!("home team for match {}", id)))?;
        let away = first_team(self.away)
            .ok_or_else(|| FetchError::MissingData(format!("away team for match {}", id)))?;

        let venue = self.venue.map(|v| Venue {
            id: v.id.unwrap_or_default(),
            name: v.name.unwrap_or_default(),
            neutral: v.neutral != 0,
        });

        let incidents = in_period_order(self.incidents.unwrap_or_default())
            .into_iter()
            .flatten()
            .map(|inc| Incident {
                minute: inc.minute,
                kind: IncidentKind::from_code(inc.code),
                player: player_display_name(
                    inc.full_name.as_deref(),
                    inc.first_name.as_deref(),
                    inc.last_name.as_deref(),
                    inc.short_name.as_deref(),
                ),
            })
            .collect();

        let media = self
            .media
            .unwrap_or_default()
            .into_values()
            .flatten()
            .flatten()
            .map(|item| MediaRef {
                kind: item.kind.unwrap_or_default(),
                provider: item.provider,
                url: item.streamhls,
                thumbnail: item.thumbnail,
            })
            .collect();

        Ok(MatchDetail {
            id,
            home,
            away,
            status: normalize_status(self.status),
            score: self.score.into_score_line(),
            start_time: self.start,
            venue,
            incidents,
            media,
        })
    }
}

#[cfg(test)]
fn parse_day(body: &str) -> Result<Snapshot, FetchError> {
    let raw: RawDay = serde_json::from_str(body).map_err(|e| FetchError::Decode(e.to_string()))?;
    Ok(raw.into_snapshot())
}

#[cfg(test)]
fn parse_detail(body: &str) -> Result<MatchDetail, FetchError> {
    let raw: RawDetail =
        serde_json::from_str(body).map_err(|e| FetchError::Decode(e.to_string()))?;
    raw.into_detail()
}
