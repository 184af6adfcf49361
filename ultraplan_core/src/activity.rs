//! External activity sources feeding the history.
//!
//! Every source produces plain [`HistoryEntry`] values; merging them into the
//! stored history is the caller's job (see [`crate::sync`]).

use crate::config::RunalyzeConfig;
use crate::{Error, HistoryEntry, Result};
use chrono::{DateTime, NaiveDate};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;

/// Something that can list logged activities
pub trait ActivitySource {
    /// Short name used in logs and reports
    fn name(&self) -> &str;

    fn fetch(&self) -> Result<Vec<HistoryEntry>>;
}

// ============================================================================
// CSV export
// ============================================================================

/// A training-log export on disk
#[derive(Clone, Debug)]
pub struct CsvFileSource {
    path: PathBuf,
}

impl CsvFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ActivitySource for CsvFileSource {
    fn name(&self) -> &str {
        "csv"
    }

    fn fetch(&self) -> Result<Vec<HistoryEntry>> {
        crate::import::import_csv_file(&self.path)
    }
}

// ============================================================================
// Runalyze
// ============================================================================

const ACTIVITY_QUERY: &str = "/activity?page=1&order%5Bid%5D=desc";

/// Ways the API token may be presented, tried in order
#[derive(Clone, Copy, Debug)]
enum AuthHeader {
    Bearer,
    Token,
    XAuthToken,
}

impl AuthHeader {
    const ALL: [AuthHeader; 3] = [AuthHeader::Bearer, AuthHeader::Token, AuthHeader::XAuthToken];

    fn header(self, token: &str) -> (&'static str, String) {
        match self {
            AuthHeader::Bearer => ("Authorization", format!("Bearer {}", token)),
            AuthHeader::Token => ("token", token.to_string()),
            AuthHeader::XAuthToken => ("X-Auth-Token", token.to_string()),
        }
    }
}

/// Runalyze personal API client
pub struct RunalyzeSource {
    client: Client,
    token: String,
    base_url: String,
    local_proxy: Option<String>,
    proxies: Vec<String>,
}

impl RunalyzeSource {
    pub fn new(token: impl Into<String>, config: &RunalyzeConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            token: token.into(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            local_proxy: config
                .local_proxy
                .as_deref()
                .map(|p| p.trim_end_matches('/').to_string()),
            proxies: config.proxies.clone(),
        })
    }

    /// Direct URL, then the local proxy, then every public proxy prefix
    fn endpoints(&self) -> Vec<String> {
        let direct = format!("{}{}", self.base_url, ACTIVITY_QUERY);

        let mut endpoints = vec![direct.clone()];
        if let Some(proxy) = &self.local_proxy {
            endpoints.push(format!("{}{}", proxy, ACTIVITY_QUERY));
        }
        for prefix in &self.proxies {
            let encoded: String = url::form_urlencoded::byte_serialize(direct.as_bytes()).collect();
            endpoints.push(format!("{}{}", prefix, encoded));
        }
        endpoints
    }

    fn get_json(&self, url: &str, auth: AuthHeader) -> Result<Value> {
        let (name, value) = auth.header(&self.token);
        let response = self
            .client
            .get(url)
            .header(name, value)
            .header("Accept", "application/json")
            .send()
            .map_err(|e| Error::Network(format!("{}: {}", url, e)))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(Error::Auth(format!(
                "Runalyze rejected the token ({}). Check the API token in your Runalyze settings.",
                status.as_u16()
            )));
        }
        if !status.is_success() {
            return Err(Error::Network(format!("{} returned {}", url, status)));
        }

        response
            .json()
            .map_err(|e| Error::Network(format!("{}: invalid JSON body: {}", url, e)))
    }

    /// First endpoint that answers wins; a rejected token stops the chain
    fn fetch_with_fallback(&self, auth: AuthHeader) -> Result<Value> {
        let endpoints = self.endpoints();
        let mut failures = Vec::new();

        for (i, url) in endpoints.iter().enumerate() {
            tracing::debug!("Trying endpoint {}/{} with {:?}", i + 1, endpoints.len(), auth);
            match self.get_json(url, auth) {
                Ok(value) => return Ok(value),
                Err(e) if e.is_auth() => return Err(e),
                Err(e) => {
                    tracing::warn!("Endpoint {}/{} failed: {}", i + 1, endpoints.len(), e);
                    failures.push(e.to_string());
                }
            }
        }

        Err(Error::Network(format!(
            "Runalyze is unreachable ({})",
            failures.join("; ")
        )))
    }
}

impl ActivitySource for RunalyzeSource {
    fn name(&self) -> &str {
        "runalyze"
    }

    fn fetch(&self) -> Result<Vec<HistoryEntry>> {
        let mut last_error = None;

        for auth in AuthHeader::ALL {
            match self.fetch_with_fallback(auth).and_then(parse_activities) {
                Ok(entries) => {
                    tracing::info!("Fetched {} activities from Runalyze", entries.len());
                    return Ok(entries);
                }
                Err(e) if e.is_auth() => return Err(e),
                Err(e) => {
                    tracing::warn!("Header variant {:?} failed: {}", auth, e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| Error::Network("no request was made".into())))
    }
}

// ============================================================================
// Response mapping
// ============================================================================

/// Numbers sometimes arrive as strings
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Numeric {
    Number(f64),
    Text(String),
}

impl Numeric {
    fn value(&self) -> Option<f64> {
        match self {
            Numeric::Number(n) => Some(*n),
            Numeric::Text(s) => s.trim().parse().ok(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Named {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RunalyzeActivity {
    #[serde(default)]
    date_time: Option<String>,
    /// Legacy unix timestamp
    #[serde(default)]
    time: Option<Numeric>,
    #[serde(default)]
    duration: Option<Numeric>,
    #[serde(default)]
    distance: Option<Numeric>,
    #[serde(default)]
    sport: Option<Named>,
    #[serde(default, rename = "type")]
    kind: Option<Named>,
}

impl RunalyzeActivity {
    /// UTC calendar date of the start time
    fn date(&self) -> Option<NaiveDate> {
        if let Some(text) = self.date_time.as_deref().filter(|t| !t.is_empty()) {
            return DateTime::parse_from_rfc3339(text)
                .ok()
                .map(|dt| dt.naive_utc().date());
        }
        let seconds = self.time.as_ref()?.value()?;
        DateTime::from_timestamp(seconds as i64, 0).map(|dt| dt.date_naive())
    }

    fn into_entry(self) -> Option<HistoryEntry> {
        let date = self.date()?;
        let seconds = self.duration.as_ref().and_then(Numeric::value).unwrap_or(0.0);
        let distance = self.distance.as_ref().and_then(Numeric::value).unwrap_or(0.0);

        let mut sport = self
            .sport
            .and_then(|s| s.name)
            .unwrap_or_else(|| "Unknown".to_string());
        if let Some(kind) = self.kind.and_then(|k| k.name).filter(|n| !n.is_empty()) {
            sport = format!("{} ({})", sport, kind);
        }

        Some(HistoryEntry {
            date,
            duration_min: (seconds / 60.0).round().max(0.0) as u32,
            distance_km: Some(distance),
            original_string: Some(format!("Runalyze: {}", sport)),
            sport,
        })
    }
}

/// Accept a bare array or a `{ "data": [...] }` envelope
fn parse_activities(body: Value) -> Result<Vec<HistoryEntry>> {
    let items = match body {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(items)) => items,
            _ => return Err(Error::Activity("unknown response format".into())),
        },
        _ => return Err(Error::Activity("unknown response format".into())),
    };

    if items.is_empty() {
        tracing::warn!("Runalyze returned an empty activity list");
    }

    Ok(items
        .into_iter()
        .filter_map(|item| {
            let entry = serde_json::from_value::<RunalyzeActivity>(item.clone())
                .ok()
                .and_then(RunalyzeActivity::into_entry);
            if entry.is_none() {
                tracing::warn!("Skipping unparseable activity: {}", item);
            }
            entry
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_iso_date;
    use mockito::Matcher;
    use serde_json::json;

    fn config_for(server: &mockito::Server) -> RunalyzeConfig {
        RunalyzeConfig {
            base_url: server.url(),
            timeout_secs: 5,
            ..RunalyzeConfig::default()
        }
    }

    #[test]
    fn test_maps_records() {
        let body = json!([
            {
                "id": 2,
                "date_time": "2025-12-15T00:30:00+01:00",
                "duration": "8100",
                "distance": 11.2,
                "sport": { "id": 1, "name": "Wandern" },
                "type": { "name": "Ruck" }
            },
            {
                "id": 1,
                "time": 1765584000,
                "duration": 3600,
                "distance": "7.5"
            }
        ]);

        let entries = parse_activities(body).unwrap();
        assert_eq!(entries.len(), 2);

        // 00:30 at +01:00 is still the previous day in UTC
        assert_eq!(entries[0].date, parse_iso_date("2025-12-14").unwrap());
        assert_eq!(entries[0].sport, "Wandern (Ruck)");
        assert_eq!(entries[0].duration_min, 135);
        assert_eq!(entries[0].original_string.as_deref(), Some("Runalyze: Wandern (Ruck)"));

        assert_eq!(entries[1].date, parse_iso_date("2025-12-13").unwrap());
        assert_eq!(entries[1].sport, "Unknown");
        assert_eq!(entries[1].distance_km, Some(7.5));
    }

    #[test]
    fn test_envelope_and_bad_records() {
        let body = json!({
            "data": [
                { "date_time": "not a date", "duration": 60 },
                { "duration": 60 },
                { "date_time": "2025-12-15T07:00:00Z", "duration": 2700, "sport": { "name": "Laufen" } }
            ]
        });
        let entries = parse_activities(body).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].duration_min, 45);
    }

    #[test]
    fn test_unknown_format() {
        assert!(matches!(
            parse_activities(json!({ "items": [] })),
            Err(Error::Activity(_))
        ));
        assert!(matches!(parse_activities(json!("ok")), Err(Error::Activity(_))));
    }

    #[test]
    fn test_fetch_direct_with_bearer() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/activity")
            .match_query(Matcher::Any)
            .match_header("authorization", "Bearer tok")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"date_time":"2025-12-14T08:00:00+01:00","duration":3600,"distance":5}]"#)
            .create();

        let source = RunalyzeSource::new("tok", &config_for(&server)).unwrap();
        let entries = source.fetch().unwrap();

        mock.assert();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].duration_min, 60);
    }

    #[test]
    fn test_unauthorized_aborts_chain() {
        crate::logging::init_test();
        let mut server = mockito::Server::new();
        let direct = server
            .mock("GET", "/activity")
            .match_query(Matcher::Any)
            .with_status(401)
            .expect(1)
            .create();
        let proxy = server
            .mock("GET", "/proxy")
            .match_query(Matcher::Any)
            .expect(0)
            .create();

        let mut config = config_for(&server);
        config.local_proxy = Some(format!("{}/proxy", server.url()));
        let source = RunalyzeSource::new("bad", &config).unwrap();

        let err = source.fetch().unwrap_err();
        assert!(err.is_auth());
        direct.assert();
        proxy.assert();
    }

    #[test]
    fn test_falls_through_to_local_proxy() {
        let mut server = mockito::Server::new();
        let _direct = server
            .mock("GET", "/activity")
            .match_query(Matcher::Any)
            .with_status(502)
            .create();
        let proxy = server
            .mock("GET", "/local/activity")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"data":[]}"#)
            .create();

        let mut config = config_for(&server);
        config.local_proxy = Some(format!("{}/local", server.url()));
        let source = RunalyzeSource::new("tok", &config).unwrap();

        assert!(source.fetch().unwrap().is_empty());
        proxy.assert();
    }

    #[test]
    fn test_proxy_prefix_gets_encoded_target() {
        let source = RunalyzeSource::new(
            "tok",
            &RunalyzeConfig {
                proxies: vec!["https://corsproxy.io/?".into()],
                ..RunalyzeConfig::default()
            },
        )
        .unwrap();

        let endpoints = source.endpoints();
        assert_eq!(endpoints.len(), 2);
        assert_eq!(
            endpoints[0],
            "https://runalyze.com/api/v1/activity?page=1&order%5Bid%5D=desc"
        );
        assert!(endpoints[1].starts_with("https://corsproxy.io/?https%3A%2F%2Frunalyze.com"));
    }

    #[test]
    fn test_unreachable_is_network_error() {
        let mut server = mockito::Server::new();
        let _down = server
            .mock("GET", "/activity")
            .match_query(Matcher::Any)
            .with_status(500)
            .create();

        let source = RunalyzeSource::new("tok", &config_for(&server)).unwrap();
        assert!(matches!(source.fetch(), Err(Error::Network(_))));
    }

    #[test]
    fn test_csv_source() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("log.csv");
        std::fs::write(&path, "14.12.2025;Wandern;2:15:00;9,8\n").unwrap();

        let source = CsvFileSource::new(&path);
        assert_eq!(source.name(), "csv");
        assert_eq!(source.fetch().unwrap().len(), 1);
    }
}
