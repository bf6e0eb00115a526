//! Report data model: report kinds, per-location result rows and the two
//! terminal outcomes of a scrape (`Report` or `InvalidReport`).

use crate::error::{AppError, Result};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Kind of check a report was produced by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReportType {
    #[serde(rename = "check-http")]
    Http,
    #[serde(rename = "check-dns")]
    Dns,
    #[serde(rename = "check-ping")]
    Ping,
    #[serde(rename = "check-tcp")]
    Tcp,
    #[serde(rename = "check-udp")]
    Udp,
}

impl ReportType {
    pub const ALL: [ReportType; 5] = [
        ReportType::Http,
        ReportType::Dns,
        ReportType::Ping,
        ReportType::Tcp,
        ReportType::Udp,
    ];

    /// Wire tag used in JSON output
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportType::Http => "check-http",
            ReportType::Dns => "check-dns",
            ReportType::Ping => "check-ping",
            ReportType::Tcp => "check-tcp",
            ReportType::Udp => "check-udp",
        }
    }

    /// Label the site prints in front of the target in the page heading
    pub fn heading_label(&self) -> &'static str {
        match self {
            ReportType::Http => "Check website",
            ReportType::Dns => "DNS",
            ReportType::Ping => "Ping server",
            ReportType::Tcp => "TCP connect",
            ReportType::Udp => "UDP connect",
        }
    }

    /// Inverse of [`ReportType::heading_label`]. Case-sensitive, exact match.
    pub fn from_heading_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.heading_label() == label)
    }

    /// Column headers the results table must carry for this kind
    pub fn expected_headers(&self) -> &'static [&'static str] {
        match self {
            ReportType::Http => &["Location", "Result", "Time", "Code", "IP address"],
            ReportType::Ping => &["Location", "Result", "rtt min / avg / max", "IP address"],
            ReportType::Tcp => &["Location", "Result", "Time", "IP address"],
            ReportType::Udp => &["Location", "Result", "IP address"],
            ReportType::Dns => &["Location", "Result", "TTL"],
        }
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ReportType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| AppError::parse(format!("Unknown report type tag: {}", s)))
    }
}

/// Two-letter, upper-case ISO-3166 country code
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CountryCode(String);

impl CountryCode {
    /// Normalize a flag `alt` value (the site writes it lower-case)
    pub fn new(raw: &str) -> Result<Self> {
        let code = raw.trim().to_ascii_uppercase();
        if code.len() == 2 && code.chars().all(|c| c.is_ascii_alphabetic()) {
            Ok(Self(code))
        } else {
            Err(AppError::missing_element(format!(
                "country flag with a two-letter code (found alt=\"{}\")",
                raw
            )))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CountryCode {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(&value)
    }
}

impl From<CountryCode> for String {
    fn from(code: CountryCode) -> Self {
        code.0
    }
}

impl fmt::Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One row of a "check-http" report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpResult {
    pub country_code: CountryCode,
    pub location: String,
    pub result: String,
    #[serde(rename = "time")]
    pub elapsed: String,
    #[serde(rename = "code")]
    pub http_code: String,
    pub ip: String,
}

/// One row of a "check-dns" report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsResult {
    pub country_code: CountryCode,
    pub location: String,
    /// Resolved addresses; upstream ordering is not stable so this is a set
    #[serde(rename = "result")]
    pub answers: BTreeSet<String>,
    pub ttl: String,
}

/// One row of a "check-ping" report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PingResult {
    pub country_code: CountryCode,
    pub location: String,
    /// "<sent> / <received>"
    pub result: String,
    /// "<min> / <avg> / <max> ms"
    pub rtt: String,
    pub ip: String,
}

/// One row of a "check-tcp" report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TcpResult {
    pub country_code: CountryCode,
    pub location: String,
    pub result: String,
    #[serde(rename = "time")]
    pub elapsed: String,
    pub ip: String,
}

/// One row of a "check-udp" report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UdpResult {
    pub country_code: CountryCode,
    pub location: String,
    pub result: String,
    pub ip: String,
}

/// Per-location measurement. The variant always matches the owning
/// report's [`ReportType`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ResultRow {
    Http(HttpResult),
    Dns(DnsResult),
    Ping(PingResult),
    Tcp(TcpResult),
    Udp(UdpResult),
}

impl ResultRow {
    pub fn report_type(&self) -> ReportType {
        match self {
            ResultRow::Http(_) => ReportType::Http,
            ResultRow::Dns(_) => ReportType::Dns,
            ResultRow::Ping(_) => ReportType::Ping,
            ResultRow::Tcp(_) => ReportType::Tcp,
            ResultRow::Udp(_) => ReportType::Udp,
        }
    }

    pub fn country_code(&self) -> &CountryCode {
        match self {
            ResultRow::Http(r) => &r.country_code,
            ResultRow::Dns(r) => &r.country_code,
            ResultRow::Ping(r) => &r.country_code,
            ResultRow::Tcp(r) => &r.country_code,
            ResultRow::Udp(r) => &r.country_code,
        }
    }

    pub fn location(&self) -> &str {
        match self {
            ResultRow::Http(r) => &r.location,
            ResultRow::Dns(r) => &r.location,
            ResultRow::Ping(r) => &r.location,
            ResultRow::Tcp(r) => &r.location,
            ResultRow::Udp(r) => &r.location,
        }
    }

    /// Decode a JSON row whose shape is dictated by `report_type`
    pub fn from_json(report_type: ReportType, value: serde_json::Value) -> Result<Self> {
        let row = match report_type {
            ReportType::Http => ResultRow::Http(serde_json::from_value(value)?),
            ReportType::Dns => ResultRow::Dns(serde_json::from_value(value)?),
            ReportType::Ping => ResultRow::Ping(serde_json::from_value(value)?),
            ReportType::Tcp => ResultRow::Tcp(serde_json::from_value(value)?),
            ReportType::Udp => ResultRow::Udp(serde_json::from_value(value)?),
        };
        Ok(row)
    }
}

/// Complete structured result of one check-host.net check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawReport")]
pub struct Report {
    pub report_id: String,
    pub permalink: String,
    pub report_type: ReportType,
    pub target: String,
    /// "Checked on" time. Naive; the site prints it in UTC.
    #[serde(rename = "date", with = "checked_at_format")]
    pub checked_at: Option<NaiveDateTime>,
    pub results: Vec<ResultRow>,
}

impl Report {
    /// Build a report, enforcing that every row matches `report_type`
    pub fn new(
        report_id: String,
        permalink: String,
        report_type: ReportType,
        target: String,
        checked_at: Option<NaiveDateTime>,
        results: Vec<ResultRow>,
    ) -> Result<Self> {
        if let Some(row) = results.iter().find(|r| r.report_type() != report_type) {
            return Err(AppError::validation(format!(
                "{} row in a {} report",
                row.report_type(),
                report_type
            )));
        }

        Ok(Self {
            report_id,
            permalink,
            report_type,
            target,
            checked_at,
            results,
        })
    }
}

#[derive(Deserialize)]
struct RawReport {
    report_id: String,
    permalink: String,
    report_type: ReportType,
    target: String,
    #[serde(default, with = "checked_at_format")]
    date: Option<NaiveDateTime>,
    #[serde(default)]
    results: Vec<serde_json::Value>,
}

impl TryFrom<RawReport> for Report {
    type Error = AppError;

    fn try_from(raw: RawReport) -> Result<Self> {
        let results = raw
            .results
            .into_iter()
            .map(|value| ResultRow::from_json(raw.report_type, value))
            .collect::<Result<Vec<_>>>()?;

        Report::new(
            raw.report_id,
            raw.permalink,
            raw.report_type,
            raw.target,
            raw.date,
            results,
        )
    }
}

/// Produced instead of a [`Report`] when the site says the report is gone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvalidReport {
    pub report_id: String,
    pub reason: String,
}

/// Exactly one of the two terminal outputs of a scrape
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScrapeOutcome {
    Report(Report),
    Invalid(InvalidReport),
}

impl ScrapeOutcome {
    pub fn report_id(&self) -> &str {
        match self {
            ScrapeOutcome::Report(r) => &r.report_id,
            ScrapeOutcome::Invalid(r) => &r.report_id,
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, ScrapeOutcome::Report(_))
    }
}

/// ISO-8601 without offset, e.g. `2025-03-08T20:28:15`
pub mod checked_at_format {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

    pub fn serialize<S>(value: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(dt) => serializer.serialize_str(&dt.format(FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        raw.map(|s| NaiveDateTime::parse_from_str(&s, FORMAT).map_err(serde::de::Error::custom))
            .transpose()
    }
}
