//! Data models and structures for the report scraper

pub mod config;
pub mod report;

// Re-export main model types
pub use config::Config;
pub use report::{
    CountryCode, DnsResult, HttpResult, InvalidReport, PingResult, Report, ReportType, ResultRow,
    ScrapeOutcome, TcpResult, UdpResult,
};
