//! Results table: header validation and per-kind row mapping.
//!
//! The table is filled in by page script, so the document handed in here
//! must be the rendered DOM. A rendered HTTP row looks like
//!
//! ```html
//! <tr>
//!   <td class="location whitespace-nowrap"><div class="z-1 node_info tooltip">
//!     <div class="overflow-hidden text-ellipsis">
//!       <img class="flag inline" src="/images/flags/cz.png" alt="cz">
//!       <span class="popover_action ...">Czechia, C.Budejovice</span>
//!     </div></div></td>
//!   <td class="result" id="result_cz1.node.check-host.net"><div>OK</div></td>
//!   <td class="time" id="result_time_cz1.node.check-host.net"><div>0.024 s</div></td>
//!   <td class="code" id="result_code_cz1.node.check-host.net"><div>301 (Moved Permanently)</div></td>
//!   <td class="ip" id="result_ip_cz1.node.check-host.net"><div>1.1.1.1</div></td>
//! </tr>
//! ```

use super::{element_text, selector};
use crate::error::{AppError, Result};
use crate::models::{
    CountryCode, DnsResult, HttpResult, PingResult, ReportType, ResultRow, TcpResult, UdpResult,
};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeSet;

static TABLE: Lazy<Selector> = Lazy::new(|| selector("table"));
static FLAG: Lazy<Selector> = Lazy::new(|| selector("img"));
static LOCATION_NAME: Lazy<Selector> = Lazy::new(|| selector("span"));

/// Direct element children named `tag`
fn children_named<'a>(element: ElementRef<'a>, tag: &'a str) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    element
        .children()
        .filter_map(ElementRef::wrap)
        .filter(move |child| child.value().name() == tag)
}

/// The page's results table with its header row and body rows
pub struct ResultsTable<'a> {
    table: ElementRef<'a>,
}

impl<'a> ResultsTable<'a> {
    /// Locate the results table in a rendered document
    pub fn locate(document: &'a Html) -> Result<Self> {
        document
            .select(&TABLE)
            .next()
            .map(|table| Self { table })
            .ok_or_else(|| AppError::missing_element("results table"))
    }

    /// Header cell texts, in order
    pub fn headers(&self) -> Result<Vec<String>> {
        let header_row = children_named(self.table, "thead")
            .flat_map(|thead| children_named(thead, "tr"))
            .next()
            .ok_or_else(|| AppError::missing_element("results table header row"))?;

        Ok(children_named(header_row, "th").map(element_text).collect())
    }

    /// Fail unless the header row is exactly the one expected for `report_type`
    pub fn validate_headers(&self, report_type: ReportType) -> Result<()> {
        let found = self.headers()?;
        let expected = report_type.expected_headers();

        if found.iter().map(String::as_str).eq(expected.iter().copied()) {
            Ok(())
        } else {
            Err(AppError::schema_violation(report_type.as_str(), expected, &found))
        }
    }

    /// Direct rows of the table body; rows of nested tables are not included
    pub fn rows(&self) -> Vec<RowCells<'a>> {
        children_named(self.table, "tbody")
            .flat_map(|tbody| children_named(tbody, "tr"))
            .enumerate()
            .map(|(index, tr)| RowCells::new(index, tr))
            .collect()
    }

    /// True once the body holds at least one row
    pub fn is_populated(&self) -> bool {
        !self.rows().is_empty()
    }

    /// Validate the header and map every body row for `report_type`
    pub fn extract(&self, report_type: ReportType) -> Result<Vec<ResultRow>> {
        self.validate_headers(report_type)?;
        self.rows()
            .iter()
            .map(|row| map_row(report_type, row))
            .collect()
    }
}

/// Cells of one body row
pub struct RowCells<'a> {
    index: usize,
    cells: Vec<ElementRef<'a>>,
}

fn has_class<'c>(class: &'c str) -> impl for<'e> Fn(&ElementRef<'e>) -> bool + 'c {
    move |cell| cell.value().classes().any(|c| c == class)
}

fn id_starts_with<'c>(prefix: &'c str) -> impl for<'e> Fn(&ElementRef<'e>) -> bool + 'c {
    move |cell| cell.value().id().is_some_and(|id| id.starts_with(prefix))
}

impl<'a> RowCells<'a> {
    fn new(index: usize, tr: ElementRef<'a>) -> Self {
        Self {
            index,
            cells: children_named(tr, "td").collect(),
        }
    }

    /// First cell satisfying `predicate`
    pub fn find_cell<P>(&self, predicate: P) -> Option<ElementRef<'a>>
    where
        P: Fn(&ElementRef<'a>) -> bool,
    {
        self.cells.iter().copied().find(|cell| predicate(cell))
    }

    fn missing(&self, what: &str) -> AppError {
        AppError::missing_element(format!("{} in results row {}", what, self.index + 1))
    }

    /// Cell tagged with `class`
    pub fn cell_by_class(&self, class: &str) -> Result<ElementRef<'a>> {
        self.find_cell(has_class(class))
            .ok_or_else(|| self.missing(&format!("'{}' cell", class)))
    }

    /// Cell whose id starts with `prefix`, falling back to the `class` cell
    pub fn cell_by_id_prefix(&self, prefix: &str, class: &str) -> Result<ElementRef<'a>> {
        self.find_cell(id_starts_with(prefix))
            .or_else(|| self.find_cell(has_class(class)))
            .ok_or_else(|| self.missing(&format!("'{}' cell (id {}…)", class, prefix)))
    }

    pub fn text_by_class(&self, class: &str) -> Result<String> {
        self.cell_by_class(class).map(element_text)
    }

    pub fn text_by_id_prefix(&self, prefix: &str, class: &str) -> Result<String> {
        self.cell_by_id_prefix(prefix, class).map(element_text)
    }

    /// Country code and "Country, City" from the location cell
    pub fn location(&self) -> Result<(CountryCode, String)> {
        let cell = self.cell_by_class("location")?;

        let alt = cell
            .select(&FLAG)
            .next()
            .and_then(|img| img.value().attr("alt"))
            .ok_or_else(|| self.missing("flag image"))?;
        let country_code = CountryCode::new(alt)?;

        let location = cell
            .select(&LOCATION_NAME)
            .next()
            .map(element_text)
            .ok_or_else(|| self.missing("location name"))?;

        Ok((country_code, location))
    }
}

/// Split a comma-separated answer list into a set
pub fn parse_answers(raw: &str) -> BTreeSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|answer| !answer.is_empty())
        .map(str::to_string)
        .collect()
}

/// Map one body row to the row shape of `report_type`
pub fn map_row(report_type: ReportType, row: &RowCells<'_>) -> Result<ResultRow> {
    let (country_code, location) = row.location()?;

    let mapped = match report_type {
        ReportType::Http => ResultRow::Http(HttpResult {
            country_code,
            location,
            result: row.text_by_class("result")?,
            elapsed: row.text_by_class("time")?,
            http_code: row.text_by_class("code")?,
            ip: row.text_by_class("ip")?,
        }),
        ReportType::Dns => ResultRow::Dns(DnsResult {
            country_code,
            location,
            answers: parse_answers(&row.text_by_class("result")?),
            ttl: row.text_by_class("ttl")?,
        }),
        ReportType::Ping => ResultRow::Ping(PingResult {
            country_code,
            location,
            result: row.text_by_class("result")?,
            rtt: row.text_by_class("rtt")?,
            ip: row.text_by_id_prefix("result_ip_", "ip")?,
        }),
        ReportType::Tcp => ResultRow::Tcp(TcpResult {
            country_code,
            location,
            result: row.text_by_class("result")?,
            elapsed: row.text_by_id_prefix("result_time_", "time")?,
            ip: row.text_by_class("ip")?,
        }),
        ReportType::Udp => ResultRow::Udp(UdpResult {
            country_code,
            location,
            result: row.text_by_class("result")?,
            ip: row.text_by_class("ip")?,
        }),
    };

    Ok(mapped)
}
