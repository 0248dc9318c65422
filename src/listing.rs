//! Scraping of the current land-sales listing page

use crate::cell::Cell;
use crate::csv::write_table;
use crate::error::{LandtrackError, Result};
use crate::fetch::HttpSession;
use crate::html::{attribute, next_tag_block_ci, strip_tags, tag_blocks, to_lower};
use crate::snapshot::Snapshot;
use chrono::NaiveDate;
use reqwest::Url;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Columns of a saved listing, in order
pub const LISTING_COLUMNS: &[&str] = &[
    "No",
    "Location",
    "Site Area (Ha)",
    "Gross Plot Ratio",
    "Status",
    "Link",
    "Details",
];

/// Stem used for saved listing files
pub const LISTING_STEM: &str = "gls-sites";

/// One site row from the listing table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SiteRecord {
    pub no: String,
    pub location: String,
    pub site_area: String,
    pub gross_plot_ratio: String,
    pub status: String,
    pub link: Option<String>,
    /// Outcome of following the site's link, when attempted
    pub details: Option<String>,
}

impl SiteRecord {
    pub fn is_awarded(&self) -> bool {
        self.status.trim().eq_ignore_ascii_case("awarded")
    }

    fn values(&self) -> Vec<String> {
        vec![
            self.no.clone(),
            self.location.clone(),
            self.site_area.clone(),
            self.gross_plot_ratio.clone(),
            self.status.clone(),
            self.link.clone().unwrap_or_default(),
            self.details.clone().unwrap_or_default(),
        ]
    }
}

/// Positions of the interesting columns within a table's header row
#[derive(Debug, Default)]
struct ColumnMap {
    no: Option<usize>,
    location: Option<usize>,
    site_area: Option<usize>,
    gross_plot_ratio: Option<usize>,
    status: Option<usize>,
}

impl ColumnMap {
    fn from_headers(headers: &[String]) -> Self {
        let mut map = Self::default();
        for (i, header) in headers.iter().enumerate() {
            let h = header.to_lowercase();
            if h == "no" || h == "no." {
                map.no = Some(i);
            } else if h.contains("location") {
                map.location = Some(i);
            } else if h.contains("area") {
                map.site_area = Some(i);
            } else if h.contains("plot ratio") {
                map.gross_plot_ratio = Some(i);
            } else if h.contains("status") {
                map.status = Some(i);
            }
        }
        map
    }
}

/// Tables qualify when some header mentions "no" and another "location"
fn has_listing_headers(headers: &[String]) -> bool {
    let lower: Vec<String> = headers.iter().map(|h| h.to_lowercase()).collect();
    lower.iter().any(|h| h.contains("no")) && lower.iter().any(|h| h.contains("location"))
}

fn cell_text(cells: &[&str], position: Option<usize>) -> String {
    position
        .and_then(|p| cells.get(p))
        .map(|c| strip_tags(c))
        .unwrap_or_default()
}

/// Extract site rows from the first qualifying table that yields any
pub fn parse_sites(html: &str, page_url: &str) -> Result<Vec<SiteRecord>> {
    let base = Url::parse(page_url)
        .map_err(|e| LandtrackError::invalid_input(format!("Invalid page URL '{}': {}", page_url, e)))?;

    let tables = tag_blocks(html, "table");
    if tables.is_empty() {
        log::warn!("No tables found on the page");
        return Ok(Vec::new());
    }

    for table in tables {
        let rows = tag_blocks(table, "tr");
        let mut headers: Vec<String> = tag_blocks(table, "th").into_iter().map(strip_tags).collect();

        if headers.is_empty() {
            let Some(first) = rows.first() else { continue };
            headers = tag_blocks(first, "td").into_iter().map(strip_tags).collect();
        }
        log::debug!("Found table with headers: {:?}", headers);

        if !has_listing_headers(&headers) {
            continue;
        }

        let lc = to_lower(table);
        let body_rows = if lc.contains("<tbody") {
            tag_blocks(body_of(table, &lc), "tr")
        } else {
            Vec::new()
        };
        let data_rows: &[&str] = if !body_rows.is_empty() {
            &body_rows
        } else {
            // Without a body section the first row holds the headers
            rows.get(1..).unwrap_or(&[])
        };

        let columns = ColumnMap::from_headers(&headers);
        let mut sites = Vec::new();
        for row in data_rows {
            let cells = tag_blocks(row, "td");
            if cells.len() < 3 {
                continue;
            }

            let location = cell_text(&cells, columns.location);
            if location.is_empty() {
                continue;
            }

            let link = columns
                .location
                .and_then(|p| cells.get(p))
                .and_then(|cell| next_tag_block_ci(cell, "a", 0).map(|(s, e)| &cell[s..e]))
                .and_then(|anchor| attribute(anchor, "href"))
                .filter(|href| !href.trim().is_empty())
                .and_then(|href| resolve_link(&base, href.trim()));

            let site = SiteRecord {
                no: cell_text(&cells, columns.no),
                location,
                site_area: cell_text(&cells, columns.site_area),
                gross_plot_ratio: cell_text(&cells, columns.gross_plot_ratio),
                status: cell_text(&cells, columns.status),
                link,
                details: None,
            };
            log::debug!("Added site: {}, status: {}", site.location, site.status);
            sites.push(site);
        }

        if !sites.is_empty() {
            log::info!("Extracted {} sites from listing table", sites.len());
            return Ok(sites);
        }
    }

    log::warn!("No listing table with sites found on the page");
    Ok(Vec::new())
}

/// The `<tbody>` block of a table, or the whole table if it has none
fn body_of<'a>(table: &'a str, lc: &str) -> &'a str {
    match lc.find("<tbody") {
        Some(start) => {
            let end = lc[start..]
                .find("</tbody>")
                .map(|rel| start + rel + "</tbody>".len())
                .unwrap_or(table.len());
            &table[start..end]
        }
        None => table,
    }
}

/// Resolve an href against the origin of the page it came from
pub fn resolve_link(page: &Url, href: &str) -> Option<String> {
    if href.starts_with("http://") || href.starts_with("https://") {
        return Some(href.to_string());
    }
    let origin = page.join("/").ok()?;
    origin.join(href).ok().map(|u| u.to_string())
}

/// Fetch and parse the listing page
pub fn scrape_listing(session: &HttpSession, url: &str) -> Result<Vec<SiteRecord>> {
    let html = session.get_text(url)?;
    log::info!("Fetched listing page ({} bytes)", html.len());
    parse_sites(&html, url)
}

/// Visit the link of every awarded site, pausing between requests, and
/// record whether it could be fetched
pub fn follow_awarded(session: &HttpSession, sites: &mut [SiteRecord]) -> usize {
    let mut followed = 0;
    for site in sites.iter_mut().filter(|s| s.is_awarded()) {
        let Some(link) = site.link.clone() else { continue };
        log::info!("Fetching details for awarded site: {}", site.location);
        std::thread::sleep(session.follow_delay());

        site.details = Some(match session.get(&link) {
            Ok(_) => {
                followed += 1;
                "followed".to_string()
            }
            Err(e) => {
                log::error!("Error fetching details for {}: {}", site.location, e);
                format!("error: {}", e)
            }
        });
    }
    followed
}

/// Listing rows as a snapshot, so listings can be diffed like the register
pub fn to_snapshot(sites: &[SiteRecord], name: &str, retrieved: Option<NaiveDate>) -> Result<Snapshot> {
    let rows = sites
        .iter()
        .map(|site| {
            site.values()
                .into_iter()
                .map(|v| if v.is_empty() { Cell::Empty } else { Cell::Text(v) })
                .collect()
        })
        .collect();
    Snapshot::new(
        name,
        retrieved,
        LISTING_COLUMNS.iter().map(|c| c.to_string()).collect(),
        rows,
    )
}

/// Save a listing as `YYYYMMDD_gls-sites.csv` in `dir`
pub fn save_listing(sites: &[SiteRecord], dir: &Path, date: NaiveDate) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(format!("{}_{}.csv", date.format("%Y%m%d"), LISTING_STEM));
    let rows: Vec<Vec<String>> = sites.iter().map(SiteRecord::values).collect();
    write_table(&path, LISTING_COLUMNS, &rows)?;
    log::info!("Saved {} sites to {}", sites.len(), path.display());
    Ok(path)
}
