//! Report year detection.
//!
//! The report year labels output and decides which report wins when two
//! reports restate the same year. File names are checked first
//! (`annual_report_2024.pdf`), then an "Annual Report 2024" title on the
//! first pages.

use std::path::Path;
use std::sync::LazyLock;

use plan_assets_allocation_models::source::PageTextSource;
use regex::Regex;

/// Pages searched for a title when the file name has no year.
const TITLE_PAGES: u32 = 3;

/// Four-digit run in a file name.
static FILE_YEAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{4}").expect("valid regex"));

/// "Annual Report 2024" title.
static TITLE_YEAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)annual\s+report\s+(\d{4})").expect("valid regex"));

/// First four-digit run in the file name.
#[must_use]
pub fn report_year_from_path(path: &Path) -> Option<i32> {
    let name = path.file_name()?.to_str()?;
    FILE_YEAR_RE.find(name)?.as_str().parse().ok()
}

/// Year from an "Annual Report YYYY" title on the first pages.
#[must_use]
pub fn report_year_from_text<S: PageTextSource + ?Sized>(source: &S) -> Option<i32> {
    let last = u32::try_from(source.page_count()).unwrap_or(u32::MAX).min(TITLE_PAGES);

    (1..=last).find_map(|page| {
        let text = source.page_text(page).ok()?;
        TITLE_YEAR_RE.captures(&text)?.get(1)?.as_str().parse().ok()
    })
}

/// Report year from the file name, falling back to the title pages.
#[must_use]
pub fn detect_report_year<S: PageTextSource + ?Sized>(path: &Path, source: &S) -> Option<i32> {
    if let Some(year) = report_year_from_path(path) {
        log::info!("Report year {year} from file name {}", path.display());
        return Some(year);
    }
    let year = report_year_from_text(source);
    match year {
        Some(year) => log::info!("Report year {year} from report title"),
        None => log::warn!("No report year found for {}", path.display()),
    }
    year
}
