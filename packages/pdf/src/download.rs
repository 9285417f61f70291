//! Annual report download.
//!
//! Reports are published under predictable URLs that differ only by year,
//! so downloads are driven by a URL template with a `{year}` placeholder.
//! Transient failures (timeouts, connection resets, HTTP 429 and 5xx) are
//! retried with exponential backoff; other client errors are permanent.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::PdfError;

/// Retries after the first attempt. Backoff is 2s, 4s, 8s.
const MAX_RETRIES: u32 = 3;

/// A report written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedReport {
    /// Report year the URL was expanded with.
    pub year: i32,
    /// URL the report was fetched from.
    pub url: String,
    /// Where the PDF was saved.
    pub path: PathBuf,
}

/// Expands a URL template by replacing `{year}` with each year.
///
/// # Example
///
/// ```
/// use plan_assets_pdf::download::expand_year_template;
///
/// let urls = expand_year_template("https://example.com/ar{year}.pdf", &[2023, 2024]);
///
/// assert_eq!(urls, vec![
///     (2023, "https://example.com/ar2023.pdf".to_owned()),
///     (2024, "https://example.com/ar2024.pdf".to_owned()),
/// ]);
/// ```
#[must_use]
pub fn expand_year_template(template: &str, years: &[i32]) -> Vec<(i32, String)> {
    years
        .iter()
        .map(|&year| (year, template.replace("{year}", &year.to_string())))
        .collect()
}

/// File name a downloaded report is stored under.
#[must_use]
pub fn report_file_name(year: i32) -> String {
    format!("annual_report_{year}.pdf")
}

/// Downloads one URL, retrying transient failures.
///
/// # Errors
///
/// Returns [`PdfError::Http`] if the request keeps failing, or
/// [`PdfError::Status`] if the server answers with a non-success status.
pub async fn download_report(client: &reqwest::Client, url: &str) -> Result<Vec<u8>, PdfError> {
    let mut attempt = 0;

    loop {
        if attempt > 0 {
            let delay = Duration::from_secs(1u64 << attempt);
            log::warn!("  retry {attempt}/{MAX_RETRIES} in {delay:?}...");
            tokio::time::sleep(delay).await;
        }

        match client.get(url).send().await {
            Err(e) => {
                if is_transient(&e) && attempt < MAX_RETRIES {
                    log::warn!("  transient error: {e}");
                    attempt += 1;
                    continue;
                }
                return Err(PdfError::Http(e));
            }
            Ok(response) => {
                let status = response.status();

                if status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                    if attempt < MAX_RETRIES {
                        log::warn!("  HTTP {status} from {url}");
                        attempt += 1;
                        continue;
                    }
                    return Err(PdfError::Status {
                        status,
                        url: url.to_owned(),
                    });
                }

                if !status.is_success() {
                    return Err(PdfError::Status {
                        status,
                        url: url.to_owned(),
                    });
                }

                let bytes = response.bytes().await?;
                log::debug!("Downloaded {} bytes from {url}", bytes.len());
                return Ok(bytes.to_vec());
            }
        }
    }
}

/// Downloads the report for each year into `dir`.
///
/// Years are fetched in order. The first failure aborts the run; reports
/// already written stay on disk.
///
/// # Errors
///
/// Returns [`PdfError`] if the directory cannot be created, a download
/// fails, or a file cannot be written.
pub async fn download_reports(
    template: &str,
    years: &[i32],
    dir: &Path,
) -> Result<Vec<DownloadedReport>, PdfError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|source| PdfError::Io {
            path: dir.display().to_string(),
            source,
        })?;

    let client = reqwest::Client::builder()
        .user_agent(concat!("plan_assets/", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(120))
        .build()?;

    let mut reports = Vec::new();

    for (year, url) in expand_year_template(template, years) {
        log::info!("Downloading {year} report from {url}");
        let bytes = download_report(&client, &url).await?;

        let path = dir.join(report_file_name(year));
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|source| PdfError::Io {
                path: path.display().to_string(),
                source,
            })?;

        log::info!("Saved {} ({} bytes)", path.display(), bytes.len());
        reports.push(DownloadedReport { year, url, path });
    }

    Ok(reports)
}

fn is_transient(e: &reqwest::Error) -> bool {
    e.is_timeout() || e.is_connect() || e.is_body() || e.is_request()
}
