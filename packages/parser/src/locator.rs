//! Page location.
//!
//! A page holds the target table when every keyword group has one
//! alternative in its text and the date marker matches a year. Pages are
//! visited from the end of the document by default, since the notes to the
//! financial statements come last. Every page is checked so that repeated
//! titles (a table of contents, for instance) can be reported.

use std::collections::BTreeSet;

use plan_assets_allocation_models::PageMatch;
use plan_assets_allocation_models::source::PageTextSource;

use crate::ParseError;
use crate::config::{LocatorConfig, compile_year_pattern};

/// Characters of context kept on each side of a snippet.
const SNIPPET_CONTEXT: usize = 30;

/// Keyword and date hits on one page.
#[derive(Debug)]
struct PageHits {
    page_number: u32,
    matched_keywords: BTreeSet<String>,
    evidence: Vec<(usize, String)>,
}

/// Finds the page holding the plan asset table.
///
/// # Errors
///
/// Returns [`ParseError::NotFound`] if no page matches,
/// [`ParseError::Extraction`] if page text cannot be read, or
/// [`ParseError::InvalidConfig`] if the date pattern is invalid.
pub fn locate_page<S: PageTextSource + ?Sized>(
    source: &S,
    config: &LocatorConfig,
) -> Result<PageMatch, ParseError> {
    let date_re = compile_year_pattern("locator.date_pattern", &config.date_pattern)?;
    let page_count = source.page_count();

    let mut order: Vec<u32> = (1..=u32::try_from(page_count).unwrap_or(u32::MAX)).collect();
    if config.search_backward {
        order.reverse();
    }

    log::info!(
        "Searching {page_count} pages {} for the plan asset table",
        if config.search_backward { "backwards" } else { "forwards" }
    );

    let mut matches = Vec::new();
    for page_number in order {
        let text = source
            .page_text(page_number)
            .map_err(|source| ParseError::Extraction {
                page: page_number,
                source,
            })?;
        if let Some(hits) = match_page(page_number, &text, config, &date_re) {
            log::debug!(
                "Page {page_number} matches keywords {:?}",
                hits.matched_keywords
            );
            matches.push(hits);
        }
    }

    let candidate_pages: Vec<u32> = matches.iter().map(|m| m.page_number).collect();
    let Some(first) = matches.into_iter().next() else {
        return Err(ParseError::NotFound {
            pages_scanned: page_count,
        });
    };

    let mut warnings = Vec::new();
    if !is_contiguous(&candidate_pages) {
        let warning = format!(
            "AmbiguousMatch: pages {candidate_pages:?} all match the table keywords; using page {}",
            first.page_number
        );
        log::warn!("{warning}");
        warnings.push(warning);
    }

    log::info!("Found plan asset table on page {}", first.page_number);

    let mut evidence = first.evidence;
    evidence.sort_by_key(|(pos, _)| *pos);

    Ok(PageMatch {
        page_number: first.page_number,
        matched_keywords: first.matched_keywords,
        confidence_evidence: evidence.into_iter().map(|(_, s)| s).collect(),
        candidate_pages,
        warnings,
    })
}

/// Tests one page against the predicate.
fn match_page(
    page_number: u32,
    text: &str,
    config: &LocatorConfig,
    date_re: &regex::Regex,
) -> Option<PageHits> {
    let lower = text.to_lowercase();
    let mut matched_keywords = BTreeSet::new();
    let mut evidence = Vec::new();

    for group in &config.keyword_groups {
        let mut group_hit = false;
        for keyword in group {
            let keyword = keyword.to_lowercase();
            if let Some(pos) = lower.find(&keyword) {
                group_hit = true;
                evidence.push((pos, snippet(&lower, pos, keyword.len())));
                matched_keywords.insert(keyword);
            }
        }
        if !group_hit {
            return None;
        }
    }

    let date = date_re.find(text)?;
    evidence.push((date.start(), snippet(text, date.start(), date.len())));

    Some(PageHits {
        page_number,
        matched_keywords,
        evidence,
    })
}

/// Text around `text[start..start + len]`, on one line.
fn snippet(text: &str, start: usize, len: usize) -> String {
    let begin = text[..start]
        .char_indices()
        .rev()
        .nth(SNIPPET_CONTEXT - 1)
        .map_or(0, |(idx, _)| idx);
    let end = text[start + len..]
        .char_indices()
        .nth(SNIPPET_CONTEXT)
        .map_or(text.len(), |(idx, _)| start + len + idx);

    text[begin..end].split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whether the pages form one run of consecutive page numbers.
fn is_contiguous(pages: &[u32]) -> bool {
    let mut sorted = pages.to_vec();
    sorted.sort_unstable();
    sorted.windows(2).all(|w| w[1] - w[0] <= 1)
}

#[cfg(test)]
mod tests {
    use plan_assets_allocation_models::source::PageTexts;

    use super::*;

    const TABLE_PAGE: &str = "Note 26 Post-employment benefit plans (continued)\n\
        Composition and fair value of Swiss defined benefit plan assets\n\
        USD m 31.12.24 31.12.23\n";

    fn pages(texts: &[&str]) -> PageTexts {
        PageTexts(texts.iter().map(|t| (*t).to_owned()).collect())
    }

    #[test]
    fn finds_table_page_with_evidence() {
        let source = pages(&["Annual Report 2024", TABLE_PAGE, "Glossary"]);
        let found = locate_page(&source, &LocatorConfig::default()).unwrap();

        assert_eq!(found.page_number, 2);
        assert!(found.matched_keywords.contains("swiss"));
        assert!(found.matched_keywords.contains("composition and fair value"));
        assert!(found.warnings.is_empty());
        assert!(
            found
                .confidence_evidence
                .iter()
                .any(|s| s.contains("31.12.24"))
        );
    }

    #[test]
    fn requires_date_marker() {
        let without_date = TABLE_PAGE.replace("31.12.", "30.06.");
        let source = pages(&[&without_date]);
        let err = locate_page(&source, &LocatorConfig::default()).unwrap_err();
        assert!(matches!(err, ParseError::NotFound { pages_scanned: 1 }));
    }

    #[test]
    fn requires_swiss_table() {
        let uk = TABLE_PAGE.replace("Swiss", "UK");
        let err = locate_page(&pages(&[&uk]), &LocatorConfig::default()).unwrap_err();
        assert!(matches!(err, ParseError::NotFound { .. }));
    }

    #[test]
    fn backward_search_prefers_later_page_and_warns() {
        let source = pages(&[TABLE_PAGE, "Strategy", "Risk", TABLE_PAGE]);
        let found = locate_page(&source, &LocatorConfig::default()).unwrap();

        assert_eq!(found.page_number, 4);
        assert_eq!(found.candidate_pages, vec![4, 1]);
        assert_eq!(found.warnings.len(), 1);
        assert!(found.warnings[0].starts_with("AmbiguousMatch"));
    }

    #[test]
    fn adjacent_matches_are_not_ambiguous() {
        let source = pages(&["Intro", TABLE_PAGE, TABLE_PAGE]);
        let config = LocatorConfig {
            search_backward: false,
            ..LocatorConfig::default()
        };
        let found = locate_page(&source, &config).unwrap();
        assert_eq!(found.page_number, 2);
        assert!(found.warnings.is_empty());
    }

    #[test]
    fn snippet_stays_on_char_boundaries() {
        let text = "Zürich – composition and fair value of assets";
        let pos = text.find("composition").unwrap();
        let s = snippet(text, pos, "composition".len());
        assert!(s.contains("composition"));
    }
}
