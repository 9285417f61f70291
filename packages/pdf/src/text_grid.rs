//! Rebuilds a table grid from laid-out page text.
//!
//! Text extraction keeps the horizontal layout of a page as runs of spaces.
//! Cells are split on gaps of at least [`GridLayout::min_gap`] spaces, the
//! leading cell of a line becomes the row label, and the remaining cells are
//! assigned to columns by clustering their right edges (financial figures
//! are right-aligned).

/// How page text is split into cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridLayout {
    /// Minimum run of spaces that separates two cells. Single spaces stay
    /// inside a cell so multi-word labels survive.
    pub min_gap: usize,
    /// Right edges closer than this many characters share a column.
    pub edge_tolerance: usize,
}

impl Default for GridLayout {
    fn default() -> Self {
        Self {
            min_gap: 2,
            edge_tolerance: 2,
        }
    }
}

/// A run of non-gap text on one line, in character positions.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Span {
    start: usize,
    end: usize,
    text: String,
}

/// Splits a line into cell spans.
fn split_spans(line: &str, min_gap: usize) -> Vec<Span> {
    let chars: Vec<char> = line.chars().collect();
    let mut spans = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        if chars[i].is_whitespace() {
            i += 1;
            continue;
        }

        let start = i;
        let mut end = i;
        let mut gap = 0;

        while i < chars.len() {
            if chars[i].is_whitespace() {
                gap += 1;
                if gap >= min_gap {
                    break;
                }
            } else {
                gap = 0;
                end = i + 1;
            }
            i += 1;
        }

        spans.push(Span {
            start,
            end,
            text: chars[start..end].iter().collect(),
        });
    }

    spans
}

/// Whether a leading span is a row label rather than a value that happens
/// to start a line (a year header, for instance).
fn is_label(span: &Span, label_limit: usize) -> bool {
    span.start < label_limit
        && (span.end <= label_limit || span.text.chars().any(char::is_alphabetic))
}

/// Spans of a line that hold values, skipping a leading label.
fn value_spans(spans: &[Span], label_limit: usize) -> &[Span] {
    match spans.first() {
        Some(first) if is_label(first, label_limit) => &spans[1..],
        _ => spans,
    }
}

/// Groups sorted right edges into inclusive `(low, high)` column ranges.
fn cluster_edges(edges: &[usize], tolerance: usize) -> Vec<(usize, usize)> {
    let mut columns: Vec<(usize, usize)> = Vec::new();

    for &edge in edges {
        match columns.last_mut() {
            Some((_, high)) if edge - *high <= tolerance => *high = edge,
            _ => columns.push((edge, edge)),
        }
    }

    columns
}

/// Builds a grid from page text.
///
/// Column 0 holds row labels. Lines without any text are dropped. Rows are
/// padded to the full width so the result is rectangular.
#[must_use]
pub fn grid_from_text(text: &str, layout: &GridLayout) -> plan_assets_allocation_models::RawGrid {
    let lines: Vec<Vec<Span>> = text
        .lines()
        .map(|line| split_spans(line, layout.min_gap))
        .filter(|spans| !spans.is_empty())
        .collect();

    // Labels end before the earliest second cell on any line.
    let label_limit = lines
        .iter()
        .filter_map(|spans| spans.get(1))
        .map(|span| span.start)
        .min()
        .unwrap_or(usize::MAX);

    let mut edges: Vec<usize> = lines
        .iter()
        .flat_map(|spans| value_spans(spans, label_limit))
        .map(|span| span.end)
        .collect();
    edges.sort_unstable();
    edges.dedup();

    let columns = cluster_edges(&edges, layout.edge_tolerance);

    let rows = lines
        .iter()
        .map(|spans| {
            let mut row = vec![String::new(); columns.len() + 1];
            let values = value_spans(spans, label_limit);

            if values.len() < spans.len() {
                row[0].clone_from(&spans[0].text);
            }

            for span in values {
                let col = columns
                    .iter()
                    .position(|(low, high)| (*low..=*high).contains(&span.end))
                    .map_or(0, |idx| idx + 1);
                let cell = &mut row[col];
                if !cell.is_empty() {
                    cell.push(' ');
                }
                cell.push_str(&span.text);
            }

            row
        })
        .collect();

    plan_assets_allocation_models::RawGrid::new(rows)
}
