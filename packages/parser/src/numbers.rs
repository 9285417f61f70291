//! Cell value parsing for financial tables.

/// Interpretation of one grid cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// A number (percent signs, separators and parentheses removed).
    Number(f64),
    /// Empty, a dash placeholder, or `nan` from a dataframe dump.
    Blank,
    /// Anything else, kept for diagnostics.
    Text(String),
}

impl CellValue {
    /// Returns the number, if any.
    #[must_use]
    pub const fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Blank | Self::Text(_) => None,
        }
    }
}

const DASHES: &[char] = &[
    '-', '\u{2010}', '\u{2011}', '\u{2012}', '\u{2013}', '\u{2014}', '\u{2212}',
];

/// Parses a cell such as `52,241`, `3%`, `(1.5)`, `1'200` or `–`.
#[must_use]
pub fn parse_cell(raw: &str) -> CellValue {
    let trimmed = raw.trim();

    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan") {
        return CellValue::Blank;
    }
    if trimmed.chars().all(|c| DASHES.contains(&c) || c.is_whitespace()) {
        return CellValue::Blank;
    }

    let cleaned: String = trimmed
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, ',' | '\'' | '\u{2019}' | '%'))
        .map(|c| if DASHES.contains(&c) { '-' } else { c })
        .collect();

    let (negative, body) = match cleaned.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
        Some(inner) => (true, inner),
        None => (false, cleaned.as_str()),
    };

    match body.parse::<f64>() {
        Ok(n) if n.is_finite() => CellValue::Number(if negative { -n } else { n }),
        _ => CellValue::Text(trimmed.to_owned()),
    }
}
