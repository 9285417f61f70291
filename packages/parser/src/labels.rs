//! Row label matching.
//!
//! Labels are normalised (lowercase, single spaces, footnote markers
//! removed) and matched against a fixed table of patterns. Phrase patterns
//! respect word boundaries so `"foreign"` does not match `"foreigners"`.
//!
//! Two tables drive the classifier. [`TRANSITIONS`] holds rows that change
//! section state and is evaluated in order, first match wins. [`LEAVES`]
//! maps rows to leaf classes within a scope; more than one hit is an
//! ambiguity, never a choice.

use plan_assets_allocation_models::{AssetClass, SectionState};

/// A test applied to a normalised label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelPattern {
    /// The whole label equals the text.
    Exact(&'static str),
    /// The label contains the text as whole words.
    Phrase(&'static str),
    /// The label contains every phrase.
    AllOf(&'static [&'static str]),
}

impl LabelPattern {
    /// Tests a label produced by [`normalize_label`].
    #[must_use]
    pub fn matches(self, label: &str) -> bool {
        match self {
            Self::Exact(text) => label == text,
            Self::Phrase(text) => contains_phrase(label, text),
            Self::AllOf(phrases) => phrases.iter().all(|p| contains_phrase(label, p)),
        }
    }
}

/// Section states a pattern applies in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Every state.
    Anywhere,
    /// "Investment funds" or any of its subsections.
    InvestmentFunds,
    /// Exactly this state.
    In(SectionState),
}

impl Scope {
    /// Whether the scope covers `state`.
    #[must_use]
    pub fn contains(self, state: SectionState) -> bool {
        match self {
            Self::Anywhere => true,
            Self::InvestmentFunds => state.is_investment_funds(),
            Self::In(expected) => state == expected,
        }
    }
}

/// Effect of a structural row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// The summary row: read total assets and stop.
    Finish,
    /// A leaf that also returns the walk to the top level.
    TopLevelLeaf(AssetClass),
    /// A section or subsection header.
    Enter(SectionState),
}

/// One row of the transition table.
#[derive(Debug, Clone, Copy)]
pub struct Transition {
    /// States the rule applies in.
    pub scope: Scope,
    /// Label test.
    pub pattern: LabelPattern,
    /// What happens on a match.
    pub action: Action,
}

/// Structural rows, in evaluation order.
///
/// The summary and "other investments" rows come first because their
/// labels also contain section words. Fund subsections come before the
/// main sections so "Bonds" under "Investment funds" is not read as the
/// main bonds section.
pub const TRANSITIONS: &[Transition] = &[
    Transition {
        scope: Scope::Anywhere,
        pattern: LabelPattern::Phrase("total fair value of plan assets"),
        action: Action::Finish,
    },
    Transition {
        scope: Scope::Anywhere,
        pattern: LabelPattern::Phrase("other investments"),
        action: Action::TopLevelLeaf(AssetClass::OtherInvestments),
    },
    Transition {
        scope: Scope::InvestmentFunds,
        pattern: LabelPattern::Exact("equity"),
        action: Action::Enter(SectionState::InvestmentFundsEquity),
    },
    Transition {
        scope: Scope::InvestmentFunds,
        pattern: LabelPattern::Exact("bonds"),
        action: Action::Enter(SectionState::InvestmentFundsBonds),
    },
    Transition {
        scope: Scope::InvestmentFunds,
        pattern: LabelPattern::Exact("real estate"),
        action: Action::Enter(SectionState::InvestmentFundsRealEstate),
    },
    Transition {
        scope: Scope::Anywhere,
        pattern: LabelPattern::Exact("equity securities"),
        action: Action::Enter(SectionState::EquitySecurities),
    },
    Transition {
        scope: Scope::Anywhere,
        pattern: LabelPattern::Exact("bonds"),
        action: Action::Enter(SectionState::Bonds),
    },
    Transition {
        scope: Scope::Anywhere,
        pattern: LabelPattern::AllOf(&["real estate", "property"]),
        action: Action::Enter(SectionState::RealEstate),
    },
    Transition {
        scope: Scope::Anywhere,
        pattern: LabelPattern::Phrase("investment funds"),
        action: Action::Enter(SectionState::InvestmentFunds),
    },
];

/// One row of the leaf table.
#[derive(Debug, Clone, Copy)]
pub struct LeafRule {
    /// States the rule applies in.
    pub scope: Scope,
    /// Label test.
    pub pattern: LabelPattern,
    /// Class assigned on a match.
    pub class: AssetClass,
}

const fn leaf(scope: Scope, pattern: LabelPattern, class: AssetClass) -> LeafRule {
    LeafRule {
        scope,
        pattern,
        class,
    }
}

const AAA_TO_BBB: &str = "aaa to bbb";
const BELOW_BBB: &str = "below bbb";

/// Leaf rows by scope.
pub const LEAVES: &[LeafRule] = &[
    leaf(
        Scope::Anywhere,
        LabelPattern::Phrase("cash and cash equivalents"),
        AssetClass::Cash,
    ),
    leaf(
        Scope::In(SectionState::EquitySecurities),
        LabelPattern::Phrase("domestic"),
        AssetClass::DomesticEquitySecurities,
    ),
    leaf(
        Scope::In(SectionState::EquitySecurities),
        LabelPattern::Phrase("foreign"),
        AssetClass::ForeignEquitySecurities,
    ),
    leaf(
        Scope::In(SectionState::Bonds),
        LabelPattern::AllOf(&["domestic", AAA_TO_BBB]),
        AssetClass::NonInvestDomesticBonds,
    ),
    leaf(
        Scope::In(SectionState::Bonds),
        LabelPattern::AllOf(&["foreign", AAA_TO_BBB]),
        AssetClass::NonInvestForeignBondsRated,
    ),
    leaf(
        Scope::In(SectionState::RealEstate),
        LabelPattern::Phrase("domestic"),
        AssetClass::DomesticRealEstate,
    ),
    leaf(
        Scope::In(SectionState::RealEstate),
        LabelPattern::Phrase("foreign"),
        AssetClass::ForeignRealEstate,
    ),
    leaf(
        Scope::In(SectionState::InvestmentFundsEquity),
        LabelPattern::Phrase("domestic"),
        AssetClass::DomesticEquities,
    ),
    leaf(
        Scope::In(SectionState::InvestmentFundsEquity),
        LabelPattern::Phrase("foreign"),
        AssetClass::ForeignEquities,
    ),
    leaf(
        Scope::In(SectionState::InvestmentFundsBonds),
        LabelPattern::AllOf(&["domestic", AAA_TO_BBB]),
        AssetClass::DomesticBonds,
    ),
    leaf(
        Scope::In(SectionState::InvestmentFundsBonds),
        LabelPattern::AllOf(&["domestic", BELOW_BBB]),
        AssetClass::DomesticBondsJunk,
    ),
    leaf(
        Scope::In(SectionState::InvestmentFundsBonds),
        LabelPattern::AllOf(&["foreign", AAA_TO_BBB]),
        AssetClass::ForeignBondsRated,
    ),
    leaf(
        Scope::In(SectionState::InvestmentFundsBonds),
        LabelPattern::AllOf(&["foreign", BELOW_BBB]),
        AssetClass::ForeignBondsJunk,
    ),
    leaf(
        Scope::In(SectionState::InvestmentFundsRealEstate),
        LabelPattern::Phrase("domestic"),
        AssetClass::DomesticRealEstateInvestments,
    ),
    leaf(
        Scope::In(SectionState::InvestmentFundsRealEstate),
        LabelPattern::Phrase("foreign"),
        AssetClass::ForeignRealEstateInvestments,
    ),
    leaf(
        Scope::InvestmentFunds,
        LabelPattern::Exact("other"),
        AssetClass::Other,
    ),
];

/// Normalises a raw row label for matching.
///
/// Lowercases, maps dash variants to `-`, collapses whitespace, and drops
/// footnote markers: superscript digits, and digits glued to the end of a
/// word (`"Bonds1"`, `"property2,3"`). Trailing `:` is removed.
#[must_use]
pub fn normalize_label(raw: &str) -> String {
    let lowered: String = raw
        .chars()
        .filter(|c| !is_superscript(*c))
        .map(|c| match c {
            '\u{2010}'..='\u{2015}' | '\u{2212}' => '-',
            c if c.is_whitespace() => ' ',
            c => c,
        })
        .flat_map(char::to_lowercase)
        .collect();

    let words: Vec<&str> = lowered
        .split(' ')
        .filter(|w| !w.is_empty())
        .map(strip_footnote)
        .filter(|w| !w.is_empty())
        .collect();

    words.join(" ").trim_end_matches(':').trim_end().to_owned()
}

/// Removes footnote digits glued to a word that contains letters.
fn strip_footnote(word: &str) -> &str {
    let without = word.trim_end_matches(|c: char| c.is_ascii_digit() || c == ',');
    let marker = &word[without.len()..];
    if marker.contains(|c: char| c.is_ascii_digit()) && without.ends_with(char::is_alphabetic) {
        without
    } else {
        word
    }
}

const fn is_superscript(c: char) -> bool {
    matches!(c, '\u{00b9}' | '\u{00b2}' | '\u{00b3}' | '\u{2070}'..='\u{2079}')
}

/// Whether `phrase` occurs in `label` on word boundaries.
fn contains_phrase(label: &str, phrase: &str) -> bool {
    label.match_indices(phrase).any(|(start, _)| {
        let end = start + phrase.len();
        let before = label[..start].chars().next_back();
        let after = label[end..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

/// First structural rule matching `label` in `state`.
#[must_use]
pub fn transition_for(state: SectionState, label: &str) -> Option<Action> {
    TRANSITIONS
        .iter()
        .find(|t| t.scope.contains(state) && t.pattern.matches(label))
        .map(|t| t.action)
}

/// Every leaf class `label` matches in `state`, in table order.
#[must_use]
pub fn leaf_candidates(state: SectionState, label: &str) -> Vec<AssetClass> {
    LEAVES
        .iter()
        .filter(|rule| rule.scope.contains(state) && rule.pattern.matches(label))
        .map(|rule| rule.class)
        .collect()
}

/// Whether a label belongs to the table body rather than its header.
///
/// Only rows that are recognised regardless of section state count:
/// structural rows and cash.
#[must_use]
pub fn is_table_content(label: &str) -> bool {
    TRANSITIONS.iter().any(|t| t.pattern.matches(label))
        || LEAVES
            .iter()
            .any(|rule| rule.scope == Scope::Anywhere && rule.pattern.matches(label))
}
