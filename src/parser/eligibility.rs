//! Eligibility detail page
//!
//! The page mixes free text and tables. Each value is pulled out by its own
//! accessor so that a missing plan label, for example, does not prevent the
//! service history from being read.

use super::{selector, ParseError};
use regex::Regex;
use scraper::{ElementRef, Html};
use std::sync::LazyLock;

static PLAN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<div class="eligLabel">Plan:</div>(.*)</div>"#).expect("Invalid regex")
});

static BECAME_ELIGIBLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"This member is on the .* plan and became eligible for benefits on (\d+/\d+/\d+).")
        .expect("Invalid regex")
});

static ACTIVE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"This member is currently .*").expect("Invalid regex"));

static ELIGIBLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Subscriber is .*").expect("Invalid regex"));

static CONFIRMATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Confirmation: (#\d+)<br/>").expect("Invalid regex"));

const ACTIVE_ANCHOR: &str = "This member is currently";
const ELIGIBLE_ANCHOR: &str = "Subscriber is";
const PRINT_LINK_TEXT: &str = "Print Eligibility Confirmation";

/// Procedure cells marking a prophylaxis visit, in order of preference
const PROPHYLAXIS_MARKERS: [&str; 2] = [
    r#"td[title="PROPHYLAXIS - ADULT"]"#,
    r#"td[title="PROPHYLAXIS - CHILD"]"#,
];

/// Values read from a member's eligibility page
///
/// Every field is optional. The active and eligible sentences are kept as
/// `Option<bool>` so a page without them can be told apart from a page that
/// states the member is inactive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EligibilityDetail {
    pub plan: Option<String>,
    pub became_eligible_on: Option<String>,
    pub active: Option<bool>,
    pub eligible: Option<bool>,
    pub confirmation_no: Option<String>,
    pub last_service_date: Option<String>,
    pub last_prophylaxis_date: Option<String>,
    /// `href` of the print confirmation link, as written in the page
    pub print_link: Option<String>,
}

impl EligibilityDetail {
    /// Combined managed-care status: active and eligible
    ///
    /// # Returns
    ///
    /// * `Ok(bool)` - Both sentences were present
    /// * `Err(ParseError::MissingAnchor)` - One of the sentences is missing
    pub fn mco_status(&self) -> Result<bool, ParseError> {
        let active = self.active.ok_or(ParseError::MissingAnchor(ACTIVE_ANCHOR))?;
        let eligible = self
            .eligible
            .ok_or(ParseError::MissingAnchor(ELIGIBLE_ANCHOR))?;
        Ok(active && eligible)
    }

    pub fn is_medicaid(&self) -> bool {
        self.plan
            .as_deref()
            .is_some_and(|plan| plan.contains("MEDICAID"))
    }
}

/// Parses an eligibility detail page
///
/// Only a blank body is an error here. Missing sentences surface later
/// through [`EligibilityDetail::mco_status`].
///
/// # Arguments
///
/// * `html` - Raw page body
///
/// # Returns
///
/// * `Ok(EligibilityDetail)` - Whatever could be extracted
/// * `Err(ParseError::EmptyDocument)` - The body was blank
pub fn parse_eligibility(html: &str) -> Result<EligibilityDetail, ParseError> {
    if html.trim().is_empty() {
        return Err(ParseError::EmptyDocument);
    }

    let document = Html::parse_document(html);

    Ok(EligibilityDetail {
        plan: plan(html),
        became_eligible_on: became_eligible_on(html),
        active: active(html),
        eligible: eligible(html),
        confirmation_no: confirmation_no(html),
        last_service_date: last_service_date(&document)?,
        last_prophylaxis_date: last_prophylaxis_date(&document)?,
        print_link: print_link(&document)?,
    })
}

fn plan(html: &str) -> Option<String> {
    PLAN_RE
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

fn became_eligible_on(html: &str) -> Option<String> {
    BECAME_ELIGIBLE_RE
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

fn confirmation_no(html: &str) -> Option<String> {
    CONFIRMATION_RE
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// `Some(true)` when the member is currently active
fn active(html: &str) -> Option<bool> {
    let sentence = ACTIVE_RE.find(html)?.as_str();
    Some(affirms(sentence, "active"))
}

/// `Some(true)` when the subscriber is eligible
fn eligible(html: &str) -> Option<bool> {
    let sentence = ELIGIBLE_RE.find(html)?.as_str();
    Some(affirms(sentence, "eligible"))
}

/// Whether a sentence contains `word` as a whole word and is not negated
///
/// Only the text before the first tag counts. "inactive" and "ineligible"
/// do not match, and the word is negated only by a "not" directly before it.
fn affirms(sentence: &str, word: &str) -> bool {
    let text = sentence.split('<').next().unwrap_or_default().to_lowercase();
    let words: Vec<&str> = text
        .split(|c: char| !c.is_alphabetic())
        .filter(|w| !w.is_empty())
        .collect();

    words
        .iter()
        .enumerate()
        .any(|(i, w)| *w == word && (i == 0 || words[i - 1] != "not"))
}

/// First cell of the last services table
fn last_service_date(document: &Html) -> Result<Option<String>, ParseError> {
    let table_sel = selector("table.services")?;
    let td_sel = selector("td")?;

    Ok(document
        .select(&table_sel)
        .last()
        .and_then(|table| table.select(&td_sel).next())
        .map(|td| cell_text(&td)))
}

/// Date of the most recent prophylaxis visit
///
/// Service rows are listed oldest first, each starting with its date cell.
/// Rows that open before the marker cell, including the row that contains
/// it, are scanned nearest-first and the first non-empty leading cell wins.
fn last_prophylaxis_date(document: &Html) -> Result<Option<String>, ParseError> {
    let mut marker = None;
    for css in PROPHYLAXIS_MARKERS {
        let sel = selector(css)?;
        if let Some(found) = document.select(&sel).next() {
            marker = Some(found);
            break;
        }
    }

    let Some(marker) = marker else {
        return Ok(None);
    };

    // Preorder walk: a row visited before the marker opened before it
    let mut rows_before = Vec::new();
    for node in document.root_element().descendants() {
        if node.id() == marker.id() {
            break;
        }
        if let Some(element) = ElementRef::wrap(node) {
            if element.value().name() == "tr" {
                rows_before.push(element);
            }
        }
    }

    let td_sel = selector("td")?;
    Ok(rows_before
        .into_iter()
        .rev()
        .filter_map(|row| row.select(&td_sel).next())
        .map(|td| cell_text(&td))
        .find(|text| !text.is_empty()))
}

fn print_link(document: &Html) -> Result<Option<String>, ParseError> {
    let link_sel = selector("a")?;

    Ok(document
        .select(&link_sel)
        .find(|a| a.text().collect::<String>().trim() == PRINT_LINK_TEXT)
        .and_then(|a| a.value().attr("href"))
        .map(str::to_string))
}

fn cell_text(cell: &ElementRef<'_>) -> String {
    cell.text().collect::<String>().trim().to_string()
}
