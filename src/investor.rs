//! Investor identity from the header region of the first page.

use std::sync::LazyLock;

use crate::error::ParseError;
use crate::text::{CELL_SEPARATOR, Page, Rect};
use crate::types::InvestorInfo;
use crate::utils::{capture_text, normalize_line};
use regex::Regex;

static EMAIL_LABEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*e-?mail(?:\s+id)?\s*:\s*(\S*)").expect("valid email label regex"));
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([\w.+-]+@[\w-]+(?:\.[\w-]+)+)").expect("valid email regex"));
static MOBILE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)mobile\s*(?:no\.?)?\s*:\s*([+\d][\d\s-]*\d)").expect("valid mobile regex"));
static PAN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([A-Z]{5}[0-9]{4}[A-Z])\b").expect("valid pan regex"));
static SECTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)folio\s+no|mutual\s+fund\s*$|^date\b|^isin\b").expect("valid section regex")
});
static NOISE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)consolidated\s+account|statement\s+for\s+the\s+period|\d{2}-(?:\w{3}|\d{2})-\d{4}\s+to\s+\d{2}-(?:\w{3}|\d{2})-\d{4}|^page\s+\d+|^(?:nsdl|cdsl|cas)\s+id\b|^as\s+on\s+\d{2}-",
    )
    .expect("valid noise regex")
});

/// Extracts the investor identity from the rows inside `header_region`.
///
/// Fails with [`ParseError::InvestorInfo`] when the region yields no usable row
/// or no name line.
pub fn extract_investor_info(page: &Page, header_region: Rect) -> Result<InvestorInfo, ParseError> {
    if header_region.area() <= 0.0 {
        return Err(ParseError::InvestorInfo);
    }

    let lines: Vec<String> = page
        .rows_in(header_region)
        .iter()
        .map(|row| normalize_line(&row.replace(CELL_SEPARATOR, " ")))
        .filter(|line| !line.is_empty())
        .collect();
    if lines.is_empty() {
        return Err(ParseError::InvestorInfo);
    }

    let mut email = None;
    let mut pan = None;
    let mut mobile = None;
    let mut name: Option<String> = None;
    let mut address = Vec::new();

    for line in &lines {
        if SECTION_RE.is_match(line) {
            break;
        }
        if NOISE_RE.is_match(line) {
            continue;
        }
        if let Some(found) = capture_text(line, &EMAIL_RE) {
            email.get_or_insert(found);
            continue;
        }
        if EMAIL_LABEL_RE.is_match(line) {
            continue;
        }
        if let Some(found) = capture_text(line, &MOBILE_RE) {
            mobile = Some(found.replace([' ', '-'], ""));
            if name.is_some() {
                break;
            }
            continue;
        }
        if let Some(found) = capture_text(line, &PAN_RE) {
            pan.get_or_insert(found);
            continue;
        }
        if name.is_none() {
            name = Some(line.clone());
        } else {
            address.push(line.clone());
        }
    }

    let name = name.ok_or(ParseError::InvestorInfo)?;
    tracing::debug!(%name, has_email = email.is_some(), "parsed investor header");

    Ok(InvestorInfo {
        name,
        email,
        address: (!address.is_empty()).then(|| address.join("\n")),
        pan,
        mobile,
    })
}
