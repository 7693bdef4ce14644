//! Per-layout pattern tables driving the structural walker.
//!
//! Each layout is an ordered list of `pattern -> action` rules. The walker asks
//! the table which action a row triggers and never branches on the layout
//! itself, so supporting a new layout means adding a table here.

use std::sync::LazyLock;

use crate::types::FileType;
use regex::{Captures, Regex};

/// What a recognized row means to the walker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Statement period (`from`, `to`).
    Period,
    /// AMC section header (`amc`).
    Amc,
    /// Folio header (`folio`).
    Folio,
    /// PAN row inside a folio header (`pan`).
    Pan,
    /// Scheme header (`name`, optional `code`, `isin`, `advisor`, `rta`).
    Scheme,
    /// ISIN row (`isin`, optional `advisor`).
    Isin,
    /// Registrar row (`rta`).
    Registrar,
    /// Opening unit balance (`units`).
    OpenUnits,
    /// Transaction (`date`, `desc`, optional `amount`, `units`, `nav`, `balance`).
    Transaction,
    /// Closing unit balance and valuation (`units`).
    Summary,
    /// Holdings-only row of a summary statement (`folio`, `isin`, `name`, optional
    /// `code` and `cost`, `units`, `date`, `nav`, `value`, `rta`).
    Holding,
    /// Known boilerplate.
    Ignore,
    /// End of the statement body.
    End,
}

/// One entry of a pattern table.
#[derive(Debug)]
pub struct Rule {
    /// Row pattern.
    pub pattern: Regex,
    /// Action triggered by a match.
    pub action: Action,
}

/// Pattern table and column conventions of one layout.
#[derive(Debug)]
pub struct Dialect {
    /// Layout the table belongs to.
    pub file_type: FileType,
    /// `chrono` format of dates in this layout.
    pub date_format: &'static str,
    /// Ordered rules, first match wins.
    pub rules: Vec<Rule>,
    /// Start of a scheme header wrapped onto the next row.
    pub scheme_head: Regex,
    /// A row opening with a transaction date.
    pub row_date: Regex,
    /// KYC flag on a folio row (group 1: `OK` / `NOT OK`).
    pub kyc: Regex,
    /// PAN verification flag on a folio row.
    pub pan_kyc: Regex,
    /// PAN printed on a folio row (`pan`).
    pub folio_pan: Regex,
    /// Closing NAV on a summary row (`nav`, optional `date`).
    pub close_nav: Regex,
    /// Market value on a summary row (`value`, optional `date`).
    pub close_value: Regex,
    /// Cost value on a summary row (`cost`).
    pub close_cost: Regex,
}

impl Dialect {
    /// Table for a classified layout; `None` for [`FileType::Unknown`].
    pub fn for_file_type(file_type: FileType) -> Option<&'static Self> {
        match file_type {
            FileType::Cams => Some(&CAMS),
            FileType::Kfintech => Some(&KFINTECH),
            FileType::Nsdl => Some(&NSDL),
            FileType::Unknown => None,
        }
    }

    /// Holdings-only table of a registrar summary statement.
    pub fn summary(file_type: FileType) -> Option<&'static Self> {
        match file_type {
            FileType::Cams => Some(&CAMS_SUMMARY),
            FileType::Kfintech => Some(&KFINTECH_SUMMARY),
            FileType::Nsdl | FileType::Unknown => None,
        }
    }

    /// First rule matching `row`, with its captures.
    pub fn recognize<'t>(&self, row: &'t str) -> Option<(Action, Captures<'t>)> {
        self.rules
            .iter()
            .find_map(|rule| rule.pattern.captures(row).map(|caps| (rule.action, caps)))
    }
}

const AMOUNT: &str = r"\(?-?[\d,]+\.\d+\)?";
const NUMBER: &str = r"[\d,]+(?:\.\d+)?";
const ISIN: &str = r"[A-Z]{2}[0-9A-Z]{9}[0-9]";
const PAN: &str = r"[A-Z]{5}[0-9]{4}[A-Z]";
const RTA_DATE: &str = r"\d{2}-[A-Za-z]{3}-\d{4}";
const NSDL_DATE: &str = r"\d{2}-\d{2}-\d{4}";

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).expect("valid dialect regex")
}

fn rule(action: Action, pattern: &str) -> Rule {
    Rule {
        pattern: re(pattern),
        action,
    }
}

/// Transaction patterns shared by layouts, most specific first.
fn transaction_rules(date: &str, full_columns: &str) -> [Rule; 4] {
    [
        rule(
            Action::Transaction,
            &format!(r"^(?P<date>{date})\t\t(?P<desc>[^\t]+?)\t\t{full_columns}\s*$"),
        ),
        rule(
            Action::Transaction,
            &format!(
                r"^(?P<date>{date})\t\t(?P<desc>[^\t]+?)\t\t(?P<units>{AMOUNT})\t\t(?P<balance>{AMOUNT})\s*$"
            ),
        ),
        rule(
            Action::Transaction,
            &format!(r"^(?P<date>{date})\t\t(?P<desc>[^\t]+?)\t\t(?P<amount>{AMOUNT})\s*$"),
        ),
        rule(
            Action::Transaction,
            &format!(r"^(?P<date>{date})\t\t(?P<desc>[^\t]+?)\s*$"),
        ),
    ]
}

/// CAMS and KFintech print the same consolidated layout and differ only in footers.
fn registrar_dialect(file_type: FileType, footer: &str) -> Dialect {
    let full = format!(
        r"(?P<amount>{AMOUNT})\t\t(?P<units>{AMOUNT})\t\t(?P<nav>{AMOUNT})\t\t(?P<balance>{AMOUNT})"
    );
    let mut rules = vec![
        rule(Action::End, r"(?i)^\s*\*+\s*End\s+of\s+Statement"),
        rule(Action::Ignore, r"(?i)^Date\s+Transaction\b"),
        rule(Action::Ignore, r"(?i)^Page\s+\d+\s+of\s+\d+"),
        rule(Action::Ignore, r"(?i)^Nominee\s*\d*\s*:"),
        rule(Action::Ignore, footer),
    ];
    rules.extend(transaction_rules(RTA_DATE, &full));
    rules.extend([
        rule(
            Action::Period,
            &format!(
                r"(?i)^(?:[^\t\d][^\t]*?\s)?(?P<from>{RTA_DATE})\s+to\s+(?P<to>{RTA_DATE})\s*$"
            ),
        ),
        rule(
            Action::Amc,
            r"(?i)^(?P<amc>[A-Za-z0-9&.'\s]+?\s+Mutual\s+Fund)\s*$",
        ),
        rule(
            Action::Folio,
            r"(?i)Folio\s+No\s*:\s*(?P<folio>[\d/\s]*\d)",
        ),
        rule(Action::Pan, &format!(r"^\s*PAN\s*:\s*(?P<pan>{PAN})\s*$")),
        rule(
            Action::OpenUnits,
            &format!(r"(?i)Opening\s+Unit\s+Balance\s*:?\s*(?P<units>{AMOUNT})"),
        ),
        rule(
            Action::Summary,
            &format!(r"(?i)Closing\s+Unit\s+Balance\s*:?\s*(?P<units>{AMOUNT})"),
        ),
        rule(
            Action::Isin,
            &format!(
                r"^\s*ISIN\s*:\s*(?P<isin>{ISIN})(?:\s*\(\s*Advisor\s*:\s*(?P<advisor>[^)]*)\))?"
            ),
        ),
        rule(Action::Registrar, r"(?i)^\s*Registrar\s*:\s*(?P<rta>\S+)\s*$"),
        rule(
            Action::Scheme,
            &format!(
                r"^(?:(?P<code>[A-Za-z0-9]+)\s*-\s*)?(?P<name>.+?)\s*(?:-\s*ISIN\s*:\s*(?P<isin>{ISIN}))?\s*(?:\(\s*Advisor\s*:\s*(?P<advisor>[^)]*)\))?\s*Registrar\s*:\s*(?P<rta>\S+)\s*$"
            ),
        ),
    ]);

    Dialect {
        file_type,
        date_format: "%d-%b-%Y",
        rules,
        scheme_head: re(r"^[A-Za-z0-9]+\s*-\s*\S"),
        row_date: re(&format!(r"^{RTA_DATE}\b")),
        kyc: re(r"(?i)KYC\s*:\s*(OK|NOT\s+OK)"),
        pan_kyc: re(r"(?i)PAN\s*:\s*(OK|NOT\s+OK)"),
        folio_pan: re(&format!(r"PAN\s*:\s*(?P<pan>{PAN})")),
        close_nav: re(&format!(
            r"(?i)NAV\s+on\s+(?P<date>{RTA_DATE})\s*:\s*INR\s*(?P<nav>{NUMBER})"
        )),
        close_value: re(&format!(
            r"(?i)(?:Valuation|Market\s+Value)\s+on\s+(?P<date>{RTA_DATE})\s*:\s*INR\s*(?P<value>{NUMBER})"
        )),
        close_cost: re(&format!(
            r"(?i)Cost\s+Value\s*:\s*(?:INR\s*)?(?P<cost>{NUMBER})"
        )),
    }
}

fn nsdl_dialect() -> Dialect {
    let full = format!(
        r"(?P<amount>{AMOUNT})\t\t(?P<nav>{AMOUNT})\t\t(?P<units>{AMOUNT})\t\t(?P<balance>{AMOUNT})"
    );
    let mut rules = vec![
        rule(Action::End, r"(?i)^About\s+NSDL"),
        rule(Action::Ignore, r"(?i)^Date\s+Transaction\s+Description"),
        rule(Action::Ignore, r"(?i)^Page\s+\d+"),
        rule(Action::Ignore, r"(?i)^Mutual\s+Fund\s+Folios"),
    ];
    rules.extend(transaction_rules(NSDL_DATE, &full));
    rules.extend([
        rule(
            Action::Period,
            &format!(r"(?i)period\s+from\s+(?P<from>{NSDL_DATE})\s+to\s+(?P<to>{NSDL_DATE})"),
        ),
        rule(Action::Amc, r"(?i)^AMC\s+Name\s*:\s*(?P<amc>.+?)\s*$"),
        rule(Action::Folio, r"(?i)^Folio\s+No\.?\s*:\s*(?P<folio>[\w/]+)"),
        rule(Action::Pan, &format!(r"^\s*PAN\s*:\s*(?P<pan>{PAN})\s*$")),
        rule(
            Action::Scheme,
            &format!(
                r"^ISIN\s*:\s*(?P<isin>{ISIN})\s+(?:UCC\s*:\s*(?P<code>\S+)\s+)?Scheme(?:\s+Name)?\s*:\s*(?P<name>.+?)\s*$"
            ),
        ),
        rule(
            Action::OpenUnits,
            &format!(r"(?i)^Opening\s+Balance\s*:?\s*(?P<units>{AMOUNT})"),
        ),
        rule(
            Action::Summary,
            &format!(r"(?i)^Closing\s+Balance\s*:?\s*(?P<units>{AMOUNT})"),
        ),
        rule(Action::Registrar, r"(?i)^\s*Registrar\s*:\s*(?P<rta>\S+)\s*$"),
    ]);

    Dialect {
        file_type: FileType::Nsdl,
        date_format: "%d-%m-%Y",
        rules,
        scheme_head: re(r"^ISIN\s*:\s*\S+\s*$"),
        row_date: re(&format!(r"^{NSDL_DATE}\b")),
        kyc: re(r"(?i)KYC\s*:\s*(OK|NOT\s+OK)"),
        pan_kyc: re(r"(?i)PAN\s*:\s*(OK|NOT\s+OK)"),
        folio_pan: re(&format!(r"PAN\s*:\s*(?P<pan>{PAN})")),
        close_nav: re(&format!(
            r"(?i)NAV\s+(?:as\s+)?on\s+(?P<date>{NSDL_DATE})\s*:\s*(?:INR\s*)?(?P<nav>{NUMBER})"
        )),
        close_value: re(&format!(
            r"(?i)\bValue(?:\s+as\s+on\s+(?P<date>{NSDL_DATE}))?\s*:\s*(?:INR\s*)?(?P<value>{NUMBER})"
        )),
        close_cost: re(&format!(r"(?i)Total\s+Cost\s*:\s*(?:INR\s*)?(?P<cost>{NUMBER})")),
    }
}

/// Registrar summary statements list one row per holding and no transactions.
fn summary_dialect(file_type: FileType, footer: &str) -> Dialect {
    let rules = vec![
        rule(Action::End, r"(?i)^\s*\*+\s*End\s+of\s+Statement"),
        rule(Action::Ignore, r"(?i)^Folio\s+No\.?\s+ISIN\b"),
        rule(Action::Ignore, r"(?i)^Page\s+\d+\s+of\s+\d+"),
        rule(Action::Ignore, r"(?i)^Total\b"),
        rule(Action::Ignore, footer),
        rule(
            Action::Period,
            &format!(r"(?i)^\s*As\s+on\s+(?P<from>{RTA_DATE})\s*$"),
        ),
        rule(
            Action::Amc,
            r"(?i)^(?P<amc>[A-Za-z0-9&.'\s]+?\s+Mutual\s+Fund)\s*$",
        ),
        rule(
            Action::Holding,
            &format!(
                r"^(?P<folio>[\d/\s]*\d)\t\t(?P<isin>{ISIN})\t\t(?:(?P<code>[A-Za-z0-9]+)\s*-\s*)?(?P<name>[^\t]+?)\t\t(?:(?P<cost>{NUMBER})\t\t)?(?P<units>{NUMBER})\t\t(?P<date>{RTA_DATE})\t\t(?P<nav>{NUMBER})\t\t(?P<value>{NUMBER})\t\t(?P<rta>\S+)\s*$"
            ),
        ),
    ];

    Dialect {
        file_type,
        date_format: "%d-%b-%Y",
        rules,
        scheme_head: re(r"^[A-Za-z0-9]+\s*-\s*\S"),
        row_date: re(&format!(r"^{RTA_DATE}\b")),
        kyc: re(r"(?i)KYC\s*:\s*(OK|NOT\s+OK)"),
        pan_kyc: re(r"(?i)PAN\s*:\s*(OK|NOT\s+OK)"),
        folio_pan: re(&format!(r"PAN\s*:\s*(?P<pan>{PAN})")),
        close_nav: re(&format!(
            r"(?i)NAV\s+on\s+(?P<date>{RTA_DATE})\s*:\s*INR\s*(?P<nav>{NUMBER})"
        )),
        close_value: re(&format!(
            r"(?i)(?:Valuation|Market\s+Value)\s+on\s+(?P<date>{RTA_DATE})\s*:\s*INR\s*(?P<value>{NUMBER})"
        )),
        close_cost: re(&format!(
            r"(?i)Cost\s+Value\s*:\s*(?:INR\s*)?(?P<cost>{NUMBER})"
        )),
    }
}

static CAMS: LazyLock<Dialect> =
    LazyLock::new(|| registrar_dialect(FileType::Cams, r"CAMSCASWS"));
static KFINTECH: LazyLock<Dialect> =
    LazyLock::new(|| registrar_dialect(FileType::Kfintech, r"KFINCASWS"));
static NSDL: LazyLock<Dialect> = LazyLock::new(nsdl_dialect);
static CAMS_SUMMARY: LazyLock<Dialect> =
    LazyLock::new(|| summary_dialect(FileType::Cams, r"CAMSCASWS"));
static KFINTECH_SUMMARY: LazyLock<Dialect> =
    LazyLock::new(|| summary_dialect(FileType::Kfintech, r"KFINCASWS"));
