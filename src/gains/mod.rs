//! Capital gains of a parsed statement: FIFO lots, grandfathered cost basis
//! and the schedule 112A breakdown.
//!
//! Gains are only meaningful for a statement that carries every scheme from
//! inception, so [`compute_gains`] and [`compute_all_gains`] refuse documents
//! that fail reconciliation or open with a non-zero balance.

mod lots;
mod report;

use std::collections::BTreeMap;
use std::io::Read;
use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::GainsError;
use crate::reconcile::{UNIT_TOLERANCE, validate_with_tolerance};
use crate::types::{CasType, Money, StatementDocument};

pub use lots::{GainEntry, GainTerm, GainsLot, compute_scheme_gains};
pub use report::{GainsReport, Schedule112aRow};

static FY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^FY(\d{4})-(\d{2})$").expect("valid financial year regex"));

/// A twelve-month tax year such as `FY2020-21`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancialYear {
    /// Label in `FYyyyy-yy` form.
    pub label: String,
    /// First day of the year.
    pub start: NaiveDate,
    /// Last day of the year.
    pub end: NaiveDate,
}

impl FinancialYear {
    /// Parses an April-March year label.
    pub fn parse(label: &str) -> Result<Self, GainsError> {
        Self::parse_with_start_month(label, 4)
    }

    /// Parses a year label whose year starts on the first of `start_month`.
    pub fn parse_with_start_month(label: &str, start_month: u32) -> Result<Self, GainsError> {
        let invalid = || GainsError::FinancialYear(label.to_string());
        let caps = FY_RE.captures(label.trim()).ok_or_else(invalid)?;
        let first: i32 = caps[1].parse().map_err(|_| invalid())?;
        let second: i32 = caps[2].parse().map_err(|_| invalid())?;
        if (first + 1) % 100 != second {
            return Err(invalid());
        }
        Self::starting(first, start_month).ok_or_else(invalid)
    }

    /// The financial year that contains `date`.
    pub fn containing(date: NaiveDate, start_month: u32) -> Result<Self, GainsError> {
        let first = if date.month() >= start_month {
            date.year()
        } else {
            date.year() - 1
        };
        Self::starting(first, start_month)
            .ok_or_else(|| GainsError::FinancialYear(date.to_string()))
    }

    /// True when `date` falls inside the year.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    fn starting(first: i32, start_month: u32) -> Option<Self> {
        let start = NaiveDate::from_ymd_opt(first, start_month, 1)?;
        let end = NaiveDate::from_ymd_opt(first + 1, start_month, 1)?.pred_opt()?;
        Some(Self {
            label: format!("FY{first}-{:02}", (first + 1) % 100),
            start,
            end,
        })
    }
}

/// Statutory constants of the gains computation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GainsConfig {
    /// Lots acquired on or before this day may use the fair value as cost.
    pub grandfather_cutoff: NaiveDate,
    /// NAV at the cutoff, keyed by ISIN.
    pub fair_values: BTreeMap<String, Money>,
    /// Holdings longer than this many days are long term.
    pub long_term_days: i64,
    /// Month in which the financial year starts.
    pub fy_start_month: u32,
    /// Slack allowed when matching units.
    pub tolerance: Decimal,
}

impl Default for GainsConfig {
    fn default() -> Self {
        Self {
            grandfather_cutoff: NaiveDate::from_ymd_opt(2018, 1, 31).unwrap_or_default(),
            fair_values: BTreeMap::new(),
            long_term_days: 365,
            fy_start_month: 4,
            tolerance: UNIT_TOLERANCE,
        }
    }
}

#[derive(Deserialize)]
struct FairValueRow {
    isin: String,
    nav: String,
}

impl GainsConfig {
    /// Adds one fair value.
    #[must_use]
    pub fn with_fair_value(mut self, isin: impl Into<String>, nav: Money) -> Self {
        self.fair_values.insert(isin.into(), nav);
        self
    }

    /// Loads fair values from CSV with an `isin,nav` header.
    pub fn load_fair_values<R: Read>(&mut self, reader: R) -> Result<usize, GainsError> {
        let mut rdr = csv::Reader::from_reader(reader);
        let mut loaded = 0;
        for record in rdr.deserialize::<FairValueRow>() {
            let row = record.map_err(|err| GainsError::FairValues(err.to_string()))?;
            let nav = crate::utils::parse_decimal(&row.nav, "nav")
                .map_err(|err| GainsError::FairValues(err.to_string()))?;
            self.fair_values.insert(row.isin.trim().to_string(), nav);
            loaded += 1;
        }
        tracing::debug!(loaded, "loaded fair values");
        Ok(loaded)
    }

    /// Parses a year label with the configured start month.
    pub fn financial_year(&self, label: &str) -> Result<FinancialYear, GainsError> {
        FinancialYear::parse_with_start_month(label, self.fy_start_month)
    }
}

/// Fails unless the document carries a complete, reconciled history.
pub fn ensure_complete(
    document: &StatementDocument,
    config: &GainsConfig,
) -> Result<(), GainsError> {
    if document.is_incomplete() || document.cas_type == CasType::Summary {
        return Err(GainsError::IncompleteCas);
    }
    if !validate_with_tolerance(document, config.tolerance).is_clean() {
        return Err(GainsError::IncompleteCas);
    }
    if let Some((folio, scheme)) = document
        .schemes()
        .find(|(_, scheme)| scheme.open.abs() > config.tolerance)
    {
        tracing::warn!(
            folio = %folio.folio,
            scheme = %scheme.name,
            open = %scheme.open,
            "scheme history does not start at inception"
        );
        return Err(GainsError::IncompleteCas);
    }
    Ok(())
}

/// Gains of one scheme, looked up by ISIN or name inside a folio.
pub fn compute_gains(
    document: &StatementDocument,
    folio: &str,
    scheme: &str,
    year: &FinancialYear,
    config: &GainsConfig,
) -> Result<GainsReport, GainsError> {
    ensure_complete(document, config)?;
    let account = document
        .folios
        .iter()
        .find(|f| f.folio == folio)
        .ok_or_else(|| GainsError::FolioNotFound(folio.to_string()))?;
    let found = account
        .schemes
        .iter()
        .find(|s| s.isin.as_deref() == Some(scheme) || s.name == scheme)
        .ok_or_else(|| GainsError::SchemeNotFound {
            folio: folio.to_string(),
            scheme: scheme.to_string(),
        })?;
    compute_scheme_gains(&account.folio, found, year, config)
}

/// Gains of every scheme in the document, in document order.
pub fn compute_all_gains(
    document: &StatementDocument,
    year: &FinancialYear,
    config: &GainsConfig,
) -> Result<Vec<GainsReport>, GainsError> {
    ensure_complete(document, config)?;
    document
        .schemes()
        .map(|(folio, scheme)| compute_scheme_gains(&folio.folio, scheme, year, config))
        .collect()
}
