//! Per-scheme gains report and its schedule 112A rows.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::lots::{GainEntry, GainTerm, GainsLot};
use crate::types::{Money, Units};

/// Realized gains of one scheme for one financial year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GainsReport {
    /// Folio number.
    pub folio: String,
    /// Scheme name.
    pub scheme: String,
    /// ISIN.
    pub isin: Option<String>,
    /// Financial year label.
    pub financial_year: String,
    /// Realized gains in disposal order.
    pub entries: Vec<GainEntry>,
    /// Every lot built up to the end of the year.
    pub lots: Vec<GainsLot>,
}

impl GainsReport {
    /// Lots still holding units at the end of the year.
    pub fn remaining(&self) -> impl Iterator<Item = &GainsLot> {
        self.lots.iter().filter(|lot| lot.remaining > Units::ZERO)
    }

    /// Sum of every entry's gain.
    pub fn total_gain(&self) -> Money {
        self.entries.iter().map(|e| e.gain).sum()
    }

    /// Sum of long-term gains.
    pub fn long_term_gain(&self) -> Money {
        self.term_gain(GainTerm::LongTerm)
    }

    /// Sum of short-term gains.
    pub fn short_term_gain(&self) -> Money {
        self.term_gain(GainTerm::ShortTerm)
    }

    fn term_gain(&self, term: GainTerm) -> Money {
        self.entries
            .iter()
            .filter(|e| e.term == term)
            .map(|e| e.gain)
            .sum()
    }

    /// Schedule 112A rows, one per long-term entry.
    pub fn schedule_112a(&self, cutoff: NaiveDate) -> Vec<Schedule112aRow> {
        self.entries
            .iter()
            .filter(|e| e.term == GainTerm::LongTerm)
            .map(|e| Schedule112aRow {
                isin: self.isin.clone().unwrap_or_default(),
                scheme: self.scheme.clone(),
                acquired_before_cutoff: e.acquired <= cutoff,
                units: e.units,
                sale_price: per_unit(e.sale_value, e.units),
                consideration: e.sale_value,
                actual_cost: e.purchase_value,
                cost_of_acquisition: e.cost_basis,
                fair_value_per_unit: e.fair_value.map(|fmv| per_unit(fmv, e.units)),
                fair_value: e.fair_value,
                balance: e.gain,
                sold: e.sold,
            })
            .collect()
    }
}

fn per_unit(total: Money, units: Units) -> Money {
    if units.is_zero() {
        Money::ZERO
    } else {
        (total / units).round_dp(4)
    }
}

/// One row of the 112A long-term gains schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule112aRow {
    /// ISIN.
    pub isin: String,
    /// Scheme name.
    pub scheme: String,
    /// Acquired on or before the grandfathering cutoff.
    pub acquired_before_cutoff: bool,
    /// Units sold.
    pub units: Units,
    /// Sale price per unit.
    pub sale_price: Money,
    /// Full value of consideration.
    pub consideration: Money,
    /// Cost of acquisition without grandfathering.
    pub actual_cost: Money,
    /// Cost of acquisition used for the gain.
    pub cost_of_acquisition: Money,
    /// Fair value per unit at the cutoff.
    pub fair_value_per_unit: Option<Money>,
    /// Fair value of the units at the cutoff.
    pub fair_value: Option<Money>,
    /// Consideration less cost of acquisition.
    pub balance: Money,
    /// Disposal date.
    pub sold: NaiveDate,
}
