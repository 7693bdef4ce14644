//! FIFO lot matching of disposals against acquisitions.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::report::GainsReport;
use super::{FinancialYear, GainsConfig};
use crate::error::GainsError;
use crate::types::{Money, Scheme, Transaction, TransactionType, Units};

/// Units acquired by one transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GainsLot {
    /// Index of the acquiring transaction in the scheme.
    pub transaction: usize,
    /// Acquisition date.
    pub acquired: NaiveDate,
    /// Units acquired, net of reversals.
    pub units: Units,
    /// Total cost of `units`, stamp duty included.
    pub cost: Money,
    /// Units not yet disposed of.
    pub remaining: Units,
    /// Indices of the disposals that consumed this lot.
    pub disposals: Vec<usize>,
}

impl GainsLot {
    /// Cost of one unit.
    pub fn cost_per_unit(&self) -> Money {
        if self.units.is_zero() {
            Money::ZERO
        } else {
            self.cost / self.units
        }
    }

    /// Cost of `units` out of this lot.
    fn cost_of(&self, units: Units) -> Money {
        if self.units.is_zero() {
            Money::ZERO
        } else {
            self.cost * units / self.units
        }
    }
}

/// Holding period class of a realized gain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GainTerm {
    /// Held for at most the long-term threshold.
    ShortTerm,
    /// Held for longer than the long-term threshold.
    LongTerm,
}

/// Gain realized by one disposal out of one lot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GainEntry {
    /// Index of the disposal transaction.
    pub disposal: usize,
    /// Index of the acquiring transaction.
    pub lot: usize,
    /// Acquisition date.
    pub acquired: NaiveDate,
    /// Disposal date.
    pub sold: NaiveDate,
    /// Units matched.
    pub units: Units,
    /// Actual cost of the matched units.
    pub purchase_value: Money,
    /// Fair value of the matched units at the grandfathering cutoff.
    pub fair_value: Option<Money>,
    /// Cost used for the gain.
    pub cost_basis: Money,
    /// Share of the disposal proceeds.
    pub sale_value: Money,
    /// `sale_value - cost_basis`.
    pub gain: Money,
    /// Holding period class.
    pub term: GainTerm,
}

/// Lots in acquisition order with a cursor on the oldest open one.
#[derive(Debug, Default)]
struct LotQueue {
    lots: Vec<GainsLot>,
    head: usize,
}

impl LotQueue {
    fn push(&mut self, lot: GainsLot) {
        self.lots.push(lot);
    }

    fn available(&self) -> Units {
        self.lots[self.head..].iter().map(|lot| lot.remaining).sum()
    }

    fn front_mut(&mut self) -> Option<&mut GainsLot> {
        while self
            .lots
            .get(self.head)
            .is_some_and(|lot| lot.remaining.is_zero())
        {
            self.head += 1;
        }
        self.lots.get_mut(self.head)
    }

    /// Newest lot acquired on `date`, for same-day charges.
    fn acquired_on(&mut self, date: NaiveDate) -> Option<&mut GainsLot> {
        self.lots.last_mut().filter(|lot| lot.acquired == date)
    }

    /// Cancels `units` from the newest lots.
    fn reverse(&mut self, mut units: Units) {
        for lot in self.lots[self.head..].iter_mut().rev() {
            if units.is_zero() {
                break;
            }
            let take = units.min(lot.remaining);
            let cost = lot.cost_of(take);
            lot.cost -= cost;
            lot.units -= take;
            lot.remaining -= take;
            units -= take;
        }
    }
}

/// Computes gains of one scheme for a financial year, without integrity checks.
///
/// Use [`super::compute_gains`] for documents straight from the parser.
pub fn compute_scheme_gains(
    folio: &str,
    scheme: &Scheme,
    year: &FinancialYear,
    config: &GainsConfig,
) -> Result<GainsReport, GainsError> {
    let mut queue = LotQueue::default();
    let mut entries = Vec::new();

    for (index, txn) in scheme.transactions.iter().enumerate() {
        if txn.date > year.end {
            break;
        }
        match txn.kind {
            kind if kind.is_acquisition() && txn.units > Units::ZERO => queue.push(GainsLot {
                transaction: index,
                acquired: txn.date,
                units: txn.units,
                cost: txn.amount.unwrap_or_default().abs(),
                remaining: txn.units,
                disposals: Vec::new(),
            }),
            TransactionType::StampDuty => {
                if let Some(lot) = queue.acquired_on(txn.date) {
                    lot.cost += txn.amount.unwrap_or_default().abs();
                }
            }
            TransactionType::Reversal => queue.reverse(txn.units.abs()),
            kind if kind.is_disposal() => {
                let matched = dispose(&mut queue, index, txn, scheme, config)?;
                if year.contains(txn.date) {
                    entries.extend(matched);
                }
            }
            _ => {}
        }
    }

    tracing::debug!(
        scheme = %scheme.name,
        year = %year.label,
        entries = entries.len(),
        "computed scheme gains"
    );

    Ok(GainsReport {
        folio: folio.to_string(),
        scheme: scheme.name.clone(),
        isin: scheme.isin.clone(),
        financial_year: year.label.clone(),
        entries,
        lots: queue.lots,
    })
}

/// Matches one disposal against the oldest lots, splitting the last one touched.
fn dispose(
    queue: &mut LotQueue,
    index: usize,
    txn: &Transaction,
    scheme: &Scheme,
    config: &GainsConfig,
) -> Result<Vec<GainEntry>, GainsError> {
    let sold_units = txn.units.abs();
    let available = queue.available();
    if sold_units > available + config.tolerance {
        return Err(GainsError::InsufficientUnits {
            scheme: scheme.name.clone(),
            date: txn.date,
            needed: sold_units,
            available,
        });
    }

    let proceeds = txn
        .amount
        .map_or_else(|| txn.nav.unwrap_or_default() * sold_units, |amount| amount.abs());
    let nav_at_cutoff = scheme
        .isin
        .as_ref()
        .and_then(|isin| config.fair_values.get(isin))
        .copied();

    let mut left = sold_units;
    let mut entries = Vec::new();
    while left > Units::ZERO {
        let Some(lot) = queue.front_mut() else {
            break;
        };
        let take = left.min(lot.remaining);
        let purchase_value = lot.cost_of(take);
        let sale_value = proceeds * take / sold_units;
        lot.remaining -= take;
        lot.disposals.push(index);
        left -= take;

        let term = if (txn.date - lot.acquired).num_days() > config.long_term_days {
            GainTerm::LongTerm
        } else {
            GainTerm::ShortTerm
        };
        let fair_value = nav_at_cutoff
            .filter(|_| lot.acquired <= config.grandfather_cutoff)
            .map(|nav| nav * take);
        let cost_basis = match fair_value {
            Some(fmv) if term == GainTerm::LongTerm => purchase_value.max(fmv.min(sale_value)),
            _ => purchase_value,
        };

        entries.push(GainEntry {
            disposal: index,
            lot: lot.transaction,
            acquired: lot.acquired,
            sold: txn.date,
            units: take,
            purchase_value,
            fair_value,
            cost_basis,
            sale_value,
            gain: sale_value - cost_basis,
            term,
        });
    }
    Ok(entries)
}
