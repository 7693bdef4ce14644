//! JSON, CSV and plain-text output of parsed statements and gains.

use std::io::{Read, Write};

use csv::{ReaderBuilder, WriterBuilder};
use serde::{Deserialize, Serialize};

use crate::error::ParseError;
use crate::gains::{GainTerm, GainsReport, Schedule112aRow};
use crate::types::{CasType, Folio, Scheme, StatementDocument, Transaction, TransactionType};
use crate::utils::{parse_date, parse_decimal, parse_decimal_opt};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Writes the document as pretty-printed JSON.
pub fn write_json<W: Write>(writer: W, document: &StatementDocument) -> Result<(), ParseError> {
    serde_json::to_writer_pretty(writer, document)?;
    Ok(())
}

/// Reads a document written by [`write_json`].
pub fn read_json<R: Read>(reader: R) -> Result<StatementDocument, ParseError> {
    Ok(serde_json::from_reader(reader)?)
}

#[derive(Serialize, Deserialize)]
struct CsvTransaction {
    folio: String,
    amc: Option<String>,
    pan: Option<String>,
    scheme: String,
    isin: Option<String>,
    rta_code: Option<String>,
    advisor: Option<String>,
    registrar: Option<String>,
    open: String,
    close: Option<String>,
    date: String,
    description: String,
    amount: Option<String>,
    units: String,
    nav: Option<String>,
    balance: Option<String>,
    kind: TransactionType,
}

impl CsvTransaction {
    fn new(folio: &Folio, scheme: &Scheme, txn: &Transaction) -> Self {
        Self {
            folio: folio.folio.clone(),
            amc: folio.amc.clone(),
            pan: folio.pan.clone(),
            scheme: scheme.name.clone(),
            isin: scheme.isin.clone(),
            rta_code: scheme.rta_code.clone(),
            advisor: scheme.advisor.clone(),
            registrar: scheme.registrar.clone(),
            open: scheme.open.to_string(),
            close: scheme.close.map(|v| v.to_string()),
            date: txn.date.format(DATE_FORMAT).to_string(),
            description: txn.description.clone(),
            amount: txn.amount.map(|v| v.to_string()),
            units: txn.units.to_string(),
            nav: txn.nav.map(|v| v.to_string()),
            balance: txn.balance.map(|v| v.to_string()),
            kind: txn.kind,
        }
    }

    fn scheme(&self) -> Result<Scheme, ParseError> {
        let mut scheme = Scheme::new(self.scheme.clone());
        scheme.isin.clone_from(&self.isin);
        scheme.rta_code.clone_from(&self.rta_code);
        scheme.advisor.clone_from(&self.advisor);
        scheme.registrar.clone_from(&self.registrar);
        scheme.open = parse_decimal(&self.open, "open")?;
        scheme.close = parse_decimal_opt(self.close.as_deref(), "close")?;
        Ok(scheme)
    }

    fn transaction(self) -> Result<Transaction, ParseError> {
        Ok(Transaction {
            date: parse_date(&self.date, DATE_FORMAT)?,
            amount: parse_decimal_opt(self.amount.as_deref(), "amount")?,
            units: parse_decimal(&self.units, "units")?,
            nav: parse_decimal_opt(self.nav.as_deref(), "nav")?,
            balance: parse_decimal_opt(self.balance.as_deref(), "balance")?,
            description: self.description,
            kind: self.kind,
        })
    }
}

#[derive(Serialize)]
struct CsvHolding<'a> {
    folio: &'a str,
    amc: Option<&'a str>,
    scheme: &'a str,
    isin: Option<&'a str>,
    rta_code: Option<&'a str>,
    registrar: Option<&'a str>,
    units: Option<String>,
    date: Option<String>,
    nav: Option<String>,
    value: Option<String>,
    cost: Option<String>,
}

/// Writes one CSV row per transaction with its folio and scheme.
///
/// Summary statements have no transactions and get one row per holding instead.
pub fn write_csv<W: Write>(writer: W, document: &StatementDocument) -> Result<(), ParseError> {
    let mut wrt = WriterBuilder::new().from_writer(writer);
    if document.cas_type == CasType::Summary {
        for (folio, scheme) in document.schemes() {
            let valuation = scheme.valuation.as_ref();
            wrt.serialize(CsvHolding {
                folio: &folio.folio,
                amc: folio.amc.as_deref(),
                scheme: &scheme.name,
                isin: scheme.isin.as_deref(),
                rta_code: scheme.rta_code.as_deref(),
                registrar: scheme.registrar.as_deref(),
                units: scheme.close.map(|v| v.to_string()),
                date: valuation.map(|v| v.date.format(DATE_FORMAT).to_string()),
                nav: valuation.map(|v| v.nav.to_string()),
                value: valuation.map(|v| v.value.to_string()),
                cost: valuation.and_then(|v| v.cost).map(|v| v.to_string()),
            })?;
        }
        wrt.flush()?;
        return Ok(());
    }
    for (folio, scheme) in document.schemes() {
        for txn in &scheme.transactions {
            wrt.serialize(CsvTransaction::new(folio, scheme, txn))?;
        }
    }
    wrt.flush()?;
    Ok(())
}

/// Rebuilds folios from rows written by [`write_csv`].
///
/// Schemes without transactions are not represented in the CSV.
pub fn read_csv<R: Read>(reader: R) -> Result<Vec<Folio>, ParseError> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(reader);
    let mut folios: Vec<Folio> = Vec::new();

    for record in rdr.deserialize::<CsvTransaction>() {
        let row = record?;
        let folio = match folios.iter().position(|f| f.folio == row.folio) {
            Some(index) => &mut folios[index],
            None => {
                let mut folio = Folio::new(row.folio.clone());
                folio.amc.clone_from(&row.amc);
                folio.pan.clone_from(&row.pan);
                folios.push(folio);
                let last = folios.len() - 1;
                &mut folios[last]
            }
        };
        let same_scheme = folio
            .schemes
            .last()
            .is_some_and(|s| s.name == row.scheme && s.isin == row.isin);
        if !same_scheme {
            folio.schemes.push(row.scheme()?);
        }
        let txn = row.transaction()?;
        if let Some(scheme) = folio.schemes.last_mut() {
            scheme.transactions.push(txn);
        }
    }
    Ok(folios)
}

/// Writes the document as an indented text tree.
pub fn write_text<W: Write>(mut writer: W, document: &StatementDocument) -> Result<(), ParseError> {
    let investor = &document.investor;
    writeln!(writer, "Investor : {}", investor.name)?;
    if let Some(pan) = &investor.pan {
        writeln!(writer, "PAN      : {pan}")?;
    }
    if let Some(email) = &investor.email {
        writeln!(writer, "Email    : {email}")?;
    }
    if let Some(period) = document.statement_period {
        writeln!(writer, "Period   : {} to {}", period.from, period.to)?;
    }
    writeln!(writer, "Layout   : {:?} ({:?})", document.file_type, document.cas_type)?;

    for folio in &document.folios {
        writeln!(writer)?;
        match &folio.amc {
            Some(amc) => writeln!(writer, "Folio {} ({amc})", folio.folio)?,
            None => writeln!(writer, "Folio {}", folio.folio)?,
        }
        for scheme in &folio.schemes {
            match &scheme.isin {
                Some(isin) => writeln!(writer, "  {} [{isin}]", scheme.name)?,
                None => writeln!(writer, "  {}", scheme.name)?,
            }
            writeln!(writer, "    Open  : {}", scheme.open)?;
            for txn in &scheme.transactions {
                let amount = txn.amount.map(|v| v.to_string()).unwrap_or_default();
                writeln!(
                    writer,
                    "    {}  {:<40}  {:>14}  {:>12}  {:?}",
                    txn.date.format(DATE_FORMAT),
                    txn.description,
                    amount,
                    txn.units,
                    txn.kind
                )?;
            }
            match scheme.close {
                Some(close) => writeln!(writer, "    Close : {close}")?,
                None => writeln!(writer, "    Close : -")?,
            }
            if let Some(valuation) = &scheme.valuation {
                writeln!(
                    writer,
                    "    Value : {} @ {} on {}",
                    valuation.value, valuation.nav, valuation.date
                )?;
            }
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct CsvGain<'a> {
    folio: &'a str,
    scheme: &'a str,
    isin: Option<&'a str>,
    financial_year: &'a str,
    acquired: String,
    sold: String,
    units: String,
    purchase_value: String,
    fair_value: Option<String>,
    cost_basis: String,
    sale_value: String,
    gain: String,
    term: &'static str,
}

/// Writes one CSV row per gain entry across reports.
pub fn write_gains_csv<W: Write>(writer: W, reports: &[GainsReport]) -> Result<(), ParseError> {
    let mut wrt = WriterBuilder::new().from_writer(writer);
    for report in reports {
        for entry in &report.entries {
            wrt.serialize(CsvGain {
                folio: &report.folio,
                scheme: &report.scheme,
                isin: report.isin.as_deref(),
                financial_year: &report.financial_year,
                acquired: entry.acquired.format(DATE_FORMAT).to_string(),
                sold: entry.sold.format(DATE_FORMAT).to_string(),
                units: entry.units.to_string(),
                purchase_value: entry.purchase_value.round_dp(2).to_string(),
                fair_value: entry.fair_value.map(|v| v.round_dp(2).to_string()),
                cost_basis: entry.cost_basis.round_dp(2).to_string(),
                sale_value: entry.sale_value.round_dp(2).to_string(),
                gain: entry.gain.round_dp(2).to_string(),
                term: match entry.term {
                    GainTerm::LongTerm => "LTCG",
                    GainTerm::ShortTerm => "STCG",
                },
            })?;
        }
    }
    wrt.flush()?;
    Ok(())
}

#[derive(Serialize)]
struct Csv112a<'a> {
    share_or_unit_acquired: &'static str,
    isin: &'a str,
    name: &'a str,
    units: String,
    sale_price_per_unit: String,
    full_value_of_consideration: String,
    cost_without_indexation: String,
    cost_of_acquisition: String,
    fair_value_per_unit: Option<String>,
    total_fair_value: Option<String>,
    balance: String,
}

/// Writes schedule 112A rows in filing column order.
pub fn write_112a_csv<W: Write>(writer: W, rows: &[Schedule112aRow]) -> Result<(), ParseError> {
    let mut wrt = WriterBuilder::new().from_writer(writer);
    for row in rows {
        wrt.serialize(Csv112a {
            share_or_unit_acquired: if row.acquired_before_cutoff { "BE" } else { "AE" },
            isin: &row.isin,
            name: &row.scheme,
            units: row.units.to_string(),
            sale_price_per_unit: row.sale_price.to_string(),
            full_value_of_consideration: row.consideration.round_dp(2).to_string(),
            cost_without_indexation: row.actual_cost.round_dp(2).to_string(),
            cost_of_acquisition: row.cost_of_acquisition.round_dp(2).to_string(),
            fair_value_per_unit: row.fair_value_per_unit.map(|v| v.to_string()),
            total_fair_value: row.fair_value.map(|v| v.round_dp(2).to_string()),
            balance: row.balance.round_dp(2).to_string(),
        })?;
    }
    wrt.flush()?;
    Ok(())
}
