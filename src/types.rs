//! Domain types for a parsed statement: investor, folios, schemes, transactions.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Currency amount, `Decimal` for exact arithmetic.
pub type Money = Decimal;

/// Unit quantity, `Decimal` for exact reconciliation.
pub type Units = Decimal;

/// Statement layout that produced the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileType {
    /// Registrar statement generated by CAMS.
    Cams,
    /// Registrar statement generated by KFintech.
    Kfintech,
    /// Depository statement generated by NSDL.
    Nsdl,
    /// No known layout matched.
    Unknown,
}

/// Detailed statements list transactions; summary statements list holdings only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CasType {
    /// Transactions with opening and closing balances per scheme.
    #[default]
    Detailed,
    /// Closing units and valuation per scheme, no transactions.
    Summary,
}

/// Period covered by the statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementPeriod {
    /// First day of the period.
    pub from: NaiveDate,
    /// Last day of the period.
    pub to: NaiveDate,
}

/// Investor identity from the statement header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvestorInfo {
    /// Investor name.
    pub name: String,
    /// Email address.
    pub email: Option<String>,
    /// Postal address, one line per address line.
    pub address: Option<String>,
    /// PAN.
    pub pan: Option<String>,
    /// Mobile number.
    pub mobile: Option<String>,
}

/// Transaction kind derived from the registrar description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionType {
    /// Lump-sum purchase.
    Purchase,
    /// Systematic (SIP) purchase.
    PurchaseSip,
    /// Redemption.
    Redemption,
    /// Units switched in from another scheme.
    SwitchIn,
    /// Units switched out to another scheme.
    SwitchOut,
    /// Dividend (IDCW) paid out.
    DividendPayout,
    /// Dividend (IDCW) reinvested as units.
    DividendReinvest,
    /// Units allotted from a segregated portfolio.
    Segregation,
    /// Stamp duty charged on a purchase.
    StampDuty,
    /// STT, TDS or other tax deduction.
    Tax,
    /// Reversal or rejection of an earlier purchase.
    Reversal,
    /// Anything else.
    Unknown,
}

impl TransactionType {
    /// Classifies a transaction from its description and the sign of its units.
    pub fn classify(description: &str, units: Units) -> Self {
        let lower = description.to_lowercase();
        if units.is_zero() {
            if lower.contains("stamp") {
                Self::StampDuty
            } else if lower.contains("stt") || lower.contains("tds") || lower.contains("tax") {
                Self::Tax
            } else if lower.contains("dividend") || lower.contains("idcw") {
                Self::DividendPayout
            } else {
                Self::Unknown
            }
        } else if units.is_sign_positive() {
            if lower.contains("switch") {
                Self::SwitchIn
            } else if lower.contains("segregat") {
                Self::Segregation
            } else if lower.contains("reinvest") {
                Self::DividendReinvest
            } else if lower.contains("systematic") || lower.contains("sip") {
                Self::PurchaseSip
            } else {
                Self::Purchase
            }
        } else if lower.contains("reversal") || lower.contains("rejection") {
            Self::Reversal
        } else if lower.contains("switch") {
            Self::SwitchOut
        } else {
            Self::Redemption
        }
    }

    /// Adds units to the holding at a cost.
    pub const fn is_acquisition(self) -> bool {
        matches!(
            self,
            Self::Purchase
                | Self::PurchaseSip
                | Self::SwitchIn
                | Self::DividendReinvest
                | Self::Segregation
        )
    }

    /// Removes units from the holding for proceeds.
    pub const fn is_disposal(self) -> bool {
        matches!(self, Self::Redemption | Self::SwitchOut)
    }
}

/// One dated entry posted against a scheme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Posting date.
    pub date: NaiveDate,
    /// Registrar description with whitespace normalized.
    pub description: String,
    /// Signed amount, absent for non-financial entries.
    pub amount: Option<Money>,
    /// Signed unit delta, zero for entries without units.
    pub units: Units,
    /// NAV used for the entry.
    pub nav: Option<Money>,
    /// Running unit balance stated by the registrar.
    pub balance: Option<Units>,
    /// Classified kind.
    pub kind: TransactionType,
}

/// Scheme valuation at the end of the statement period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Valuation {
    /// Valuation date.
    pub date: NaiveDate,
    /// NAV on that date.
    pub nav: Money,
    /// Market value of the closing units.
    pub value: Money,
    /// Cost value, when stated.
    pub cost: Option<Money>,
}

/// A mutual-fund scheme held under a folio.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scheme {
    /// Scheme name.
    pub name: String,
    /// ISIN.
    pub isin: Option<String>,
    /// Registrar scheme code.
    pub rta_code: Option<String>,
    /// Advisor or broker code.
    pub advisor: Option<String>,
    /// Registrar servicing the scheme.
    pub registrar: Option<String>,
    /// Declared opening units.
    pub open: Units,
    /// Declared closing units.
    pub close: Option<Units>,
    /// Closing valuation.
    pub valuation: Option<Valuation>,
    /// Transactions in document order.
    pub transactions: Vec<Transaction>,
}

impl Scheme {
    /// Creates an empty scheme with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            isin: None,
            rta_code: None,
            advisor: None,
            registrar: None,
            open: Units::ZERO,
            close: None,
            valuation: None,
            transactions: Vec::new(),
        }
    }

    /// Opening units plus every transaction's unit delta.
    pub fn computed_close(&self) -> Units {
        self.transactions
            .iter()
            .fold(self.open, |acc, txn| acc + txn.units)
    }
}

/// An account under which schemes are registered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folio {
    /// Folio number.
    pub folio: String,
    /// AMC the folio belongs to.
    pub amc: Option<String>,
    /// PAN linked to the folio.
    pub pan: Option<String>,
    /// KYC status flag.
    pub kyc: Option<bool>,
    /// PAN verification flag.
    pub pan_kyc: Option<bool>,
    /// Schemes in document order.
    pub schemes: Vec<Scheme>,
}

impl Folio {
    /// Creates an empty folio.
    pub fn new(folio: impl Into<String>) -> Self {
        Self {
            folio: folio.into(),
            amc: None,
            pan: None,
            kyc: None,
            pan_kyc: None,
            schemes: Vec::new(),
        }
    }
}

/// Kind of a structural finding recorded while walking the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticKind {
    /// A structural row appeared without its parent folio or scheme and was dropped.
    OrphanLine,
    /// A row was appended to the previous transaction's description.
    ContinuationJoin,
    /// A row was appended to the current scheme's name.
    SchemeNameJoin,
    /// A folio header repeated an earlier folio number.
    DuplicateFolio,
}

/// A non-fatal finding tied to a text row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// 1-based row number in the document text stream.
    pub line: usize,
    /// Finding kind.
    pub kind: DiagnosticKind,
    /// Row text.
    pub text: String,
}

/// Findings collected by the structural walker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics {
    /// Itemized findings in document order.
    pub entries: Vec<Diagnostic>,
    /// Rows outside any folio or scheme that were skipped.
    pub skipped_lines: usize,
}

impl Diagnostics {
    /// Number of findings of a kind.
    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.entries.iter().filter(|d| d.kind == kind).count()
    }
}

/// Root of a parsed statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementDocument {
    /// Layout that produced the document.
    pub file_type: FileType,
    /// Detailed or holdings-only statement.
    #[serde(default)]
    pub cas_type: CasType,
    /// Investor identity.
    pub investor: InvestorInfo,
    /// Folios in document order.
    pub folios: Vec<Folio>,
    /// Statement period.
    pub statement_period: Option<StatementPeriod>,
    /// Walker findings.
    pub diagnostics: Diagnostics,
}

impl StatementDocument {
    /// True when no folio was recovered.
    pub fn is_incomplete(&self) -> bool {
        self.folios.is_empty()
    }

    /// Iterates every scheme with its folio.
    pub fn schemes(&self) -> impl Iterator<Item = (&Folio, &Scheme)> {
        self.folios
            .iter()
            .flat_map(|folio| folio.schemes.iter().map(move |scheme| (folio, scheme)))
    }

    /// Total number of transactions across all schemes.
    pub fn transaction_count(&self) -> usize {
        self.schemes().map(|(_, s)| s.transactions.len()).sum()
    }
}
