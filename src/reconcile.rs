//! Cross-checks declared balances against parsed transactions.

use std::fmt;

use crate::types::{CasType, Scheme, StatementDocument, Units};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Default tolerance on unit balances.
pub const UNIT_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 3);

/// Why a scheme failed reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MismatchKind {
    /// Declared close differs from open plus transactions.
    ClosingBalance {
        /// Closing units printed by the registrar.
        declared: Units,
        /// Opening units plus every transaction's units.
        computed: Units,
    },
    /// The scheme has no closing row.
    MissingClose {
        /// Opening units plus every transaction's units.
        computed: Units,
    },
}

/// A scheme that failed reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemeMismatch {
    /// Folio number.
    pub folio: String,
    /// Scheme name.
    pub scheme: String,
    /// ISIN.
    pub isin: Option<String>,
    /// Mismatch detail.
    pub kind: MismatchKind,
}

impl fmt::Display for SchemeMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            MismatchKind::ClosingBalance { declared, computed } => write!(
                f,
                "{} / {}: declared close {declared} vs computed {computed}",
                self.folio, self.scheme
            ),
            MismatchKind::MissingClose { computed } => write!(
                f,
                "{} / {}: no closing balance, computed {computed}",
                self.folio, self.scheme
            ),
        }
    }
}

/// A transaction whose stated running balance disagrees with the running sum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceDrift {
    /// Folio number.
    pub folio: String,
    /// Scheme name.
    pub scheme: String,
    /// Index of the transaction in the scheme.
    pub transaction: usize,
    /// Balance printed by the registrar.
    pub stated: Units,
    /// Running sum up to and including the transaction.
    pub computed: Units,
}

/// Matched/error tallies over accounts and schemes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationSummary {
    /// Folios whose every scheme matched.
    pub matched_accounts: usize,
    /// Folios with at least one mismatched scheme.
    pub error_accounts: usize,
    /// Schemes within tolerance.
    pub matched_schemes: usize,
    /// Schemes out of tolerance or without a close.
    pub error_schemes: usize,
    /// Itemized scheme mismatches.
    pub mismatches: Vec<SchemeMismatch>,
    /// Running-balance disagreements; informational only.
    pub balance_drifts: Vec<BalanceDrift>,
    /// Set for holdings-only statements, which carry nothing to reconcile.
    #[serde(default)]
    pub skipped: bool,
}

impl ReconciliationSummary {
    /// True when every scheme matched.
    pub const fn is_clean(&self) -> bool {
        self.error_schemes == 0
    }
}

impl fmt::Display for ReconciliationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.skipped {
            return write!(f, "Skipped : summary statement, no transactions to reconcile");
        }
        writeln!(f, "Matched : {} accounts", self.matched_accounts)?;
        writeln!(f, "Error   : {} accounts", self.error_accounts)?;
        writeln!(f, "Matched : {} schemes", self.matched_schemes)?;
        write!(f, "Error   : {} schemes", self.error_schemes)
    }
}

/// Validates a document with [`UNIT_TOLERANCE`].
pub fn validate(document: &StatementDocument) -> ReconciliationSummary {
    validate_with_tolerance(document, UNIT_TOLERANCE)
}

/// Validates a document with a custom unit tolerance.
pub fn validate_with_tolerance(
    document: &StatementDocument,
    tolerance: Decimal,
) -> ReconciliationSummary {
    let mut summary = ReconciliationSummary::default();
    if document.cas_type == CasType::Summary {
        tracing::debug!("summary statement, reconciliation skipped");
        summary.skipped = true;
        return summary;
    }

    for folio in &document.folios {
        let mut folio_ok = true;
        for scheme in &folio.schemes {
            summary
                .balance_drifts
                .extend(balance_drifts(&folio.folio, scheme, tolerance));

            match check_scheme(scheme, tolerance) {
                None => summary.matched_schemes += 1,
                Some(kind) => {
                    folio_ok = false;
                    summary.error_schemes += 1;
                    let mismatch = SchemeMismatch {
                        folio: folio.folio.clone(),
                        scheme: scheme.name.clone(),
                        isin: scheme.isin.clone(),
                        kind,
                    };
                    tracing::warn!(%mismatch, "scheme failed reconciliation");
                    summary.mismatches.push(mismatch);
                }
            }
        }
        if folio_ok {
            summary.matched_accounts += 1;
        } else {
            summary.error_accounts += 1;
        }
    }

    summary
}

/// `None` when the scheme reconciles.
fn check_scheme(scheme: &Scheme, tolerance: Decimal) -> Option<MismatchKind> {
    let computed = scheme.computed_close();
    match scheme.close {
        None => Some(MismatchKind::MissingClose { computed }),
        Some(declared) if (declared - computed).abs() > tolerance => {
            Some(MismatchKind::ClosingBalance { declared, computed })
        }
        Some(_) => None,
    }
}

fn balance_drifts(folio: &str, scheme: &Scheme, tolerance: Decimal) -> Vec<BalanceDrift> {
    let mut running = scheme.open;
    let mut drifts = Vec::new();
    for (index, txn) in scheme.transactions.iter().enumerate() {
        running += txn.units;
        if let Some(stated) = txn.balance {
            if (stated - running).abs() > tolerance {
                drifts.push(BalanceDrift {
                    folio: folio.to_string(),
                    scheme: scheme.name.clone(),
                    transaction: index,
                    stated,
                    computed: running,
                });
            }
        }
    }
    drifts
}
