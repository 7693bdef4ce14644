#![warn(missing_docs)]
//! Parser for mutual-fund Consolidated Account Statements (CAMS, KFintech, NSDL):
//! layout detection, investor header, folio/scheme/transaction walk,
//! balance reconciliation and FIFO capital gains.

mod classifier;
mod dialect;
mod error;
pub mod export;
pub mod gains;
mod investor;
mod reconcile;
mod statement;
mod text;
mod types;
mod utils;
mod walker;

pub use crate::classifier::{classify, classify_cas_type};
pub use crate::dialect::{Action, Dialect, Rule};
pub use crate::error::{ExtractError, GainsError, ParseError};
pub use crate::gains::{
    FinancialYear, GainEntry, GainTerm, GainsConfig, GainsLot, GainsReport, Schedule112aRow,
    compute_all_gains, compute_gains,
};
pub use crate::investor::extract_investor_info;
pub use crate::reconcile::{
    BalanceDrift, MismatchKind, ReconciliationSummary, SchemeMismatch, UNIT_TOLERANCE, validate,
    validate_with_tolerance,
};
pub use crate::statement::{StatementBuilder, classify_and_parse};
pub use crate::text::{Block, CELL_SEPARATOR, Line, Page, PageDumpExtractor, PdfExtractor, Rect, Span};
pub use crate::types::*;
pub use crate::walker::{WalkOutput, WalkState, Walker};
