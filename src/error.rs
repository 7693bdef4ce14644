//! Errors raised while extracting, parsing and computing gains on a statement.

use chrono::NaiveDate;
use rust_decimal::Decimal;

/// Failure reported by the PDF rendering collaborator.
#[derive(thiserror::Error, Debug)]
pub enum ExtractError {
    /// The document is encrypted and the password was rejected.
    #[error("Incorrect PDF password!")]
    IncorrectPassword,
    /// The document could not be read at all.
    #[error("Corrupt document: {0}")]
    Corrupt(String),
}

/// Fatal error while parsing a statement.
#[derive(thiserror::Error, Debug)]
pub enum ParseError {
    /// I/O error while reading or writing a file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The password was rejected by the renderer.
    #[error("Incorrect PDF password!")]
    IncorrectPassword,
    /// The renderer could not read the document.
    #[error("Unable to read document: {0}")]
    Extract(String),
    /// None of the known statement layouts matched.
    #[error("Unknown statement layout")]
    UnknownLayout,
    /// The header region of the first page yielded no investor identity.
    #[error("Unable to parse investor data")]
    InvestorInfo,
    /// Invalid decimal value.
    #[error("Invalid number '{value}' in column '{column}'")]
    Number {
        /// Offending text.
        value: String,
        /// Column the value was read from.
        column: &'static str,
    },
    /// Invalid date.
    #[error("Invalid date '{value}'")]
    Date {
        /// Offending text.
        value: String,
    },
    /// JSON (de)serialization failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// CSV (de)serialization failure.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl From<ExtractError> for ParseError {
    fn from(err: ExtractError) -> Self {
        match err {
            ExtractError::IncorrectPassword => Self::IncorrectPassword,
            ExtractError::Corrupt(reason) => Self::Extract(reason),
        }
    }
}

/// Error while computing capital gains.
#[derive(thiserror::Error, Debug)]
pub enum GainsError {
    /// The statement does not carry a complete, reconciled history.
    #[error("CAS is incomplete!")]
    IncompleteCas,
    /// Financial year label is not of the form `FYyyyy-yy`.
    #[error("Invalid financial year '{0}', expected FYyyyy-yy")]
    FinancialYear(String),
    /// No folio with this number.
    #[error("Folio '{0}' not found")]
    FolioNotFound(String),
    /// No scheme with this ISIN or name inside the folio.
    #[error("Scheme '{scheme}' not found in folio '{folio}'")]
    SchemeNotFound {
        /// Folio number.
        folio: String,
        /// Requested ISIN or name.
        scheme: String,
    },
    /// A disposal consumed more units than were acquired before it.
    #[error("Insufficient units in '{scheme}' on {date}: need {needed}, have {available}")]
    InsufficientUnits {
        /// Scheme name.
        scheme: String,
        /// Disposal date.
        date: NaiveDate,
        /// Units disposed.
        needed: Decimal,
        /// Units still held in lots.
        available: Decimal,
    },
    /// Reading the fair-value table failed.
    #[error("Fair value table error: {0}")]
    FairValues(String),
}
