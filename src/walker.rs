//! Dialect-agnostic state machine recovering folios, schemes and transactions
//! from the ordered row stream of a statement.

use crate::dialect::{Action, Dialect};
use crate::error::ParseError;
use crate::text::CELL_SEPARATOR;
use crate::types::{
    Diagnostic, DiagnosticKind, Diagnostics, Folio, Scheme, StatementPeriod, Transaction,
    TransactionType, Units, Valuation,
};
use crate::utils::{normalize_chars, parse_date, parse_decimal, parse_decimal_opt};
use regex::Captures;

/// Position of the walker inside the statement structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkState {
    /// Before the first folio, or after an AMC header.
    SeekingFolio,
    /// After a folio row, before its first scheme.
    InFolioHeader,
    /// Between schemes of a folio.
    SeekingScheme,
    /// After a scheme row, before its first transaction.
    InSchemeHeader,
    /// Reading transactions.
    InTransactionBlock,
    /// After a scheme's closing row.
    SchemeSummary,
    /// Past the end marker.
    DocumentEnd,
}

/// Output of a completed walk.
#[derive(Debug, Clone)]
pub struct WalkOutput {
    /// Recovered folios.
    pub folios: Vec<Folio>,
    /// Statement period, when printed.
    pub period: Option<StatementPeriod>,
    /// Findings collected on the way.
    pub diagnostics: Diagnostics,
}

/// Linear scan over statement rows, parameterized by a dialect table.
pub struct Walker<'d> {
    dialect: &'d Dialect,
    state: WalkState,
    folios: Vec<Folio>,
    current: Option<usize>,
    amc: Option<String>,
    period: Option<StatementPeriod>,
    pending_head: Option<String>,
    diagnostics: Diagnostics,
    line_no: usize,
}

impl<'d> Walker<'d> {
    /// Creates a walker for one document.
    pub const fn new(dialect: &'d Dialect) -> Self {
        Self {
            dialect,
            state: WalkState::SeekingFolio,
            folios: Vec::new(),
            current: None,
            amc: None,
            period: None,
            pending_head: None,
            diagnostics: Diagnostics {
                entries: Vec::new(),
                skipped_lines: 0,
            },
            line_no: 0,
        }
    }

    /// Current state.
    pub const fn state(&self) -> WalkState {
        self.state
    }

    /// Consumes every row and returns the recovered structure.
    pub fn walk<I, S>(mut self, rows: I) -> Result<WalkOutput, ParseError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for row in rows {
            self.feed(row.as_ref())?;
        }
        if self.folios.is_empty() {
            tracing::warn!("no folios recovered from statement text");
        }
        Ok(WalkOutput {
            folios: self.folios,
            period: self.period,
            diagnostics: self.diagnostics,
        })
    }

    /// Processes one row.
    pub fn feed(&mut self, row: &str) -> Result<(), ParseError> {
        self.line_no += 1;
        let row = row.trim();
        if row.is_empty() {
            return Ok(());
        }
        if self.state == WalkState::DocumentEnd {
            self.diagnostics.skipped_lines += 1;
            return Ok(());
        }

        let dialect = self.dialect;
        let Some((action, caps)) = dialect.recognize(row) else {
            self.unmatched(row);
            return Ok(());
        };
        if action != Action::Scheme {
            self.pending_head = None;
        }

        match action {
            Action::Period => self.on_period(&caps)?,
            Action::Amc => {
                self.amc = Some(normalize_chars(caps["amc"].chars()));
                self.current = None;
                self.state = WalkState::SeekingFolio;
            }
            Action::Folio => self.on_folio(row, &caps),
            Action::Pan => {
                if let Some(folio) = self.folio_mut() {
                    folio.pan = Some(caps["pan"].to_string());
                    self.leave_folio_header();
                }
            }
            Action::Scheme => self.on_scheme(row, &caps),
            Action::Isin => {
                if let Some(scheme) = self.header_scheme(row) {
                    scheme.isin = Some(caps["isin"].to_string());
                    if let Some(advisor) = caps.name("advisor") {
                        scheme.advisor = Some(advisor.as_str().trim().to_string());
                    }
                }
            }
            Action::Registrar => {
                if let Some(scheme) = self.header_scheme(row) {
                    scheme.registrar = Some(caps["rta"].to_string());
                }
            }
            Action::OpenUnits => {
                let open = parse_decimal(&caps["units"], "opening units")?;
                if let Some(scheme) = self.header_scheme(row) {
                    scheme.open = open;
                    self.state = WalkState::InTransactionBlock;
                }
            }
            Action::Transaction => self.on_transaction(row, &caps)?,
            Action::Summary => self.on_summary(row, &caps)?,
            Action::Holding => self.on_holding(&caps)?,
            Action::Ignore => self.diagnostics.skipped_lines += 1,
            Action::End => {
                tracing::debug!(line = self.line_no, "reached end of statement body");
                self.state = WalkState::DocumentEnd;
            }
        }
        Ok(())
    }

    fn on_period(&mut self, caps: &Captures) -> Result<(), ParseError> {
        if self.period.is_none() {
            let format = self.dialect.date_format;
            let from = parse_date(&caps["from"], format)?;
            // Summary statements print a single "as on" date.
            let to = match caps.name("to") {
                Some(to) => parse_date(to.as_str(), format)?,
                None => from,
            };
            self.period = Some(StatementPeriod { from, to });
        }
        Ok(())
    }

    fn on_folio(&mut self, row: &str, caps: &Captures) {
        let number: String = caps["folio"].chars().filter(|c| !c.is_whitespace()).collect();
        let flag = |re: &regex::Regex| {
            re.captures(row)
                .map(|c| normalize_chars(c[1].chars()).eq_ignore_ascii_case("OK"))
        };
        let kyc = flag(&self.dialect.kyc);
        let pan_kyc = flag(&self.dialect.pan_kyc);
        let pan = self
            .dialect
            .folio_pan
            .captures(row)
            .map(|c| c["pan"].to_string());

        let (index, seen) = self.folio_index(number);
        if seen {
            self.diagnose(DiagnosticKind::DuplicateFolio, row);
        }

        let folio = &mut self.folios[index];
        folio.kyc = kyc.or(folio.kyc);
        folio.pan_kyc = pan_kyc.or(folio.pan_kyc);
        if pan.is_some() {
            folio.pan = pan;
        }
        tracing::debug!(folio = %folio.folio, "entered folio");
        self.current = Some(index);
        self.state = WalkState::InFolioHeader;
    }

    /// Position of the folio with this number, creating it under the current AMC.
    fn folio_index(&mut self, number: String) -> (usize, bool) {
        if let Some(index) = self.folios.iter().position(|f| f.folio == number) {
            return (index, true);
        }
        let mut folio = Folio::new(number);
        folio.amc.clone_from(&self.amc);
        self.folios.push(folio);
        (self.folios.len() - 1, false)
    }

    fn on_scheme(&mut self, row: &str, caps: &Captures) {
        if self.current.is_none() {
            self.orphan(row);
            return;
        }

        // A head printed on the previous row is glued back before re-matching.
        let joined = self.pending_head.take().map(|head| format!("{head} {row}"));
        let rematched = joined
            .as_deref()
            .and_then(|text| self.dialect.recognize(text))
            .filter(|(action, _)| *action == Action::Scheme);
        let caps = match &rematched {
            Some((_, joined_caps)) => {
                self.diagnose(DiagnosticKind::SchemeNameJoin, row);
                joined_caps
            }
            None => caps,
        };

        let mut scheme = Scheme::new(normalize_chars(caps["name"].chars()));
        scheme.rta_code = caps.name("code").map(|m| m.as_str().to_string());
        scheme.isin = caps.name("isin").map(|m| m.as_str().to_string());
        scheme.advisor = caps.name("advisor").map(|m| m.as_str().trim().to_string());
        scheme.registrar = caps.name("rta").map(|m| m.as_str().to_string());
        tracing::debug!(scheme = %scheme.name, "entered scheme");

        if let Some(folio) = self.folio_mut() {
            folio.schemes.push(scheme);
        }
        self.state = WalkState::InSchemeHeader;
    }

    fn on_transaction(&mut self, row: &str, caps: &Captures) -> Result<(), ParseError> {
        if !matches!(
            self.state,
            WalkState::InSchemeHeader | WalkState::InTransactionBlock
        ) {
            self.orphan(row);
            return Ok(());
        }

        let description = normalize_chars(caps["desc"].chars());
        let units = parse_decimal_opt(caps.name("units").map(|m| m.as_str()), "units")?
            .unwrap_or(Units::ZERO);
        let transaction = Transaction {
            date: parse_date(&caps["date"], self.dialect.date_format)?,
            kind: TransactionType::classify(&description, units),
            description,
            amount: parse_decimal_opt(caps.name("amount").map(|m| m.as_str()), "amount")?,
            units,
            nav: parse_decimal_opt(caps.name("nav").map(|m| m.as_str()), "nav")?,
            balance: parse_decimal_opt(caps.name("balance").map(|m| m.as_str()), "balance")?,
        };

        if let Some(scheme) = self.scheme_mut() {
            scheme.transactions.push(transaction);
            self.state = WalkState::InTransactionBlock;
        }
        Ok(())
    }

    fn on_summary(&mut self, row: &str, caps: &Captures) -> Result<(), ParseError> {
        if !matches!(
            self.state,
            WalkState::InSchemeHeader | WalkState::InTransactionBlock
        ) {
            self.orphan(row);
            return Ok(());
        }

        let close = parse_decimal(&caps["units"], "closing units")?;
        let valuation = self.summary_valuation(row)?;
        if let Some(scheme) = self.scheme_mut() {
            scheme.close = Some(close);
            scheme.valuation = valuation;
        }
        self.state = WalkState::SchemeSummary;
        Ok(())
    }

    /// One holdings row: folio, scheme and closing valuation at once.
    fn on_holding(&mut self, caps: &Captures) -> Result<(), ParseError> {
        let format = self.dialect.date_format;
        let number: String = caps["folio"].chars().filter(|c| !c.is_whitespace()).collect();
        let close = parse_decimal(&caps["units"], "closing units")?;
        let valuation = Valuation {
            date: parse_date(&caps["date"], format)?,
            nav: parse_decimal(&caps["nav"], "nav")?,
            value: parse_decimal(&caps["value"], "market value")?,
            cost: parse_decimal_opt(caps.name("cost").map(|m| m.as_str()), "cost value")?,
        };

        let mut scheme = Scheme::new(normalize_chars(caps["name"].chars()));
        scheme.rta_code = caps.name("code").map(|m| m.as_str().to_string());
        scheme.isin = Some(caps["isin"].to_string());
        scheme.registrar = Some(caps["rta"].to_string());
        scheme.close = Some(close);
        scheme.valuation = Some(valuation);
        tracing::debug!(folio = %number, scheme = %scheme.name, "read holding");

        let (index, _) = self.folio_index(number);
        self.folios[index].schemes.push(scheme);
        self.current = Some(index);
        self.state = WalkState::SchemeSummary;
        Ok(())
    }

    /// NAV, market value and cost printed on a closing row.
    fn summary_valuation(&self, row: &str) -> Result<Option<Valuation>, ParseError> {
        let format = self.dialect.date_format;
        let Some(nav_caps) = self.dialect.close_nav.captures(row) else {
            return Ok(None);
        };
        let Some(value_caps) = self.dialect.close_value.captures(row) else {
            return Ok(None);
        };
        let date_text = value_caps
            .name("date")
            .or_else(|| nav_caps.name("date"))
            .map(|m| m.as_str());
        let Some(date_text) = date_text else {
            return Ok(None);
        };
        let cost = self
            .dialect
            .close_cost
            .captures(row)
            .map(|c| parse_decimal(&c["cost"], "cost value"))
            .transpose()?;

        Ok(Some(Valuation {
            date: parse_date(date_text, format)?,
            nav: parse_decimal(&nav_caps["nav"], "nav")?,
            value: parse_decimal(&value_caps["value"], "market value")?,
            cost,
        }))
    }

    /// Rows no rule recognizes: continuation text, wrapped names or boilerplate.
    fn unmatched(&mut self, row: &str) {
        // A dated row no transaction shape fits is never description text.
        if self.dialect.row_date.is_match(row) {
            self.pending_head = None;
            self.orphan(row);
            return;
        }
        match self.state {
            WalkState::InTransactionBlock => {
                let text = normalize_chars(row.replace(CELL_SEPARATOR, " ").chars());
                let joined = self
                    .scheme_mut()
                    .and_then(|scheme| scheme.transactions.last_mut())
                    .map(|txn| {
                        txn.description.push(' ');
                        txn.description.push_str(&text);
                    })
                    .is_some();
                if joined {
                    self.diagnose(DiagnosticKind::ContinuationJoin, row);
                } else {
                    self.diagnostics.skipped_lines += 1;
                }
            }
            WalkState::InSchemeHeader => {
                let text = normalize_chars(row.replace(CELL_SEPARATOR, " ").chars());
                if let Some(scheme) = self.scheme_mut() {
                    scheme.name.push(' ');
                    scheme.name.push_str(&text);
                }
                self.diagnose(DiagnosticKind::SchemeNameJoin, row);
            }
            WalkState::InFolioHeader | WalkState::SeekingScheme | WalkState::SchemeSummary
                if self.dialect.scheme_head.is_match(row) =>
            {
                self.pending_head = Some(row.to_string());
            }
            _ => {
                self.pending_head = None;
                self.leave_folio_header();
                self.diagnostics.skipped_lines += 1;
            }
        }
    }

    /// The folio header ends at the first row that is not part of it.
    fn leave_folio_header(&mut self) {
        if self.state == WalkState::InFolioHeader {
            self.state = WalkState::SeekingScheme;
        }
    }

    fn orphan(&mut self, row: &str) {
        tracing::warn!(line = self.line_no, row, "dropping row outside folio/scheme");
        self.diagnose(DiagnosticKind::OrphanLine, row);
    }

    fn diagnose(&mut self, kind: DiagnosticKind, row: &str) {
        self.diagnostics.entries.push(Diagnostic {
            line: self.line_no,
            kind,
            text: row.replace(CELL_SEPARATOR, " "),
        });
    }

    fn folio_mut(&mut self) -> Option<&mut Folio> {
        self.current.map(|index| &mut self.folios[index])
    }

    fn scheme_mut(&mut self) -> Option<&mut Scheme> {
        self.folio_mut().and_then(|folio| folio.schemes.last_mut())
    }

    /// Scheme open for header rows; orphans the row when there is none.
    fn header_scheme(&mut self, row: &str) -> Option<&mut Scheme> {
        let open = matches!(
            self.state,
            WalkState::InSchemeHeader | WalkState::InTransactionBlock
        ) && self.scheme_mut().is_some();
        if open {
            self.scheme_mut()
        } else {
            self.orphan(row);
            None
        }
    }
}
