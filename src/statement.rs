//! Builds a [`StatementDocument`] from rendered pages.

use crate::classifier::{classify, classify_cas_type};
use crate::dialect::Dialect;
use crate::error::ParseError;
use crate::investor::extract_investor_info;
use crate::text::{Block, Page, PdfExtractor};
use crate::types::{CasType, FileType, InvestorInfo, StatementDocument};
use crate::walker::Walker;

/// Parse-time options (internal type).
#[derive(Debug, Clone, Copy)]
pub(crate) struct ParseOptions {
    pub parse_investor: bool,
    pub classify_pages: usize,
    pub file_type: Option<FileType>,
}

impl ParseOptions {
    /// Classifies from the first two pages and requires investor data.
    pub const fn everything() -> Self {
        Self {
            parse_investor: true,
            classify_pages: 2,
            file_type: None,
        }
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self::everything()
    }
}

impl StatementDocument {
    /// Parses rendered pages with default options.
    #[inline]
    pub fn parse(pages: &[Page]) -> Result<Self, ParseError> {
        Self::parse_with_options(pages, ParseOptions::everything())
    }

    pub(crate) fn parse_with_options(
        pages: &[Page],
        options: ParseOptions,
    ) -> Result<Self, ParseError> {
        let leading: Vec<&Block> = pages
            .iter()
            .take(options.classify_pages)
            .flat_map(|page| page.blocks.iter())
            .collect();
        let file_type = options
            .file_type
            .unwrap_or_else(|| classify(leading.iter().copied()));
        let cas_type = match file_type {
            FileType::Cams | FileType::Kfintech => classify_cas_type(leading.iter().copied()),
            FileType::Nsdl | FileType::Unknown => CasType::Detailed,
        };
        let dialect = match cas_type {
            CasType::Detailed => Dialect::for_file_type(file_type),
            CasType::Summary => Dialect::summary(file_type),
        }
        .ok_or(ParseError::UnknownLayout)?;

        let investor = if options.parse_investor {
            let first = pages.first().ok_or(ParseError::InvestorInfo)?;
            extract_investor_info(first, first.header_region())?
        } else {
            InvestorInfo {
                name: String::new(),
                email: None,
                address: None,
                pan: None,
                mobile: None,
            }
        };

        let output = Walker::new(dialect).walk(pages.iter().flat_map(Page::rows))?;
        tracing::debug!(
            ?file_type,
            ?cas_type,
            folios = output.folios.len(),
            skipped = output.diagnostics.skipped_lines,
            "walked statement"
        );

        Ok(Self {
            file_type,
            cas_type,
            investor,
            folios: output.folios,
            statement_period: output.period,
            diagnostics: output.diagnostics,
        })
    }
}

/// Builder for parsing a [`StatementDocument`] with custom options.
pub struct StatementBuilder<'a> {
    pages: &'a [Page],
    options: ParseOptions,
}

impl<'a> StatementBuilder<'a> {
    /// Creates a builder over rendered pages.
    ///
    /// # Example
    ///
    /// ```
    /// # use cas_parser::{Page, StatementBuilder};
    /// let pages: Vec<Page> = Vec::new();
    /// let result = StatementBuilder::new(&pages).investor(false).parse();
    /// assert!(result.is_err());
    /// ```
    #[inline]
    pub const fn new(pages: &'a [Page]) -> Self {
        Self {
            pages,
            options: ParseOptions::everything(),
        }
    }

    /// Enables or disables the investor header (on by default).
    #[inline]
    pub const fn investor(mut self, enabled: bool) -> Self {
        self.options.parse_investor = enabled;
        self
    }

    /// Number of leading pages scanned by the layout classifier.
    #[inline]
    pub const fn classify_pages(mut self, pages: usize) -> Self {
        self.options.classify_pages = pages;
        self
    }

    /// Skips classification and parses with a fixed layout.
    #[inline]
    pub const fn file_type(mut self, file_type: FileType) -> Self {
        self.options.file_type = Some(file_type);
        self
    }

    /// Runs the parse with the current options.
    #[inline]
    pub fn parse(self) -> Result<StatementDocument, ParseError> {
        StatementDocument::parse_with_options(self.pages, self.options)
    }
}

/// Extracts, classifies and parses a document in one call.
pub fn classify_and_parse<E: PdfExtractor + ?Sized>(
    extractor: &E,
    bytes: &[u8],
    password: &str,
) -> Result<StatementDocument, ParseError> {
    let pages = extractor.extract(bytes, password)?;
    StatementBuilder::new(&pages).parse()
}
