mod common;

use cas_parser::export::{read_csv, read_json, write_csv, write_json, write_text};
use cas_parser::{
    Block, CasType, DiagnosticKind, ExtractError, FileType, Page, PageDumpExtractor, ParseError, PdfExtractor,
    Rect, StatementBuilder, StatementDocument, TransactionType, classify, classify_and_parse,
    extract_investor_info, validate,
};
use chrono::NaiveDate;
use common::{cams_pages, dec, kfintech_pages, nsdl_pages, parse, summary_pages};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn classifies_each_layout() {
    for (pages, expected) in [
        (cams_pages(), FileType::Cams),
        (kfintech_pages(), FileType::Kfintech),
        (nsdl_pages(), FileType::Nsdl),
    ] {
        assert_eq!(classify(pages.iter().flat_map(|p| p.blocks.iter())), expected);
    }
}

#[test]
fn classify_empty_is_unknown() {
    assert_eq!(classify(std::iter::empty::<&Block>()), FileType::Unknown);
    let blank = common::page(&[&["Account Statement"], &["Nothing to see"]]);
    assert_eq!(classify(blank.blocks.iter()), FileType::Unknown);
}

#[test]
fn unknown_layout_is_fatal() {
    let pages = vec![common::page(&[&["Some bank statement"], &["JOHN DOE"]])];
    let err = StatementDocument::parse(&pages).unwrap_err();
    assert!(matches!(err, ParseError::UnknownLayout));
}

#[test]
fn investor_error_on_empty_page() {
    let err = extract_investor_info(&Page::default(), Rect::default()).unwrap_err();
    assert!(matches!(err, ParseError::InvestorInfo));
    assert_eq!(err.to_string(), "Unable to parse investor data");
}

#[test]
fn parses_cams_investor() {
    let doc = parse(&cams_pages());
    assert_eq!(doc.file_type, FileType::Cams);
    assert_eq!(doc.investor.name, "PRIYA SHARMA");
    assert_eq!(doc.investor.email.as_deref(), Some("priya@example.com"));
    assert_eq!(
        doc.investor.address.as_deref(),
        Some("12 MG Road\nBengaluru 560001")
    );
    assert_eq!(doc.investor.mobile.as_deref(), Some("+919876543210"));
    let period = doc.statement_period.unwrap();
    assert_eq!(period.from, date(2020, 1, 1));
    assert_eq!(period.to, date(2020, 12, 31));
}

#[test]
fn parses_cams_structure() {
    let doc = parse(&cams_pages());
    assert_eq!(doc.folios.len(), 3);

    let first = &doc.folios[0];
    assert_eq!(first.folio, "1234567/89");
    assert_eq!(first.amc.as_deref(), Some("HDFC Mutual Fund"));
    assert_eq!(first.pan.as_deref(), Some("ABCDE1234F"));
    assert_eq!(first.kyc, Some(true));
    assert_eq!(first.pan_kyc, Some(true));

    let scheme = &first.schemes[0];
    assert_eq!(scheme.name, "HDFC Top 100 Fund - Direct Growth");
    assert_eq!(scheme.rta_code.as_deref(), Some("H1"));
    assert_eq!(scheme.isin.as_deref(), Some("INF179K01YV8"));
    assert_eq!(scheme.advisor.as_deref(), Some("DIRECT"));
    assert_eq!(scheme.registrar.as_deref(), Some("CAMS"));
    assert_eq!(scheme.close, Some(dec("800.000")));

    let kinds: Vec<_> = scheme.transactions.iter().map(|t| t.kind).collect();
    assert_eq!(
        kinds,
        [
            TransactionType::Purchase,
            TransactionType::StampDuty,
            TransactionType::PurchaseSip,
            TransactionType::Redemption,
        ]
    );
    let redemption = &scheme.transactions[3];
    assert_eq!(redemption.amount, Some(dec("-9000.00")));
    assert_eq!(redemption.units, dec("-600.000"));
    assert_eq!(redemption.balance, Some(dec("800.000")));

    let valuation = scheme.valuation.unwrap();
    assert_eq!(valuation.date, date(2020, 12, 31));
    assert_eq!(valuation.nav, dec("16.00"));
    assert_eq!(valuation.value, dec("12800.00"));
    assert_eq!(valuation.cost, Some(dec("8000.00")));

    let third = &doc.folios[2];
    assert_eq!(third.amc.as_deref(), Some("ICICI Prudential Mutual Fund"));
    assert_eq!(third.kyc, Some(false));
}

#[test]
fn joins_wrapped_rows() {
    let doc = parse(&cams_pages());
    let sip = &doc.folios[0].schemes[0].transactions[2];
    assert_eq!(sip.description, "Systematic Investment Instalment No 1/12");
    assert_eq!(doc.diagnostics.count(DiagnosticKind::ContinuationJoin), 1);

    let liquid = &doc.folios[1].schemes[0];
    assert_eq!(liquid.name, "HDFC Liquid Fund Direct Growth");
    assert_eq!(liquid.rta_code.as_deref(), Some("L2"));
    assert_eq!(doc.diagnostics.count(DiagnosticKind::SchemeNameJoin), 1);
    assert_eq!(doc.diagnostics.count(DiagnosticKind::OrphanLine), 0);
}

#[test]
fn cams_reconciles_cleanly() {
    let doc = parse(&cams_pages());
    let summary = validate(&doc);
    assert!(summary.is_clean());
    assert_eq!(summary.matched_accounts, 3);
    assert!(summary.to_string().contains("Matched : 3 accounts"));
    assert!(summary.balance_drifts.is_empty());
}

#[test]
fn validate_is_idempotent() {
    let doc = parse(&kfintech_pages());
    assert_eq!(validate(&doc), validate(&doc));
}

#[test]
fn kfintech_orphan_and_mismatch() {
    let doc = parse(&kfintech_pages());
    assert_eq!(doc.file_type, FileType::Kfintech);
    assert_eq!(doc.investor.name, "ANIL KUMAR");
    assert_eq!(doc.investor.mobile.as_deref(), Some("+919000012345"));
    assert_eq!(doc.diagnostics.count(DiagnosticKind::OrphanLine), 1);
    assert_eq!(doc.folios[0].schemes.len(), 2);

    let summary = validate(&doc);
    assert_eq!(summary.matched_accounts, 0);
    assert_eq!(summary.error_accounts, 1);
    assert_eq!(summary.matched_schemes, 1);
    assert_eq!(summary.error_schemes, 1);
    assert!(summary.to_string().contains("Error   : 1 schemes"));
    assert_eq!(summary.mismatches[0].isin.as_deref(), Some("INF846K01DP8"));
}

#[test]
fn parses_nsdl_columns() {
    let doc = parse(&nsdl_pages());
    assert_eq!(doc.file_type, FileType::Nsdl);
    assert_eq!(doc.investor.name, "MEERA IYER");
    assert_eq!(doc.investor.pan.as_deref(), Some("KLMNO9876P"));

    let folio = &doc.folios[0];
    assert_eq!(folio.folio, "19876543");
    assert_eq!(folio.amc.as_deref(), Some("SBI Mutual Fund"));
    let scheme = &folio.schemes[0];
    assert_eq!(scheme.name, "SBI Small Cap Fund - Direct Growth");
    assert_eq!(scheme.rta_code.as_deref(), Some("MFSBI001"));

    let txn = &scheme.transactions[0];
    assert_eq!(txn.date, date(2020, 5, 15));
    assert_eq!(txn.nav, Some(dec("50.0000")));
    assert_eq!(txn.units, dec("100.000"));
    assert_eq!(scheme.valuation.unwrap().cost, Some(dec("5000.00")));
    assert!(validate(&doc).is_clean());
}

#[test]
fn builder_without_investor_header() {
    let mut pages = cams_pages();
    pages[0].blocks.drain(..7);
    assert!(StatementDocument::parse(&pages).is_err());

    let doc = StatementBuilder::new(&pages)
        .investor(false)
        .parse()
        .unwrap();
    assert!(doc.investor.name.is_empty());
    assert_eq!(doc.folios.len(), 3);
}

#[test]
fn forced_layout_skips_classifier() {
    let mut pages = cams_pages();
    pages[0].blocks.retain(|b| !b.text().contains("CAMSCASWS"));
    assert!(StatementDocument::parse(&pages).is_err());
    let doc = StatementBuilder::new(&pages)
        .file_type(FileType::Cams)
        .parse()
        .unwrap();
    assert_eq!(doc.folios.len(), 3);
}

#[test]
fn no_folios_is_incomplete_not_error() {
    let pages = vec![common::page(&[
        &["Consolidated Account Statement"],
        &["JANE DOE"],
        &["CAMSCASWS"],
    ])];
    let doc = parse(&pages);
    assert!(doc.is_incomplete());
}

#[test]
fn bad_number_is_fatal() {
    let dialect = cas_parser::Dialect::for_file_type(FileType::Cams).unwrap();
    let mut walker = cas_parser::Walker::new(dialect);
    walker.feed("Folio No: 1").unwrap();
    walker
        .feed("A1 - Test Fund - ISIN: INF179K01YV8 Registrar : CAMS")
        .unwrap();
    let err = walker
        .feed("Opening Unit Balance: 999999999999999999999999999999999.00")
        .unwrap_err();
    assert!(matches!(err, ParseError::Number { .. }));
}

#[test]
fn csv_round_trip() {
    let doc = parse(&cams_pages());
    let mut buffer = Vec::new();
    write_csv(&mut buffer, &doc).unwrap();
    let folios = read_csv(buffer.as_slice()).unwrap();

    assert_eq!(folios.len(), doc.folios.len());
    let original: Vec<_> = doc.schemes().flat_map(|(_, s)| &s.transactions).collect();
    let restored: Vec<_> = folios
        .iter()
        .flat_map(|f| &f.schemes)
        .flat_map(|s| &s.transactions)
        .collect();
    assert_eq!(original.len(), restored.len());
    for (a, b) in original.iter().zip(&restored) {
        assert_eq!(a.date, b.date);
        assert_eq!(a.amount, b.amount);
        assert_eq!(a.units, b.units);
        assert_eq!(a.kind, b.kind);
    }
}

#[test]
fn json_round_trip() {
    let doc = parse(&nsdl_pages());
    let mut buffer = Vec::new();
    write_json(&mut buffer, &doc).unwrap();
    let restored = read_json(buffer.as_slice()).unwrap();
    assert_eq!(restored, doc);
}

#[test]
fn text_output_lists_folios() {
    let doc = parse(&cams_pages());
    let mut buffer = Vec::new();
    write_text(&mut buffer, &doc).unwrap();
    let text = String::from_utf8(buffer).unwrap();
    assert!(text.contains("Investor : PRIYA SHARMA"));
    assert!(text.contains("Folio 1234567/89 (HDFC Mutual Fund)"));
    assert!(text.contains("HDFC Top 100 Fund - Direct Growth [INF179K01YV8]"));
}

#[test]
fn page_dump_fixture() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("cams_statement.json");
    let bytes = std::fs::read(path).expect("read fixture");
    let doc = classify_and_parse(&PageDumpExtractor, &bytes, "").unwrap();
    assert_eq!(doc.file_type, FileType::Cams);
    assert_eq!(doc.investor.name, "RAHUL VERMA");
    assert_eq!(doc.folios.len(), 1);
    assert_eq!(doc.transaction_count(), 2);
    assert!(validate(&doc).is_clean());
}

#[test]
fn corrupt_page_dump() {
    let err = classify_and_parse(&PageDumpExtractor, b"not json", "").unwrap_err();
    assert!(matches!(err, ParseError::Extract(_)));
}

struct LockedExtractor;

impl PdfExtractor for LockedExtractor {
    fn extract(&self, _bytes: &[u8], password: &str) -> Result<Vec<Page>, ExtractError> {
        if password == "secret" {
            Ok(cams_pages())
        } else {
            Err(ExtractError::IncorrectPassword)
        }
    }
}

#[test]
fn wrong_password() {
    let err = classify_and_parse(&LockedExtractor, b"%PDF", "guess").unwrap_err();
    assert!(matches!(err, ParseError::IncorrectPassword));
    assert_eq!(err.to_string(), "Incorrect PDF password!");
    assert!(classify_and_parse(&LockedExtractor, b"%PDF", "secret").is_ok());
}

#[test]
fn summary_statement_holdings() {
    let doc = parse(&summary_pages());
    assert_eq!(doc.file_type, FileType::Cams);
    assert_eq!(doc.cas_type, CasType::Summary);
    assert_eq!(doc.investor.name, "VIKRAM RAO");
    let period = doc.statement_period.unwrap();
    assert_eq!(period.from, date(2020, 12, 31));
    assert_eq!(period.to, date(2020, 12, 31));

    assert_eq!(doc.folios.len(), 3);
    assert_eq!(doc.transaction_count(), 0);
    let folio = &doc.folios[2];
    assert_eq!(folio.folio, "5555/11");
    assert_eq!(folio.amc.as_deref(), Some("ICICI Prudential Mutual Fund"));
    let scheme = &folio.schemes[0];
    assert_eq!(scheme.name, "ICICI Prudential Bluechip Fund - Growth");
    assert_eq!(scheme.isin.as_deref(), Some("INF109K01BL4"));
    assert_eq!(scheme.close, Some(dec("25.000")));
    let valuation = scheme.valuation.as_ref().unwrap();
    assert_eq!(valuation.value, dec("1125.00"));
    assert_eq!(valuation.cost, Some(dec("1000.00")));
    assert_eq!(doc.folios[1].schemes[0].valuation.as_ref().unwrap().cost, None);
    assert_eq!(doc.diagnostics.count(DiagnosticKind::OrphanLine), 0);
}

#[test]
fn summary_statement_is_not_reconciled() {
    let summary = validate(&parse(&summary_pages()));
    assert!(summary.skipped);
    assert_eq!(summary.error_schemes, 0);
    assert!(summary.mismatches.is_empty());
    assert!(summary.to_string().starts_with("Skipped"));
    assert!(!validate(&parse(&cams_pages())).skipped);
}

#[test]
fn summary_statement_csv_lists_holdings() {
    let doc = parse(&summary_pages());
    let mut buffer = Vec::new();
    write_csv(&mut buffer, &doc).unwrap();
    let text = String::from_utf8(buffer).unwrap();
    assert_eq!(text.lines().count(), 4);
    assert!(text.lines().next().unwrap().starts_with("folio,amc,scheme,isin"));
    assert!(text.contains("1234567/89,HDFC Mutual Fund,HDFC Top 100 Fund - Direct Growth,INF179K01YV8,H1,CAMS,800.000,2020-12-31,16.00,12800.00,8000.00"));
}
