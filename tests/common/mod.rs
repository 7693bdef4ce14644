#![allow(dead_code)]

use cas_parser::{Block, Line, Page, Rect, Span, StatementDocument};
use rust_decimal::Decimal;
use std::str::FromStr;

const LEFT: f64 = 20.0;
const CELL_WIDTH: f64 = 95.0;
const TOP: f64 = 40.0;
const ROW_HEIGHT: f64 = 14.0;

/// A portrait A4 page with one block per row, cells laid out left to right.
pub fn page(rows: &[&[&str]]) -> Page {
    let blocks = rows
        .iter()
        .enumerate()
        .map(|(i, cells)| {
            let y = TOP + i as f64 * ROW_HEIGHT;
            let spans: Vec<Span> = cells
                .iter()
                .enumerate()
                .map(|(j, text)| {
                    let x = LEFT + j as f64 * CELL_WIDTH;
                    Span {
                        text: (*text).to_string(),
                        bbox: Rect::new(x, y, x + CELL_WIDTH - 5.0, y + 10.0),
                    }
                })
                .collect();
            let right = LEFT + cells.len() as f64 * CELL_WIDTH;
            Block {
                bbox: Rect::new(LEFT, y, right, y + 10.0),
                lines: vec![Line { spans }],
            }
        })
        .collect();
    Page {
        width: 595.0,
        height: 842.0,
        blocks,
    }
}

pub fn dec(value: &str) -> Decimal {
    Decimal::from_str(value).unwrap()
}

pub fn cams_pages() -> Vec<Page> {
    vec![page(&[
        &["Consolidated Account Statement"],
        &["01-Jan-2020 To 31-Dec-2020"],
        &["Email Id: priya@example.com"],
        &["PRIYA SHARMA"],
        &["12 MG Road,"],
        &["Bengaluru 560001"],
        &["Mobile: +91 98765 43210"],
        &["Date", "Transaction", "Amount", "Units", "NAV", "Unit Balance"],
        &["HDFC Mutual Fund"],
        &["Folio No: 1234567 / 89", "KYC: OK PAN: OK"],
        &["PAN: ABCDE1234F"],
        &["H1 - HDFC Top 100 Fund - Direct Growth - ISIN: INF179K01YV8 (Advisor: DIRECT) Registrar : CAMS"],
        &["Opening Unit Balance: 0.000"],
        &["15-Jan-2020", "Purchase", "10,000.00", "1,000.000", "10.0000", "1,000.000"],
        &["15-Jan-2020", "*** Stamp Duty ***", "0.50"],
        &["10-Jun-2020", "Systematic Investment", "5,000.00", "400.000", "12.5000", "1,400.000"],
        &["Instalment No 1/12"],
        &["20-Nov-2020", "Redemption", "(9,000.00)", "(600.000)", "15.0000", "800.000"],
        &[
            "Closing Unit Balance: 800.000",
            "NAV on 31-Dec-2020: INR 16.00",
            "Cost Value: 8,000.00",
            "Market Value on 31-Dec-2020: INR 12,800.00",
        ],
        &["Nominee 1: Raj Sharma"],
        &["Folio No: 7654321", "KYC: OK PAN: OK"],
        &["PAN: ABCDE1234F"],
        &["L2 - HDFC Liquid Fund"],
        &["Direct Growth - ISIN: INF179KB1HP9 Registrar : CAMS"],
        &["Opening Unit Balance: 0.000"],
        &["01-Feb-2020", "Purchase", "2,000.00", "2.000", "1,000.0000", "2.000"],
        &[
            "Closing Unit Balance: 2.000",
            "NAV on 31-Dec-2020: INR 1,020.00",
            "Market Value on 31-Dec-2020: INR 2,040.00",
        ],
        &["ICICI Prudential Mutual Fund"],
        &["Folio No: 5555 / 11", "KYC: NOT OK PAN: OK"],
        &["I3 - ICICI Prudential Bluechip Fund - Growth - ISIN: INF109K01BL4 Registrar : CAMS"],
        &["Opening Unit Balance: 0.000"],
        &["05-Mar-2020", "Purchase", "1,000.00", "25.000", "40.0000", "25.000"],
        &[
            "Closing Unit Balance: 25.000",
            "NAV on 31-Dec-2020: INR 45.00",
            "Market Value on 31-Dec-2020: INR 1,125.00",
        ],
        &["CAMSCASWS-01-2021"],
        &["*** End of Statement ***"],
        &["This statement is computer generated"],
    ])]
}

pub fn kfintech_pages() -> Vec<Page> {
    vec![page(&[
        &["Consolidated Account Statement"],
        &["01-Apr-2020 To 31-Mar-2021"],
        &["ANIL KUMAR"],
        &["Flat 4B, Lake View Apartments"],
        &["Hyderabad 500081"],
        &["Email Id: anil.kumar@example.in"],
        &["Mobile: +91-90000-12345"],
        &["Axis Mutual Fund"],
        &["Folio No: 91011121", "KYC: OK PAN: OK"],
        &["PAN: FGHIJ5678K"],
        &["02-Apr-2020", "Purchase", "500.00", "10.000", "50.0000", "10.000"],
        &["X001 - Axis Bluechip Fund - Direct Growth - ISIN: INF846K01DP8 (Advisor: DIRECT) Registrar : KFINTECH"],
        &["Opening Unit Balance: 0.000"],
        &["04-May-2020", "Purchase", "1,000.00", "100.000", "10.0000", "100.000"],
        &["04-Jun-2020", "Purchase", "1,200.00", "100.000", "12.0000", "200.000"],
        &["01-Mar-2021", "Redemption", "(3,000.00)", "(150.000)", "20.0000", "50.000"],
        &[
            "Closing Unit Balance: 60.000",
            "NAV on 31-Mar-2021: INR 21.00",
            "Market Value on 31-Mar-2021: INR 1,260.00",
        ],
        &["X002 - Axis Liquid Fund - Direct Growth - ISIN: INF846K01CX4 Registrar : KFINTECH"],
        &["Opening Unit Balance: 0.000"],
        &["10-Apr-2020", "Purchase", "3,000.00", "1.500", "2,000.0000", "1.500"],
        &[
            "Closing Unit Balance: 1.500",
            "NAV on 31-Mar-2021: INR 2,100.00",
            "Market Value on 31-Mar-2021: INR 3,150.00",
        ],
        &["KFINCASWS-04-2021"],
        &["*** End of Statement ***"],
    ])]
}

pub fn nsdl_pages() -> Vec<Page> {
    vec![page(&[
        &["NSDL Consolidated Account Statement"],
        &["Statement for the period from 01-04-2020 to 31-03-2021"],
        &["MEERA IYER"],
        &["22 Park Street"],
        &["Kolkata 700016"],
        &["PAN: KLMNO9876P"],
        &["Mobile: 9830012345"],
        &["Mutual Fund Folios"],
        &["AMC Name : SBI Mutual Fund"],
        &["Folio No : 19876543", "KYC : OK"],
        &["ISIN : INF200K01QX4 UCC : MFSBI001 Scheme Name : SBI Small Cap Fund - Direct Growth"],
        &["Opening Balance : 0.000"],
        &["15-05-2020", "Purchase", "5,000.00", "50.0000", "100.000", "100.000"],
        &[
            "Closing Balance : 100.000",
            "NAV as on 31-03-2021 : 80.00",
            "Value as on 31-03-2021 : 8,000.00",
            "Total Cost : 5,000.00",
        ],
        &["About NSDL"],
        &["NSDL is a depository"],
    ])]
}

pub fn summary_pages() -> Vec<Page> {
    vec![page(&[
        &["Consolidated Account Summary"],
        &["As on 31-Dec-2020"],
        &["Email Id: vikram.rao@example.com"],
        &["VIKRAM RAO"],
        &["18 Brigade Road"],
        &["Bengaluru 560025"],
        &["Mobile: +91 98450 11223"],
        &["Folio No.", "ISIN", "Scheme", "Cost Value", "Unit Balance", "NAV Date", "NAV", "Market Value", "Registrar"],
        &["HDFC Mutual Fund"],
        &[
            "1234567 / 89",
            "INF179K01YV8",
            "H1 - HDFC Top 100 Fund - Direct Growth",
            "8,000.00",
            "800.000",
            "31-Dec-2020",
            "16.00",
            "12,800.00",
            "CAMS",
        ],
        &[
            "7654321",
            "INF179KB1HP9",
            "L2 - HDFC Liquid Fund - Direct Growth",
            "2.000",
            "31-Dec-2020",
            "1,020.00",
            "2,040.00",
            "CAMS",
        ],
        &["ICICI Prudential Mutual Fund"],
        &[
            "5555 / 11",
            "INF109K01BL4",
            "I3 - ICICI Prudential Bluechip Fund - Growth",
            "1,000.00",
            "25.000",
            "31-Dec-2020",
            "45.00",
            "1,125.00",
            "CAMS",
        ],
        &["Total", "11,000.00", "15,965.00"],
        &["CAMSCASWS-01-2021"],
        &["*** End of Statement ***"],
    ])]
}

pub fn parse(pages: &[Page]) -> StatementDocument {
    StatementDocument::parse(pages).expect("parse statement")
}
