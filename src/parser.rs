// src/parser.rs

// --- Imports ---
use crate::compute::{compute_transactions, holding_delta, split_transactions, TransactionGroup};
use crate::extractors::fields::{
    detect_transaction_tables, extract_holder_name, extract_shares,
    extract_symbol_and_company_name, ShareSnapshot,
};
use crate::extractors::table::parse_transactions;
use crate::lookup::CompanyLookup;
use crate::models::{DocumentText, FilingRecord, ParseOutcome};
use crate::narrative::{generate_title_and_body, NarrativeInput};
use crate::normalize::round3;
use crate::utils::error::FilingError;

// --- Constants ---
// The share/percentage block lives on the cover pages; some filings split it
// onto the second page.
const COVER_PAGE_COUNT: usize = 2;

// --- Data Structures ---

/// Identity and share fields shared by every record a document yields.
struct RecordSeed<'a> {
    shares: &'a ShareSnapshot,
    share_percentage_transaction: f64,
    holder_name: &'a Option<String>,
    symbol: &'a Option<String>,
    company_name: &'a Option<String>,
    sub_sector: &'a Option<String>,
    source: &'a str,
    source_url: &'a str,
}

// --- Orchestrator ---

/// Processes one filing document into zero, one, or two [`FilingRecord`]s:
/// one for non-trade ("others") events and one for netted buy/sell trades.
///
/// Terminal outcomes: [`ParseOutcome::NoShareChange`] when the cover pages
/// show equal holdings before and after (a clean early return), and
/// [`FilingError::NoTransactionTable`] when no page carries the transaction
/// table markers. Everything below that degrades per-field and never fails
/// the document.
pub fn parse_document(
    document: &DocumentText,
    source: &str,
    source_url: &str,
    lookup: &CompanyLookup,
) -> Result<ParseOutcome, FilingError> {
    // 1. Share counts and voting percentages from the cover pages, checking
    //    the no-change invariant as each page merges in.
    let mut shares = ShareSnapshot::default();
    for page_index in 0..COVER_PAGE_COUNT {
        let Some(text) = document.page(page_index) else {
            break;
        };

        shares.merge_from(extract_shares(text));

        if shares.is_unchanged() {
            tracing::info!("Skipping {}: shares unchanged.", source);
            return Ok(ParseOutcome::NoShareChange);
        }
    }
    tracing::debug!("extracted share snapshot: {:?}", shares);

    let share_percentage_transaction = round3(
        (shares.share_percentage_after.unwrap_or(0.0)
            - shares.share_percentage_before.unwrap_or(0.0))
        .abs(),
    );

    // 2. Holder identity and ticker from the first page, cross-verified
    //    against the lookup. The lookup owns the canonical company name and
    //    is the only source for the sub-sector; a miss is non-fatal.
    let first_page = document.page(0).unwrap_or("");
    let holder_name = extract_holder_name(first_page);
    let symbol_company = extract_symbol_and_company_name(first_page);

    let symbol = symbol_company.symbol;
    let mut company_name = symbol_company.company_name;
    let mut sub_sector = None;

    if let Some(symbol) = symbol.as_deref() {
        match lookup.get(symbol) {
            Some(info) => {
                company_name = Some(info.name.clone());
                sub_sector = info.sub_sector.clone();
            }
            None => tracing::warn!("symbol {} not present in company lookup", symbol),
        }
    }

    // 3. The transaction-table page window. Zero matching pages is the one
    //    hard failure a document can have.
    let table_pages = detect_transaction_tables(document.pages());
    let (first_table_page, last_table_page) = match (table_pages.first(), table_pages.last()) {
        (Some(&first), Some(&last)) => (first, last),
        _ => {
            tracing::error!("no transaction table pages detected in {}", source);
            return Err(FilingError::NoTransactionTable);
        }
    };

    // 4. Parse the combined table-page text and split into the two buckets.
    let table_text = document.join_pages(first_table_page, last_table_page);
    let transactions = parse_transactions(&table_text);
    let (others_group, trades_group) = split_transactions(transactions);

    // 5. One independent record per non-empty group.
    let seed = RecordSeed {
        shares: &shares,
        share_percentage_transaction,
        holder_name: &holder_name,
        symbol: &symbol,
        company_name: &company_name,
        sub_sector: &sub_sector,
        source,
        source_url,
    };

    let others = others_group.map(|group| build_record(&seed, group));
    let buy_sell = trades_group.map(|group| build_record(&seed, group));

    tracing::info!(
        "{}: others record: {}, buy/sell record: {}",
        source,
        others.is_some(),
        buy_sell.is_some()
    );

    Ok(ParseOutcome::Records { others, buy_sell })
}

/// Merges one group's computed aggregate with the shared document fields and
/// attaches the generated narrative.
fn build_record(seed: &RecordSeed, group: TransactionGroup) -> FilingRecord {
    let computed = compute_transactions(&group.transactions);
    let transaction_type = computed
        .transaction_type
        .canonical()
        .unwrap_or("others")
        .to_string();

    // The ledger delta, not the group arithmetic: disclosed rows and the
    // holdings delta can legitimately diverge.
    let amount_transaction = holding_delta(seed.shares.holding_before, seed.shares.holding_after);

    let (title, body) = generate_title_and_body(&NarrativeInput {
        holder_name: seed.holder_name.as_deref().unwrap_or(""),
        company_name: seed.company_name.as_deref().unwrap_or(""),
        transaction_type: &transaction_type,
        amount: amount_transaction,
        holding_before: seed.shares.holding_before,
        holding_after: seed.shares.holding_after,
        purpose: &group.purpose,
    });

    FilingRecord {
        symbol: seed.symbol.clone(),
        company_name: seed.company_name.clone(),
        holder_name: seed.holder_name.clone(),
        sub_sector: seed.sub_sector.clone(),
        holding_before: seed.shares.holding_before,
        holding_after: seed.shares.holding_after,
        share_percentage_before: seed.shares.share_percentage_before,
        share_percentage_after: seed.shares.share_percentage_after,
        share_percentage_transaction: seed.share_percentage_transaction,
        amount_transaction,
        price: computed.price,
        transaction_value: computed.transaction_value,
        transaction_type,
        price_transaction: group.transactions,
        purpose: group.purpose,
        title,
        body,
        source: seed.source.to_string(),
        source_url: seed.source_url.to_string(),
    }
}

// --- Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::CompanyInfo;

    const COVER_PAGE: &str = "\
Formulir Laporan
Nama (sesuai SID) : budi santoso
Nama Perusahaan Tbk : BBCA - Bank Central Asia
Tbk
Jumlah Saham Sebelum Transaksi : 1.000.000
Jumlah Saham Setelah Transaksi : 1.001.000
Hak Suara Sebelum Transaksi : 0,100 %
Hak Suara Setelah Transaksi : 0,101 %
";

    fn table_page(rows: &[&str]) -> String {
        let mut lines = vec![
            "Jenis",
            "Transaksi",
            "Klasifikasi",
            "Saham",
            "Jumlah",
            "Saham",
            "Tujuan",
            "Transaksi",
        ];
        lines.extend(rows);
        lines.push("Pemberi Informasi");
        lines.join("\n")
    }

    fn buy_rows() -> Vec<&'static str> {
        vec![
            "Pembelian", "Tidak", "Langsung", "1.000", "Saham", "Biasa", "500", "05 -", "Jan -",
            "2024", "Pelaksanaan ESOP",
        ]
    }

    fn lookup() -> CompanyLookup {
        CompanyLookup::from_entries([(
            "BBCA.JK".to_string(),
            CompanyInfo {
                name: "Bank Central Asia".to_string(),
                sub_sector: Some("banks".to_string()),
            },
        )])
    }

    fn document(rows: &[&str]) -> DocumentText {
        DocumentText::new(vec![COVER_PAGE.to_string(), table_page(rows)])
    }

    #[test]
    fn test_end_to_end_buy_record() {
        let outcome = parse_document(&document(&buy_rows()), "filing.pdf", "https://idx/x", &lookup())
            .expect("parse succeeds");

        let (others, buy_sell) = outcome.into_records();
        assert!(others.is_none());

        let record = buy_sell.expect("buy/sell record");
        assert_eq!(record.symbol.as_deref(), Some("BBCA.JK"));
        // Canonical lookup name overrides the document-extracted one.
        assert_eq!(record.company_name.as_deref(), Some("Bank Central Asia"));
        assert_eq!(record.holder_name.as_deref(), Some("Budi Santoso"));
        assert_eq!(record.sub_sector.as_deref(), Some("banks"));
        assert_eq!(record.holding_before, Some(1_000_000));
        assert_eq!(record.holding_after, Some(1_001_000));
        assert_eq!(record.share_percentage_before, Some(0.1));
        assert_eq!(record.share_percentage_after, Some(0.101));
        assert_eq!(record.share_percentage_transaction, 0.001);
        assert_eq!(record.amount_transaction, Some(1000));
        assert_eq!(record.price, 500.0);
        assert_eq!(record.transaction_value, 500_000);
        assert_eq!(record.transaction_type, "buy");
        assert_eq!(record.price_transaction.len(), 1);
        assert_eq!(record.purpose, "Pelaksanaan ESOP");
        assert_eq!(record.title, "Budi Santoso buys shares of Bank Central Asia");
        assert!(record.body.starts_with("Budi Santoso bought 1,000 shares"));
        assert!(record.body.ends_with("pelaksanaan esop."));
        assert_eq!(record.source, "filing.pdf");
        assert_eq!(record.source_url, "https://idx/x");
    }

    #[test]
    fn test_others_and_buy_sell_yield_two_records() {
        let mut rows = vec![
            "Pelaksanaan",
            "ESOP",
            "Tidak",
            "Langsung",
            "500",
            "Saham",
            "Biasa",
            "100",
            "07 -",
            "Mar -",
            "2024",
            "Program ESOP",
        ];
        rows.extend(buy_rows());

        let outcome = parse_document(&document(&rows), "filing.pdf", "url", &lookup())
            .expect("parse succeeds");

        let (others, buy_sell) = outcome.into_records();

        let others = others.expect("others record");
        assert_eq!(others.transaction_type, "others");
        assert_eq!(others.price, 100.0);
        assert_eq!(others.transaction_value, 50_000);
        assert_eq!(others.purpose, "Program ESOP");
        assert_eq!(
            others.title,
            "Change in Budi Santoso's position in Bank Central Asia"
        );

        let buy_sell = buy_sell.expect("buy/sell record");
        assert_eq!(buy_sell.transaction_type, "buy");
        assert_eq!(buy_sell.transaction_value, 500_000);
        // Both records carry the same ledger-derived amount.
        assert_eq!(others.amount_transaction, buy_sell.amount_transaction);
    }

    #[test]
    fn test_no_share_change_short_circuits() {
        let cover = "\
Jumlah Saham Sebelum Transaksi : 1.000.000
Jumlah Saham Setelah Transaksi : 1.000.000
";
        let document = DocumentText::new(vec![cover.to_string(), table_page(&buy_rows())]);

        let outcome =
            parse_document(&document, "f.pdf", "url", &lookup()).expect("parse succeeds");
        assert_eq!(outcome, ParseOutcome::NoShareChange);
        assert_eq!(outcome.into_records(), (None, None));
    }

    #[test]
    fn test_missing_table_is_typed_error() {
        let document = DocumentText::new(vec![COVER_PAGE.to_string(), "no table here".to_string()]);

        let result = parse_document(&document, "f.pdf", "url", &lookup());
        assert!(matches!(result, Err(FilingError::NoTransactionTable)));
    }

    #[test]
    fn test_lookup_miss_is_non_fatal() {
        let empty_lookup = CompanyLookup::default();
        let outcome = parse_document(&document(&buy_rows()), "f.pdf", "url", &empty_lookup)
            .expect("parse succeeds");

        let (_, buy_sell) = outcome.into_records();
        let record = buy_sell.expect("buy/sell record");
        assert_eq!(record.sub_sector, None);
        // Without a lookup hit the document-extracted name stands.
        assert_eq!(record.company_name.as_deref(), Some("Bank Central Asia Tbk"));
    }

    #[test]
    fn test_table_with_no_valid_rows_yields_no_records() {
        // Marker phrases present, but the only keyword is unvalidated prose.
        let rows = vec!["Penjualan", "disebut dalam lampiran"];
        let outcome = parse_document(&document(&rows), "f.pdf", "url", &lookup())
            .expect("parse succeeds");

        assert_eq!(outcome.into_records(), (None, None));
    }

    #[test]
    fn test_reparsing_is_idempotent() {
        let document = document(&buy_rows());
        let first = parse_document(&document, "f.pdf", "url", &lookup()).expect("first run");
        let second = parse_document(&document, "f.pdf", "url", &lookup()).expect("second run");
        assert_eq!(first, second);
    }
}
