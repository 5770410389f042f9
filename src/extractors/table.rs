// src/extractors/table.rs

// --- Imports ---
use crate::normalize::{clean_number, map_transaction_type, standardize_date, TransactionKind};
use once_cell::sync::Lazy;
use regex::Regex;

// --- Constants ---
// Exact line values that can open a transaction row.
const TRANSACTION_KEYWORDS: [&str; 6] = [
    "Penjualan",
    "Pembelian",
    "Lainnya",
    "Koreksi",
    "Pelaksanaan",
    "(exercise)",
];

// Line prefixes marking the end of the table and the start of the
// declaration/signature block.
const FOOTER_KEYWORDS: [&str; 7] = [
    "Pemberi",
    "Keterangan",
    "Jika",
    "Nama pemegang",
    "Informasi",
    "Saya bertanggung",
    "Hak Suara",
];

// A real transaction row is confirmed by one of these within the lookahead
// window; the word alone can also occur in running prose.
const DISPOSITION_MARKERS: [&str; 3] = ["Tidak", "Ya", "Langsung"];

const START_VALIDATION_LOOKAHEAD: usize = 10;
const AMOUNT_SCAN_LIMIT: usize = 100;
const PRICE_SCAN_LIMIT: usize = 10;
const DATE_TOKEN_LIMIT: usize = 5;

// Leading day fragment of a linearized date cell, e.g. "05 -".
static DATE_PREFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{1,2}\s?-$").expect("Failed to compile DATE_PREFIX_RE"));

// --- Data Structures ---

/// One transaction row as read off the table, before grouping.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTransaction {
    pub kind: TransactionKind,
    pub amount_transacted: Option<i64>,
    pub price: Option<i64>,
    pub date: Option<String>,
    pub purpose: String,
}

// --- Line Predicates ---

fn is_footer(line: &str) -> bool {
    FOOTER_KEYWORDS.iter().any(|keyword| line.starts_with(keyword))
}

fn is_header_row(lines: &[&str], at: usize) -> bool {
    lines.get(at) == Some(&"Jenis") && lines.get(at + 1) == Some(&"Transaksi")
}

fn is_data_marker(lines: &[&str], at: usize) -> bool {
    lines.get(at) == Some(&"Tujuan") && lines.get(at + 1) == Some(&"Transaksi")
}

/// Validates a candidate transaction keyword at `at`: a real row shows a
/// disposition marker within the lookahead window before any footer line.
/// Returns the offset of the marker that confirmed it.
pub(crate) fn looks_like_transaction_start(lines: &[&str], at: usize) -> Option<usize> {
    if !TRANSACTION_KEYWORDS.contains(lines.get(at)?) {
        return None;
    }

    for offset in 1..START_VALIDATION_LOOKAHEAD {
        let line = *lines.get(at + offset)?;
        if DISPOSITION_MARKERS.contains(&line) {
            return Some(offset);
        }
        if is_footer(line) {
            return None;
        }
    }

    None
}

// --- State Machine ---

/// Walks the concatenated table-page text in one forward pass and yields the
/// raw transaction rows. An empty result means the pages contained no
/// parseable rows, which is distinct from no table pages existing at all.
pub fn parse_transactions(text: &str) -> Vec<RawTransaction> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    let Some(header_index) = find_header(&lines) else {
        tracing::debug!("no transaction table header in {} lines", lines.len());
        return Vec::new();
    };

    let Some(data_start) = find_data_start(&lines, header_index) else {
        tracing::debug!("transaction table header found but no data start");
        return Vec::new();
    };

    let mut transactions = Vec::new();
    let mut index = data_start;

    while index < lines.len() {
        let line = lines[index];

        if is_footer(line) {
            break;
        }

        // A repeated table header on a continuation page: skip past its
        // column labels and keep scanning.
        if is_header_row(&lines, index) {
            index = skip_repeated_header(&lines, index);
            continue;
        }

        if TRANSACTION_KEYWORDS.contains(&line) {
            if looks_like_transaction_start(&lines, index).is_none() {
                // Incidental prose, e.g. the word inside a purpose cell.
                index += 1;
                continue;
            }

            let (parsed, next_index) = parse_one_transaction(&lines, index);
            if let Some(transaction) = parsed {
                transactions.push(transaction);
            }
            index = next_index;
        } else {
            index += 1;
        }
    }

    tracing::debug!("parsed {} transaction row(s)", transactions.len());
    transactions
}

fn find_header(lines: &[&str]) -> Option<usize> {
    (0..lines.len()).find(|&index| is_header_row(lines, index))
}

/// Data rows begin two lines after the "Tujuan"/"Transaksi" column label.
/// Fallback: the first transaction keyword, guarding against "Pelaksanaan"
/// that is itself part of the "Jumlah Saham" label run.
fn find_data_start(lines: &[&str], header_index: usize) -> Option<usize> {
    for index in header_index..lines.len().saturating_sub(1) {
        if is_data_marker(lines, index) {
            return Some(index + 2);
        }
    }

    for index in header_index..lines.len() {
        if TRANSACTION_KEYWORDS.contains(&lines[index]) {
            if lines[index] == "Pelaksanaan"
                && matches!(lines.get(index + 1), Some(&"Jumlah") | Some(&"Saham"))
            {
                continue;
            }
            return Some(index);
        }
    }

    None
}

fn skip_repeated_header(lines: &[&str], mut index: usize) -> usize {
    while index < lines.len() {
        if is_data_marker(lines, index) {
            return index + 2;
        }
        index += 1;
    }
    index
}

/// Parses one validated candidate row through its sequential sub-steps.
/// Returns the parsed row (or `None` when the candidate is abandoned) plus
/// the cursor position where scanning resumes.
fn parse_one_transaction(lines: &[&str], index: usize) -> (Option<RawTransaction>, usize) {
    let (type_phrase, index) = take_type(lines, index);

    let Some((amount_raw, index)) = find_amount(lines, index) else {
        tracing::warn!(
            "no share amount within {} lines of '{}', abandoning candidate",
            AMOUNT_SCAN_LIMIT,
            type_phrase
        );
        return (None, index + 1);
    };

    let (price_raw, index) = take_price(lines, index);
    if price_raw.is_none() {
        tracing::warn!("no price boundary after amount for '{}'", type_phrase);
    }

    let (date_phrase, index) = take_date(lines, index);
    let (purpose, index) = take_purpose(lines, index);

    tracing::debug!(
        "parsed row: type='{}' amount='{}' price='{:?}' date='{}'",
        type_phrase,
        amount_raw,
        price_raw,
        date_phrase
    );

    let transaction = RawTransaction {
        kind: map_transaction_type(&type_phrase),
        amount_transacted: clean_number(&amount_raw),
        price: price_raw.as_deref().and_then(clean_number),
        date: standardize_date(&date_phrase),
        purpose,
    };

    (Some(transaction), index)
}

/// Accumulates the transaction-type phrase, then consumes the trailing
/// "Tidak"/"Ya" and optional "Langsung" disposition markers.
fn take_type(lines: &[&str], start: usize) -> (String, usize) {
    let mut parts = vec![lines[start]];
    let mut index = start + 1;

    while index < lines.len() {
        let current = lines[index];
        if current == "Tidak" || current == "Ya" {
            break;
        }
        if current == "Jenis" || is_footer(current) {
            break;
        }
        parts.push(current);
        index += 1;
    }

    let phrase = parts.join(" ");

    if matches!(lines.get(index), Some(&"Tidak") | Some(&"Ya")) {
        index += 1;
    }
    if lines.get(index) == Some(&"Langsung") {
        index += 1;
    }

    (phrase, index)
}

/// The amount is the line immediately preceding the literal "Saham" within
/// the scan window. `None` abandons the candidate.
fn find_amount(lines: &[&str], start: usize) -> Option<(String, usize)> {
    let scan_limit = (start + AMOUNT_SCAN_LIMIT).min(lines.len());

    for index in start..scan_limit {
        if lines[index] == "Saham" {
            if index == 0 {
                return None;
            }
            return Some((lines[index - 1].to_string(), index + 1));
        }
    }

    None
}

/// The price is the line immediately preceding the date-prefix pattern when
/// one appears in the scan window; parsing then resumes at the date prefix.
/// Otherwise an optional "Biasa" classification line is skipped and the next
/// line is the price.
fn take_price(lines: &[&str], start: usize) -> (Option<String>, usize) {
    let scan_limit = (start + PRICE_SCAN_LIMIT).min(lines.len());

    let date_start = (start..scan_limit).find(|&index| DATE_PREFIX_RE.is_match(lines[index]));

    match date_start {
        Some(found) if found > start => (Some(lines[found - 1].to_string()), found),
        _ => {
            let mut index = start;
            if lines.get(index) == Some(&"Biasa") {
                index += 1;
            }
            let price = lines.get(index).map(|line| line.to_string());
            (price, index + 1)
        }
    }
}

/// Collects up to five tokens, stopping as soon as a four-digit year is seen.
fn take_date(lines: &[&str], start: usize) -> (String, usize) {
    let mut parts = Vec::new();
    let mut index = start;

    while index < lines.len() {
        let part = lines[index];
        parts.push(part);
        index += 1;

        if part.len() == 4 && part.chars().all(|ch| ch.is_ascii_digit()) {
            break;
        }
        if parts.len() >= DATE_TOKEN_LIMIT {
            break;
        }
    }

    (parts.join(" "), index)
}

/// Collects purpose lines until a footer, a repeated header, or a validated
/// next transaction start. When the next line opens a new row, the current
/// line still belongs to this purpose and parsing resumes at the new row.
fn take_purpose(lines: &[&str], start: usize) -> (String, usize) {
    let mut parts = Vec::new();
    let mut index = start;

    while index < lines.len() {
        let current = lines[index];

        if is_footer(current) {
            break;
        }
        if is_header_row(lines, index) {
            break;
        }

        if index + 1 < lines.len() && looks_like_transaction_start(lines, index + 1).is_some() {
            parts.push(current);
            index += 1;
            break;
        }

        parts.push(current);
        index += 1;
    }

    (parts.join(" "), index)
}

// --- Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    fn table_text(lines: &[&str]) -> String {
        lines.join("\n")
    }

    const HEADER: [&str; 8] = [
        "Jenis",
        "Transaksi",
        "Klasifikasi",
        "Saham",
        "Jumlah",
        "Saham",
        "Tujuan",
        "Transaksi",
    ];

    fn buy_row() -> Vec<&'static str> {
        vec![
            "Pembelian", "Tidak", "Langsung", "1.000", "Saham", "Biasa", "500", "05 -", "Jan -",
            "2024", "Investasi",
        ]
    }

    fn sell_row() -> Vec<&'static str> {
        vec![
            "Penjualan", "Tidak", "Langsung", "2.000", "Saham", "Biasa", "600", "06 -", "Feb -",
            "2024", "Divestasi",
        ]
    }

    #[test]
    fn test_single_transaction() {
        let mut lines: Vec<&str> = HEADER.to_vec();
        lines.extend(buy_row());
        lines.push("Pemberi Informasi");

        let transactions = parse_transactions(&table_text(&lines));
        assert_eq!(transactions.len(), 1);

        let transaction = &transactions[0];
        assert_eq!(transaction.kind, TransactionKind::Buy);
        assert_eq!(transaction.amount_transacted, Some(1000));
        assert_eq!(transaction.price, Some(500));
        assert_eq!(transaction.date, Some("2024-01-05".to_string()));
        assert_eq!(transaction.purpose, "Investasi");
    }

    #[test]
    fn test_two_transactions_purpose_boundary() {
        let mut lines: Vec<&str> = HEADER.to_vec();
        lines.extend(buy_row());
        lines.extend(sell_row());
        lines.push("Pemberi Informasi");

        let transactions = parse_transactions(&table_text(&lines));
        assert_eq!(transactions.len(), 2);
        // The first purpose stops before the validated second row.
        assert_eq!(transactions[0].purpose, "Investasi");
        assert_eq!(transactions[1].kind, TransactionKind::Sell);
        assert_eq!(transactions[1].amount_transacted, Some(2000));
        assert_eq!(transactions[1].date, Some("2024-02-06".to_string()));
        assert_eq!(transactions[1].purpose, "Divestasi");
    }

    #[test]
    fn test_keyword_in_prose_is_skipped() {
        // "Penjualan" with no disposition marker before the footer is prose,
        // not a row.
        let mut lines: Vec<&str> = HEADER.to_vec();
        lines.extend(["Penjualan", "tahun lalu", "Pemberi Informasi"]);

        let transactions = parse_transactions(&table_text(&lines));
        assert!(transactions.is_empty());
    }

    #[test]
    fn test_repeated_header_is_skipped() {
        let mut lines: Vec<&str> = HEADER.to_vec();
        lines.extend(buy_row());
        // Continuation page repeats the header block.
        lines.extend(HEADER);
        lines.extend(sell_row());
        lines.push("Pemberi Informasi");

        let transactions = parse_transactions(&table_text(&lines));
        assert_eq!(transactions.len(), 2);
        assert_eq!(transactions[1].kind, TransactionKind::Sell);
    }

    #[test]
    fn test_missing_amount_abandons_candidate_only() {
        let mut lines: Vec<&str> = HEADER.to_vec();
        // Valid start but no "Saham" anchor anywhere after it.
        lines.extend(["Lainnya", "Tidak", "Langsung", "???", "12345"]);

        let transactions = parse_transactions(&table_text(&lines));
        assert!(transactions.is_empty());
    }

    #[test]
    fn test_missing_amount_then_later_valid_row() {
        let mut lines: Vec<&str> = HEADER.to_vec();
        lines.extend(["Koreksi", "Tidak", "penjelasan singkat"]);
        lines.extend(buy_row());
        lines.push("Pemberi Informasi");

        let transactions = parse_transactions(&table_text(&lines));
        // The broken "Koreksi" candidate finds the buy row's "Saham" anchor
        // far ahead and swallows it; the single surviving row is the one
        // anchored on that amount.
        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].amount_transacted, Some(1000));
    }

    #[test]
    fn test_no_header_yields_no_transactions() {
        let transactions = parse_transactions("free-form prose\nwith no table at all");
        assert!(transactions.is_empty());
    }

    #[test]
    fn test_footer_terminates_scanning() {
        let mut lines: Vec<&str> = HEADER.to_vec();
        lines.push("Hak Suara Sebelum Transaksi");
        lines.extend(buy_row());

        let transactions = parse_transactions(&table_text(&lines));
        assert!(transactions.is_empty());
    }

    #[test]
    fn test_looks_like_transaction_start() {
        let valid = ["Pembelian", "x", "x", "Tidak"];
        assert_eq!(looks_like_transaction_start(&valid, 0), Some(3));

        let footer_first = ["Pembelian", "x", "Pemberi Informasi", "Tidak"];
        assert_eq!(looks_like_transaction_start(&footer_first, 0), None);

        let no_marker = ["Pembelian", "x", "y"];
        assert_eq!(looks_like_transaction_start(&no_marker, 0), None);

        let not_a_keyword = ["Sesuatu", "Tidak"];
        assert_eq!(looks_like_transaction_start(&not_a_keyword, 0), None);
    }

    #[test]
    fn test_price_fallback_without_date_prefix() {
        // No "NN -" date prefix: skip "Biasa" and take the next line.
        let mut lines: Vec<&str> = HEADER.to_vec();
        lines.extend([
            "Pembelian", "Ya", "1.000", "Saham", "Biasa", "750", "5 Januari", "2024", "Investasi",
            "Pemberi Informasi",
        ]);

        let transactions = parse_transactions(&table_text(&lines));
        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].price, Some(750));
        // A non-"DD-Mon-YYYY" phrase passes through the date normalizer.
        assert_eq!(transactions[0].date, Some("5 Januari 2024".to_string()));
        assert_eq!(transactions[0].purpose, "Investasi");
    }
}
