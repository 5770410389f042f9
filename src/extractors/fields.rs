// src/extractors/fields.rs

// --- Imports ---
use crate::normalize::{clean_number, clean_percentage, title_case};
use once_cell::sync::Lazy;
use regex::Regex;

// --- Constants ---
// Both phrases must co-occur on a page for it to count as a table page.
const TABLE_MARKERS: [&str; 2] = ["jenis transaksi", "klasifikasi saham"];
// How far past the company-name capture to look for a trailing "Tbk".
const TBK_SUFFIX_WINDOW: usize = 20;

// --- Regex Patterns for Text Matching (Lazy Static) ---
static HOLDER_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)Nama \(sesuai SID\)\s*:\s*(.+?)(?:\n|$)")
        .expect("Failed to compile HOLDER_NAME_RE")
});

// Ticker and company name block, terminated by the next structural label.
static SYMBOL_COMPANY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)Nama Perusahaan Tbk\s*:\s*([A-Z]+)\s*-\s*(.+?)(?:Tbk|PT|Jumlah Saham)")
        .expect("Failed to compile SYMBOL_COMPANY_RE")
});

static SHARES_BEFORE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)Jumlah Saham Sebelum Transaksi\s*:\s*([\d\.,]+)")
        .expect("Failed to compile SHARES_BEFORE_RE")
});

static SHARES_AFTER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)Jumlah Saham Setelah Transaksi\s*:\s*([\d\.,]+)")
        .expect("Failed to compile SHARES_AFTER_RE")
});

// Voting-rights percentages; the "%" sign is optional in the source layout.
static VOTE_BEFORE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)Hak Suara Sebelum Transaksi\s*:\s*([\d,]+)\s*%?")
        .expect("Failed to compile VOTE_BEFORE_RE")
});

static VOTE_AFTER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)Hak Suara Setelah Transaksi\s*:\s*([\d,]+)\s*%?")
        .expect("Failed to compile VOTE_AFTER_RE")
});

static PT_WORD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bPt\b").expect("Failed to compile PT_WORD_RE"));

static WHITESPACE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("Failed to compile WHITESPACE_RE"));

// --- Data Structures ---

/// Share counts and voting-rights percentages scraped from the cover pages.
/// Fields stay `None` when their label is absent; that is a partial
/// extraction, not a document failure.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShareSnapshot {
    pub holding_before: Option<i64>,
    pub holding_after: Option<i64>,
    pub share_percentage_before: Option<f64>,
    pub share_percentage_after: Option<f64>,
}

impl ShareSnapshot {
    /// Overwrites fields with values present in a later page's snapshot.
    /// Some filings split the share block across the first two pages.
    pub fn merge_from(&mut self, other: ShareSnapshot) {
        if other.holding_before.is_some() {
            self.holding_before = other.holding_before;
        }
        if other.holding_after.is_some() {
            self.holding_after = other.holding_after;
        }
        if other.share_percentage_before.is_some() {
            self.share_percentage_before = other.share_percentage_before;
        }
        if other.share_percentage_after.is_some() {
            self.share_percentage_after = other.share_percentage_after;
        }
    }

    /// True when both holdings are present and equal: the filing carries no
    /// reportable ownership change.
    pub fn is_unchanged(&self) -> bool {
        matches!(
            (self.holding_before, self.holding_after),
            (Some(before), Some(after)) if before == after
        )
    }
}

/// Ticker and company name as printed on the cover page. The company name is
/// provisional until cross-verified against the lookup table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SymbolCompany {
    pub symbol: Option<String>,
    pub company_name: Option<String>,
}

// --- Extraction Functions ---

/// Extracts the four share/percentage fields from one page of text.
pub fn extract_shares(text: &str) -> ShareSnapshot {
    ShareSnapshot {
        holding_before: capture(&SHARES_BEFORE_RE, text).and_then(|m| clean_number(m)),
        holding_after: capture(&SHARES_AFTER_RE, text).and_then(|m| clean_number(m)),
        share_percentage_before: capture(&VOTE_BEFORE_RE, text).and_then(|m| clean_percentage(m)),
        share_percentage_after: capture(&VOTE_AFTER_RE, text).and_then(|m| clean_percentage(m)),
    }
}

/// Extracts the holder name anchored on the "Nama (sesuai SID)" label,
/// title-cased with "PT" restored.
pub fn extract_holder_name(text: &str) -> Option<String> {
    let raw = capture(&HOLDER_NAME_RE, text)?;
    let name = title_case(raw.trim());
    Some(PT_WORD_RE.replace_all(&name, "PT").into_owned())
}

/// Extracts the ticker (with ".JK" suffix) and the company name block,
/// collapsing internal whitespace and re-appending a "Tbk" that immediately
/// follows the captured block in the source text.
pub fn extract_symbol_and_company_name(text: &str) -> SymbolCompany {
    let Some(caps) = SYMBOL_COMPANY_RE.captures(text) else {
        return SymbolCompany::default();
    };

    let (Some(symbol_match), Some(name_match)) = (caps.get(1), caps.get(2)) else {
        return SymbolCompany::default();
    };

    let symbol = symbol_match.as_str().trim();

    let mut company_name = WHITESPACE_RE
        .replace_all(name_match.as_str().trim(), " ")
        .into_owned();
    company_name = company_name.trim_end_matches(',').trim().to_string();

    let tail: String = text[name_match.end()..]
        .chars()
        .take(TBK_SUFFIX_WINDOW)
        .collect();
    if tail.contains("Tbk") {
        company_name.push_str(" Tbk");
    }

    tracing::info!("Extracted symbol: {}, company_name: {}", symbol, company_name);

    SymbolCompany {
        symbol: Some(format!("{}.JK", symbol)),
        company_name: Some(company_name),
    }
}

/// Scans every page for the co-occurrence of the transaction-table marker
/// phrases, comparing against whitespace-normalized lowercase text. The
/// returned indices define the transaction-table page window.
pub fn detect_transaction_tables(pages: &[String]) -> Vec<usize> {
    let mut pages_with_tables = Vec::new();

    for (page_index, page) in pages.iter().enumerate() {
        let text = WHITESPACE_RE.replace_all(&page.to_lowercase(), " ").into_owned();

        if TABLE_MARKERS.iter().all(|marker| text.contains(marker)) {
            pages_with_tables.push(page_index);
        }
    }

    tracing::debug!("detected {} transaction table page(s)", pages_with_tables.len());
    pages_with_tables
}

fn capture<'t>(re: &Regex, text: &'t str) -> Option<&'t str> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}
