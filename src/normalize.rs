// src/normalize.rs

// --- Imports ---
use chrono::NaiveDate;
use serde::{Serialize, Serializer};

// --- Constants ---
// Month abbreviations as they appear in IDX filings (Indonesian).
const MONTH_ABBREVIATIONS: [(&str, &str); 12] = [
    ("Jan", "01"),
    ("Feb", "02"),
    ("Mar", "03"),
    ("Apr", "04"),
    ("Mei", "05"),
    ("Jun", "06"),
    ("Jul", "07"),
    ("Agu", "08"),
    ("Sep", "09"),
    ("Okt", "10"),
    ("Nov", "11"),
    ("Des", "12"),
];

/// Classification of a transaction row, carried verbatim where the filing
/// text does not map onto a canonical bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionKind {
    Buy,
    Sell,
    Others,
    /// "Koreksi atas laporan ..." correction notices, kept verbatim (lower-cased).
    Correction(String),
    /// Phrase matched no known transaction type; raw text retained.
    Unknown(String),
}

impl TransactionKind {
    /// Canonical wire value, or `None` for unmapped phrases.
    pub fn canonical(&self) -> Option<&str> {
        match self {
            TransactionKind::Buy => Some("buy"),
            TransactionKind::Sell => Some("sell"),
            TransactionKind::Others => Some("others"),
            TransactionKind::Correction(phrase) => Some(phrase),
            TransactionKind::Unknown(_) => None,
        }
    }
}

impl Serialize for TransactionKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self.canonical() {
            Some(value) => serializer.serialize_str(value),
            None => serializer.serialize_none(),
        }
    }
}

/// Result of looking a token up in the month table.
#[derive(Debug, Clone, PartialEq, Eq)]
enum MonthToken {
    Known(&'static str),
    Unknown(String),
}

fn month_token(raw: &str) -> MonthToken {
    let token = raw.trim();
    MONTH_ABBREVIATIONS
        .iter()
        .find(|(abbreviation, _)| *abbreviation == token)
        .map(|&(_, number)| MonthToken::Known(number))
        .unwrap_or_else(|| MonthToken::Unknown(token.to_string()))
}

/// Parses an Indonesian-formatted number ("." thousands separator, ","
/// decimal separator) into a truncated integer. Unparseable input is logged
/// and yields `None`.
pub fn clean_number(raw: &str) -> Option<i64> {
    if raw.trim().is_empty() {
        return None;
    }

    let cleaned = raw.replace('.', "").replace(',', ".");

    match cleaned.trim().parse::<f64>() {
        Ok(value) => Some(value.trunc() as i64),
        Err(error) => {
            tracing::warn!("clean number error: {} '{}'", error, raw);
            None
        }
    }
}

/// Strips the "%" sign, converts the decimal comma and rounds to 3 decimals.
pub fn clean_percentage(raw: &str) -> Option<f64> {
    let cleaned = raw.replace('%', "");
    let cleaned = cleaned.trim().replace(',', ".");

    if cleaned.is_empty() {
        return None;
    }

    match cleaned.parse::<f64>() {
        Ok(value) => Some(round3(value)),
        Err(error) => {
            tracing::warn!("clean percentage error: {} '{}'", error, raw);
            None
        }
    }
}

/// Converts "DD-MonIndo-YYYY" into ISO "YYYY-MM-DD". An unknown month token
/// defaults to "01" (logged). Input that does not split into three parts is
/// passed through trimmed; empty input yields `None`.
pub fn standardize_date(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let parts: Vec<&str> = trimmed.split('-').collect();
    if parts.len() != 3 {
        return Some(trimmed.to_string());
    }

    let day = format!("{:0>2}", parts[0].trim());
    let month = match month_token(parts[1]) {
        MonthToken::Known(number) => number,
        MonthToken::Unknown(token) => {
            tracing::warn!("unknown month token '{}' in date '{}', defaulting to 01", token, raw);
            "01"
        }
    };
    let year = parts[2].trim();

    let date = format!("{}-{}-{}", year, month, day);

    if NaiveDate::parse_from_str(&date, "%Y-%m-%d").is_err() {
        tracing::warn!("normalized date '{}' is not a valid calendar date", date);
    }

    Some(date)
}

/// Maps the Indonesian transaction-type phrase of a table row onto a
/// canonical bucket via lower-cased substring matching.
pub fn map_transaction_type(raw: &str) -> TransactionKind {
    let lowered = raw.to_lowercase();

    if lowered.contains("koreksi atas laporan") {
        TransactionKind::Correction(lowered)
    } else if lowered.contains("pelaksanaan") {
        TransactionKind::Others
    } else if lowered.contains("penjualan") {
        TransactionKind::Sell
    } else if lowered.contains("pembelian") {
        TransactionKind::Buy
    } else if lowered.contains("lainnya") {
        TransactionKind::Others
    } else {
        tracing::warn!("unmapped transaction type '{}'", raw);
        TransactionKind::Unknown(raw.to_string())
    }
}

/// Rounds to 3 decimal places, the precision used for percentages and prices.
pub(crate) fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Capitalizes the first letter of every alphabetic run, lower-casing the
/// rest, like the source filings' holder names require.
pub(crate) fn title_case(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut prev_alphabetic = false;

    for ch in raw.chars() {
        if ch.is_alphabetic() {
            if prev_alphabetic {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            prev_alphabetic = true;
        } else {
            out.push(ch);
            prev_alphabetic = false;
        }
    }

    out
}
