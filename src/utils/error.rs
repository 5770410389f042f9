// src/utils/error.rs
use thiserror::Error;

// Field-level extraction failures (malformed numbers/dates, unmapped
// transaction types, lookup misses) degrade to None plus a warn log; they
// never abort a document. Only document-level failures are typed.

#[derive(Error, Debug)]
pub enum LookupError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse company lookup JSON: {0}")]
    Deserialize(String),
}

#[derive(Error, Debug)]
pub enum FilingError {
    #[error("No transaction table detected in document")]
    NoTransactionTable,

    #[error("Company lookup failed: {0}")]
    Lookup(#[from] LookupError),
}
