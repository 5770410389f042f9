// src/lookup.rs

// --- Imports ---
use crate::utils::error::LookupError;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

// --- Data Structures ---

/// Canonical company data keyed by symbol in the lookup file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CompanyInfo {
    pub name: String,
    pub sub_sector: Option<String>,
}

/// Read-only symbol -> company table. The document's own text is never
/// authoritative for the canonical name or sub-sector; this table is.
#[derive(Debug, Clone, Default)]
pub struct CompanyLookup {
    companies: HashMap<String, CompanyInfo>,
}

impl CompanyLookup {
    /// Loads the lookup from a JSON mapping file shaped as
    /// `{ "BBCA.JK": { "name": ..., "sub_sector": ... }, ... }`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, LookupError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)?;

        let companies: HashMap<String, CompanyInfo> = serde_json::from_str(&raw)
            .map_err(|error| LookupError::Deserialize(error.to_string()))?;

        tracing::info!("loaded {} companies from {}", companies.len(), path.display());
        Ok(Self { companies })
    }

    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, CompanyInfo)>,
    {
        Self {
            companies: entries.into_iter().collect(),
        }
    }

    pub fn get(&self, symbol: &str) -> Option<&CompanyInfo> {
        self.companies.get(symbol)
    }

    pub fn len(&self) -> usize {
        self.companies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.companies.is_empty()
    }
}
