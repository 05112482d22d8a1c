// src/curated.rs
// THE CURATED CODEX
// Hand-authored (keywords, summary, link) answers that bypass the model tiers.

use std::path::Path;
use std::sync::RwLock;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::StoreError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CuratedEntry {
    pub keywords: Vec<String>,
    pub summary: String,
    pub link: String,
}

impl CuratedEntry {
    pub fn new(keywords: &[&str], summary: &str, link: &str) -> Self {
        Self {
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            summary: summary.to_string(),
            link: link.to_string(),
        }
    }

    /// Trims every field and drops blank keywords. Rejects entries with no
    /// keywords left, an empty summary, or a link that is not an absolute http(s) URL.
    pub fn validated(self) -> Result<Self, StoreError> {
        let keywords: Vec<String> = self
            .keywords
            .iter()
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .collect();
        if keywords.is_empty() {
            return Err(StoreError::InvalidEntry("at least one keyword is required".to_string()));
        }

        let summary = self.summary.trim().to_string();
        if summary.is_empty() {
            return Err(StoreError::InvalidEntry("summary must not be empty".to_string()));
        }

        let link = self.link.trim().to_string();
        let parsed = Url::parse(&link)
            .map_err(|e| StoreError::InvalidEntry(format!("link is not a valid URL: {}", e)))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(StoreError::InvalidEntry("link must be an http(s) URL".to_string()));
        }

        Ok(Self { keywords, summary, link })
    }
}

/// Read access for the resolver, append access for the admin endpoint.
#[async_trait]
pub trait CuratedStore: Send + Sync {
    async fn entries(&self) -> Result<Vec<CuratedEntry>, StoreError>;
    async fn append(&self, entry: CuratedEntry) -> Result<(), StoreError>;
}

/// Keywords arrive either as `"a, b, c"` (admin form) or as a JSON list.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum KeywordsInput {
    List(Vec<String>),
    Csv(String),
}

impl KeywordsInput {
    pub fn split(&self) -> Vec<String> {
        let raw: Vec<&str> = match self {
            KeywordsInput::List(items) => items.iter().flat_map(|s| s.split(',')).collect(),
            KeywordsInput::Csv(line) => line.split(',').collect(),
        };
        raw.into_iter()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Admin submission payload.
#[derive(Debug, Clone, Deserialize)]
pub struct NewCuratedLink {
    pub keywords: KeywordsInput,
    pub summary: String,
    pub link: String,
}

impl NewCuratedLink {
    pub fn into_entry(self) -> Result<CuratedEntry, StoreError> {
        CuratedEntry {
            keywords: self.keywords.split(),
            summary: self.summary,
            link: self.link,
        }
        .validated()
    }
}

/// Built-in entries used when no curated file is configured.
pub fn seed_entries() -> Vec<CuratedEntry> {
    vec![
        CuratedEntry::new(
            &["ticket", "miami", "pay"],
            "You can pay your traffic ticket online at the City of Miami portal.",
            "https://www.miamigov.com/Services/Pay-Ticket",
        ),
        CuratedEntry::new(
            &["hunting", "license", "alaska"],
            "You can apply for a hunting license through Alaska Fish and Game.",
            "https://www.adfg.alaska.gov/index.cfm?adfg=hunting.main",
        ),
        CuratedEntry::new(
            &["dmv", "license", "renew", "california"],
            "Renew your California driver's license through the DMV portal.",
            "https://www.dmv.ca.gov/portal/driver-licenses-identification-cards/driver-license-renewal/",
        ),
    ]
}

/// Process-local store. Entries keep insertion order, which the matcher relies on.
#[derive(Debug, Default)]
pub struct InMemoryCuratedStore {
    entries: RwLock<Vec<CuratedEntry>>,
}

impl InMemoryCuratedStore {
    pub fn new(entries: Vec<CuratedEntry>) -> Self {
        Self {
            entries: RwLock::new(entries),
        }
    }

    pub fn seeded() -> Self {
        Self::new(seed_entries())
    }

    /// Loads a JSON array of `CuratedEntry`, applying the same checks as admin submissions.
    pub fn from_json_file(path: &Path) -> Result<Self, StoreError> {
        let raw = std::fs::read_to_string(path)?;
        let parsed: Vec<CuratedEntry> = serde_json::from_str(&raw)?;
        let entries = parsed
            .into_iter()
            .enumerate()
            .map(|(i, entry)| {
                entry.validated().map_err(|e| match e {
                    StoreError::InvalidEntry(msg) => {
                        StoreError::InvalidEntry(format!("entry {} in {}: {}", i, path.display(), msg))
                    }
                    other => other,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        tracing::info!(count = entries.len(), path = %path.display(), "Loaded curated links");
        Ok(Self::new(entries))
    }
}

#[async_trait]
impl CuratedStore for InMemoryCuratedStore {
    async fn entries(&self) -> Result<Vec<CuratedEntry>, StoreError> {
        let guard = self.entries.read().map_err(|_| StoreError::Poisoned)?;
        Ok(guard.clone())
    }

    async fn append(&self, entry: CuratedEntry) -> Result<(), StoreError> {
        let mut guard = self.entries.write().map_err(|_| StoreError::Poisoned)?;
        guard.push(entry);
        Ok(())
    }
}
