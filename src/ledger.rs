//! The "already posted" ledger.
//!
//! A JSON object mapping each platform to the record ids posted there,
//! newest first:
//!
//! ```json
//! {"bluesky": ["4093287", "4090001"], "x": ["4093287"]}
//! ```
//!
//! The ledger is the authority on what has been posted. [`Ledger::reconcile`]
//! only back-fills ids recovered from links of earlier posts, for platforms
//! whose ledger entries were lost.

use crate::error::HarvestError;
use crate::publish::Platform;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info};

static RE_RECORD_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"/record/(\d+)").unwrap());

/// Published record ids per platform, persisted as JSON.
#[derive(Debug, Clone)]
pub struct Ledger {
    path: PathBuf,
    entries: BTreeMap<String, Vec<String>>,
}

impl Ledger {
    /// Load the ledger at `path`. A missing or empty file is an empty ledger.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, HarvestError> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(text) if text.trim().is_empty() => BTreeMap::new(),
            Ok(text) => serde_json::from_str(&text).map_err(|e| HarvestError::LedgerFormat {
                path: path.clone(),
                detail: e.to_string(),
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No ledger at {}; starting empty", path.display());
                BTreeMap::new()
            }
            Err(source) => return Err(HarvestError::LedgerIo { path, source }),
        };
        Ok(Self { path, entries })
    }

    /// Write the ledger atomically: temp file, then rename over the original.
    pub fn save(&self) -> Result<(), HarvestError> {
        let io_err = |source| HarvestError::LedgerIo {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let json = serde_json::to_string_pretty(&self.entries)
            .map_err(|e| HarvestError::Internal(format!("ledger serialisation: {}", e)))?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(io_err)?;
        fs::rename(&tmp, &self.path).map_err(io_err)?;
        debug!("Ledger saved to {}", self.path.display());
        Ok(())
    }

    /// Ids already posted on `platform`.
    pub fn published(&self, platform: Platform) -> HashSet<String> {
        self.ids(platform).iter().cloned().collect()
    }

    /// Ids posted on `platform`, newest first.
    pub fn ids(&self, platform: Platform) -> &[String] {
        self.entries
            .get(platform.as_str())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn contains(&self, platform: Platform, id: &str) -> bool {
        self.ids(platform).iter().any(|i| i == id)
    }

    /// Mark `id` as posted on `platform`. Returns `false` if it already was.
    pub fn record(&mut self, platform: Platform, id: &str) -> bool {
        if self.contains(platform, id) {
            return false;
        }
        self.entries
            .entry(platform.as_str().to_string())
            .or_default()
            .insert(0, id.to_string());
        true
    }

    /// Merge record ids found in `links` (`…/record/{id}…`) as older entries.
    /// Returns the number of ids added.
    pub fn reconcile<'a>(
        &mut self,
        platform: Platform,
        links: impl IntoIterator<Item = &'a str>,
    ) -> usize {
        let mut added = 0;
        for link in links {
            let Some(id) = RE_RECORD_ID.captures(link).map(|c| c[1].to_string()) else {
                continue;
            };
            if self.contains(platform, &id) {
                continue;
            }
            self.entries
                .entry(platform.as_str().to_string())
                .or_default()
                .push(id);
            added += 1;
        }
        if added > 0 {
            info!("Reconciled {} ids for {} from earlier posts", added, platform);
        }
        added
    }
}
