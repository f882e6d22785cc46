//! Dedup: pick the oldest record that has not been posted yet.
//!
//! Feeds arrive newest first, so "next" is the last survivor of the
//! published-id filter.

use crate::error::HarvestError;
use crate::record::{DraftResolution, Record, VoteRecord};
use std::collections::HashSet;
use tracing::debug;

/// Resolves a draft-resolution symbol to its catalogue record.
pub trait DraftLookup {
    /// `Ok(None)` when the catalogue has no such draft.
    fn lookup(&self, symbol: &str) -> Result<Option<DraftResolution>, HarvestError>;
}

/// The oldest record of `candidates` (newest first) whose id is not in
/// `published`.
pub fn next_unposted<'a>(
    candidates: &'a [Record],
    published: &HashSet<String>,
) -> Option<&'a Record> {
    candidates
        .iter()
        .rev()
        .find(|r| !published.contains(&r.id))
}

/// The oldest unposted voting record whose companion draft exists, has an
/// English PDF and has not itself been posted.
///
/// Lookup errors abort the scan: a failing catalogue should not silently
/// skip resolutions.
pub fn next_unposted_resolution<'a>(
    candidates: &'a [VoteRecord],
    published: &HashSet<String>,
    lookup: &dyn DraftLookup,
) -> Result<Option<(&'a VoteRecord, DraftResolution)>, HarvestError> {
    for record in candidates.iter().rev() {
        if published.contains(&record.id) {
            continue;
        }
        let Some(symbol) = record.draft_symbol.as_deref() else {
            debug!("Voting record {} names no draft; skipped", record.id);
            continue;
        };
        let Some(draft) = lookup.lookup(symbol)? else {
            debug!("No draft found for {}; skipped", symbol);
            continue;
        };
        if draft.pdf_url.is_none() {
            debug!("Draft {} has no English PDF; skipped", draft.id);
            continue;
        }
        if published.contains(&draft.id) {
            debug!("Draft {} already posted; skipped", draft.id);
            continue;
        }
        return Ok(Some((record, draft)));
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeMap, HashMap};

    fn report(id: &str) -> Record {
        Record {
            id: id.into(),
            symbol: None,
            title: format!("Report {id}"),
            date: None,
            pages: None,
            summary: vec![],
            keywords: vec![],
            pdf_url: format!("https://example.org/{id}-EN.pdf"),
        }
    }

    fn vote(id: &str, draft: Option<&str>) -> VoteRecord {
        VoteRecord {
            id: id.into(),
            symbol: None,
            title: String::new(),
            date: None,
            votes: BTreeMap::new(),
            notes: vec![],
            resolution: None,
            draft_symbol: draft.map(str::to_string),
        }
    }

    fn draft(id: &str, pdf: bool) -> DraftResolution {
        DraftResolution {
            id: id.into(),
            summary: vec![],
            keywords: vec![],
            authors: vec![],
            pdf_url: pdf.then(|| format!("https://example.org/{id}-EN.pdf")),
        }
    }

    struct Catalogue(HashMap<&'static str, DraftResolution>);

    impl DraftLookup for Catalogue {
        fn lookup(&self, symbol: &str) -> Result<Option<DraftResolution>, HarvestError> {
            if symbol == "BROKEN" {
                return Err(HarvestError::AmbiguousDraft {
                    symbol: symbol.into(),
                    found: 2,
                });
            }
            Ok(self.0.get(symbol).cloned())
        }
    }

    fn published(ids: &[&str]) -> HashSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn picks_oldest_unposted() {
        let feed = vec![report("id3"), report("id2"), report("id1")];
        let next = next_unposted(&feed, &published(&["id1"])).unwrap();
        assert_eq!(next.id, "id2");
        assert_eq!(next_unposted(&feed, &published(&[])).unwrap().id, "id1");
    }

    #[test]
    fn everything_posted_gives_none() {
        let feed = vec![report("id2"), report("id1")];
        assert!(next_unposted(&feed, &published(&["id1", "id2"])).is_none());
        assert!(next_unposted(&[], &published(&[])).is_none());
    }

    #[test]
    fn resolution_needs_a_postable_draft() {
        let catalogue = Catalogue(HashMap::from([
            ("L.1", draft("d1", false)),
            ("L.2", draft("d2", true)),
            ("L.3", draft("d3", true)),
        ]));
        let feed = vec![
            vote("v4", Some("L.3")),
            vote("v3", Some("L.2")),
            vote("v2", Some("L.1")),
            vote("v1", None),
            vote("v0", Some("L.9")),
        ];
        let (record, draft) = next_unposted_resolution(&feed, &published(&[]), &catalogue)
            .unwrap()
            .unwrap();
        assert_eq!(record.id, "v3");
        assert_eq!(draft.id, "d2");

        let (record, _) = next_unposted_resolution(&feed, &published(&["d2"]), &catalogue)
            .unwrap()
            .unwrap();
        assert_eq!(record.id, "v4");

        let none = next_unposted_resolution(&feed, &published(&["v4", "d2"]), &catalogue).unwrap();
        assert!(none.is_none());
    }

    #[test]
    fn lookup_errors_propagate() {
        let catalogue = Catalogue(HashMap::new());
        let feed = vec![vote("v1", Some("BROKEN"))];
        let err = next_unposted_resolution(&feed, &published(&[]), &catalogue).unwrap_err();
        assert!(matches!(err, HarvestError::AmbiguousDraft { found: 2, .. }));
    }
}
