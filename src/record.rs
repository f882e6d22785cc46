//! Value types produced by the extractor and consumed by the composer.
//!
//! All records are built once from an immutable feed snapshot and never
//! mutated afterwards.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One newly released report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Catalogue control identifier (tag 001); the dedup key.
    pub id: String,
    /// Document symbol, e.g. `A/80/123`.
    pub symbol: Option<String>,
    /// Title parts joined with " – ".
    pub title: String,
    /// Publication date as ISO-8601, when the catalogue has one.
    pub date: Option<String>,
    /// Free-text page count, brackets removed.
    pub pages: Option<String>,
    /// General notes, one paragraph each.
    pub summary: Vec<String>,
    /// Subject headings in catalogue order.
    pub keywords: Vec<String>,
    /// URL of the English PDF. Always present.
    pub pdf_url: String,
}

/// A single country's vote on a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Vote {
    Yes,
    No,
    Abstention,
}

impl Vote {
    /// Parse the catalogue's vote letter (`Y`, `N`, `A`).
    pub fn from_letter(letter: &str) -> Option<Self> {
        match letter.trim() {
            "Y" => Some(Vote::Yes),
            "N" => Some(Vote::No),
            "A" => Some(Vote::Abstention),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Vote::Yes => "Yes",
            Vote::No => "No",
            Vote::Abstention => "Abstention",
        }
    }

    pub const ALL: [Vote; 3] = [Vote::Yes, Vote::No, Vote::Abstention];
}

/// The voting record of an adopted resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRecord {
    pub id: String,
    pub symbol: Option<String>,
    pub title: String,
    pub date: Option<String>,
    /// Country alpha-3 code → vote.
    pub votes: BTreeMap<String, Vote>,
    /// Free-text notes (tag 591), e.g. "ADOPTED WITHOUT VOTE".
    pub notes: Vec<String>,
    /// Symbol of the adopted resolution (tag 791).
    pub resolution: Option<String>,
    /// Symbol of the companion draft resolution (tag 993).
    pub draft_symbol: Option<String>,
}

impl VoteRecord {
    /// Country codes that cast `vote`, in code order.
    pub fn countries_voting(&self, vote: Vote) -> Vec<&str> {
        self.votes
            .iter()
            .filter(|(_, v)| **v == vote)
            .map(|(c, _)| c.as_str())
            .collect()
    }

    /// True when the first note records adoption without a vote.
    pub fn adopted_without_vote(&self) -> bool {
        self.notes
            .first()
            .is_some_and(|n| n.trim().eq_ignore_ascii_case("adopted without vote"))
    }
}

/// The draft resolution a voting record refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftResolution {
    pub id: String,
    pub summary: Vec<String>,
    pub keywords: Vec<String>,
    /// Sponsoring member states by name (tag 710).
    pub authors: Vec<String>,
    /// English PDF, when the catalogue has one.
    pub pdf_url: Option<String>,
}
