//! # un-threads
//!
//! Republish newly released United Nations reports and adopted resolutions
//! as social-media threads.
//!
//! The digital library exports its catalogue as MARCXML. Each run takes the
//! newest records of two feeds, picks the oldest one not yet posted on each
//! platform, renders preview pages of its PDF and turns the record into a
//! thread: an announcement with images and a link, the summary split into
//! replies, the vote tally for resolutions and a closing line of hashtags.
//!
//! ## Pipeline Overview
//!
//! ```text
//! MARCXML feed
//!  │
//!  ├─ 1. Extract  typed records from the field table
//!  ├─ 2. Dedup    oldest record absent from the ledger
//!  ├─ 3. Render   preview pages via pdfium, JPEG under 950 kB
//!  ├─ 4. Chunk    sentence-preserving replies with "..." markers
//!  ├─ 5. Compose  ordered post units with link and hashtag facets
//!  └─ 6. Publish  one thread per platform, ids recorded in the ledger
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use un_threads::{extract_reports, compose_report, next_unposted, PipelineConfig};
//! use std::collections::HashSet;
//!
//! let config = PipelineConfig::default();
//! let xml = std::fs::read_to_string("reports.xml").unwrap();
//! let reports = extract_reports(&xml, &config).unwrap();
//! if let Some(record) = next_unposted(&reports, &HashSet::new()) {
//!     for unit in compose_report(record, vec![], &[], &config) {
//!         println!("{}\n---", unit.text);
//!     }
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `un-threads` binary (clap + anyhow + tracing-subscriber) |
//!
//! pdfium is loaded at run time: set `PDFIUM_LIB_PATH` to the library file
//! or its directory, or install it system-wide.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod countries;
pub mod error;
pub mod harvest;
pub mod ledger;
pub mod pipeline;
pub mod publish;
pub mod record;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{FeedKind, PipelineConfig, PipelineConfigBuilder, RenderConfig};
pub use error::{HarvestError, PageError};
pub use harvest::{Harvester, Outcome, RunReport, Status};
pub use ledger::Ledger;
pub use pipeline::chunk::{chunk, chunk_with, split_sentences};
pub use pipeline::compose::{
    compose_report, compose_resolution, Facet, FacetKind, ImageAttachment, PostUnit,
};
pub use pipeline::dedup::{next_unposted, next_unposted_resolution, DraftLookup};
pub use pipeline::docx::summary_paragraphs;
pub use pipeline::extract::{extract_drafts, extract_reports, extract_resolutions};
pub use pipeline::fetch::{DocumentSource, LibraryClient};
pub use pipeline::render::{NoPreview, PdfiumRenderer, Renderer};
pub use publish::{
    publish_thread, OutboxPublisher, Platform, PostRef, Publisher, ReplyRef, ThreadError,
};
pub use record::{DraftResolution, Record, Vote, VoteRecord};
