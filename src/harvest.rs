//! One harvest run: for each platform, post the next report and the next
//! resolution, then remember what was posted.
//!
//! ```text
//! feeds ─▶ dedup (ledger) ─▶ PDF ─▶ render ─▶ DOCX summary / draft
//!       ─▶ compose ─▶ publish thread ─▶ ledger.record ─▶ ledger.save
//! ```
//!
//! Platforms are independent: a failure on one never stops the other.
//! Rate-limit and permission refusals are expected in normal operation and
//! are reported as tolerated; anything else counts as a failure.

use crate::config::{FeedKind, PipelineConfig};
use crate::error::HarvestError;
use crate::ledger::Ledger;
use crate::pipeline::compose::{compose_report, compose_resolution, PostUnit};
use crate::pipeline::dedup::{next_unposted, next_unposted_resolution, DraftLookup};
use crate::pipeline::docx::summary_paragraphs;
use crate::pipeline::fetch::DocumentSource;
use crate::pipeline::render::Renderer;
use crate::publish::{publish_thread, Platform, Publisher};
use crate::record::{Record, VoteRecord};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::{error, info, warn};

// ── Report ───────────────────────────────────────────────────────────────

/// What happened to one feed on one platform.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Status {
    /// A thread was published and recorded.
    Posted { record_id: String, posts: usize },
    /// Dry run: the thread that would have been published.
    Composed {
        record_id: String,
        units: Vec<PostUnit>,
    },
    /// Every candidate was already posted.
    NothingNew,
    /// The platform refused for a reason that does not fail the run.
    Tolerated { error: String },
    Failed { error: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct Outcome {
    pub platform: Platform,
    pub feed: FeedKind,
    #[serde(flatten)]
    pub status: Status,
}

/// Every outcome of a run, in execution order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub outcomes: Vec<Outcome>,
}

impl RunReport {
    /// Outcomes that should fail the process.
    pub fn failures(&self) -> impl Iterator<Item = &Outcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, Status::Failed { .. }))
    }

    pub fn posted(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, Status::Posted { .. }))
            .count()
    }

    fn push(&mut self, platform: Platform, feed: FeedKind, status: Status) {
        self.outcomes.push(Outcome {
            platform,
            feed,
            status,
        });
    }
}

// ── Harvester ────────────────────────────────────────────────────────────

/// A thread ready to publish and the ids that mark it as posted.
struct Prepared {
    record_id: String,
    ledger_ids: Vec<String>,
    units: Vec<PostUnit>,
}

/// Drives one run against injected collaborators.
pub struct Harvester<'a> {
    config: &'a PipelineConfig,
    source: &'a dyn DocumentSource,
    lookup: &'a dyn DraftLookup,
    renderer: &'a dyn Renderer,
    dry_run: bool,
}

impl<'a> Harvester<'a> {
    pub fn new(
        config: &'a PipelineConfig,
        source: &'a dyn DocumentSource,
        lookup: &'a dyn DraftLookup,
        renderer: &'a dyn Renderer,
    ) -> Self {
        Self {
            config,
            source,
            lookup,
            renderer,
            dry_run: false,
        }
    }

    /// Compose threads without publishing or touching the ledger.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Post the next unposted report and resolution on every platform.
    ///
    /// `reports` and `resolutions` are feed snapshots, newest first. The
    /// ledger is saved after each successful thread.
    pub fn run(
        &self,
        reports: &[Record],
        resolutions: &[VoteRecord],
        publishers: &mut [Box<dyn Publisher>],
        ledger: &mut Ledger,
    ) -> RunReport {
        let mut report = RunReport::default();
        // Threads are composed once per record and shared across platforms.
        let mut cache: HashMap<String, Prepared> = HashMap::new();

        for publisher in publishers.iter_mut() {
            let platform = publisher.platform();
            info!("── {} ──", platform);
            for feed in [FeedKind::Reports, FeedKind::Resolutions] {
                let published = ledger.published(platform);
                let prepared = match feed {
                    FeedKind::Resolutions => {
                        self.prepare_resolution(resolutions, &published, &mut cache)
                    }
                    _ => Ok(self.prepare_report(reports, &published, &mut cache)),
                };
                let status = match prepared {
                    Ok(Some(key)) => match cache.get(&key) {
                        Some(thread) => self.deliver(publisher.as_mut(), thread, ledger),
                        None => Status::Failed {
                            error: format!("thread {} vanished from cache", key),
                        },
                    },
                    Ok(None) => {
                        info!("{}: no new {:?} to post", platform, feed);
                        Status::NothingNew
                    }
                    Err(e) => classify(platform, e),
                };
                report.push(platform, feed, status);
            }
        }
        report
    }

    fn deliver(
        &self,
        publisher: &mut dyn Publisher,
        thread: &Prepared,
        ledger: &mut Ledger,
    ) -> Status {
        let platform = publisher.platform();
        if self.dry_run {
            return Status::Composed {
                record_id: thread.record_id.clone(),
                units: thread.units.clone(),
            };
        }
        let refs = match publish_thread(publisher, &thread.units) {
            Ok(refs) => refs,
            Err(stopped) => {
                // A live root must never be posted again.
                if !stopped.posted.is_empty() {
                    warn!(
                        "{}: thread for {} stopped after {} of {} posts",
                        platform,
                        thread.record_id,
                        stopped.posted.len(),
                        thread.units.len()
                    );
                    if let Err(e) = remember(platform, thread, ledger) {
                        return Status::Failed {
                            error: e.to_string(),
                        };
                    }
                }
                return classify(platform, stopped.source);
            }
        };
        if let Err(e) = remember(platform, thread, ledger) {
            return Status::Failed {
                error: e.to_string(),
            };
        }
        info!("{}: posted {} as {} units", platform, thread.record_id, refs.len());
        Status::Posted {
            record_id: thread.record_id.clone(),
            posts: refs.len(),
        }
    }

    fn prepare_report(
        &self,
        reports: &[Record],
        published: &HashSet<String>,
        cache: &mut HashMap<String, Prepared>,
    ) -> Option<String> {
        let record = next_unposted(reports, published)?;
        let key = format!("report:{}", record.id);
        if !cache.contains_key(&key) {
            info!("Composing report {} ({})", record.id, record.title);
            let images = self.images(&record.pdf_url);
            let extra = record
                .symbol
                .as_deref()
                .map(|s| self.summary(s))
                .unwrap_or_default();
            let units = compose_report(record, images, &extra, self.config);
            cache.insert(
                key.clone(),
                Prepared {
                    record_id: record.id.clone(),
                    ledger_ids: vec![record.id.clone()],
                    units,
                },
            );
        }
        Some(key)
    }

    fn prepare_resolution(
        &self,
        resolutions: &[VoteRecord],
        published: &HashSet<String>,
        cache: &mut HashMap<String, Prepared>,
    ) -> Result<Option<String>, HarvestError> {
        let Some((record, draft)) = next_unposted_resolution(resolutions, published, self.lookup)?
        else {
            return Ok(None);
        };
        let key = format!("resolution:{}", record.id);
        if !cache.contains_key(&key) {
            info!("Composing resolution {} ({})", record.id, record.title);
            let images = draft
                .pdf_url
                .as_deref()
                .map(|url| self.images(url))
                .unwrap_or_default();
            let units = compose_resolution(record, &draft, images, self.config);
            cache.insert(
                key.clone(),
                Prepared {
                    record_id: record.id.clone(),
                    ledger_ids: vec![record.id.clone(), draft.id.clone()],
                    units,
                },
            );
        }
        Ok(Some(key))
    }

    /// Preview images; any failure degrades to none.
    fn images(&self, pdf_url: &str) -> Vec<Vec<u8>> {
        match self.source.pdf(pdf_url) {
            Ok(pdf) => self
                .renderer
                .render(&pdf, &self.config.render.pages)
                .into_iter()
                .flatten()
                .collect(),
            Err(e) => {
                warn!("Posting without images: {}", e);
                Vec::new()
            }
        }
    }

    /// Extra summary paragraphs from the Word rendition; any failure
    /// degrades to none.
    fn summary(&self, symbol: &str) -> Vec<String> {
        match self
            .source
            .summary_docx(symbol)
            .and_then(|docx| summary_paragraphs(&docx))
        {
            Ok(paragraphs) => paragraphs,
            Err(e) => {
                warn!("No DOCX summary for {}: {}", symbol, e);
                Vec::new()
            }
        }
    }
}

/// Record the thread's ids and persist the ledger.
fn remember(
    platform: Platform,
    thread: &Prepared,
    ledger: &mut Ledger,
) -> Result<(), HarvestError> {
    for id in &thread.ledger_ids {
        ledger.record(platform, id);
    }
    ledger.save().map_err(|e| {
        error!(
            "{}: posted {} but could not save ledger: {}",
            platform, thread.record_id, e
        );
        e
    })
}

fn classify(platform: Platform, e: HarvestError) -> Status {
    if e.is_tolerated() {
        warn!("{}: {}", platform, e);
        Status::Tolerated {
            error: e.to_string(),
        }
    } else {
        error!("{}: {}", platform, e);
        Status::Failed {
            error: e.to_string(),
        }
    }
}
